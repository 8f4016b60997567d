//! Built-in functions
//!
//! Each built-in declares a name, a parameter signature, a return type and
//! help text. Several overloads may share a name; callers pick one through
//! the same ranking used for user programs (see
//! [`ProgramCatalog`](crate::catalog::ProgramCatalog)).

use crate::signature::Parameters;
use crate::value::{ProgCollection, Value};
use crate::{Result, ScriptError};
use chrono::{TimeDelta, Utc};
use progs_core::TypeDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Largest collection `range` will build
pub const MAX_RANGE_LEN: usize = 100_000;

/// Implementation of a built-in
pub type BuiltinFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// One built-in overload
pub struct BuiltinDefinition {
    pub name: String,
    pub parameters: Parameters,
    pub returns: TypeDescriptor,
    pub help: String,
    pub category: String,
    call: BuiltinFn,
}

impl BuiltinDefinition {
    pub fn new(
        name: impl Into<String>,
        parameters: Parameters,
        returns: TypeDescriptor,
        category: impl Into<String>,
        help: impl Into<String>,
        call: BuiltinFn,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            returns,
            help: help.into(),
            category: category.into(),
            call,
        }
    }

    /// Run the built-in on already evaluated arguments
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.call)(args)
    }
}

impl fmt::Debug for BuiltinDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDefinition")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .field("category", &self.category)
            .finish()
    }
}

/// Built-in function catalogue, keyed by lower-cased name
#[derive(Debug, Default)]
pub struct BuiltinCatalog {
    functions: HashMap<String, Vec<Arc<BuiltinDefinition>>>,
}

impl BuiltinCatalog {
    /// Create a catalogue holding every standard built-in
    pub fn new() -> Self {
        let mut catalog = Self::empty();

        catalog.register_math_functions();
        catalog.register_comparison_functions();
        catalog.register_logic_functions();
        catalog.register_text_functions();
        catalog.register_collection_functions();
        catalog.register_time_functions();
        catalog.register_null_functions();

        catalog
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an overload; rejected if one with the same parameter types exists
    pub fn register(&mut self, definition: BuiltinDefinition) -> bool {
        let overloads = self.functions.entry(definition.name.to_lowercase()).or_default();
        if overloads
            .iter()
            .any(|existing| existing.parameters.same_signature(&definition.parameters))
        {
            tracing::error!(
                "Built-in {}({}) is already registered",
                definition.name,
                definition.parameters
            );
            return false;
        }
        overloads.push(Arc::new(definition));
        true
    }

    fn add(
        &mut self,
        name: &str,
        parameters: &[TypeDescriptor],
        returns: TypeDescriptor,
        category: &str,
        help: &str,
        call: fn(&[Value]) -> Result<Value>,
    ) {
        self.register(BuiltinDefinition::new(
            name,
            Parameters::from_types(parameters),
            returns,
            category,
            help,
            Arc::new(call),
        ));
    }

    /// Every overload of `name`
    pub fn overloads(&self, name: &str) -> &[Arc<BuiltinDefinition>] {
        self.functions
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.overloads(name).is_empty()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn overload_count(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BuiltinDefinition>> {
        self.functions.values().flatten()
    }

    fn register_math_functions(&mut self) {
        use TypeDescriptor as T;
        let n = T::NUMBER;

        self.add(
            "add",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Sum of two numbers",
            builtin_add,
        );
        self.add(
            "add",
            &[T::TEXT, T::TEXT],
            T::TEXT,
            "Text",
            "Concatenation of two texts",
            builtin_concat,
        );
        self.add(
            "add",
            &[T::DATE_TIME, T::TIME_SPAN],
            T::DATE_TIME,
            "Time",
            "A date-time moved forward by a span",
            builtin_add_span_to_date,
        );
        self.add(
            "add",
            &[T::TIME_SPAN, T::TIME_SPAN],
            T::TIME_SPAN,
            "Time",
            "Sum of two spans",
            builtin_add_spans,
        );
        self.add(
            "subtract",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Difference of two numbers",
            builtin_sub,
        );
        self.add(
            "subtract",
            &[T::DATE_TIME, T::DATE_TIME],
            T::TIME_SPAN,
            "Time",
            "Span between two date-times",
            builtin_date_difference,
        );
        self.add(
            "multiply",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Product of two numbers",
            builtin_mul,
        );
        self.add(
            "divide",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Quotient of two numbers",
            builtin_div,
        );
        self.add(
            "modulo",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Remainder of a division",
            builtin_mod,
        );
        self.add(
            "min",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Smaller of two numbers",
            builtin_min,
        );
        self.add(
            "max",
            &[n.clone(), n.clone()],
            n.clone(),
            "Math",
            "Larger of two numbers",
            builtin_max,
        );
        self.add("sqrt", &[n.clone()], n.clone(), "Math", "Square root", builtin_sqrt);
        self.add(
            "pow",
            &[n.clone(), n.clone()],
            n,
            "Math",
            "First number raised to the second",
            builtin_pow,
        );
    }

    fn register_comparison_functions(&mut self) {
        use TypeDescriptor as T;
        let item = T::COLLECTION_ITEM;
        let n = T::NUMBER;

        self.add(
            "equal",
            &[item.clone(), item.clone()],
            T::BOOLEAN,
            "Comparison",
            "True if both values are equal",
            builtin_equal,
        );
        self.add(
            "notequal",
            &[item.clone(), item],
            T::BOOLEAN,
            "Comparison",
            "True if the values differ",
            builtin_not_equal,
        );
        self.add(
            "greater",
            &[n.clone(), n.clone()],
            T::BOOLEAN,
            "Comparison",
            "First > second",
            builtin_greater,
        );
        self.add(
            "less",
            &[n.clone(), n.clone()],
            T::BOOLEAN,
            "Comparison",
            "First < second",
            builtin_less,
        );
        self.add(
            "greaterequal",
            &[n.clone(), n.clone()],
            T::BOOLEAN,
            "Comparison",
            "First >= second",
            builtin_greater_equal,
        );
        self.add(
            "lessequal",
            &[n.clone(), n],
            T::BOOLEAN,
            "Comparison",
            "First <= second",
            builtin_less_equal,
        );
        self.add(
            "greater",
            &[T::DATE_TIME, T::DATE_TIME],
            T::BOOLEAN,
            "Comparison",
            "First is later",
            builtin_later,
        );
        self.add(
            "less",
            &[T::DATE_TIME, T::DATE_TIME],
            T::BOOLEAN,
            "Comparison",
            "First is earlier",
            builtin_earlier,
        );
    }

    fn register_logic_functions(&mut self) {
        use TypeDescriptor as T;
        let b = T::BOOLEAN;

        self.add("and", &[b.clone(), b.clone()], b.clone(), "Logic", "Both are true", builtin_and);
        self.add("or", &[b.clone(), b.clone()], b.clone(), "Logic", "Either is true", builtin_or);
        self.add("not", &[b.clone()], b, "Logic", "Negation", builtin_not);
    }

    fn register_text_functions(&mut self) {
        use TypeDescriptor as T;

        self.add(
            "totext",
            &[T::ANYTHING],
            T::TEXT,
            "Text",
            "Text form of any value",
            builtin_to_text,
        );
        self.add(
            "contains",
            &[T::TEXT, T::TEXT],
            T::BOOLEAN,
            "Text",
            "True if the first text contains the second, ignoring case",
            builtin_text_contains,
        );
    }

    fn register_collection_functions(&mut self) {
        use TypeDescriptor as T;

        self.add(
            "contains",
            &[T::bare_collection(), T::COLLECTION_ITEM],
            T::BOOLEAN,
            "Collections",
            "True if the collection holds the value",
            builtin_collection_contains,
        );
        self.add(
            "range",
            &[T::NUMBER, T::NUMBER],
            T::collection_of(T::NUMBER),
            "Collections",
            "Whole numbers from the first to the second, inclusive",
            builtin_range,
        );
    }

    fn register_time_functions(&mut self) {
        use TypeDescriptor as T;

        self.add("now", &[], T::DATE_TIME, "Time", "The current date and time (UTC)", builtin_now);
        self.add(
            "days",
            &[T::NUMBER],
            T::TIME_SPAN,
            "Time",
            "A span of the given number of days",
            builtin_days,
        );
        self.add(
            "hours",
            &[T::NUMBER],
            T::TIME_SPAN,
            "Time",
            "A span of the given number of hours",
            builtin_hours,
        );
        self.add(
            "minutes",
            &[T::NUMBER],
            T::TIME_SPAN,
            "Time",
            "A span of the given number of minutes",
            builtin_minutes,
        );
    }

    fn register_null_functions(&mut self) {
        use TypeDescriptor as T;

        for ty in [
            T::ANYTHING,
            T::bare_collection(),
            T::bare_dictionary(),
            T::bare_collection_dictionary(),
        ] {
            self.add(
                "isnull",
                &[ty],
                T::BOOLEAN,
                "Null",
                "True if the value is null",
                builtin_is_null,
            );
        }
    }
}

// Argument helpers

fn arg(args: &[Value], index: usize) -> Result<&Value> {
    args.get(index)
        .ok_or_else(|| ScriptError::runtime(format!("Missing argument {}", index + 1)))
}

fn mismatch(index: usize, expected: &str, value: &Value) -> ScriptError {
    ScriptError::runtime(format!(
        "Argument {} must be {}, not {}",
        index + 1,
        expected,
        value.prog_type()
    ))
}

fn number(args: &[Value], index: usize) -> Result<f64> {
    let value = arg(args, index)?;
    value
        .as_number()
        .ok_or_else(|| mismatch(index, "a Number", value))
}

fn boolean(args: &[Value], index: usize) -> Result<bool> {
    let value = arg(args, index)?;
    value
        .as_bool()
        .ok_or_else(|| mismatch(index, "a Boolean", value))
}

fn text(args: &[Value], index: usize) -> Result<&str> {
    let value = arg(args, index)?;
    value
        .as_text()
        .ok_or_else(|| mismatch(index, "Text", value))
}

fn date_time(args: &[Value], index: usize) -> Result<chrono::DateTime<Utc>> {
    let value = arg(args, index)?;
    value
        .as_date_time()
        .ok_or_else(|| mismatch(index, "a DateTime", value))
}

fn time_span(args: &[Value], index: usize) -> Result<TimeDelta> {
    let value = arg(args, index)?;
    value
        .as_time_span()
        .ok_or_else(|| mismatch(index, "a TimeSpan", value))
}

fn span_of(amount: f64, unit_millis: f64) -> Result<TimeDelta> {
    let millis = amount * unit_millis;
    if !millis.is_finite() {
        return Err(ScriptError::runtime("Time span out of range"));
    }
    TimeDelta::try_milliseconds(millis as i64)
        .ok_or_else(|| ScriptError::runtime("Time span out of range"))
}

// Math functions

fn builtin_add(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)? + number(args, 1)?))
}

fn builtin_concat(args: &[Value]) -> Result<Value> {
    Ok(Value::Text(format!("{}{}", text(args, 0)?, text(args, 1)?)))
}

fn builtin_add_span_to_date(args: &[Value]) -> Result<Value> {
    date_time(args, 0)?
        .checked_add_signed(time_span(args, 1)?)
        .map(Value::DateTime)
        .ok_or_else(|| ScriptError::runtime("Date out of range"))
}

fn builtin_add_spans(args: &[Value]) -> Result<Value> {
    time_span(args, 0)?
        .checked_add(&time_span(args, 1)?)
        .map(Value::TimeSpan)
        .ok_or_else(|| ScriptError::runtime("Time span out of range"))
}

fn builtin_sub(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)? - number(args, 1)?))
}

fn builtin_date_difference(args: &[Value]) -> Result<Value> {
    Ok(Value::TimeSpan(date_time(args, 0)? - date_time(args, 1)?))
}

fn builtin_mul(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)? * number(args, 1)?))
}

fn builtin_div(args: &[Value]) -> Result<Value> {
    let divisor = number(args, 1)?;
    if divisor == 0.0 {
        return Err(ScriptError::runtime("divide by zero"));
    }
    Ok(Value::Number(number(args, 0)? / divisor))
}

fn builtin_mod(args: &[Value]) -> Result<Value> {
    let divisor = number(args, 1)?;
    if divisor == 0.0 {
        return Err(ScriptError::runtime("divide by zero"));
    }
    Ok(Value::Number(number(args, 0)? % divisor))
}

fn builtin_min(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)?.min(number(args, 1)?)))
}

fn builtin_max(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)?.max(number(args, 1)?)))
}

fn builtin_sqrt(args: &[Value]) -> Result<Value> {
    let value = number(args, 0)?;
    if value < 0.0 {
        return Err(ScriptError::runtime("Cannot take the square root of a negative number"));
    }
    Ok(Value::Number(value.sqrt()))
}

fn builtin_pow(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(args, 0)?.powf(number(args, 1)?)))
}

// Comparison functions

fn builtin_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(arg(args, 0)? == arg(args, 1)?))
}

fn builtin_not_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(arg(args, 0)? != arg(args, 1)?))
}

fn builtin_greater(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(number(args, 0)? > number(args, 1)?))
}

fn builtin_less(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(number(args, 0)? < number(args, 1)?))
}

fn builtin_greater_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(number(args, 0)? >= number(args, 1)?))
}

fn builtin_less_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(number(args, 0)? <= number(args, 1)?))
}

fn builtin_later(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(date_time(args, 0)? > date_time(args, 1)?))
}

fn builtin_earlier(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(date_time(args, 0)? < date_time(args, 1)?))
}

// Logic functions

fn builtin_and(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(boolean(args, 0)? && boolean(args, 1)?))
}

fn builtin_or(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(boolean(args, 0)? || boolean(args, 1)?))
}

fn builtin_not(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(!boolean(args, 0)?))
}

// Text functions

fn builtin_to_text(args: &[Value]) -> Result<Value> {
    Ok(Value::Text(arg(args, 0)?.to_string()))
}

fn builtin_text_contains(args: &[Value]) -> Result<Value> {
    let haystack = text(args, 0)?.to_lowercase();
    let needle = text(args, 1)?.to_lowercase();
    Ok(Value::Boolean(haystack.contains(&needle)))
}

// Collection functions

fn builtin_collection_contains(args: &[Value]) -> Result<Value> {
    match arg(args, 0)? {
        Value::Collection(collection) => Ok(Value::Boolean(collection.contains(arg(args, 1)?))),
        Value::Null(_) => Ok(Value::Boolean(false)),
        other => Err(ScriptError::runtime(format!(
            "Argument 1 must be a Collection, not {}",
            other.prog_type()
        ))),
    }
}

fn builtin_range(args: &[Value]) -> Result<Value> {
    let from = number(args, 0)?.ceil();
    let to = number(args, 1)?.floor();
    if !from.is_finite() || !to.is_finite() {
        return Err(ScriptError::runtime("Range bounds must be finite"));
    }

    if to < from {
        return Ok(Value::Collection(ProgCollection::new(TypeDescriptor::NUMBER)));
    }
    let span = to - from + 1.0;
    if span > MAX_RANGE_LEN as f64 {
        return Err(ScriptError::runtime(format!(
            "Range of {} numbers exceeds the limit of {}",
            span, MAX_RANGE_LEN
        )));
    }

    let items = (0..span as usize).map(|offset| Value::Number(from + offset as f64)).collect();
    Ok(Value::Collection(ProgCollection::from_checked(TypeDescriptor::NUMBER, items)))
}

// Time functions

fn builtin_now(_args: &[Value]) -> Result<Value> {
    Ok(Value::DateTime(Utc::now()))
}

fn builtin_days(args: &[Value]) -> Result<Value> {
    span_of(number(args, 0)?, 86_400_000.0).map(Value::TimeSpan)
}

fn builtin_hours(args: &[Value]) -> Result<Value> {
    span_of(number(args, 0)?, 3_600_000.0).map(Value::TimeSpan)
}

fn builtin_minutes(args: &[Value]) -> Result<Value> {
    span_of(number(args, 0)?, 60_000.0).map(Value::TimeSpan)
}

// Null guard

fn builtin_is_null(args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(arg(args, 0)?.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn call(catalog: &BuiltinCatalog, name: &str, args: &[Value]) -> Result<Value> {
        let types: Vec<_> = args.iter().map(Value::prog_type).collect();
        let definition = catalog
            .overloads(name)
            .iter()
            .find(|definition| definition.parameters.matches(&types))
            .unwrap_or_else(|| panic!("no overload of {} for {:?}", name, types));
        definition.invoke(args)
    }

    #[test]
    fn test_math_functions() {
        let catalog = BuiltinCatalog::new();

        assert_eq!(call(&catalog, "add", &[5.0.into(), 3.0.into()]).unwrap(), Value::Number(8.0));
        assert_eq!(
            call(&catalog, "subtract", &[10.0.into(), 4.0.into()]).unwrap(),
            Value::Number(6.0)
        );
        assert_eq!(
            call(&catalog, "multiply", &[6.0.into(), 7.0.into()]).unwrap(),
            Value::Number(42.0)
        );
        assert_eq!(
            call(&catalog, "divide", &[20.0.into(), 4.0.into()]).unwrap(),
            Value::Number(5.0)
        );
        assert_eq!(
            call(&catalog, "pow", &[2.0.into(), 10.0.into()]).unwrap(),
            Value::Number(1024.0)
        );
        assert!(call(&catalog, "sqrt", &[(-4.0).into()]).is_err());
    }

    #[test]
    fn test_divide_by_zero() {
        let catalog = BuiltinCatalog::new();
        let err = call(&catalog, "divide", &[1.0.into(), 0.0.into()]).unwrap_err();
        assert_eq!(err.to_string(), "divide by zero");
        assert!(call(&catalog, "modulo", &[1.0.into(), 0.0.into()]).is_err());
    }

    #[test]
    fn test_add_overloads() {
        let catalog = BuiltinCatalog::new();
        assert_eq!(catalog.overloads("ADD").len(), 4);

        assert_eq!(
            call(&catalog, "add", &["fire".into(), "ball".into()]).unwrap(),
            Value::from("fireball")
        );
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = call(&catalog, "add", &[start.into(), TimeDelta::hours(36).into()]).unwrap();
        assert_eq!(later, Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_string_functions() {
        let catalog = BuiltinCatalog::new();
        assert_eq!(
            call(&catalog, "contains", &["The Red Dragon".into(), "red".into()]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(call(&catalog, "totext", &[12.0.into()]).unwrap(), Value::from("12"));
    }

    #[test]
    fn test_collection_functions() {
        let catalog = BuiltinCatalog::new();
        let range = call(&catalog, "range", &[1.0.into(), 3.0.into()]).unwrap();
        assert_eq!(range.to_string(), "[1, 2, 3]");
        assert_eq!(
            call(&catalog, "contains", &[range, 2.0.into()]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_range_is_bounded() {
        let catalog = BuiltinCatalog::new();
        assert!(matches!(
            call(&catalog, "range", &[0.0.into(), 1e12.into()]),
            Err(ScriptError::Runtime(_))
        ));
        assert!(call(&catalog, "range", &[0.0.into(), f64::INFINITY.into()]).is_err());

        let empty = call(&catalog, "range", &[5.0.into(), 1.0.into()]).unwrap();
        assert_eq!(empty.to_string(), "[]");

        let last = (MAX_RANGE_LEN - 1) as f64;
        let full = call(&catalog, "range", &[0.0.into(), last.into()]).unwrap();
        assert!(matches!(full, Value::Collection(items) if items.count() == MAX_RANGE_LEN));
    }

    #[test]
    fn test_is_null_accepts_every_shape() {
        let catalog = BuiltinCatalog::new();
        assert_eq!(
            call(&catalog, "isnull", &[Value::null(TypeDescriptor::NUMBER)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            call(&catalog, "isnull", &[Value::Collection(ProgCollection::bare())]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            call(&catalog, "isnull", &[Value::null(TypeDescriptor::bare_dictionary())]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_duplicate_signature_is_rejected() {
        let mut catalog = BuiltinCatalog::new();
        let before = catalog.overload_count();
        let duplicate = BuiltinDefinition::new(
            "Sqrt",
            Parameters::from_types(&[TypeDescriptor::NUMBER]),
            TypeDescriptor::NUMBER,
            "Math",
            "",
            Arc::new(builtin_sqrt),
        );
        assert!(!catalog.register(duplicate));
        assert_eq!(catalog.overload_count(), before);
    }
}
