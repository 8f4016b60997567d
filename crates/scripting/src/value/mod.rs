//! Runtime values
//!
//! A [`Value`] is the boxed, typed datum that flows through a running
//! program. Values are built fresh for each evaluation and never mutated
//! once handed to a statement; property reads go through [`Value::get_property`],
//! which dispatches on the same tables the registry was built from.

mod collections;
mod host;
mod properties;

pub use collections::{ProgCollection, ProgCollectionDictionary, ProgDictionary};
pub use host::HostObject;
pub use properties::VoidValue;

use crate::registry::{dispatch, PropertyError};
use chrono::{DateTime, TimeDelta, Utc};
use progs_core::{ElementKind, TypeDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Grammatical gender of a perceivable thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    Neuter,
    Male,
    Female,
    NonBinary,
    #[default]
    Indeterminate,
}

impl Gender {
    pub const ALL: [Gender; 5] = [
        Gender::Neuter,
        Gender::Male,
        Gender::Female,
        Gender::NonBinary,
        Gender::Indeterminate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gender::Neuter => "Neuter",
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NonBinary => "Non-Binary",
            Gender::Indeterminate => "Indeterminate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|gender| gender.name().eq_ignore_ascii_case(name.trim()))
    }

    /// he / she / it / they
    pub fn subjective(self) -> &'static str {
        match self {
            Gender::Male => "he",
            Gender::Female => "she",
            Gender::Neuter => "it",
            Gender::NonBinary | Gender::Indeterminate => "they",
        }
    }

    /// him / her / it / them
    pub fn objective(self) -> &'static str {
        match self {
            Gender::Male => "him",
            Gender::Female => "her",
            Gender::Neuter => "it",
            Gender::NonBinary | Gender::Indeterminate => "them",
        }
    }

    /// his / her / its / their
    pub fn possessive(self) -> &'static str {
        match self {
            Gender::Male => "his",
            Gender::Female => "her",
            Gender::Neuter => "its",
            Gender::NonBinary | Gender::Indeterminate => "their",
        }
    }
}

/// A runtime value of the progs language
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value of the given type
    Null(TypeDescriptor),
    Boolean(bool),
    Number(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    TimeSpan(TimeDelta),
    Gender(Gender),
    Collection(ProgCollection),
    Dictionary(ProgDictionary),
    CollectionDictionary(ProgCollectionDictionary),
    /// A host domain object (character, item, location, ...)
    Host(Arc<dyn HostObject>),
}

impl Value {
    pub fn null(ty: impl Into<TypeDescriptor>) -> Self {
        Value::Null(ty.into())
    }

    pub fn void() -> Self {
        Value::Null(TypeDescriptor::VOID)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// The type this value is tagged with
    pub fn prog_type(&self) -> TypeDescriptor {
        match self {
            Value::Null(ty) => ty.clone(),
            Value::Boolean(_) => TypeDescriptor::BOOLEAN,
            Value::Number(_) => TypeDescriptor::NUMBER,
            Value::Text(_) => TypeDescriptor::TEXT,
            Value::DateTime(_) => TypeDescriptor::DATE_TIME,
            Value::TimeSpan(_) => TypeDescriptor::TIME_SPAN,
            Value::Gender(_) => TypeDescriptor::GENDER,
            Value::Collection(collection) => collection.prog_type(),
            Value::Dictionary(dictionary) => dictionary.prog_type(),
            Value::CollectionDictionary(dictionary) => dictionary.prog_type(),
            Value::Host(object) => TypeDescriptor::scalar(object.kind()),
        }
    }

    /// Read a dot-reference property (case-insensitive)
    pub fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
        let found = match self {
            Value::Null(_) => {
                return Err(PropertyError::NullReference {
                    property: name.to_string(),
                })
            }
            Value::Boolean(value) => dispatch(value, name),
            Value::Number(value) => dispatch(value, name),
            Value::Text(value) => dispatch(value, name),
            Value::DateTime(value) => dispatch(value, name),
            Value::TimeSpan(value) => dispatch(value, name),
            Value::Gender(value) => dispatch(value, name),
            Value::Collection(value) => dispatch(value, name),
            Value::Dictionary(value) => dispatch(value, name),
            Value::CollectionDictionary(value) => dispatch(value, name),
            Value::Host(object) => object.get_property(name),
        };
        found.ok_or_else(|| PropertyError::UnknownProperty {
            owner: self.prog_type().describe(),
            property: name.to_string(),
        })
    }

    /// Null of `ty` unless `ty` is a value type, then its default host value
    fn null_kind(&self) -> Option<ElementKind> {
        match self {
            Value::Null(ty) if ty.is_value_type() => ty.single_kind(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => (self.null_kind() == Some(ElementKind::Boolean)).then_some(false),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => (self.null_kind() == Some(ElementKind::Number)).then_some(0.0),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => (self.null_kind() == Some(ElementKind::Text)).then_some(""),
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(value) => Some(*value),
            _ => (self.null_kind() == Some(ElementKind::DateTime)).then(DateTime::<Utc>::default),
        }
    }

    pub fn as_time_span(&self) -> Option<TimeDelta> {
        match self {
            Value::TimeSpan(value) => Some(*value),
            _ => (self.null_kind() == Some(ElementKind::TimeSpan)).then(TimeDelta::zero),
        }
    }

    pub fn as_gender(&self) -> Option<Gender> {
        match self {
            Value::Gender(value) => Some(*value),
            _ => (self.null_kind() == Some(ElementKind::Gender)).then(Gender::default),
        }
    }

    pub fn as_collection(&self) -> Option<&ProgCollection> {
        match self {
            Value::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&ProgDictionary> {
        match self {
            Value::Dictionary(dictionary) => Some(dictionary),
            _ => None,
        }
    }

    pub fn as_collection_dictionary(&self) -> Option<&ProgCollectionDictionary> {
        match self {
            Value::CollectionDictionary(dictionary) => Some(dictionary),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&Arc<dyn HostObject>> {
        match self {
            Value::Host(object) => Some(object),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(_), Value::Null(_)) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
            (Value::Gender(a), Value::Gender(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            (Value::CollectionDictionary(a), Value::CollectionDictionary(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a.kind() == b.kind() && a.id() == b.id(),
            _ => false,
        }
    }
}

fn format_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

fn format_time_span(f: &mut fmt::Formatter<'_>, span: TimeDelta) -> fmt::Result {
    let sign = if span < TimeDelta::zero() { "-" } else { "" };
    let span = span.abs();
    write!(
        f,
        "{}{}d {}h {}m {}s",
        sign,
        span.num_days(),
        span.num_hours() % 24,
        span.num_minutes() % 60,
        span.num_seconds() % 60
    )
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => f.write_str("null"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Number(value) => format_number(f, *value),
            Value::Text(value) => f.write_str(value),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Value::TimeSpan(value) => format_time_span(f, *value),
            Value::Gender(value) => f.write_str(value.name()),
            Value::Collection(collection) => write_list(f, collection.values()),
            Value::Dictionary(dictionary) => {
                f.write_str("{")?;
                for (i, (key, item)) in dictionary.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                f.write_str("}")
            }
            Value::CollectionDictionary(dictionary) => {
                f.write_str("{")?;
                for (i, (key, items)) in dictionary.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    write_list(f, items)?;
                }
                f.write_str("}")
            }
            Value::Host(object) => f.write_str(&object.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Value::TimeSpan(value)
    }
}

impl From<Gender> for Value {
    fn from(value: Gender) -> Self {
        Value::Gender(value)
    }
}

impl From<ProgCollection> for Value {
    fn from(value: ProgCollection) -> Self {
        Value::Collection(value)
    }
}

impl From<ProgDictionary> for Value {
    fn from(value: ProgDictionary) -> Self {
        Value::Dictionary(value)
    }
}

impl From<ProgCollectionDictionary> for Value {
    fn from(value: ProgCollectionDictionary) -> Self {
        Value::CollectionDictionary(value)
    }
}

impl From<Arc<dyn HostObject>> for Value {
    fn from(value: Arc<dyn HostObject>) -> Self {
        Value::Host(value)
    }
}

/// Conversion out of a runtime value; `None` when the value has another type
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_number()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_date_time()
    }
}

impl FromValue for TimeDelta {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_time_span()
    }
}

impl FromValue for Gender {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_gender()
    }
}

impl FromValue for Arc<dyn HostObject> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_host().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from(true).prog_type(), TypeDescriptor::BOOLEAN);
        assert_eq!(Value::from(4.0).prog_type(), TypeDescriptor::NUMBER);
        assert_eq!(Value::from("x").prog_type(), TypeDescriptor::TEXT);
        assert_eq!(Value::from(Gender::Male).prog_type(), TypeDescriptor::GENDER);
        assert_eq!(
            Value::null(ElementKind::Character).prog_type(),
            TypeDescriptor::scalar(ElementKind::Character)
        );
    }

    #[test]
    fn test_null_defaults_for_value_types() {
        assert_eq!(Value::null(ElementKind::Number).as_number(), Some(0.0));
        assert_eq!(Value::null(ElementKind::Text).as_text(), Some(""));
        assert_eq!(Value::null(ElementKind::Boolean).as_bool(), Some(false));
        assert_eq!(Value::null(ElementKind::TimeSpan).as_time_span(), Some(TimeDelta::zero()));
        assert_eq!(Value::null(ElementKind::Gender).as_gender(), Some(Gender::Indeterminate));
        assert_eq!(
            Value::null(ElementKind::DateTime).as_date_time(),
            Some(Utc.timestamp_opt(0, 0).unwrap())
        );
        // A null of one value type does not pose as another
        assert_eq!(Value::null(ElementKind::Number).as_text(), None);
    }

    #[test]
    fn test_null_reference_types_are_absent() {
        let null_character = Value::null(ElementKind::Character);
        assert!(null_character.as_host().is_none());
        assert!(Value::null(TypeDescriptor::collection_of(ElementKind::Number))
            .as_collection()
            .is_none());
    }

    #[test]
    fn test_property_on_null_fails() {
        for ty in [TypeDescriptor::TEXT, TypeDescriptor::NUMBER, TypeDescriptor::VOID] {
            let err = Value::null(ty).get_property("Length").unwrap_err();
            assert!(matches!(err, PropertyError::NullReference { .. }));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::TimeSpan(TimeDelta::seconds(90_061)).to_string(), "1d 1h 1m 1s");
        assert_eq!(Value::TimeSpan(TimeDelta::seconds(-61)).to_string(), "-0d 0h 1m 1s");
        let items = vec![1.0.into(), 2.0.into()];
        let items = ProgCollection::from_values(TypeDescriptor::NUMBER, items).unwrap();
        assert_eq!(Value::from(items).to_string(), "[1, 2]");
    }

    #[test]
    fn test_int_conversion_truncates_and_rejects_non_finite() {
        assert_eq!(i64::from_value(&Value::from(2.9)), Some(2));
        assert_eq!(i64::from_value(&Value::from(-2.9)), Some(-2));
        assert_eq!(i64::from_value(&Value::from(f64::NAN)), None);
        assert_eq!(i64::from_value(&Value::from("2")), None);
    }

    #[test]
    fn test_gender_names() {
        assert_eq!(Gender::from_name("non-binary"), Some(Gender::NonBinary));
        assert_eq!(Gender::from_name("robot"), None);
        assert_eq!(Gender::Female.possessive(), "her");
    }
}
