//! Programs
//!
//! A [`Program`] is the unit the host calls: a name, a parameter
//! signature, a return type and a compiled statement tree. Compilation is a
//! static check of that tree; it never panics and records its outcome in
//! [`Program::compile_error`].
//!
//! # Calling convention
//!
//! [`Program::execute`] returns a `Result`. The typed helpers
//! ([`Program::execute_bool`], [`Program::execute_int`], ...) never fail:
//! when the program errors, returns null or returns a value of the wrong
//! type, they hand back the caller's default.
//!
//! # Example
//!
//! ```
//! use progs_core::TypeDescriptor;
//! use progs_scripting::statement::{Constant, Return};
//! use progs_scripting::{Program, Value};
//!
//! let mut program = Program::builder("answer")
//!     .returns(TypeDescriptor::NUMBER)
//!     .body(Box::new(Return::value(Box::new(Constant::literal(Value::Number(42.0))))))
//!     .build();
//! assert!(program.compile());
//! assert_eq!(program.execute_int(-1, &[]), 42);
//! ```

use crate::context::{ExecutionContext, ExecutionLimits};
use crate::signature::{Parameter, Parameters};
use crate::statement::{Statement, StatementResult, TypeChecker};
use crate::value::{FromValue, Gender, ProgCollection, Value};
use crate::variables::VariableSpace;
use crate::{Result, ScriptError};
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use progs_core::{ProgramId, TypeDescriptor};

/// Name of the collection variable holding an "accepts any" program's arguments
pub const ARGS_VARIABLE: &str = "args";

/// Front end turning program source into a statement tree
pub trait ProgramParser {
    fn parse(&self, program: &Program) -> std::result::Result<Box<dyn Statement>, String>;
}

impl<F> ProgramParser for F
where
    F: Fn(&Program) -> std::result::Result<Box<dyn Statement>, String>,
{
    fn parse(&self, program: &Program) -> std::result::Result<Box<dyn Statement>, String> {
        self(program)
    }
}

/// A compiled unit of the progs language
#[derive(Debug)]
pub struct Program {
    id: Option<ProgramId>,
    name: String,
    category: String,
    subcategory: String,
    parameters: Parameters,
    return_type: TypeDescriptor,
    source: String,
    body: Option<Box<dyn Statement>>,
    compiled: bool,
    compile_error: Option<String>,
    limits: ExecutionLimits,
}

impl Program {
    pub fn builder(name: impl Into<String>) -> ProgramBuilder {
        ProgramBuilder::new(name)
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ProgramId) {
        self.id = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ExecutionLimits) {
        self.limits = limits;
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Message from the last failed compile, `None` after a success
    pub fn compile_error(&self) -> Option<&str> {
        self.compile_error.as_deref()
    }

    /// Replace the statement tree; the program must be compiled again
    pub fn set_body(&mut self, body: Box<dyn Statement>) {
        self.body = Some(body);
        self.compiled = false;
    }

    /// Replace the source text; the program must be compiled again
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.body = None;
        self.compiled = false;
    }

    /// Whether arguments of `arg_types` fit this program's signature
    pub fn matches_parameters(&self, arg_types: &[TypeDescriptor]) -> bool {
        self.parameters.matches(arg_types)
    }

    /// Statically check the program
    ///
    /// Returns true on success. Compiling an already compiled program is a
    /// no-op; a failure leaves the reason in [`Program::compile_error`].
    pub fn compile(&mut self) -> bool {
        if self.compiled {
            return true;
        }

        match self.check() {
            Ok(()) => {
                tracing::debug!("Compiled program {}", self.name);
                self.compiled = true;
                self.compile_error = None;
                true
            }
            Err(message) => {
                tracing::debug!("Program {} failed to compile: {}", self.name, message);
                self.compile_error = Some(message);
                false
            }
        }
    }

    /// Parse the source with `parser`, then compile
    pub fn compile_with(&mut self, parser: &dyn ProgramParser) -> bool {
        if self.compiled {
            return true;
        }
        if self.source.trim().is_empty() {
            self.compile_error = Some("Program has no source".to_string());
            return false;
        }

        match parser.parse(self) {
            Ok(body) => {
                self.body = Some(body);
                self.compile()
            }
            Err(message) => {
                tracing::debug!("Program {} failed to parse: {}", self.name, message);
                self.compile_error = Some(message);
                false
            }
        }
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Programs must have a name".to_string());
        }
        if !self.name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!(
                "Program name {} may only contain letters, digits and underscores",
                self.name
            ));
        }
        if self.return_type.is_error() {
            return Err("Program return type is not a valid type".to_string());
        }

        let mut checker = TypeChecker::new(self.return_type.clone().without_literal());
        match &self.parameters {
            Parameters::AcceptsAny => {
                checker.declare(ARGS_VARIABLE, TypeDescriptor::bare_collection())?
            }
            Parameters::Positional(parameters) => {
                for parameter in parameters {
                    if parameter.name.trim().is_empty() {
                        return Err("Parameters must have a name".to_string());
                    }
                    checker
                        .declare(&parameter.name, parameter.ty.clone().without_literal())
                        .map_err(|err| format!("Invalid parameter: {}", err))?;
                }
            }
        }

        let body = self.body.as_ref().ok_or_else(|| "Program has no body".to_string())?;
        body.check(&mut checker)?;

        if !self.return_type.is_void() && !body.is_return_or_contains_return_on_all_branches() {
            return Err(format!(
                "Not all code paths return a value of type {}",
                self.return_type
            ));
        }
        Ok(())
    }

    fn describe_args(args: &[Value]) -> String {
        args.iter()
            .map(|arg| arg.prog_type().describe())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn bind_arguments(&self, args: &[Value]) -> Result<VariableSpace> {
        if !self.compiled {
            return Err(ScriptError::NotCompiled(self.name.clone()));
        }

        let mut variables = VariableSpace::new();
        match &self.parameters {
            Parameters::AcceptsAny => {
                let collected = ProgCollection::from_checked(TypeDescriptor::BARE, args.to_vec());
                variables.declare(ARGS_VARIABLE, Value::Collection(collected));
            }
            Parameters::Positional(parameters) => {
                // Literal-ness is a compile-time property; runtime values never carry it
                let fits = parameters.len() == args.len()
                    && parameters.iter().zip(args).all(|(parameter, arg)| {
                        arg.prog_type().compatible_with(&parameter.ty.clone().without_literal())
                    });
                if !fits {
                    return Err(ScriptError::ArgumentMismatch {
                        program: self.name.clone(),
                        expected: self.parameters.to_string(),
                        actual: Self::describe_args(args),
                    });
                }
                for (parameter, arg) in parameters.iter().zip(args) {
                    let ty = parameter.ty.clone().without_literal();
                    variables.declare_typed(&parameter.name, ty, arg.clone());
                }
            }
        }
        Ok(variables)
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| ScriptError::NotCompiled(self.name.clone()))?;
        ctx.tick()?;

        let expected = self.return_type.clone().without_literal();
        match body.execute(ctx) {
            StatementResult::Error(message) => {
                tracing::warn!("Program {} failed: {}", self.name, message);
                Err(ScriptError::Runtime(message))
            }
            StatementResult::Return(Some(value)) => {
                if value.prog_type().compatible_with(&expected) {
                    Ok(value)
                } else {
                    Err(ScriptError::runtime(format!(
                        "Program {} returned {} instead of {}",
                        self.name,
                        value.prog_type(),
                        expected
                    )))
                }
            }
            StatementResult::Return(None)
            | StatementResult::Normal
            | StatementResult::Break
            | StatementResult::Continue => Ok(Value::Null(expected)),
        }
    }

    /// Run with positional arguments under the program's own limits
    pub fn execute(&self, args: &[Value]) -> Result<Value> {
        self.execute_with(args, self.limits)
    }

    /// Run with positional arguments under explicit limits
    pub fn execute_with(&self, args: &[Value], limits: ExecutionLimits) -> Result<Value> {
        let variables = self.bind_arguments(args)?;
        let mut ctx = ExecutionContext::with_variables(variables, limits);
        self.run(&mut ctx)
    }

    /// Run with arguments matched to parameters by name
    ///
    /// Parameters without an argument receive a null of their type.
    pub fn execute_named(&self, args: &[(&str, Value)]) -> Result<Value> {
        let Parameters::Positional(parameters) = &self.parameters else {
            let values: Vec<Value> = args.iter().map(|(_, value)| value.clone()).collect();
            return self.execute(&values);
        };

        if let Some((unknown, _)) = args
            .iter()
            .find(|(name, _)| !parameters.iter().any(|p| p.name.eq_ignore_ascii_case(name)))
        {
            return Err(ScriptError::ArgumentMismatch {
                program: self.name.clone(),
                expected: self.parameters.to_string(),
                actual: format!("unknown parameter {}", unknown),
            });
        }

        let values: Vec<Value> = parameters
            .iter()
            .map(|parameter: &Parameter| {
                args.iter()
                    .find(|(name, _)| parameter.name.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| Value::Null(parameter.ty.clone().without_literal()))
            })
            .collect();
        self.execute(&values)
    }

    /// Run as a nested call inside another program's execution
    pub fn call(&self, ctx: &mut ExecutionContext, args: &[Value]) -> Result<Value> {
        let variables = self.bind_arguments(args)?;
        ctx.call_nested(variables, |nested| self.run(nested))?
    }

    fn execute_typed<T: FromValue>(&self, args: &[Value]) -> Option<T> {
        match self.execute(args) {
            Ok(value) if value.is_null() => None,
            Ok(value) => {
                let converted = T::from_value(&value);
                if converted.is_none() {
                    tracing::warn!(
                        "Program {} returned {} where {} was expected, using default",
                        self.name,
                        value.prog_type(),
                        std::any::type_name::<T>()
                    );
                }
                converted
            }
            Err(err) => {
                tracing::warn!(
                    "Program {} did not produce a value, using default: {}",
                    self.name,
                    err
                );
                None
            }
        }
    }

    pub fn execute_bool(&self, default: bool, args: &[Value]) -> bool {
        self.execute_typed(args).unwrap_or(default)
    }

    /// Numeric result truncated toward zero
    pub fn execute_int(&self, default_if_null: i64, args: &[Value]) -> i64 {
        self.execute_typed(args).unwrap_or(default_if_null)
    }

    pub fn execute_number(&self, default: f64, args: &[Value]) -> f64 {
        self.execute_typed(args).unwrap_or(default)
    }

    pub fn execute_string(&self, default: &str, args: &[Value]) -> String {
        self.execute_typed(args).unwrap_or_else(|| default.to_string())
    }

    pub fn execute_date_time(&self, default: DateTime<Utc>, args: &[Value]) -> DateTime<Utc> {
        self.execute_typed(args).unwrap_or(default)
    }

    pub fn execute_time_span(&self, default: TimeDelta, args: &[Value]) -> TimeDelta {
        self.execute_typed(args).unwrap_or(default)
    }

    pub fn execute_gender(&self, default: Gender, args: &[Value]) -> Gender {
        self.execute_typed(args).unwrap_or(default)
    }

    /// Result converted to `T`, `None` on any failure or a null result
    pub fn execute_as<T: FromValue>(&self, args: &[Value]) -> Option<T> {
        self.execute_typed(args)
    }

    /// Items of a collection result; empty if any item does not convert
    pub fn execute_collection<T: FromValue>(&self, args: &[Value]) -> Vec<T> {
        match self.execute(args) {
            Ok(Value::Collection(collection)) => collection
                .iter()
                .map(T::from_value)
                .collect::<Option<Vec<T>>>()
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Program {} returned items that are not {}",
                        self.name,
                        std::any::type_name::<T>()
                    );
                    Vec::new()
                }),
            Ok(Value::Null(_)) => Vec::new(),
            Ok(other) => {
                tracing::warn!(
                    "Program {} returned {} instead of a Collection",
                    self.name,
                    other.prog_type()
                );
                Vec::new()
            }
            Err(err) => {
                tracing::warn!("Program {} did not produce a collection: {}", self.name, err);
                Vec::new()
            }
        }
    }

    /// Entries of a dictionary result; empty if any value does not convert
    pub fn execute_dictionary<T: FromValue>(&self, args: &[Value]) -> IndexMap<String, T> {
        match self.execute(args) {
            Ok(Value::Dictionary(dictionary)) => dictionary
                .iter()
                .map(|(key, value)| T::from_value(value).map(|value| (key.to_string(), value)))
                .collect::<Option<IndexMap<_, _>>>()
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Program {} returned values that are not {}",
                        self.name,
                        std::any::type_name::<T>()
                    );
                    IndexMap::new()
                }),
            Ok(Value::Null(_)) => IndexMap::new(),
            Ok(other) => {
                tracing::warn!(
                    "Program {} returned {} instead of a Dictionary",
                    self.name,
                    other.prog_type()
                );
                IndexMap::new()
            }
            Err(err) => {
                tracing::warn!("Program {} did not produce a dictionary: {}", self.name, err);
                IndexMap::new()
            }
        }
    }
}

/// Builder for [`Program`]
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            program: Program {
                id: None,
                name: name.into(),
                category: String::new(),
                subcategory: String::new(),
                parameters: Parameters::none(),
                return_type: TypeDescriptor::VOID,
                source: String::new(),
                body: None,
                compiled: false,
                compile_error: None,
                limits: ExecutionLimits::default(),
            },
        }
    }

    pub fn id(mut self, id: ProgramId) -> Self {
        self.program.id = Some(id);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.program.category = category.into();
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.program.subcategory = subcategory.into();
        self
    }

    /// Append a positional parameter
    pub fn parameter(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let parameter = Parameter::new(name, ty);
        match &mut self.program.parameters {
            Parameters::Positional(parameters) => parameters.push(parameter),
            Parameters::AcceptsAny => {
                self.program.parameters = Parameters::Positional(vec![parameter])
            }
        }
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.program.parameters = parameters;
        self
    }

    pub fn accepts_any(mut self) -> Self {
        self.program.parameters = Parameters::AcceptsAny;
        self
    }

    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.program.return_type = ty;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.program.source = source.into();
        self
    }

    pub fn body(mut self, body: Box<dyn Statement>) -> Self {
        self.program.body = Some(body);
        self
    }

    pub fn limits(mut self, limits: ExecutionLimits) -> Self {
        self.program.limits = limits;
        self
    }

    pub fn build(self) -> Program {
        self.program
    }
}
