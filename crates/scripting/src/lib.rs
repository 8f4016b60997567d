//! # Progs Scripting
//!
//! Execution core of the progs language embedded in the world server.
//!
//! ## Features
//! - Typed runtime values with dot-reference properties
//! - Dot-reference registry shared by the compiler and the runtime
//! - Statement tree with explicit control-flow results
//! - Programs with typed, fail-closed execution helpers
//! - Built-in functions and overload resolution
//!
//! ## Startup
//!
//! The host builds a [`DotReferenceRegistry`] and a [`ProgramCatalog`] once,
//! before any program runs, and shares both read-only afterwards. Programs
//! execute synchronously on the calling thread; the host bounds them with
//! [`ExecutionLimits`].

pub mod builtins;
pub mod catalog;
pub mod context;
pub mod error;
pub mod program;
pub mod registry;
pub mod signature;
pub mod statement;
pub mod value;
pub mod variables;

pub use builtins::{BuiltinCatalog, BuiltinDefinition, BuiltinFn};
pub use catalog::{Callable, ProgramCatalog};
pub use context::{ExecutionContext, ExecutionLimits};
pub use error::{Result, ScriptError};
pub use program::{Program, ProgramBuilder, ProgramParser, ARGS_VARIABLE};
pub use registry::{
    dispatch, DotReferenceRegistry, DotReferenceRegistryBuilder, DotReferences, Property,
    PropertyError, PropertyReturn, RegistryError,
};
pub use signature::{Parameter, Parameters};
pub use statement::{Function, Statement, StatementResult, TypeChecker};
pub use value::{
    FromValue, Gender, HostObject, ProgCollection, ProgCollectionDictionary, ProgDictionary, Value,
};
pub use variables::VariableSpace;
