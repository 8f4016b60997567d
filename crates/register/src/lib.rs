//! # Progs Variable Register
//!
//! Builder-declared extra fields on semantic types.
//!
//! World builders may attach variables such as a character's `reputation`
//! without touching host code. The schema and the per-instance values are
//! both mutable at any time, unlike the dot-reference registry, and are
//! never consulted by the compiler: scripts reach them through the
//! `getregister` / `setregister` built-ins.

mod builtins;
mod error;
mod register;
mod snapshot;

pub use builtins::install_builtins;
pub use error::{RegisterError, Result};
pub use register::{RegisteredVariable, VariableRegister};
pub use snapshot::{RegisterSnapshot, StoredValue, ValueRecord, VariableRecord};
