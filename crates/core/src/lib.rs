//! Progs Core - type algebra and shared primitives

mod error;
mod types;
mod idgen;

pub use error::*;
pub use types::*;
pub use idgen::*;
