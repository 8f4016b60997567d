//! Statement and function execution model
//!
//! Every statement returns exactly one [`StatementResult`]. Compound
//! statements hand anything other than `Normal` straight back to their
//! parent; loops consume `Break` and `Continue` and let `Return` and
//! `Error` through.
//!
//! Functions are expression nodes: they evaluate to a [`Value`] of a
//! declared return type. [`ExpressionStatement`] runs a function for its
//! side effects.
//!
//! Both node families carry a static `check` against a [`TypeChecker`],
//! which front ends run once through `Program::compile`.

mod bindings;
mod expr;
mod flow;

pub use bindings::{Assign, Declare, ExpressionStatement};
pub use expr::{
    BuiltinCall, CollectionLiteral, Constant, DotReference, ProgramCall, VariableReference,
};
pub use flow::{Block, Break, Continue, ForEach, ForRange, If, Return, Switch, While};

use crate::context::ExecutionContext;
use crate::value::Value;
use crate::{Result, ScriptError};
use progs_core::TypeDescriptor;
use std::collections::HashMap;
use std::fmt::Debug;

/// Control-flow signal returned by every statement
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    Normal,
    Break,
    Continue,
    /// Leave the program, optionally with a value
    Return(Option<Value>),
    /// Recoverable runtime failure; unwinds like `Return`
    Error(String),
}

impl StatementResult {
    pub fn is_normal(&self) -> bool {
        matches!(self, StatementResult::Normal)
    }
}

impl From<ScriptError> for StatementResult {
    fn from(err: ScriptError) -> Self {
        StatementResult::Error(err.to_string())
    }
}

/// An executable statement node
pub trait Statement: Debug + Send + Sync {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult;

    /// Whether every path through this statement ends in a `Return`
    fn is_return_or_contains_return_on_all_branches(&self) -> bool {
        false
    }

    /// Static check, returning a compile error message on failure
    fn check(&self, checker: &mut TypeChecker) -> std::result::Result<(), String>;
}

/// An expression node with a statically known result type
pub trait Function: Debug + Send + Sync {
    fn return_type(&self) -> TypeDescriptor;

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value>;

    fn check(&self, _checker: &mut TypeChecker) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Compile-time state for static checks
#[derive(Debug)]
pub struct TypeChecker {
    return_type: TypeDescriptor,
    scopes: Vec<HashMap<String, TypeDescriptor>>,
    loop_depth: usize,
    breakable_depth: usize,
}

impl TypeChecker {
    pub fn new(return_type: TypeDescriptor) -> Self {
        Self {
            return_type,
            scopes: vec![HashMap::new()],
            loop_depth: 0,
            breakable_depth: 0,
        }
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a variable in the innermost scope
    pub fn declare(&mut self, name: &str, ty: TypeDescriptor) -> std::result::Result<(), String> {
        if ty.is_error() || ty.is_void() {
            return Err(format!("Variable {} cannot have type {}", name, ty));
        }
        let key = name.to_lowercase();
        let Some(scope) = self.scopes.last_mut() else {
            return Err(format!("No scope to declare {} in", name));
        };
        if scope.contains_key(&key) {
            return Err(format!("Variable {} is already declared in this scope", name));
        }
        scope.insert(key, ty);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        let key = name.to_lowercase();
        self.scopes.iter().rev().find_map(|scope| scope.get(&key))
    }

    /// Run `f` inside a loop body
    pub fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.loop_depth += 1;
        self.breakable_depth += 1;
        let result = f(self);
        self.loop_depth -= 1;
        self.breakable_depth -= 1;
        result
    }

    /// Run `f` inside a switch case, where `break` is allowed but `continue` is not
    pub fn in_switch<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.breakable_depth += 1;
        let result = f(self);
        self.breakable_depth -= 1;
        result
    }

    pub fn can_break(&self) -> bool {
        self.breakable_depth > 0
    }

    pub fn can_continue(&self) -> bool {
        self.loop_depth > 0
    }
}

/// Check that `function` yields something usable where `target` is required
pub(crate) fn expect_type(
    function: &dyn Function,
    target: &TypeDescriptor,
    what: &str,
) -> std::result::Result<(), String> {
    let actual = function.return_type();
    if actual.compatible_with(target) {
        Ok(())
    } else {
        Err(format!("{} must be {}, not {}", what, target, actual))
    }
}
