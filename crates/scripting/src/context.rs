//! Script execution context
//!
//! Carries the state threaded through one top-level execution: the
//! variable space, the step counter and the nested call depth.

use crate::variables::VariableSpace;
use crate::{Result, ScriptError};

/// Budgets imposed by the host on a single execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Maximum statements executed, `None` for unlimited
    pub max_steps: Option<u64>,
    /// Maximum depth of nested program calls
    pub max_call_depth: usize,
}

impl ExecutionLimits {
    pub const UNLIMITED: Self = Self {
        max_steps: None,
        max_call_depth: usize::MAX,
    };
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_call_depth: 64,
        }
    }
}

/// Execution context
#[derive(Debug)]
pub struct ExecutionContext {
    pub variables: VariableSpace,
    limits: ExecutionLimits,
    steps: u64,
    depth: usize,
}

impl ExecutionContext {
    /// Create a context with an empty variable space
    pub fn new(limits: ExecutionLimits) -> Self {
        Self::with_variables(VariableSpace::new(), limits)
    }

    pub fn with_variables(variables: VariableSpace, limits: ExecutionLimits) -> Self {
        Self {
            variables,
            limits,
            steps: 0,
            depth: 0,
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Statements executed so far, nested calls included
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Count one statement against the step budget
    pub fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => Err(ScriptError::StepBudgetExhausted(max)),
            _ => Ok(()),
        }
    }

    /// Run `f` with `variables` as the active space, one call level deeper
    ///
    /// The step counter is shared with the caller, so a nested program
    /// draws on the same budget.
    pub fn call_nested<T>(
        &mut self,
        variables: VariableSpace,
        f: impl FnOnce(&mut ExecutionContext) -> T,
    ) -> Result<T> {
        if self.depth >= self.limits.max_call_depth {
            return Err(ScriptError::CallDepthExceeded(self.limits.max_call_depth));
        }

        let saved = std::mem::replace(&mut self.variables, variables);
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        self.variables = saved;
        Ok(result)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(ExecutionLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_step_budget() {
        let mut ctx = ExecutionContext::new(ExecutionLimits {
            max_steps: Some(2),
            max_call_depth: 4,
        });
        assert!(ctx.tick().is_ok());
        assert!(ctx.tick().is_ok());
        assert!(matches!(ctx.tick(), Err(ScriptError::StepBudgetExhausted(2))));
    }

    #[test]
    fn test_nested_call_restores_variables() {
        let mut ctx = ExecutionContext::default();
        ctx.variables.declare("outer", Value::Number(1.0));

        let mut inner = VariableSpace::new();
        inner.declare("inner", Value::Number(2.0));
        let seen = ctx
            .call_nested(inner, |nested| {
                (
                    nested.variables.contains("outer"),
                    nested.variables.contains("inner"),
                    nested.depth(),
                )
            })
            .unwrap();

        assert_eq!(seen, (false, true, 1));
        assert!(ctx.variables.contains("outer"));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut ctx = ExecutionContext::new(ExecutionLimits {
            max_steps: None,
            max_call_depth: 1,
        });
        let result = ctx.call_nested(VariableSpace::new(), |nested| {
            nested.call_nested(VariableSpace::new(), |_| ())
        });
        assert!(matches!(result, Ok(Err(ScriptError::CallDepthExceeded(1)))));
    }
}
