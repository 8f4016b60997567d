//! Variable declaration, assignment and expression statements

use super::{expect_type, Function, Statement, StatementResult, TypeChecker};
use crate::context::ExecutionContext;
use crate::value::Value;
use progs_core::TypeDescriptor;

/// Declare a local variable, optionally initialised
///
/// Without an initialiser the variable starts as a null of its type.
#[derive(Debug)]
pub struct Declare {
    name: String,
    ty: TypeDescriptor,
    initial: Option<Box<dyn Function>>,
}

impl Declare {
    pub fn new(
        name: impl Into<String>,
        ty: TypeDescriptor,
        initial: Option<Box<dyn Function>>,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ty.without_literal(),
            initial,
        }
    }
}

impl Statement for Declare {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        let value = match &self.initial {
            None => Value::Null(self.ty.clone()),
            Some(initial) => match initial.evaluate(ctx) {
                Ok(value) => value,
                Err(err) => return err.into(),
            },
        };
        if !value.prog_type().compatible_with(&self.ty) {
            return StatementResult::Error(format!(
                "Cannot store {} in variable {} of type {}",
                value.prog_type(),
                self.name,
                self.ty
            ));
        }
        ctx.variables.declare_typed(&self.name, self.ty.clone(), value);
        StatementResult::Normal
    }

    fn check(&self, checker: &mut TypeChecker) -> std::result::Result<(), String> {
        if let Some(initial) = &self.initial {
            initial.check(checker)?;
            expect_type(initial.as_ref(), &self.ty, &format!("Initial value of {}", self.name))?;
        }
        checker.declare(&self.name, self.ty.clone())
    }
}

/// Overwrite an existing variable
#[derive(Debug)]
pub struct Assign {
    name: String,
    value: Box<dyn Function>,
}

impl Assign {
    pub fn new(name: impl Into<String>, value: Box<dyn Function>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Statement for Assign {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        let value = match self.value.evaluate(ctx) {
            Ok(value) => value,
            Err(err) => return err.into(),
        };
        let Some(target) = ctx.variables.declared_type(&self.name) else {
            return StatementResult::Error(format!("Variable {} is not declared", self.name));
        };
        if !value.prog_type().compatible_with(target) {
            return StatementResult::Error(format!(
                "Cannot store {} in variable {} of type {}",
                value.prog_type(),
                self.name,
                target
            ));
        }
        ctx.variables.set(&self.name, value);
        StatementResult::Normal
    }

    fn check(&self, checker: &mut TypeChecker) -> std::result::Result<(), String> {
        self.value.check(checker)?;
        let target = checker
            .lookup(&self.name)
            .cloned()
            .ok_or_else(|| format!("Variable {} is not declared", self.name))?;
        expect_type(self.value.as_ref(), &target, &format!("Value assigned to {}", self.name))
    }
}

/// Evaluate a function and discard its result
#[derive(Debug)]
pub struct ExpressionStatement {
    function: Box<dyn Function>,
}

impl ExpressionStatement {
    pub fn new(function: Box<dyn Function>) -> Self {
        Self { function }
    }
}

impl Statement for ExpressionStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> StatementResult {
        match self.function.evaluate(ctx) {
            Ok(_) => StatementResult::Normal,
            Err(err) => err.into(),
        }
    }

    fn check(&self, checker: &mut TypeChecker) -> std::result::Result<(), String> {
        self.function.check(checker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Constant;

    #[test]
    fn test_declare_without_initial_is_typed_null() {
        let mut ctx = ExecutionContext::default();
        let character = TypeDescriptor::scalar(progs_core::ElementKind::Character);
        let declare = Declare::new("target", character, None);
        assert_eq!(declare.execute(&mut ctx), StatementResult::Normal);
        let value = ctx.variables.get("target").unwrap();
        assert!(value.is_null());
        assert_eq!(value.prog_type().describe(), "Character");
    }

    #[test]
    fn test_declare_strips_literal_from_variable_type() {
        let mut checker = TypeChecker::new(TypeDescriptor::VOID);
        let declare = Declare::new(
            "x",
            TypeDescriptor::NUMBER.as_literal(),
            Some(Box::new(Constant::literal(Value::Number(1.0)))),
        );
        declare.check(&mut checker).unwrap();
        assert_eq!(checker.lookup("x"), Some(&TypeDescriptor::NUMBER));
    }

    #[test]
    fn test_assign_to_undeclared_fails() {
        let mut ctx = ExecutionContext::default();
        let assign = Assign::new("ghost", Box::new(Constant::new(Value::Number(1.0))));
        assert!(matches!(assign.execute(&mut ctx), StatementResult::Error(_)));

        let mut checker = TypeChecker::new(TypeDescriptor::VOID);
        assert!(assign.check(&mut checker).is_err());
    }

    #[test]
    fn test_assign_type_mismatch_is_rejected_at_runtime() {
        let mut ctx = ExecutionContext::default();
        let declare = Declare::new("name", TypeDescriptor::TEXT, None);
        assert_eq!(declare.execute(&mut ctx), StatementResult::Normal);

        let assign = Assign::new("name", Box::new(Constant::new(Value::Number(3.0))));
        match assign.execute(&mut ctx) {
            StatementResult::Error(message) => assert!(message.contains("Text")),
            other => panic!("expected an error, got {:?}", other),
        }
        assert!(ctx.variables.get("name").is_some_and(Value::is_null));

        let assign = Assign::new("name", Box::new(Constant::new(Value::from("Bob"))));
        assert_eq!(assign.execute(&mut ctx), StatementResult::Normal);
        assert_eq!(ctx.variables.get("name"), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_assign_type_mismatch_is_rejected_statically() {
        let mut checker = TypeChecker::new(TypeDescriptor::VOID);
        checker.declare("name", TypeDescriptor::TEXT).unwrap();
        let assign = Assign::new("name", Box::new(Constant::new(Value::Number(3.0))));
        let err = assign.check(&mut checker).unwrap_err();
        assert!(err.contains("Text"));
    }
}
