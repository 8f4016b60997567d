//! Function (expression) nodes

use super::{expect_type, Function, TypeChecker};
use crate::builtins::BuiltinDefinition;
use crate::context::ExecutionContext;
use crate::program::Program;
use crate::registry::{DotReferenceRegistry, PropertyError, RegistryError};
use crate::value::{ProgCollection, Value};
use crate::{Result, ScriptError};
use progs_core::TypeDescriptor;
use std::sync::Arc;

type CheckResult = std::result::Result<(), String>;

fn evaluate_all(args: &[Box<dyn Function>], ctx: &mut ExecutionContext) -> Result<Vec<Value>> {
    args.iter().map(|arg| arg.evaluate(ctx)).collect()
}

fn check_all(args: &[Box<dyn Function>], checker: &mut TypeChecker) -> CheckResult {
    args.iter().try_for_each(|arg| arg.check(checker))
}

fn describe_types(types: &[TypeDescriptor]) -> String {
    types.iter().map(TypeDescriptor::describe).collect::<Vec<_>>().join(", ")
}

/// A fixed value, optionally marked Literal
#[derive(Debug, Clone)]
pub struct Constant {
    value: Value,
    ty: TypeDescriptor,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        let ty = value.prog_type();
        Self { value, ty }
    }

    /// A constant written directly in source
    pub fn literal(value: Value) -> Self {
        let ty = value.prog_type().as_literal();
        Self { value, ty }
    }
}

impl Function for Constant {
    fn return_type(&self) -> TypeDescriptor {
        self.ty.clone()
    }

    fn evaluate(&self, _ctx: &mut ExecutionContext) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Read a variable
#[derive(Debug, Clone)]
pub struct VariableReference {
    name: String,
    ty: TypeDescriptor,
}

impl VariableReference {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self { name: name.into(), ty }
    }
}

impl Function for VariableReference {
    fn return_type(&self) -> TypeDescriptor {
        self.ty.clone()
    }

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        ctx.variables
            .get(&self.name)
            .cloned()
            .ok_or_else(|| ScriptError::runtime(format!("Variable {} is not declared", self.name)))
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        match checker.lookup(&self.name) {
            None => Err(format!("Variable {} is not declared", self.name)),
            Some(declared) if declared.compatible_with(&self.ty) => Ok(()),
            Some(declared) => Err(format!(
                "Variable {} is {}, not {}",
                self.name, declared, self.ty
            )),
        }
    }
}

/// `target.Property`
#[derive(Debug)]
pub struct DotReference {
    target: Box<dyn Function>,
    property: String,
    ty: TypeDescriptor,
}

impl DotReference {
    /// Resolve the property's type against `registry`
    ///
    /// An unknown property yields a node of type Error, reported by
    /// `check`. An owner type with no registered table is a host bug.
    pub fn new(
        registry: &DotReferenceRegistry,
        target: Box<dyn Function>,
        property: impl Into<String>,
    ) -> std::result::Result<Self, RegistryError> {
        let property = property.into();
        let ty = registry.property_type(&target.return_type(), &property)?;
        Ok(Self { target, property, ty })
    }
}

impl Function for DotReference {
    fn return_type(&self) -> TypeDescriptor {
        self.ty.clone()
    }

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let target = self.target.evaluate(ctx)?;
        target.get_property(&self.property).map_err(|err| {
            if let PropertyError::UnknownProperty { owner, property } = &err {
                tracing::error!(
                    "Runtime property miss: {} has no {} but the registry allowed it",
                    owner,
                    property
                );
            }
            err.into()
        })
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        self.target.check(checker)?;
        if self.ty.is_error() {
            return Err(format!(
                "{} has no property named {}",
                self.target.return_type(),
                self.property
            ));
        }
        Ok(())
    }
}

/// `[a, b, c]` with a declared element type
#[derive(Debug)]
pub struct CollectionLiteral {
    element: TypeDescriptor,
    items: Vec<Box<dyn Function>>,
}

impl CollectionLiteral {
    pub fn new(element: TypeDescriptor, items: Vec<Box<dyn Function>>) -> Self {
        Self {
            element: element.without_literal(),
            items,
        }
    }
}

impl Function for CollectionLiteral {
    fn return_type(&self) -> TypeDescriptor {
        TypeDescriptor::collection_of(self.element.clone())
    }

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let mut collection = ProgCollection::new(self.element.clone());
        for value in evaluate_all(&self.items, ctx)? {
            let ty = value.prog_type();
            if !collection.add(value) {
                return Err(ScriptError::runtime(format!(
                    "Cannot add {} to a collection of {}",
                    ty, self.element
                )));
            }
        }
        Ok(Value::Collection(collection))
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        check_all(&self.items, checker)?;
        self.items
            .iter()
            .try_for_each(|item| expect_type(item.as_ref(), &self.element, "Collection item"))
    }
}

/// Call to a built-in function overload
#[derive(Debug)]
pub struct BuiltinCall {
    definition: Arc<BuiltinDefinition>,
    args: Vec<Box<dyn Function>>,
}

impl BuiltinCall {
    pub fn new(definition: Arc<BuiltinDefinition>, args: Vec<Box<dyn Function>>) -> Self {
        Self { definition, args }
    }
}

impl Function for BuiltinCall {
    fn return_type(&self) -> TypeDescriptor {
        self.definition.returns.clone()
    }

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let values = evaluate_all(&self.args, ctx)?;
        self.definition.invoke(&values)
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        check_all(&self.args, checker)?;
        let types: Vec<_> = self.args.iter().map(|arg| arg.return_type()).collect();
        if self.definition.parameters.matches(&types) {
            Ok(())
        } else {
            Err(format!(
                "{} expects ({}) but was given ({})",
                self.definition.name,
                self.definition.parameters,
                describe_types(&types)
            ))
        }
    }
}

/// Call to another compiled program
#[derive(Debug)]
pub struct ProgramCall {
    program: Arc<Program>,
    args: Vec<Box<dyn Function>>,
}

impl ProgramCall {
    pub fn new(program: Arc<Program>, args: Vec<Box<dyn Function>>) -> Self {
        Self { program, args }
    }
}

impl Function for ProgramCall {
    fn return_type(&self) -> TypeDescriptor {
        self.program.return_type().clone()
    }

    fn evaluate(&self, ctx: &mut ExecutionContext) -> Result<Value> {
        let values = evaluate_all(&self.args, ctx)?;
        self.program.call(ctx, &values)
    }

    fn check(&self, checker: &mut TypeChecker) -> CheckResult {
        check_all(&self.args, checker)?;
        if !self.program.is_compiled() {
            return Err(format!("Program {} has not been compiled", self.program.name()));
        }
        let types: Vec<_> = self.args.iter().map(|arg| arg.return_type()).collect();
        if self.program.matches_parameters(&types) {
            Ok(())
        } else {
            Err(format!(
                "{} expects ({}) but was given ({})",
                self.program.name(),
                self.program.parameters(),
                describe_types(&types)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progs_core::ElementKind;

    fn registry() -> DotReferenceRegistry {
        DotReferenceRegistry::with_builtin_kinds().unwrap()
    }

    #[test]
    fn test_literal_constant_type() {
        let constant = Constant::literal(Value::Number(3.0));
        assert!(constant.return_type().is_literal());
        assert!(!Constant::new(Value::Number(3.0)).return_type().is_literal());
    }

    #[test]
    fn test_dot_reference_resolves_and_evaluates() {
        let target = Box::new(Constant::literal(Value::from("goblin")));
        let node = DotReference::new(&registry(), target, "upper").unwrap();
        assert_eq!(node.return_type(), TypeDescriptor::TEXT);

        let mut ctx = ExecutionContext::default();
        assert_eq!(node.evaluate(&mut ctx).unwrap(), Value::from("GOBLIN"));
        assert!(node.check(&mut TypeChecker::new(TypeDescriptor::VOID)).is_ok());
    }

    #[test]
    fn test_unknown_property_fails_check() {
        let target = Box::new(Constant::new(Value::Number(1.0)));
        let node = DotReference::new(&registry(), target, "Colour").unwrap();
        assert!(node.return_type().is_error());
        let err = node.check(&mut TypeChecker::new(TypeDescriptor::VOID)).unwrap_err();
        assert!(err.contains("Colour"));
    }

    #[test]
    fn test_dot_reference_on_unregistered_type() {
        let sword = TypeDescriptor::scalar(ElementKind::Item);
        let target = Box::new(VariableReference::new("sword", sword));
        assert!(matches!(
            DotReference::new(&registry(), target, "Name"),
            Err(RegistryError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_dot_reference_on_null_is_runtime_error() {
        let target = Box::new(Constant::new(Value::null(ElementKind::Text)));
        let node = DotReference::new(&registry(), target, "Length").unwrap();
        let err = node.evaluate(&mut ExecutionContext::default()).unwrap_err();
        assert!(matches!(err, ScriptError::Property(PropertyError::NullReference { .. })));
    }

    #[test]
    fn test_collection_literal() {
        let items: Vec<Box<dyn Function>> = vec![
            Box::new(Constant::literal(Value::Number(1.0))),
            Box::new(Constant::literal(Value::Number(2.0))),
        ];
        let literal = CollectionLiteral::new(TypeDescriptor::NUMBER, items);
        assert_eq!(literal.return_type(), TypeDescriptor::collection_of(ElementKind::Number));
        assert!(literal.check(&mut TypeChecker::new(TypeDescriptor::VOID)).is_ok());
        let value = literal.evaluate(&mut ExecutionContext::default()).unwrap();
        assert_eq!(value.to_string(), "[1, 2]");

        let mixed = CollectionLiteral::new(
            TypeDescriptor::NUMBER,
            vec![Box::new(Constant::literal(Value::from("x")))],
        );
        assert!(mixed.check(&mut TypeChecker::new(TypeDescriptor::VOID)).is_err());
        assert!(mixed.evaluate(&mut ExecutionContext::default()).is_err());
    }
}
