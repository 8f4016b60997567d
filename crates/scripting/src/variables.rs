//! Scoped variable bindings for one execution

use crate::value::Value;
use progs_core::TypeDescriptor;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Binding {
    ty: TypeDescriptor,
    value: Value,
}

/// Stack of name -> value scopes
///
/// Names are case-insensitive. Lookups walk from the innermost scope
/// outwards; the root scope holds the program's parameters and is never
/// popped. Each binding keeps the type it was declared with.
#[derive(Debug, Clone)]
pub struct VariableSpace {
    scopes: Vec<HashMap<String, Binding>>,
}

impl VariableSpace {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope, typed by its first value
    pub fn declare(&mut self, name: &str, value: Value) {
        self.declare_typed(name, value.prog_type(), value);
    }

    /// Bind `name` with an explicit declared type, shadowing outer bindings
    pub fn declare_typed(&mut self, name: &str, ty: TypeDescriptor, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_lowercase(), Binding { ty, value });
        }
    }

    /// Overwrite the nearest existing binding; false if `name` is unbound
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        let key = name.to_lowercase();
        match self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(&key)) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.binding(name).map(|binding| &binding.value)
    }

    /// Type `name` was declared with
    pub fn declared_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.binding(name).map(|binding| &binding.ty)
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        let key = name.to_lowercase();
        self.scopes.iter().rev().find_map(|scope| scope.get(&key))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for VariableSpace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoping() {
        let mut space = VariableSpace::new();
        space.declare("Gold", Value::Number(10.0));

        space.push_scope();
        assert_eq!(space.get("gold"), Some(&Value::Number(10.0)));
        space.declare("gold", Value::Number(1.0));
        assert_eq!(space.get("GOLD"), Some(&Value::Number(1.0)));
        space.pop_scope();

        assert_eq!(space.get("gold"), Some(&Value::Number(10.0)));
    }

    #[test]
    fn test_set_updates_nearest_binding() {
        let mut space = VariableSpace::new();
        space.declare("count", Value::Number(0.0));
        space.push_scope();
        assert!(space.set("count", Value::Number(5.0)));
        space.pop_scope();
        assert_eq!(space.get("count"), Some(&Value::Number(5.0)));
        assert!(!space.set("missing", Value::Number(1.0)));
    }

    #[test]
    fn test_declared_type_follows_shadowing() {
        let mut space = VariableSpace::new();
        space.declare_typed("target", TypeDescriptor::TEXT, Value::Null(TypeDescriptor::TEXT));
        space.push_scope();
        space.declare("target", Value::Number(2.0));
        assert_eq!(space.declared_type("TARGET"), Some(&TypeDescriptor::NUMBER));
        space.pop_scope();
        assert!(space.set("target", Value::from("Bob")));
        assert_eq!(space.declared_type("target"), Some(&TypeDescriptor::TEXT));
        assert_eq!(space.declared_type("missing"), None);
    }

    #[test]
    fn test_root_scope_survives_pop() {
        let mut space = VariableSpace::new();
        space.declare("x", Value::Boolean(true));
        space.pop_scope();
        space.pop_scope();
        assert_eq!(space.depth(), 1);
        assert!(space.contains("x"));
    }
}
