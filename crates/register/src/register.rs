//! Variable register
//!
//! Schema lives behind a `RwLock`, since it is read on every access and
//! extended rarely. Instance values live in a `DashMap` keyed by
//! `(kind, id)` so that writes on different objects do not contend.

use dashmap::DashMap;
use parking_lot::RwLock;
use progs_core::{ElementKind, TypeDescriptor};
use progs_scripting::{HostObject, Value};
use std::collections::HashMap;

/// Declaration of one builder-defined variable
#[derive(Debug, Clone)]
pub struct RegisteredVariable {
    /// Name as declared (lookups are case-insensitive)
    pub name: String,
    /// Declared value type
    pub ty: TypeDescriptor,
    /// Value returned until an instance sets its own
    pub default: Value,
}

type InstanceKey = (ElementKind, u64);

/// Register of builder-declared variables
///
/// # Purpose
/// Holds the per-kind schema of extra fields and the values individual
/// objects carry for them. Nothing here is seen by the compiler; values are
/// validated against the declared type when they are written.
///
/// # Thread Safety
/// All methods take `&self`. The schema and the instance values may be read
/// and written concurrently from any thread.
#[derive(Debug, Default)]
pub struct VariableRegister {
    /// Owner kind -> lower-cased name -> declaration
    pub(crate) schema: RwLock<HashMap<ElementKind, HashMap<String, RegisteredVariable>>>,

    /// (owner kind, instance id) -> lower-cased name -> value
    pub(crate) values: DashMap<InstanceKey, HashMap<String, Value>>,
}

impl VariableRegister {
    pub fn new() -> Self {
        tracing::debug!("Creating variable register");
        Self::default()
    }

    /// Declare a new variable on every object of `owner`
    ///
    /// # Arguments
    /// * `owner` - Reference kind that gains the variable
    /// * `ty` - Declared value type
    /// * `name` - Variable name, unique per owner regardless of case
    /// * `default` - Value returned for instances that never set one
    ///
    /// # Returns
    /// `false` if `owner` is a value kind, the name is taken, the type
    /// cannot hold a value, or the default does not fit the type
    pub fn register_variable(
        &self,
        owner: ElementKind,
        ty: TypeDescriptor,
        name: &str,
        default: Value,
    ) -> bool {
        let ty = ty.without_literal();
        if !owner.is_reference_type() || name.trim().is_empty() || ty.is_void() || ty.is_error() {
            tracing::warn!("Rejected register variable {:?} of type {} on {}", name, ty, owner);
            return false;
        }
        if !default.prog_type().compatible_with(&ty) {
            tracing::warn!(
                "Default for register variable {}.{} is {}, expected {}",
                owner,
                name,
                default.prog_type(),
                ty
            );
            return false;
        }

        let mut schema = self.schema.write();
        let variables = schema.entry(owner).or_default();
        let key = name.to_lowercase();
        if variables.contains_key(&key) {
            return false;
        }

        tracing::debug!("Registered variable {}.{} ({})", owner, name, ty);
        variables.insert(
            key,
            RegisteredVariable {
                name: name.to_string(),
                ty,
                default,
            },
        );
        true
    }

    /// Remove a variable and every value stored for it
    pub fn unregister_variable(&self, owner: ElementKind, name: &str) -> bool {
        let key = name.to_lowercase();
        // Held across the purge so no write lands between removal and purge
        let mut schema = self.schema.write();
        let removed = schema
            .get_mut(&owner)
            .and_then(|variables| variables.remove(&key))
            .is_some();

        if removed {
            for mut entry in self.values.iter_mut() {
                if entry.key().0 == owner {
                    entry.value_mut().remove(&key);
                }
            }
            self.values.retain(|_, values| !values.is_empty());
            tracing::debug!("Unregistered variable {}.{}", owner, name);
        }
        drop(schema);
        removed
    }

    #[inline]
    pub fn is_registered(&self, owner: ElementKind, name: &str) -> bool {
        self.lookup(owner, name).is_some()
    }

    /// Declared type of a variable
    #[inline]
    pub fn get_type(&self, owner: ElementKind, name: &str) -> Option<TypeDescriptor> {
        self.lookup(owner, name).map(|variable| variable.ty)
    }

    /// Every variable declared on `owner`, sorted by name
    pub fn variables(&self, owner: ElementKind) -> Vec<RegisteredVariable> {
        let mut variables: Vec<RegisteredVariable> = self
            .schema
            .read()
            .get(&owner)
            .map(|variables| variables.values().cloned().collect())
            .unwrap_or_default();
        variables.sort_by_key(|variable| variable.name.to_lowercase());
        variables
    }

    /// Current value of a variable on one object
    ///
    /// # Returns
    /// The stored value, else the declared default, else `None` when the
    /// variable is not registered for the object's kind
    pub fn get_value(&self, instance: &dyn HostObject, name: &str) -> Option<Value> {
        self.get_value_by_id(instance.kind(), instance.id(), name)
    }

    pub fn get_value_by_id(&self, owner: ElementKind, id: u64, name: &str) -> Option<Value> {
        let key = name.to_lowercase();
        let schema = self.schema.read();
        let variable = schema.get(&owner)?.get(&key)?;
        let stored = self
            .values
            .get(&(owner, id))
            .and_then(|values| values.get(&key).cloned());
        Some(stored.unwrap_or_else(|| variable.default.clone()))
    }

    /// Store a value for one object
    ///
    /// # Returns
    /// `false` if the variable is unknown or the value does not fit its type
    pub fn set_value(&self, instance: &dyn HostObject, name: &str, value: Value) -> bool {
        self.set_value_by_id(instance.kind(), instance.id(), name, value)
    }

    pub fn set_value_by_id(&self, owner: ElementKind, id: u64, name: &str, value: Value) -> bool {
        let key = name.to_lowercase();
        // Schema guard is held until the value is stored; lock order is schema, then values
        let schema = self.schema.read();
        let Some(variable) = schema.get(&owner).and_then(|variables| variables.get(&key)) else {
            tracing::warn!("Set of unknown register variable {}.{}", owner, name);
            return false;
        };
        if !value.prog_type().compatible_with(&variable.ty) {
            tracing::warn!(
                "Register variable {}.{} is {}, cannot store {}",
                owner,
                variable.name,
                variable.ty,
                value.prog_type()
            );
            return false;
        }

        self.values.entry((owner, id)).or_default().insert(key, value);
        drop(schema);
        true
    }

    /// Drop an object's own value so that it reads the default again
    ///
    /// # Returns
    /// `false` if the variable is not registered
    pub fn reset_value(&self, instance: &dyn HostObject, name: &str) -> bool {
        let owner = instance.kind();
        let key = name.to_lowercase();
        let schema = self.schema.read();
        if !schema.get(&owner).is_some_and(|variables| variables.contains_key(&key)) {
            return false;
        }
        let instance_key = (owner, instance.id());
        if let Some(mut values) = self.values.get_mut(&instance_key) {
            values.remove(&key);
        }
        self.values.remove_if(&instance_key, |_, values| values.is_empty());
        drop(schema);
        true
    }

    /// Forget every value stored for an object, e.g. when it is destroyed
    pub fn clear_instance(&self, owner: ElementKind, id: u64) -> usize {
        self.values
            .remove(&(owner, id))
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }

    /// Number of objects holding at least one value
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.values.len()
    }

    fn lookup(&self, owner: ElementKind, name: &str) -> Option<RegisteredVariable> {
        self.schema
            .read()
            .get(&owner)
            .and_then(|variables| variables.get(&name.to_lowercase()))
            .cloned()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    pub(crate) struct TestCharacter {
        pub id: u64,
    }

    impl HostObject for TestCharacter {
        fn kind(&self) -> ElementKind {
            ElementKind::Character
        }

        fn id(&self) -> u64 {
            self.id
        }

        fn name(&self) -> String {
            format!("character {}", self.id)
        }

        fn get_property(&self, _name: &str) -> Option<Value> {
            None
        }
    }

    #[test]
    fn test_reputation_lifecycle() {
        let register = VariableRegister::new();
        let bob = TestCharacter { id: 1 };

        assert!(register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "reputation",
            Value::Number(0.0)
        ));
        assert_eq!(register.get_value(&bob, "reputation"), Some(Value::Number(0.0)));

        assert!(register.set_value(&bob, "reputation", Value::Number(42.0)));
        assert_eq!(register.get_value(&bob, "Reputation"), Some(Value::Number(42.0)));

        assert!(register.reset_value(&bob, "reputation"));
        assert_eq!(register.get_value(&bob, "reputation"), Some(Value::Number(0.0)));
        assert_eq!(register.instance_count(), 0);
    }

    #[test]
    fn test_duplicate_and_invalid_registrations() {
        let register = VariableRegister::new();

        assert!(register.register_variable(
            ElementKind::Character,
            TypeDescriptor::TEXT,
            "title",
            "".into()
        ));
        assert!(!register.register_variable(
            ElementKind::Character,
            TypeDescriptor::TEXT,
            "TITLE",
            "".into()
        ));
        assert!(register.register_variable(
            ElementKind::Item,
            TypeDescriptor::TEXT,
            "title",
            "".into()
        ));

        assert!(!register.register_variable(
            ElementKind::Item,
            TypeDescriptor::NUMBER,
            "weight",
            "heavy".into()
        ));
        assert!(!register.register_variable(
            ElementKind::Item,
            TypeDescriptor::VOID,
            "nothing",
            Value::void()
        ));
        assert!(!register.register_variable(
            ElementKind::Item,
            TypeDescriptor::TEXT,
            " ",
            "".into()
        ));
        assert!(!register.register_variable(
            ElementKind::Number,
            TypeDescriptor::TEXT,
            "unit",
            "".into()
        ));
    }

    #[test]
    fn test_literal_type_is_stripped() {
        let register = VariableRegister::new();
        assert!(register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER.as_literal(),
            "level",
            Value::Number(1.0)
        ));
        assert_eq!(
            register.get_type(ElementKind::Character, "LEVEL"),
            Some(TypeDescriptor::NUMBER)
        );
    }

    #[test]
    fn test_set_value_is_type_checked() {
        let register = VariableRegister::new();
        let bob = TestCharacter { id: 7 };
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "gold",
            Value::Number(0.0),
        );

        assert!(!register.set_value(&bob, "gold", "lots".into()));
        assert!(!register.set_value(&bob, "silver", Value::Number(1.0)));
        assert!(register.set_value(&bob, "gold", Value::null(TypeDescriptor::NUMBER)));
        assert_eq!(register.get_value(&bob, "gold"), Some(Value::null(TypeDescriptor::NUMBER)));
        assert_eq!(register.get_value(&bob, "silver"), None);
    }

    #[test]
    fn test_values_are_per_instance() {
        let register = VariableRegister::new();
        let alice = TestCharacter { id: 1 };
        let bob = TestCharacter { id: 2 };
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "gold",
            Value::Number(5.0),
        );

        register.set_value(&alice, "gold", Value::Number(100.0));
        assert_eq!(register.get_value(&alice, "gold"), Some(Value::Number(100.0)));
        assert_eq!(register.get_value(&bob, "gold"), Some(Value::Number(5.0)));
        assert_eq!(register.get_value_by_id(ElementKind::Item, 1, "gold"), None);

        assert_eq!(register.clear_instance(ElementKind::Character, 1), 1);
        assert_eq!(register.get_value(&alice, "gold"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_unregister_purges_values() {
        let register = VariableRegister::new();
        let bob = TestCharacter { id: 3 };
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "gold",
            Value::Number(0.0),
        );
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::TEXT,
            "title",
            "".into(),
        );
        register.set_value(&bob, "gold", Value::Number(9.0));

        assert!(register.unregister_variable(ElementKind::Character, "Gold"));
        assert!(!register.unregister_variable(ElementKind::Character, "gold"));
        assert!(!register.is_registered(ElementKind::Character, "gold"));
        assert_eq!(register.instance_count(), 0);

        let names: Vec<String> = register
            .variables(ElementKind::Character)
            .into_iter()
            .map(|variable| variable.name)
            .collect();
        assert_eq!(names, vec!["title".to_string()]);
    }

    #[test]
    fn test_concurrent_writes() {
        let register = Arc::new(VariableRegister::new());
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "gold",
            Value::Number(0.0),
        );

        let handles: Vec<_> = (0..8u64)
            .map(|id| {
                let register = Arc::clone(&register);
                std::thread::spawn(move || {
                    let character = TestCharacter { id };
                    assert!(register.set_value(&character, "gold", Value::Number(id as f64)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(register.instance_count(), 8);
        assert_eq!(
            register.get_value_by_id(ElementKind::Character, 5, "gold"),
            Some(Value::Number(5.0))
        );
    }

    #[test]
    fn test_stored_values_always_match_current_type() {
        let register = Arc::new(VariableRegister::new());
        register.register_variable(
            ElementKind::Character,
            TypeDescriptor::NUMBER,
            "mood",
            Value::Number(0.0),
        );

        let writer = {
            let register = Arc::clone(&register);
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    register.set_value_by_id(
                        ElementKind::Character,
                        1,
                        "mood",
                        Value::Number(i as f64),
                    );
                }
            })
        };

        for _ in 0..200 {
            register.unregister_variable(ElementKind::Character, "mood");
            register.register_variable(
                ElementKind::Character,
                TypeDescriptor::TEXT,
                "mood",
                "calm".into(),
            );
            let value = register.get_value_by_id(ElementKind::Character, 1, "mood").unwrap();
            assert_eq!(value, Value::from("calm"));

            register.unregister_variable(ElementKind::Character, "mood");
            register.register_variable(
                ElementKind::Character,
                TypeDescriptor::NUMBER,
                "mood",
                Value::Number(0.0),
            );
        }
        writer.join().unwrap();

        let value = register.get_value_by_id(ElementKind::Character, 1, "mood").unwrap();
        assert_eq!(value.prog_type(), TypeDescriptor::NUMBER);
    }
}
