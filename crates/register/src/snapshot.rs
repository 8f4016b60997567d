//! Serializable register contents
//!
//! The host's storage layer persists the register as a [`RegisterSnapshot`].
//! Only scalar values survive a snapshot; containers and object references
//! are skipped with a warning.

use crate::error::{RegisterError, Result};
use crate::register::{RegisteredVariable, VariableRegister};
use chrono::{DateTime, TimeDelta, Utc};
use progs_core::{ElementKind, TypeDescriptor};
use progs_scripting::{Gender, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scalar value in storable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum StoredValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    TimeSpanMillis(i64),
    Gender(Gender),
}

impl StoredValue {
    /// Storable form of `value`, `None` for containers and host objects
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null(_) => StoredValue::Null,
            Value::Boolean(value) => StoredValue::Boolean(*value),
            Value::Number(value) => StoredValue::Number(*value),
            Value::Text(value) => StoredValue::Text(value.clone()),
            Value::DateTime(value) => StoredValue::DateTime(*value),
            Value::TimeSpan(value) => StoredValue::TimeSpanMillis(value.num_milliseconds()),
            Value::Gender(value) => StoredValue::Gender(*value),
            Value::Collection(_)
            | Value::Dictionary(_)
            | Value::CollectionDictionary(_)
            | Value::Host(_) => return None,
        })
    }

    /// Runtime value for a variable declared as `ty`
    pub fn into_value(self, ty: &TypeDescriptor) -> Value {
        match self {
            StoredValue::Null => Value::Null(ty.clone()),
            StoredValue::Boolean(value) => Value::Boolean(value),
            StoredValue::Number(value) => Value::Number(value),
            StoredValue::Text(value) => Value::Text(value),
            StoredValue::DateTime(value) => Value::DateTime(value),
            StoredValue::TimeSpanMillis(millis) => Value::TimeSpan(TimeDelta::milliseconds(millis)),
            StoredValue::Gender(value) => Value::Gender(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub owner: ElementKind,
    pub name: String,
    /// Type description, e.g. `Number` or `Literal Text`
    #[serde(rename = "type")]
    pub ty: String,
    pub default: StoredValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub owner: ElementKind,
    pub id: u64,
    pub name: String,
    pub value: StoredValue,
}

/// Full register contents: schema first, then instance values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    pub variables: Vec<VariableRecord>,
    pub values: Vec<ValueRecord>,
}

impl VariableRegister {
    /// Capture the schema and every storable instance value
    pub fn snapshot(&self) -> RegisterSnapshot {
        let mut snapshot = RegisterSnapshot::default();

        for (owner, variables) in self.schema.read().iter() {
            for variable in variables.values() {
                let Some(default) = StoredValue::from_value(&variable.default) else {
                    tracing::warn!(
                        "Skipping register variable {}.{}: default is not storable",
                        owner,
                        variable.name
                    );
                    continue;
                };
                snapshot.variables.push(VariableRecord {
                    owner: *owner,
                    name: variable.name.clone(),
                    ty: variable.ty.describe(),
                    default,
                });
            }
        }

        for entry in self.values.iter() {
            let (owner, id) = *entry.key();
            for (name, value) in entry.value() {
                match StoredValue::from_value(value) {
                    Some(value) => snapshot.values.push(ValueRecord {
                        owner,
                        id,
                        name: name.clone(),
                        value,
                    }),
                    None => tracing::warn!(
                        "Skipping value of {}.{} on #{}: not storable",
                        owner,
                        name,
                        id
                    ),
                }
            }
        }

        snapshot
            .variables
            .sort_by_key(|variable| (variable.owner, variable.name.to_lowercase()));
        snapshot.values.sort_by(|a, b| (a.owner, a.id, &a.name).cmp(&(b.owner, b.id, &b.name)));
        tracing::debug!(
            "Snapshot of variable register: {} variables, {} values",
            snapshot.variables.len(),
            snapshot.values.len()
        );
        snapshot
    }

    /// Replace the register contents with `snapshot`
    ///
    /// The snapshot is validated in full before anything is replaced, so a
    /// failed restore leaves the register untouched. Values for variables the
    /// snapshot does not declare are dropped.
    ///
    /// # Returns
    /// Number of instance values restored
    pub fn restore(&self, snapshot: &RegisterSnapshot) -> Result<usize> {
        let mut schema: HashMap<ElementKind, HashMap<String, RegisteredVariable>> = HashMap::new();
        for record in &snapshot.variables {
            if !record.owner.is_reference_type() {
                return Err(RegisterError::InvalidOwner(record.owner.to_string()));
            }
            let ty: TypeDescriptor = record
                .ty
                .parse()
                .map_err(|_| RegisterError::InvalidType(record.ty.clone()))?;
            let default = record.default.clone().into_value(&ty);
            if !default.prog_type().compatible_with(&ty) {
                return Err(RegisterError::InvalidValue {
                    owner: record.owner.to_string(),
                    name: record.name.clone(),
                });
            }
            schema.entry(record.owner).or_default().insert(
                record.name.to_lowercase(),
                RegisteredVariable {
                    name: record.name.clone(),
                    ty,
                    default,
                },
            );
        }

        let mut values: HashMap<(ElementKind, u64), HashMap<String, Value>> = HashMap::new();
        let mut restored = 0;
        for record in &snapshot.values {
            let key = record.name.to_lowercase();
            let variable = schema.get(&record.owner).and_then(|variables| variables.get(&key));
            let Some(variable) = variable else {
                tracing::warn!(
                    "Dropping value of undeclared variable {}.{}",
                    record.owner,
                    record.name
                );
                continue;
            };
            let value = record.value.clone().into_value(&variable.ty);
            if !value.prog_type().compatible_with(&variable.ty) {
                return Err(RegisterError::InvalidValue {
                    owner: record.owner.to_string(),
                    name: record.name.clone(),
                });
            }
            values.entry((record.owner, record.id)).or_default().insert(key, value);
            restored += 1;
        }

        let mut current = self.schema.write();
        *current = schema;
        self.values.clear();
        for (key, instance) in values {
            self.values.insert(key, instance);
        }
        drop(current);

        tracing::info!(
            "Restored variable register: {} variables, {} values",
            snapshot.variables.len(),
            restored
        );
        Ok(restored)
    }
}
