//! Typed containers
//!
//! Each container records the element type it was created with. Insertions
//! are checked against it, so a `Collection of Number` never holds Text.

use super::Value;
use indexmap::IndexMap;
use progs_core::TypeDescriptor;

/// An ordered list of values sharing one element type
///
/// Runtime values never carry Literal, so it is dropped from the element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgCollection {
    element: TypeDescriptor,
    items: Vec<Value>,
}

impl ProgCollection {
    pub fn new(element: impl Into<TypeDescriptor>) -> Self {
        Self {
            element: element.into().without_literal(),
            items: Vec::new(),
        }
    }

    /// Empty collection with no element type
    pub fn bare() -> Self {
        Self::new(TypeDescriptor::BARE)
    }

    /// Collection holding `items`, or `None` if any item has the wrong type
    pub fn from_values(element: impl Into<TypeDescriptor>, items: Vec<Value>) -> Option<Self> {
        let mut collection = Self::new(element);
        for item in items {
            if !collection.add(item) {
                return None;
            }
        }
        Some(collection)
    }

    /// Items already known to fit `element`
    pub(crate) fn from_checked(element: TypeDescriptor, items: Vec<Value>) -> Self {
        Self {
            element: element.without_literal(),
            items,
        }
    }

    fn accepts(element: &TypeDescriptor, value: &Value) -> bool {
        element.is_bare() || value.prog_type().compatible_with(element)
    }

    /// Append `value`; returns false when its type does not fit
    pub fn add(&mut self, value: Value) -> bool {
        if !Self::accepts(&self.element, &value) {
            return false;
        }
        self.items.push(value);
        true
    }

    /// Remove the first item equal to `value`
    pub fn remove(&mut self, value: &Value) -> bool {
        match self.items.iter().position(|item| item == value) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items.last()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.items
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn prog_type(&self) -> TypeDescriptor {
        TypeDescriptor::collection_of(self.element.clone())
    }
}

impl<'a> IntoIterator for &'a ProgCollection {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Text-keyed map of values, keys case-insensitive, insertion ordered
#[derive(Debug, Clone, PartialEq)]
pub struct ProgDictionary {
    element: TypeDescriptor,
    entries: IndexMap<String, Value>,
}

impl ProgDictionary {
    pub fn new(element: impl Into<TypeDescriptor>) -> Self {
        Self {
            element: element.into().without_literal(),
            entries: IndexMap::new(),
        }
    }

    pub fn bare() -> Self {
        Self::new(TypeDescriptor::BARE)
    }

    /// Insert or overwrite `key`; returns false when the value does not fit
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        if !ProgCollection::accepts(&self.element, &value) {
            return false;
        }
        self.entries.insert(key.into().to_lowercase(), value);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(&key.to_lowercase())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn prog_type(&self) -> TypeDescriptor {
        TypeDescriptor::dictionary_of(self.element.clone())
    }
}

/// Text-keyed map where each key holds several values
#[derive(Debug, Clone, PartialEq)]
pub struct ProgCollectionDictionary {
    element: TypeDescriptor,
    entries: IndexMap<String, Vec<Value>>,
}

impl ProgCollectionDictionary {
    pub fn new(element: impl Into<TypeDescriptor>) -> Self {
        Self {
            element: element.into().without_literal(),
            entries: IndexMap::new(),
        }
    }

    pub fn bare() -> Self {
        Self::new(TypeDescriptor::BARE)
    }

    /// Append `value` under `key`
    pub fn add(&mut self, key: impl Into<String>, value: Value) -> bool {
        if !ProgCollection::accepts(&self.element, &value) {
            return false;
        }
        self.entries
            .entry(key.into().to_lowercase())
            .or_default()
            .push(value);
        true
    }

    /// Remove one occurrence of `value` under `key`; drops the key once empty
    pub fn remove(&mut self, key: &str, value: &Value) -> bool {
        let key = key.to_lowercase();
        let Some(items) = self.entries.get_mut(&key) else {
            return false;
        };
        let Some(index) = items.iter().position(|item| item == value) else {
            return false;
        };
        items.remove(index);
        if items.is_empty() {
            self.entries.shift_remove(&key);
        }
        true
    }

    pub fn remove_all(&mut self, key: &str) -> Option<Vec<Value>> {
        self.entries.shift_remove(&key.to_lowercase())
    }

    pub fn get(&self, key: &str) -> &[Value] {
        self.entries
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Number of distinct keys
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every value under every key, in key order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vec<Value>)> {
        self.entries.iter().map(|(key, items)| (key.as_str(), items))
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn prog_type(&self) -> TypeDescriptor {
        TypeDescriptor::collection_dictionary_of(self.element.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progs_core::{ElementKind, ElementSet};

    #[test]
    fn test_collection_rejects_wrong_element() {
        let mut numbers = ProgCollection::new(ElementKind::Number);
        assert!(numbers.add(Value::Number(1.0)));
        assert!(!numbers.add(Value::from("one")));
        assert_eq!(numbers.count(), 1);

        let mixed = vec![Value::from("x")];
        assert!(ProgCollection::from_values(TypeDescriptor::NUMBER, mixed).is_none());
    }

    #[test]
    fn test_literal_element_type_holds_plain_values() {
        let mut numbers = ProgCollection::new(TypeDescriptor::NUMBER.as_literal());
        assert!(numbers.add(Value::Number(1.0)));
        assert_eq!(numbers.element_type(), &TypeDescriptor::NUMBER);
        assert_eq!(numbers.prog_type(), TypeDescriptor::collection_of(TypeDescriptor::NUMBER));

        let mut names = ProgDictionary::new(TypeDescriptor::TEXT.as_literal());
        assert!(names.insert("guard", Value::from("Bob")));

        let mut scores = ProgCollectionDictionary::new(TypeDescriptor::NUMBER.as_literal());
        assert!(scores.add("bob", Value::Number(3.0)));

        let nested = ProgCollection::from_values(
            TypeDescriptor::collection_of(TypeDescriptor::NUMBER.as_literal()),
            vec![Value::Collection(numbers)],
        );
        assert!(nested.is_some());
    }

    #[test]
    fn test_union_element_accepts_members() {
        let mut values = ProgCollection::new(ElementSet::VALUE_TYPE);
        assert!(values.add(Value::Number(1.0)));
        assert!(values.add(Value::from("one")));
        assert!(!values.add(Value::Collection(ProgCollection::bare())));
    }

    #[test]
    fn test_collection_remove() {
        let items = vec![1.0.into(), 2.0.into(), 1.0.into()];
        let mut numbers = ProgCollection::from_values(ElementKind::Number, items).unwrap();
        assert!(numbers.remove(&Value::Number(1.0)));
        assert_eq!(numbers.values(), &[Value::Number(2.0), Value::Number(1.0)]);
        assert!(!numbers.remove(&Value::Number(5.0)));
    }

    #[test]
    fn test_dictionary_keys_are_case_insensitive() {
        let mut dictionary = ProgDictionary::new(ElementKind::Number);
        assert!(dictionary.insert("Gold", Value::Number(10.0)));
        assert!(dictionary.insert("GOLD", Value::Number(12.0)));
        assert_eq!(dictionary.count(), 1);
        assert_eq!(dictionary.get("gold"), Some(&Value::Number(12.0)));
        assert!(!dictionary.insert("silver", Value::from("lots")));
        assert_eq!(dictionary.remove("Gold"), Some(Value::Number(12.0)));
        assert!(dictionary.is_empty());
    }

    #[test]
    fn test_collection_dictionary() {
        let mut multi = ProgCollectionDictionary::new(ElementKind::Text);
        multi.add("fruit", Value::from("apple"));
        multi.add("fruit", Value::from("pear"));
        multi.add("veg", Value::from("leek"));

        assert_eq!(multi.count(), 2);
        assert_eq!(multi.get("FRUIT").len(), 2);
        assert_eq!(multi.values().count(), 3);

        assert!(multi.remove("veg", &Value::from("leek")));
        assert!(!multi.contains_key("veg"));
        assert!(multi.get("veg").is_empty());
        assert_eq!(multi.remove_all("fruit").map(|items| items.len()), Some(2));
        assert!(multi.is_empty());
    }
}
