//! Dot-reference registry
//!
//! Each value kind declares one static table of [`Property`] entries: name,
//! return type, help text and getter. The compiler asks the frozen
//! [`DotReferenceRegistry`] what a `value.Name` expression returns; the runtime
//! calls [`dispatch`] on the very same table. Both sides therefore answer from
//! one declaration.
//!
//! The registry is built once by [`DotReferenceRegistryBuilder`] during host
//! startup and then shared read-only.

use crate::value::{
    Gender, ProgCollection, ProgCollectionDictionary, ProgDictionary, Value, VoidValue,
};
use chrono::{DateTime, TimeDelta, Utc};
use progs_core::{ContainerShape, ElementKind, TypeDescriptor};
use std::collections::HashMap;
use std::fmt;

/// Return type of a property, possibly relative to its owner's element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyReturn {
    /// A fixed scalar kind
    Kind(ElementKind),
    /// A collection of a fixed kind
    CollectionOf(ElementKind),
    /// The owner's element type
    Element,
    /// A collection of the owner's element type
    ElementCollection,
}

impl PropertyReturn {
    /// Concrete return type for a property read on `owner`
    pub fn resolve(&self, owner: &TypeDescriptor) -> TypeDescriptor {
        let element = || {
            owner
                .element()
                .cloned()
                .map(TypeDescriptor::without_literal)
                .unwrap_or(TypeDescriptor::ERROR)
        };
        match self {
            PropertyReturn::Kind(kind) => TypeDescriptor::scalar(*kind),
            PropertyReturn::CollectionOf(kind) => TypeDescriptor::collection_of(*kind),
            PropertyReturn::Element => element(),
            PropertyReturn::ElementCollection => TypeDescriptor::collection_of(element()),
        }
    }
}

/// One dot-reference on a value kind
pub struct Property<T> {
    pub name: &'static str,
    pub returns: PropertyReturn,
    pub help: &'static str,
    pub get: fn(&T) -> Value,
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("returns", &self.returns)
            .finish()
    }
}

/// A value kind with a declarative property table
pub trait DotReferences: Sized + 'static {
    fn properties() -> &'static [Property<Self>];
}

/// Read the property `name` (case-insensitive) from `target`'s table
pub fn dispatch<T: DotReferences>(target: &T, name: &str) -> Option<Value> {
    T::properties()
        .iter()
        .find(|property| property.name.eq_ignore_ascii_case(name))
        .map(|property| (property.get)(target))
}

/// Registry slot: a concrete scalar kind or a container shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKey {
    Scalar(ElementKind),
    Container(ContainerShape),
}

impl RegistryKey {
    /// Slot for `ty`; `None` for unions and bare scalars, which have no slot
    pub fn for_type(ty: &TypeDescriptor) -> Option<Self> {
        match ty.shape() {
            ContainerShape::Scalar => ty.single_kind().map(RegistryKey::Scalar),
            shape => Some(RegistryKey::Container(shape)),
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKey::Scalar(kind) => write!(f, "{}", kind),
            RegistryKey::Container(shape) => write!(f, "{}", shape.name()),
        }
    }
}

/// Registry failures; both indicate a host programming error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Dot-references for {0} were registered twice")]
    DuplicateRegistration(RegistryKey),

    #[error("No dot-references are registered for type {0}")]
    UnregisteredType(String),
}

/// Property access failures at runtime
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// Dot-reference on a null value; scripts must guard against this
    #[error("Cannot read property {property} of a null value")]
    NullReference { property: String },

    /// Name absent from the owner's table; the compiler should have rejected it
    #[error("Type {owner} has no property named {property}")]
    UnknownProperty { owner: String, property: String },
}

/// Compile-time view of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySignature {
    pub name: &'static str,
    pub returns: PropertyReturn,
    pub help: &'static str,
}

type PropertyMap = HashMap<String, PropertySignature>;

/// Collects property tables during startup
#[derive(Debug, Default)]
pub struct DotReferenceRegistryBuilder {
    types: HashMap<RegistryKey, PropertyMap>,
}

impl DotReferenceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with every engine-provided value kind
    pub fn with_builtin_kinds() -> Result<Self, RegistryError> {
        let mut builder = Self::new();
        builder
            .register::<VoidValue>(RegistryKey::Scalar(ElementKind::Void))?
            .register::<bool>(RegistryKey::Scalar(ElementKind::Boolean))?
            .register::<f64>(RegistryKey::Scalar(ElementKind::Number))?
            .register::<String>(RegistryKey::Scalar(ElementKind::Text))?
            .register::<Gender>(RegistryKey::Scalar(ElementKind::Gender))?
            .register::<DateTime<Utc>>(RegistryKey::Scalar(ElementKind::DateTime))?
            .register::<TimeDelta>(RegistryKey::Scalar(ElementKind::TimeSpan))?
            .register::<ProgCollection>(RegistryKey::Container(ContainerShape::Collection))?
            .register::<ProgDictionary>(RegistryKey::Container(ContainerShape::Dictionary))?
            .register::<ProgCollectionDictionary>(RegistryKey::Container(
                ContainerShape::CollectionDictionary,
            ))?;
        Ok(builder)
    }

    /// Register the table of `T` under `key`; a second registration is rejected
    pub fn register<T: DotReferences>(
        &mut self,
        key: RegistryKey,
    ) -> Result<&mut Self, RegistryError> {
        if self.types.contains_key(&key) {
            tracing::error!("Duplicate dot-reference registration for {}", key);
            return Err(RegistryError::DuplicateRegistration(key));
        }

        let properties = T::properties()
            .iter()
            .map(|property| {
                (
                    property.name.to_lowercase(),
                    PropertySignature {
                        name: property.name,
                        returns: property.returns,
                        help: property.help,
                    },
                )
            })
            .collect();
        self.types.insert(key, properties);
        Ok(self)
    }

    /// Register a host domain type for a scalar kind
    pub fn register_host<T: DotReferences>(
        &mut self,
        kind: ElementKind,
    ) -> Result<&mut Self, RegistryError> {
        self.register::<T>(RegistryKey::Scalar(kind))
    }

    /// Freeze the registry
    pub fn build(self) -> DotReferenceRegistry {
        let registry = DotReferenceRegistry { types: self.types };
        tracing::info!(
            "Dot-reference registry built: {} types, {} properties",
            registry.type_count(),
            registry.property_count()
        );
        registry
    }
}

/// Immutable (type, property) -> return type table consulted by the compiler
#[derive(Debug)]
pub struct DotReferenceRegistry {
    types: HashMap<RegistryKey, PropertyMap>,
}

impl DotReferenceRegistry {
    pub fn builder() -> DotReferenceRegistryBuilder {
        DotReferenceRegistryBuilder::new()
    }

    /// Registry holding only the engine-provided value kinds
    pub fn with_builtin_kinds() -> Result<Self, RegistryError> {
        Ok(DotReferenceRegistryBuilder::with_builtin_kinds()?.build())
    }

    fn table(&self, owner: &TypeDescriptor) -> Result<&PropertyMap, RegistryError> {
        RegistryKey::for_type(owner)
            .and_then(|key| self.types.get(&key))
            .ok_or_else(|| {
                tracing::error!("Dot-reference lookup on unregistered type {}", owner);
                RegistryError::UnregisteredType(owner.describe())
            })
    }

    pub fn is_registered(&self, owner: &TypeDescriptor) -> bool {
        RegistryKey::for_type(owner).is_some_and(|key| self.types.contains_key(&key))
    }

    /// Return type of `owner.name`
    ///
    /// An unknown name on a registered type yields the Error type, which the
    /// compiler reports as a diagnostic. An unregistered owner is an
    /// internal error.
    pub fn property_type(
        &self,
        owner: &TypeDescriptor,
        name: &str,
    ) -> Result<TypeDescriptor, RegistryError> {
        let table = self.table(owner)?;
        Ok(table
            .get(&name.to_lowercase())
            .map(|signature| signature.returns.resolve(owner))
            .unwrap_or(TypeDescriptor::ERROR))
    }

    pub fn help(&self, owner: &TypeDescriptor, name: &str) -> Option<&'static str> {
        self.table(owner)
            .ok()?
            .get(&name.to_lowercase())
            .map(|signature| signature.help)
    }

    /// All properties of `owner`, sorted by name, with resolved return types
    pub fn properties(
        &self,
        owner: &TypeDescriptor,
    ) -> Result<Vec<(&'static str, TypeDescriptor, &'static str)>, RegistryError> {
        let mut listing: Vec<_> = self
            .table(owner)?
            .values()
            .map(|signature| (signature.name, signature.returns.resolve(owner), signature.help))
            .collect();
        listing.sort_by(|a, b| a.0.cmp(b.0));
        Ok(listing)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn property_count(&self) -> usize {
        self.types.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::HostObject;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Npc {
        id: u64,
        name: String,
    }

    static NPC_PROPERTIES: &[Property<Npc>] = &[
        Property {
            name: "Name",
            returns: PropertyReturn::Kind(ElementKind::Text),
            help: "The NPC's short name",
            get: |npc| Value::Text(npc.name.clone()),
        },
        Property {
            name: "Id",
            returns: PropertyReturn::Kind(ElementKind::Number),
            help: "The NPC's unique id",
            get: |npc| Value::Number(npc.id as f64),
        },
    ];

    impl DotReferences for Npc {
        fn properties() -> &'static [Property<Self>] {
            NPC_PROPERTIES
        }
    }

    impl HostObject for Npc {
        fn kind(&self) -> ElementKind {
            ElementKind::Character
        }

        fn id(&self) -> u64 {
            self.id
        }

        fn name(&self) -> String {
            self.name.clone()
        }

        fn get_property(&self, name: &str) -> Option<Value> {
            dispatch(self, name)
        }
    }

    fn registry() -> DotReferenceRegistry {
        let mut builder = DotReferenceRegistryBuilder::with_builtin_kinds().unwrap();
        builder.register_host::<Npc>(ElementKind::Character).unwrap();
        builder.build()
    }

    /// One sample runtime value for every registered type
    fn samples() -> Vec<Value> {
        let numbers = ProgCollection::from_values(
            TypeDescriptor::NUMBER,
            vec![Value::Number(3.0), Value::Number(-1.5)],
        )
        .unwrap();
        let mut dictionary = ProgDictionary::new(TypeDescriptor::TEXT);
        dictionary.insert("greeting", Value::from("hello"));
        let mut multi = ProgCollectionDictionary::new(TypeDescriptor::NUMBER);
        multi.add("odd", Value::Number(1.0));
        multi.add("odd", Value::Number(3.0));
        multi.add("even", Value::Number(2.0));

        vec![
            Value::Boolean(true),
            Value::Number(-2.5),
            Value::from("Hello World"),
            Value::Gender(Gender::Female),
            Value::DateTime(Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 10).unwrap()),
            Value::TimeSpan(TimeDelta::seconds(93_784)),
            Value::Collection(numbers),
            Value::Collection(ProgCollection::bare()),
            Value::Dictionary(dictionary),
            Value::CollectionDictionary(multi),
            Value::Host(std::sync::Arc::new(Npc {
                id: 7,
                name: "guard".into(),
            })),
        ]
    }

    #[test]
    fn test_runtime_dispatch_matches_registry() {
        let registry = registry();
        for value in samples() {
            let owner = value.prog_type();
            let listing = registry.properties(&owner).unwrap();
            for (name, expected, _) in listing {
                for spelling in [name.to_string(), name.to_uppercase(), name.to_lowercase()] {
                    let result = value
                        .get_property(&spelling)
                        .unwrap_or_else(|e| {
                            panic!("{}.{} failed at runtime: {}", owner, spelling, e)
                        });
                    // Element placeholders are already resolved against the owner
                    assert_eq!(
                        result.prog_type(),
                        expected,
                        "{}.{} returned a different type than the registry promised",
                        owner,
                        spelling
                    );
                    assert_eq!(registry.property_type(&owner, &spelling).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_registry_covers_every_runtime_property() {
        // A property answered at runtime but unknown to the registry would
        // pass the compiler's check as Error; make sure none exist.
        let registry = registry();
        for value in samples() {
            let owner = value.prog_type();
            for (name, ty, _) in registry.properties(&owner).unwrap() {
                assert!(!ty.is_error(), "{}.{} resolves to Error", owner, name);
            }
            assert!(value.get_property("NoSuchProperty").is_err());
            assert!(registry.property_type(&owner, "NoSuchProperty").unwrap().is_error());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = registry();
        assert_eq!(
            registry.property_type(&TypeDescriptor::TEXT, "length").unwrap(),
            TypeDescriptor::NUMBER
        );
        assert_eq!(
            registry.property_type(&TypeDescriptor::TEXT, "LENGTH").unwrap(),
            TypeDescriptor::NUMBER
        );
        assert!(registry.help(&TypeDescriptor::TEXT, "LeNgTh").is_some());
    }

    #[test]
    fn test_literal_owner_resolves_like_plain() {
        let registry = registry();
        assert_eq!(
            registry.property_type(&TypeDescriptor::TEXT.as_literal(), "Upper").unwrap(),
            TypeDescriptor::TEXT
        );
    }

    #[test]
    fn test_unknown_property_yields_error_type() {
        let registry = registry();
        let ty = registry.property_type(&TypeDescriptor::BOOLEAN, "Colour").unwrap();
        assert!(ty.is_error());
    }

    #[test]
    fn test_unregistered_type_is_an_error() {
        let registry = registry();
        let item = TypeDescriptor::scalar(ElementKind::Item);
        assert!(!registry.is_registered(&item));
        assert!(matches!(
            registry.property_type(&item, "Name"),
            Err(RegistryError::UnregisteredType(_))
        ));
        // Unions have no slot of their own
        assert!(registry.property_type(&TypeDescriptor::ANYTHING, "Name").is_err());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut builder = DotReferenceRegistryBuilder::with_builtin_kinds().unwrap();
        let err = builder.register::<f64>(RegistryKey::Scalar(ElementKind::Number)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRegistration(RegistryKey::Scalar(ElementKind::Number))
        );
    }

    #[test]
    fn test_element_relative_returns() {
        let registry = registry();
        let owner = TypeDescriptor::collection_of(TypeDescriptor::scalar(ElementKind::Character));
        assert_eq!(
            registry.property_type(&owner, "First").unwrap(),
            TypeDescriptor::scalar(ElementKind::Character)
        );
        assert_eq!(registry.property_type(&owner, "Values").unwrap(), owner);
        assert_eq!(
            registry.property_type(&TypeDescriptor::bare_dictionary(), "Keys").unwrap(),
            TypeDescriptor::collection_of(ElementKind::Text)
        );
    }
}
