//! Type algebra for the progs language
//!
//! A [`TypeDescriptor`] is a two-level type: an optional container shape
//! (Collection, Dictionary or CollectionDictionary) wrapping a scalar element
//! set, plus a Literal modifier on the scalar marking compile-time constants.
//!
//! # Element kinds
//!
//! Every scalar is a set of primitive [`ElementKind`]s. Single-kind sets are
//! the concrete types values carry at runtime; multi-kind sets are the named
//! unions (Perceivable, Toon, Anything, ...) used when declaring signatures.
//! Unions are only ever computed from primitives, never spelled out by hand.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ElementKind {
    Void = 0,
    Boolean = 1,
    Number = 2,
    Text = 3,
    Gender = 4,
    DateTime = 5,
    TimeSpan = 6,
    Character = 7,
    Chargen = 8,
    Item = 9,
    Location = 10,
    Zone = 11,
    Shard = 12,
    Exit = 13,
    Race = 14,
    Culture = 15,
    Clan = 16,
    Effect = 17,
    Terrain = 18,
    Solid = 19,
    Liquid = 20,
    Gas = 21,
    Error = 22,
}

impl ElementKind {
    /// Every primitive kind, in declaration order
    pub const ALL: [ElementKind; 23] = [
        ElementKind::Void,
        ElementKind::Boolean,
        ElementKind::Number,
        ElementKind::Text,
        ElementKind::Gender,
        ElementKind::DateTime,
        ElementKind::TimeSpan,
        ElementKind::Character,
        ElementKind::Chargen,
        ElementKind::Item,
        ElementKind::Location,
        ElementKind::Zone,
        ElementKind::Shard,
        ElementKind::Exit,
        ElementKind::Race,
        ElementKind::Culture,
        ElementKind::Clan,
        ElementKind::Effect,
        ElementKind::Terrain,
        ElementKind::Solid,
        ElementKind::Liquid,
        ElementKind::Gas,
        ElementKind::Error,
    ];

    #[inline]
    pub const fn bit(self) -> u64 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Void => "Void",
            ElementKind::Boolean => "Boolean",
            ElementKind::Number => "Number",
            ElementKind::Text => "Text",
            ElementKind::Gender => "Gender",
            ElementKind::DateTime => "DateTime",
            ElementKind::TimeSpan => "TimeSpan",
            ElementKind::Character => "Character",
            ElementKind::Chargen => "Chargen",
            ElementKind::Item => "Item",
            ElementKind::Location => "Location",
            ElementKind::Zone => "Zone",
            ElementKind::Shard => "Shard",
            ElementKind::Exit => "Exit",
            ElementKind::Race => "Race",
            ElementKind::Culture => "Culture",
            ElementKind::Clan => "Clan",
            ElementKind::Effect => "Effect",
            ElementKind::Terrain => "Terrain",
            ElementKind::Solid => "Solid",
            ElementKind::Liquid => "Liquid",
            ElementKind::Gas => "Gas",
            ElementKind::Error => "Error",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn is_value_type(self) -> bool {
        ElementSet::VALUE_TYPE.contains(self)
    }

    pub fn is_reference_type(self) -> bool {
        ElementSet::REFERENCE_TYPE.contains(self)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of primitive element kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ElementSet(u64);

impl ElementSet {
    pub const EMPTY: Self = Self(0);

    pub const MATERIAL: Self =
        Self::of(&[ElementKind::Solid, ElementKind::Liquid, ElementKind::Gas]);
    pub const TOON: Self = Self::of(&[ElementKind::Character, ElementKind::Chargen]);
    pub const PERCEIVABLE: Self = Self::of(&[
        ElementKind::Character,
        ElementKind::Item,
        ElementKind::Location,
        ElementKind::Zone,
        ElementKind::Shard,
    ]);
    pub const TAGGED: Self =
        Self::of(&[ElementKind::Item, ElementKind::Location, ElementKind::Terrain])
            .union(Self::MATERIAL);
    pub const VALUE_TYPE: Self = Self::of(&[
        ElementKind::Boolean,
        ElementKind::Number,
        ElementKind::Text,
        ElementKind::Gender,
        ElementKind::DateTime,
        ElementKind::TimeSpan,
    ]);
    pub const REFERENCE_TYPE: Self = Self::of(&ElementKind::ALL)
        .difference(Self::VALUE_TYPE)
        .difference(Self::of(&[ElementKind::Void, ElementKind::Error]));
    pub const COLLECTION_ITEM: Self = Self::VALUE_TYPE.union(Self::REFERENCE_TYPE);
    pub const ANYTHING: Self = Self::COLLECTION_ITEM.union(Self::single(ElementKind::Void));

    /// Named unions in the order they are tried when describing a set
    pub const NAMED_UNIONS: [(&'static str, ElementSet); 8] = [
        ("Anything", Self::ANYTHING),
        ("CollectionItem", Self::COLLECTION_ITEM),
        ("ReferenceType", Self::REFERENCE_TYPE),
        ("ValueType", Self::VALUE_TYPE),
        ("Perceivable", Self::PERCEIVABLE),
        ("Tagged", Self::TAGGED),
        ("Toon", Self::TOON),
        ("Material", Self::MATERIAL),
    ];

    pub const fn single(kind: ElementKind) -> Self {
        Self(kind.bit())
    }

    pub const fn of(kinds: &[ElementKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn contains(self, kind: ElementKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// The only kind in this set, if it holds exactly one
    pub fn single_kind(self) -> Option<ElementKind> {
        if self.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }

    pub fn iter(self) -> impl Iterator<Item = ElementKind> {
        ElementKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }

    /// Name of the union exactly matching this set
    pub fn union_name(self) -> Option<&'static str> {
        Self::NAMED_UNIONS
            .iter()
            .find(|(_, set)| *set == self)
            .map(|(name, _)| *name)
    }

    pub fn from_union_name(name: &str) -> Option<Self> {
        Self::NAMED_UNIONS
            .iter()
            .find(|(union, _)| union.eq_ignore_ascii_case(name))
            .map(|(_, set)| *set)
    }
}

impl From<ElementKind> for ElementSet {
    fn from(kind: ElementKind) -> Self {
        Self::single(kind)
    }
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Container shape of a type, independent of its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerShape {
    Scalar,
    Collection,
    Dictionary,
    CollectionDictionary,
}

impl ContainerShape {
    pub fn name(self) -> &'static str {
        match self {
            ContainerShape::Scalar => "Scalar",
            ContainerShape::Collection => "Collection",
            ContainerShape::Dictionary => "Dictionary",
            ContainerShape::CollectionDictionary => "CollectionDictionary",
        }
    }
}

/// Type of a value or expression in the progs language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// A scalar drawn from `kinds`; `literal` marks compile-time constants
    Scalar { kinds: ElementSet, literal: bool },
    Collection(Box<TypeDescriptor>),
    Dictionary(Box<TypeDescriptor>),
    CollectionDictionary(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub const VOID: Self = Self::scalar(ElementKind::Void);
    pub const BOOLEAN: Self = Self::scalar(ElementKind::Boolean);
    pub const NUMBER: Self = Self::scalar(ElementKind::Number);
    pub const TEXT: Self = Self::scalar(ElementKind::Text);
    pub const GENDER: Self = Self::scalar(ElementKind::Gender);
    pub const DATE_TIME: Self = Self::scalar(ElementKind::DateTime);
    pub const TIME_SPAN: Self = Self::scalar(ElementKind::TimeSpan);
    pub const ERROR: Self = Self::scalar(ElementKind::Error);
    pub const ANYTHING: Self = Self::union(ElementSet::ANYTHING);
    pub const COLLECTION_ITEM: Self = Self::union(ElementSet::COLLECTION_ITEM);
    pub const REFERENCE_TYPE: Self = Self::union(ElementSet::REFERENCE_TYPE);
    /// Element of a bare container: no kinds, matches any same-shaped container
    pub const BARE: Self = Self::union(ElementSet::EMPTY);

    pub const fn scalar(kind: ElementKind) -> Self {
        Self::Scalar {
            kinds: ElementSet::single(kind),
            literal: false,
        }
    }

    pub const fn union(kinds: ElementSet) -> Self {
        Self::Scalar {
            kinds,
            literal: false,
        }
    }

    pub fn collection_of(element: impl Into<TypeDescriptor>) -> Self {
        Self::Collection(Box::new(element.into()))
    }

    pub fn dictionary_of(element: impl Into<TypeDescriptor>) -> Self {
        Self::Dictionary(Box::new(element.into()))
    }

    pub fn collection_dictionary_of(element: impl Into<TypeDescriptor>) -> Self {
        Self::CollectionDictionary(Box::new(element.into()))
    }

    pub fn bare_collection() -> Self {
        Self::collection_of(Self::BARE)
    }

    pub fn bare_dictionary() -> Self {
        Self::dictionary_of(Self::BARE)
    }

    pub fn bare_collection_dictionary() -> Self {
        Self::collection_dictionary_of(Self::BARE)
    }

    /// Wrap `element` in the given container shape
    pub fn with_shape(shape: ContainerShape, element: TypeDescriptor) -> Self {
        match shape {
            ContainerShape::Scalar => element,
            ContainerShape::Collection => Self::collection_of(element),
            ContainerShape::Dictionary => Self::dictionary_of(element),
            ContainerShape::CollectionDictionary => Self::collection_dictionary_of(element),
        }
    }

    pub fn shape(&self) -> ContainerShape {
        match self {
            TypeDescriptor::Scalar { .. } => ContainerShape::Scalar,
            TypeDescriptor::Collection(_) => ContainerShape::Collection,
            TypeDescriptor::Dictionary(_) => ContainerShape::Dictionary,
            TypeDescriptor::CollectionDictionary(_) => ContainerShape::CollectionDictionary,
        }
    }

    /// Element type of a container, `None` for scalars
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Scalar { .. } => None,
            TypeDescriptor::Collection(element)
            | TypeDescriptor::Dictionary(element)
            | TypeDescriptor::CollectionDictionary(element) => Some(element),
        }
    }

    fn innermost(&self) -> (ElementSet, bool) {
        match self {
            TypeDescriptor::Scalar { kinds, literal } => (*kinds, *literal),
            TypeDescriptor::Collection(element)
            | TypeDescriptor::Dictionary(element)
            | TypeDescriptor::CollectionDictionary(element) => element.innermost(),
        }
    }

    fn map_innermost(self, f: impl FnOnce(ElementSet, bool) -> (ElementSet, bool)) -> Self {
        match self {
            TypeDescriptor::Scalar { kinds, literal } => {
                let (kinds, literal) = f(kinds, literal);
                TypeDescriptor::Scalar { kinds, literal }
            }
            TypeDescriptor::Collection(element) => {
                TypeDescriptor::Collection(Box::new(element.map_innermost(f)))
            }
            TypeDescriptor::Dictionary(element) => {
                TypeDescriptor::Dictionary(Box::new(element.map_innermost(f)))
            }
            TypeDescriptor::CollectionDictionary(element) => {
                TypeDescriptor::CollectionDictionary(Box::new(element.map_innermost(f)))
            }
        }
    }

    /// Same type with the Literal modifier set on its scalar element
    pub fn as_literal(self) -> Self {
        self.map_innermost(|kinds, _| (kinds, true))
    }

    /// Same type with the Literal modifier cleared
    pub fn without_literal(self) -> Self {
        self.map_innermost(|kinds, _| (kinds, false))
    }

    pub fn is_literal(&self) -> bool {
        self.innermost().1
    }

    /// Element kinds at the innermost level
    pub fn kinds(&self) -> ElementSet {
        self.innermost().0
    }

    /// True for an element-less, non-literal scalar
    pub fn is_bare(&self) -> bool {
        matches!(self, TypeDescriptor::Scalar { kinds, literal: false } if kinds.is_empty())
    }

    pub fn is_error(&self) -> bool {
        self.kinds().contains(ElementKind::Error)
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Scalar { kinds, .. } if *kinds == ElementSet::single(ElementKind::Void)
        )
    }

    /// The concrete kind of a single-kind scalar
    pub fn single_kind(&self) -> Option<ElementKind> {
        match self {
            TypeDescriptor::Scalar { kinds, .. } => kinds.single_kind(),
            _ => None,
        }
    }

    pub fn is_value_type(&self) -> bool {
        match self {
            TypeDescriptor::Scalar { kinds, .. } => {
                !kinds.is_empty() && kinds.is_subset_of(ElementSet::VALUE_TYPE)
            }
            _ => false,
        }
    }

    /// Containers and scalars of reference kinds have no meaningful default value
    pub fn is_reference_type(&self) -> bool {
        !self.is_value_type()
    }

    /// Whether a value of type `self` may be used where `target` is required
    ///
    /// Container markers gate first: both sides must share the same shape at
    /// every level, and a bare element on either side matches any element.
    /// Scalars then compare element kinds: `self` must fall within `target`,
    /// and a Literal `target` additionally demands a Literal `self`. A Literal
    /// `self` is accepted wherever its plain counterpart is. Error types are
    /// compatible with nothing.
    pub fn compatible_with(&self, target: &TypeDescriptor) -> bool {
        match (self, target) {
            (TypeDescriptor::Collection(candidate), TypeDescriptor::Collection(target))
            | (TypeDescriptor::Dictionary(candidate), TypeDescriptor::Dictionary(target))
            | (
                TypeDescriptor::CollectionDictionary(candidate),
                TypeDescriptor::CollectionDictionary(target),
            ) => {
                candidate.is_bare() || target.is_bare() || candidate.compatible_with(target)
            }
            (
                TypeDescriptor::Scalar {
                    kinds: candidate,
                    literal: candidate_literal,
                },
                TypeDescriptor::Scalar {
                    kinds: target,
                    literal: target_literal,
                },
            ) => {
                if candidate.contains(ElementKind::Error) || target.contains(ElementKind::Error) {
                    return false;
                }
                if *target_literal && !*candidate_literal {
                    return false;
                }
                if candidate.is_empty() {
                    return target.is_empty();
                }
                candidate.is_subset_of(*target)
            }
            _ => false,
        }
    }

    /// Human-readable description, e.g. `Collection of Literal Number`
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Collection(element) => describe_container("Collection", element),
            TypeDescriptor::Dictionary(element) => describe_container("Dictionary", element),
            TypeDescriptor::CollectionDictionary(element) => {
                describe_container("CollectionDictionary", element)
            }
            TypeDescriptor::Scalar { kinds, literal } => {
                let base = describe_kinds(*kinds);
                if *literal {
                    format!("Literal {}", base)
                } else {
                    base.to_string()
                }
            }
        }
    }
}

fn describe_container(prefix: &str, element: &TypeDescriptor) -> String {
    if element.is_bare() {
        prefix.to_string()
    } else {
        format!("{} of {}", prefix, element.describe())
    }
}

fn describe_kinds(kinds: ElementSet) -> &'static str {
    if kinds == ElementSet::ANYTHING {
        return "Anything";
    }
    if let Some(kind) = kinds.single_kind() {
        return kind.name();
    }
    kinds.union_name().unwrap_or("Unknown Type")
}

impl From<ElementKind> for TypeDescriptor {
    fn from(kind: ElementKind) -> Self {
        Self::scalar(kind)
    }
}

impl From<ElementSet> for TypeDescriptor {
    fn from(kinds: ElementSet) -> Self {
        Self::union(kinds)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Failure to parse a type description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown type description: {0}")]
pub struct ParseTypeError(pub String);

impl FromStr for TypeDescriptor {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        for (prefix, shape) in [
            ("collectiondictionary", ContainerShape::CollectionDictionary),
            ("collection", ContainerShape::Collection),
            ("dictionary", ContainerShape::Dictionary),
        ] {
            let Some(rest) = strip_prefix_ignore_case(text, prefix) else {
                continue;
            };
            let rest = rest.trim_start();
            if rest.is_empty() {
                return Ok(Self::with_shape(shape, Self::BARE));
            }
            if let Some(element) = strip_prefix_ignore_case(rest, "of ") {
                return Ok(Self::with_shape(shape, element.parse()?));
            }
        }

        if let Some(rest) = strip_prefix_ignore_case(text, "literal ") {
            let inner: TypeDescriptor = rest.parse()?;
            if inner.shape() != ContainerShape::Scalar {
                return Err(ParseTypeError(s.to_string()));
            }
            return Ok(inner.as_literal());
        }

        if let Some(kind) = ElementKind::from_name(text) {
            return Ok(Self::scalar(kind));
        }
        ElementSet::from_union_name(text)
            .map(Self::union)
            .ok_or_else(|| ParseTypeError(s.to_string()))
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_type() -> Vec<TypeDescriptor> {
        let mut scalars: Vec<TypeDescriptor> = ElementKind::ALL
            .iter()
            .filter(|kind| **kind != ElementKind::Error)
            .map(|kind| TypeDescriptor::scalar(*kind))
            .collect();
        scalars.extend(ElementSet::NAMED_UNIONS.iter().map(|(_, set)| TypeDescriptor::union(*set)));
        let literals: Vec<_> = scalars.iter().cloned().map(TypeDescriptor::as_literal).collect();
        scalars.extend(literals);

        let mut all = scalars.clone();
        for scalar in &scalars {
            all.push(TypeDescriptor::collection_of(scalar.clone()));
            all.push(TypeDescriptor::dictionary_of(scalar.clone()));
            all.push(TypeDescriptor::collection_dictionary_of(scalar.clone()));
            all.push(TypeDescriptor::collection_of(TypeDescriptor::dictionary_of(scalar.clone())));
        }
        all.push(TypeDescriptor::bare_collection());
        all.push(TypeDescriptor::bare_dictionary());
        all.push(TypeDescriptor::bare_collection_dictionary());
        all
    }

    #[test]
    fn test_compatibility_is_reflexive() {
        for ty in every_type() {
            assert!(ty.compatible_with(&ty), "{} should be compatible with itself", ty);
        }
    }

    #[test]
    fn test_error_is_never_compatible() {
        let error = TypeDescriptor::ERROR;
        assert!(!error.compatible_with(&error));
        assert!(!error.compatible_with(&TypeDescriptor::ANYTHING));
        assert!(!TypeDescriptor::NUMBER.compatible_with(&error));
        let errors = TypeDescriptor::collection_of(error);
        assert!(!errors.compatible_with(&errors));
    }

    #[test]
    fn test_literal_substitution() {
        let number = TypeDescriptor::NUMBER;
        let literal_number = TypeDescriptor::NUMBER.as_literal();

        // Plain values are rejected where a literal is demanded
        assert!(!number.compatible_with(&literal_number));
        // Literals satisfy both literal and plain targets
        assert!(literal_number.compatible_with(&literal_number));
        assert!(literal_number.compatible_with(&number));
        // Literal-ness never widens the base type
        assert!(!literal_number.compatible_with(&TypeDescriptor::TEXT));
        assert!(!TypeDescriptor::TEXT.as_literal().compatible_with(&literal_number));
    }

    #[test]
    fn test_container_markers_gate_before_elements() {
        let number = TypeDescriptor::NUMBER;
        let numbers = TypeDescriptor::collection_of(ElementKind::Number);
        let number_dict = TypeDescriptor::dictionary_of(ElementKind::Number);
        let number_multi = TypeDescriptor::collection_dictionary_of(ElementKind::Number);

        assert!(!numbers.compatible_with(&number));
        assert!(!number.compatible_with(&numbers));
        assert!(!numbers.compatible_with(&number_dict));
        assert!(!number_dict.compatible_with(&number_multi));
        assert!(!number_multi.compatible_with(&numbers));
        assert!(!numbers.compatible_with(&TypeDescriptor::ANYTHING));
        assert!(numbers.compatible_with(&TypeDescriptor::collection_of(ElementSet::VALUE_TYPE)));
        assert!(!numbers.compatible_with(&TypeDescriptor::collection_of(ElementKind::Text)));
    }

    #[test]
    fn test_bare_containers_match_same_shape() {
        let bare = TypeDescriptor::bare_collection();
        let numbers = TypeDescriptor::collection_of(ElementKind::Number);

        assert!(bare.compatible_with(&numbers));
        assert!(numbers.compatible_with(&bare));
        assert!(!bare.compatible_with(&TypeDescriptor::dictionary_of(ElementKind::Number)));
        assert!(!TypeDescriptor::bare_dictionary()
            .compatible_with(&TypeDescriptor::bare_collection_dictionary()));
    }

    #[test]
    fn test_nested_containers() {
        let nested =
            TypeDescriptor::collection_of(TypeDescriptor::dictionary_of(ElementKind::Number));

        assert!(nested.compatible_with(&TypeDescriptor::collection_of(TypeDescriptor::dictionary_of(
            ElementSet::VALUE_TYPE
        ))));
        // Inner shape must agree too
        let nested_collections =
            TypeDescriptor::collection_of(TypeDescriptor::collection_of(ElementKind::Number));
        assert!(!nested.compatible_with(&nested_collections));
        assert!(!nested.compatible_with(&TypeDescriptor::collection_of(ElementKind::Number)));
        // A bare outer collection accepts any nesting
        assert!(nested.compatible_with(&TypeDescriptor::bare_collection()));
        // A bare inner dictionary accepts any dictionary element
        assert!(nested.compatible_with(&TypeDescriptor::collection_of(
            TypeDescriptor::bare_dictionary()
        )));
        // Literal rule applies at the innermost level
        let literal_nested = nested.clone().as_literal();
        assert!(literal_nested.compatible_with(&nested));
        assert!(!nested.compatible_with(&literal_nested));
    }

    #[test]
    fn test_union_targets_accept_members() {
        let perceivable = TypeDescriptor::union(ElementSet::PERCEIVABLE);
        assert!(TypeDescriptor::scalar(ElementKind::Character).compatible_with(&perceivable));
        assert!(TypeDescriptor::scalar(ElementKind::Location).compatible_with(&perceivable));
        assert!(!TypeDescriptor::scalar(ElementKind::Race).compatible_with(&perceivable));
        // A union is not accepted where a single member is required
        assert!(!perceivable.compatible_with(&TypeDescriptor::scalar(ElementKind::Character)));
        assert!(TypeDescriptor::NUMBER.as_literal().compatible_with(&TypeDescriptor::ANYTHING));
        assert!(TypeDescriptor::VOID.compatible_with(&TypeDescriptor::ANYTHING));
        assert!(!TypeDescriptor::VOID.compatible_with(&TypeDescriptor::COLLECTION_ITEM));
    }

    #[test]
    fn test_named_unions_are_consistent() {
        assert!(ElementSet::VALUE_TYPE.is_subset_of(ElementSet::COLLECTION_ITEM));
        assert!(ElementSet::REFERENCE_TYPE.is_subset_of(ElementSet::COLLECTION_ITEM));
        assert!(ElementSet::PERCEIVABLE.is_subset_of(ElementSet::REFERENCE_TYPE));
        assert!(ElementSet::MATERIAL.is_subset_of(ElementSet::TAGGED));
        assert!(ElementSet::TOON.is_subset_of(ElementSet::REFERENCE_TYPE));
        assert!(!ElementSet::ANYTHING.contains(ElementKind::Error));
        assert_eq!(
            ElementSet::VALUE_TYPE.union(ElementSet::REFERENCE_TYPE),
            ElementSet::COLLECTION_ITEM
        );
        assert_eq!(ElementSet::ANYTHING.len(), ElementKind::ALL.len() - 1);
        for kind in ElementKind::ALL {
            assert!(!(kind.is_value_type() && kind.is_reference_type()), "{} is both", kind);
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(TypeDescriptor::ANYTHING.describe(), "Anything");
        assert_eq!(TypeDescriptor::NUMBER.describe(), "Number");
        assert_eq!(TypeDescriptor::NUMBER.as_literal().describe(), "Literal Number");
        assert_eq!(
            TypeDescriptor::collection_of(ElementKind::Text).describe(),
            "Collection of Text"
        );
        assert_eq!(
            TypeDescriptor::collection_dictionary_of(ElementKind::Character).describe(),
            "CollectionDictionary of Character"
        );
        assert_eq!(TypeDescriptor::bare_dictionary().describe(), "Dictionary");
        assert_eq!(TypeDescriptor::union(ElementSet::PERCEIVABLE).describe(), "Perceivable");
        assert_eq!(
            TypeDescriptor::union(ElementSet::of(&[ElementKind::Number, ElementKind::Race]))
                .describe(),
            "Unknown Type"
        );
        for kind in ElementKind::ALL {
            assert_eq!(TypeDescriptor::scalar(kind).describe(), kind.name());
        }
    }

    #[test]
    fn test_parse_descriptions() {
        for ty in every_type() {
            let parsed: TypeDescriptor = ty.describe().parse().unwrap();
            assert_eq!(parsed, ty, "round trip of {}", ty);
        }
        assert_eq!(
            "collection of literal number".parse::<TypeDescriptor>().unwrap(),
            TypeDescriptor::collection_of(TypeDescriptor::NUMBER.as_literal())
        );
        assert!("Unknown Type".parse::<TypeDescriptor>().is_err());
        assert!("Literal Collection of Number".parse::<TypeDescriptor>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let ty = TypeDescriptor::dictionary_of(TypeDescriptor::TEXT.as_literal());
        let json = serde_json::to_string(&ty).unwrap();
        let back: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }
}
