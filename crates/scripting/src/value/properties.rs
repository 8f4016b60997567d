//! Property tables for the engine's own value kinds

use super::{Gender, ProgCollection, ProgCollectionDictionary, ProgDictionary, Value};
use crate::registry::{DotReferences, Property, PropertyReturn};
use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};
use progs_core::{ElementKind, TypeDescriptor};

/// Stand-in owner for the Void kind, which has no properties
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidValue;

impl DotReferences for VoidValue {
    fn properties() -> &'static [Property<Self>] {
        &[]
    }
}

impl DotReferences for bool {
    fn properties() -> &'static [Property<Self>] {
        &[]
    }
}

static NUMBER_PROPERTIES: &[Property<f64>] = &[
    Property {
        name: "Abs",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Absolute value",
        get: |n| Value::Number(n.abs()),
    },
    Property {
        name: "Floor",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Largest whole number not above this one",
        get: |n| Value::Number(n.floor()),
    },
    Property {
        name: "Ceiling",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Smallest whole number not below this one",
        get: |n| Value::Number(n.ceil()),
    },
    Property {
        name: "Round",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Nearest whole number, halves away from zero",
        get: |n| Value::Number(n.round()),
    },
];

impl DotReferences for f64 {
    fn properties() -> &'static [Property<Self>] {
        NUMBER_PROPERTIES
    }
}

fn words(text: &str) -> Value {
    let items = text.split_whitespace().map(Value::from).collect();
    Value::Collection(ProgCollection::from_checked(TypeDescriptor::TEXT, items))
}

static TEXT_PROPERTIES: &[Property<String>] = &[
    Property {
        name: "Length",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Number of characters",
        get: |text| Value::Number(text.chars().count() as f64),
    },
    Property {
        name: "Lower",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Lower-cased copy",
        get: |text| Value::Text(text.to_lowercase()),
    },
    Property {
        name: "Upper",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Upper-cased copy",
        get: |text| Value::Text(text.to_uppercase()),
    },
    Property {
        name: "Empty",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if the text has no characters",
        get: |text| Value::Boolean(text.is_empty()),
    },
    Property {
        name: "Words",
        returns: PropertyReturn::CollectionOf(ElementKind::Text),
        help: "The text split on whitespace",
        get: |text| words(text),
    },
];

impl DotReferences for String {
    fn properties() -> &'static [Property<Self>] {
        TEXT_PROPERTIES
    }
}

static DATE_TIME_PROPERTIES: &[Property<DateTime<Utc>>] = &[
    Property {
        name: "Year",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Calendar year",
        get: |dt| Value::Number(dt.year() as f64),
    },
    Property {
        name: "Month",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Month of the year, 1 to 12",
        get: |dt| Value::Number(dt.month() as f64),
    },
    Property {
        name: "Day",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Day of the month",
        get: |dt| Value::Number(dt.day() as f64),
    },
    Property {
        name: "Hour",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Hour of the day, 0 to 23",
        get: |dt| Value::Number(dt.hour() as f64),
    },
    Property {
        name: "Minute",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Minute of the hour",
        get: |dt| Value::Number(dt.minute() as f64),
    },
    Property {
        name: "Second",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Second of the minute",
        get: |dt| Value::Number(dt.second() as f64),
    },
    Property {
        name: "DayOfWeek",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Name of the weekday",
        get: |dt| Value::Text(dt.format("%A").to_string()),
    },
    Property {
        name: "Date",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "The date part as YYYY-MM-DD",
        get: |dt| Value::Text(dt.format("%Y-%m-%d").to_string()),
    },
];

impl DotReferences for DateTime<Utc> {
    fn properties() -> &'static [Property<Self>] {
        DATE_TIME_PROPERTIES
    }
}

fn total(span: &TimeDelta, unit_seconds: f64) -> Value {
    Value::Number(span.num_milliseconds() as f64 / 1000.0 / unit_seconds)
}

static TIME_SPAN_PROPERTIES: &[Property<TimeDelta>] = &[
    Property {
        name: "Days",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Whole days component",
        get: |span| Value::Number(span.num_days() as f64),
    },
    Property {
        name: "Hours",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Hours component, 0 to 23",
        get: |span| Value::Number((span.num_hours() % 24) as f64),
    },
    Property {
        name: "Minutes",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Minutes component, 0 to 59",
        get: |span| Value::Number((span.num_minutes() % 60) as f64),
    },
    Property {
        name: "Seconds",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Seconds component, 0 to 59",
        get: |span| Value::Number((span.num_seconds() % 60) as f64),
    },
    Property {
        name: "TotalDays",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Whole span in fractional days",
        get: |span| total(span, 86_400.0),
    },
    Property {
        name: "TotalHours",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Whole span in fractional hours",
        get: |span| total(span, 3_600.0),
    },
    Property {
        name: "TotalMinutes",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Whole span in fractional minutes",
        get: |span| total(span, 60.0),
    },
    Property {
        name: "TotalSeconds",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Whole span in fractional seconds",
        get: |span| total(span, 1.0),
    },
];

impl DotReferences for TimeDelta {
    fn properties() -> &'static [Property<Self>] {
        TIME_SPAN_PROPERTIES
    }
}

static GENDER_PROPERTIES: &[Property<Gender>] = &[
    Property {
        name: "Name",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Name of the gender",
        get: |gender| Value::from(gender.name()),
    },
    Property {
        name: "Male",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if male",
        get: |gender| Value::Boolean(*gender == Gender::Male),
    },
    Property {
        name: "Female",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if female",
        get: |gender| Value::Boolean(*gender == Gender::Female),
    },
    Property {
        name: "Neuter",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if neuter",
        get: |gender| Value::Boolean(*gender == Gender::Neuter),
    },
    Property {
        name: "Subjective",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Subjective pronoun (he, she, it, they)",
        get: |gender| Value::from(gender.subjective()),
    },
    Property {
        name: "Objective",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Objective pronoun (him, her, it, them)",
        get: |gender| Value::from(gender.objective()),
    },
    Property {
        name: "Possessive",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "Possessive pronoun (his, her, its, their)",
        get: |gender| Value::from(gender.possessive()),
    },
];

impl DotReferences for Gender {
    fn properties() -> &'static [Property<Self>] {
        GENDER_PROPERTIES
    }
}

fn element_of(element: &TypeDescriptor) -> TypeDescriptor {
    element.clone().without_literal()
}

fn text_collection<'a>(keys: impl Iterator<Item = &'a str>) -> Value {
    Value::Collection(ProgCollection::from_checked(
        TypeDescriptor::TEXT,
        keys.map(Value::from).collect(),
    ))
}

fn element_collection<'a>(
    element: &TypeDescriptor,
    items: impl Iterator<Item = &'a Value>,
) -> Value {
    Value::Collection(ProgCollection::from_checked(
        element_of(element),
        items.cloned().collect(),
    ))
}

fn first_or_null(element: &TypeDescriptor, item: Option<&Value>) -> Value {
    item.cloned()
        .unwrap_or_else(|| Value::Null(element_of(element)))
}

static COLLECTION_PROPERTIES: &[Property<ProgCollection>] = &[
    Property {
        name: "Count",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Number of items",
        get: |c| Value::Number(c.count() as f64),
    },
    Property {
        name: "Any",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there is at least one item",
        get: |c| Value::Boolean(!c.is_empty()),
    },
    Property {
        name: "Empty",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there are no items",
        get: |c| Value::Boolean(c.is_empty()),
    },
    Property {
        name: "Keys",
        returns: PropertyReturn::CollectionOf(ElementKind::Number),
        help: "Zero-based index of each item",
        get: |c| {
            let indices = (0..c.count()).map(|i| Value::Number(i as f64)).collect();
            Value::Collection(ProgCollection::from_checked(TypeDescriptor::NUMBER, indices))
        },
    },
    Property {
        name: "Values",
        returns: PropertyReturn::ElementCollection,
        help: "Copy of the items",
        get: |c| element_collection(c.element_type(), c.iter()),
    },
    Property {
        name: "First",
        returns: PropertyReturn::Element,
        help: "The first item, or null when empty",
        get: |c| first_or_null(c.element_type(), c.first()),
    },
    Property {
        name: "Last",
        returns: PropertyReturn::Element,
        help: "The last item, or null when empty",
        get: |c| first_or_null(c.element_type(), c.last()),
    },
];

impl DotReferences for ProgCollection {
    fn properties() -> &'static [Property<Self>] {
        COLLECTION_PROPERTIES
    }
}

static DICTIONARY_PROPERTIES: &[Property<ProgDictionary>] = &[
    Property {
        name: "Count",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Number of entries",
        get: |d| Value::Number(d.count() as f64),
    },
    Property {
        name: "Any",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there is at least one entry",
        get: |d| Value::Boolean(!d.is_empty()),
    },
    Property {
        name: "Empty",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there are no entries",
        get: |d| Value::Boolean(d.is_empty()),
    },
    Property {
        name: "Keys",
        returns: PropertyReturn::CollectionOf(ElementKind::Text),
        help: "The keys in insertion order",
        get: |d| text_collection(d.keys()),
    },
    Property {
        name: "Values",
        returns: PropertyReturn::ElementCollection,
        help: "The values in insertion order",
        get: |d| element_collection(d.element_type(), d.values()),
    },
];

impl DotReferences for ProgDictionary {
    fn properties() -> &'static [Property<Self>] {
        DICTIONARY_PROPERTIES
    }
}

static COLLECTION_DICTIONARY_PROPERTIES: &[Property<ProgCollectionDictionary>] = &[
    Property {
        name: "Count",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "Number of distinct keys",
        get: |d| Value::Number(d.count() as f64),
    },
    Property {
        name: "Any",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there is at least one key",
        get: |d| Value::Boolean(!d.is_empty()),
    },
    Property {
        name: "Empty",
        returns: PropertyReturn::Kind(ElementKind::Boolean),
        help: "True if there are no keys",
        get: |d| Value::Boolean(d.is_empty()),
    },
    Property {
        name: "Keys",
        returns: PropertyReturn::CollectionOf(ElementKind::Text),
        help: "The keys in insertion order",
        get: |d| text_collection(d.keys()),
    },
    Property {
        name: "Values",
        returns: PropertyReturn::ElementCollection,
        help: "Every value under every key",
        get: |d| element_collection(d.element_type(), d.values()),
    },
];

impl DotReferences for ProgCollectionDictionary {
    fn properties() -> &'static [Property<Self>] {
        COLLECTION_DICTIONARY_PROPERTIES
    }
}
