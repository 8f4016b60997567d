//! Minimal world objects for the host demo

use progs_core::ElementKind;
use progs_scripting::{dispatch, DotReferences, Gender, HostObject, Property, PropertyReturn, Value};

/// A player or NPC as the engine sees it
#[derive(Debug, Clone)]
pub struct Character {
    pub id: u64,
    pub name: String,
    pub gender: Gender,
    pub level: u32,
}

impl Character {
    pub fn new(id: u64, name: impl Into<String>, gender: Gender, level: u32) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            level,
        }
    }
}

static CHARACTER_PROPERTIES: &[Property<Character>] = &[
    Property {
        name: "Name",
        returns: PropertyReturn::Kind(ElementKind::Text),
        help: "The character's name",
        get: |character| Value::Text(character.name.clone()),
    },
    Property {
        name: "Id",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "The character's unique id",
        get: |character| Value::Number(character.id as f64),
    },
    Property {
        name: "Gender",
        returns: PropertyReturn::Kind(ElementKind::Gender),
        help: "The character's gender",
        get: |character| Value::Gender(character.gender),
    },
    Property {
        name: "Level",
        returns: PropertyReturn::Kind(ElementKind::Number),
        help: "The character's experience level",
        get: |character| Value::Number(character.level as f64),
    },
];

impl DotReferences for Character {
    fn properties() -> &'static [Property<Self>] {
        CHARACTER_PROPERTIES
    }
}

impl HostObject for Character {
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
