//! Built-in collections provisioned at startup.

use crate::core::schema::{CollectionSchema, SchemaField};

pub const BEHAVIORS: &str = "behaviors";
pub const CLASSES: &str = "classes";

/// Allowed values of `behaviors.type`: positive ("wow") and negative ("nono") behaviors.
pub const BEHAVIOR_TYPES: [&str; 2] = ["wow", "nono"];

pub fn behaviors_collection() -> CollectionSchema {
    CollectionSchema::base(BEHAVIORS)
        .with_field(SchemaField::text("label").required())
        .with_field(SchemaField::number("pts").required())
        .with_field(SchemaField::select("type", &BEHAVIOR_TYPES, 1).required())
        .with_field(SchemaField::text("icon"))
}

pub fn classes_collection() -> CollectionSchema {
    CollectionSchema::base(CLASSES)
        .with_field(SchemaField::text("name").required())
        .with_field(SchemaField::text("teacher").required())
        .with_field(SchemaField::json("students"))
        .with_field(SchemaField::json("tasks"))
}

/// Provisioning order matters only for log readability: behaviors, then classes.
pub fn default_collections() -> Vec<CollectionSchema> {
    vec![behaviors_collection(), classes_collection()]
}
