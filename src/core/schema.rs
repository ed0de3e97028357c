//! Typed collection and field descriptors.
//!
//! A [`CollectionSchema`] is the in-memory description of one record collection:
//! its name, kind, API rules and ordered field list. Descriptors serialize to the
//! flat JSON shape used by the export/import surface, e.g.
//! `{"id":"type","name":"type","type":"select","maxSelect":1,"values":["wow","nono"],"required":true}`.

use crate::core::error::SeedError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Columns every record table carries; user fields may not reuse them.
pub const SYSTEM_FIELDS: [&str; 3] = ["id", "created", "updated"];

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Email,
    Url,
    Date,
    Select,
    Json,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Json => "json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Field type tag plus its type-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FieldKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "is_false")]
        no_decimal: bool,
    },
    Bool,
    Email,
    Url,
    Date,
    Select {
        max_select: u32,
        values: Vec<String>,
    },
    Json {
        /// Zero means unlimited.
        #[serde(default)]
        max_size: u64,
    },
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text { .. } => FieldType::Text,
            FieldKind::Number { .. } => FieldType::Number,
            FieldKind::Bool => FieldType::Bool,
            FieldKind::Email => FieldType::Email,
            FieldKind::Url => FieldType::Url,
            FieldKind::Date => FieldType::Date,
            FieldKind::Select { .. } => FieldType::Select,
            FieldKind::Json { .. } => FieldType::Json,
        }
    }

    fn validate(&self, field: &str) -> Result<(), SeedError> {
        match self {
            FieldKind::Text {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => Err(SeedError::ValidationError(format!(
                "field '{}': min length {} exceeds max length {}",
                field, min, max
            ))),
            FieldKind::Text {
                pattern: Some(pattern),
                ..
            } => Regex::new(pattern).map(|_| ()).map_err(|e| {
                SeedError::ValidationError(format!("field '{}': invalid pattern: {}", field, e))
            }),
            FieldKind::Number {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => Err(SeedError::ValidationError(format!(
                "field '{}': min {} exceeds max {}",
                field, min, max
            ))),
            FieldKind::Select { max_select, values } => {
                if values.is_empty() {
                    return Err(SeedError::ValidationError(format!(
                        "field '{}': select requires at least one value",
                        field
                    )));
                }
                let mut seen = HashSet::new();
                for value in values {
                    if value.is_empty() || !seen.insert(value.as_str()) {
                        return Err(SeedError::ValidationError(format!(
                            "field '{}': select values must be non-empty and unique (got '{}')",
                            field, value
                        )));
                    }
                }
                if *max_select == 0 || *max_select as usize > values.len() {
                    return Err(SeedError::ValidationError(format!(
                        "field '{}': maxSelect must be between 1 and {}",
                        field,
                        values.len()
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Stable field id; the built-in collections use the field name.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

impl SchemaField {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            kind,
            required: false,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Text {
                min: None,
                max: None,
                pattern: None,
            },
        )
    }

    pub fn number(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Number {
                min: None,
                max: None,
                no_decimal: false,
            },
        )
    }

    pub fn json(name: &str) -> Self {
        Self::new(name, FieldKind::Json { max_size: 0 })
    }

    pub fn select(name: &str, values: &[&str], max_select: u32) -> Self {
        Self::new(
            name,
            FieldKind::Select {
                max_select,
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn select_values(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Select { values, .. } => Some(values),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), SeedError> {
        if !IDENTIFIER.is_match(&self.name) {
            return Err(SeedError::ValidationError(format!(
                "invalid field name '{}'",
                self.name
            )));
        }
        if SYSTEM_FIELDS.contains(&self.name.to_lowercase().as_str()) {
            return Err(SeedError::ValidationError(format!(
                "field name '{}' is reserved",
                self.name
            )));
        }
        if self.id.trim().is_empty() {
            return Err(SeedError::ValidationError(format!(
                "field '{}' has an empty id",
                self.name
            )));
        }
        self.kind.validate(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    #[default]
    Base,
    Auth,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Base => f.write_str("base"),
            CollectionKind::Auth => f.write_str("auth"),
        }
    }
}

/// Record-level API rules. `None` restricts the action to superusers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRules {
    #[serde(default)]
    pub list_rule: Option<String>,
    #[serde(default)]
    pub view_rule: Option<String>,
    #[serde(default)]
    pub create_rule: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CollectionKind,
    #[serde(flatten)]
    pub rules: ApiRules,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl CollectionSchema {
    pub fn new(name: &str, kind: CollectionKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            rules: ApiRules::default(),
            fields: Vec::new(),
        }
    }

    pub fn base(name: &str) -> Self {
        Self::new(name, CollectionKind::Base)
    }

    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fills empty field ids from field names. Hand-written import files often omit ids.
    pub fn normalized(mut self) -> Self {
        for field in &mut self.fields {
            if field.id.trim().is_empty() {
                field.id = field.name.clone();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        if self.name.trim().is_empty() {
            return Err(SeedError::ValidationError(
                "collection name must not be empty".to_string(),
            ));
        }
        if !IDENTIFIER.is_match(&self.name) {
            return Err(SeedError::ValidationError(format!(
                "invalid collection name '{}'",
                self.name
            )));
        }
        if self.name.starts_with('_') {
            return Err(SeedError::ValidationError(format!(
                "collection name '{}' is reserved (leading underscore)",
                self.name
            )));
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for field in &self.fields {
            field.validate().map_err(|e| match e {
                SeedError::ValidationError(msg) => {
                    SeedError::ValidationError(format!("{}: {}", self.name, msg))
                }
                other => other,
            })?;
            if !names.insert(field.name.to_lowercase()) {
                return Err(SeedError::ValidationError(format!(
                    "{}: duplicate field name '{}'",
                    self.name, field.name
                )));
            }
            if !ids.insert(field.id.as_str()) {
                return Err(SeedError::ValidationError(format!(
                    "{}: duplicate field id '{}'",
                    self.name, field.id
                )));
            }
        }
        Ok(())
    }

    /// SHA-256 (hex) over the serialized descriptor. Field order is significant.
    pub fn fingerprint(&self) -> Result<String, SeedError> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
