//! Field definitions for store collections.

use serde::Serialize;
use std::fmt;

/// Column types used by the auth collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Date,
    Bool,
    Number,
    Relation,
}

impl FieldType {
    /// The value PocketBase stores for an unset column of this type.
    pub fn zero_value(&self) -> serde_json::Value {
        match self {
            FieldType::Text | FieldType::Email | FieldType::Date | FieldType::Relation => {
                serde_json::Value::String(String::new())
            }
            FieldType::Bool => serde_json::Value::Bool(false),
            FieldType::Number => serde_json::Value::from(0),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Date => "date",
            FieldType::Bool => "bool",
            FieldType::Number => "number",
            FieldType::Relation => "relation",
        };
        f.write_str(s)
    }
}

/// One column of a collection, serialized in the collection import format.
///
/// Note that for `bool` and `number` columns PocketBase reads `required` as
/// "must be true / non-zero", so those are never marked required here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Target collection id for relation columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_select: Option<u32>,
}

impl FieldDefinition {
    fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required: false,
            unique: false,
            min: None,
            max: None,
            pattern: None,
            collection_id: None,
            cascade_delete: None,
            max_select: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn email(name: &str) -> Self {
        Self::new(name, FieldType::Email)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Single-valued, non-cascading relation to `target_collection_id`.
    pub fn relation(name: &str, target_collection_id: &str) -> Self {
        Self {
            collection_id: Some(target_collection_id.to_string()),
            cascade_delete: Some(false),
            max_select: Some(1),
            ..Self::new(name, FieldType::Relation)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}
