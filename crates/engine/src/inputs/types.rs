use std::fmt;

use chrono::{DateTime, Utc};
use flytedeck_types::Literal;
use indexmap::IndexMap;
use serde::Serialize;

/// Form-level input category derived from a declared literal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    Binary,
    Blob,
    Boolean,
    Collection,
    Datetime,
    Duration,
    Error,
    Float,
    Integer,
    Map,
    None,
    Schema,
    String,
    Struct,
    Unknown,
}

impl InputType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Blob => "blob",
            Self::Boolean => "boolean",
            Self::Collection => "collection",
            Self::Datetime => "datetime",
            Self::Duration => "duration",
            Self::Error => "error",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Map => "map",
            Self::None => "none",
            Self::Schema => "schema",
            Self::String => "string",
            Self::Struct => "struct",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this category carries an element type.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Collection | Self::Map)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An input type with its element type for collections and maps.
///
/// Built through the constructors, `subtype` is present exactly when the
/// type is nested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InputTypeDefinition {
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Box<InputTypeDefinition>>,
}

impl InputTypeDefinition {
    pub fn simple(input_type: InputType) -> Self {
        debug_assert!(!input_type.is_nested());
        Self {
            input_type,
            subtype: None,
        }
    }

    pub fn collection(element: InputTypeDefinition) -> Self {
        Self {
            input_type: InputType::Collection,
            subtype: Some(Box::new(element)),
        }
    }

    pub fn map(value: InputTypeDefinition) -> Self {
        Self {
            input_type: InputType::Map,
            subtype: Some(Box::new(value)),
        }
    }

    /// Human-readable type label, e.g. `collection of map of integer`.
    pub fn label(&self) -> String {
        match (&self.input_type, &self.subtype) {
            (InputType::Collection, Some(element)) => format!("collection of {}", element.label()),
            (InputType::Map, Some(value)) => format!("map of {}", value.label()),
            (input_type, _) => input_type.label().to_string(),
        }
    }
}

/// One launch form input resolved from a parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInput {
    pub name: String,
    /// `name (type label)`
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub type_definition: InputTypeDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<Literal>,
}

/// A raw value entered for an input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(DateTime<Utc>),
}

impl InputValue {
    /// Blank text counts as no value.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::String(text) if text.trim().is_empty())
    }

    /// Short description of the value's kind for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Datetime(_) => "datetime",
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Entered values keyed by input name.
pub type InputValueMap = IndexMap<String, InputValue>;
