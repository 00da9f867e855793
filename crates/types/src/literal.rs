//! Declared parameter types and the literal values submitted for them.
//!
//! `LiteralType` describes what a workflow input accepts; `Literal` is the
//! wire value sent when launching. Both are recursive: collections and maps
//! carry the type (or values) of their elements.

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleType {
    None,
    Integer,
    Float,
    String,
    Boolean,
    Datetime,
    Duration,
    Binary,
    Error,
    Struct,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlobDimensionality {
    #[default]
    Single,
    Multipart,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BlobType {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub dimensionality: BlobDimensionality,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SchemaType {
    #[serde(default)]
    pub columns: Vec<JsonValue>,
}

/// Declared type of a variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LiteralType {
    Simple(SimpleType),
    Schema(SchemaType),
    CollectionType(Box<LiteralType>),
    MapValueType(Box<LiteralType>),
    Blob(BlobType),
}

impl LiteralType {
    pub fn collection_of(element: LiteralType) -> Self {
        Self::CollectionType(Box::new(element))
    }

    pub fn map_of(value: LiteralType) -> Self {
        Self::MapValueType(Box::new(value))
    }
}

/// A typed, documented interface variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Variable {
    /// Missing when the record was produced by a newer control plane with a
    /// type this client does not model.
    #[serde(default, rename = "type")]
    pub r#type: Option<LiteralType>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Launch-time parameter: a variable plus an optional default value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Parameter {
    pub var: Variable,
    #[serde(default)]
    pub default: Option<Literal>,
}

/// Parameters keyed by name, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParameterMap {
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Primitive {
    Integer(i64),
    FloatValue(f64),
    StringValue(String),
    Boolean(bool),
    Datetime(DateTime<Utc>),
    #[serde(with = "duration_seconds")]
    Duration(Duration),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Scalar {
    Primitive(Primitive),
    Blob { uri: String },
    Schema { uri: String },
    /// Free-form JSON object, used for `Struct` inputs.
    Generic(serde_json::Map<String, JsonValue>),
    NoneType {},
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Scalar(Scalar),
    Collection { literals: Vec<Literal> },
    Map { literals: IndexMap<String, Literal> },
}

impl Literal {
    pub fn primitive(primitive: Primitive) -> Self {
        Self::Scalar(Scalar::Primitive(primitive))
    }

    pub fn integer(value: i64) -> Self {
        Self::primitive(Primitive::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive(Primitive::StringValue(value.into()))
    }

    pub fn none() -> Self {
        Self::Scalar(Scalar::NoneType {})
    }

    /// Extract the integer payload, if this literal is an integer primitive.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Primitive(Primitive::Integer(value))) => Some(*value),
            _ => None,
        }
    }
}

/// Named literal values, as submitted with a launch request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LiteralMap {
    #[serde(default)]
    pub literals: IndexMap<String, Literal>,
}

/// Durations travel as decimal seconds with an `s` suffix (`"1.500s"`).
mod duration_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let seconds = raw
            .strip_suffix('s')
            .ok_or_else(|| D::Error::custom(format!("duration '{raw}' is missing the 's' suffix")))?;
        let seconds: f64 = seconds
            .parse()
            .map_err(|error| D::Error::custom(format!("invalid duration '{raw}': {error}")))?;
        Duration::try_from_secs_f64(seconds).map_err(|error| D::Error::custom(format!("invalid duration '{raw}': {error}")))
    }
}
