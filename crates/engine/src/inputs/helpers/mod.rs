//! Conversion of entered values into literals, one helper per input type.
//!
//! [`input_helper`] dispatches exhaustively over [`InputType`]. Collection and
//! map helpers parse JSON text and convert each element with the helper for
//! their element type.

mod boolean;
mod collection;
mod datetime;
mod duration;
mod float;
mod integer;
mod map;
mod none;
mod string;
mod structure;
mod unsupported;

use flytedeck_types::Literal;
use serde_json::Value;

use super::{
    types::{InputType, InputTypeDefinition, InputValue},
    validation::ValidationError,
};

pub use integer::{MAX_SAFE_INTEGER, is_valid_integer};

/// Converts and validates values for one input type.
pub trait InputHelper: Sync {
    /// Convert an entered value into its wire literal.
    fn to_literal(&self, value: &InputValue, type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError>;

    /// Check a value without keeping the converted literal.
    fn validate(&self, value: &InputValue, type_definition: &InputTypeDefinition) -> Result<(), ValidationError> {
        self.to_literal(value, type_definition).map(|_| ())
    }
}

pub fn input_helper(input_type: InputType) -> &'static dyn InputHelper {
    match input_type {
        InputType::Boolean => &boolean::BooleanHelper,
        InputType::Collection => &collection::CollectionHelper,
        InputType::Datetime => &datetime::DatetimeHelper,
        InputType::Duration => &duration::DurationHelper,
        InputType::Float => &float::FloatHelper,
        InputType::Integer => &integer::IntegerHelper,
        InputType::Map => &map::MapHelper,
        InputType::None => &none::NoneHelper,
        InputType::String => &string::StringHelper,
        InputType::Struct => &structure::StructHelper,
        InputType::Binary | InputType::Blob | InputType::Error | InputType::Schema | InputType::Unknown => &unsupported::UnsupportedHelper,
    }
}

/// Element type of a collection or map definition.
fn element_type<'a>(type_definition: &'a InputTypeDefinition) -> Result<&'a InputTypeDefinition, ValidationError> {
    type_definition
        .subtype
        .as_deref()
        .ok_or_else(|| ValidationError::new(format!("{} input is missing an element type", type_definition.input_type)))
}

/// Parse JSON text entered for a nested input.
fn parse_json_text(value: &InputValue) -> Option<Value> {
    match value {
        InputValue::String(text) => serde_json::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Convert one parsed JSON element into an entered value for its element helper.
///
/// Nested arrays and objects are passed on as JSON text.
fn json_to_input_value(value: &Value) -> Result<InputValue, ValidationError> {
    match value {
        Value::String(text) => Ok(InputValue::String(text.clone())),
        Value::Bool(flag) => Ok(InputValue::Boolean(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(InputValue::Integer(integer)),
            None => number
                .as_f64()
                .map(InputValue::Float)
                .ok_or_else(|| ValidationError::new("Value is not a representable number")),
        },
        Value::Array(_) | Value::Object(_) => Ok(InputValue::String(value.to_string())),
        Value::Null => Err(ValidationError::new("null is not a valid value")),
    }
}

fn convert_element(value: &Value, element: &InputTypeDefinition) -> Result<Literal, ValidationError> {
    let entered = json_to_input_value(value)?;
    input_helper(element.input_type).to_literal(&entered, element)
}
