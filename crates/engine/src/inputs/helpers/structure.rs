use flytedeck_types::{Literal, Scalar};
use serde_json::Value;

use super::{InputHelper, parse_json_text};
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Struct inputs are free-form JSON objects.
pub struct StructHelper;

impl InputHelper for StructHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        match parse_json_text(value) {
            Some(Value::Object(fields)) => Ok(Literal::Scalar(Scalar::Generic(fields))),
            _ => Err(ValidationError::new("Value did not parse to an object")),
        }
    }
}
