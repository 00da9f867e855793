use flytedeck_types::Literal;

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

pub struct StringHelper;

impl InputHelper for StringHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        match value {
            InputValue::String(text) => Ok(Literal::string(text.clone())),
            other => Err(ValidationError::new(format!("Value is not a string (got {})", other.kind()))),
        }
    }
}
