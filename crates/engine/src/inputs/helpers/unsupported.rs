use flytedeck_types::Literal;

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

pub struct UnsupportedHelper;

impl InputHelper for UnsupportedHelper {
    fn to_literal(&self, _value: &InputValue, type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        Err(ValidationError::new(format!(
            "Inputs of type {} are not supported",
            type_definition.input_type
        )))
    }
}
