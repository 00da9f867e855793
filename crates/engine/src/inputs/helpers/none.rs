use flytedeck_types::Literal;

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Inputs of the none type carry no value; anything entered is ignored.
pub struct NoneHelper;

impl InputHelper for NoneHelper {
    fn to_literal(&self, _value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        Ok(Literal::none())
    }
}
