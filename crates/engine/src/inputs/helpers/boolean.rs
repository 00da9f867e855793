use flytedeck_types::{Literal, Primitive};

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

pub struct BooleanHelper;

impl InputHelper for BooleanHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let parsed = match value {
            InputValue::Boolean(flag) => Some(*flag),
            InputValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(|flag| Literal::primitive(Primitive::Boolean(flag)))
            .ok_or_else(|| ValidationError::new("Value is not a valid boolean"))
    }
}
