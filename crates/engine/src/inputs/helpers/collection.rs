use flytedeck_types::Literal;
use serde_json::Value;

use super::{InputHelper, convert_element, element_type, parse_json_text};
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Collections are entered as a JSON array; each element is converted with
/// the element type's helper.
pub struct CollectionHelper;

impl InputHelper for CollectionHelper {
    fn to_literal(&self, value: &InputValue, type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let element = element_type(type_definition)?;
        let Some(Value::Array(items)) = parse_json_text(value) else {
            return Err(ValidationError::new("Value did not parse to an array"));
        };

        let literals = items
            .iter()
            .enumerate()
            .map(|(index, item)| convert_element(item, element).map_err(|error| error.within(format_args!("index {index}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Literal::Collection { literals })
    }
}
