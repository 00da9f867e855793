use flytedeck_types::Literal;
use indexmap::IndexMap;
use serde_json::Value;

use super::{InputHelper, convert_element, element_type, parse_json_text};
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Maps are entered as a JSON object with string keys.
pub struct MapHelper;

impl InputHelper for MapHelper {
    fn to_literal(&self, value: &InputValue, type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let element = element_type(type_definition)?;
        let Some(Value::Object(entries)) = parse_json_text(value) else {
            return Err(ValidationError::new("Value did not parse to an object"));
        };

        let mut literals = IndexMap::with_capacity(entries.len());
        for (key, item) in &entries {
            let literal = convert_element(item, element).map_err(|error| error.within(format_args!("key '{key}'")))?;
            literals.insert(key.clone(), literal);
        }
        Ok(Literal::Map { literals })
    }
}
