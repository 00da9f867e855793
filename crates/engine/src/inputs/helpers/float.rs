use flytedeck_types::{Literal, Primitive};

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

pub struct FloatHelper;

impl InputHelper for FloatHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let parsed = match value {
            InputValue::Float(float) => Some(*float),
            InputValue::Integer(integer) => Some(*integer as f64),
            InputValue::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|float| float.is_finite())
            .map(|float| Literal::primitive(Primitive::FloatValue(float)))
            .ok_or_else(|| ValidationError::new("Value is not a valid floating point number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::InputType;

    fn convert(value: InputValue) -> Result<Literal, ValidationError> {
        FloatHelper.to_literal(&value, &InputTypeDefinition::simple(InputType::Float))
    }

    #[test]
    fn parses_floats() {
        assert_eq!(convert("1.25".into()), Ok(Literal::primitive(Primitive::FloatValue(1.25))));
        assert_eq!(convert(InputValue::Integer(2)), Ok(Literal::primitive(Primitive::FloatValue(2.0))));
        assert!(convert("abc".into()).is_err());
        assert!(convert("NaN".into()).is_err());
        assert!(convert(InputValue::Boolean(false)).is_err());
    }
}
