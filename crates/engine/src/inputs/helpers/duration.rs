use std::time::Duration;

use flytedeck_types::{Literal, Primitive};

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Durations are entered as a non-negative number of milliseconds.
pub struct DurationHelper;

impl InputHelper for DurationHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let millis = match value {
            InputValue::Integer(integer) => Some(*integer as f64),
            InputValue::Float(float) => Some(*float),
            InputValue::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        millis
            .filter(|millis| millis.is_finite() && *millis >= 0.0)
            .and_then(|millis| Duration::try_from_secs_f64(millis / 1000.0).ok())
            .map(|duration| Literal::primitive(Primitive::Duration(duration)))
            .ok_or_else(|| ValidationError::new("Value is not a valid duration in milliseconds"))
    }
}
