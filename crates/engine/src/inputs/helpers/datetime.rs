use chrono::{DateTime, Utc};
use flytedeck_types::{Literal, Primitive};

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

/// Accepts RFC 3339 text or an already-parsed timestamp.
pub struct DatetimeHelper;

impl InputHelper for DatetimeHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        let parsed = match value {
            InputValue::Datetime(timestamp) => Some(*timestamp),
            InputValue::String(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|timestamp| timestamp.with_timezone(&Utc)),
            _ => None,
        };
        parsed
            .map(|timestamp| Literal::primitive(Primitive::Datetime(timestamp)))
            .ok_or_else(|| ValidationError::new("Value is not a valid RFC 3339 datetime"))
    }
}
