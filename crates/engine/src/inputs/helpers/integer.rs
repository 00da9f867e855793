use flytedeck_types::Literal;
use once_cell::sync::Lazy;
use regex::Regex;

use super::InputHelper;
use crate::inputs::{InputTypeDefinition, InputValue, ValidationError};

static INTEGER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("valid integer pattern"));

/// Largest integer a float can hold exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

const INVALID_MESSAGE: &str = "Value is not a valid integer";

pub struct IntegerHelper;

impl InputHelper for IntegerHelper {
    fn to_literal(&self, value: &InputValue, _type_definition: &InputTypeDefinition) -> Result<Literal, ValidationError> {
        parse_integer(value).map(Literal::integer)
    }
}

/// Whether `value` converts to a 64-bit integer.
pub fn is_valid_integer(value: &InputValue) -> bool {
    parse_integer(value).is_ok()
}

fn parse_integer(value: &InputValue) -> Result<i64, ValidationError> {
    match value {
        InputValue::Integer(integer) => Ok(*integer),
        InputValue::Float(float) if float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER => Ok(*float as i64),
        InputValue::String(text) if INTEGER_PATTERN.is_match(text) => text
            .parse::<i64>()
            .map_err(|_| ValidationError::new("Value is out of range for a 64-bit integer")),
        _ => Err(ValidationError::new(INVALID_MESSAGE)),
    }
}
