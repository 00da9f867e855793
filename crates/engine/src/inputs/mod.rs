//! Launch form inputs derived from launch plan parameters.
//!
//! [`parse_inputs`] resolves declared parameters into [`ParsedInput`]s;
//! [`validate_inputs`] converts entered values into the literal map submitted
//! with a launch request, reporting per-input errors.

mod helpers;
mod parse;
mod types;
mod validation;

pub use helpers::{InputHelper, MAX_SAFE_INTEGER, input_helper, is_valid_integer};
pub use parse::{MAX_TYPE_DEPTH, input_type_definition, parse_inputs};
pub use types::{InputType, InputTypeDefinition, InputValue, InputValueMap, ParsedInput};
pub use validation::{REQUIRED_MESSAGE, ValidationError, ValidationErrors, validate_inputs};
