//! Validation of entered values against parsed inputs.

use std::fmt;

use flytedeck_types::LiteralMap;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use super::{
    helpers::input_helper,
    types::{InputValueMap, ParsedInput},
};

pub const REQUIRED_MESSAGE: &str = "Value is required";

/// A single input's rejection message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Prefix the message with where in a nested value it occurred.
    pub fn within(self, location: impl fmt::Display) -> Self {
        Self::new(format!("{location}: {}", self.message))
    }
}

/// Rejection messages keyed by input name, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: IndexMap<String, String>,
}

impl ValidationErrors {
    pub fn insert(&mut self, input: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(input.into(), message.into());
    }

    pub fn get(&self, input: &str) -> Option<&str> {
        self.errors.get(input).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(input, message)| (input.as_str(), message.as_str()))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} input(s) failed validation", self.errors.len())?;
        for (input, message) in &self.errors {
            write!(f, "; {input}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate `values` against `inputs` and convert them to literals.
///
/// Inputs without an entered value fall back to their initial value. A
/// required input with neither is rejected; an optional one is omitted.
/// Values keyed by names that match no input are ignored.
pub fn validate_inputs(inputs: &[ParsedInput], values: &InputValueMap) -> Result<LiteralMap, ValidationErrors> {
    let mut literals = LiteralMap::default();
    let mut errors = ValidationErrors::default();

    for input in inputs {
        let entered = values.get(&input.name).filter(|value| !value.is_blank());
        match (entered, &input.initial_value) {
            (Some(value), _) => match input_helper(input.type_definition.input_type).to_literal(value, &input.type_definition) {
                Ok(literal) => {
                    literals.literals.insert(input.name.clone(), literal);
                }
                Err(error) => errors.insert(input.name.clone(), error.message),
            },
            (None, Some(initial)) => {
                literals.literals.insert(input.name.clone(), initial.clone());
            }
            (None, None) if input.required => errors.insert(input.name.clone(), REQUIRED_MESSAGE),
            (None, None) => {}
        }
    }

    debug!(
        input_count = inputs.len(),
        literal_count = literals.literals.len(),
        error_count = errors.len(),
        "launch inputs validated"
    );
    if errors.is_empty() { Ok(literals) } else { Err(errors) }
}
