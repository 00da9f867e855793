//! Turn declared launch plan parameters into form inputs.

use flytedeck_types::{LiteralType, Parameter, ParameterMap, SimpleType};
use tracing::{debug, warn};

use super::types::{InputType, InputTypeDefinition, ParsedInput};

/// Nesting depth past which element types resolve to [`InputType::Unknown`].
pub const MAX_TYPE_DEPTH: usize = 16;

/// Resolve every parameter into a [`ParsedInput`], preserving declaration order.
pub fn parse_inputs(parameters: &ParameterMap) -> Vec<ParsedInput> {
    let inputs: Vec<ParsedInput> = parameters
        .parameters
        .iter()
        .map(|(name, parameter)| parse_input(name, parameter))
        .collect();
    debug!(
        input_count = inputs.len(),
        required_count = inputs.iter().filter(|input| input.required).count(),
        "launch inputs parsed"
    );
    inputs
}

fn parse_input(name: &str, parameter: &Parameter) -> ParsedInput {
    let type_definition = input_type_definition(parameter.var.r#type.as_ref());
    if type_definition.input_type == InputType::Unknown {
        warn!(input = name, "input has no resolvable type");
    }

    ParsedInput {
        name: name.to_string(),
        label: format!("{} ({})", name, type_definition.label()),
        description: parameter.var.description.clone().filter(|text| !text.is_empty()),
        required: parameter.default.is_none(),
        type_definition,
        initial_value: parameter.default.clone(),
    }
}

/// Map a declared literal type onto an input type definition.
///
/// A missing declaration resolves to [`InputType::Unknown`].
pub fn input_type_definition(literal_type: Option<&LiteralType>) -> InputTypeDefinition {
    match literal_type {
        Some(literal_type) => definition_at_depth(literal_type, 0),
        None => InputTypeDefinition::simple(InputType::Unknown),
    }
}

fn definition_at_depth(literal_type: &LiteralType, depth: usize) -> InputTypeDefinition {
    match literal_type {
        LiteralType::Simple(simple) => InputTypeDefinition::simple(simple_input_type(*simple)),
        LiteralType::Schema(_) => InputTypeDefinition::simple(InputType::Schema),
        LiteralType::Blob(_) => InputTypeDefinition::simple(InputType::Blob),
        LiteralType::CollectionType(_) | LiteralType::MapValueType(_) if depth >= MAX_TYPE_DEPTH => {
            warn!(depth, "literal type nested too deeply");
            InputTypeDefinition::simple(InputType::Unknown)
        }
        LiteralType::CollectionType(element) => InputTypeDefinition::collection(definition_at_depth(element, depth + 1)),
        LiteralType::MapValueType(value) => InputTypeDefinition::map(definition_at_depth(value, depth + 1)),
    }
}

fn simple_input_type(simple: SimpleType) -> InputType {
    match simple {
        SimpleType::None => InputType::None,
        SimpleType::Integer => InputType::Integer,
        SimpleType::Float => InputType::Float,
        SimpleType::String => InputType::String,
        SimpleType::Boolean => InputType::Boolean,
        SimpleType::Datetime => InputType::Datetime,
        SimpleType::Duration => InputType::Duration,
        SimpleType::Binary => InputType::Binary,
        SimpleType::Error => InputType::Error,
        SimpleType::Struct => InputType::Struct,
    }
}
