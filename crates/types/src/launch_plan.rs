//! Launch plans bind a workflow version to default and fixed inputs.

use serde::{Deserialize, Serialize};

use crate::{
    identifier::Identifier,
    literal::{LiteralMap, ParameterMap},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchPlanState {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPlanSpec {
    pub workflow_id: Identifier,
    #[serde(default)]
    pub default_inputs: ParameterMap,
    #[serde(default)]
    pub fixed_inputs: LiteralMap,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPlanClosure {
    #[serde(default)]
    pub state: LaunchPlanState,
    /// Parameters a user must (or may) supply, with defaults resolved.
    #[serde(default)]
    pub expected_inputs: ParameterMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LaunchPlan {
    pub id: Identifier,
    #[serde(default)]
    pub spec: LaunchPlanSpec,
    #[serde(default)]
    pub closure: LaunchPlanClosure,
}
