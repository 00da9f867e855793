//! Workflow records and the task templates compiled into them.
//!
//! A fetched workflow embeds the templates of every task it references. The
//! engine extracts those templates into a shared cache so task details can be
//! shown without a second round trip.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{identifier::Identifier, literal::Variable};

/// Input and output variables of a task or workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TypedInterface {
    #[serde(default)]
    pub inputs: VariableMap,
    #[serde(default)]
    pub outputs: VariableMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VariableMap {
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskTemplate {
    pub id: Identifier,
    #[serde(default, rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub interface: Option<TypedInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompiledTask {
    pub template: TaskTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompiledWorkflowClosure {
    #[serde(default)]
    pub tasks: Vec<CompiledTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowClosure {
    #[serde(default)]
    pub compiled_workflow: Option<CompiledWorkflowClosure>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Workflow {
    pub id: Identifier,
    #[serde(default)]
    pub closure: Option<WorkflowClosure>,
}

impl Workflow {
    /// Task templates compiled into this workflow, in compilation order.
    pub fn task_templates(&self) -> Vec<TaskTemplate> {
        self.closure
            .as_ref()
            .and_then(|closure| closure.compiled_workflow.as_ref())
            .map(|compiled| compiled.tasks.iter().map(|task| task.template.clone()).collect())
            .unwrap_or_default()
    }
}
