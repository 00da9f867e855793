//! Workflow, node, and task execution records.
//!
//! Each record carries a closure with the server-observed `phase`. Phases
//! only move forward; once terminal, the record no longer changes and
//! polling for it can stop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    identifier::{Identifier, NodeExecutionIdentifier, TaskExecutionIdentifier, WorkflowExecutionIdentifier},
    literal::LiteralMap,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowExecutionPhase {
    #[default]
    Undefined,
    Queued,
    Running,
    Succeeding,
    Succeeded,
    Failing,
    Failed,
    Aborted,
    TimedOut,
}

impl WorkflowExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted | Self::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeExecutionPhase {
    #[default]
    Undefined,
    Queued,
    Running,
    Succeeded,
    Failing,
    Failed,
    Aborted,
    Skipped,
    TimedOut,
}

impl NodeExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted | Self::Skipped | Self::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskExecutionPhase {
    #[default]
    Undefined,
    Queued,
    Running,
    Succeeded,
    Aborted,
    Failed,
}

impl TaskExecutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Aborted | Self::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionClosure {
    #[serde(default)]
    pub phase: WorkflowExecutionPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub error: Option<ExecutionError>,
    #[serde(default)]
    pub computed_inputs: Option<LiteralMap>,
    #[serde(default)]
    pub workflow_id: Option<Identifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSpec {
    pub launch_plan: Identifier,
    #[serde(default)]
    pub inputs: LiteralMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Execution {
    pub id: WorkflowExecutionIdentifier,
    #[serde(default)]
    pub spec: ExecutionSpec,
    #[serde(default)]
    pub closure: ExecutionClosure,
}

impl Execution {
    pub fn is_terminal(&self) -> bool {
        self.closure.phase.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionClosure {
    #[serde(default)]
    pub phase: NodeExecutionPhase,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub error: Option<ExecutionError>,
    #[serde(default)]
    pub output_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub id: NodeExecutionIdentifier,
    #[serde(default)]
    pub input_uri: String,
    #[serde(default)]
    pub closure: NodeExecutionClosure,
}

impl NodeExecution {
    pub fn is_terminal(&self) -> bool {
        self.closure.phase.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionClosure {
    #[serde(default)]
    pub phase: TaskExecutionPhase,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub error: Option<ExecutionError>,
    #[serde(default)]
    pub output_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecution {
    pub id: TaskExecutionIdentifier,
    #[serde(default)]
    pub input_uri: String,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub closure: TaskExecutionClosure,
}

impl TaskExecution {
    pub fn is_terminal(&self) -> bool {
        self.closure.phase.is_terminal()
    }
}

/// Pointer to a literal map stored by the data plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UrlBlob {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub bytes: i64,
}

/// Inputs and outputs of a workflow, node, or task execution.
///
/// `full_inputs`/`full_outputs` are inlined only when the server decides the
/// maps are small enough; otherwise only the blob locations are set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionData {
    #[serde(default)]
    pub inputs: UrlBlob,
    #[serde(default)]
    pub outputs: UrlBlob,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_inputs: Option<LiteralMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_outputs: Option<LiteralMap>,
}

/// Body of the terminate-execution call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionTerminateRequest {
    pub id: WorkflowExecutionIdentifier,
    pub cause: String,
}

/// Body of the create-execution call issued when launching a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionCreateRequest {
    pub project: String,
    pub domain: String,
    /// Requested execution name; the server generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub spec: ExecutionSpec,
    #[serde(default)]
    pub inputs: LiteralMap,
}
