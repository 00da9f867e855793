//! Identifiers addressing records on the control plane.
//!
//! Every versioned entity is addressed by `project/domain/name/version`.
//! Executions, node executions, and task executions nest inside one another,
//! which is reflected by their identifier structs embedding the parent id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of versioned entity an [`Identifier`] refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    #[default]
    Unspecified,
    Task,
    Workflow,
    LaunchPlan,
}

impl ResourceType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Task => "task",
            Self::Workflow => "workflow",
            Self::LaunchPlan => "launch_plan",
        }
    }
}

/// Fully qualified, versioned identifier of a task, workflow, or launch plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default)]
    pub resource_type: ResourceType,
    pub project: String,
    pub domain: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Identifier {
    pub fn new(resource_type: ResourceType, project: &str, domain: &str, name: &str, version: &str) -> Self {
        Self {
            resource_type,
            project: project.to_string(),
            domain: domain.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// The unversioned entity this identifier belongs to.
    pub fn named_entity(&self) -> NamedEntityIdentifier {
        NamedEntityIdentifier {
            project: self.project.clone(),
            domain: self.domain.clone(),
            name: self.name.clone(),
        }
    }

    /// Copy of this identifier re-tagged with another resource type.
    ///
    /// Launch plans created by default share the id of their workflow, which
    /// makes this the usual way to derive one from the other.
    pub fn with_resource_type(&self, resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            ..self.clone()
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.resource_type.as_str(),
            self.project,
            self.domain,
            self.name,
            self.version
        )
    }
}

/// Unversioned entity name, used for listing all versions of something.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct NamedEntityIdentifier {
    pub project: String,
    pub domain: String,
    pub name: String,
}

impl fmt::Display for NamedEntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.domain, self.name)
    }
}

/// Scope used by list endpoints. Any trailing component may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IdentifierScope {
    pub project: String,
    pub domain: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl IdentifierScope {
    /// Path segments in URL order, stopping at the first missing component.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec![self.project.as_str()];
        for component in [&self.domain, &self.name, &self.version] {
            match component {
                Some(value) => segments.push(value.as_str()),
                None => break,
            }
        }
        segments
    }
}

impl From<&NamedEntityIdentifier> for IdentifierScope {
    fn from(id: &NamedEntityIdentifier) -> Self {
        Self {
            project: id.project.clone(),
            domain: Some(id.domain.clone()),
            name: Some(id.name.clone()),
            version: None,
        }
    }
}

impl From<&Identifier> for IdentifierScope {
    fn from(id: &Identifier) -> Self {
        Self {
            project: id.project.clone(),
            domain: Some(id.domain.clone()),
            name: Some(id.name.clone()),
            version: (!id.version.is_empty()).then(|| id.version.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct WorkflowExecutionIdentifier {
    pub project: String,
    pub domain: String,
    pub name: String,
}

impl fmt::Display for WorkflowExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.domain, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionIdentifier {
    pub node_id: String,
    pub execution_id: WorkflowExecutionIdentifier,
}

impl fmt::Display for NodeExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.execution_id, self.node_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionIdentifier {
    pub task_id: Identifier,
    pub node_execution_id: NodeExecutionIdentifier,
    #[serde(default)]
    pub retry_attempt: u32,
}

impl fmt::Display for TaskExecutionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.node_execution_id, self.task_id, self.retry_attempt)
    }
}
