//! Admin API client.
//!
//! This crate defines the [`AdminApi`] seam consumed by the engine and a
//! reqwest-backed [`AdminClient`] that talks to the control plane's JSON
//! gateway. It focuses on:
//!
//! - Validating the configured base URL
//! - Building list requests with pagination, sorting, and filters
//! - Mapping HTTP failures into [`ApiError`]
//! - Draining every page of a list endpoint via [`drain_pages`]
//!
//! # Example
//!
//! ```ignore
//! use flytedeck_api::{AdminApi, AdminClient};
//! use flytedeck_util::ConsoleConfig;
//!
//! let client = AdminClient::from_config(&ConsoleConfig::load()?)?;
//! let execution = client.get_execution(&execution_id).await?;
//! println!("phase: {:?}", execution.closure.phase);
//! ```

mod client;
mod error;
mod pagination;

use anyhow::Result;
use async_trait::async_trait;
use flytedeck_types::{
    Execution, ExecutionCreateRequest, ExecutionData, Identifier, IdentifierScope, LaunchPlan, NodeExecution, NodeExecutionIdentifier,
    PaginatedEntities, RequestConfig, TaskExecution, TaskExecutionIdentifier, Workflow, WorkflowExecutionIdentifier,
};

pub use client::AdminClient;
pub use error::ApiError;
pub use pagination::{MAX_PAGES, drain_pages};

/// Read and launch endpoints of the control plane used by the console.
///
/// List calls return one page; an absent or empty `token` marks the last
/// page. Lookups of unknown identifiers fail with [`ApiError::NotFound`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_workflows(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Workflow>>;

    async fn get_workflow(&self, id: &Identifier) -> Result<Workflow>;

    async fn list_launch_plans(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<LaunchPlan>>;

    async fn get_launch_plan(&self, id: &Identifier) -> Result<LaunchPlan>;

    async fn get_execution(&self, id: &WorkflowExecutionIdentifier) -> Result<Execution>;

    async fn list_executions(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Execution>>;

    async fn list_node_executions(
        &self,
        id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<NodeExecution>>;

    async fn list_task_executions(
        &self,
        id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<TaskExecution>>;

    async fn create_execution(&self, request: &ExecutionCreateRequest) -> Result<WorkflowExecutionIdentifier>;

    /// Abort a running execution, recording `cause` on it.
    async fn terminate_execution(&self, id: &WorkflowExecutionIdentifier, cause: &str) -> Result<()>;

    async fn get_execution_data(&self, id: &WorkflowExecutionIdentifier) -> Result<ExecutionData>;

    async fn get_node_execution_data(&self, id: &NodeExecutionIdentifier) -> Result<ExecutionData>;

    async fn get_task_execution_data(&self, id: &TaskExecutionIdentifier) -> Result<ExecutionData>;
}
