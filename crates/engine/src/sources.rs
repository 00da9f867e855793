//! Fetchables bound to admin API endpoints.
//!
//! Each constructor wires an [`AdminApi`] call into a [`Fetchable`] with the
//! paging, sorting, and caching the console views expect. Refresh configs for
//! execution records stop polling once the records reach a terminal phase.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use flytedeck_api::{AdminApi, drain_pages};
use flytedeck_types::{
    Execution, ExecutionData, Identifier, IdentifierScope, LaunchPlan, NamedEntityIdentifier, NodeExecution, NodeExecutionIdentifier,
    RequestConfig, Sort, TaskExecution, TaskExecutionIdentifier, TaskTemplate, Workflow, WorkflowExecutionIdentifier, limits,
    sort_fields,
};
use tracing::{debug, info};

use crate::{
    cache::EntityCache,
    fetch::{Fetchable, FetchableOptions, FetchableState, PagedList, PaginatedFetchable, require_key},
    refresh::RefreshConfig,
};

/// Polling interval for executions that have not finished.
pub const EXECUTION_REFRESH_INTERVAL: Duration = Duration::from_millis(10_000);

/// A single workflow version.
///
/// Compiled task templates are merged into `task_cache` on every successful
/// fetch. Auto-fetches only while an identifier is present.
pub fn workflow_fetchable(
    api: Arc<dyn AdminApi>,
    task_cache: EntityCache<TaskTemplate>,
    id: Option<Identifier>,
) -> Fetchable<Option<Identifier>, Workflow> {
    Fetchable::new(
        FetchableOptions::new("Workflow", Workflow::default()).auto_fetch_when(Option::is_some),
        id,
        move |id: Option<Identifier>| {
            let api = Arc::clone(&api);
            let task_cache = task_cache.clone();
            async move {
                let id = require_key("Workflow", id)?;
                let workflow = api.get_workflow(&id).await.with_context(|| format!("load workflow {id}"))?;
                let merged = task_cache.merge_array(workflow.task_templates());
                debug!(workflow = %id, task_count = merged, "workflow tasks cached");
                Ok::<_, anyhow::Error>(workflow)
            }
        },
    )
}

/// Most recent versions of a named workflow, newest first.
pub fn workflow_versions_fetchable(api: Arc<dyn AdminApi>, id: NamedEntityIdentifier) -> Fetchable<NamedEntityIdentifier, Vec<Workflow>> {
    Fetchable::new(
        FetchableOptions::new("WorkflowVersions", Vec::new()).auto_fetch(),
        id,
        move |id: NamedEntityIdentifier| {
            let api = Arc::clone(&api);
            async move {
                let config = RequestConfig::with_limit(limits::DEFAULT).sorted(Sort::descending(sort_fields::CREATED_AT));
                let page = api
                    .list_workflows(&IdentifierScope::from(&id), &config)
                    .await
                    .with_context(|| format!("list versions of workflow {id}"))?;
                Ok::<_, anyhow::Error>(page.entities)
            }
        },
    )
}

/// Launch plans that launch the given workflow version.
pub fn launch_plans_fetchable(api: Arc<dyn AdminApi>, workflow_id: Option<Identifier>) -> Fetchable<Option<Identifier>, Vec<LaunchPlan>> {
    Fetchable::new(
        FetchableOptions::new("LaunchPlans", Vec::new()).auto_fetch_when(Option::is_some),
        workflow_id,
        move |workflow_id: Option<Identifier>| {
            let api = Arc::clone(&api);
            async move {
                let workflow_id = require_key("LaunchPlans", workflow_id)?;
                let scope = IdentifierScope {
                    project: workflow_id.project.clone(),
                    domain: Some(workflow_id.domain.clone()),
                    name: None,
                    version: None,
                };
                let config = RequestConfig {
                    filter: Some(workflow_version_filter(&workflow_id)),
                    ..RequestConfig::with_limit(limits::NONE)
                };
                let mut launch_plans = drain_pages(config, |config| {
                    let api = Arc::clone(&api);
                    let scope = scope.clone();
                    async move { api.list_launch_plans(&scope, &config).await }
                })
                .await
                .with_context(|| format!("list launch plans for {workflow_id}"))?;
                launch_plans.retain(|launch_plan| launches_workflow(launch_plan, &workflow_id));
                Ok::<_, anyhow::Error>(launch_plans)
            }
        },
    )
}

/// A single workflow execution.
pub fn execution_fetchable(api: Arc<dyn AdminApi>, id: WorkflowExecutionIdentifier) -> Fetchable<WorkflowExecutionIdentifier, Execution> {
    Fetchable::new(
        FetchableOptions::new("Execution", Execution::default()).auto_fetch(),
        id,
        move |id: WorkflowExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move { api.get_execution(&id).await.with_context(|| format!("load execution {id}")) }
        },
    )
}

/// Abort the execution tracked by `execution`, then refetch it so observers
/// see the server's updated record.
pub async fn terminate_execution(
    api: &dyn AdminApi,
    execution: &Fetchable<WorkflowExecutionIdentifier, Execution>,
    cause: &str,
) -> Result<FetchableState<WorkflowExecutionIdentifier, Execution>> {
    let id = execution.key();
    api.terminate_execution(&id, cause)
        .await
        .with_context(|| format!("terminate execution {id}"))?;
    info!(execution = %id, cause, "execution terminated");
    Ok(execution.fetch().await)
}

/// Inputs and outputs of a workflow execution.
pub fn execution_data_fetchable(
    api: Arc<dyn AdminApi>,
    id: WorkflowExecutionIdentifier,
) -> Fetchable<WorkflowExecutionIdentifier, ExecutionData> {
    Fetchable::new(
        FetchableOptions::new("ExecutionData", ExecutionData::default()).auto_fetch(),
        id,
        move |id: WorkflowExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move { api.get_execution_data(&id).await.with_context(|| format!("load data of execution {id}")) }
        },
    )
}

/// Inputs and outputs of a node execution.
pub fn node_execution_data_fetchable(
    api: Arc<dyn AdminApi>,
    id: NodeExecutionIdentifier,
) -> Fetchable<NodeExecutionIdentifier, ExecutionData> {
    Fetchable::new(
        FetchableOptions::new("NodeExecutionData", ExecutionData::default()).auto_fetch(),
        id,
        move |id: NodeExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move {
                api.get_node_execution_data(&id)
                    .await
                    .with_context(|| format!("load data of node execution {id}"))
            }
        },
    )
}

/// Inputs and outputs of one task execution attempt.
pub fn task_execution_data_fetchable(
    api: Arc<dyn AdminApi>,
    id: TaskExecutionIdentifier,
) -> Fetchable<TaskExecutionIdentifier, ExecutionData> {
    Fetchable::new(
        FetchableOptions::new("TaskExecutionData", ExecutionData::default()).auto_fetch(),
        id,
        move |id: TaskExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move {
                api.get_task_execution_data(&id)
                    .await
                    .with_context(|| format!("load data of task execution {id}"))
            }
        },
    )
}

/// Executions of a named workflow, newest first, one page at a time.
pub fn workflow_executions_fetchable(
    api: Arc<dyn AdminApi>,
    workflow: NamedEntityIdentifier,
) -> PaginatedFetchable<NamedEntityIdentifier, Execution> {
    let config = RequestConfig::with_limit(limits::DEFAULT).sorted(Sort::descending(sort_fields::CREATED_AT));
    PaginatedFetchable::new(
        FetchableOptions::new("WorkflowExecutions", PagedList::default()).auto_fetch(),
        workflow,
        config,
        move |workflow: NamedEntityIdentifier, config: RequestConfig| {
            let api = Arc::clone(&api);
            async move {
                let scope = IdentifierScope {
                    project: workflow.project.clone(),
                    domain: Some(workflow.domain.clone()),
                    name: None,
                    version: None,
                };
                let config = RequestConfig {
                    filter: Some(format!("eq(workflow.name,{})", workflow.name)),
                    ..config
                };
                api.list_executions(&scope, &config)
                    .await
                    .with_context(|| format!("list executions of workflow {workflow}"))
            }
        },
    )
}

/// Every node execution of a workflow execution, oldest first.
pub fn node_executions_fetchable(
    api: Arc<dyn AdminApi>,
    id: WorkflowExecutionIdentifier,
) -> Fetchable<WorkflowExecutionIdentifier, Vec<NodeExecution>> {
    Fetchable::new(
        FetchableOptions::new("NodeExecutions", Vec::new()).auto_fetch(),
        id,
        move |id: WorkflowExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move {
                let config = RequestConfig::with_limit(limits::NONE).sorted(Sort::ascending(sort_fields::CREATED_AT));
                drain_pages(config, |config| {
                    let api = Arc::clone(&api);
                    let id = id.clone();
                    async move { api.list_node_executions(&id, &config).await }
                })
                .await
                .with_context(|| format!("list node executions of {id}"))
            }
        },
    )
}

/// Every attempt of a node execution, oldest first.
pub fn task_executions_fetchable(
    api: Arc<dyn AdminApi>,
    id: NodeExecutionIdentifier,
) -> Fetchable<NodeExecutionIdentifier, Vec<TaskExecution>> {
    Fetchable::new(
        FetchableOptions::new("TaskExecutions", Vec::new()).auto_fetch(),
        id,
        move |id: NodeExecutionIdentifier| {
            let api = Arc::clone(&api);
            async move {
                let config = RequestConfig::with_limit(limits::NONE).sorted(Sort::ascending(sort_fields::CREATED_AT));
                drain_pages(config, |config| {
                    let api = Arc::clone(&api);
                    let id = id.clone();
                    async move { api.list_task_executions(&id, &config).await }
                })
                .await
                .with_context(|| format!("list task executions of {id}"))
            }
        },
    )
}

/// Refresh an execution until it reaches a terminal phase.
pub fn execution_refresh_config(interval: Duration) -> RefreshConfig<Execution> {
    RefreshConfig::new(interval, Execution::is_terminal)
}

/// Refresh node executions until the parent execution and every node are terminal.
pub fn node_executions_refresh_config(
    interval: Duration,
    execution: Fetchable<WorkflowExecutionIdentifier, Execution>,
) -> RefreshConfig<Vec<NodeExecution>> {
    RefreshConfig::new(interval, move |nodes: &Vec<NodeExecution>| {
        execution.inspect(|state| state.value.is_terminal()) && nodes.iter().all(NodeExecution::is_terminal)
    })
}

/// Refresh task executions until the node and every attempt are terminal.
pub fn task_executions_refresh_config(interval: Duration, node_execution: NodeExecution) -> RefreshConfig<Vec<TaskExecution>> {
    RefreshConfig::new(interval, move |attempts: &Vec<TaskExecution>| {
        node_execution.is_terminal() && attempts.iter().all(TaskExecution::is_terminal)
    })
}

fn workflow_version_filter(workflow_id: &Identifier) -> String {
    format!(
        "eq(workflow.name,{})+eq(workflow.version,{})",
        workflow_id.name, workflow_id.version
    )
}

fn launches_workflow(launch_plan: &LaunchPlan, workflow_id: &Identifier) -> bool {
    let target = &launch_plan.spec.workflow_id;
    target.project == workflow_id.project
        && target.domain == workflow_id.domain
        && target.name == workflow_id.name
        && target.version == workflow_id.version
}
