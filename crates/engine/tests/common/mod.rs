#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use flytedeck_api::{AdminApi, ApiError};
use flytedeck_engine::{FetchStatus, Fetchable, FetchableState};
use flytedeck_types::{
    Execution, ExecutionClosure, ExecutionCreateRequest, ExecutionData, Identifier, IdentifierScope, LaunchPlan, NodeExecution,
    NodeExecutionIdentifier, PaginatedEntities, RequestConfig, TaskExecution, TaskExecutionIdentifier, Workflow,
    WorkflowExecutionIdentifier, WorkflowExecutionPhase,
};

pub fn launch_plan_fixture() -> LaunchPlan {
    serde_json::from_str(include_str!("../data/launch_plan.json")).expect("parse launch plan fixture")
}

pub fn workflow_fixture() -> Workflow {
    serde_json::from_str(include_str!("../data/workflow.json")).expect("parse workflow fixture")
}

pub fn execution_id(name: &str) -> WorkflowExecutionIdentifier {
    WorkflowExecutionIdentifier {
        project: "flyte".into(),
        domain: "development".into(),
        name: name.into(),
    }
}

pub fn execution_in_phase(name: &str, phase: WorkflowExecutionPhase) -> Execution {
    Execution {
        id: execution_id(name),
        closure: ExecutionClosure {
            phase,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Wait until the fetchable's current request has settled.
pub async fn settled<K, T>(fetchable: &Fetchable<K, T>) -> FetchableState<K, T>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let mut updates = fetchable.subscribe();
    updates
        .wait_for(|state| matches!(state.status, FetchStatus::Fetched | FetchStatus::Failed))
        .await
        .expect("fetchable alive")
        .clone()
}

#[derive(Default)]
pub struct FakeState {
    /// Successive `get_execution` responses; the last one repeats.
    pub execution_script: VecDeque<Execution>,
    /// Number of upcoming `get_execution` calls that fail.
    pub execution_failures: usize,
    pub workflows: Vec<Workflow>,
    pub launch_plans: Vec<LaunchPlan>,
    pub node_executions: Vec<NodeExecution>,
    pub task_executions: Vec<TaskExecution>,
    pub page_size: Option<usize>,
    pub created: Vec<ExecutionCreateRequest>,
    /// Served by every `get_*_execution_data` call.
    pub execution_data: Option<ExecutionData>,
    pub terminated: Vec<(WorkflowExecutionIdentifier, String)>,
    pub requests: Vec<(&'static str, RequestConfig)>,
    calls: HashMap<&'static str, usize>,
}

/// In-memory admin API. List calls ignore filters and page by offset tokens.
#[derive(Default)]
pub struct FakeAdminApi {
    state: Mutex<FakeState>,
}

impl FakeAdminApi {
    pub fn new(configure: impl FnOnce(&mut FakeState)) -> Self {
        let api = Self::default();
        configure(&mut api.state.lock().expect("fake state lock"));
        api
    }

    pub fn configure(&self, update: impl FnOnce(&mut FakeState)) {
        update(&mut self.state.lock().expect("fake state lock"));
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().expect("fake state lock").calls.get(method).copied().unwrap_or(0)
    }

    pub fn created(&self) -> Vec<ExecutionCreateRequest> {
        self.state.lock().expect("fake state lock").created.clone()
    }

    pub fn terminated(&self) -> Vec<(WorkflowExecutionIdentifier, String)> {
        self.state.lock().expect("fake state lock").terminated.clone()
    }

    pub fn requests(&self, method: &str) -> Vec<RequestConfig> {
        self.state
            .lock()
            .expect("fake state lock")
            .requests
            .iter()
            .filter(|(name, _)| *name == method)
            .map(|(_, config)| config.clone())
            .collect()
    }

    fn record(&self, method: &'static str, config: Option<&RequestConfig>) -> MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().expect("fake state lock");
        *state.calls.entry(method).or_default() += 1;
        if let Some(config) = config {
            state.requests.push((method, config.clone()));
        }
        state
    }
}

fn execution_data(state: &FakeState, path: String) -> Result<ExecutionData> {
    match &state.execution_data {
        Some(data) => Ok(data.clone()),
        None => Err(ApiError::NotFound { path }.into()),
    }
}

fn page<T: Clone>(items: &[T], config: &RequestConfig, page_size: Option<usize>) -> PaginatedEntities<T> {
    let offset: usize = config.token.as_deref().and_then(|token| token.parse().ok()).unwrap_or(0);
    let size = page_size.unwrap_or(config.limit as usize).max(1);
    let end = (offset + size).min(items.len());
    let entities = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    let token = (end < items.len()).then(|| end.to_string());
    PaginatedEntities { entities, token }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn list_workflows(&self, scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Workflow>> {
        let state = self.record("list_workflows", Some(config));
        let matching: Vec<Workflow> = state
            .workflows
            .iter()
            .filter(|workflow| Some(&workflow.id.name) == scope.name.as_ref())
            .cloned()
            .collect();
        Ok(page(&matching, config, state.page_size))
    }

    async fn get_workflow(&self, id: &Identifier) -> Result<Workflow> {
        let state = self.record("get_workflow", None);
        match state.workflows.iter().find(|workflow| &workflow.id == id) {
            Some(workflow) => Ok(workflow.clone()),
            None => Err(ApiError::NotFound {
                path: format!("/workflows/{id}"),
            }
            .into()),
        }
    }

    async fn list_launch_plans(&self, _scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<LaunchPlan>> {
        let state = self.record("list_launch_plans", Some(config));
        Ok(page(&state.launch_plans, config, state.page_size))
    }

    async fn get_launch_plan(&self, id: &Identifier) -> Result<LaunchPlan> {
        let state = self.record("get_launch_plan", None);
        match state.launch_plans.iter().find(|launch_plan| &launch_plan.id == id) {
            Some(launch_plan) => Ok(launch_plan.clone()),
            None => bail!("launch plan {id} not found"),
        }
    }

    async fn get_execution(&self, id: &WorkflowExecutionIdentifier) -> Result<Execution> {
        let mut state = self.record("get_execution", None);
        if state.execution_failures > 0 {
            state.execution_failures -= 1;
            bail!("admin unavailable");
        }
        let execution = if state.execution_script.len() > 1 {
            state.execution_script.pop_front()
        } else {
            state.execution_script.front().cloned()
        };
        match execution {
            Some(execution) => Ok(execution),
            None => Err(ApiError::NotFound {
                path: format!("/executions/{id}"),
            }
            .into()),
        }
    }

    async fn list_executions(&self, _scope: &IdentifierScope, config: &RequestConfig) -> Result<PaginatedEntities<Execution>> {
        let state = self.record("list_executions", Some(config));
        let executions: Vec<Execution> = state.execution_script.iter().cloned().collect();
        Ok(page(&executions, config, state.page_size))
    }

    async fn list_node_executions(
        &self,
        _id: &WorkflowExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<NodeExecution>> {
        let state = self.record("list_node_executions", Some(config));
        Ok(page(&state.node_executions, config, state.page_size))
    }

    async fn list_task_executions(
        &self,
        _id: &NodeExecutionIdentifier,
        config: &RequestConfig,
    ) -> Result<PaginatedEntities<TaskExecution>> {
        let state = self.record("list_task_executions", Some(config));
        Ok(page(&state.task_executions, config, state.page_size))
    }

    async fn create_execution(&self, request: &ExecutionCreateRequest) -> Result<WorkflowExecutionIdentifier> {
        let mut state = self.record("create_execution", None);
        state.created.push(request.clone());
        Ok(WorkflowExecutionIdentifier {
            project: request.project.clone(),
            domain: request.domain.clone(),
            name: request.name.clone().unwrap_or_else(|| format!("generated-{}", state.created.len())),
        })
    }

    /// Records the call; later `get_execution` calls report the execution as aborted.
    async fn terminate_execution(&self, id: &WorkflowExecutionIdentifier, cause: &str) -> Result<()> {
        let mut state = self.record("terminate_execution", None);
        state.terminated.push((id.clone(), cause.to_string()));
        state.execution_script = [execution_in_phase(&id.name, WorkflowExecutionPhase::Aborted)].into();
        Ok(())
    }

    async fn get_execution_data(&self, id: &WorkflowExecutionIdentifier) -> Result<ExecutionData> {
        let state = self.record("get_execution_data", None);
        execution_data(&state, format!("/data/executions/{id}"))
    }

    async fn get_node_execution_data(&self, id: &NodeExecutionIdentifier) -> Result<ExecutionData> {
        let state = self.record("get_node_execution_data", None);
        execution_data(&state, format!("/data/node_executions/{id}"))
    }

    async fn get_task_execution_data(&self, id: &TaskExecutionIdentifier) -> Result<ExecutionData> {
        let state = self.record("get_task_execution_data", None);
        execution_data(&state, format!("/data/task_executions/{id}"))
    }
}
