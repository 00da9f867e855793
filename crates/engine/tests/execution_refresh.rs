mod common;

use std::{sync::Arc, time::Duration};

use common::{FakeAdminApi, execution_id, execution_in_phase, settled};
use flytedeck_api::AdminApi;
use flytedeck_engine::{
    EXECUTION_REFRESH_INTERVAL, FetchStatus, Fetchable, FetchableOptions, RefreshState, execution_fetchable, execution_refresh_config,
    node_executions_fetchable, node_executions_refresh_config, spawn_refresher,
};
use flytedeck_types::{
    Execution, NodeExecution, NodeExecutionClosure, NodeExecutionIdentifier, NodeExecutionPhase, SortDirection, WorkflowExecutionIdentifier,
    WorkflowExecutionPhase,
};

fn node(node_id: &str, phase: NodeExecutionPhase) -> NodeExecution {
    NodeExecution {
        id: NodeExecutionIdentifier {
            node_id: node_id.into(),
            execution_id: execution_id("run-1"),
        },
        closure: NodeExecutionClosure {
            phase,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn running_execution_is_fetched_twice_then_stops() {
    let api = Arc::new(FakeAdminApi::new(|state| {
        state.execution_script = [
            execution_in_phase("run-1", WorkflowExecutionPhase::Running),
            execution_in_phase("run-1", WorkflowExecutionPhase::Succeeded),
        ]
        .into();
    }));

    let execution = execution_fetchable(api.clone(), execution_id("run-1"));
    let refresher = spawn_refresher(&execution, execution_refresh_config(EXECUTION_REFRESH_INTERVAL));

    assert!(refresher.wait_for_state(RefreshState::Stopped).await);
    assert_eq!(api.calls("get_execution"), 2);
    assert_eq!(refresher.ticks(), 1);
    assert_eq!(execution.value().closure.phase, WorkflowExecutionPhase::Succeeded);
    assert!(!refresher.is_timer_armed());

    tokio::time::sleep(EXECUTION_REFRESH_INTERVAL * 6).await;
    assert_eq!(api.calls("get_execution"), 2);
}

#[tokio::test(start_paused = true)]
async fn two_scheduler_ticks_fetch_exactly_twice() {
    let api = Arc::new(FakeAdminApi::new(|state| {
        state.execution_script = [
            execution_in_phase("run-1", WorkflowExecutionPhase::Running),
            execution_in_phase("run-1", WorkflowExecutionPhase::Succeeded),
        ]
        .into();
    }));

    // No auto-fetch: every request below comes from the scheduler's timer.
    let fetch_api = Arc::clone(&api);
    let execution = Fetchable::new(
        FetchableOptions::new("Execution", Execution::default()),
        execution_id("run-1"),
        move |id: WorkflowExecutionIdentifier| {
            let api = Arc::clone(&fetch_api);
            async move { api.get_execution(&id).await }
        },
    );
    let started = tokio::time::Instant::now();
    let refresher = spawn_refresher(&execution, execution_refresh_config(EXECUTION_REFRESH_INTERVAL));

    assert!(refresher.wait_for_state(RefreshState::Stopped).await);
    assert_eq!(refresher.ticks(), 2);
    assert_eq!(api.calls("get_execution"), 2);
    assert!(!refresher.is_timer_armed());
    assert!(started.elapsed() >= EXECUTION_REFRESH_INTERVAL * 2);
    assert_eq!(execution.value().closure.phase, WorkflowExecutionPhase::Succeeded);

    tokio::time::sleep(EXECUTION_REFRESH_INTERVAL * 6).await;
    assert_eq!(refresher.ticks(), 2);
    assert_eq!(api.calls("get_execution"), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_last_value_and_retries() {
    let api = Arc::new(FakeAdminApi::new(|state| {
        state.execution_script = [
            execution_in_phase("run-1", WorkflowExecutionPhase::Running),
            execution_in_phase("run-1", WorkflowExecutionPhase::Failed),
        ]
        .into();
    }));

    let execution = execution_fetchable(api.clone(), execution_id("run-1"));
    let first = settled(&execution).await;
    assert_eq!(first.value.closure.phase, WorkflowExecutionPhase::Running);

    let refresher = spawn_refresher(&execution, execution_refresh_config(Duration::from_secs(10)));
    api_fail_next(&api, 1);

    let mut updates = execution.subscribe();
    let failed = updates
        .wait_for(|state| state.status == FetchStatus::Failed)
        .await
        .expect("execution alive")
        .clone();
    assert_eq!(failed.value.closure.phase, WorkflowExecutionPhase::Running);
    assert!(failed.last_error.is_some());

    assert!(refresher.wait_for_state(RefreshState::Stopped).await);
    assert_eq!(execution.value().closure.phase, WorkflowExecutionPhase::Failed);
    assert!(execution.last_error().is_none());
    assert_eq!(api.calls("get_execution"), 3);
}

fn api_fail_next(api: &FakeAdminApi, count: usize) {
    api.configure(|state| state.execution_failures = count);
}

#[tokio::test]
async fn node_executions_are_drained_in_creation_order() {
    let api = Arc::new(FakeAdminApi::new(|state| {
        state.page_size = Some(2);
        state.node_executions = ["start", "a", "b", "c", "end"]
            .into_iter()
            .map(|node_id| node(node_id, NodeExecutionPhase::Succeeded))
            .collect();
    }));

    let nodes = node_executions_fetchable(api.clone(), execution_id("run-1"));
    let state = settled(&nodes).await;
    let ids: Vec<&str> = state.value.iter().map(|node| node.id.node_id.as_str()).collect();
    assert_eq!(ids, vec!["start", "a", "b", "c", "end"]);

    let requests = api.requests("list_node_executions");
    assert_eq!(requests.len(), 3);
    assert!(
        requests
            .iter()
            .all(|config| config.sort.as_ref().is_some_and(|sort| sort.direction == SortDirection::Ascending))
    );
    assert_eq!(requests[1].token.as_deref(), Some("2"));
}

#[tokio::test(start_paused = true)]
async fn node_refresh_waits_for_parent_execution() {
    let api = Arc::new(FakeAdminApi::new(|state| {
        state.execution_script = [
            execution_in_phase("run-1", WorkflowExecutionPhase::Running),
            execution_in_phase("run-1", WorkflowExecutionPhase::Succeeded),
        ]
        .into();
        state.node_executions = vec![node("start", NodeExecutionPhase::Succeeded)];
    }));

    let execution = execution_fetchable(api.clone(), execution_id("run-1"));
    let nodes = node_executions_fetchable(api.clone(), execution_id("run-1"));
    settled(&execution).await;
    settled(&nodes).await;

    let execution_refresher = spawn_refresher(&execution, execution_refresh_config(EXECUTION_REFRESH_INTERVAL));
    let node_refresher = spawn_refresher(&nodes, node_executions_refresh_config(EXECUTION_REFRESH_INTERVAL, execution.clone()));

    assert!(node_refresher.wait_for_state(RefreshState::Scheduled).await);
    assert!(execution_refresher.wait_for_state(RefreshState::Stopped).await);
    assert!(node_refresher.wait_for_state(RefreshState::Stopped).await);
    assert!(node_refresher.ticks() >= 1);
}
