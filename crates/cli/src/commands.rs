//! Subcommand implementations.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use flytedeck_api::AdminApi;
use flytedeck_engine::{
    FetchStatus, Fetchable, FetchableState, InputValue, LaunchForm, execution_data_fetchable, execution_fetchable, execution_refresh_config,
    node_execution_data_fetchable, parse_inputs, spawn_refresher, terminate_execution,
};
use flytedeck_types::{Execution, Identifier, NodeExecutionIdentifier, WorkflowExecutionIdentifier, WorkflowExecutionPhase};
use flytedeck_util::{UNKNOWN_VALUE, date_with_from_now, duration_to_hms};
use tracing::{debug, info};

/// Follow an execution, printing a line whenever its phase changes.
pub async fn watch_execution(api: Arc<dyn AdminApi>, id: WorkflowExecutionIdentifier, interval: Duration) -> Result<()> {
    let execution = execution_fetchable(api, id);
    follow_execution(&execution, interval).await.map(|_| ())
}

/// Returns the last phase printed. The snapshot current at subscription time
/// is reported before waiting, so a fetch that settled earlier is not missed.
async fn follow_execution(
    execution: &Fetchable<WorkflowExecutionIdentifier, Execution>,
    interval: Duration,
) -> Result<Option<WorkflowExecutionPhase>> {
    let id = execution.key();
    let mut updates = execution.subscribe();
    let refresher = spawn_refresher(execution, execution_refresh_config(interval));
    let mut last_phase: Option<WorkflowExecutionPhase> = None;

    let current = updates.borrow_and_update().clone();
    let mut finished = report_state(&id, &current, &mut last_phase)?;

    while !finished {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(execution = %id, "watch interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                finished = report_state(&id, &state, &mut last_phase)?;
            }
        }
    }

    debug!(ticks = refresher.ticks(), "stopping execution watch");
    refresher.stop().await?;
    Ok(last_phase)
}

/// Print `state` if its phase is new. Returns `true` once the execution is terminal.
fn report_state(
    id: &WorkflowExecutionIdentifier,
    state: &FetchableState<WorkflowExecutionIdentifier, Execution>,
    last_phase: &mut Option<WorkflowExecutionPhase>,
) -> Result<bool> {
    match state.status {
        FetchStatus::Fetched => {
            let phase = state.value.closure.phase;
            if *last_phase != Some(phase) {
                println!("{}", phase_line(&state.value));
                *last_phase = Some(phase);
            }
            Ok(state.value.is_terminal())
        }
        FetchStatus::Failed => {
            let error = state.last_error.as_ref().map(ToString::to_string).unwrap_or_default();
            if last_phase.is_none() {
                bail!("watch execution {id}: {error}");
            }
            eprintln!("refresh failed, retrying: {error}");
            Ok(false)
        }
        FetchStatus::NotFetched | FetchStatus::Fetching => Ok(false),
    }
}

/// Abort an execution and print its refreshed phase.
pub async fn terminate(api: Arc<dyn AdminApi>, id: WorkflowExecutionIdentifier, cause: &str) -> Result<()> {
    let execution = execution_fetchable(Arc::clone(&api), id);
    let state = terminate_execution(api.as_ref(), &execution, cause).await?;
    if let Some(error) = state.last_error {
        bail!("execution terminated, but reloading it failed: {error}");
    }
    println!("{}", phase_line(&state.value));
    Ok(())
}

/// Print the inputs and outputs of an execution, or of one of its nodes.
pub async fn print_execution_data(api: Arc<dyn AdminApi>, id: WorkflowExecutionIdentifier, node_id: Option<String>) -> Result<()> {
    let data = match node_id {
        Some(node_id) => {
            let node = NodeExecutionIdentifier {
                node_id,
                execution_id: id,
            };
            settled_value(&node_execution_data_fetchable(api, node)).await?
        }
        None => settled_value(&execution_data_fetchable(api, id)).await?,
    };
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Wait for the fetchable's current request and return its value or error.
async fn settled_value<K, T>(fetchable: &Fetchable<K, T>) -> Result<T>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let mut updates = fetchable.subscribe();
    let state = updates
        .wait_for(|state| state.status.is_settled())
        .await
        .with_context(|| format!("{} closed before settling", fetchable.debug_name()))?
        .clone();
    match state.last_error {
        Some(error) if state.status == FetchStatus::Failed => Err(error.into()),
        _ => Ok(state.value),
    }
}

fn phase_line(execution: &Execution) -> String {
    let closure = &execution.closure;
    let started = closure
        .started_at
        .map(|started_at| date_with_from_now(&started_at, &Utc::now()))
        .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
    let duration = closure
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .map(duration_to_hms)
        .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
    let mut line = format!("{:<10} started {} duration {}", format!("{:?}", closure.phase), started, duration);
    if let Some(error) = &closure.error {
        line.push_str(&format!(" error {}: {}", error.code, error.message));
    }
    line
}

/// Parse a `"12.5s"` duration as reported by the admin gateway.
fn parse_seconds(raw: &str) -> Option<Duration> {
    raw.strip_suffix('s')?
        .parse::<f64>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

pub async fn print_workflow_inputs(api: &dyn AdminApi, launch_plan_id: &Identifier) -> Result<()> {
    let launch_plan = api
        .get_launch_plan(launch_plan_id)
        .await
        .with_context(|| format!("load launch plan {launch_plan_id}"))?;
    let inputs = parse_inputs(&launch_plan.closure.expected_inputs);
    println!("{}", serde_json::to_string_pretty(&inputs)?);
    Ok(())
}

pub async fn launch(
    api: &dyn AdminApi,
    launch_plan_id: &Identifier,
    inputs: Vec<(String, String)>,
    execution_name: Option<String>,
) -> Result<()> {
    let launch_plan = api
        .get_launch_plan(launch_plan_id)
        .await
        .with_context(|| format!("load launch plan {launch_plan_id}"))?;
    let mut form = LaunchForm::new(launch_plan);
    for (name, value) in inputs {
        form.set_value(&name, InputValue::String(value))?;
    }

    if let Err(errors) = form.validate() {
        for (name, message) in errors.iter() {
            eprintln!("  {name}: {message}");
        }
        bail!("{} input(s) are invalid", errors.len());
    }

    let execution_id = form.submit(api, execution_name).await?;
    println!("{execution_id}");
    Ok(())
}
