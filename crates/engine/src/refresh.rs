//! Periodic refetching of a [`Fetchable`] until its value is final.
//!
//! [`spawn_refresher`] starts a background task that waits `interval` after
//! each settled fetch and then fetches again, until `value_is_final` holds for
//! the current value. Changing the fetchable's key restarts the cycle for the
//! new key. Dropping the returned [`RefreshHandle`] cancels the pending timer;
//! a fetch already in flight is left to settle on its own.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetch::{FetchStatus, Fetchable, FetchableState};

/// Predicate deciding whether a value will no longer change.
pub type FinalPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// How often to refetch, and when to stop.
pub struct RefreshConfig<T> {
    pub interval: Duration,
    value_is_final: FinalPredicate<T>,
}

impl<T> RefreshConfig<T> {
    pub fn new(interval: Duration, value_is_final: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            interval,
            value_is_final: Arc::new(value_is_final),
        }
    }

    pub fn value_is_final(&self, value: &T) -> bool {
        (self.value_is_final)(value)
    }
}

impl<T> Clone for RefreshConfig<T> {
    fn clone(&self) -> Self {
        Self {
            interval: self.interval,
            value_is_final: Arc::clone(&self.value_is_final),
        }
    }
}

impl<T> fmt::Debug for RefreshConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshConfig").field("interval", &self.interval).finish_non_exhaustive()
    }
}

/// Scheduler state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshState {
    /// Not running: cancelled or not yet started.
    Idle,
    /// A timer is armed for the next refetch.
    Scheduled,
    /// The value is final; no timer is armed until the key changes.
    Stopped,
}

/// Owner of a running refresh task. Dropping it cancels the task.
#[derive(Debug)]
pub struct RefreshHandle {
    cancellation_token: CancellationToken,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<RefreshState>,
    ticks: Arc<AtomicU64>,
}

impl RefreshHandle {
    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    /// Whether a refetch timer is currently pending.
    pub fn is_timer_armed(&self) -> bool {
        !self.cancellation_token.is_cancelled() && self.state() == RefreshState::Scheduled
    }

    /// Number of timer-driven fetches issued so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.state.clone()
    }

    /// Wait until the scheduler reaches `target`. Returns `false` if the task
    /// exited first.
    pub async fn wait_for_state(&self, target: RefreshState) -> bool {
        let mut state = self.state.clone();
        state.wait_for(|current| *current == target).await.is_ok()
    }

    /// Cancel the scheduler and wait for its task to exit.
    pub async fn stop(mut self) -> Result<()> {
        self.cancellation_token.cancel();
        if let Some(task) = self.task.take() {
            task.await.map_err(|error| anyhow!("refresh task failed: {error}"))?;
        }
        Ok(())
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

/// Start refreshing `fetchable` on the current tokio runtime.
pub fn spawn_refresher<K, T>(fetchable: &Fetchable<K, T>, config: RefreshConfig<T>) -> RefreshHandle
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let cancellation_token = CancellationToken::new();
    let (state_tx, state) = watch::channel(RefreshState::Idle);
    let ticks = Arc::new(AtomicU64::new(0));

    info!(
        debug_name = %fetchable.debug_name(),
        interval_ms = config.interval.as_millis() as u64,
        "refresh scheduler started"
    );
    let task = tokio::spawn(run_refresh_loop(
        fetchable.clone(),
        config,
        cancellation_token.child_token(),
        state_tx,
        Arc::clone(&ticks),
    ));

    RefreshHandle {
        cancellation_token,
        task: Some(task),
        state,
        ticks,
    }
}

enum Wake {
    Cancelled,
    KeyChanged,
    ValueFinal,
    TimerFired,
}

async fn run_refresh_loop<K, T>(
    fetchable: Fetchable<K, T>,
    config: RefreshConfig<T>,
    cancellation_token: CancellationToken,
    state_tx: watch::Sender<RefreshState>,
    ticks: Arc<AtomicU64>,
) where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let debug_name = fetchable.debug_name().to_string();
    let mut updates = fetchable.subscribe();

    loop {
        let (generation, mut is_final) = {
            let current = updates.borrow_and_update();
            (current.key_generation(), config.value_is_final(&current.value))
        };

        let wake = loop {
            if is_final {
                state_tx.send_replace(RefreshState::Stopped);
                info!(debug_name = %debug_name, key_generation = generation, "value is final; refresh stopped");
                break wait_while_stopped(&cancellation_token, &mut updates, generation).await;
            }

            state_tx.send_replace(RefreshState::Scheduled);
            match wait_for_tick(&cancellation_token, &mut updates, &config, generation).await {
                Wake::TimerFired => {}
                Wake::ValueFinal => {
                    is_final = true;
                    continue;
                }
                other => break other,
            }

            let tick = ticks.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(debug_name = %debug_name, tick, "refresh tick");
            let settled: FetchableState<K, T> = fetchable.fetch().await;

            if cancellation_token.is_cancelled() {
                break Wake::Cancelled;
            }
            if settled.key_generation() != generation {
                break Wake::KeyChanged;
            }
            if settled.status == FetchStatus::Failed
                && let Some(error) = &settled.last_error
            {
                warn!(debug_name = %debug_name, tick, error = %error, "refresh fetch failed; polling continues");
            }
            is_final = config.value_is_final(&settled.value);
        };

        match wake {
            Wake::Cancelled => {
                state_tx.send_replace(RefreshState::Idle);
                debug!(debug_name = %debug_name, "refresh scheduler cancelled");
                return;
            }
            Wake::KeyChanged => {
                debug!(debug_name = %debug_name, "key changed; refresh cycle restarted");
            }
            Wake::ValueFinal | Wake::TimerFired => {}
        }
    }
}

/// Sleep one interval, waking early on cancellation, a key change, or a value
/// that became final through some other fetch.
async fn wait_for_tick<K, T>(
    cancellation_token: &CancellationToken,
    updates: &mut watch::Receiver<FetchableState<K, T>>,
    config: &RefreshConfig<T>,
    generation: u64,
) -> Wake {
    let timer = tokio::time::sleep(config.interval);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => return Wake::Cancelled,
            _ = &mut timer => return Wake::TimerFired,
            changed = updates.changed() => {
                if changed.is_err() {
                    return Wake::Cancelled;
                }
                let (key_generation, is_final) = {
                    let current = updates.borrow_and_update();
                    (current.key_generation(), config.value_is_final(&current.value))
                };
                if key_generation != generation {
                    return Wake::KeyChanged;
                }
                if is_final {
                    return Wake::ValueFinal;
                }
            }
        }
    }
}

async fn wait_while_stopped<K, T>(
    cancellation_token: &CancellationToken,
    updates: &mut watch::Receiver<FetchableState<K, T>>,
    generation: u64,
) -> Wake {
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => return Wake::Cancelled,
            changed = updates.changed() => {
                if changed.is_err() {
                    return Wake::Cancelled;
                }
                if updates.borrow_and_update().key_generation() != generation {
                    return Wake::KeyChanged;
                }
            }
        }
    }
}
