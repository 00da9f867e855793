//! Observable async state container bound to one identifying key.
//!
//! A [`Fetchable`] owns the most recent value for its key, the status of the
//! latest request, and the error that request produced. Observers subscribe to
//! a `tokio::sync::watch` channel and see a consistent [`FetchableState`]
//! snapshot after every transition.
//!
//! Every request is stamped with a monotonically increasing token. A result is
//! committed only when its token is still the newest one issued, so a slow
//! request that was superseded by a later `fetch` or `set_key` never
//! overwrites fresher state.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::{FutureExt, future::BoxFuture};
use thiserror::Error;
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// Boxed fetch function shared between clones of a [`Fetchable`].
pub type FetchFn<K, T> = Arc<dyn Fn(K) -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

/// Lifecycle of the most recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchStatus {
    #[default]
    NotFetched,
    Fetching,
    Fetched,
    Failed,
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Fetching)
    }

    /// Whether a request has completed, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Fetched | Self::Failed)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFetched => "not fetched",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Error recorded on a failed fetch.
///
/// Clonable so it can live inside the observable state snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The identifying key was absent when a fetch ran.
    #[error("{debug_name}: cannot fetch without an identifying key")]
    MissingKey { debug_name: String },
    /// The fetch function failed.
    #[error("{debug_name}: {message}")]
    Remote { debug_name: String, message: String },
}

impl FetchError {
    pub fn debug_name(&self) -> &str {
        match self {
            Self::MissingKey { debug_name } | Self::Remote { debug_name, .. } => debug_name,
        }
    }

    fn from_anyhow(debug_name: &str, error: &anyhow::Error) -> Self {
        match error.downcast_ref::<FetchError>() {
            Some(fetch_error) => fetch_error.clone(),
            None => Self::Remote {
                debug_name: debug_name.to_string(),
                message: format!("{error:#}"),
            },
        }
    }
}

/// Unwrap an optional key inside a fetch function.
///
/// A missing key is a programmer error in the caller wiring; it is logged and
/// surfaces as [`FetchError::MissingKey`] on the fetchable.
pub fn require_key<K>(debug_name: &str, key: Option<K>) -> Result<K, FetchError> {
    key.ok_or_else(|| {
        error!(debug_name, "fetch attempted without an identifying key");
        FetchError::MissingKey {
            debug_name: debug_name.to_string(),
        }
    })
}

/// Construction options for a [`Fetchable`].
pub struct FetchableOptions<K, T> {
    pub debug_name: String,
    pub default_value: T,
    auto_fetch: Option<fn(&K) -> bool>,
}

impl<K, T> FetchableOptions<K, T> {
    pub fn new(debug_name: impl Into<String>, default_value: T) -> Self {
        Self {
            debug_name: debug_name.into(),
            default_value,
            auto_fetch: None,
        }
    }

    /// Fetch on creation and whenever the key changes.
    pub fn auto_fetch(mut self) -> Self {
        self.auto_fetch = Some(|_| true);
        self
    }

    /// Fetch on creation and key change only while `predicate` holds for the key.
    pub fn auto_fetch_when(mut self, predicate: fn(&K) -> bool) -> Self {
        self.auto_fetch = Some(predicate);
        self
    }
}

/// Snapshot of a fetchable's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchableState<K, T> {
    pub key: K,
    pub value: T,
    pub status: FetchStatus,
    pub last_error: Option<FetchError>,
    key_generation: u64,
    request_token: u64,
}

impl<K, T> FetchableState<K, T> {
    /// Incremented every time the identifying key changes.
    pub fn key_generation(&self) -> u64 {
        self.key_generation
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }
}

struct Inner<K, T> {
    debug_name: String,
    default_value: T,
    auto_fetch: Option<fn(&K) -> bool>,
    fetch_fn: FetchFn<K, T>,
    state: watch::Sender<FetchableState<K, T>>,
    next_token: AtomicU64,
}

/// Shared handle to an observable async value.
///
/// Clones share the same state; the value is never absent and holds
/// `default_value` until a fetch succeeds.
pub struct Fetchable<K, T> {
    inner: Arc<Inner<K, T>>,
}

impl<K, T> Clone for Fetchable<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T> fmt::Debug for Fetchable<K, T>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Fetchable")
            .field("debug_name", &self.inner.debug_name)
            .field("key", &state.key)
            .field("status", &state.status)
            .field("last_error", &state.last_error)
            .finish()
    }
}

impl<K, T> Fetchable<K, T> {
    /// Read the current state without cloning it.
    pub fn inspect<R>(&self, read: impl FnOnce(&FetchableState<K, T>) -> R) -> R {
        read(&self.inner.state.borrow())
    }
}

impl<K, T> Fetchable<K, T>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a fetchable for `key`.
    ///
    /// When auto-fetch applies to `key`, the first fetch is spawned on the
    /// current tokio runtime.
    pub fn new<F, Fut>(options: FetchableOptions<K, T>, key: K, fetch_fn: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let fetch_fn: FetchFn<K, T> = Arc::new(move |key| fetch_fn(key).boxed());
        let (state, _) = watch::channel(FetchableState {
            key,
            value: options.default_value.clone(),
            status: FetchStatus::NotFetched,
            last_error: None,
            key_generation: 0,
            request_token: 0,
        });

        let fetchable = Self {
            inner: Arc::new(Inner {
                debug_name: options.debug_name,
                default_value: options.default_value,
                auto_fetch: options.auto_fetch,
                fetch_fn,
                state,
                next_token: AtomicU64::new(0),
            }),
        };
        fetchable.maybe_auto_fetch();
        fetchable
    }

    pub fn debug_name(&self) -> &str {
        &self.inner.debug_name
    }

    pub fn state(&self) -> FetchableState<K, T> {
        self.inner.state.borrow().clone()
    }

    pub fn key(&self) -> K {
        self.inner.state.borrow().key.clone()
    }

    pub fn value(&self) -> T {
        self.inner.state.borrow().value.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.inner.state.borrow().status
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.state.borrow().last_error.clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchableState<K, T>> {
        self.inner.state.subscribe()
    }

    /// Change the identifying key.
    ///
    /// Setting an equal key is a no-op. Otherwise the value resets to the
    /// default, any in-flight request becomes stale, and auto-fetch runs
    /// again when enabled for the new key.
    pub fn set_key(&self, key: K) {
        let next_token = &self.inner.next_token;
        let default_value = &self.inner.default_value;
        let changed = self.inner.state.send_if_modified(|state| {
            if state.key == key {
                return false;
            }
            state.key = key;
            state.key_generation += 1;
            state.request_token = next_token.fetch_add(1, Ordering::SeqCst) + 1;
            state.value = default_value.clone();
            state.status = FetchStatus::NotFetched;
            state.last_error = None;
            true
        });

        if changed {
            debug!(debug_name = %self.inner.debug_name, "fetchable key changed");
            self.maybe_auto_fetch();
        }
    }

    /// Request a fresh value for the current key and wait for it to settle.
    ///
    /// Returns the state observed once this request finished. If a newer
    /// request superseded this one, the returned state reflects whatever the
    /// newer request has committed so far.
    pub async fn fetch(&self) -> FetchableState<K, T> {
        let fetch_fn = Arc::clone(&self.inner.fetch_fn);
        self.run_request(move |key, _current| fetch_fn(key)).await
    }

    /// Spawn [`Fetchable::fetch`] on the current runtime.
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn spawn_fetch(&self) -> Option<JoinHandle<FetchableState<K, T>>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(debug_name = %self.inner.debug_name, "no tokio runtime; fetch not started");
            return None;
        };
        let fetchable = self.clone();
        Some(runtime.spawn(async move { fetchable.fetch().await }))
    }

    /// Run one request built from the current key and value.
    ///
    /// The request is stamped with a fresh token; its outcome is committed
    /// only while that token is still the newest.
    pub(crate) async fn run_request<F>(&self, request: F) -> FetchableState<K, T>
    where
        F: FnOnce(K, T) -> BoxFuture<'static, anyhow::Result<T>>,
    {
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let (key, current) = {
            let mut captured = None;
            self.inner.state.send_modify(|state| {
                state.request_token = token;
                state.status = FetchStatus::Fetching;
                state.last_error = None;
                captured = Some((state.key.clone(), state.value.clone()));
            });
            match captured {
                Some(captured) => captured,
                None => {
                    let state = self.inner.state.borrow();
                    (state.key.clone(), state.value.clone())
                }
            }
        };
        debug!(debug_name = %self.inner.debug_name, request_token = token, "fetch started");

        let result = request(key, current).await;
        self.commit(token, result)
    }

    fn commit(&self, token: u64, result: anyhow::Result<T>) -> FetchableState<K, T> {
        let debug_name = self.inner.debug_name.as_str();
        let failure = result.as_ref().err().map(|error| FetchError::from_anyhow(debug_name, error));

        let committed = self.inner.state.send_if_modified(|state| {
            if state.request_token != token {
                return false;
            }
            match result {
                Ok(value) => {
                    state.value = value;
                    state.status = FetchStatus::Fetched;
                    state.last_error = None;
                }
                Err(_) => {
                    state.status = FetchStatus::Failed;
                    state.last_error = failure.clone();
                }
            }
            true
        });

        match (committed, &failure) {
            (false, _) => debug!(debug_name, request_token = token, "stale fetch result discarded"),
            (true, None) => info!(debug_name, request_token = token, "fetch completed"),
            (true, Some(failure)) => warn!(debug_name, request_token = token, error = %failure, "fetch failed"),
        }
        self.state()
    }

    fn maybe_auto_fetch(&self) {
        let Some(predicate) = self.inner.auto_fetch else {
            return;
        };
        if predicate(&self.inner.state.borrow().key) {
            self.spawn_fetch();
        }
    }
}
