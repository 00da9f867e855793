//! # Flytedeck Engine
//!
//! The Flytedeck engine keeps console views in sync with the workflow control
//! plane. It loads records through the [`flytedeck_api::AdminApi`] seam, keeps
//! them observable, refreshes them while they are still changing, and turns
//! launch plan parameters into validated launch requests.
//!
//! ## Key Features
//!
//! - **Fetchables**: Keyed async state with latest-request-wins ordering
//! - **Entity Cache**: Shared store for immutable entities such as task templates
//! - **Refresh Scheduler**: Interval polling that stops once a value is final
//! - **Launch Inputs**: Typed input resolution, validation, and literal conversion
//!
//! ## Usage
//!
//! ```ignore
//! use flytedeck_engine::{EXECUTION_REFRESH_INTERVAL, execution_fetchable, execution_refresh_config, spawn_refresher};
//!
//! let execution = execution_fetchable(api, execution_id);
//! let refresher = spawn_refresher(&execution, execution_refresh_config(EXECUTION_REFRESH_INTERVAL));
//! let mut updates = execution.subscribe();
//! while updates.changed().await.is_ok() {
//!     println!("phase: {:?}", updates.borrow().value.closure.phase);
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`fetch`**: [`Fetchable`], [`PaginatedFetchable`], and status aggregation
//! - **`cache`**: [`EntityCache`]
//! - **`refresh`**: [`spawn_refresher`] and its [`RefreshHandle`]
//! - **`inputs`**: Launch input parsing, per-type helpers, and validation
//! - **`sources`**: Fetchables bound to admin API endpoints
//! - **`launch`**: Launch form state and submission

pub mod cache;
pub mod fetch;
pub mod inputs;
pub mod launch;
pub mod refresh;
pub mod sources;

pub use cache::{CacheKey, EntityCache};
pub use fetch::{
    FetchError, FetchStatus, Fetchable, FetchableOptions, FetchableState, FetchableStatus, MultiFetchableState, PagedList,
    PaginatedFetchable, multi_fetchable_state, require_key,
};
pub use inputs::{
    InputHelper, InputType, InputTypeDefinition, InputValue, InputValueMap, ParsedInput, ValidationError, ValidationErrors, input_helper,
    parse_inputs, validate_inputs,
};
pub use launch::{LaunchForm, LaunchFormSources};
pub use refresh::{RefreshConfig, RefreshHandle, RefreshState, spawn_refresher};
pub use sources::{
    EXECUTION_REFRESH_INTERVAL, execution_data_fetchable, execution_fetchable, execution_refresh_config, launch_plans_fetchable,
    node_execution_data_fetchable, node_executions_fetchable, node_executions_refresh_config, task_execution_data_fetchable,
    task_executions_fetchable, task_executions_refresh_config, terminate_execution, workflow_executions_fetchable, workflow_fetchable,
    workflow_versions_fetchable,
};
