//! Shared helpers for the Flytedeck crates: configuration loading, path
//! handling, and human-readable formatting of dates and durations.

pub mod config;
pub mod formatters;
pub mod path_processing;

pub use config::{ConfigError, ConsoleConfig};
pub use formatters::{UNKNOWN_VALUE, date_diff_string, date_with_from_now, duration_to_hms, ensure_url_with_protocol, format_date_utc};
pub use path_processing::expand_tilde;
