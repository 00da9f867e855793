//! Human-readable formatting for timestamps, durations, and URLs.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Placeholder rendered for values that cannot be formatted.
pub const UNKNOWN_VALUE: &str = "(unknown)";

/// Timestamps at or before the epoch are treated as unset server values.
fn is_valid_date(date: &DateTime<Utc>) -> bool {
    date.timestamp_millis() > 0
}

/// Format a timestamp as `M/D/YYYY h:mm:ss AM UTC`.
pub fn format_date_utc(date: &DateTime<Utc>) -> String {
    if !is_valid_date(date) {
        return UNKNOWN_VALUE.to_string();
    }
    date.format("%-m/%-d/%Y %-I:%M:%S %p UTC").to_string()
}

/// Format a timestamp followed by its distance from `now`, e.g.
/// `1/2/2020 3:04:05 PM UTC (5 minutes ago)`.
pub fn date_with_from_now(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    if !is_valid_date(date) {
        return UNKNOWN_VALUE.to_string();
    }
    format!("{} ({})", format_date_utc(date), relative_time(date, now))
}

fn relative_time(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let delta_seconds = (*now - *date).num_seconds();
    let in_past = delta_seconds >= 0;
    let seconds = delta_seconds.unsigned_abs();
    let minutes = (seconds as f64 / 60.0).round() as u64;
    let hours = (seconds as f64 / 3600.0).round() as u64;
    let days = (seconds as f64 / 86_400.0).round() as u64;

    let phrase = match seconds {
        0..45 => "a few seconds".to_string(),
        45..90 => "a minute".to_string(),
        _ if minutes < 45 => format!("{minutes} minutes"),
        _ if minutes < 90 => "an hour".to_string(),
        _ if hours < 22 => format!("{hours} hours"),
        _ if hours < 36 => "a day".to_string(),
        _ => format!("{days} days"),
    };

    if in_past { format!("{phrase} ago") } else { format!("in {phrase}") }
}

/// Difference between two timestamps as `1h 2m 3s`.
///
/// Hours are not rolled into days. Differences under one second, or with
/// an unset endpoint, render as [`UNKNOWN_VALUE`].
pub fn date_diff_string(from: &DateTime<Utc>, to: &DateTime<Utc>) -> String {
    if !is_valid_date(from) || !is_valid_date(to) {
        return UNKNOWN_VALUE.to_string();
    }
    let millis = (*to - *from).num_milliseconds();
    if millis < 1000 {
        return UNKNOWN_VALUE.to_string();
    }
    hms(millis as u64 / 1000)
}

/// Render a duration as `1h 2m 3s`; sub-second durations render as milliseconds.
pub fn duration_to_hms(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds == 0 {
        return format!("{}ms", duration.as_millis());
    }
    hms(seconds)
}

fn hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = [(hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();
    parts.join(" ")
}

/// Prefix `https://` when the URL has no scheme; existing `http://` is kept.
pub fn ensure_url_with_protocol(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
