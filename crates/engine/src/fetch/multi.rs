//! Combine the status of several fetchables into one loading/error summary.

use super::fetchable::{FetchError, FetchStatus, Fetchable, FetchableState};

/// Anything that can report a fetch status and its last error.
pub trait FetchableStatus {
    /// Status and error read together from one snapshot.
    fn status_and_error(&self) -> (FetchStatus, Option<FetchError>);
}

impl<K, T> FetchableStatus for FetchableState<K, T> {
    fn status_and_error(&self) -> (FetchStatus, Option<FetchError>) {
        (self.status, self.last_error.clone())
    }
}

impl<K, T> FetchableStatus for Fetchable<K, T> {
    fn status_and_error(&self) -> (FetchStatus, Option<FetchError>) {
        self.inspect(|state| state.status_and_error())
    }
}

/// Aggregated view over a set of fetchables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiFetchableState {
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

/// Summarize `fetchables`.
///
/// Loading while any member has not settled, including members never fetched.
/// The error is the first failed member's error in input order.
pub fn multi_fetchable_state(fetchables: &[&dyn FetchableStatus]) -> MultiFetchableState {
    fetchables
        .iter()
        .map(|fetchable| fetchable.status_and_error())
        .fold(MultiFetchableState::default(), |mut summary, (status, error)| {
            summary.is_loading |= !status.is_settled();
            if summary.error.is_none() {
                summary.error = error;
            }
            summary
        })
}
