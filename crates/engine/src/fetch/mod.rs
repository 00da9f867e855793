//! Observable fetch state.
//!
//! - `fetchable`: the keyed async state container and its error type
//! - `multi`: loading/error aggregation across several fetchables
//! - `paginated`: list fetchables that append pages on demand

mod fetchable;
mod multi;
mod paginated;

pub use fetchable::{FetchError, FetchFn, FetchStatus, Fetchable, FetchableOptions, FetchableState, require_key};
pub use multi::{FetchableStatus, MultiFetchableState, multi_fetchable_state};
pub use paginated::{PageFn, PagedList, PaginatedFetchable};
