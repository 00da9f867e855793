//! Helpers for walking paginated list endpoints.

use std::future::Future;

use anyhow::{Result, bail};
use flytedeck_types::{PaginatedEntities, RequestConfig};
use tracing::debug;

/// Upper bound on pages fetched by [`drain_pages`], guarding against a server
/// that keeps handing out continuation tokens.
pub const MAX_PAGES: usize = 1_000;

/// Fetch every page starting from `config`, concatenating the entities.
///
/// The continuation token of each response is fed into the next request
/// until the server returns an absent or empty token.
pub async fn drain_pages<T, F, Fut>(config: RequestConfig, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(RequestConfig) -> Fut,
    Fut: Future<Output = Result<PaginatedEntities<T>>>,
{
    let mut entities = Vec::new();
    let mut request = config;

    for page_number in 1..=MAX_PAGES {
        let page = fetch_page(request.clone()).await?;
        let next_token = page.next_token().map(str::to_string);
        debug!(page_number, page_size = page.entities.len(), has_more = next_token.is_some(), "fetched page");
        entities.extend(page.entities);

        match next_token {
            Some(token) => request.token = Some(token),
            None => return Ok(entities),
        }
    }

    bail!("pagination guard tripped after {} pages", MAX_PAGES)
}
