//! Fetchable lists that grow one page at a time.
//!
//! [`PaginatedFetchable::fetch`] reloads the first page and replaces the list;
//! [`PaginatedFetchable::fetch_more`] appends the page named by the stored
//! continuation token. Both go through the same request-token ordering as any
//! other fetch, so a reload issued after `fetch_more` supersedes it.

use std::{future::Future, sync::Arc};

use flytedeck_types::{PaginatedEntities, RequestConfig};
use futures_util::{FutureExt, future::BoxFuture};
use tracing::debug;

use super::fetchable::{Fetchable, FetchableOptions, FetchableState};

pub type PageFn<K, T> = Arc<dyn Fn(K, RequestConfig) -> BoxFuture<'static, anyhow::Result<PaginatedEntities<T>>> + Send + Sync>;

/// Items loaded so far plus the token for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }
}

impl<T> PagedList<T> {
    pub fn more_items_available(&self) -> bool {
        self.next_token.is_some()
    }

    fn from_page(page: PaginatedEntities<T>) -> Self {
        let next_token = page.next_token().map(str::to_string);
        Self {
            items: page.entities,
            next_token,
        }
    }
}

pub struct PaginatedFetchable<K, T> {
    fetchable: Fetchable<K, PagedList<T>>,
    page_fn: PageFn<K, T>,
    config: RequestConfig,
}

impl<K, T> Clone for PaginatedFetchable<K, T> {
    fn clone(&self) -> Self {
        Self {
            fetchable: self.fetchable.clone(),
            page_fn: Arc::clone(&self.page_fn),
            config: self.config.clone(),
        }
    }
}

impl<K, T> PaginatedFetchable<K, T>
where
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a paginated list; every page request starts from `config`.
    pub fn new<F, Fut>(options: FetchableOptions<K, PagedList<T>>, key: K, config: RequestConfig, page_fn: F) -> Self
    where
        F: Fn(K, RequestConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PaginatedEntities<T>>> + Send + 'static,
    {
        let page_fn: PageFn<K, T> = Arc::new(move |key, config| page_fn(key, config).boxed());
        let first_page = Arc::clone(&page_fn);
        let first_config = config.clone().with_token(None);
        let fetchable = Fetchable::new(options, key, move |key| {
            let page = first_page(key, first_config.clone());
            async move { Ok::<_, anyhow::Error>(PagedList::from_page(page.await?)) }
        });

        Self {
            fetchable,
            page_fn,
            config,
        }
    }

    pub fn fetchable(&self) -> &Fetchable<K, PagedList<T>> {
        &self.fetchable
    }

    pub fn state(&self) -> FetchableState<K, PagedList<T>> {
        self.fetchable.state()
    }

    pub fn set_key(&self, key: K) {
        self.fetchable.set_key(key);
    }

    /// Reload from the first page.
    pub async fn fetch(&self) -> FetchableState<K, PagedList<T>> {
        self.fetchable.fetch().await
    }

    /// Append the next page. A no-op when no continuation token is stored.
    pub async fn fetch_more(&self) -> FetchableState<K, PagedList<T>> {
        if !self.fetchable.inspect(|state| state.value.more_items_available()) {
            debug!(debug_name = %self.fetchable.debug_name(), "no further pages to fetch");
            return self.fetchable.state();
        }

        let page_fn = Arc::clone(&self.page_fn);
        let config = self.config.clone();
        self.fetchable
            .run_request(move |key, current: PagedList<T>| {
                let Some(token) = current.next_token.clone() else {
                    return async move { Ok::<_, anyhow::Error>(current) }.boxed();
                };
                let page = page_fn(key, config.with_token(Some(token)));
                async move {
                    let next = PagedList::from_page(page.await?);
                    let mut list = current;
                    list.items.extend(next.items);
                    list.next_token = next.next_token;
                    Ok::<_, anyhow::Error>(list)
                }
                .boxed()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchStatus;

    fn numbers() -> PaginatedFetchable<&'static str, u32> {
        PaginatedFetchable::new(
            FetchableOptions::new("Numbers", PagedList::default()),
            "all",
            RequestConfig::with_limit(2),
            |_key, config: RequestConfig| async move {
                let page = match config.token.as_deref() {
                    None => PaginatedEntities {
                        entities: vec![1, 2],
                        token: Some("2".into()),
                    },
                    Some("2") => PaginatedEntities {
                        entities: vec![3],
                        token: None,
                    },
                    Some(other) => anyhow::bail!("unexpected token {other}"),
                };
                Ok(page)
            },
        )
    }

    #[tokio::test]
    async fn fetch_more_appends_pages() {
        let list = numbers();

        let first = list.fetch().await;
        assert_eq!(first.value.items, vec![1, 2]);
        assert!(first.value.more_items_available());

        let second = list.fetch_more().await;
        assert_eq!(second.status, FetchStatus::Fetched);
        assert_eq!(second.value.items, vec![1, 2, 3]);
        assert!(!second.value.more_items_available());

        let unchanged = list.fetch_more().await;
        assert_eq!(unchanged.value.items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_reloads_first_page() {
        let list = numbers();
        list.fetch().await;
        list.fetch_more().await;

        let reloaded = list.fetch().await;
        assert_eq!(reloaded.value.items, vec![1, 2]);
        assert!(reloaded.value.more_items_available());
    }
}
