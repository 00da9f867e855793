//! Request and pagination primitives shared by all list endpoints.

use serde::{Deserialize, Serialize};

/// Page size limits used by list requests.
pub mod limits {
    /// Default page size for incrementally loaded tables.
    pub const DEFAULT: u32 = 25;
    /// Effectively unbounded; used when every record must be loaded at once.
    pub const NONE: u32 = 10_000;
}

/// Field names accepted by the `sort_by.key` query parameter.
pub mod sort_fields {
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const NAME: &str = "name";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

impl SortDirection {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Descending => "DESCENDING",
            Self::Ascending => "ASCENDING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// Options applied to a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub limit: u32,
    /// Continuation token returned by the previous page.
    pub token: Option<String>,
    pub sort: Option<Sort>,
    /// Raw filter expression, e.g. `eq(state,1)`.
    pub filter: Option<String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            limit: limits::DEFAULT,
            token: None,
            sort: None,
            filter: None,
        }
    }
}

impl RequestConfig {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// One page of a list response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedEntities<T> {
    pub entities: Vec<T>,
    #[serde(default)]
    pub token: Option<String>,
}

impl<T> PaginatedEntities<T> {
    /// Token for the next page, treating an empty string the same as absence.
    pub fn next_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

impl<T> Default for PaginatedEntities<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_means_last_page() {
        let page = PaginatedEntities::<u32> {
            entities: vec![1],
            token: Some(String::new()),
        };
        assert!(page.next_token().is_none());

        let page = PaginatedEntities::<u32> {
            entities: vec![1],
            token: Some("25".into()),
        };
        assert_eq!(page.next_token(), Some("25"));
    }
}
