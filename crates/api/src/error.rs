use thiserror::Error;

/// Failures surfaced by [`crate::AdminClient`].
///
/// The client returns `anyhow::Error`; callers that need to branch on the
/// cause use `error.downcast_ref::<ApiError>()`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid admin API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("response for {path} is missing the '{field}' field")]
    MissingField { path: String, field: &'static str },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
