use std::time::Duration;

use thiserror::Error;

/// Failure of a single upstream call, as classified by the provider adapter.
/// 单次上游调用的失败分类。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    #[error("malformed response: {0}")]
    Malformed(String),

    /// Upstream refused the request itself (bad credentials, unknown
    /// collection). Retrying cannot help.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Not a failure: the request was superseded or torn down.
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::RateLimited { .. }
        )
    }
}

/// Raised once retryable failures exhaust the attempt ceiling. The only error
/// that reaches a view's load state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempts: {reason}")]
pub struct TerminalError {
    pub reason: String,
    pub attempts: u32,
}

/// Invalid user-triggered operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active view")]
    NoActiveView,

    #[error("retry is only valid from a failed state (current: {0})")]
    RetryNotAllowed(&'static str),
}
