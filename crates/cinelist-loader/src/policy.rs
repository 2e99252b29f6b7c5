//! Automatic retry policy.

use std::time::Duration;

use cinelist_api::catalog::CatalogError;

/// Default retry budget per page request.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit.
const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Decides which failures are retried and how long to wait first.
///
/// Only transport-level failures are retried: a truncated body waits one
/// time unit, a dropped connection waits two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum automatic retries for one page request.
    pub max_retries: u32,
    /// Backoff before retrying a [`CatalogError::ParseResponseError`].
    pub parse_error_delay: Duration,
    /// Backoff before retrying a [`CatalogError::ConnectionLost`].
    pub connection_lost_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_time_unit(DEFAULT_MAX_RETRIES, DEFAULT_TIME_UNIT)
    }
}

impl RetryPolicy {
    /// Creates a policy where parse errors wait `unit` and lost
    /// connections wait twice that.
    #[must_use]
    pub fn with_time_unit(max_retries: u32, unit: Duration) -> Self {
        Self {
            max_retries,
            parse_error_delay: unit,
            connection_lost_delay: unit.saturating_mul(2),
        }
    }

    /// Returns the backoff for a retryable error, or `None` if the error
    /// must surface immediately.
    #[must_use]
    pub const fn backoff_for(&self, error: &CatalogError) -> Option<Duration> {
        match error {
            CatalogError::ParseResponseError => Some(self.parse_error_delay),
            CatalogError::ConnectionLost => Some(self.connection_lost_delay),
            CatalogError::InvalidUrl
            | CatalogError::NoData
            | CatalogError::DecodingError
            | CatalogError::NetworkError(_)
            | CatalogError::ServerError(_)
            | CatalogError::InvalidCredentials
            | CatalogError::RateLimited => None,
        }
    }
}
