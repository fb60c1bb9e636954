//! # Retry Policy
//!
//! Duration-bounded retry for creating/mutating external actions. The bound
//! is on elapsed time since the request was created, not on an attempt
//! counter: transient infrastructure failures have highly variable recovery
//! times, and a duration bound naturally adapts to the polling cadence.

use crate::error::{ErrorClass, ServiceError};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// What a worker should do with a request after a failed external action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Leave the request in its current status; the next pass retries it.
    Retry,
    /// Move the request to `failed`, recording the reason.
    Fail { reason: String },
}

/// Apply the uniform retry policy to a failed external action.
///
/// Client-class errors fail immediately regardless of elapsed time.
/// Server-class errors are retried until `window` has elapsed since
/// `created_at`, then fail with the last error's reason. Unclassified
/// errors are treated as non-retryable to avoid infinite silent retry.
pub fn decide(
    err: &ServiceError,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> RetryDecision {
    match err.class() {
        ErrorClass::Server => {
            let window = chrono::Duration::seconds(window.as_secs() as i64);
            if now - created_at >= window {
                RetryDecision::Fail {
                    reason: err.reason(),
                }
            } else {
                RetryDecision::Retry
            }
        }
        ErrorClass::Client | ErrorClass::Unclassified => RetryDecision::Fail {
            reason: err.reason(),
        },
    }
}
