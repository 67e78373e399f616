//! Shared error type and retry policy for the remote service clients.
//!
//! Every backend call resolves to `Result<_, ServiceError>`. Non-2xx
//! responses become [`ServiceError::Status`] carrying the upstream status
//! and body so the UI can show what the service actually said. Transport
//! failures and timeouts are the only *transient* errors — [`retrying`]
//! re-attempts those and nothing else.

use thiserror::Error;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Errors from the transcription / translation / synthesis backends.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("service request timed out")]
    Timeout,

    /// The response body could not be parsed as expected.
    #[error("failed to parse service response: {0}")]
    Parse(String),

    /// The service returned a response with no usable content.
    #[error("service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

impl ServiceError {
    /// `true` for failures a retry could plausibly fix.
    ///
    /// HTTP status failures are deliberate answers from the backend and are
    /// never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Request(_) | ServiceError::Timeout)
    }
}

/// Convert a non-success response into [`ServiceError::Status`], consuming
/// the body for the error message.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status { status, body })
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded retry for idempotent service calls.
///
/// The default of one attempt matches the backends' original behaviour;
/// hardening is an explicit configuration choice, not a baked-in guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

/// Run `op` up to `policy.max_attempts` times, re-attempting only
/// transient failures.
pub async fn retrying<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                log::warn!("service call failed (attempt {attempt}/{max_attempts}): {e}");
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn status_errors_are_not_transient() {
        let e = ServiceError::Status {
            status: 500,
            body: "internal".into(),
        };
        assert!(!e.is_transient());
        assert!(!ServiceError::Parse("bad json".into()).is_transient());
        assert!(!ServiceError::EmptyResponse.is_transient());
    }

    #[test]
    fn transport_and_timeout_are_transient() {
        assert!(ServiceError::Request("connection refused".into()).is_transient());
        assert!(ServiceError::Timeout.is_transient());
    }

    #[test]
    fn status_error_display_includes_status_and_body() {
        let e = ServiceError::Status {
            status: 422,
            body: "invalid audio".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("invalid audio"));
    }

    #[tokio::test]
    async fn retrying_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retrying(RetryPolicy { max_attempts: 3 }, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ServiceError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retrying_reattempts_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retrying(RetryPolicy { max_attempts: 3 }, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ServiceError::Timeout)
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retrying_never_reattempts_status_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retrying(RetryPolicy { max_attempts: 5 }, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ServiceError::Status {
                    status: 401,
                    body: "unauthorized".into(),
                })
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(ServiceError::Status { status: 401, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_policy_is_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retrying(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Timeout) }
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_behaves_as_one() {
        let calls = AtomicU32::new(0);
        let _ = retrying(RetryPolicy { max_attempts: 0 }, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ServiceError>(()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
