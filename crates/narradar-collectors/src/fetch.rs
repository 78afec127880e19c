//! Retry-capable fetch shared by every collector.
//!
//! The contract is deliberately asymmetric:
//!
//! - a **transport failure** (the call itself cannot complete) is retried
//!   with exponential backoff and, on the final attempt, propagated as
//!   [`CollectorError::Http`] — fatal for that collector invocation;
//! - a **non-success response** (the call completed, status not 2xx) is
//!   retried the same way, but on the final attempt the response is returned
//!   as-is — the caller must inspect it and decide whether the content is
//!   usable.
//!
//! A success response short-circuits immediately without exhausting the
//! remaining attempts.

use std::time::Duration;

use reqwest::{Client, Request, Response};

use crate::error::CollectorError;

/// Retry budget for [`fetch_with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Treated as at least 1.
    pub max_attempts: u32,
    /// Base backoff delay; the wait before retry n is `backoff_base * 2^(n-1)`.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Executes `request` up to `policy.max_attempts` times.
///
/// Backoff before the retry after attempt `i` (zero-based) is
/// `backoff_base * 2^i`; no sleep follows the final attempt.
///
/// # Errors
///
/// - [`CollectorError::Http`] — transport failure on the final attempt.
/// - [`CollectorError::UncloneableRequest`] — the request has a streaming
///   body and cannot be replayed; returned before any attempt is made.
pub async fn fetch_with_retry(
    client: &Client,
    request: Request,
    policy: RetryPolicy,
) -> Result<Response, CollectorError> {
    let max_attempts = policy.max_attempts.max(1);

    // Every attempt but the last executes a clone of the request; the
    // original is consumed by the final attempt.
    for attempt in 0..max_attempts - 1 {
        let req = request
            .try_clone()
            .ok_or(CollectorError::UncloneableRequest)?;

        match client.execute(req).await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    attempt,
                    max_attempts,
                    "non-success response — retrying after backoff"
                );
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    max_attempts,
                    "transport failure — retrying after backoff"
                );
            }
        }

        let delay = policy.backoff_base.saturating_mul(1u32 << attempt.min(20));
        tokio::time::sleep(delay).await;
    }

    // Final attempt: a transport failure propagates, any received response —
    // success or not — is handed back for the caller to inspect.
    client.execute(request).await.map_err(CollectorError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn zero_backoff(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_base: Duration::ZERO,
        }
    }

    fn get(client: &Client, url: &str) -> Request {
        client.get(url).build().expect("request builds")
    }

    #[tokio::test]
    async fn success_short_circuits_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let request = get(&client, &format!("{}/ok", server.uri()));
        let response = fetch_with_retry(&client, request, zero_backoff(3))
            .await
            .expect("fetch should succeed");
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn persistent_non_success_is_returned_after_all_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::new();
        let request = get(&client, &format!("{}/limited", server.uri()));
        let response = fetch_with_retry(&client, request, zero_backoff(3))
            .await
            .expect("degraded responses must not raise");
        assert_eq!(response.status().as_u16(), 429);
    }

    #[tokio::test]
    async fn transient_failure_then_success_returns_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let request = get(&client, &format!("{}/flaky", server.uri()));
        let response = fetch_with_retry(&client, request, zero_backoff(3))
            .await
            .expect("should recover on second attempt");
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn transport_failure_raises_after_final_attempt() {
        // Nothing listens on this port; connection is refused immediately.
        let client = Client::new();
        let request = get(&client, "http://127.0.0.1:1/unreachable");
        let result = fetch_with_retry(&client, request, zero_backoff(2)).await;
        assert!(matches!(result, Err(CollectorError::Http(_))));
    }

    #[tokio::test]
    async fn persistent_transport_failure_consumes_the_full_attempt_budget() {
        let server = MockServer::start().await;
        // The response stalls past the client timeout, so every attempt ends
        // in a transport failure while the server still counts the request.
        Mock::given(method("GET"))
            .and(path("/stall"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client builds");
        let request = get(&client, &format!("{}/stall", server.uri()));
        let result = fetch_with_retry(&client, request, zero_backoff(3)).await;
        assert!(matches!(result, Err(CollectorError::Http(_))));
        // MockServer verifies expect(3) on drop: exactly three attempts.
    }

    #[tokio::test]
    async fn backoff_doubles_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(50),
        };
        let client = Client::new();
        let request = get(&client, &format!("{}/busy", server.uri()));
        let started = std::time::Instant::now();
        let response = fetch_with_retry(&client, request, policy)
            .await
            .expect("final response is returned");
        assert_eq!(response.status().as_u16(), 503);
        // base * 2^0 + base * 2^1 = 150ms of scheduled sleep before the
        // final attempt; no upper bound asserted to keep the test robust.
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn single_attempt_budget_makes_exactly_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/once"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let request = get(&client, &format!("{}/once", server.uri()));
        let response = fetch_with_retry(&client, request, zero_backoff(1))
            .await
            .expect("final-attempt response is returned as-is");
        assert_eq!(response.status().as_u16(), 500);
    }
}
