//! Bounded retry for outbound HTTP calls.
//!
//! Every upstream call (Plaid fetch, Twilio send) goes through a
//! `RetryPolicy`: a failed attempt is retried a fixed number of times with
//! a flat delay, each failure is logged, and exhaustion becomes a single
//! `NotifierError::Upstream` for the caller.

use reqwest::{Response, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::NotifierError;

/// Retries after the first attempt (4 attempts total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Hard cap on retries; larger budgets are clamped.
pub const MAX_RETRIES_CAP: u32 = 3;

/// Flat pause between attempts (ms).
pub const DEFAULT_DELAY_MS: u64 = 250;

// ---------------------------------------------------------------------------
// Attempt failure
// ---------------------------------------------------------------------------

/// One failed attempt inside the retry budget. Never surfaced directly.
#[derive(Debug, Clone)]
pub struct TransientFailure {
    pub status: Option<StatusCode>,
    pub message: String,
}

impl TransientFailure {
    /// A request that never produced a response (connect error, timeout).
    pub fn transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status(),
            message: format!("Request error: {err}"),
        }
    }

    /// Pass 2xx responses through; anything else is a failed attempt.
    pub async fn check_status(response: Response) -> Result<Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self {
            status: Some(status),
            message: format!("HTTP {status}: {body}"),
        })
    }
}

impl fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, Duration::from_millis(DEFAULT_DELAY_MS))
    }
}

impl RetryPolicy {
    /// `max_retries` above [`MAX_RETRIES_CAP`] is clamped to the cap.
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        let max_retries = if max_retries > MAX_RETRIES_CAP {
            MAX_RETRIES_CAP
        } else {
            max_retries
        };
        Self { max_retries, delay }
    }

    /// No pause between attempts.
    pub const fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `attempt` until it succeeds or the budget is spent.
    ///
    /// `service` names the upstream in logs and in the resulting error.
    pub async fn execute<T, F, Fut>(&self, service: &str, attempt: F) -> Result<T, NotifierError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransientFailure>>,
    {
        self.execute_counted(service, attempt)
            .await
            .map(|(value, _)| value)
    }

    /// Like [`execute`](Self::execute), also returning the attempt number
    /// that succeeded.
    pub async fn execute_counted<T, F, Fut>(
        &self,
        service: &str,
        mut attempt: F,
    ) -> Result<(T, u32), NotifierError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransientFailure>>,
    {
        let max_attempts = self.max_attempts();
        let mut last_failure = None;

        for n in 1..=max_attempts {
            if n > 1 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match attempt().await {
                Ok(value) => {
                    if n > 1 {
                        debug!(service, attempt = n, "Upstream call recovered after retry");
                    }
                    return Ok((value, n));
                }
                Err(failure) => {
                    warn!(
                        service,
                        attempt = n,
                        max_attempts,
                        status = ?failure.status,
                        error = %failure,
                        "Upstream attempt failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        Err(NotifierError::Upstream {
            service: service.to_string(),
            attempts: max_attempts,
            message: last_failure.map(|f| f.message).unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
