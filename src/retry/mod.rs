//! Retry classification and backoff policy
//!
//! This module decides what happens after one network attempt:
//! - classify the outcome as success, retryable failure, or terminal failure
//! - compute the backoff delay for the next attempt
//! - enforce the attempt budget
//!
//! The policy itself has no side effects. The resolve and fetch stages own
//! their retry loops and call into the policy between attempts.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

/// Result of a single network attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// The attempt succeeded with a payload
    Success(T),

    /// The attempt failed in a way worth retrying (timeout, connection
    /// failure, HTTP 5xx, HTTP 429)
    Retryable {
        /// Human-readable failure reason, recorded if the budget runs out
        reason: String,
        /// Server-requested delay from a Retry-After header, if present
        retry_after: Option<Duration>,
    },

    /// The attempt failed permanently (other HTTP 4xx, malformed response,
    /// non-retryable transport error)
    Terminal {
        /// Human-readable failure reason, recorded on the item
        reason: String,
    },
}

/// Backoff policy for retryable failures
///
/// The delay for attempt `n` (1-based) is `base_delay * 2^(n-1)` plus a
/// uniform jitter of up to half that step, capped at `max_delay`. A
/// server-provided Retry-After value takes precedence over the computed
/// delay but is still capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per operation (first try included)
    pub max_attempts: u32,

    /// Base delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from explicit bounds
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Returns true if another attempt is allowed after `attempts_made`
    /// attempts have already run
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Computes the delay to sleep before the attempt following `attempt`
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(after) = retry_after {
            return after.min(self.max_delay);
        }

        // Shift capped so pathological attempt counts cannot overflow
        let exponent = attempt.saturating_sub(1).min(16);
        let step = self.base_delay.saturating_mul(1u32 << exponent);

        let half_step_ms = (step.as_millis() as u64) / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half_step_ms);

        (step + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }
}

/// Returns true if an HTTP status code is worth retrying
///
/// Retryable: 429 (rate limited) and all 5xx. Everything else that is not a
/// success is terminal.
pub fn retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Classifies a transport-level request error
///
/// Timeouts and connection failures (refused, reset, DNS) are retryable.
/// Redirect-policy violations and everything else are terminal.
pub fn classify_request_error<T>(error: &reqwest::Error) -> AttemptOutcome<T> {
    if error.is_timeout() {
        AttemptOutcome::Retryable {
            reason: "request timed out".to_string(),
            retry_after: None,
        }
    } else if error.is_connect() {
        AttemptOutcome::Retryable {
            reason: format!("connection failed: {}", error),
            retry_after: None,
        }
    } else if error.is_redirect() {
        AttemptOutcome::Terminal {
            reason: "redirect chain too long or looping".to_string(),
        }
    } else {
        AttemptOutcome::Terminal {
            reason: error.to_string(),
        }
    }
}

/// Parses a Retry-After header value into a wait duration
///
/// Accepts both forms from RFC 9110: an integer number of seconds, or an
/// HTTP-date. A date in the past yields a zero duration. Unparseable values
/// yield None and the caller falls back to computed backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().map(Duration::from_secs);
    }

    let date: DateTime<chrono::FixedOffset> = DateTime::parse_from_rfc2822(value).ok()?;
    let delta_ms = (date.with_timezone(&Utc) - Utc::now()).num_milliseconds();
    Some(Duration::from_millis(delta_ms.max(0) as u64))
}
