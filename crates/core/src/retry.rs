//! Retry classification with an optional backoff hook
//!
//! Connection-level failures and 5xx responses are transient; everything
//! else is surfaced to the caller. The decision is a pure function of the
//! [`RetryContext`], so it can be tested without a network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happened on the attempt that just finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No HTTP response: DNS, connect, TLS, timeout or body read failure
    ConnectionFailure,
    /// An HTTP response arrived with this status
    Status(u16),
}

/// Input to [`RetryPolicy::should_retry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    /// 0-based index of the attempt that would be made next
    pub attempt: u32,
    /// Outcome of the previous attempt
    pub outcome: AttemptOutcome,
    /// Configured retry limit
    pub max_retries: u32,
}

/// Delay inserted between attempts
///
/// Never affects whether a retry happens, only when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// Constant delay
    Fixed { delay_ms: u64 },
    /// Exponential delay with jitter, capped at `max_ms`
    Exponential { initial_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Delay before the given retry (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { initial_ms, max_ms } => {
                // initial * 2^(retry-1)
                let base_ms = initial_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
                let capped_ms = base_ms.min(max_ms);
                Duration::from_millis(capped_ms + rand_jitter(capped_ms))
            }
        }
    }
}

/// Pseudo-random jitter in `[0, max)` without an RNG dependency
fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// Retry decision for one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// Build the context for the attempt following `previous_attempt`
    pub fn context(&self, previous_attempt: u32, outcome: AttemptOutcome) -> RetryContext {
        RetryContext {
            attempt: previous_attempt.saturating_add(1),
            outcome,
            max_retries: self.max_retries,
        }
    }

    /// Whether another attempt should be made
    pub fn should_retry(context: &RetryContext) -> bool {
        if context.attempt > context.max_retries {
            return false;
        }
        match context.outcome {
            AttemptOutcome::ConnectionFailure => true,
            AttemptOutcome::Status(status) => status >= 500,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Retry policy builder for easy customization
#[derive(Debug, Clone)]
pub struct RetryBuilder {
    max_retries: u32,
    backoff: Backoff,
}

impl RetryBuilder {
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::None,
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn fixed_backoff_ms(mut self, delay_ms: u64) -> Self {
        self.backoff = Backoff::Fixed { delay_ms };
        self
    }

    pub fn exponential_backoff_ms(mut self, initial_ms: u64, max_ms: u64) -> Self {
        self.backoff = Backoff::Exponential { initial_ms, max_ms };
        self
    }

    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.backoff,
        }
    }
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(attempt: u32, outcome: AttemptOutcome, max_retries: u32) -> RetryContext {
        RetryContext {
            attempt,
            outcome,
            max_retries,
        }
    }

    #[test]
    fn test_should_retry_table() {
        use AttemptOutcome::*;

        assert!(RetryPolicy::should_retry(&ctx(0, Status(503), 3)));
        assert!(!RetryPolicy::should_retry(&ctx(4, Status(503), 3)));
        assert!(!RetryPolicy::should_retry(&ctx(0, Status(404), 3)));
        assert!(RetryPolicy::should_retry(&ctx(0, ConnectionFailure, 3)));
    }

    #[test]
    fn test_should_retry_boundaries() {
        use AttemptOutcome::*;

        assert!(RetryPolicy::should_retry(&ctx(3, Status(500), 3)));
        assert!(RetryPolicy::should_retry(&ctx(3, Status(599), 3)));
        assert!(!RetryPolicy::should_retry(&ctx(4, ConnectionFailure, 3)));
        assert!(!RetryPolicy::should_retry(&ctx(1, ConnectionFailure, 0)));

        // 2xx, 3xx and 4xx are never retried
        for status in [200, 204, 304, 400, 403, 409, 499] {
            assert!(!RetryPolicy::should_retry(&ctx(0, Status(status), 3)));
        }
    }

    #[test]
    fn test_context_uses_next_attempt_index() {
        let policy = RetryPolicy::new(2);
        let c = policy.context(0, AttemptOutcome::Status(502));
        assert_eq!(c.attempt, 1);
        assert_eq!(c.max_retries, 2);
        assert!(RetryPolicy::should_retry(&c));
        assert!(RetryPolicy::should_retry(&policy.context(1, AttemptOutcome::Status(502))));
        assert!(!RetryPolicy::should_retry(&policy.context(2, AttemptOutcome::Status(502))));
    }

    #[test]
    fn test_context_saturates_at_max_attempt() {
        let policy = RetryPolicy::new(3);
        let ctx = policy.context(u32::MAX, AttemptOutcome::Status(503));
        assert_eq!(ctx.attempt, u32::MAX);
        assert!(!RetryPolicy::should_retry(&ctx));
    }

    #[test]
    fn test_backoff_none_and_fixed() {
        assert_eq!(Backoff::None.delay(1), Duration::ZERO);
        assert_eq!(
            Backoff::Fixed { delay_ms: 250 }.delay(5),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            initial_ms: 100,
            max_ms: 10000,
        };

        let b1 = backoff.delay(1);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 200);

        let b2 = backoff.delay(2);
        assert!(b2.as_millis() >= 200 && b2.as_millis() < 400);

        let b3 = backoff.delay(3);
        assert!(b3.as_millis() >= 400 && b3.as_millis() < 800);
    }

    #[test]
    fn test_exponential_backoff_cap() {
        let backoff = Backoff::Exponential {
            initial_ms: 1000,
            max_ms: 5000,
        };
        assert!(backoff.delay(10).as_millis() < 10000);
    }

    #[test]
    fn test_retry_builder() {
        let policy = RetryBuilder::new()
            .max_retries(5)
            .exponential_backoff_ms(200, 20000)
            .build();

        assert_eq!(policy.max_retries, 5);
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                initial_ms: 200,
                max_ms: 20000
            }
        );
        assert_eq!(RetryBuilder::default().build(), RetryPolicy::default());
    }
}
