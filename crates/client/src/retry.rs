//! Status-driven retry policies for the two outbound flows
//!
//! Each flow retries on exactly one HTTP status: sync requests on 429
//! (rate limiting, unbounded by choice) and state reports on 404 (the
//! account not yet provisioned remotely, bounded by a time window). Every
//! other non-success status is fatal to the current call.

use std::time::Duration;

use homegraph_domain::RetryTuning;
use rand::Rng;
use reqwest::StatusCode;

/// Decision for a single failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then retry.
    RetryAfter(Duration),
    /// Give up and surface the status to the caller.
    Stop,
}

/// How the delay before the next attempt is chosen.
#[derive(Debug, Clone)]
pub enum DelayPolicy {
    /// The same delay every time.
    Fixed(Duration),
    /// Uniformly random delay in `[min, max)`.
    UniformJitter { min: Duration, max: Duration },
}

impl DelayPolicy {
    /// Sample the next delay.
    pub fn sample(&self) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::UniformJitter { min, max } => {
                let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
                if hi <= lo {
                    return *min;
                }
                Duration::from_millis(rand::thread_rng().gen_range(lo..hi))
            }
        }
    }
}

/// Retry policy keyed on a single retryable status.
///
/// `max_elapsed: None` makes the policy unbounded: the caller keeps
/// retrying for as long as the remote keeps answering with the retryable
/// status. That is a deliberate choice for rate-limited sync requests,
/// not an accidental infinite loop; callers needing cancellation wrap the
/// flow externally.
#[derive(Debug, Clone)]
pub struct StatusRetryPolicy {
    retry_on: StatusCode,
    delay: DelayPolicy,
    max_elapsed: Option<Duration>,
}

impl StatusRetryPolicy {
    /// Policy for rate-limited sync requests: retry 429 forever with a
    /// randomized backoff.
    pub fn rate_limited(tuning: &RetryTuning) -> Self {
        Self {
            retry_on: StatusCode::TOO_MANY_REQUESTS,
            delay: DelayPolicy::UniformJitter {
                min: tuning.sync_backoff_min,
                max: tuning.sync_backoff_max,
            },
            max_elapsed: None,
        }
    }

    /// Policy for state reports against a not-yet-provisioned account:
    /// retry 404 with a fixed delay until the window closes.
    pub fn not_provisioned(tuning: &RetryTuning) -> Self {
        Self {
            retry_on: StatusCode::NOT_FOUND,
            delay: DelayPolicy::Fixed(tuning.report_retry_delay),
            max_elapsed: Some(tuning.report_retry_window),
        }
    }

    /// Decide what to do about a non-success `status` observed `elapsed`
    /// after the first attempt.
    pub fn decide(&self, status: StatusCode, elapsed: Duration) -> RetryDecision {
        if status != self.retry_on {
            return RetryDecision::Stop;
        }
        if let Some(window) = self.max_elapsed {
            if elapsed >= window {
                return RetryDecision::Stop;
            }
        }
        RetryDecision::RetryAfter(self.delay.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> RetryTuning {
        RetryTuning {
            sync_backoff_min: Duration::from_millis(5000),
            sync_backoff_max: Duration::from_millis(25000),
            report_retry_delay: Duration::from_millis(20000),
            report_retry_window: Duration::from_millis(60000),
        }
    }

    #[test]
    fn jitter_samples_stay_within_half_open_range() {
        let policy = DelayPolicy::UniformJitter {
            min: Duration::from_millis(5000),
            max: Duration::from_millis(25000),
        };

        for _ in 0..100 {
            let delay = policy.sample();
            assert!(delay >= Duration::from_millis(5000));
            assert!(delay < Duration::from_millis(25000));
        }
    }

    #[test]
    fn degenerate_jitter_range_falls_back_to_min() {
        let policy = DelayPolicy::UniformJitter {
            min: Duration::from_millis(10),
            max: Duration::from_millis(10),
        };
        assert_eq!(policy.sample(), Duration::from_millis(10));
    }

    #[test]
    fn rate_limited_policy_retries_429_regardless_of_elapsed() {
        let policy = StatusRetryPolicy::rate_limited(&tuning());

        let decision = policy.decide(StatusCode::TOO_MANY_REQUESTS, Duration::from_secs(86400));
        assert!(matches!(decision, RetryDecision::RetryAfter(_)));
    }

    #[test]
    fn rate_limited_policy_stops_on_other_statuses() {
        let policy = StatusRetryPolicy::rate_limited(&tuning());

        assert_eq!(
            policy.decide(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO),
            RetryDecision::Stop
        );
        assert_eq!(policy.decide(StatusCode::NOT_FOUND, Duration::ZERO), RetryDecision::Stop);
    }

    #[test]
    fn not_provisioned_policy_retries_404_inside_window() {
        let policy = StatusRetryPolicy::not_provisioned(&tuning());

        let decision = policy.decide(StatusCode::NOT_FOUND, Duration::from_millis(59000));
        assert_eq!(decision, RetryDecision::RetryAfter(Duration::from_millis(20000)));
    }

    #[test]
    fn not_provisioned_policy_stops_once_window_closes() {
        let policy = StatusRetryPolicy::not_provisioned(&tuning());

        assert_eq!(
            policy.decide(StatusCode::NOT_FOUND, Duration::from_millis(61000)),
            RetryDecision::Stop
        );
        assert_eq!(
            policy.decide(StatusCode::NOT_FOUND, Duration::from_millis(60000)),
            RetryDecision::Stop
        );
    }

    #[test]
    fn not_provisioned_policy_stops_on_other_statuses() {
        let policy = StatusRetryPolicy::not_provisioned(&tuning());

        assert_eq!(policy.decide(StatusCode::BAD_GATEWAY, Duration::ZERO), RetryDecision::Stop);
    }
}
