//! Bounded polling — how one client observes the other.
//!
//! There is no reliable push channel between the two clients, so every
//! "wait for the opponent" behavior in the engine is a fixed-interval
//! poll with an explicit attempt ceiling. Reaching the ceiling yields
//! `Ok(None)` — a normal outcome the caller degrades from, not an error.
//!
//! Checks must be idempotent reads with no side effects: they may run
//! many times before succeeding or expiring.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

/// Polls `check` every `interval` until it yields a value or
/// `max_attempts` checks have run.
///
/// Returns `Ok(Some(value))` as soon as a check succeeds, `Ok(None)`
/// when the ceiling is reached, and the first error a check produces.
/// No sleep follows the final attempt.
pub async fn poll_until<T, E, F, Fut>(
    mut check: F,
    interval: Duration,
    max_attempts: u32,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for attempt in 1..=max_attempts {
        if let Some(found) = check().await? {
            trace!(attempt, "poll condition met");
            return Ok(Some(found));
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    debug!(attempts = max_attempts, ?interval, "poll ceiling reached");
    Ok(None)
}

/// Number of attempts needed to cover `timeout` at `interval` spacing,
/// rounded up, never zero.
pub fn attempts_for(timeout: Duration, interval: Duration) -> u32 {
    let interval_ms = interval.as_millis().max(1);
    timeout.as_millis().div_ceil(interval_ms).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_poll_until_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<Option<u32>, Infallible> = poll_until(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(if n >= 3 { Some(n) } else { None }) }
            },
            Duration::from_millis(1),
            10,
        )
        .await;

        assert_eq!(result.unwrap(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_ceiling_yields_none() {
        let calls = AtomicU32::new(0);
        let result: Result<Option<()>, Infallible> = poll_until(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            },
            Duration::from_millis(1),
            4,
        )
        .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_poll_until_propagates_errors() {
        let result: Result<Option<()>, &str> = poll_until(
            || async { Err("store unreachable") },
            Duration::from_millis(1),
            10,
        )
        .await;

        assert_eq!(result.unwrap_err(), "store unreachable");
    }

    #[test]
    fn test_attempts_for_rounds_up() {
        assert_eq!(
            attempts_for(Duration::from_secs(30), Duration::from_secs(1)),
            30
        );
        assert_eq!(
            attempts_for(Duration::from_millis(2500), Duration::from_secs(1)),
            3
        );
        assert_eq!(
            attempts_for(Duration::from_millis(1), Duration::from_secs(1)),
            1
        );
        // Degenerate configs still make progress.
        assert_eq!(
            attempts_for(Duration::ZERO, Duration::from_secs(1)),
            1
        );
    }
}
