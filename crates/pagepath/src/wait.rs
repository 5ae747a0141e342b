//! Wait Mechanisms
//!
//! Bounded polling for content the page may still be rendering.
//!
//! A [`Poller`] runs one probe per tick, strictly one after another:
//!
//! ```text
//! deadline = start + timeout
//! loop {
//!     probe()            -> ready? return value
//!     now >= deadline?   -> return timed out
//!     sleep(min(interval, deadline - now))
//! }
//! ```
//!
//! Timing uses `tokio::time`, so tests may run it on a paused clock.

use crate::config::EngineOptions;
use crate::result::{PathError, PathResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult<T> {
    /// Probe result, `None` on timeout
    pub value: Option<T>,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes issued
    pub ticks: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

impl<T> WaitResult<T> {
    /// Whether the condition held before the deadline
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// Consume into the probe result
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// Cooperative fixed-interval poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
}

impl Poller {
    /// Create a poller; a zero interval is raised to 1ms
    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Poller configured from engine options
    #[must_use]
    pub fn from_options(options: &EngineOptions) -> Self {
        Self::new(options.timeout(), options.poll_interval())
    }

    /// Configured timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Configured interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `probe` until it yields a value or the timeout elapses.
    ///
    /// The probe is always issued at least once, and once more at the
    /// deadline. A probe error aborts the wait.
    pub async fn until<T, F, Fut>(
        &self,
        waited_for: impl Into<String>,
        mut probe: F,
    ) -> PathResult<WaitResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PathResult<Option<T>>>,
    {
        let waited_for = waited_for.into();
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut ticks = 0u32;

        loop {
            ticks += 1;
            if let Some(value) = probe().await? {
                return Ok(WaitResult {
                    value: Some(value),
                    elapsed: start.elapsed(),
                    ticks,
                    waited_for,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::trace!(%waited_for, ticks, "wait timed out");
                return Ok(WaitResult {
                    value: None,
                    elapsed: start.elapsed(),
                    ticks,
                    waited_for,
                });
            }

            tracing::trace!(%waited_for, tick = ticks, "condition not met, sleeping");
            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}

/// Wait for an async predicate to become true.
///
/// # Errors
///
/// Returns [`PathError::Timeout`] if the predicate is still false when the
/// timeout elapses, or the predicate's own error.
pub async fn wait_until<F, Fut>(predicate: F, options: &EngineOptions) -> PathResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PathResult<bool>>,
{
    let mut predicate = predicate;
    let result = Poller::from_options(options)
        .until("custom predicate", || {
            let check = predicate();
            async move { Ok::<_, PathError>(check.await?.then_some(())) }
        })
        .await?;

    if result.is_success() {
        Ok(())
    } else {
        Err(PathError::Timeout {
            ms: options.timeout_ms,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn poller() -> Poller {
        Poller::new(Duration::from_millis(2000), Duration::from_millis(500))
    }

    mod poller_tests {
        use super::*;

        #[test]
        fn test_zero_interval_is_raised() {
            let p = Poller::new(Duration::from_secs(1), Duration::ZERO);
            assert_eq!(p.interval(), Duration::from_millis(1));
        }

        #[test]
        fn test_from_options() {
            let p = Poller::from_options(&EngineOptions::new().with_timeout(750));
            assert_eq!(p.timeout(), Duration::from_millis(750));
            assert_eq!(p.interval(), Duration::from_millis(500));
        }

        #[tokio::test(start_paused = true)]
        async fn test_immediate_success() {
            let result = poller()
                .until("answer", || async { Ok(Some(42)) })
                .await
                .unwrap();
            assert!(result.is_success());
            assert_eq!(result.ticks, 1);
            assert_eq!(result.elapsed, Duration::ZERO);
            assert_eq!(result.into_value(), Some(42));
        }

        #[tokio::test(start_paused = true)]
        async fn test_success_on_third_tick() {
            let calls = AtomicU32::new(0);
            let result = poller()
                .until("third call", || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { Ok((n >= 3).then_some(n)) }
                })
                .await
                .unwrap();

            assert_eq!(result.value, Some(3));
            assert_eq!(result.ticks, 3);
            assert_eq!(result.elapsed, Duration::from_millis(1000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_is_bounded() {
            let result: WaitResult<()> = poller()
                .until("never", || async { Ok(None) })
                .await
                .unwrap();

            assert!(!result.is_success());
            // probes at 0, 500, 1000, 1500 and 2000ms
            assert_eq!(result.ticks, 5);
            assert_eq!(result.elapsed, Duration::from_millis(2000));
            assert_eq!(result.waited_for, "never");
        }

        #[tokio::test(start_paused = true)]
        async fn test_last_probe_lands_on_deadline() {
            let p = Poller::new(Duration::from_millis(700), Duration::from_millis(500));
            let result: WaitResult<()> = p.until("never", || async { Ok(None) }).await.unwrap();
            assert_eq!(result.ticks, 3);
            assert_eq!(result.elapsed, Duration::from_millis(700));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_probes_once() {
            let p = Poller::new(Duration::ZERO, Duration::from_millis(500));
            let result: WaitResult<()> = p.until("never", || async { Ok(None) }).await.unwrap();
            assert_eq!(result.ticks, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_probe_error_aborts() {
            let calls = AtomicU32::new(0);
            let err = poller()
                .until("failing", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<Option<()>, _>(PathError::driver("gone")) }
                })
                .await
                .unwrap_err();

            assert!(matches!(err, PathError::Driver { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    mod wait_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_ok() {
            let calls = AtomicU32::new(0);
            wait_until(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(n == 1) }
                },
                &EngineOptions::default(),
            )
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_timeout() {
            let err = wait_until(|| async { Ok(false) }, &EngineOptions::new().with_timeout(1000))
                .await
                .unwrap_err();
            assert!(matches!(err, PathError::Timeout { ms: 1000 }));
        }
    }
}
