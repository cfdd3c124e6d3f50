//! Command Polling
//!
//! Live-response commands complete asynchronously on the platform side.
//! A bounded fixed-interval poll decides when to stop waiting; there is no
//! backoff and no cancellation of the remote command.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Fixed-budget poll over an async completion probe.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    /// Run `probe` until it reports completion or the attempt budget is
    /// spent. Returns on the first completed observation. A probe error
    /// counts as an unfinished attempt.
    pub async fn run<F, Fut>(&self, mut probe: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        for attempt in 1..=self.max_attempts {
            match probe().await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => warn!(attempt, error = %e, "Completion probe failed"),
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_stops_on_first_complete() {
        let calls = Cell::new(0u32);
        let done = fast(5)
            .run(|| {
                calls.set(calls.get() + 1);
                let complete = calls.get() >= 3;
                async move { Ok(complete) }
            })
            .await;

        assert!(done);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempt_budget() {
        let calls = Cell::new(0u32);
        let done = fast(5)
            .run(|| {
                calls.set(calls.get() + 1);
                async { Ok(false) }
            })
            .await;

        assert!(!done);
        assert_eq!(calls.get(), 5);
    }

    #[tokio::test]
    async fn test_probe_error_counts_as_attempt() {
        let calls = Cell::new(0u32);
        let done = fast(3)
            .run(|| {
                calls.set(calls.get() + 1);
                async { anyhow::bail!("connection reset") }
            })
            .await;

        assert!(!done);
        assert_eq!(calls.get(), 3);
    }
}
