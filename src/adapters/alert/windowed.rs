//! Rolling-window alert threshold
//!
//! Counts failures over a sliding window and only forwards to the inner
//! notifier once the count exceeds the threshold. After notifying, further
//! failures in the same window are counted but not forwarded.

use super::{AlertSink, FailureReport};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Window and threshold for [`WindowedAlertSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub window: Duration,
    /// Notify when the count inside the window is strictly greater than this
    pub threshold: u32,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(300),
            threshold: 0,
        }
    }
}

#[derive(Debug, Default)]
struct WindowState {
    failures: VecDeque<Instant>,
    last_notified: Option<Instant>,
}

/// Forwards to `inner` when the failure count in the window crosses the threshold
pub struct WindowedAlertSink<S> {
    inner: S,
    policy: AlertPolicy,
    state: Mutex<WindowState>,
}

impl<S: AlertSink> WindowedAlertSink<S> {
    pub fn new(inner: S, policy: AlertPolicy) -> Self {
        Self {
            inner,
            policy,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Failures recorded inside the current window
    pub fn failures_in_window(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        evict(&mut state.failures, now, self.policy.window);
        state.failures.len()
    }

    /// Record a failure and decide whether to notify
    fn record(&self) -> Option<usize> {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());

        state.failures.push_back(now);
        evict(&mut state.failures, now, self.policy.window);

        let count = state.failures.len();
        let over_threshold = count > self.policy.threshold as usize;
        let quiet = state
            .last_notified
            .map_or(true, |at| now.duration_since(at) >= self.policy.window);

        if over_threshold && quiet {
            state.last_notified = Some(now);
            Some(count)
        } else {
            None
        }
    }
}

fn evict(failures: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = failures.front() {
        if now.duration_since(*oldest) >= window {
            failures.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl<S: AlertSink> AlertSink for WindowedAlertSink<S> {
    async fn report(&self, report: &FailureReport) -> Result<()> {
        match self.record() {
            Some(count) => {
                tracing::info!(
                    failures_in_window = count,
                    window_seconds = self.policy.window.as_secs(),
                    threshold = self.policy.threshold,
                    "Failure threshold exceeded, notifying"
                );
                self.inner.report(report).await
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureKind, InvocationId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl AlertSink for Counting {
        async fn report(&self, _report: &FailureReport) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn report() -> FailureReport {
        FailureReport::new(FailureKind::Fetch, "a.hl7", "gone", InvocationId::generate())
    }

    fn policy(window_secs: u64, threshold: u32) -> AlertPolicy {
        AlertPolicy {
            window: Duration::from_secs(window_secs),
            threshold,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_threshold_notifies_on_first_failure() {
        let counter = Counting::default();
        let sink = WindowedAlertSink::new(counter.clone(), policy(300, 0));

        sink.report(&report()).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifies_once_per_window() {
        let counter = Counting::default();
        let sink = WindowedAlertSink::new(counter.clone(), policy(300, 0));

        for _ in 0..5 {
            sink.report(&report()).await.unwrap();
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(sink.failures_in_window(), 5);

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(sink.failures_in_window(), 0);

        sink.report(&report()).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_must_be_exceeded() {
        let counter = Counting::default();
        let sink = WindowedAlertSink::new(counter.clone(), policy(60, 2));

        sink.report(&report()).await.unwrap();
        sink.report(&report()).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        sink.report(&report()).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_failures_leave_the_window() {
        let counter = Counting::default();
        let sink = WindowedAlertSink::new(counter.clone(), policy(60, 1));

        sink.report(&report()).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        sink.report(&report()).await.unwrap();

        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        assert_eq!(sink.failures_in_window(), 1);
    }
}
