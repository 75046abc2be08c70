//! Relay call accounting.
//!
//! Monotonic totals kept on independent atomics so reading them never
//! blocks the admission path. Under contention a snapshot may be a call
//! ahead of the mutex-guarded record, which is acceptable for
//! observability data.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

use super::state::RelayState;

/// Point-in-time snapshot of a relay's accounting.
#[derive(Debug, Clone, Copy)]
pub struct RelayMetrics {
    /// Effective state at snapshot time.
    pub state: RelayState,
    /// Current consecutive-failure count.
    pub failure_count: u32,
    /// When the most recent failure was recorded; `None` until the first.
    pub last_failure_time: Option<Instant>,
    /// Every `run` invocation, admitted or not.
    pub total_calls: u64,
    /// Calls that completed successfully.
    pub total_successes: u64,
    /// Calls recorded against the threshold, timeouts included.
    pub total_failures: u64,
    /// The subset of failures that lost the timeout race.
    pub total_timeouts: u64,
    /// Calls rejected while the relay was open.
    pub total_rejections: u64,
}

/// Counter block owned by the relay.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    rejections: AtomicU64,
}

impl Counters {
    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        state: RelayState,
        failure_count: u32,
        last_failure_time: Option<Instant>,
    ) -> RelayMetrics {
        RelayMetrics {
            state,
            failure_count,
            last_failure_time,
            total_calls: self.calls.load(Ordering::Relaxed),
            total_successes: self.successes.load(Ordering::Relaxed),
            total_failures: self.failures.load(Ordering::Relaxed),
            total_timeouts: self.timeouts.load(Ordering::Relaxed),
            total_rejections: self.rejections.load(Ordering::Relaxed),
        }
    }
}
