//! Relay state machine.
//!
//! The relay persists three fields and derives its effective state from
//! them on every read:
//! - **Closed**: normal operation, calls admitted
//! - **Open**: too many failures, calls rejected
//! - **`HalfOpen`**: cooldown elapsed, the next call is a trial
//!
//! There is no background timer; the clock alone moves an open relay into
//! the `HalfOpen` view, so the observed state is always consistent with
//! elapsed time.

use std::time::Duration;
use tokio::time::Instant;

/// Effective relay state, derived from the persisted record and the
/// current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Calls are admitted; failures accumulate toward the threshold.
    Closed,
    /// Calls are rejected without invoking the operation.
    Open,
    /// Cooldown elapsed; calls are admitted as trials.
    HalfOpen,
}

impl RelayState {
    /// Lowercase name, for logs and diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted relay record.
///
/// Invariants:
/// - `failure_count > 0` implies `last_failure_time.is_some()`
/// - `explicit_open` implies `failure_count >= failure_threshold` (the
///   counter never resets without closing, so a forced reopen from a
///   failed trial preserves this)
#[derive(Debug, Clone)]
pub(crate) struct Record {
    /// True once the threshold was reached; cleared by a successful trial.
    pub(crate) explicit_open: bool,
    /// Consecutive-failure counter.
    pub(crate) failure_count: u32,
    /// When the most recent failure was recorded; `None` until the first.
    pub(crate) last_failure_time: Option<Instant>,
}

impl Record {
    pub(crate) const fn new() -> Self {
        Self {
            explicit_open: false,
            failure_count: 0,
            last_failure_time: None,
        }
    }

    /// Derive the effective state at `now`.
    ///
    /// Pure; reading never mutates the record.
    pub(crate) fn effective_state(&self, now: Instant, cool_down: Duration) -> RelayState {
        if !self.explicit_open {
            return RelayState::Closed;
        }
        match self.last_failure_time {
            // duration_since saturates to zero for instants in the future
            Some(failed_at) if now.duration_since(failed_at) < cool_down => RelayState::Open,
            _ => RelayState::HalfOpen,
        }
    }

    /// Record a successful call.
    ///
    /// `effective` is the state derived at outcome time. A success while
    /// `HalfOpen` is the recovery signal; a success while `Closed` clears
    /// the consecutive-failure streak. `last_failure_time` is untouched.
    pub(crate) fn on_success(&mut self, effective: RelayState) {
        match effective {
            RelayState::HalfOpen => {
                self.explicit_open = false;
                self.failure_count = 0;
            },
            RelayState::Closed => {
                self.failure_count = 0;
            },
            // A call admitted earlier can settle after a concurrent
            // failure re-opened the relay; its success is stale evidence.
            RelayState::Open => {},
        }
    }

    /// Record a failed call at `now`.
    ///
    /// A failed trial while `HalfOpen` reopens immediately regardless of
    /// the threshold and restarts the cooldown window. Otherwise the
    /// relay opens once the consecutive count reaches `threshold`.
    pub(crate) fn on_failure(&mut self, now: Instant, effective: RelayState, threshold: u32) {
        self.last_failure_time = Some(now);
        self.failure_count = self.failure_count.saturating_add(1);

        if effective == RelayState::HalfOpen || self.failure_count >= threshold {
            self.explicit_open = true;
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}
