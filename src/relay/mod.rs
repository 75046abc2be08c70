//! Relay core: the state machine and execution guard.
//!
//! A relay wraps calls to a potentially-failing async operation and stops
//! invoking it once it has failed too often, giving the dependency time to
//! recover before probing it again.
//!
//! ## States
//!
//! - **Closed**: normal operation, calls admitted
//! - **Open**: too many consecutive failures, calls rejected immediately
//! - **`HalfOpen`**: cooldown elapsed, calls admitted as trials
//!
//! ## State Transitions
//!
//! ```text
//! Closed → Open: failure_count reaches failure_threshold
//! Open → Half-Open: cool_down_period elapses (derived from the clock,
//!                   no timer fires; reading state never mutates it)
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails (immediately, below threshold too)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay::{Relay, RelayConfig};
//! use std::time::Duration;
//!
//! let relay = Relay::with_config(RelayConfig {
//!     failure_threshold: 3,
//!     cool_down_period: Duration::from_secs(30),
//!     ..Default::default()
//! });
//!
//! let reply = relay.run(|| client.get("/health")).await?;
//! ```

mod config;
mod error;
mod metrics;
mod state;


#[cfg(test)]
mod property_tests;

pub use config::RelayConfig;
pub use error::RelayError;
pub use metrics::RelayMetrics;
pub use state::RelayState;

use metrics::Counters;
use state::Record;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Failure-isolation guard for one unreliable dependency.
///
/// Thread-safe; share one instance across call sites behind an `Arc`. The
/// persisted counters are the only shared mutable state, and every
/// transition is performed under a single mutex so overlapping calls can
/// never observe a torn record. The wrapped operations themselves are not
/// serialized against each other.
pub struct Relay {
    config: RelayConfig,
    record: Mutex<Record>,
    counters: Counters,
}

impl Relay {
    /// Create a relay with default configuration.
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    /// Create a relay with custom configuration.
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            config,
            record: Mutex::new(Record::new()),
            counters: Counters::default(),
        }
    }

    /// The configuration this relay was constructed with.
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run one admission-check-then-invoke cycle.
    ///
    /// While the relay is open the operation is **not invoked** - no side
    /// effect, no timer, no counter change - and [`RelayError::Open`] is
    /// returned immediately. Otherwise the operation runs; with an
    /// `execution_timeout` configured it races a one-shot timer, and
    /// losing that race counts as a failure.
    ///
    /// On success the result is returned unchanged; on failure the
    /// original error propagates as a transparent [`RelayError::Inner`],
    /// so the caller cannot distinguish "threshold crossed on this call"
    /// from "already failing" except via the distinct `Open` kind.
    ///
    /// When the timer wins the race the operation's future is dropped at
    /// its next await point. Work the operation already handed off
    /// elsewhere (spawned tasks, in-flight requests) keeps running
    /// unobserved and its eventual outcome is discarded - a resource risk
    /// for operations that cannot be cancelled. The timer itself is owned
    /// by the race and released as soon as the call settles.
    ///
    /// Overlapping calls admitted while `HalfOpen` are all trials; trial
    /// calls are not single-flighted.
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, RelayError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.counters.record_call();

        {
            let record = self.record.lock();
            let effective = record.effective_state(Instant::now(), self.config.cool_down_period);
            if effective == RelayState::Open {
                let failures = record.failure_count;
                drop(record);
                self.counters.record_rejection();
                debug!(failures, "relay open, rejecting call");
                return Err(RelayError::Open);
            }
        }

        let outcome = match self.config.execution_timeout {
            None => operation().await.map_err(RelayError::Inner),
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(result) => result.map_err(RelayError::Inner),
                Err(_elapsed) => Err(RelayError::Timeout { timeout: limit }),
            },
        };

        match &outcome {
            Ok(_) => self.record_success(),
            Err(RelayError::Timeout { .. }) => {
                self.counters.record_timeout();
                self.record_failure();
            },
            Err(_) => self.record_failure(),
        }

        outcome
    }

    /// Effective state at the current time.
    ///
    /// Derived from the persisted record and the clock; repeated reads
    /// never mutate anything.
    pub fn state(&self) -> RelayState {
        self.record
            .lock()
            .effective_state(Instant::now(), self.config.cool_down_period)
    }

    /// When the most recent failure was recorded; `None` until the first.
    pub fn last_failure_time(&self) -> Option<Instant> {
        self.record.lock().last_failure_time
    }

    /// Current consecutive-failure count.
    pub fn failure_count(&self) -> u32 {
        self.record.lock().failure_count
    }

    /// Snapshot of the relay's accounting.
    pub fn metrics(&self) -> RelayMetrics {
        let (state, failure_count, last_failure_time) = {
            let record = self.record.lock();
            (
                record.effective_state(Instant::now(), self.config.cool_down_period),
                record.failure_count,
                record.last_failure_time,
            )
        };
        self.counters.snapshot(state, failure_count, last_failure_time)
    }

    /// Force the relay back to closed with zeroed counters.
    ///
    /// The monotonic totals in [`RelayMetrics`] are not reset.
    pub fn reset(&self) {
        *self.record.lock() = Record::new();
        info!("relay manually reset to closed");
    }

    /// Explicit release point for deterministic discard.
    ///
    /// The execution timer is owned by each in-flight `run` future and
    /// released when that future settles or is dropped, so there is
    /// nothing held by the instance itself.
    pub fn cleanup(&self) {
        debug!("relay cleanup requested; no pending timers are held");
    }

    /// Record a successful call against the state machine.
    fn record_success(&self) {
        self.counters.record_success();

        let now = Instant::now();
        let mut record = self.record.lock();
        let effective = record.effective_state(now, self.config.cool_down_period);
        record.on_success(effective);
        drop(record);

        match effective {
            RelayState::HalfOpen => info!("relay closing after successful trial call"),
            RelayState::Open => warn!("success recorded while relay open, ignoring"),
            RelayState::Closed => {},
        }
    }

    /// Record a failed call against the state machine.
    fn record_failure(&self) {
        self.counters.record_failure();

        let now = Instant::now();
        let mut record = self.record.lock();
        let effective = record.effective_state(now, self.config.cool_down_period);
        let was_open = record.explicit_open;
        record.on_failure(now, effective, self.config.failure_threshold);
        let failures = record.failure_count;
        let now_open = record.explicit_open;
        drop(record);

        if effective == RelayState::HalfOpen {
            warn!("relay reopening after failed trial call");
        } else if now_open && !was_open {
            warn!(failures, "relay opened");
        } else {
            debug!(
                failures,
                threshold = self.config.failure_threshold,
                "failure recorded"
            );
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
