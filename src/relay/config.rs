//! Relay configuration.
//!
//! Defines the failure threshold, cooldown and optional execution timeout
//! for a relay instance.

use crate::constants;
use std::time::Duration;

/// Relay configuration.
///
/// Immutable after construction; every field has a default suitable for
/// guarding a typical remote dependency.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Number of consecutive failures before the relay opens.
    pub failure_threshold: u32,
    /// How long an open relay waits before admitting a trial call.
    pub cool_down_period: Duration,
    /// Upper bound on a single admitted call. `None` disables the timeout
    /// race and the relay awaits the operation indefinitely.
    pub execution_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            failure_threshold: constants::DEFAULT_FAILURE_THRESHOLD,
            cool_down_period: Duration::from_secs(constants::DEFAULT_COOL_DOWN_SECS),
            execution_timeout: None,
        }
    }
}

impl RelayConfig {
    /// Create a configuration with an explicit threshold and cooldown.
    ///
    /// A zero threshold is clamped to 1; a relay that opened before its
    /// first failure would never admit anything.
    pub fn new(failure_threshold: u32, cool_down_period: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cool_down_period,
            execution_timeout: None,
        }
    }

    /// Set an execution timeout for every admitted call.
    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }
}
