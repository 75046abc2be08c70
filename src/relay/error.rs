//! Relay error types.
//!
//! The three kinds a caller can observe from [`Relay::run`]: admission
//! refused, execution timed out, or the operation's own error surfaced
//! unchanged.
//!
//! [`Relay::run`]: crate::relay::Relay::run

use std::time::Duration;
use thiserror::Error;

/// Error returned by a guarded call.
#[derive(Debug, Error)]
pub enum RelayError<E> {
    /// The relay is open; the call was rejected without invoking the
    /// operation.
    #[error("relay is open, call was not attempted")]
    Open,

    /// The execution timer elapsed before the operation settled. Counts
    /// as a failure toward the threshold.
    #[error("execution timed out after {timeout:?}")]
    Timeout {
        /// The configured execution timeout that elapsed.
        timeout: Duration,
    },

    /// The wrapped operation failed; the original error, unchanged.
    #[error(transparent)]
    Inner(E),
}

impl<E> RelayError<E> {
    /// True when the call was rejected without the operation running.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// True when the timeout race was lost.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The operation's own error, if that is what this is.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(inner) => Some(inner),
            Self::Open | Self::Timeout { .. } => None,
        }
    }
}
