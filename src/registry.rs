//! Process-wide default relay registry.
//!
//! A single mutable slot holding an optional shared [`Relay`], so multiple
//! call sites can share one relay without passing it explicitly. Intended
//! lifecycle: initialized empty at process start, set once by startup
//! code, read by any number of call sites, cleared only in test teardown.
//! Pass the instance explicitly where feasible; the slot exists for call
//! sites where that is impractical.
//!
//! Replacement is atomic (last write wins) but no further coordination is
//! offered - this models a configuration step, not hot-path state.

use crate::relay::Relay;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

static DEFAULT_RELAY: RwLock<Option<Arc<Relay>>> = RwLock::new(None);

/// Error returned by [`get_default`] when no default relay was set.
#[derive(Debug, Clone, Error)]
#[error("no default relay set; call registry::set_default first or pass a relay explicitly")]
pub struct NoDefaultRelayError;

/// Replace the shared slot unconditionally.
pub fn set_default(relay: Arc<Relay>) {
    debug!("default relay set");
    *DEFAULT_RELAY.write() = Some(relay);
}

/// The current default relay.
pub fn get_default() -> Result<Arc<Relay>, NoDefaultRelayError> {
    DEFAULT_RELAY.read().clone().ok_or(NoDefaultRelayError)
}

/// Empty the shared slot.
pub fn clear_default() {
    debug!("default relay cleared");
    *DEFAULT_RELAY.write() = None;
}

/// Serializes tests that touch the process-wide slot.
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());
