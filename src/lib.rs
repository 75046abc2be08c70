// =============================================================================
// Lint Configuration
// =============================================================================

// Safety: nothing in this crate needs unsafe
#![deny(unsafe_code)]
// Correctness: Must handle all fallible operations
#![deny(unused_must_use)]
// Quality: Pedantic but pragmatic
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![allow(missing_debug_implementations)] // Guarded/fallback types hold user closures which lack Debug

// Allowed with documented reasons
#![allow(clippy::missing_errors_doc)] // Error returns self-documenting via type
#![allow(clippy::module_name_repetitions)] // e.g., relay::RelayConfig is clearer
#![allow(clippy::must_use_candidate)] // Not all returned values need annotation

//! relay - failure-isolation guard for unreliable operations.
//!
//! A relay wraps calls to a potentially-failing async operation (typically
//! a remote call) and stops invoking it once it has failed too often,
//! giving the dependency time to recover before probing it again. Callers
//! fail fast instead of piling up latency and errors.
//!
//! Recovery is purely time-based: after the cooldown elapses the next
//! call is admitted as a trial, and its outcome decides whether the relay
//! closes or reopens. No background timer runs; the observed state is
//! derived from the clock on every read.
//!
//! # Example
//!
//! ```
//! use relay::{Relay, RelayConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let relay = Relay::with_config(RelayConfig {
//!     failure_threshold: 3,
//!     cool_down_period: Duration::from_secs(30),
//!     ..Default::default()
//! });
//!
//! let reply = relay.run(|| async { Ok::<_, String>("pong") }).await;
//! assert_eq!(reply.unwrap(), "pong");
//! # }
//! ```
//!
//! The relay performs no retries and no health checks; retry and backoff
//! policy belong to the caller.

/// Relay core: the state machine and execution guard.
///
/// This module provides the [`Relay`] itself together with its
/// configuration, derived state, error and metrics types.
pub mod relay;

/// Declarative attachment for wrapping callables with a shared relay.
///
/// [`guard::Guarded`] binds a single callable; [`guard::GuardedSet`]
/// guards a registration list of named handlers with one relay.
pub mod guard;

/// Fallback dispatch: substitute a result when a guarded call fails.
///
/// Explicit handlers, lookup-by-name tables and lazily-built providers;
/// a fallback never masks the original error.
pub mod fallback;

/// Process-wide default relay registry.
///
/// A single slot so multiple call sites can share one relay without
/// passing it explicitly: [`registry::set_default`],
/// [`registry::get_default`], [`registry::clear_default`].
pub mod registry;

/// Centralized constants for relay defaults.
///
/// All magic numbers in the crate are defined here with documented
/// rationale.
pub mod constants;

pub use relay::{Relay, RelayConfig, RelayError, RelayMetrics, RelayState};
