//! Centralized constants for relay defaults.
//!
//! All magic numbers in the crate should be defined here with
//! documented rationale. This enables:
//! - Consistent defaults across modules
//! - Easy tuning without code search

/// Consecutive failures before the relay opens.
/// Rationale: 5 consecutive failures indicates a real problem, not transient.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open relay admits a trial call (30 seconds).
/// Rationale: long enough to allow transient issues to resolve.
pub const DEFAULT_COOL_DOWN_SECS: u64 = 30;
