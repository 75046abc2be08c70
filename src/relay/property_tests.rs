//! Property-based tests for the relay state machine.
//!
//! These use proptest to verify invariants that must hold for every
//! sequence of outcomes, regardless of timing. This catches edge cases
//! that example-based tests miss.
//!
//! Run with:
//! ```bash
//! cargo test --lib relay::property_tests
//! ```

use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

use super::state::{Record, RelayState};

// ============================================================================
// Test Helpers - Strategies
// ============================================================================

/// One outcome event, with the simulated time that passes before it.
#[derive(Debug, Clone, Copy)]
enum Event {
    Success { advance_ms: u64 },
    Failure { advance_ms: u64 },
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0u64..10_000).prop_map(|advance_ms| Event::Success { advance_ms }),
        (0u64..10_000).prop_map(|advance_ms| Event::Failure { advance_ms }),
    ]
}

fn event_sequence() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(event(), 0..64)
}

/// Apply one event the way the execution guard does: derive, transition.
fn apply(record: &mut Record, now: Instant, cool_down: Duration, threshold: u32, event: Event) {
    let effective = record.effective_state(now, cool_down);
    match event {
        Event::Success { .. } => record.on_success(effective),
        Event::Failure { .. } => record.on_failure(now, effective, threshold),
    }
}

// ============================================================================
// Invariant Properties
// ============================================================================

proptest! {
    /// A positive failure count always comes with a failure timestamp.
    #[test]
    fn prop_failure_count_implies_failure_time(
        events in event_sequence(),
        threshold in 1u32..10,
        cool_down_ms in 0u64..60_000,
    ) {
        let cool_down = Duration::from_millis(cool_down_ms);
        let mut record = Record::new();
        let mut now = Instant::now();

        for event in events {
            let advance = match event {
                Event::Success { advance_ms } | Event::Failure { advance_ms } => advance_ms,
            };
            now += Duration::from_millis(advance);
            apply(&mut record, now, cool_down, threshold, event);

            if record.failure_count > 0 {
                prop_assert!(record.last_failure_time.is_some());
            }
        }
    }

    /// An open relay always carries at least a threshold of failures;
    /// the counter never resets without closing.
    #[test]
    fn prop_open_implies_threshold_reached(
        events in event_sequence(),
        threshold in 1u32..10,
        cool_down_ms in 0u64..60_000,
    ) {
        let cool_down = Duration::from_millis(cool_down_ms);
        let mut record = Record::new();
        let mut now = Instant::now();

        for event in events {
            let advance = match event {
                Event::Success { advance_ms } | Event::Failure { advance_ms } => advance_ms,
            };
            now += Duration::from_millis(advance);
            apply(&mut record, now, cool_down, threshold, event);

            if record.explicit_open {
                prop_assert!(record.failure_count >= threshold);
            }
        }
    }

    /// Derivation is a pure function of the record and the clock: reading
    /// repeatedly changes nothing and always agrees with itself.
    #[test]
    fn prop_derivation_is_pure(
        events in event_sequence(),
        threshold in 1u32..10,
        cool_down_ms in 0u64..60_000,
        read_ahead_ms in 0u64..120_000,
    ) {
        let cool_down = Duration::from_millis(cool_down_ms);
        let mut record = Record::new();
        let mut now = Instant::now();

        for event in events {
            let advance = match event {
                Event::Success { advance_ms } | Event::Failure { advance_ms } => advance_ms,
            };
            now += Duration::from_millis(advance);
            apply(&mut record, now, cool_down, threshold, event);
        }

        let read_at = now + Duration::from_millis(read_ahead_ms);
        let before = (record.explicit_open, record.failure_count, record.last_failure_time);
        let first = record.effective_state(read_at, cool_down);
        let second = record.effective_state(read_at, cool_down);
        let after = (record.explicit_open, record.failure_count, record.last_failure_time);

        prop_assert_eq!(first, second);
        prop_assert_eq!(before, after);
    }

    /// The derived state agrees with the definition: closed iff not
    /// explicitly open, and the open view ends exactly with the cooldown.
    #[test]
    fn prop_derivation_matches_definition(
        events in event_sequence(),
        threshold in 1u32..10,
        cool_down_ms in 1u64..60_000,
        read_ahead_ms in 0u64..120_000,
    ) {
        let cool_down = Duration::from_millis(cool_down_ms);
        let mut record = Record::new();
        let mut now = Instant::now();

        for event in events {
            let advance = match event {
                Event::Success { advance_ms } | Event::Failure { advance_ms } => advance_ms,
            };
            now += Duration::from_millis(advance);
            apply(&mut record, now, cool_down, threshold, event);
        }

        let read_at = now + Duration::from_millis(read_ahead_ms);
        let state = record.effective_state(read_at, cool_down);

        match state {
            RelayState::Closed => prop_assert!(!record.explicit_open),
            RelayState::Open => {
                let failed_at = record.last_failure_time.expect("open requires a failure");
                prop_assert!(read_at.duration_since(failed_at) < cool_down);
            }
            RelayState::HalfOpen => {
                prop_assert!(record.explicit_open);
                let failed_at = record.last_failure_time.expect("open requires a failure");
                prop_assert!(read_at.duration_since(failed_at) >= cool_down);
            }
        }
    }

    /// A success while closed always clears the streak completely.
    #[test]
    fn prop_success_clears_closed_streak(
        failures in 0u32..20,
        threshold in 5u32..10,
    ) {
        let cool_down = Duration::from_secs(30);
        let mut record = Record::new();
        let now = Instant::now();

        for _ in 0..failures.min(threshold - 1) {
            let effective = record.effective_state(now, cool_down);
            record.on_failure(now, effective, threshold);
        }
        prop_assert!(!record.explicit_open);

        let effective = record.effective_state(now, cool_down);
        record.on_success(effective);
        prop_assert_eq!(record.failure_count, 0);
        prop_assert!(!record.explicit_open);
    }
}
