// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the sliding quota windows.
//!
//! Drives the window with randomized admission sequences on a simulated
//! clock and checks the ceiling invariants over every trailing window.

use std::time::Duration;

use gauntlet_limits::window::{Admission, QuotaLimits, SlidingWindow, DAY_WINDOW, MINUTE_WINDOW};
use proptest::prelude::*;
use tokio::time::Instant;

/// One randomized admission request: a clock advance and a token estimate.
#[derive(Debug, Clone)]
struct Step {
    advance: Duration,
    tokens: u64,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (0u64..90_000, 0u64..120_000).prop_map(|(advance_ms, tokens)| Step {
        advance: Duration::from_millis(advance_ms),
        tokens,
    })
}

proptest! {
    /// The number of admitted events and their token sum within any trailing
    /// window never exceed the configured ceilings, for arbitrary request
    /// sequences with arbitrary costs.
    #[test]
    fn admitted_events_never_exceed_ceilings(
        steps in prop::collection::vec(step_strategy(), 1..200),
        rpm in 1u32..20,
        tpm in 10_000u64..500_000,
        rpd in 1u32..50,
    ) {
        let limits = QuotaLimits { rpm, tpm, rpd };
        let mut window = SlidingWindow::new(limits);
        let start = Instant::now();
        let mut now = start;

        // Shadow log of every admitted event, independent of the window's
        // own eviction, so invariants are checked against ground truth.
        let mut admitted: Vec<(Instant, u64)> = Vec::new();

        for step in steps {
            now += step.advance;
            if let Admission::Admit = window.check(now, step.tokens) {
                window.record(now, step.tokens);
                admitted.push((now, step.tokens));

                let in_minute: Vec<_> = admitted
                    .iter()
                    .filter(|(at, _)| now.duration_since(*at) < MINUTE_WINDOW)
                    .collect();
                let in_day: Vec<_> = admitted
                    .iter()
                    .filter(|(at, _)| now.duration_since(*at) < DAY_WINDOW)
                    .collect();

                prop_assert!(
                    in_minute.len() as u32 <= rpm,
                    "RPM ceiling violated: {} > {}",
                    in_minute.len(),
                    rpm
                );
                // The token ceiling can only be broken by multiple events;
                // a single oversized estimate on an empty window is always
                // admitted rather than deadlocking.
                if in_minute.len() > 1 {
                    let token_sum: u64 = in_minute.iter().map(|(_, t)| *t).sum();
                    prop_assert!(
                        token_sum <= tpm,
                        "TPM ceiling violated: {} > {}",
                        token_sum,
                        tpm
                    );
                }
                prop_assert!(
                    in_day.len() as u32 <= rpd,
                    "RPD ceiling violated: {} > {}",
                    in_day.len(),
                    rpd
                );
            }
        }
    }

    /// A denial at time T reports a wait no longer than the oldest event's
    /// age-out, and the same request is admissible once that wait elapses
    /// (unless the daily ceiling is the blocker).
    #[test]
    fn reported_wait_is_sufficient(
        steps in prop::collection::vec(step_strategy(), 1..100),
        rpm in 1u32..10,
    ) {
        let limits = QuotaLimits { rpm, tpm: 200_000, rpd: 10_000 };
        let mut window = SlidingWindow::new(limits);
        let mut now = Instant::now();

        for step in steps {
            now += step.advance;
            match window.check(now, step.tokens) {
                Admission::Admit => window.record(now, step.tokens),
                Admission::Wait(wait) => {
                    prop_assert!(wait <= MINUTE_WINDOW, "wait longer than the window itself");
                    let later = now + wait;
                    // After the reported wait the blocking event has aged
                    // out; the request is admitted or a later event blocks
                    // with a strictly shorter remaining wait.
                    match window.check(later, step.tokens) {
                        Admission::Admit => {}
                        Admission::Wait(next_wait) => {
                            prop_assert!(next_wait <= MINUTE_WINDOW - wait);
                        }
                        Admission::ExhaustedForDay { .. } => {
                            prop_assert!(false, "daily ceiling unexpectedly reached");
                        }
                    }
                }
                Admission::ExhaustedForDay { .. } => {
                    prop_assert!(false, "daily ceiling unexpectedly reached");
                }
            }
        }
    }
}
