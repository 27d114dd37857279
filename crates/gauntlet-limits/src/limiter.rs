// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async admission gate over the sliding quota windows.
//!
//! One `RateLimiter` instance guards all backend traffic for a process;
//! callers hold it behind an `Arc` and every admission check serializes on
//! the internal mutex. A request that cannot be admitted yet parks on a
//! bounded sleep and re-checks, so no admissible request is ever dropped.

use std::time::Duration;

use gauntlet_core::GauntletError;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::window::{Admission, QuotaLimits, QuotaUsage, SlidingWindow};

/// Floor on re-check sleeps to avoid busy-spinning on boundary instants.
const MIN_SLEEP: Duration = Duration::from_millis(50);

/// Sliding-window admission control shared by all stage attempts.
pub struct RateLimiter {
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    pub fn new(limits: QuotaLimits) -> Self {
        debug!(
            rpm = limits.rpm,
            tpm = limits.tpm,
            rpd = limits.rpd,
            "rate limiter initialized"
        );
        Self {
            window: Mutex::new(SlidingWindow::new(limits)),
        }
    }

    /// Block until all three quota dimensions admit a request estimated at
    /// `estimated_tokens`, then charge the estimate.
    ///
    /// The charge happens at admission time and is not corrected from the
    /// real response afterwards. Daily-quota exhaustion fails instead of
    /// waiting: the wait would exceed any stage deadline.
    pub async fn acquire(&self, estimated_tokens: u64) -> Result<(), GauntletError> {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                match window.check(now, estimated_tokens) {
                    Admission::Admit => {
                        window.record(now, estimated_tokens);
                        debug!(usage = %window.usage(now), "request admitted");
                        return Ok(());
                    }
                    Admission::Wait(wait) => wait,
                    Admission::ExhaustedForDay { retry_after } => {
                        return Err(GauntletError::QuotaExhausted {
                            message: format!(
                                "daily request quota reached; window frees in {}s",
                                retry_after.as_secs()
                            ),
                        });
                    }
                }
            };

            warn!(
                wait_secs = wait.as_secs_f64(),
                "rate limit protection: waiting before next request"
            );
            tokio::time::sleep(wait.max(MIN_SLEEP)).await;
        }
    }

    /// Current usage snapshot for logging and reporting.
    pub async fn usage(&self) -> QuotaUsage {
        self.window.lock().await.usage(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(rpm: u32) -> QuotaLimits {
        QuotaLimits {
            rpm,
            tpm: 1_000_000,
            rpd: 1500,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_admits_under_quota() {
        let limiter = RateLimiter::new(limits(10));
        for _ in 0..5 {
            limiter.acquire(1_000).await.unwrap();
        }
        let usage = limiter.usage().await;
        assert_eq!(usage.rpm.0, 5);
        assert_eq!(usage.tpm.0, 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_window_to_free() {
        let limiter = RateLimiter::new(limits(3));
        limiter.acquire(100).await.unwrap();
        limiter.acquire(100).await.unwrap();

        // Third acquire hits the one-below-ceiling threshold; with paused
        // time the sleep auto-advances the clock past the eviction instant.
        let before = Instant::now();
        limiter.acquire(100).await.unwrap();
        let waited = Instant::now().duration_since(before);
        assert!(
            waited >= Duration::from_secs(59),
            "expected ~60s wait, got {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_fails_when_daily_quota_exhausted() {
        let limiter = RateLimiter::new(QuotaLimits {
            rpm: 1_000,
            tpm: u64::MAX / 2,
            rpd: 2,
        });
        limiter.acquire(10).await.unwrap();
        limiter.acquire(10).await.unwrap();
        let err = limiter.acquire(10).await.unwrap_err();
        assert!(matches!(err, GauntletError::QuotaExhausted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn usage_reports_all_dimensions() {
        let limiter = RateLimiter::new(limits(10));
        limiter.acquire(2_500).await.unwrap();
        let usage = limiter.usage().await;
        assert_eq!(usage.rpm, (1, 10));
        assert_eq!(usage.tpm, (2_500, 1_000_000));
        assert_eq!(usage.rpd, (1, 1500));
    }
}
