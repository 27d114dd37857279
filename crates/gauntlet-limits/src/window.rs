// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window quota accounting over three independent dimensions.
//!
//! Tracks requests per minute, tokens per minute, and requests per day as
//! timestamped event sequences. Events older than their window are evicted
//! lazily on every check. Decisions are pure functions of the window state
//! and an explicit `now`, which keeps them deterministic under test.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Rolling window for the per-minute dimensions.
pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);

/// Rolling window for the per-day dimension.
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Requests held back below the RPM ceiling.
const RPM_HEADROOM: u32 = 1;

/// Tokens held back below the TPM ceiling.
const TPM_HEADROOM: u64 = 50_000;

/// Configured ceilings for the three quota dimensions.
#[derive(Debug, Clone, Copy)]
pub struct QuotaLimits {
    pub rpm: u32,
    pub tpm: u64,
    pub rpd: u32,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// All three dimensions have room.
    Admit,
    /// A minute-window dimension is blocking; re-check after this wait, the
    /// minimum time for the oldest blocking event to leave its window.
    Wait(Duration),
    /// The daily ceiling is reached. Terminal until the oldest daily event
    /// ages out of the 24-hour window.
    ExhaustedForDay { retry_after: Duration },
}

/// Point-in-time usage snapshot as `(current, limit)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct QuotaUsage {
    pub rpm: (u32, u32),
    pub tpm: (u64, u64),
    pub rpd: (u32, u32),
}

impl fmt::Display for QuotaUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn pct(current: u64, limit: u64) -> f64 {
            if limit == 0 {
                0.0
            } else {
                current as f64 / limit as f64 * 100.0
            }
        }
        write!(
            f,
            "RPM {}/{} ({:.1}%), TPM {}/{} ({:.1}%), RPD {}/{} ({:.1}%)",
            self.rpm.0,
            self.rpm.1,
            pct(u64::from(self.rpm.0), u64::from(self.rpm.1)),
            self.tpm.0,
            self.tpm.1,
            pct(self.tpm.0, self.tpm.1),
            self.rpd.0,
            self.rpd.1,
            pct(u64::from(self.rpd.0), u64::from(self.rpd.1)),
        )
    }
}

/// Event log for all three quota dimensions.
///
/// The minute deque serves both RPM and TPM; the day deque serves RPD.
#[derive(Debug)]
pub struct SlidingWindow {
    limits: QuotaLimits,
    minute: VecDeque<(Instant, u64)>,
    day: VecDeque<(Instant, u64)>,
}

impl SlidingWindow {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            minute: VecDeque::new(),
            day: VecDeque::new(),
        }
    }

    /// Drop events older than their window.
    fn evict(&mut self, now: Instant) {
        while let Some(&(at, _)) = self.minute.front() {
            if now.duration_since(at) >= MINUTE_WINDOW {
                self.minute.pop_front();
            } else {
                break;
            }
        }
        while let Some(&(at, _)) = self.day.front() {
            if now.duration_since(at) >= DAY_WINDOW {
                self.day.pop_front();
            } else {
                break;
            }
        }
    }

    fn tokens_in_minute(&self) -> u64 {
        self.minute.iter().map(|&(_, tokens)| tokens).sum()
    }

    /// Time until the oldest event in `events` leaves `window`.
    fn age_out(events: &VecDeque<(Instant, u64)>, window: Duration, now: Instant) -> Duration {
        match events.front() {
            Some(&(at, _)) => (at + window).duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Decide whether a request estimated at `estimated_tokens` may proceed.
    ///
    /// Never mutates anything but the lazy eviction. The caller records the
    /// event separately, charging the estimate optimistically at admission
    /// time; actual usage is not retro-corrected.
    pub fn check(&mut self, now: Instant, estimated_tokens: u64) -> Admission {
        self.evict(now);

        // Daily ceiling is a hard stop.
        if self.day.len() as u32 >= self.limits.rpd {
            return Admission::ExhaustedForDay {
                retry_after: Self::age_out(&self.day, DAY_WINDOW, now),
            };
        }

        let mut waits: Vec<Duration> = Vec::new();

        // RPM: hold one request of headroom below the ceiling. An empty
        // window always admits -- there is nothing to wait for.
        let rpm_threshold = self.limits.rpm.saturating_sub(RPM_HEADROOM);
        if !self.minute.is_empty() && self.minute.len() as u32 >= rpm_threshold {
            waits.push(Self::age_out(&self.minute, MINUTE_WINDOW, now));
        }

        // TPM: keep a fixed token headroom below the ceiling.
        let tpm_threshold = self.limits.tpm.saturating_sub(TPM_HEADROOM);
        if !self.minute.is_empty() && self.tokens_in_minute() + estimated_tokens >= tpm_threshold {
            waits.push(Self::age_out(&self.minute, MINUTE_WINDOW, now));
        }

        match waits.into_iter().min() {
            Some(wait) => Admission::Wait(wait),
            None => Admission::Admit,
        }
    }

    /// Record an admitted request in all windows.
    pub fn record(&mut self, now: Instant, tokens: u64) {
        self.minute.push_back((now, tokens));
        self.day.push_back((now, tokens));
        self.evict(now);
    }

    /// Current usage snapshot.
    pub fn usage(&mut self, now: Instant) -> QuotaUsage {
        self.evict(now);
        QuotaUsage {
            rpm: (self.minute.len() as u32, self.limits.rpm),
            tpm: (self.tokens_in_minute(), self.limits.tpm),
            rpd: (self.day.len() as u32, self.limits.rpd),
        }
    }
}
