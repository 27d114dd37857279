// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window admission control for the Gauntlet quiz runner.
//!
//! Guards the reasoning backend behind three independent quota dimensions:
//! requests per minute, tokens per minute, and requests per day. The
//! per-minute dimensions recover by waiting for the oldest event to age out;
//! the daily dimension is a hard stop.

pub mod limiter;
pub mod window;

pub use limiter::RateLimiter;
pub use window::{Admission, QuotaLimits, QuotaUsage, SlidingWindow};
