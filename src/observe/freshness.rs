//! Freshness check for observe relations.
//!
//! # States
//! - Fresh: within both the time and the count budget
//! - Stale: either budget exceeded
//!
//! # State Transitions
//! ```text
//! Fresh → Stale: elapsed >= interval OR notifications >= count
//! Stale → Fresh: on check (the check performs the reset)
//! ```
//!
//! A stale relation must send its next notification confirmable so a client
//! that silently went away is detected.

use std::time::{Duration, Instant};

/// Default time budget between control notifications.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default count budget between control notifications.
pub const DEFAULT_CHECK_COUNT: u32 = 100;

/// Thresholds that decide when a control notification is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub interval: Duration,
    pub count: u32,
}

impl FreshnessPolicy {
    pub fn new(interval: Duration, count: u32) -> Self {
        Self { interval, count }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            count: DEFAULT_CHECK_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Counter and timestamp of the last reset.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessCheck {
    last_check: Instant,
    counter: u32,
}

impl FreshnessCheck {
    /// A new relation starts with one notification already counted.
    pub fn new(now: Instant) -> Self {
        Self {
            last_check: now,
            counter: 1,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn last_check(&self) -> Instant {
        self.last_check
    }

    /// Advance the counter and report whether a control notification is due.
    ///
    /// Both budgets are always evaluated, so the counter advances even when the
    /// time budget alone triggers. A positive result resets the state.
    pub fn check(&mut self, policy: &FreshnessPolicy, now: Instant) -> bool {
        let mut due = now.saturating_duration_since(self.last_check) >= policy.interval;
        self.counter = self.counter.saturating_add(1);
        due |= self.counter >= policy.count;

        if due {
            self.reset(now);
        }
        due
    }

    /// Report the current state without advancing it.
    pub fn freshness(&self, policy: &FreshnessPolicy, now: Instant) -> Freshness {
        let expired = now.saturating_duration_since(self.last_check) >= policy.interval;
        if expired || self.counter >= policy.count {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_check = now;
        self.counter = 0;
    }
}
