//! Notification ordering.
//!
//! # Responsibilities
//! - Stamp each outgoing notification with an observe number
//! - Let clients detect reordered notifications (RFC 7641 §3.4)
//!
//! # Design Decisions
//! - The orderer is injected into each relation; any strategy can be substituted
//! - Observe numbers are 24 bits wide and wrap around
//! - Stamping is lock-free and safe under concurrent callers

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use crate::message::Response;
use crate::observe::relation::RelationKey;

/// Observe numbers occupy 24 bits on the wire.
pub const OBSERVE_NUMBER_SPACE: u32 = 1 << 24;

const HALF_SPACE: u32 = 1 << 23;

/// A notification arriving this long after the previous one is always fresher.
pub const REORDER_WINDOW: Duration = Duration::from_secs(128);

/// Assigns order markers to notifications of a relation.
pub trait NotificationOrderer: Send + Sync + std::fmt::Debug {
    /// Stamp `response` for the relation identified by `key`.
    ///
    /// Successive stamps for one relation must be non-decreasing modulo the
    /// observe number space, even when called concurrently.
    fn stamp(&self, key: &RelationKey, response: Response) -> Response;
}

/// Default orderer: a wrapping 24-bit sequence.
#[derive(Debug, Default)]
pub struct ObserveSequence {
    number: AtomicU32,
}

impl ObserveSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the sequence at `initial` (masked to 24 bits).
    pub fn starting_at(initial: u32) -> Self {
        Self {
            number: AtomicU32::new(initial % OBSERVE_NUMBER_SPACE),
        }
    }

    /// Reserve the next observe number.
    pub fn next_number(&self) -> u32 {
        let mut prev = self.number.load(Ordering::Relaxed);
        loop {
            let next = (prev + 1) % OBSERVE_NUMBER_SPACE;
            match self.number.compare_exchange_weak(
                prev, next, Ordering::AcqRel, Ordering::Relaxed
            ) {
                Ok(_) => return next,
                Err(x) => prev = x,
            }
        }
    }

    /// Last number handed out.
    pub fn current(&self) -> u32 {
        self.number.load(Ordering::Acquire)
    }
}

impl NotificationOrderer for ObserveSequence {
    fn stamp(&self, _key: &RelationKey, mut response: Response) -> Response {
        response.observe = Some(self.next_number());
        response
    }
}

/// Client-side reordering test from RFC 7641 §3.4.
///
/// Returns true if the notification numbered `v2`, received at `t2`, is newer
/// than the one numbered `v1` received at `t1`.
pub fn is_fresher(v1: u32, t1: Instant, v2: u32, t2: Instant) -> bool {
    (v1 < v2 && v2 - v1 < HALF_SPACE)
        || (v1 > v2 && v1 - v2 > HALF_SPACE)
        || t2 > t1 + REORDER_WINDOW
}
