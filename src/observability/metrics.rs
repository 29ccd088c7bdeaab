//! Metrics collection.
//!
//! # Metrics
//! - `observe_relations_established_total` (counter)
//! - `observe_relations_cancelled_total` (counter)
//! - `observe_notifications_total` (counter): by kind (con, non, deferred, error)
//! - `observe_sweep_stale_total` (counter): relations found stale by the sweeper
//! - `observe_active_relations` (gauge): relations in the table

use metrics::{counter, gauge};

pub fn record_relation_established() {
    counter!("observe_relations_established_total").increment(1);
}

pub fn record_relation_cancelled() {
    counter!("observe_relations_cancelled_total").increment(1);
}

pub fn record_notification(kind: &'static str) {
    counter!("observe_notifications_total", "kind" => kind).increment(1);
}

pub fn record_sweep(stale: usize) {
    counter!("observe_sweep_stale_total").increment(stale as u64);
}

pub fn record_active_relations(count: usize) {
    gauge!("observe_active_relations").set(count as f64);
}
