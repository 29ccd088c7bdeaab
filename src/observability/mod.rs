//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relation lifecycle, notifications, sweeps produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields (endpoint, path) on every relation event
//! - Metrics are no-ops until the host installs a recorder

pub mod logging;
pub mod metrics;
