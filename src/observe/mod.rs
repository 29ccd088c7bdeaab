//! Observe subsystem.
//!
//! # Data Flow
//! ```text
//! Observe registration:
//!     Exchange (GET, observe=0)
//!     → table.rs (find/create endpoint, build relation)
//!     → relation.rs (link into endpoint.rs and resource.rs)
//!
//! Resource change:
//!     resource.rs changed()
//!     → relation.rs notify_observers() → resource dispatch (async)
//!     → relation.rs record_notification()
//!         → freshness.rs (CON or NON?)
//!         → orderer.rs (observe number)
//!     → transport
//!
//! Periodic sweep (sweep.rs):
//!     timer → freshness_at() on every established relation (counter untouched)
//!     → stale relations get a control notification armed
//!
//! Cancellation:
//!     reset / timeout / error response / cancel_all()
//!     → relation.rs cancel() → unlink from resource, endpoint, table
//! ```
//!
//! # Design Decisions
//! - The relation table owns relations; endpoints and resources hold weak lookups
//! - Per-relation state sits behind one mutex, released before any dispatch
//! - Cancellation is terminal and idempotent

pub mod endpoint;
pub mod error;
pub mod freshness;
pub mod orderer;
pub mod relation;
pub mod resource;
pub mod sweep;
pub mod table;

pub use endpoint::ObservingEndpoint;
pub use error::{ObserveError, ObserveResult};
pub use freshness::{Freshness, FreshnessCheck, FreshnessPolicy};
pub use orderer::{NotificationOrderer, ObserveSequence};
pub use relation::{NotificationOutcome, ObserveRelation, RelationBuilder, RelationKey, RelationPhase};
pub use resource::{ObservableResource, ObserverSet};
pub use sweep::{FreshnessSweeper, SweepReport};
pub use table::RelationTable;
