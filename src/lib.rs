//! Server-side CoAP observe relations.
//!
//! Tracks which client endpoints observe which resources, decides when a
//! notification must be confirmable, and tears relations down cleanly when a
//! client goes away.

pub mod config;
pub mod lifecycle;
pub mod message;
pub mod observability;
pub mod observe;

pub use config::schema::ObserveConfig;
pub use lifecycle::{DrainReport, Shutdown};
pub use message::{Exchange, Request, Response};
pub use observe::{ObserveRelation, RelationTable};
