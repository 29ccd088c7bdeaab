//! Protocol message types consumed by the observe core.
//!
//! # Data Flow
//! ```text
//! Incoming observe request
//!     → exchange.rs (request context, kept by the relation)
//!     → [resource dispatch produces a response]
//!     → response.rs (stamped notification, CON or NON)
//!     → Hand off to transport
//! ```
//!
//! # Design Decisions
//! - Wire encoding belongs to the transport, not to these types
//! - Exchanges are shared (`Arc`) and replayed unchanged

pub mod exchange;
pub mod request;
pub mod response;

pub use exchange::Exchange;
pub use request::{MessageType, Request};
pub use response::{Response, ResponseCode};
