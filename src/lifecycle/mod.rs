//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     spawn_sweeper() → tracked task
//!     drain() → trigger() → broadcast → sweeper exits → remaining relations cancelled
//! ```

pub mod shutdown;

pub use shutdown::{DrainReport, Shutdown};
