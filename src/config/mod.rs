//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ObserveConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → sent to the freshness sweeper
//!     → relation table swaps its freshness policy
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - A new freshness policy applies to relations created after the reload

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{FreshnessConfig, ObservabilityConfig, ObserveConfig, SweepConfig};
pub use watcher::ConfigWatcher;
