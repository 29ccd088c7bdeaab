//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, counts > 0)
//! - Reject log filters the subscriber cannot parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ObserveConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::config::schema::ObserveConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    ZeroCheckInterval,
    ZeroCheckCount,
    ZeroSweepInterval,
    InvalidLogLevel(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroCheckInterval => write!(f, "freshness.check_interval_secs must be > 0"),
            ValidationError::ZeroCheckCount => write!(f, "freshness.check_interval_count must be > 0"),
            ValidationError::ZeroSweepInterval => write!(f, "sweep.interval_secs must be > 0"),
            ValidationError::InvalidLogLevel(level) => write!(f, "invalid observability.log_level: {}", level),
        }
    }
}

pub fn validate_config(config: &ObserveConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.freshness.check_interval_secs == 0 {
        errors.push(ValidationError::ZeroCheckInterval);
    }
    if config.freshness.check_interval_count == 0 {
        errors.push(ValidationError::ZeroCheckCount);
    }
    if config.sweep.enabled && config.sweep.interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
