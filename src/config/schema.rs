//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observe::freshness::{FreshnessPolicy, DEFAULT_CHECK_COUNT, DEFAULT_CHECK_INTERVAL};

/// Root configuration for the observe service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObserveConfig {
    /// Control notification thresholds.
    pub freshness: FreshnessConfig,

    /// Periodic freshness sweep.
    pub sweep: SweepConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Thresholds after which a notification must be sent confirmable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Maximum time between control notifications, in seconds.
    pub check_interval_secs: u64,

    /// Maximum number of notifications between control notifications.
    pub check_interval_count: u32,
}

impl FreshnessConfig {
    pub fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::from_secs(self.check_interval_secs),
            self.check_interval_count,
        )
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL.as_secs(),
            check_interval_count: DEFAULT_CHECK_COUNT,
        }
    }
}

/// Freshness sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Enable the periodic sweep.
    pub enabled: bool,

    /// Sweep interval in seconds.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
