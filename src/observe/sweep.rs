//! Periodic freshness sweep.
//!
//! # Responsibilities
//! - Periodically evaluate freshness on every established relation
//! - Arm a control notification on relations found stale
//! - Drop endpoint entries left without relations
//! - Apply reloaded configuration
//!
//! # Design Decisions
//! - The sweep reads freshness without advancing the notification counter;
//!   only recorded notifications count against the count budget
//! - The budgets restart when the armed control notification is recorded

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::config::{ObserveConfig, SweepConfig};
use crate::observability::metrics;
use crate::observe::freshness::Freshness;
use crate::observe::table::RelationTable;

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Established relations checked.
    pub checked: usize,
    /// Relations armed with a control notification by this sweep.
    pub stale: usize,
    /// Endpoint entries removed.
    pub pruned: usize,
}

pub struct FreshnessSweeper {
    table: Arc<RelationTable>,
    config: SweepConfig,
}

impl FreshnessSweeper {
    pub fn new(table: Arc<RelationTable>, config: SweepConfig) -> Self {
        Self { table, config }
    }

    pub fn sweep_once(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();

        for relation in self.table.established() {
            report.checked += 1;
            if relation.freshness_at(now) == Freshness::Stale
                && relation.request_control_notification()
            {
                report.stale += 1;
            }
        }
        report.pruned = self.table.prune_endpoints();

        metrics::record_sweep(report.stale);
        report
    }

    pub async fn run(
        mut self,
        mut config_updates: mpsc::UnboundedReceiver<ObserveConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        if !self.config.enabled {
            tracing::info!("Freshness sweep disabled");
            return;
        }

        tracing::info!(interval = self.config.interval_secs, "Freshness sweeper starting");
        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep_once();
                    tracing::debug!(
                        checked = report.checked,
                        stale = report.stale,
                        pruned = report.pruned,
                        "Freshness sweep complete"
                    );
                }
                Some(new_config) = config_updates.recv() => {
                    self.table.set_policy(new_config.freshness.policy());
                    if !new_config.sweep.enabled {
                        tracing::info!("Freshness sweep disabled by configuration reload");
                        break;
                    }
                    if new_config.sweep.interval_secs != self.config.interval_secs {
                        tracing::info!(interval = new_config.sweep.interval_secs, "Freshness sweep interval changed");
                        self.config = new_config.sweep;
                        ticker = self.ticker();
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Freshness sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn ticker(&self) -> Interval {
        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
