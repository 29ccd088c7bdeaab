//! Shutdown coordination for the observe service.
//!
//! # Shutdown Sequence
//! ```text
//! drain():
//!     trigger() → broadcast → freshness sweeper leaves its loop
//!         → wait for tracked tasks (aborted after the grace period)
//!         → cancel every relation left in the table
//! ```
//!
//! Relations are not persisted, so none survive a shutdown.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::ObserveConfig;
use crate::observe::sweep::FreshnessSweeper;
use crate::observe::table::RelationTable;

/// What a drain accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Every tracked task exited on its own within the grace period.
    pub stopped: bool,
    /// Relations cancelled after the tasks were gone.
    pub cancelled: usize,
}

/// Coordinator for graceful shutdown.
///
/// Owns the background tasks it spawned and stops them together.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Run `sweeper` on the runtime until shutdown.
    pub fn spawn_sweeper(
        &mut self,
        sweeper: FreshnessSweeper,
        config_updates: mpsc::UnboundedReceiver<ObserveConfig>,
    ) {
        let shutdown = self.subscribe();
        self.tasks.push(tokio::spawn(sweeper.run(config_updates, shutdown)));
    }

    /// Signal every subscriber. Safe to call with no subscribers.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stop all tracked tasks, then cancel every relation in `table`.
    pub async fn drain(self, table: &RelationTable, grace: Duration) -> DrainReport {
        self.trigger();

        let deadline = time::Instant::now() + grace;
        let mut stopped = true;
        for mut task in self.tasks {
            match time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Background task failed during shutdown");
                    stopped = false;
                }
                Err(_) => {
                    tracing::warn!(grace_secs = grace.as_secs(), "Background task still running after grace period, aborting");
                    task.abort();
                    stopped = false;
                }
            }
        }

        let cancelled = table.cancel_all();
        tracing::info!(cancelled, "Observe relations cancelled on shutdown");
        DrainReport { stopped, cancelled }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
