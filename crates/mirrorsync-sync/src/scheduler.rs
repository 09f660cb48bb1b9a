//! Periodic execution of sync cycles

use crate::cycle::SyncCycle;
use crate::logger::SyncLogger;
use crate::report::CycleReport;
use mirrorsync_config::Config;
use mirrorsync_types::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Totals across the cycles run by a [`Scheduler`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Cycles that ran to completion
    pub cycles: u64,
    /// Cycles whose task panicked
    pub aborted_cycles: u64,
    /// Files created across all cycles
    pub created: u64,
    /// Files updated across all cycles
    pub updated: u64,
    /// Files deleted across all cycles
    pub deleted: u64,
    /// Path failures across all cycles
    pub failures: u64,
}

impl SchedulerSummary {
    fn absorb(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.created += report.created() as u64;
        self.updated += report.updated() as u64;
        self.deleted += report.deleted() as u64;
        self.failures += report.failure_count() as u64;
    }
}

/// Runs a [`SyncCycle`] repeatedly until cancelled
///
/// The interval is measured from the end of one cycle to the start of the
/// next. Cancellation is only observed between cycles.
#[derive(Debug, Clone)]
pub struct Scheduler {
    cycle: Arc<SyncCycle>,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler pausing `interval` between cycles
    pub fn new(cycle: SyncCycle, interval: Duration) -> Self {
        Self {
            cycle: Arc::new(cycle),
            interval,
        }
    }

    /// Create a scheduler for the roots, settings and interval of `config`
    pub fn from_config(config: &Config, logger: Arc<dyn SyncLogger>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            SyncCycle::from_config(config, logger),
            config.interval(),
        ))
    }

    /// Pause between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run exactly one cycle on the blocking thread pool
    pub async fn run_once(&self) -> Result<CycleReport> {
        let cycle = Arc::clone(&self.cycle);
        tokio::task::spawn_blocking(move || cycle.run())
            .await
            .map_err(|e| Error::other(format!("Sync cycle task failed: {}", e)))
    }

    /// Run cycles until `cancel` fires
    ///
    /// A cycle in progress always completes; the wait that follows it is cut
    /// short by cancellation.
    pub async fn run(&self, cancel: CancellationToken) -> SchedulerSummary {
        let mut summary = SchedulerSummary::default();
        info!(
            "Scheduler started: {} -> {} every {:?}",
            self.cycle.source().display(),
            self.cycle.replica().display(),
            self.interval
        );

        while !cancel.is_cancelled() {
            match self.run_once().await {
                Ok(report) => summary.absorb(&report),
                Err(e) => {
                    error!("{}", e);
                    summary.aborted_cycles += 1;
                }
            }

            debug!("Next cycle in {:?}", self.interval);
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            "Scheduler stopped after {} cycles ({} failures)",
            summary.cycles, summary.failures
        );
        summary
    }
}
