//! Task Dispatcher
//!
//! ```text
//! populate scratch ──> phase 1: synthesis pool (narrow)
//!                          │ barrier: pool fully drained
//!                          v
//!                      phase 2: power pool (wide)
//!                          │ barrier
//!                          v
//!                      phase 3: reduction pool, one task per clock period
//!                          │
//!                          v
//!                      remove scratch, write sweep_summary.json
//! ```
//!
//! Workers return nothing; outcomes are read back from the [`StatusLedger`]
//! and the filesystem. A failing work item is logged and never stops its
//! siblings. Raising the [`SweepCancel`] flag stops workers from picking up
//! new items or launching new tools; `run` then returns
//! [`Error::Cancelled`] instead of reducing.

use super::ledger::StatusLedger;
use super::pool::WorkerPool;
use super::runner::StageRunner;
use super::shutdown::SweepCancel;
use super::tool::ExternalTool;
use super::work::{Phase, WorkItem};
use crate::breakdown::{generate_breakdown, BreakdownSummary};
use crate::config::SweepConfig;
use crate::design::DesignSpace;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Run summary file written under the result directory.
pub const SUMMARY_FILE: &str = "sweep_summary.json";

/// Outcome of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration
    pub elapsed_secs: f64,
    /// Final synthesis status counts
    pub synthesis: BTreeMap<String, usize>,
    /// Final power-simulation status counts
    pub power: BTreeMap<String, usize>,
    /// Labels of failed work items, both phases
    pub failures: Vec<String>,
    /// One entry per clock period reduced
    pub breakdowns: Vec<BreakdownSummary>,
}

/// Drives a full sweep.
pub struct Dispatcher<'a, T: ExternalTool + ?Sized> {
    config: &'a SweepConfig,
    tool: &'a T,
    ledger: StatusLedger,
    cancel: SweepCancel,
}

impl<'a, T: ExternalTool + ?Sized> Dispatcher<'a, T> {
    /// Create a dispatcher with an empty ledger.
    #[must_use]
    pub fn new(config: &'a SweepConfig, tool: &'a T) -> Self {
        Self {
            config,
            tool,
            ledger: StatusLedger::new(),
            cancel: SweepCancel::new(),
        }
    }

    /// Share a stop flag with the caller (the interrupt handler).
    #[must_use]
    pub fn with_cancel(mut self, cancel: SweepCancel) -> Self {
        self.cancel = cancel;
        self
    }

    /// Every status change recorded so far.
    #[must_use]
    pub const fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }

    /// Run all three phases.
    ///
    /// # Errors
    ///
    /// Returns error only for whole-run problems: a worker pool that cannot
    /// be built, a run summary that cannot be written, or a raised stop
    /// flag. Per-item failures end up in the summary instead.
    pub fn run(&self) -> Result<SweepSummary> {
        let started_at = Utc::now();
        let space = DesignSpace::new(self.config);
        info!(
            designs = self.config.designs.len(),
            clocks = self.config.clocks.len(),
            precisions = self.config.precisions.len(),
            family = self.config.family.label(),
            "starting sweep"
        );

        self.populate_scratch();

        self.run_phase(Phase::Synthesis, space.synthesis_items())?;
        self.check_cancelled("power simulation")?;
        self.run_phase(Phase::PowerSimulation, space.power_items())?;
        self.check_cancelled("reduction")?;
        let breakdowns = self.run_reduction()?;

        self.remove_scratch();

        let finished_at = Utc::now();
        #[allow(clippy::cast_precision_loss)]
        let elapsed_secs = (finished_at - started_at).num_milliseconds() as f64 / 1000.0;
        let mut failures = self.ledger.failures(Phase::Synthesis);
        failures.extend(self.ledger.failures(Phase::PowerSimulation));
        let summary = SweepSummary {
            started_at,
            finished_at,
            elapsed_secs,
            synthesis: self.ledger.status_counts(Phase::Synthesis),
            power: self.ledger.status_counts(Phase::PowerSimulation),
            failures,
            breakdowns,
        };

        let path = self.write_summary(&summary)?;
        info!(
            elapsed_secs,
            failures = summary.failures.len(),
            summary = %path.display(),
            "sweep finished"
        );
        Ok(summary)
    }

    /// Submit every item of one phase to its pool and block until the pool
    /// has drained. Returning from here is the phase barrier.
    ///
    /// # Errors
    ///
    /// Returns error if the pool or the stage runner cannot be built.
    pub fn run_phase(&self, phase: Phase, items: Vec<WorkItem>) -> Result<()> {
        let (name, width) = match phase {
            Phase::Synthesis => ("synthesis", self.config.pools.synthesis_workers),
            Phase::PowerSimulation => ("power", self.config.pools.power_workers),
        };
        let pool = WorkerPool::new(name, width)?;
        let runner =
            StageRunner::new(self.config, self.tool, &self.ledger)?.with_cancel(self.cancel.clone());
        info!(%phase, items = items.len(), workers = pool.width(), "phase started");

        pool.run_all(items, |mut item: WorkItem| {
            if self.cancel.is_cancelled() {
                debug!(item = %item.label(), "sweep cancelled, item not started");
                return;
            }
            if let Err(e) = runner.run(&mut item) {
                warn!(item = %item.label(), error = %e, "work item failed");
            }
        });

        let counts = self.ledger.status_counts(phase);
        info!(%phase, ?counts, "phase drained");
        Ok(())
    }

    /// Reduce every clock period in parallel. A clock whose tables cannot be
    /// written is logged and left out of the result.
    ///
    /// # Errors
    ///
    /// Returns error if the reduction pool cannot be built.
    pub fn run_reduction(&self) -> Result<Vec<BreakdownSummary>> {
        let space = DesignSpace::new(self.config);
        let pool = WorkerPool::new("reduce", self.config.pools.power_workers)?;
        let outcomes = pool.map_all(space.reduction_points(), |clock| {
            (clock, generate_breakdown(self.config, clock))
        });

        let mut summaries = Vec::new();
        for (clock, outcome) in outcomes {
            match outcome {
                Ok(summary) => {
                    for violation in &summary.violations {
                        warn!(clock = %clock.label(), %violation, "invariant violation");
                    }
                    summaries.push(summary);
                }
                Err(e) => warn!(clock = %clock.label(), error = %e, "breakdown failed"),
            }
        }
        Ok(summaries)
    }

    fn check_cancelled(&self, next: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(next, "sweep cancelled");
            return Err(Error::Cancelled(next.to_string()));
        }
        Ok(())
    }

    /// Recreate the scratch tree with one directory per (design, clock).
    /// Every failure is logged and ignored.
    pub fn populate_scratch(&self) {
        let root = &self.config.paths.scratch_dir;
        if root.exists() {
            if let Err(e) = fs::remove_dir_all(root) {
                warn!(dir = %root.display(), error = %e, "could not delete scratch directory");
            }
        }
        if let Err(e) = fs::create_dir_all(root) {
            warn!(dir = %root.display(), error = %e, "could not create scratch directory");
        }
        for design in &self.config.designs {
            for &clock in &self.config.clocks {
                let dir = self.config.scratch_dir(design, clock);
                if let Err(e) = fs::create_dir_all(&dir) {
                    warn!(dir = %dir.display(), error = %e, "could not create scratch subdirectory");
                }
            }
        }
    }

    fn remove_scratch(&self) {
        let root = &self.config.paths.scratch_dir;
        match fs::remove_dir_all(root) {
            Ok(()) => info!(dir = %root.display(), "scratch directory removed"),
            Err(e) => warn!(dir = %root.display(), error = %e, "could not remove scratch directory"),
        }
    }

    fn write_summary(&self, summary: &SweepSummary) -> Result<PathBuf> {
        let dir = &self.config.paths.result_dir;
        fs::create_dir_all(dir)?;
        let path = dir.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_vec_pretty(summary)?)?;
        Ok(path)
    }
}
