//! Work items and their status state machine

use crate::config::SweepConfig;
use crate::design::{ClockPeriod, DesignVariant, OperatingPoint, Precision};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Pipeline phase a work item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Phase 1: structural synthesis
    Synthesis,
    /// Phase 2: waveform simulation + power measurement
    PowerSimulation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Synthesis => "synthesis",
            Self::PowerSimulation => "power",
        })
    }
}

/// Status of a work item.
///
/// ```text
/// Pending ──> ConfigWritten ──> ToolRunning ──> Validated ──> Archived ──> DoneFresh
///    │                              │              │
///    └──> DoneCached                └──> Failed <──┘
/// ```
///
/// Any non-terminal status may also fall to `Failed` when an I/O error
/// interrupts the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Created, nothing done yet
    Pending,
    /// Tool configuration written to the scratch directory
    ConfigWritten,
    /// External tool invoked
    ToolRunning,
    /// Tool output checked
    Validated,
    /// Logs and scripts moved to the archive
    Archived,
    /// Expected artifact missing or stage aborted by an error
    Failed,
    /// Canonical artifact already existed; tool skipped
    DoneCached,
    /// Artifact produced by this run
    DoneFresh,
}

impl WorkStatus {
    /// Whether the status ends the state machine.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::DoneCached | Self::DoneFresh)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use WorkStatus::{
            Archived, ConfigWritten, DoneCached, DoneFresh, Failed, Pending, ToolRunning,
            Validated,
        };
        match (self, next) {
            (Pending, ConfigWritten | DoneCached)
            | (ConfigWritten, ToolRunning)
            | (ToolRunning, Validated)
            | (Validated, Archived)
            | (Archived, DoneFresh) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Snake-case name used in logs and summaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ConfigWritten => "config_written",
            Self::ToolRunning => "tool_running",
            Self::Validated => "validated",
            Self::Archived => "archived",
            Self::Failed => "failed",
            Self::DoneCached => "done_cached",
            Self::DoneFresh => "done_fresh",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One pipeline task bound to a design variant and a clock/precision scope.
///
/// Every work item owns the `<design>/<clock mapping>` subtree of the
/// scratch tree and the results tree. Power items of different precisions
/// share that subtree but only touch precision-suffixed file names.
#[derive(Debug, Clone)]
pub struct WorkItem {
    phase: Phase,
    design: DesignVariant,
    clock: ClockPeriod,
    precision: Option<Precision>,
    status: WorkStatus,
}

impl WorkItem {
    /// Synthesis work item for (design, clock).
    #[must_use]
    pub const fn synthesis(design: DesignVariant, clock: ClockPeriod) -> Self {
        Self {
            phase: Phase::Synthesis,
            design,
            clock,
            precision: None,
            status: WorkStatus::Pending,
        }
    }

    /// Power-simulation work item for (design, operating point).
    #[must_use]
    pub const fn power(design: DesignVariant, point: OperatingPoint) -> Self {
        Self {
            phase: Phase::PowerSimulation,
            design,
            clock: point.clock,
            precision: Some(point.precision),
            status: WorkStatus::Pending,
        }
    }

    /// Phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Design variant.
    #[must_use]
    pub const fn design(&self) -> &DesignVariant {
        &self.design
    }

    /// Clock period.
    #[must_use]
    pub const fn clock(&self) -> ClockPeriod {
        self.clock
    }

    /// Precision (power items only).
    #[must_use]
    pub const fn precision(&self) -> Option<Precision> {
        self.precision
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> WorkStatus {
        self.status
    }

    /// Unique label: `<design>/<clock mapping>[/<precision>]`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.precision {
            Some(p) => format!("{}/{}/{}", self.design, self.clock.mapping(), p),
            None => format!("{}/{}", self.design, self.clock.mapping()),
        }
    }

    /// Canonical output artifact: the netlist for synthesis, the power
    /// report for power simulation. Its presence short-circuits the stage.
    #[must_use]
    pub fn artifact_path(&self, config: &SweepConfig) -> PathBuf {
        match self.precision {
            Some(p) => config.power_report_path(&self.design, self.clock, p),
            None => config.netlist_path(&self.design, self.clock),
        }
    }

    /// Scratch directory owned by this item.
    #[must_use]
    pub fn scratch_dir(&self, config: &SweepConfig) -> PathBuf {
        config.scratch_dir(&self.design, self.clock)
    }

    /// Result directory owned by this item.
    #[must_use]
    pub fn result_dir(&self, config: &SweepConfig) -> PathBuf {
        config.result_dir(&self.design, self.clock)
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the edge does not exist.
    pub fn advance(&mut self, next: WorkStatus) -> Result<()> {
        if !self.status.can_advance_to(next) {
            return Err(Error::InvalidTransition {
                item: self.label(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
