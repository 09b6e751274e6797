//! Sweep configuration
//!
//! One immutable [`SweepConfig`] is built at startup and passed by reference
//! into every component. All sweep parameters live here; there are no
//! runtime flags.
//!
//! The binary looks for `auto_sweep.json` in the working directory and falls
//! back to [`SweepConfig::default`]. Every section is optional in the file.

use crate::design::{ClockPeriod, DesignVariant, Precision};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name discovered in the working directory by the binary.
pub const CONFIG_FILE_NAME: &str = "auto_sweep.json";

/// Full-unit design catalogue, in canonical table order.
const FU_DESIGNS: &[&str] = &[
    "BG_L2_L4_00_L3_00_L2_00_DVAFS_0",
    "BG_L2_L4_00_L3_00_L2_10_DVAFS_0",
    "BG_L2_L4_00_L3_00_L2_11_DVAFS_0",
    "BG_L2_L4_00_L3_10_L2_00_DVAFS_0",
    "BG_L2_L4_00_L3_10_L2_10_DVAFS_0",
    "BG_L2_L4_00_L3_10_L2_11_DVAFS_0",
    "BG_L2_L4_00_L3_11_L2_00_DVAFS_0",
    "BG_L2_L4_00_L3_11_L2_10_DVAFS_0",
    "BITFUSION",
    "BG_L2_L4_10_L3_00_L2_00_DVAFS_0",
    "BG_L2_L4_10_L3_00_L2_10_DVAFS_0",
    "BG_L2_L4_10_L3_00_L2_11_DVAFS_0",
    "BG_L2_L4_10_L3_10_L2_00_DVAFS_0",
    "BG_L2_L4_10_L3_10_L2_10_DVAFS_0",
    "BG_L2_L4_10_L3_10_L2_11_DVAFS_0",
    "BG_L2_L4_10_L3_11_L2_00_DVAFS_0",
    "BG_L2_L4_10_L3_11_L2_10_DVAFS_0",
    "BG_L2_L4_10_L3_11_L2_11_DVAFS_0",
    "BG_L2_L4_11_L3_00_L2_00_DVAFS_0",
    "BG_L2_L4_11_L3_00_L2_10_DVAFS_0",
    "BG_L2_L4_11_L3_00_L2_11_DVAFS_0",
    "BG_L2_L4_11_L3_10_L2_00_DVAFS_0",
    "BG_L2_L4_11_L3_10_L2_10_DVAFS_0",
    "BG_L2_L4_11_L3_10_L2_11_DVAFS_0",
    "BG_L2_L4_11_L3_11_L2_00_DVAFS_0",
    "BG_L2_L4_11_L3_11_L2_10_DVAFS_0",
    "BG_L2_L4_11_L3_11_L2_11_DVAFS_0",
    "BG_L3_L4_00_L3_00_L2_10_DVAFS_0",
    "BG_L3_L4_00_L3_00_L2_11_DVAFS_0",
    "BG_L3_L4_00_L3_10_L2_10_DVAFS_0",
    "BG_L3_L4_00_L3_10_L2_11_DVAFS_0",
    "BG_L3_L4_00_L3_11_L2_10_DVAFS_0",
    "BITBLADE",
    "BG_L3_L4_10_L3_00_L2_10_DVAFS_0",
    "BG_L3_L4_10_L3_00_L2_11_DVAFS_0",
    "BG_L3_L4_10_L3_10_L2_10_DVAFS_0",
    "BG_L3_L4_10_L3_10_L2_11_DVAFS_0",
    "BG_L3_L4_10_L3_11_L2_10_DVAFS_0",
    "BG_L3_L4_10_L3_11_L2_11_DVAFS_0",
    "BG_L3_L4_11_L3_00_L2_10_DVAFS_0",
    "BG_L3_L4_11_L3_00_L2_11_DVAFS_0",
    "BG_L3_L4_11_L3_10_L2_10_DVAFS_0",
    "BG_L3_L4_11_L3_10_L2_11_DVAFS_0",
    "BG_L3_L4_11_L3_11_L2_10_DVAFS_0",
    "BG_L3_L4_11_L3_11_L2_11_DVAFS_0",
    "LOOM",
    "BG_BS_L4_00_L3_10_L2_11_DVAFS_0",
    "BG_BS_L4_00_L3_11_L2_11_DVAFS_0",
    "BG_BS_L4_10_L3_00_L2_11_DVAFS_0",
    "BG_BS_L4_10_L3_10_L2_11_DVAFS_0",
    "BG_BS_L4_10_L3_11_L2_11_DVAFS_0",
    "BG_BS_L4_11_L3_00_L2_11_DVAFS_0",
    "BG_BS_L4_11_L3_10_L2_11_DVAFS_0",
    "BG_BS_L4_11_L3_11_L2_11_DVAFS_0",
];

/// Sub-word (precision-scaling) design catalogue, in canonical table order.
const SWU_DESIGNS: &[&str] = &[
    "BG_L2_L4_00_L3_00_L2_00_DVAFS_1",
    "BG_L2_L4_00_L3_00_L2_11_DVAFS_1",
    "BG_L2_L4_00_L3_10_L2_00_DVAFS_1",
    "BG_L2_L4_00_L3_10_L2_11_DVAFS_1",
    "BG_L2_L4_00_L3_11_L2_00_DVAFS_1",
    "BG_L2_L4_00_L3_11_L2_11_DVAFS_1",
    "BG_L2_L4_10_L3_00_L2_00_DVAFS_1",
    "BG_L2_L4_10_L3_00_L2_11_DVAFS_1",
    "BG_L2_L4_10_L3_10_L2_00_DVAFS_1",
    "BG_L2_L4_10_L3_10_L2_11_DVAFS_1",
    "BG_L2_L4_10_L3_11_L2_00_DVAFS_1",
    "BG_L2_L4_10_L3_11_L2_11_DVAFS_1",
    "BG_L2_L4_11_L3_00_L2_00_DVAFS_1",
    "BG_L2_L4_11_L3_00_L2_11_DVAFS_1",
    "BG_L2_L4_11_L3_10_L2_00_DVAFS_1",
    "BG_L2_L4_11_L3_10_L2_11_DVAFS_1",
    "BG_L2_L4_11_L3_11_L2_00_DVAFS_1",
    "BG_L2_L4_11_L3_11_L2_11_DVAFS_1",
];

/// Design family swept in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Family {
    /// Full-unit designs (no precision scaling)
    #[default]
    #[serde(rename = "FU")]
    FullUnit,
    /// Sub-word-unit designs (precision scaling)
    #[serde(rename = "SWU")]
    SubwordUnit,
}

impl Family {
    /// Directory label under `breakdown/<clk>/`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullUnit => "FU",
            Self::SubwordUnit => "SWU",
        }
    }

    /// Whether designs of this family scale precision.
    #[must_use]
    pub const fn is_precision_scaling(self) -> bool {
        matches!(self, Self::SubwordUnit)
    }

    /// Default design catalogue for the family.
    #[must_use]
    pub fn catalogue(self) -> Vec<DesignVariant> {
        let ids = match self {
            Self::FullUnit => FU_DESIGNS,
            Self::SubwordUnit => SWU_DESIGNS,
        };
        ids.iter()
            .filter_map(|id| DesignVariant::parse(id).ok())
            .collect()
    }

    /// Precisions the family supports. Sub-word designs only run symmetric
    /// multiplications.
    #[must_use]
    pub fn precisions(self) -> Vec<Precision> {
        match self {
            Self::FullUnit => Precision::TABLE_ORDER.to_vec(),
            Self::SubwordUnit => vec![Precision::Int8x8, Precision::Int4x4, Precision::Int2x2],
        }
    }
}

/// Worker pool widths per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Synthesis pool width; each synthesis job is itself multi-threaded
    pub synthesis_workers: usize,
    /// Power-simulation pool width; also used for the reduction phase
    pub power_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            synthesis_workers: 4,
            power_workers: 24,
        }
    }
}

/// Filesystem locations.
///
/// Relative paths are resolved against the working directory once, at
/// startup ([`SweepConfig::resolve_paths`]), because tools run with their
/// scratch directory as the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Scratch tree for intermediate files; needs lots of free space
    pub scratch_dir: PathBuf,
    /// Persisted results tree
    pub result_dir: PathBuf,
    /// RTL sources
    pub rtl_dir: PathBuf,
    /// Timing constraints directory
    pub sdc_dir: PathBuf,
    /// Standard-cell timing library (`.lib`)
    pub lib_db: PathBuf,
    /// Standard-cell Verilog models
    pub lib_v: PathBuf,
    /// Synthesis flow template
    pub synthesis_template: PathBuf,
    /// Power test bench
    pub testbench: PathBuf,
    /// Simulation flow template
    pub simulation_template: PathBuf,
    /// Test bench helper sources
    pub helper: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("../TMP"),
            result_dir: PathBuf::from("../results"),
            rtl_dir: PathBuf::from("../rtl"),
            sdc_dir: PathBuf::from("../constraints"),
            lib_db: PathBuf::from("../lib/stdcells.lib"),
            lib_v: PathBuf::from("../lib/stdcells.v"),
            synthesis_template: PathBuf::from("../rtl/syn_L4_mac.tcl"),
            testbench: PathBuf::from("../rtl/pb_L4_mac.sv"),
            simulation_template: PathBuf::from("../rtl/sim_pb_L4_mac.tcl"),
            helper: PathBuf::from("../rtl/helper.sv"),
        }
    }
}

/// External tool programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Synthesis tool (also used in power measurement mode)
    pub synthesis: String,
    /// Waveform simulation tool
    pub simulation: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            synthesis: "genus".to_string(),
            simulation: "vsim".to_string(),
        }
    }
}

impl ToolConfig {
    /// Process names terminated on interrupt.
    #[must_use]
    pub fn process_names(&self) -> Vec<&str> {
        vec![self.synthesis.as_str(), self.simulation.as_str()]
    }
}

/// Power simulation stimulus parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Top-level module name
    pub top_module: String,
    /// Accumulation headroom bits in the output register
    pub headroom: u32,
    /// Number of reset-separated iterations
    pub reset_iterations: u32,
    /// Clock cycles per iteration
    pub repetitions: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            top_module: "top_L4_mac".to_string(),
            headroom: 4,
            reset_iterations: 1,
            repetitions: 4096,
        }
    }
}

/// Immutable sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Design family being swept
    pub family: Family,
    /// Design catalogue, in canonical order
    pub designs: Vec<DesignVariant>,
    /// Clock periods (ns)
    pub clocks: Vec<ClockPeriod>,
    /// Precisions simulated per clock period
    pub precisions: Vec<Precision>,
    /// Re-run power simulation even when a power report exists
    pub overwrite_power: bool,
    /// Worker pool widths
    pub pools: PoolConfig,
    /// Filesystem layout
    pub paths: PathConfig,
    /// External tools
    pub tools: ToolConfig,
    /// Stimulus parameters
    pub simulation: SimulationConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::for_family(Family::FullUnit)
    }
}

impl SweepConfig {
    /// Default sweep for a design family.
    #[must_use]
    pub fn for_family(family: Family) -> Self {
        Self {
            family,
            designs: family.catalogue(),
            clocks: vec![ClockPeriod::from_ns(1.0), ClockPeriod::from_ns(5.0)],
            precisions: family.precisions(),
            overwrite_power: false,
            pools: PoolConfig::default(),
            paths: PathConfig::default(),
            tools: ToolConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check catalogue invariants.
    ///
    /// Identifiers and structural configurations must map one-to-one, and
    /// every design must belong to the configured family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut configs = HashSet::new();
        for design in &self.designs {
            if !ids.insert(design.id()) {
                return Err(Error::Config(format!("duplicate design id {design}")));
            }
            if !configs.insert(*design.config()) {
                return Err(Error::Config(format!(
                    "design {design} repeats the configuration {}",
                    design.config().canonical_id()
                )));
            }
            if design.config().dvafs != self.family.is_precision_scaling() {
                return Err(Error::Config(format!(
                    "design {design} does not belong to family {}",
                    self.family.label()
                )));
            }
        }
        if self.pools.synthesis_workers == 0 || self.pools.power_workers == 0 {
            return Err(Error::Config("pool widths must be positive".to_string()));
        }
        if self.clocks.iter().any(|c| !(c.ns() > 0.0)) {
            return Err(Error::Config("clock periods must be positive".to_string()));
        }
        Ok(())
    }

    /// Resolve relative paths against `base`.
    #[must_use]
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let paths = &mut self.paths;
        for path in [
            &mut paths.scratch_dir,
            &mut paths.result_dir,
            &mut paths.rtl_dir,
            &mut paths.sdc_dir,
            &mut paths.lib_db,
            &mut paths.lib_v,
            &mut paths.synthesis_template,
            &mut paths.testbench,
            &mut paths.simulation_template,
            &mut paths.helper,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Scratch directory owned by one (design, clock) pair.
    #[must_use]
    pub fn scratch_dir(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.paths
            .scratch_dir
            .join(design.id())
            .join(clock.mapping())
    }

    /// Result directory owned by one (design, clock) pair.
    #[must_use]
    pub fn result_dir(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.paths.result_dir.join(design.id()).join(clock.mapping())
    }

    /// Archive for logs and scripts of one (design, clock) pair.
    #[must_use]
    pub fn archive_dir(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.result_dir(design, clock).join("no_backup")
    }

    /// Synthesized netlist.
    #[must_use]
    pub fn netlist_path(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.result_dir(design, clock).join("post.v")
    }

    /// Timing annotation exported next to the netlist.
    #[must_use]
    pub fn timing_annotation_path(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.result_dir(design, clock).join("post.sdf")
    }

    /// Synthesis (area) report.
    #[must_use]
    pub fn synthesis_report_path(&self, design: &DesignVariant, clock: ClockPeriod) -> PathBuf {
        self.result_dir(design, clock).join("report_syn.rpt")
    }

    /// Power report for one precision.
    #[must_use]
    pub fn power_report_path(
        &self,
        design: &DesignVariant,
        clock: ClockPeriod,
        precision: Precision,
    ) -> PathBuf {
        self.result_dir(design, clock)
            .join(format!("report_power_{}.rpt", precision.code()))
    }

    /// Breakdown output directory for one clock period.
    #[must_use]
    pub fn breakdown_dir(&self, clock: ClockPeriod) -> PathBuf {
        self.paths
            .result_dir
            .join("breakdown")
            .join(clock.label())
            .join(self.family.label())
    }
}
