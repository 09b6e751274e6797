//! Stage Runner
//!
//! Drives one work item through its external tool(s):
//!
//! ```text
//! Pending ─(artifact exists)─────────────────────────────> DoneCached
//!    └─> ConfigWritten ─> ToolRunning ─> Validated ─> Archived ─> DoneFresh
//!                              └──────────────┴──> Failed
//! ```
//!
//! Re-running a stage whose canonical artifact exists never invokes a tool,
//! so the whole sweep can be restarted at any point.

use super::ledger::StatusLedger;
use super::scripts;
use super::shutdown::SweepCancel;
use super::tool::{ExternalTool, ToolInvocation};
use super::work::{Phase, WorkItem, WorkStatus};
use crate::config::SweepConfig;
use crate::design::Precision;
use crate::{Error, Result};
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 1-based line range of every waveform trace that holds blank placeholders
/// for test-bench signals the simulator does not record. These lines must go
/// before power measurement reads the trace.
pub const WAVEFORM_PLACEHOLDER_LINES: RangeInclusive<usize> = 10..=15;

/// Delete a 1-based inclusive line range from a file in place.
///
/// The file is streamed through a sibling temporary file, so traces larger
/// than memory are fine. The temporary file never outlives the call.
/// Returns the number of lines removed.
///
/// # Errors
///
/// Returns error if the file cannot be read or replaced.
pub fn delete_line_range(path: &Path, range: &RangeInclusive<usize>) -> io::Result<usize> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".fixing");
    let tmp_path = PathBuf::from(tmp_name);

    let outcome = copy_without_range(path, &tmp_path, range)
        .and_then(|removed| fs::rename(&tmp_path, path).map(|()| removed));
    if outcome.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(file = %tmp_path.display(), error = %e, "could not remove partial trace");
            }
        }
    }
    outcome
}

fn copy_without_range(
    src: &Path,
    dest: &Path,
    range: &RangeInclusive<usize>,
) -> io::Result<usize> {
    let mut reader = BufReader::new(File::open(src)?);
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut line = Vec::new();
    let mut line_no = 0;
    let mut removed = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_no += 1;
        if range.contains(&line_no) {
            removed += 1;
        } else {
            writer.write_all(&line)?;
        }
    }
    writer.flush()?;
    Ok(removed)
}

/// Move a file into an archive directory, falling back to copy + remove
/// when a rename cannot cross filesystems.
///
/// # Errors
///
/// Returns error if the file cannot be moved.
pub fn archive_file(src: &Path, archive_dir: &Path, name: &str) -> io::Result<()> {
    fs::create_dir_all(archive_dir)?;
    let dest = archive_dir.join(name);
    if fs::rename(src, &dest).is_err() {
        fs::copy(src, &dest)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Drives work items through the stage state machine.
pub struct StageRunner<'a, T: ExternalTool + ?Sized> {
    config: &'a SweepConfig,
    tool: &'a T,
    ledger: &'a StatusLedger,
    cancel: SweepCancel,
    error_count: Regex,
}

impl<'a, T: ExternalTool + ?Sized> StageRunner<'a, T> {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns error if the log validation pattern fails to compile.
    pub fn new(config: &'a SweepConfig, tool: &'a T, ledger: &'a StatusLedger) -> Result<Self> {
        Ok(Self {
            config,
            tool,
            ledger,
            cancel: SweepCancel::new(),
            error_count: Regex::new(r"Errors: ([1-9][0-9]*)")?,
        })
    }

    /// Share a stop flag: once raised, no further tool is launched.
    #[must_use]
    pub fn with_cancel(mut self, cancel: SweepCancel) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the item's stage. On error the item is marked `Failed` before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure or if the tool cannot be launched.
    pub fn run(&self, item: &mut WorkItem) -> Result<WorkStatus> {
        self.ledger.record(item);
        let outcome = match item.phase() {
            Phase::Synthesis => self.synthesize(item),
            Phase::PowerSimulation => self.simulate_power(item),
        };
        outcome.map_err(|e| {
            if !item.status().is_terminal() {
                let _ = self.advance(item, WorkStatus::Failed);
            }
            e
        })
    }

    fn launch(&self, label: &str, invocation: &ToolInvocation) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(format!("{:?} for {label}", invocation.kind)));
        }
        self.tool.invoke(invocation)
    }

    fn advance(&self, item: &mut WorkItem, next: WorkStatus) -> Result<WorkStatus> {
        item.advance(next)?;
        self.ledger.record(item);
        Ok(next)
    }

    fn synthesize(&self, item: &mut WorkItem) -> Result<WorkStatus> {
        let label = item.label();
        let netlist = item.artifact_path(self.config);
        if netlist.exists() {
            info!(item = %label, "netlist already exists, skipping synthesis");
            return self.advance(item, WorkStatus::DoneCached);
        }

        let scratch = item.scratch_dir(self.config);
        let export = item.result_dir(self.config);
        fs::create_dir_all(&scratch)?;
        fs::create_dir_all(&export)?;
        let report = self
            .config
            .synthesis_report_path(item.design(), item.clock());
        fs::write(
            scratch.join(scripts::SYNTHESIS_SETUP),
            scripts::synthesis_setup(self.config, item.design(), item.clock(), &export, &report),
        )?;
        self.advance(item, WorkStatus::ConfigWritten)?;

        info!(item = %label, "starting synthesis");
        self.advance(item, WorkStatus::ToolRunning)?;
        let invocation = ToolInvocation::synthesis(self.config, &scratch);
        self.launch(&label, &invocation)?;

        let archive = self.config.archive_dir(item.design(), item.clock());
        if let Err(e) = archive_file(&invocation.log_file, &archive, "syn.log") {
            warn!(item = %label, error = %e, "could not archive synthesis log");
        }

        if !netlist.exists() {
            warn!(item = %label, netlist = %netlist.display(), "synthesis left no netlist");
            return self.advance(item, WorkStatus::Failed);
        }
        self.advance(item, WorkStatus::Validated)?;
        self.advance(item, WorkStatus::Archived)?;
        info!(item = %label, "finished synthesis");
        self.advance(item, WorkStatus::DoneFresh)
    }

    fn simulate_power(&self, item: &mut WorkItem) -> Result<WorkStatus> {
        let label = item.label();
        let precision = item
            .precision()
            .ok_or_else(|| Error::Other(format!("{label}: power item without precision")))?;
        let report = item.artifact_path(self.config);
        if report.exists() && !self.config.overwrite_power {
            info!(item = %label, "power report already exists, skipping power simulation");
            return self.advance(item, WorkStatus::DoneCached);
        }

        let design = item.design().clone();
        let clock = item.clock();
        let scratch = item.scratch_dir(self.config);
        let export = item.result_dir(self.config);
        fs::create_dir_all(&scratch)?;
        fs::create_dir_all(&export)?;

        let setup_name = scripts::waveform_setup_name(precision, &design);
        fs::write(
            scratch.join(&setup_name),
            scripts::waveform_setup(self.config, &design, precision, clock, &export),
        )?;
        self.advance(item, WorkStatus::ConfigWritten)?;

        info!(item = %label, "generating waveform");
        self.advance(item, WorkStatus::ToolRunning)?;
        let sim_log = format!("vsim_PB_{}.log", precision.code());
        let simulation = ToolInvocation::waveform(self.config, &scratch, &setup_name, &sim_log);
        self.launch(&label, &simulation)?;

        let trace = scratch.join(scripts::waveform_name(precision, clock, &design));
        if trace.exists() {
            let removed = delete_line_range(&trace, &WAVEFORM_PLACEHOLDER_LINES)?;
            debug!(item = %label, removed, "removed placeholder lines from waveform");
        }

        match self.simulation_errors(&simulation.log_file) {
            Ok(Some(count)) => {
                warn!(item = %label, errors = count, "simulation reported assertion errors");
            }
            Ok(None) => {}
            Err(e) => warn!(item = %label, error = %e, "could not read simulation log"),
        }

        if !trace.exists() {
            warn!(item = %label, trace = %trace.display(), "can't find waveform trace");
            return self.advance(item, WorkStatus::Failed);
        }
        self.advance(item, WorkStatus::Validated)?;

        info!(item = %label, "measuring power");
        let script_name = scripts::measurement_script_name(precision, &design);
        fs::write(
            scratch.join(&script_name),
            scripts::measurement_script(self.config, &design, precision, clock, &export, &report),
        )?;
        let measure_log = format!("genus_PB_{}.log", precision.code());
        let measurement =
            ToolInvocation::measurement(self.config, &scratch, &script_name, &measure_log);
        self.launch(&label, &measurement)?;

        self.archive_power_outputs(item, precision, &scratch, &script_name, &trace);

        if !report.exists() {
            warn!(item = %label, report = %report.display(), "measurement left no power report");
            return self.advance(item, WorkStatus::Failed);
        }
        self.advance(item, WorkStatus::Archived)?;
        self.advance(item, WorkStatus::DoneFresh)
    }

    /// Best-effort: move scripts and logs to the archive, then reclaim the
    /// trace. Failures are logged only.
    fn archive_power_outputs(
        &self,
        item: &WorkItem,
        precision: Precision,
        scratch: &Path,
        script_name: &str,
        trace: &Path,
    ) {
        let label = item.label();
        let code = precision.code();
        let archive = self.config.archive_dir(item.design(), item.clock());
        info!(item = %label, "backing up scripts and logs");
        let moves = [
            (script_name.to_string(), format!("power_{code}.tcl")),
            (format!("vsim_PB_{code}.log"), format!("vsim_PB_{code}.log")),
            (format!("genus_PB_{code}.log"), format!("genus_PB_{code}.log")),
        ];
        for (src, dest) in &moves {
            if let Err(e) = archive_file(&scratch.join(src), &archive, dest) {
                warn!(item = %label, file = %src, error = %e, "could not archive");
            }
        }
        match fs::remove_file(trace) {
            Ok(()) => debug!(item = %label, "waveform trace deleted"),
            Err(e) => warn!(item = %label, error = %e, "could not delete waveform trace"),
        }
    }

    /// Error count reported on the final line of the simulation log.
    ///
    /// Only the final line is inspected; errors reported mid-log are not seen.
    fn simulation_errors(&self, log: &Path) -> io::Result<Option<u64>> {
        let bytes = fs::read(log)?;
        let text = String::from_utf8_lossy(&bytes);
        let Some(last) = text.lines().last() else {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty log"));
        };
        Ok(self
            .error_count
            .captures(last)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok()))
    }
}
