//! External tool seam
//!
//! The synthesis and simulation binaries are collaborators, not part of this
//! crate. Every invocation goes through [`ExternalTool`] so the stage runner
//! can be driven by a fake in tests.

use crate::config::SweepConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Which collaborator an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Structural synthesis (produces netlist + area report)
    Synthesis,
    /// Waveform simulation (produces the switching-activity trace)
    WaveformSimulation,
    /// Synthesis tool in measurement mode (produces the power report)
    PowerMeasurement,
}

/// A fully resolved external tool call.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Collaborator
    pub kind: ToolKind,
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory (the item's scratch directory)
    pub working_dir: PathBuf,
    /// Log file stdout/stderr are appended to
    pub log_file: PathBuf,
}

impl ToolInvocation {
    /// Batch synthesis with the generated setup script and the flow template.
    #[must_use]
    pub fn synthesis(config: &SweepConfig, working_dir: &Path) -> Self {
        Self {
            kind: ToolKind::Synthesis,
            program: config.tools.synthesis.clone(),
            args: vec![
                "-legacy_ui".to_string(),
                "-batch".to_string(),
                "-f".to_string(),
                "./syn_setup.tcl".to_string(),
                "-f".to_string(),
                config.paths.synthesis_template.display().to_string(),
            ],
            working_dir: working_dir.to_path_buf(),
            log_file: working_dir.join("syn.log"),
        }
    }

    /// Batch waveform simulation.
    #[must_use]
    pub fn waveform(
        config: &SweepConfig,
        working_dir: &Path,
        setup_script: &str,
        log_name: &str,
    ) -> Self {
        Self {
            kind: ToolKind::WaveformSimulation,
            program: config.tools.simulation.clone(),
            args: vec![
                "-batch".to_string(),
                "-do".to_string(),
                setup_script.to_string(),
                "-do".to_string(),
                config.paths.simulation_template.display().to_string(),
            ],
            working_dir: working_dir.to_path_buf(),
            log_file: working_dir.join(log_name),
        }
    }

    /// Power measurement against the corrected waveform.
    #[must_use]
    pub fn measurement(
        config: &SweepConfig,
        working_dir: &Path,
        script: &str,
        log_name: &str,
    ) -> Self {
        Self {
            kind: ToolKind::PowerMeasurement,
            program: config.tools.synthesis.clone(),
            args: vec![
                "-legacy_ui".to_string(),
                "-batch".to_string(),
                "-f".to_string(),
                script.to_string(),
            ],
            working_dir: working_dir.to_path_buf(),
            log_file: working_dir.join(log_name),
        }
    }
}

/// Something that can run an external tool to completion.
///
/// Implementations block until the tool exits. The exit status is not an
/// error: tools are validated through the artifacts and logs they leave.
pub trait ExternalTool: Send + Sync {
    /// Run the invocation.
    ///
    /// # Errors
    ///
    /// Returns error only if the tool could not be started.
    fn invoke(&self, invocation: &ToolInvocation) -> Result<()>;
}

/// Runs tools as child processes, one per invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher {
    _private: (),
}

impl ProcessLauncher {
    /// Create a launcher.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl ExternalTool for ProcessLauncher {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<()> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&invocation.log_file)?;
        let stderr = log.try_clone()?;

        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = %invocation.working_dir.display(),
            "launching external tool"
        );

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(|e| Error::ToolLaunch {
                tool: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            warn!(
                program = %invocation.program,
                %status,
                log = %invocation.log_file.display(),
                "external tool exited unsuccessfully"
            );
        }
        Ok(())
    }
}
