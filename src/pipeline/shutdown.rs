//! Emergency cleanup on interrupt or unrecoverable error
//!
//! Tool children are terminated by process name, since the pool workers
//! that spawned them hold no handles the main thread can reach. Nothing
//! here may fail: every problem is logged and cleanup carries on.
//!
//! Workers keep picking up items until they see the [`SweepCancel`] flag,
//! so the flag must be raised before the kill: a tool started after
//! `killall` would outlive the process.

use crate::config::SweepConfig;
use std::fs;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared stop flag, checked by workers before every tool launch.
#[derive(Debug, Clone, Default)]
pub struct SweepCancel(Arc<AtomicBool>);

impl SweepCancel {
    /// Create a flag that is not raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Every clone sees it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag is raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What emergency cleanup managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Process names `killall` reported success for
    pub killed: Vec<String>,
    /// Whether the scratch tree is gone
    pub scratch_removed: bool,
}

/// Kill every external tool process by name, then delete the scratch tree.
#[must_use]
pub fn emergency_cleanup(config: &SweepConfig) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    for name in config.tools.process_names() {
        match Command::new("killall")
            .arg(name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {
                info!(process = name, "terminated");
                outcome.killed.push(name.to_string());
            }
            Ok(status) => info!(process = name, %status, "no process to terminate"),
            Err(e) => warn!(process = name, error = %e, "could not run killall"),
        }
    }

    let scratch = &config.paths.scratch_dir;
    match fs::remove_dir_all(scratch) {
        Ok(()) => {
            info!(dir = %scratch.display(), "scratch directory removed");
            outcome.scratch_removed = true;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => outcome.scratch_removed = true,
        Err(e) => warn!(dir = %scratch.display(), error = %e, "could not remove scratch directory"),
    }

    outcome
}
