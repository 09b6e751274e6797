//! Characterization pipeline
//!
//! Work items flow through two sequential, bounded worker pools (synthesis,
//! then power simulation) and a reduction phase. Each item owns a disjoint
//! `<design>/<clock mapping>` subtree, so workers share no mutable state
//! other than the [`StatusLedger`].

mod dispatcher;
mod ledger;
mod pool;
mod runner;
pub mod scripts;
mod shutdown;
mod tool;
mod work;

pub use dispatcher::{Dispatcher, SweepSummary, SUMMARY_FILE};
pub use ledger::{LedgerEvent, StatusLedger};
pub use pool::WorkerPool;
pub use runner::{archive_file, delete_line_range, StageRunner, WAVEFORM_PLACEHOLDER_LINES};
pub use shutdown::{emergency_cleanup, CleanupOutcome, SweepCancel};
pub use tool::{ExternalTool, ProcessLauncher, ToolInvocation, ToolKind};
pub use work::{Phase, WorkItem, WorkStatus};
