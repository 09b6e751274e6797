//! # auto-sweep: Design-Space Power/Area Characterization
//!
//! **Version**: 0.3.0
//!
//! auto-sweep sweeps a hardware design space (design variants × clock periods ×
//! numeric precisions), drives a structural synthesis tool and a gate-level
//! power simulation flow for every point, and reduces the resulting text
//! reports into comparable power/area breakdown tables.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Negative derived metrics are flagged, never clamped
//! - **Poka-Yoke safety**: Work items own disjoint directory subtrees, so pool
//!   workers never write the same path
//! - **Muda elimination**: Cached artifacts skip the external tool entirely
//! - **Heijunka**: Bounded worker pools per phase (narrow synthesis, wide simulation)
//!
//! ## Pipeline
//!
//! ```text
//! DesignSpace ──> Phase 1: synthesis pool ──(barrier)──> Phase 2: power pool
//!                                                              │
//!                      breakdown/<clk>/<family>/{area,power} <─┘ Phase 3: reduction
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use auto_sweep::config::SweepConfig;
//! use auto_sweep::pipeline::{Dispatcher, ProcessLauncher};
//!
//! let config = SweepConfig::default();
//! let tool = ProcessLauncher::new();
//! let summary = Dispatcher::new(&config, &tool).run()?;
//! println!("{} breakdowns written", summary.breakdowns.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod breakdown;
pub mod config;
pub mod design;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod pipeline;

pub use error::{Error, Result};
