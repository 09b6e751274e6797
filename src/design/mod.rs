//! Design space model
//!
//! ## Schema Overview
//!
//! ```text
//! DesignVariant ──(id ↔ StructuralConfig, fixed at startup)
//!       │
//!       └──< OperatingPoint (ClockPeriod × Precision)
//! ```

mod precision;
mod space;
mod variant;

pub use precision::{ClockPeriod, OperatingPoint, Precision};
pub use space::DesignSpace;
pub use variant::{BitGroup, DesignVariant, LevelMode, StructuralConfig};
