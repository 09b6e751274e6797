//! Precisions, clock periods and operating points

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operand precision of a multiply-accumulate.
///
/// Variant order follows the label order, so the derived `Ord` sorts
/// `2x2 < 4x4 < 8x2 < 8x4 < 8x8`; tables list precisions in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Precision {
    /// 2b × 2b
    Int2x2,
    /// 4b × 4b
    Int4x4,
    /// 8b × 2b
    Int8x2,
    /// 8b × 4b
    Int8x4,
    /// 8b × 8b
    Int8x8,
}

impl Precision {
    /// All precisions, in table order (descending).
    pub const TABLE_ORDER: [Self; 5] = [
        Self::Int8x8,
        Self::Int8x4,
        Self::Int8x2,
        Self::Int4x4,
        Self::Int2x2,
    ];

    /// Four-bit mode code driven into the test bench.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Int8x8 => "0000",
            Self::Int8x4 => "0010",
            Self::Int8x2 => "0011",
            Self::Int4x4 => "1010",
            Self::Int2x2 => "1111",
        }
    }

    /// Human-readable label used as the power table index.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Int8x8 => "8x8",
            Self::Int8x4 => "8x4",
            Self::Int8x2 => "8x2",
            Self::Int4x4 => "4x4",
            Self::Int2x2 => "2x2",
        }
    }

    /// Parse a four-bit mode code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPrecision`] for codes outside the enumeration.
    pub fn from_code(code: &str) -> Result<Self> {
        Self::TABLE_ORDER
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or_else(|| Error::UnknownPrecision(code.to_string()))
    }

    /// Sort precisions into the fixed descending table order, dropping duplicates.
    #[must_use]
    pub fn table_order(precisions: &[Self]) -> Vec<Self> {
        let mut ordered = precisions.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        ordered
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for Precision {
    type Error = Error;

    fn try_from(code: String) -> Result<Self> {
        Self::from_code(&code)
    }
}

impl From<Precision> for String {
    fn from(precision: Precision) -> Self {
        precision.code().to_string()
    }
}

/// Clock period in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockPeriod(f64);

impl ClockPeriod {
    /// Create a clock period (ns).
    #[must_use]
    pub const fn from_ns(ns: f64) -> Self {
        Self(ns)
    }

    /// Period in nanoseconds.
    #[must_use]
    pub const fn ns(self) -> f64 {
        self.0
    }

    /// Clock mapping directory name: one period per precision mode.
    ///
    /// All three modes share the same period: `clk:1.00-1.00-1.00`.
    #[must_use]
    pub fn mapping(self) -> String {
        format!("clk:{0:.2}-{0:.2}-{0:.2}", self.0)
    }

    /// Decimal label used for breakdown directories (`1.0`, `2.5`).
    #[must_use]
    pub fn label(self) -> String {
        format!("{:?}", self.0)
    }
}

impl fmt::Display for ClockPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A (clock period, precision) pair at which a variant is measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    /// Clock period
    pub clock: ClockPeriod,
    /// Operand precision
    pub precision: Precision,
}

impl OperatingPoint {
    /// Create an operating point.
    #[must_use]
    pub const fn new(clock: ClockPeriod, precision: Precision) -> Self {
        Self { clock, precision }
    }
}
