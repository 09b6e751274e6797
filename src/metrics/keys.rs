//! Closed metric-key catalogues
//!
//! Column order of every breakdown table is the declaration order here.

use super::derive;
use super::MetricSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Report grammar a metric key is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportGrammar {
    /// Synthesis area report: integer cell areas
    Area,
    /// Power report: float power values with a leading breakdown column
    Power,
}

/// Numeric type a metric reduces to.
pub trait MetricValue:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + FromStr + Send + Sync + 'static
{
    /// Lossy conversion for reporting.
    fn as_f64(self) -> f64;

    /// Whether the value breaks the non-negativity invariant.
    fn is_negative(self) -> bool;
}

impl MetricValue for i64 {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(self) -> f64 {
        self as f64
    }

    fn is_negative(self) -> bool {
        self < 0
    }
}

impl MetricValue for f64 {
    fn as_f64(self) -> f64 {
        self
    }

    fn is_negative(self) -> bool {
        self < 0.0
    }
}

/// A closed enumeration of metric keys for one report grammar.
pub trait MetricKey: Copy + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Scalar type samples are parsed into.
    type Value: MetricValue;

    /// Grammar of the report this key is read from.
    const GRAMMAR: ReportGrammar;

    /// Every key, in table column order.
    const ALL: &'static [Self];

    /// Column name.
    fn name(self) -> &'static str;

    /// Whether the value is computed from other keys rather than extracted.
    fn is_derived(self) -> bool;

    /// Reduce a key's sample list to one scalar.
    fn reduce(samples: &[Self::Value]) -> Self::Value;

    /// Compute derived keys from reduced ones, in dependency order.
    fn derive(set: &mut MetricSet<Self>);
}

/// Area metrics (synthesis report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKey {
    /// Whole MAC including input registers
    Top,
    /// MAC without input registers
    Mac,
    /// Multiplier array
    Mult,
    /// All 2x2 multiplier leaves
    #[serde(rename = "mult_2x2")]
    Mult2x2,
    /// Precision counters
    Count,
    /// Output (accumulation) register
    OutReg,
    /// Input registers (derived)
    InReg,
    /// Adder trees and glue (derived)
    Others,
    /// All sequential cells (derived)
    Seq,
    /// All combinational cells (derived)
    Comb,
}

impl MetricKey for AreaKey {
    type Value = i64;
    const GRAMMAR: ReportGrammar = ReportGrammar::Area;
    const ALL: &'static [Self] = &[
        Self::Top,
        Self::Mac,
        Self::Mult,
        Self::Mult2x2,
        Self::Count,
        Self::OutReg,
        Self::InReg,
        Self::Others,
        Self::Seq,
        Self::Comb,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Mac => "mac",
            Self::Mult => "mult",
            Self::Mult2x2 => "mult_2x2",
            Self::Count => "count",
            Self::OutReg => "out_reg",
            Self::InReg => "in_reg",
            Self::Others => "others",
            Self::Seq => "seq",
            Self::Comb => "comb",
        }
    }

    fn is_derived(self) -> bool {
        matches!(self, Self::InReg | Self::Others | Self::Seq | Self::Comb)
    }

    fn reduce(samples: &[i64]) -> i64 {
        samples.iter().sum()
    }

    fn derive(set: &mut MetricSet<Self>) {
        derive::derive_area(set);
    }
}

/// Power metrics (power report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKey {
    /// Whole MAC
    Top,
    /// MAC without input registers
    Mac,
    /// Level-4 multiplier
    L4,
    /// Level-3 multipliers
    L3,
    /// Level-2 multipliers
    L2,
    /// Level-4 adder tree (derived)
    L4Tree,
    /// Level-3 adder trees (derived)
    L3Tree,
    /// Level-2 adder trees (derived)
    L2Tree,
    /// 2x2 multiplier leaves
    #[serde(rename = "mult_2x2")]
    Mult2x2,
    /// Precision counters
    Count,
    /// Output register
    OutReg,
    /// Pipeline registers inside the multiplier
    PipeReg,
    /// Input registers
    InReg,
    /// Accumulation logic (derived)
    Accum,
}

impl MetricKey for PowerKey {
    type Value = f64;
    const GRAMMAR: ReportGrammar = ReportGrammar::Power;
    const ALL: &'static [Self] = &[
        Self::Top,
        Self::Mac,
        Self::L4,
        Self::L3,
        Self::L2,
        Self::L4Tree,
        Self::L3Tree,
        Self::L2Tree,
        Self::Mult2x2,
        Self::Count,
        Self::OutReg,
        Self::PipeReg,
        Self::InReg,
        Self::Accum,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Mac => "mac",
            Self::L4 => "L4",
            Self::L3 => "L3",
            Self::L2 => "L2",
            Self::L4Tree => "L4_tree",
            Self::L3Tree => "L3_tree",
            Self::L2Tree => "L2_tree",
            Self::Mult2x2 => "mult_2x2",
            Self::Count => "count",
            Self::OutReg => "out_reg",
            Self::PipeReg => "pipe_reg",
            Self::InReg => "in_reg",
            Self::Accum => "accum",
        }
    }

    fn is_derived(self) -> bool {
        matches!(
            self,
            Self::L4Tree | Self::L3Tree | Self::L2Tree | Self::Accum
        )
    }

    fn reduce(samples: &[f64]) -> f64 {
        derive::round4(samples.iter().sum())
    }

    fn derive(set: &mut MetricSet<Self>) {
        derive::derive_power(set);
    }
}
