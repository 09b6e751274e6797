//! Built-in extraction rules for the synthesis and power reports.

use super::{ColumnLayout, ExtractionRule};
use crate::metrics::{AreaKey, MetricKey, PowerKey};

/// A metric key catalogue with built-in extraction rules.
///
/// Derived keys carry no rule.
pub trait Extractable: MetricKey {
    /// One rule per extracted key.
    const RULES: &'static [ExtractionRule<Self>];
}

const fn rule<K: MetricKey>(key: K, name: &'static str, layout: ColumnLayout) -> ExtractionRule<K> {
    ExtractionRule { key, name, layout }
}

impl Extractable for AreaKey {
    const RULES: &'static [ExtractionRule<Self>] = &[
        rule(Self::Top, r"top_L4_mac", ColumnLayout::Standard),
        rule(Self::Mac, r".+L4\s+L4_mac\w+", ColumnLayout::Standard),
        rule(Self::Mult, r".+L4_mult\s+L4_mult\w+", ColumnLayout::Standard),
        rule(Self::Mult2x2, r".+mult_2b.+mult_2b\w+", ColumnLayout::Standard),
        rule(Self::Count, r".+count_\w+", ColumnLayout::Words { skip: 4 }),
        rule(Self::OutReg, r"sequential", ColumnLayout::Integer { skip: 1 }),
    ];
}

impl Extractable for PowerKey {
    const RULES: &'static [ExtractionRule<Self>] = &[
        rule(Self::Top, r"top_L4_mac", ColumnLayout::Standard),
        rule(Self::Mac, r"\s+L4", ColumnLayout::Standard),
        rule(Self::L4, r"\s+L4_mult", ColumnLayout::Standard),
        rule(Self::Mult2x2, r"\s+mult_2b.+mult", ColumnLayout::Standard),
        rule(Self::L2, r"\s+L2_mult.+L2", ColumnLayout::Standard),
        rule(Self::L3, r"\s+L3_mult.+L3", ColumnLayout::Standard),
        rule(Self::Count, r".+count_\w+", ColumnLayout::Standard),
        rule(Self::OutReg, r"L4/\w*_reg\[\d*\]", ColumnLayout::Loose { skip: 2 }),
        rule(
            Self::PipeReg,
            r"L4/\w*\.\.\w*(?:shift|/out)_reg\[\d*\]",
            ColumnLayout::Loose { skip: 2 },
        ),
        rule(Self::InReg, r"\w_reg_reg(?:\[.*\]){5}", ColumnLayout::Loose { skip: 2 }),
    ];
}
