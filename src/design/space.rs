//! Design Space Enumerator
//!
//! Pure and deterministic: the order produced here is the canonical order
//! every breakdown table is reindexed to.

use super::{ClockPeriod, OperatingPoint};
use crate::config::SweepConfig;
use crate::pipeline::WorkItem;

/// Canonical enumeration of the sweep described by a [`SweepConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DesignSpace<'a> {
    config: &'a SweepConfig,
}

impl<'a> DesignSpace<'a> {
    /// Enumerate over a sweep configuration.
    #[must_use]
    pub const fn new(config: &'a SweepConfig) -> Self {
        Self { config }
    }

    /// Synthesis work items: clock-major, then catalogue order.
    #[must_use]
    pub fn synthesis_items(&self) -> Vec<WorkItem> {
        self.config
            .clocks
            .iter()
            .flat_map(|&clock| {
                self.config
                    .designs
                    .iter()
                    .map(move |design| WorkItem::synthesis(design.clone(), clock))
            })
            .collect()
    }

    /// Operating points: precision-major, then clock.
    #[must_use]
    pub fn operating_points(&self) -> Vec<OperatingPoint> {
        self.config
            .precisions
            .iter()
            .flat_map(|&precision| {
                self.config
                    .clocks
                    .iter()
                    .map(move |&clock| OperatingPoint::new(clock, precision))
            })
            .collect()
    }

    /// Power-simulation work items: operating point, then catalogue order.
    #[must_use]
    pub fn power_items(&self) -> Vec<WorkItem> {
        self.operating_points()
            .into_iter()
            .flat_map(|point| {
                self.config
                    .designs
                    .iter()
                    .map(move |design| WorkItem::power(design.clone(), point))
            })
            .collect()
    }

    /// One reduction pass per clock period.
    #[must_use]
    pub fn reduction_points(&self) -> Vec<ClockPeriod> {
        self.config.clocks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{DesignVariant, Precision};

    fn small_config() -> SweepConfig {
        SweepConfig {
            designs: vec![
                DesignVariant::parse("BG_L2_L4_00_L3_00_L2_00_DVAFS_0").unwrap(),
                DesignVariant::parse("BITFUSION").unwrap(),
            ],
            clocks: vec![ClockPeriod::from_ns(1.0), ClockPeriod::from_ns(5.0)],
            precisions: vec![Precision::Int8x8, Precision::Int2x2],
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_synthesis_items_are_clock_major() {
        let config = small_config();
        let items = DesignSpace::new(&config).synthesis_items();
        let labels: Vec<String> = items.iter().map(WorkItem::label).collect();
        assert_eq!(
            labels,
            vec![
                "BG_L2_L4_00_L3_00_L2_00_DVAFS_0/clk:1.00-1.00-1.00",
                "BITFUSION/clk:1.00-1.00-1.00",
                "BG_L2_L4_00_L3_00_L2_00_DVAFS_0/clk:5.00-5.00-5.00",
                "BITFUSION/clk:5.00-5.00-5.00",
            ]
        );
    }

    #[test]
    fn test_power_items_cover_full_product() {
        let config = small_config();
        let space = DesignSpace::new(&config);
        let items = space.power_items();
        assert_eq!(items.len(), 2 * 2 * 2);
        assert_eq!(items[0].label(), "BG_L2_L4_00_L3_00_L2_00_DVAFS_0/clk:1.00-1.00-1.00/8x8");
        assert_eq!(items[7].label(), "BITFUSION/clk:5.00-5.00-5.00/2x2");
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let config = small_config();
        let space = DesignSpace::new(&config);
        let first: Vec<String> = space.power_items().iter().map(WorkItem::label).collect();
        let second: Vec<String> = space.power_items().iter().map(WorkItem::label).collect();
        assert_eq!(first, second);
    }
}
