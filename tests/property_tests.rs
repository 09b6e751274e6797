//! Property-based tests for auto-sweep
//!
//! - Derived metrics satisfy the hierarchy identities for any report
//! - Extraction is insensitive to line order and unrelated lines
//! - Tables always come out in canonical order
//! - Run with ProptestConfig::with_cases(100)

use auto_sweep::breakdown::BreakdownTable;
use auto_sweep::config::{Family, SweepConfig};
use auto_sweep::design::{DesignSpace, DesignVariant, Precision};
use auto_sweep::extract::Catalogue;
use auto_sweep::metrics::{round4, AreaKey, MetricSet, PowerKey, RawMetricSample, SampleSet};
use proptest::prelude::*;
use std::collections::HashMap;

// ============================================================================
// Strategies
// ============================================================================

/// Area sub-instance values that respect the containment hierarchy.
fn arb_area_hierarchy() -> impl Strategy<Value = Vec<(AreaKey, i64)>> {
    (
        proptest::collection::vec(1i64..500, 1..16),
        0i64..2_000,
        0i64..2_000,
        0i64..2_000,
    )
        .prop_map(|(leaves, out_reg, others, in_reg)| {
            let mult_2x2: i64 = leaves.iter().sum();
            let mac = mult_2x2 + out_reg + others;
            let top = mac + in_reg;
            let mut samples = vec![
                (AreaKey::Top, top),
                (AreaKey::Mac, mac),
                (AreaKey::OutReg, out_reg),
            ];
            samples.extend(leaves.into_iter().map(|v| (AreaKey::Mult2x2, v)));
            samples
        })
}

/// Arbitrary power samples in report units (4 decimals).
fn arb_power_samples() -> impl Strategy<Value = Vec<(PowerKey, f64)>> {
    let extracted = [
        PowerKey::Top,
        PowerKey::Mac,
        PowerKey::L4,
        PowerKey::L3,
        PowerKey::L2,
        PowerKey::Mult2x2,
        PowerKey::Count,
        PowerKey::OutReg,
        PowerKey::PipeReg,
        PowerKey::InReg,
    ];
    proptest::collection::vec(
        (proptest::sample::select(extracted.to_vec()), 0u32..10_000_000),
        0..40,
    )
    .prop_map(|samples| {
        samples
            .into_iter()
            .map(|(key, raw)| (key, f64::from(raw) / 10_000.0))
            .collect()
    })
}

fn area_set(samples: &[(AreaKey, i64)]) -> MetricSet<AreaKey> {
    let mut set = SampleSet::new("prop");
    set.extend(
        samples
            .iter()
            .map(|&(key, value)| RawMetricSample { key, value, line: 0 }),
    );
    set.reduce_and_derive()
}

fn power_set(samples: &[(PowerKey, f64)]) -> MetricSet<PowerKey> {
    let mut set = SampleSet::new("prop");
    set.extend(
        samples
            .iter()
            .map(|&(key, value)| RawMetricSample { key, value, line: 0 }),
    );
    set.reduce_and_derive()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: comb + seq == top exactly, for any area report
    #[test]
    fn prop_area_comb_plus_seq_is_top(
        samples in proptest::collection::vec(
            (proptest::sample::select(vec![AreaKey::Top, AreaKey::Mac, AreaKey::Mult2x2, AreaKey::OutReg]), -5_000i64..5_000),
            0..30,
        )
    ) {
        let set = area_set(&samples);
        prop_assert_eq!(set.get(AreaKey::Comb) + set.get(AreaKey::Seq), set.get(AreaKey::Top));
    }

    /// Property: a well-formed hierarchy never raises a violation
    #[test]
    fn prop_consistent_hierarchy_has_no_violation(samples in arb_area_hierarchy()) {
        let set = area_set(&samples);
        prop_assert!(set.is_consistent(), "{:?}", set.violations());
        prop_assert!(set.get(AreaKey::InReg) >= 0);
        prop_assert!(set.get(AreaKey::Others) >= 0);
    }

    /// Property: negative derived values are always flagged, never clamped
    #[test]
    fn prop_negative_derived_values_are_flagged(samples in arb_power_samples()) {
        let set = power_set(&samples);
        for key in [PowerKey::Accum, PowerKey::L4Tree, PowerKey::L3Tree, PowerKey::L2Tree] {
            let flagged = set.violations().iter().any(|v| v.key == key_name(key));
            prop_assert_eq!(set.get(key) < 0.0, flagged);
        }
    }

    /// Property: the adder-tree decomposition rebuilds L4 within 1e-4
    #[test]
    fn prop_power_tree_rebuilds_l4(samples in arb_power_samples()) {
        let set = power_set(&samples);
        let rebuilt = set.get(PowerKey::L4Tree)
            + set.get(PowerKey::L3Tree)
            + set.get(PowerKey::L2Tree)
            + set.get(PowerKey::Mult2x2)
            + set.get(PowerKey::PipeReg);
        prop_assert!((rebuilt - set.get(PowerKey::L4)).abs() < 1e-4);
    }

    /// Property: reduced and derived power values carry at most 4 decimals
    #[test]
    fn prop_power_values_are_rounded(samples in arb_power_samples()) {
        let set = power_set(&samples);
        for key in [PowerKey::Top, PowerKey::Mult2x2, PowerKey::Accum, PowerKey::L2Tree] {
            let value = set.get(key);
            prop_assert!((round4(value) - value).abs() < 1e-9);
        }
    }

    /// Property: line order does not change the extracted totals
    #[test]
    fn prop_extraction_ignores_line_order(
        values in proptest::collection::vec(1i64..1000, 1..12),
        noise in proptest::collection::vec("[a-z ]{0,20}", 0..6),
    ) {
        let catalogue = Catalogue::<AreaKey>::builtin().unwrap();
        let mut lines: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("  L4/m{i}/mult_2b_{i}  mult_2b_BG  1  2  3  {v}"))
            .collect();
        lines.extend(noise);
        let forward = catalogue.extract("f", &lines.join("\n")).reduce();
        lines.reverse();
        let backward = catalogue.extract("b", &lines.join("\n")).reduce();

        let expected: i64 = values.iter().sum();
        prop_assert_eq!(forward.get(AreaKey::Mult2x2), expected);
        prop_assert_eq!(backward.get(AreaKey::Mult2x2), expected);
    }

    /// Property: area rows follow the catalogue whatever order results arrive in
    #[test]
    fn prop_area_table_is_canonical(order in Just((0..18usize).collect::<Vec<_>>()).prop_shuffle()) {
        let designs = Family::SubwordUnit.catalogue();
        let sets: HashMap<String, MetricSet<AreaKey>> = order
            .iter()
            .map(|&i| (designs[i].id().to_string(), area_set(&[(AreaKey::Top, i as i64)])))
            .collect();
        let table = BreakdownTable::area(&designs, &sets).unwrap();
        let expected: Vec<String> = designs.iter().map(|d| d.id().to_string()).collect();
        prop_assert_eq!(table.row_labels(), expected);
        for (row, _) in designs.iter().enumerate() {
            prop_assert_eq!(table.value(row, "top"), Some(row as f64));
        }
    }

    /// Property: power rows are precision-major, descending
    #[test]
    fn prop_power_precisions_descend(
        precisions in proptest::sample::subsequence(Precision::TABLE_ORDER.to_vec(), 1..=5).prop_shuffle()
    ) {
        let designs: Vec<DesignVariant> = ["BITFUSION", "LOOM"]
            .iter()
            .map(|id| DesignVariant::parse(id).unwrap())
            .collect();
        let table = BreakdownTable::power(&precisions, &designs, &HashMap::new()).unwrap();
        let labels = table.row_labels();
        let order = Precision::table_order(&precisions);
        prop_assert_eq!(labels.len(), order.len() * 2);
        for (i, precision) in order.iter().enumerate() {
            prop_assert_eq!(&labels[2 * i], &format!("{}/BITFUSION", precision.label()));
        }
        prop_assert_eq!(table.null_rows(), labels.len());
    }
}

fn key_name(key: PowerKey) -> &'static str {
    use auto_sweep::metrics::MetricKey;
    key.name()
}

#[test]
fn test_enumeration_is_deterministic() {
    let config = SweepConfig::default();
    let space = DesignSpace::new(&config);
    let first: Vec<String> = space.power_items().iter().map(|i| i.label()).collect();
    let second: Vec<String> = space.power_items().iter().map(|i| i.label()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 54 * 2 * 5);
    assert_eq!(space.synthesis_items().len(), 54 * 2);
}
