//! Derived-metric formulas
//!
//! Derived keys are differences of reduced keys along the design hierarchy.
//! Order matters: `seq` reads `in_reg`, `comb` reads `seq`.

use super::{AreaKey, MetricSet, PowerKey};

/// Decimal digits power values are rounded to after reduction and after
/// every subtraction.
pub const ROUNDING_DECIMALS: i32 = 4;

/// Round to [`ROUNDING_DECIMALS`] decimal digits, exact ties to even.
#[must_use]
pub fn round4(value: f64) -> f64 {
    let scale = 10f64.powi(ROUNDING_DECIMALS);
    (value * scale).round_ties_even() / scale
}

/// `in_reg`, `others`, `seq`, `comb` from the area hierarchy.
pub fn derive_area(set: &mut MetricSet<AreaKey>) {
    let top = set.get(AreaKey::Top);
    let mac = set.get(AreaKey::Mac);
    let out_reg = set.get(AreaKey::OutReg);

    let in_reg = top - mac;
    set.set_derived(AreaKey::InReg, in_reg);
    set.set_derived(
        AreaKey::Others,
        mac - set.get(AreaKey::Mult2x2) - out_reg,
    );
    let seq = in_reg + out_reg;
    set.set_derived(AreaKey::Seq, seq);
    set.set_derived(AreaKey::Comb, top - seq);
}

/// `accum` and the three adder-tree levels from the power hierarchy.
pub fn derive_power(set: &mut MetricSet<PowerKey>) {
    let l4 = set.get(PowerKey::L4);
    let l3 = set.get(PowerKey::L3);
    let l2 = set.get(PowerKey::L2);

    set.set_derived(
        PowerKey::Accum,
        round4(set.get(PowerKey::Top) - set.get(PowerKey::InReg) - l4 - set.get(PowerKey::OutReg)),
    );
    set.set_derived(PowerKey::L4Tree, round4(l4 - l3));
    set.set_derived(PowerKey::L3Tree, round4(l3 - l2));
    set.set_derived(
        PowerKey::L2Tree,
        round4(l2 - set.get(PowerKey::Mult2x2) - set.get(PowerKey::PipeReg)),
    );
}
