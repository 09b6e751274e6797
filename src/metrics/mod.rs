//! Metric Derivation Engine
//!
//! ## Schema Overview
//!
//! ```text
//! RawMetricSample (N per key) ──reduce──> MetricSet (1 scalar per key)
//!                                              │
//!                                              └──derive──> derived keys + InvariantViolation (N)
//! ```
//!
//! Reduction and derivation run once per work item report. Sets are built
//! fresh on every reduction pass and hold no state between passes.

mod derive;
mod keys;

pub use derive::{round4, ROUNDING_DECIMALS};
pub use keys::{AreaKey, MetricKey, MetricValue, PowerKey, ReportGrammar};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One numeric value extracted from one report line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMetricSample<K: MetricKey> {
    /// Metric key the line matched
    pub key: K,
    /// Parsed value
    pub value: K::Value,
    /// 1-based line number in the report
    pub line: usize,
}

/// Sample lists for every key of one report.
///
/// Every key of the catalogue is present from construction; a key no line
/// matched keeps an empty list and reduces to zero.
#[derive(Debug, Clone)]
pub struct SampleSet<K: MetricKey> {
    scope: String,
    samples: BTreeMap<K, Vec<K::Value>>,
}

impl<K: MetricKey> SampleSet<K> {
    /// Create an empty set for a work item scope.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            samples: K::ALL.iter().map(|&k| (k, Vec::new())).collect(),
        }
    }

    /// Work item scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Append a sample.
    pub fn push(&mut self, sample: RawMetricSample<K>) {
        self.samples.entry(sample.key).or_default().push(sample.value);
    }

    /// Samples of one key, in report order.
    #[must_use]
    pub fn samples(&self, key: K) -> &[K::Value] {
        self.samples.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of samples across keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Check if no line matched any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reduce every key to a scalar (no derivation).
    #[must_use]
    pub fn reduce(&self) -> MetricSet<K> {
        let values = K::ALL
            .iter()
            .map(|&k| (k, K::reduce(self.samples(k))))
            .collect();
        MetricSet {
            scope: self.scope.clone(),
            values,
            violations: Vec::new(),
        }
    }

    /// Reduce, then compute derived keys.
    #[must_use]
    pub fn reduce_and_derive(&self) -> MetricSet<K> {
        let mut set = self.reduce();
        K::derive(&mut set);
        set
    }
}

impl<K: MetricKey> Extend<RawMetricSample<K>> for SampleSet<K> {
    fn extend<I: IntoIterator<Item = RawMetricSample<K>>>(&mut self, iter: I) {
        for sample in iter {
            self.push(sample);
        }
    }
}

/// One scalar per (work item, metric key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    scope: String,
    key: String,
    value: f64,
    derived: bool,
}

impl MetricRecord {
    /// Create a new metric record.
    #[must_use]
    pub fn new(scope: impl Into<String>, key: impl Into<String>, value: f64, derived: bool) -> Self {
        Self {
            scope: scope.into(),
            key: key.into(),
            value,
            derived,
        }
    }

    /// Work item scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Metric key name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Whether the value was derived from other keys.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.derived
    }
}

/// A derived value that came out negative.
///
/// Either an extraction pattern matched nothing (its key silently reduced
/// to zero) or the report hierarchy is genuinely inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantViolation {
    /// Work item scope
    pub scope: String,
    /// Derived key name
    pub key: String,
    /// Offending value
    pub value: f64,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} = {} < 0", self.scope, self.key, self.value)
    }
}

/// Reduced (and possibly derived) metrics of one work item report.
#[derive(Debug, Clone)]
pub struct MetricSet<K: MetricKey> {
    scope: String,
    values: BTreeMap<K, K::Value>,
    violations: Vec<InvariantViolation>,
}

impl<K: MetricKey> MetricSet<K> {
    /// Work item scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Value of a key (zero if never set).
    #[must_use]
    pub fn get(&self, key: K) -> K::Value {
        self.values.get(&key).copied().unwrap_or_default()
    }

    /// Store a derived value, flagging it if negative. Never clamps.
    pub fn set_derived(&mut self, key: K, value: K::Value) {
        if value.is_negative() {
            self.violations.push(InvariantViolation {
                scope: self.scope.clone(),
                key: key.name().to_string(),
                value: value.as_f64(),
            });
        }
        self.values.insert(key, value);
    }

    /// Flagged derived values.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Whether every derived value is non-negative.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    /// One record per key, in column order.
    #[must_use]
    pub fn records(&self) -> Vec<MetricRecord> {
        K::ALL
            .iter()
            .map(|&k| MetricRecord::new(&self.scope, k.name(), self.get(k).as_f64(), k.is_derived()))
            .collect()
    }
}
