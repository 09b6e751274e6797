//! Report Extraction
//!
//! Each metric key owns one rule: a name pattern anchored at the start of a
//! report line, plus the column layout that locates the value after it.
//! Every line is tested against every rule, and a key may match any number
//! of lines (repeated sub-instances such as the sixteen 2x2 multipliers).
//!
//! ```text
//! report line ──> rule 1 ──> RawMetricSample ─┐
//!             ├─> rule 2 ──> (no match)       ├─> SampleSet
//!             └─> rule N ──> RawMetricSample ─┘
//! ```

mod catalogue;

pub use catalogue::Extractable;

use crate::metrics::{MetricKey, RawMetricSample, SampleSet};
use crate::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Where the captured value sits after the instance name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// Standard hierarchy row: four integer columns for area, or one
    /// integer then five float columns for power; the last one is captured.
    Standard,
    /// Integer columns: skip `skip`, capture the next.
    Integer {
        /// Columns skipped
        skip: usize,
    },
    /// Word columns (cell names, library names): skip `skip`, capture the
    /// next integer.
    Words {
        /// Columns skipped
        skip: usize,
    },
    /// Flat-report float columns that may be blank or bare dots.
    Loose {
        /// Columns skipped
        skip: usize,
    },
}

impl ColumnLayout {
    /// Value suffix pattern for a report grammar.
    #[must_use]
    pub fn suffix(self, grammar: crate::metrics::ReportGrammar) -> String {
        use crate::metrics::ReportGrammar;
        match (self, grammar) {
            (Self::Standard, ReportGrammar::Area) => r"\s+(?:\d+\s+){3}(\d+)".to_string(),
            (Self::Standard, ReportGrammar::Power) => {
                r"\s+\d+\s+(?:\d+\.\d+\s+){4}(\d+\.\d+)".to_string()
            }
            (Self::Integer { skip }, _) => format!(r"\s+(?:\d+\s+){{{skip}}}(\d+)"),
            (Self::Words { skip }, _) => format!(r"(?:\s+\w+){{{skip}}}\s+(\d+)"),
            (Self::Loose { skip }, _) => format!(r"\s*(?:\d*\.\d*\s*){{{skip}}}(\d*\.\d*)"),
        }
    }
}

/// Declarative extraction rule for one metric key.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule<K: MetricKey> {
    /// Key the captured value is accumulated into
    pub key: K,
    /// Instance name pattern, anchored at line start
    pub name: &'static str,
    /// Column layout after the name
    pub layout: ColumnLayout,
}

impl<K: MetricKey> ExtractionRule<K> {
    /// Full line pattern.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!("^{}{}", self.name, self.layout.suffix(K::GRAMMAR))
    }
}

/// Compiled rule set for one report grammar.
#[derive(Debug, Clone)]
pub struct Catalogue<K: MetricKey> {
    rules: Vec<(K, Regex)>,
}

impl<K: MetricKey> Catalogue<K> {
    /// Compile a rule set.
    ///
    /// # Errors
    ///
    /// Returns error if a rule's pattern is not a valid regex.
    pub fn compile(rules: &[ExtractionRule<K>]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| Ok((rule.key, Regex::new(&rule.pattern())?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the catalogue has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Test every line against every rule.
    ///
    /// Captures that do not parse as the key's value type (a bare `.` in a
    /// flat report) are skipped.
    pub fn scan<I, S>(&self, lines: I) -> Vec<RawMetricSample<K>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut samples = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            for (key, regex) in &self.rules {
                let Some(captured) = regex.captures(line).and_then(|caps| caps.get(1)) else {
                    continue;
                };
                match captured.as_str().parse::<K::Value>() {
                    Ok(value) => samples.push(RawMetricSample {
                        key: *key,
                        value,
                        line: index + 1,
                    }),
                    Err(_) => debug!(
                        key = key.name(),
                        line = index + 1,
                        text = captured.as_str(),
                        "skipping unparsable sample"
                    ),
                }
            }
        }
        samples
    }

    /// Extract the sample set of one report held in memory.
    #[must_use]
    pub fn extract(&self, scope: impl Into<String>, report: &str) -> SampleSet<K> {
        let mut set = SampleSet::new(scope);
        set.extend(self.scan(report.lines()));
        set
    }

    /// Extract the sample set of one report file.
    ///
    /// # Errors
    ///
    /// Returns error if the report cannot be read.
    pub fn extract_file(&self, scope: impl Into<String>, path: &Path) -> Result<SampleSet<K>> {
        let bytes = fs::read(path)?;
        Ok(self.extract(scope, &String::from_utf8_lossy(&bytes)))
    }
}

impl<K: Extractable> Catalogue<K> {
    /// The built-in catalogue for `K`'s report grammar.
    ///
    /// # Errors
    ///
    /// Returns error if a built-in pattern fails to compile.
    pub fn builtin() -> Result<Self> {
        Self::compile(K::RULES)
    }
}
