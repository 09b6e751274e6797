//! Aggregation and export of breakdown tables
//!
//! One reduction pass per clock period reads every persisted report of that
//! clock, extracts and derives metrics, and writes
//! `RESULTS/breakdown/<clk>/<family>/{area,power}.{csv,parquet}` plus the
//! long-form `metrics.json` (one record per work item and key, in report
//! units).
//!
//! Reports are re-read on every pass; nothing is carried over from the
//! pipeline phases except the files on disk.

mod store;
mod table;

pub use store::TableStore;
pub use table::{
    BreakdownTable, DESIGN_COLUMN, EXPORT_DECIMALS, POWER_UNIT_SCALE, PRECISION_COLUMN,
};

use crate::config::SweepConfig;
use crate::design::{ClockPeriod, DesignVariant, Precision};
use crate::extract::Catalogue;
use crate::metrics::{AreaKey, InvariantViolation, MetricKey, MetricRecord, MetricSet, PowerKey};
use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Area table file stem.
pub const AREA_TABLE: &str = "area";

/// Power table file stem.
pub const POWER_TABLE: &str = "power";

/// Per-item metric records, before unit conversion.
pub const METRICS_FILE: &str = "metrics.json";

/// Both tables of one clock period.
#[derive(Debug, Clone)]
pub struct ClockBreakdown {
    clock: ClockPeriod,
    area: BreakdownTable,
    power: BreakdownTable,
    records: Vec<MetricRecord>,
    missing_reports: Vec<PathBuf>,
}

/// What a reduction pass produced, for the run summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakdownSummary {
    /// Clock period label (`1.0`)
    pub clock: String,
    /// Output directory
    pub directory: PathBuf,
    /// Area table rows
    pub area_rows: usize,
    /// Power table rows
    pub power_rows: usize,
    /// Records written to [`METRICS_FILE`]
    pub metric_records: usize,
    /// Reports that could not be read (null rows)
    pub missing_reports: Vec<PathBuf>,
    /// Negative derived values
    pub violations: Vec<InvariantViolation>,
}

impl ClockBreakdown {
    /// Clock period the tables describe.
    #[must_use]
    pub const fn clock(&self) -> ClockPeriod {
        self.clock
    }

    /// Area table.
    #[must_use]
    pub const fn area(&self) -> &BreakdownTable {
        &self.area
    }

    /// Power table.
    #[must_use]
    pub const fn power(&self) -> &BreakdownTable {
        &self.power
    }

    /// Every metric of every readable report: area items first, then power
    /// items in table order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Reports that could not be read.
    #[must_use]
    pub fn missing_reports(&self) -> &[PathBuf] {
        &self.missing_reports
    }

    /// Every negative derived value in either table.
    #[must_use]
    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.area
            .violations()
            .iter()
            .chain(self.power.violations())
            .cloned()
            .collect()
    }

    /// Write both tables as CSV and Parquet into `dir`, and the metric
    /// records as JSON.
    ///
    /// CSV power values are rounded to [`EXPORT_DECIMALS`]; Parquet keeps
    /// full precision.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or any table file cannot be written.
    pub fn export(&self, dir: &Path) -> Result<BreakdownSummary> {
        fs::create_dir_all(dir)?;

        TableStore::new(vec![self.area.batch().clone()])
            .write_csv(dir.join(format!("{AREA_TABLE}.csv")))?;
        TableStore::new(vec![self.area.batch().clone()])
            .write_parquet(dir.join(format!("{AREA_TABLE}.parquet")))?;

        TableStore::new(vec![self.power.rounded(EXPORT_DECIMALS)?])
            .write_csv(dir.join(format!("{POWER_TABLE}.csv")))?;
        TableStore::new(vec![self.power.batch().clone()])
            .write_parquet(dir.join(format!("{POWER_TABLE}.parquet")))?;

        fs::write(dir.join(METRICS_FILE), serde_json::to_vec_pretty(&self.records)?)?;

        info!(
            clock = %self.clock.label(),
            dir = %dir.display(),
            "breakdown tables written"
        );
        Ok(BreakdownSummary {
            clock: self.clock.label(),
            directory: dir.to_path_buf(),
            area_rows: self.area.num_rows(),
            power_rows: self.power.num_rows(),
            metric_records: self.records.len(),
            missing_reports: self.missing_reports.clone(),
            violations: self.violations(),
        })
    }
}

fn read_set<K: MetricKey>(
    catalogue: &Catalogue<K>,
    scope: String,
    path: &Path,
) -> Option<MetricSet<K>> {
    match catalogue.extract_file(scope.as_str(), path) {
        Ok(samples) => {
            let set = samples.reduce_and_derive();
            for violation in set.violations() {
                warn!(%violation, "negative derived metric");
            }
            Some(set)
        }
        Err(e) => {
            warn!(scope = %scope, report = %path.display(), error = %e, "could not read report");
            None
        }
    }
}

/// Extract, derive and tabulate every report of one clock period.
///
/// Unreadable reports leave a null row in their canonical position.
///
/// # Errors
///
/// Returns error if the built-in catalogues fail to compile or a table
/// cannot be assembled.
pub fn reduce_clock(config: &SweepConfig, clock: ClockPeriod) -> Result<ClockBreakdown> {
    let area_catalogue = Catalogue::<AreaKey>::builtin()?;
    let power_catalogue = Catalogue::<PowerKey>::builtin()?;
    let mut missing_reports = Vec::new();

    let area_results: Vec<(&DesignVariant, PathBuf, Option<MetricSet<AreaKey>>)> = config
        .designs
        .par_iter()
        .map(|design| {
            let path = config.synthesis_report_path(design, clock);
            let scope = format!("{design}/{}", clock.mapping());
            let set = read_set(&area_catalogue, scope, &path);
            (design, path, set)
        })
        .collect();
    let mut area_sets = HashMap::new();
    for (design, path, set) in area_results {
        match set {
            Some(set) => {
                area_sets.insert(design.id().to_string(), set);
            }
            None => missing_reports.push(path),
        }
    }

    let power_index: Vec<(Precision, &DesignVariant)> = config
        .precisions
        .iter()
        .flat_map(|&p| config.designs.iter().map(move |d| (p, d)))
        .collect();
    let power_results: Vec<(Precision, &DesignVariant, PathBuf, Option<MetricSet<PowerKey>>)> =
        power_index
            .into_par_iter()
            .map(|(precision, design)| {
                let path = config.power_report_path(design, clock, precision);
                let scope = format!("{design}/{}/{}", clock.mapping(), precision.label());
                let set = read_set(&power_catalogue, scope, &path);
                (precision, design, path, set)
            })
            .collect();
    let mut power_sets = HashMap::new();
    for (precision, design, path, set) in power_results {
        match set {
            Some(set) => {
                power_sets.insert((precision, design.id().to_string()), set);
            }
            None => missing_reports.push(path),
        }
    }

    let mut records: Vec<MetricRecord> = config
        .designs
        .iter()
        .filter_map(|d| area_sets.get(d.id()))
        .flat_map(MetricSet::records)
        .collect();
    for precision in Precision::table_order(&config.precisions) {
        records.extend(
            config
                .designs
                .iter()
                .filter_map(|d| power_sets.get(&(precision, d.id().to_string())))
                .flat_map(MetricSet::records),
        );
    }

    Ok(ClockBreakdown {
        clock,
        area: BreakdownTable::area(&config.designs, &area_sets)?,
        power: BreakdownTable::power(&config.precisions, &config.designs, &power_sets)?,
        records,
        missing_reports,
    })
}

/// Reduce one clock period and export its tables to the configured
/// breakdown directory.
///
/// # Errors
///
/// Returns error if reduction or export fails.
pub fn generate_breakdown(config: &SweepConfig, clock: ClockPeriod) -> Result<BreakdownSummary> {
    let breakdown = reduce_clock(config, clock)?;
    if !breakdown.missing_reports().is_empty() {
        warn!(
            clock = %clock.label(),
            missing = breakdown.missing_reports().len(),
            "breakdown has null rows"
        );
    }
    breakdown.export(&config.breakdown_dir(clock))
}
