//! Breakdown tables (Arrow `RecordBatch`)
//!
//! Rows are laid out in canonical order, never completion order: the area
//! table follows the design catalogue, the power table is precision-major
//! (descending) then catalogue order. A design whose report could not be
//! read keeps its row with every metric column null.

use crate::design::{DesignVariant, Precision};
use crate::metrics::{AreaKey, InvariantViolation, MetricKey, MetricSet, MetricValue, PowerKey};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

/// Power values are divided by this before they enter a table.
pub const POWER_UNIT_SCALE: f64 = 1e6;

/// Decimal digits power values are rounded to in CSV exports.
pub const EXPORT_DECIMALS: i32 = 5;

/// Index column holding the design identifier.
pub const DESIGN_COLUMN: &str = "design";

/// Index column holding the precision label (power table only).
pub const PRECISION_COLUMN: &str = "precision";

/// One canonical breakdown matrix.
#[derive(Debug, Clone)]
pub struct BreakdownTable {
    batch: RecordBatch,
    violations: Vec<InvariantViolation>,
}

fn metric_fields<K: MetricKey>(data_type: &DataType) -> Vec<Field> {
    K::ALL
        .iter()
        .map(|key| Field::new(key.name(), data_type.clone(), true))
        .collect()
}

fn metric_column<K: MetricKey>(rows: &[Option<&MetricSet<K>>], key: K) -> Vec<Option<K::Value>> {
    rows.iter().map(|row| row.map(|set| set.get(key))).collect()
}

fn collect_violations<K: MetricKey>(rows: &[Option<&MetricSet<K>>]) -> Vec<InvariantViolation> {
    rows.iter()
        .flatten()
        .flat_map(|set| set.violations().iter().cloned())
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

impl BreakdownTable {
    /// Build the area table, reindexed to `designs`.
    ///
    /// `sets` is keyed by design identifier; designs without a set get a
    /// null row.
    ///
    /// # Errors
    ///
    /// Returns error if the record batch cannot be assembled.
    pub fn area(
        designs: &[DesignVariant],
        sets: &HashMap<String, MetricSet<AreaKey>>,
    ) -> Result<Self> {
        let rows: Vec<Option<&MetricSet<AreaKey>>> =
            designs.iter().map(|d| sets.get(d.id())).collect();

        let mut fields = vec![Field::new(DESIGN_COLUMN, DataType::Utf8, false)];
        fields.extend(metric_fields::<AreaKey>(&DataType::Int64));

        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
            designs.iter().map(DesignVariant::id),
        ))];
        for &key in AreaKey::ALL {
            columns.push(Arc::new(Int64Array::from(metric_column(&rows, key))));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self {
            batch,
            violations: collect_violations(&rows),
        })
    }

    /// Build the power table: precisions in descending order, then
    /// `designs`. Values are divided by [`POWER_UNIT_SCALE`].
    ///
    /// # Errors
    ///
    /// Returns error if the record batch cannot be assembled.
    pub fn power(
        precisions: &[Precision],
        designs: &[DesignVariant],
        sets: &HashMap<(Precision, String), MetricSet<PowerKey>>,
    ) -> Result<Self> {
        let index: Vec<(Precision, &DesignVariant)> = Precision::table_order(precisions)
            .into_iter()
            .flat_map(|p| designs.iter().map(move |d| (p, d)))
            .collect();
        let rows: Vec<Option<&MetricSet<PowerKey>>> = index
            .iter()
            .map(|(p, d)| sets.get(&(*p, d.id().to_string())))
            .collect();

        let mut fields = vec![
            Field::new(PRECISION_COLUMN, DataType::Utf8, false),
            Field::new(DESIGN_COLUMN, DataType::Utf8, false),
        ];
        fields.extend(metric_fields::<PowerKey>(&DataType::Float64));

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                index.iter().map(|(p, _)| p.label()),
            )),
            Arc::new(StringArray::from_iter_values(index.iter().map(|(_, d)| d.id()))),
        ];
        for &key in PowerKey::ALL {
            let scaled: Vec<Option<f64>> = metric_column(&rows, key)
                .into_iter()
                .map(|v| v.map(|watts| watts.as_f64() / POWER_UNIT_SCALE))
                .collect();
            columns.push(Arc::new(Float64Array::from(scaled)));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self {
            batch,
            violations: collect_violations(&rows),
        })
    }

    /// Wrap a batch loaded back from storage.
    ///
    /// # Errors
    ///
    /// Returns error if the batch has no design index column.
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        if schema.index_of(DESIGN_COLUMN).is_err() {
            return Err(Error::StorageError(format!(
                "breakdown table without `{DESIGN_COLUMN}` column"
            )));
        }
        Ok(Self {
            batch,
            violations: Vec::new(),
        })
    }

    /// Underlying record batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Negative derived values carried by the table's rows.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Row labels: `design` for area, `precision/design` for power.
    #[must_use]
    pub fn row_labels(&self) -> Vec<String> {
        let designs = self.string_column(DESIGN_COLUMN);
        let precisions = self.string_column(PRECISION_COLUMN);
        (0..self.num_rows())
            .map(|row| {
                let design = designs.map_or("", |c| c.value(row));
                match precisions {
                    Some(p) => format!("{}/{design}", p.value(row)),
                    None => design.to_string(),
                }
            })
            .collect()
    }

    /// Rows whose metric columns are all null (unreadable reports).
    #[must_use]
    pub fn null_rows(&self) -> usize {
        let metrics = self.metric_columns();
        (0..self.num_rows())
            .filter(|&row| metrics.iter().all(|c| c.is_null(row)))
            .count()
    }

    /// Numeric cell as `f64`, or `None` if null or absent.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let array = self.batch.column_by_name(column)?;
        if row >= array.len() || array.is_null(row) {
            return None;
        }
        if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
            return Some(ints.value(row).as_f64());
        }
        array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|floats| floats.value(row))
    }

    /// Copy of the batch with float columns rounded for export.
    ///
    /// # Errors
    ///
    /// Returns error if the rounded batch cannot be assembled.
    pub fn rounded(&self, decimals: i32) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = self
            .batch
            .columns()
            .iter()
            .map(|column| match column.as_any().downcast_ref::<Float64Array>() {
                Some(floats) => {
                    Arc::new(floats.unary::<_, Float64Type>(|v| round_to(v, decimals))) as ArrayRef
                }
                None => Arc::clone(column),
            })
            .collect();
        Ok(RecordBatch::try_new(self.batch.schema(), columns)?)
    }

    fn string_column(&self, name: &str) -> Option<&StringArray> {
        self.batch
            .column_by_name(name)?
            .as_any()
            .downcast_ref::<StringArray>()
    }

    fn metric_columns(&self) -> Vec<&ArrayRef> {
        let schema = self.batch.schema();
        self.batch
            .columns()
            .iter()
            .zip(schema.fields())
            .filter(|(_, f)| f.name() != DESIGN_COLUMN && f.name() != PRECISION_COLUMN)
            .map(|(c, _)| c)
            .collect()
    }
}
