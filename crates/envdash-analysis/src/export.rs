//! Export tables offered for download next to a chart.
//!
//! Tables are written as comma-separated text with the index as the first
//! column. Missing values are written as empty cells and whole numbers keep a
//! trailing `.0`, so the output matches what a dataframe library would write.

use std::io;

use chrono::{NaiveDateTime, Timelike as _};
use envdash_stats::correlation::CorrelationMatrix;

use crate::{interval::TimeInterval, parameter::Parameter, table::TIMESTAMP_COLUMN};

pub const CORRELATION_FILE_NAME: &str = "correlation_matrix.csv";

const PIVOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const GROUPED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum ExportTable {
    /// Mean parameter value per time bucket (rows) and sensor (columns).
    Pivot(PivotTable),
    /// Mean and standard deviation per time bucket and label value.
    Grouped(GroupedTable),
    /// Pairwise correlation between parameters.
    Correlation(CorrelationMatrix),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub parameter: Parameter,
    /// Column headers, ascending.
    pub names: Vec<String>,
    /// One row per time bucket, ascending; `values[i]` belongs to `names[i]`.
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub timestamp: NaiveDateTime,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub parameter: Parameter,
    pub label_column: String,
    /// Sorted by timestamp, then label.
    pub rows: Vec<GroupedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub timestamp: NaiveDateTime,
    pub label: String,
    pub mean: f64,
    pub std_dev: f64,
}

impl ExportTable {
    /// File name the table is offered under.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_analysis::{export::{ExportTable, PivotTable}, parameter::Parameter};
    /// # use envdash_stats::correlation::CorrelationMatrix;
    /// let pivot = ExportTable::Pivot(PivotTable {
    ///     parameter: Parameter::BarometricPressure,
    ///     names: vec![],
    ///     rows: vec![],
    /// });
    /// assert_eq!(pivot.file_name(), "barometric_pressure.csv");
    ///
    /// let matrix = CorrelationMatrix::from_columns(Vec::<(String, &[f64])>::new());
    /// assert_eq!(ExportTable::Correlation(matrix).file_name(), "correlation_matrix.csv");
    /// ```
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Pivot(PivotTable { parameter, .. })
            | Self::Grouped(GroupedTable { parameter, .. }) => format!("{parameter}.csv"),
            Self::Correlation(_) => CORRELATION_FILE_NAME.to_owned(),
        }
    }

    /// Number of data rows, excluding the header.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Pivot(table) => table.rows.len(),
            Self::Grouped(table) => table.rows.len(),
            Self::Correlation(matrix) => matrix.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the table as CSV.
    pub fn write_csv<W>(&self, writer: W) -> Result<(), csv::Error>
    where
        W: io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        match self {
            Self::Pivot(table) => {
                writer.write_record(
                    std::iter::once(TIMESTAMP_COLUMN).chain(table.names.iter().map(String::as_str)),
                )?;
                for row in &table.rows {
                    let index = pivot_index(row.timestamp)
                        .format(PIVOT_TIMESTAMP_FORMAT)
                        .to_string();
                    writer.write_record(
                        std::iter::once(index).chain(row.values.iter().map(|&v| format_cell(v))),
                    )?;
                }
            }
            Self::Grouped(table) => {
                writer.write_record([
                    TIMESTAMP_COLUMN,
                    table.label_column.as_str(),
                    "avg_parameter",
                    "std_parameter",
                ])?;
                for row in &table.rows {
                    writer.write_record([
                        row.timestamp.format(GROUPED_TIMESTAMP_FORMAT).to_string(),
                        row.label.clone(),
                        format_cell(row.mean),
                        format_cell(row.std_dev),
                    ])?;
                }
            }
            Self::Correlation(matrix) => {
                writer.write_record(
                    std::iter::once("").chain(matrix.names.iter().map(String::as_str)),
                )?;
                for (name, row) in matrix.names.iter().zip(&matrix.values) {
                    writer.write_record(
                        std::iter::once(name.clone()).chain(row.iter().map(|&v| format_cell(v))),
                    )?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Export index of a pivot row: truncated to the minute, then snapped to the 3-minute grid.
fn pivot_index(timestamp: NaiveDateTime) -> NaiveDateTime {
    let truncated = timestamp
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(timestamp);
    TimeInterval::Minutes(3).round(truncated)
}

/// Formats a value for a CSV cell; missing values become empty cells.
fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format_float(value)
    }
}

/// Shortest round-trip representation, keeping `.0` on whole numbers.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
