//! Turns a readings table into a chart description and an export table.
//!
//! Timestamps are first rounded to the requested [`TimeInterval`]. Without a
//! label column every sensor gets its own series and the export is a pivot of
//! the mean value per time bucket and sensor. With a label column the readings
//! are grouped by time bucket and label value, and both the chart and the
//! export use the per-group mean and standard deviation.
//!
//! The heatmap ignores the parameter and grouping selections and correlates
//! the numeric columns instead.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::RangeInclusive,
    str::FromStr,
};

use chrono::NaiveDateTime;
use envdash_stats::{
    correlation::CorrelationMatrix,
    descriptive,
    histogram::{self, Histogram},
};
use serde::{Deserialize, Serialize};

use crate::{
    chart::{Chart, HeatmapChart, HistogramChart, Point, Series, SeriesChart, SeriesMode},
    export::{ExportTable, GroupedRow, GroupedTable, PivotRow, PivotTable},
    interval::TimeInterval,
    parameter::Parameter,
    table::{SensorTable, TIMESTAMP_COLUMN},
};

pub const DEFAULT_BINS: usize = 10;
pub const BINS_RANGE: RangeInclusive<usize> = 5..=50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Scatter,
    Line,
    Histogram,
    Heatmap,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown chart kind '{name}' (expected scatter, line, histogram or heatmap)")]
pub struct UnknownChartKindError {
    pub name: String,
}

/// What to plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub kind: ChartKind,
    /// Ignored for [`ChartKind::Heatmap`].
    pub parameter: Parameter,
    /// Label column used to group readings, e.g. `#location`.
    pub label: Option<String>,
    pub interval: TimeInterval,
    /// Number of histogram bins.
    pub bins: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphOutput {
    pub chart: Chart,
    pub export: ExportTable,
}

/// The selected data is not in the table.
///
/// Both variants are recoverable; their message is meant to be shown to the user.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum GraphError {
    #[display("no data available for the selected parameter")]
    MissingParameter { parameter: Parameter },
    #[display("no data available for the selected parameter")]
    MissingLabel { column: String },
}

impl ChartKind {
    pub const ALL: [Self; 4] = [Self::Scatter, Self::Line, Self::Histogram, Self::Heatmap];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Line => "line",
            Self::Histogram => "histogram",
            Self::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = UnknownChartKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownChartKindError { name: s.to_owned() })
    }
}

impl GraphRequest {
    #[must_use]
    pub fn new(kind: ChartKind, parameter: Parameter) -> Self {
        Self {
            kind,
            parameter,
            label: None,
            interval: TimeInterval::default(),
            bins: DEFAULT_BINS,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: TimeInterval) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }
}

/// Builds the chart and export table for a request.
///
/// # Errors
///
/// Returns [`GraphError`] when the requested parameter or label column is not
/// in the table. A heatmap never fails.
///
/// # Examples
///
/// ```
/// # use envdash_analysis::{graph::{build_graph, ChartKind, GraphRequest}, parameter::Parameter, table::SensorTable};
/// let csv = "\
/// Name,TimeStamp,temperature
/// a,2024-03-01 10:00:10,20.0
/// b,2024-03-01 10:00:20,22.0
/// a,2024-03-01 10:02:50,21.0
/// ";
/// let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
/// let output = build_graph(&table, &GraphRequest::new(ChartKind::Line, Parameter::Temperature)).unwrap();
/// assert_eq!(output.chart.title(), "Temperature over Time (Aggregated by 3min)");
/// assert_eq!(output.export.file_name(), "temperature.csv");
///
/// let request = GraphRequest::new(ChartKind::Line, Parameter::Humidity);
/// let err = build_graph(&table, &request).unwrap_err();
/// assert_eq!(err.to_string(), "no data available for the selected parameter");
/// ```
pub fn build_graph(table: &SensorTable, request: &GraphRequest) -> Result<GraphOutput, GraphError> {
    if request.kind == ChartKind::Heatmap {
        return Ok(build_heatmap(table));
    }

    let parameter = request.parameter;
    let values = table
        .parameter(parameter)
        .ok_or(GraphError::MissingParameter { parameter })?;
    let timestamps = table
        .timestamps()
        .iter()
        .map(|&ts| request.interval.round(ts))
        .collect::<Vec<_>>();

    let output = match &request.label {
        Some(column) => {
            let labels = table
                .label(column)
                .ok_or_else(|| GraphError::MissingLabel {
                    column: column.clone(),
                })?;
            let grouped = group_by_label(parameter, column, &timestamps, labels, values);
            GraphOutput {
                chart: grouped_chart(request, &grouped),
                export: ExportTable::Grouped(grouped),
            }
        }
        None => GraphOutput {
            chart: per_sensor_chart(request, table, &timestamps, values),
            export: ExportTable::Pivot(pivot(parameter, table.names(), &timestamps, values)),
        },
    };
    log::debug!(
        "built {} chart for '{parameter}' with {} export rows",
        request.kind,
        output.export.len()
    );
    Ok(output)
}

fn build_heatmap(table: &SensorTable) -> GraphOutput {
    let matrix = CorrelationMatrix::from_columns(
        Parameter::ALL
            .into_iter()
            .filter_map(|p| table.parameter(p).map(|values| (p.column_name(), values))),
    );
    log::debug!("correlated {} parameters", matrix.len());
    GraphOutput {
        chart: Chart::Heatmap(HeatmapChart::from_matrix(&matrix)),
        export: ExportTable::Correlation(matrix),
    }
}

/// Mean per (time bucket, label value). Rows without a label are skipped.
fn group_by_label(
    parameter: Parameter,
    column: &str,
    timestamps: &[NaiveDateTime],
    labels: &[Option<String>],
    values: &[f64],
) -> GroupedTable {
    let mut groups = BTreeMap::<(NaiveDateTime, &str), Vec<f64>>::new();
    for ((&ts, label), &value) in timestamps.iter().zip(labels).zip(values) {
        if let Some(label) = label {
            groups.entry((ts, label.as_str())).or_default().push(value);
        }
    }
    let rows = groups
        .into_iter()
        .map(|((timestamp, label), values)| {
            let (mean, std_dev) = descriptive::mean_std(&values);
            GroupedRow {
                timestamp,
                label: label.to_owned(),
                mean,
                std_dev,
            }
        })
        .collect();
    GroupedTable {
        parameter,
        label_column: column.to_owned(),
        rows,
    }
}

/// Mean per (time bucket, sensor), one column per sensor.
///
/// Buckets without any observed value are left out, as are sensors that have
/// no value in any bucket.
fn pivot(
    parameter: Parameter,
    names: &[String],
    timestamps: &[NaiveDateTime],
    values: &[f64],
) -> PivotTable {
    let mut groups = BTreeMap::<NaiveDateTime, BTreeMap<&str, Vec<f64>>>::new();
    for ((&ts, name), &value) in timestamps.iter().zip(names).zip(values) {
        groups
            .entry(ts)
            .or_default()
            .entry(name.as_str())
            .or_default()
            .push(value);
    }

    let means = groups
        .into_iter()
        .filter_map(|(ts, by_name)| {
            let by_name = by_name
                .into_iter()
                .map(|(name, values)| (name, descriptive::mean_std(&values).0))
                .filter(|(_, mean)| !mean.is_nan())
                .collect::<BTreeMap<_, _>>();
            (!by_name.is_empty()).then_some((ts, by_name))
        })
        .collect::<Vec<_>>();

    let columns = means
        .iter()
        .flat_map(|(_, by_name)| by_name.keys().copied())
        .collect::<BTreeSet<_>>();
    let rows = means
        .iter()
        .map(|(timestamp, by_name)| PivotRow {
            timestamp: *timestamp,
            values: columns
                .iter()
                .map(|name| by_name.get(name).copied().unwrap_or(f64::NAN))
                .collect(),
        })
        .collect();

    PivotTable {
        parameter,
        names: columns.into_iter().map(str::to_owned).collect(),
        rows,
    }
}

fn grouped_chart(request: &GraphRequest, grouped: &GroupedTable) -> Chart {
    let parameter = request.parameter.title_name();
    let interval = request.interval;

    let mut by_label = BTreeMap::<&str, Vec<&GroupedRow>>::new();
    for row in &grouped.rows {
        by_label.entry(row.label.as_str()).or_default().push(row);
    }

    match request.kind {
        ChartKind::Line | ChartKind::Scatter => {
            let (mode, title) = if request.kind == ChartKind::Line {
                (
                    SeriesMode::Line,
                    format!("Average {parameter} over Time (Aggregated by {interval})"),
                )
            } else {
                (
                    SeriesMode::Scatter,
                    format!("Average {parameter} Scatter Plot (Aggregated by {interval})"),
                )
            };
            let series = by_label
                .into_iter()
                .map(|(label, rows)| Series {
                    name: label.to_owned(),
                    points: rows
                        .iter()
                        .map(|row| Point::with_error(row.timestamp, row.mean, row.std_dev))
                        .collect(),
                })
                .collect();
            Chart::Series(SeriesChart {
                mode,
                title,
                x_label: TIMESTAMP_COLUMN.to_owned(),
                y_label: request.parameter.axis_label(),
                series,
            })
        }
        ChartKind::Histogram | ChartKind::Heatmap => {
            let samples = by_label
                .into_iter()
                .map(|(label, rows)| (label.to_owned(), rows.iter().map(|row| row.mean).collect()))
                .collect();
            Chart::Histogram(HistogramChart::from_histograms(
                format!("Histogram of Average {parameter}"),
                request.parameter.axis_label(),
                shared_histograms(samples, request.bins),
            ))
        }
    }
}

fn per_sensor_chart(
    request: &GraphRequest,
    table: &SensorTable,
    timestamps: &[NaiveDateTime],
    values: &[f64],
) -> Chart {
    let parameter = request.parameter.title_name();
    let interval = request.interval;

    let mut by_name = table
        .sorted_names()
        .into_iter()
        .map(|name| (name, vec![]))
        .collect::<BTreeMap<&str, Vec<(NaiveDateTime, f64)>>>();
    for ((name, &ts), &value) in table.names().iter().zip(timestamps).zip(values) {
        if let Some(points) = by_name.get_mut(name.as_str()) {
            points.push((ts, value));
        }
    }

    match request.kind {
        ChartKind::Line | ChartKind::Scatter => {
            let (mode, title) = if request.kind == ChartKind::Line {
                (
                    SeriesMode::Line,
                    format!("{parameter} over Time (Aggregated by {interval})"),
                )
            } else {
                (
                    SeriesMode::Scatter,
                    format!("{parameter} Scatter Plot (Aggregated by {interval})"),
                )
            };
            let series = by_name
                .into_iter()
                .map(|(name, points)| Series {
                    name: name.to_owned(),
                    points: points
                        .into_iter()
                        .map(|(ts, value)| Point::new(ts, value))
                        .collect(),
                })
                .collect();
            Chart::Series(SeriesChart {
                mode,
                title,
                x_label: TIMESTAMP_COLUMN.to_owned(),
                y_label: request.parameter.axis_label(),
                series,
            })
        }
        ChartKind::Histogram | ChartKind::Heatmap => {
            let samples = by_name
                .into_iter()
                .map(|(name, points)| (name.to_owned(), points.into_iter().map(|(_, v)| v).collect()))
                .collect();
            Chart::Histogram(HistogramChart::from_histograms(
                format!("Histogram of {parameter}"),
                request.parameter.axis_label(),
                shared_histograms(samples, request.bins),
            ))
        }
    }
}

/// Bins every sample over the range of all samples combined.
fn shared_histograms(samples: Vec<(String, Vec<f64>)>, bins: usize) -> Vec<(String, Histogram)> {
    let range = histogram::value_range(samples.iter().flat_map(|(_, values)| values.iter().copied()));
    samples
        .into_iter()
        .map(|(name, values)| {
            let histogram = match &range {
                Some(range) => Histogram::with_range(values, bins, range.clone()),
                None => Histogram { bins: vec![] },
            };
            (name, histogram)
        })
        .collect()
}
