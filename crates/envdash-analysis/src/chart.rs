//! Renderer-independent chart descriptions.
//!
//! A [`Chart`] carries everything a plotting front end needs: the data points,
//! series names in legend order, titles and axis labels. It serialises to JSON
//! with serde; missing values become `null`.

use chrono::NaiveDateTime;
use envdash_stats::{correlation::CorrelationMatrix, histogram::Histogram};
use serde::Serialize;

use crate::export;

/// Diverging colour scale used for correlation heatmaps.
pub const HEATMAP_COLOR_SCALE: &str = "RdYlGn";

pub const HEATMAP_TITLE: &str = "Correlation Matrix Heatmap";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chart {
    Series(SeriesChart),
    Histogram(HistogramChart),
    Heatmap(HeatmapChart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    Line,
    Scatter,
}

/// Values plotted against time, one series per sensor or label value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesChart {
    pub mode: SeriesMode,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
    /// Symmetric error bar half-width (one standard deviation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
}

/// Binned counts; every series shares the same bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramChart {
    pub title: String,
    pub x_label: String,
    /// `bin_count + 1` edges, or empty when there is nothing to bin.
    pub bin_edges: Vec<f64>,
    pub series: Vec<HistogramSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub name: String,
    pub counts: Vec<u64>,
}

/// Annotated correlation grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapChart {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<String>,
    /// Coefficients rounded to two decimals; `None` where undefined.
    pub z: Vec<Vec<Option<f64>>>,
    pub annotations: Vec<Vec<String>>,
    pub color_scale: String,
    pub show_scale: bool,
}

impl Chart {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Series(chart) => &chart.title,
            Self::Histogram(chart) => &chart.title,
            Self::Heatmap(chart) => &chart.title,
        }
    }
}

impl Point {
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            timestamp,
            value: finite(value),
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(timestamp: NaiveDateTime, value: f64, error: f64) -> Self {
        Self {
            timestamp,
            value: finite(value),
            error: finite(error),
        }
    }
}

impl HistogramChart {
    /// Builds a histogram chart from per-series histograms computed over one shared range.
    #[must_use]
    pub fn from_histograms<I>(title: String, x_label: String, histograms: I) -> Self
    where
        I: IntoIterator<Item = (String, Histogram)>,
    {
        let mut bin_edges = vec![];
        let series = histograms
            .into_iter()
            .map(|(name, histogram)| {
                if bin_edges.is_empty() && !histogram.bins.is_empty() {
                    bin_edges = histogram.bins.iter().map(|b| b.range.start).collect();
                    bin_edges.extend(histogram.bins.last().map(|b| b.range.end));
                }
                let counts = histogram.bins.iter().map(|b| b.count).collect();
                HistogramSeries { name, counts }
            })
            .collect();
        Self {
            title,
            x_label,
            bin_edges,
            series,
        }
    }
}

impl HeatmapChart {
    /// Builds the annotated heatmap for a correlation matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_analysis::chart::HeatmapChart;
    /// # use envdash_stats::correlation::CorrelationMatrix;
    /// let a = [1.0, 2.0, 3.0, 4.0];
    /// let b = [1.0, 3.0, 2.0, 4.0];
    /// let heatmap = HeatmapChart::from_matrix(&CorrelationMatrix::from_columns([
    ///     ("a", &a[..]),
    ///     ("b", &b[..]),
    /// ]));
    /// assert_eq!(heatmap.z[0], vec![Some(1.0), Some(0.8)]);
    /// assert_eq!(heatmap.annotations[0], vec!["1.0", "0.8"]);
    /// ```
    #[must_use]
    pub fn from_matrix(matrix: &CorrelationMatrix) -> Self {
        let rounded = matrix
            .values
            .iter()
            .map(|row| row.iter().map(|&r| round2(r)).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let annotations = rounded
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&r| {
                        if r.is_nan() {
                            "nan".to_owned()
                        } else {
                            export::format_float(r)
                        }
                    })
                    .collect()
            })
            .collect();
        let z = rounded
            .iter()
            .map(|row| row.iter().map(|&r| finite(r)).collect())
            .collect();
        Self {
            title: HEATMAP_TITLE.to_owned(),
            x: matrix.names.clone(),
            y: matrix.names.clone(),
            z,
            annotations,
            color_scale: HEATMAP_COLOR_SCALE.to_owned(),
            show_scale: true,
        }
    }
}

/// Rounds to two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.123), 0.12);
        assert_eq!(round2(-0.987), -0.99);
        assert_eq!(round2(1.0), 1.0);
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn test_heatmap_undefined_cells() {
        let a = [1.0, 2.0, 3.0];
        let flat = [5.0, 5.0, 5.0];
        let heatmap =
            HeatmapChart::from_matrix(&CorrelationMatrix::from_columns([("a", &a[..]), ("flat", &flat[..])]));
        assert_eq!(heatmap.z[0][1], None);
        assert_eq!(heatmap.annotations[1][1], "nan");
        assert_eq!(heatmap.color_scale, "RdYlGn");
        assert!(heatmap.show_scale);
        assert_eq!(heatmap.title, "Correlation Matrix Heatmap");
    }

    #[test]
    fn test_histogram_edges_are_shared() {
        let first = Histogram::with_range([0.0, 1.0, 4.0], 2, 0.0..4.0);
        let second = Histogram::with_range([3.0], 2, 0.0..4.0);
        let chart = HistogramChart::from_histograms(
            "Histogram of Light".to_owned(),
            "light (lux)".to_owned(),
            [("a".to_owned(), first), ("b".to_owned(), second)],
        );
        assert_eq!(chart.bin_edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(chart.series[0].counts, vec![2, 1]);
        assert_eq!(chart.series[1].counts, vec![0, 1]);
    }

    #[test]
    fn test_serialize_series_chart() {
        let chart = Chart::Series(SeriesChart {
            mode: SeriesMode::Line,
            title: "Light over Time (Aggregated by 3min)".to_owned(),
            x_label: "TimeStamp".to_owned(),
            y_label: "light (lux)".to_owned(),
            series: vec![Series {
                name: "s1".to_owned(),
                points: vec![
                    Point::new(ts("2024-03-01 10:00:00"), 12.5),
                    Point::with_error(ts("2024-03-01 10:03:00"), f64::NAN, 1.0),
                ],
            }],
        });
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["type"], "series");
        assert_eq!(json["mode"], "line");
        assert_eq!(json["series"][0]["points"][0]["value"], 12.5);
        assert!(json["series"][0]["points"][0].get("error").is_none());
        assert!(json["series"][0]["points"][1]["value"].is_null());
        assert_eq!(json["series"][0]["points"][1]["error"], 1.0);
        assert_eq!(chart.title(), "Light over Time (Aggregated by 3min)");
    }
}
