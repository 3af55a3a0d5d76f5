//! TOML selection files.
//!
//! Instead of passing every selection as a flag, a dashboard setup can be
//! kept in a file:
//!
//! ```toml
//! # envdash.toml
//! [dashboard]
//! graph_type = "line"
//! parameter = "humidity"
//! label = "#location"
//! interval = "15min"
//!
//! [filter]
//! method = "iqr"
//! sensitivity = 2.0
//! ```
//!
//! Command line flags override values from the file.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use envdash_analysis::{
    filter::FilterMethod,
    graph::{self, ChartKind, GraphRequest},
    interval::TimeInterval,
    parameter::Parameter,
    pipeline::DashboardRequest,
};
use serde::Deserialize;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// What to plot.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    pub graph_type: Option<ChartKind>,
    /// Ignored for heatmaps.
    pub parameter: Option<Parameter>,
    /// `#`-prefixed label column to group by.
    pub label: Option<String>,
    pub interval: Option<TimeInterval>,
    /// Histogram bins (5-50).
    pub bins: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub method: Option<FilterMethod>,
    /// Multiplier or threshold of the chosen method.
    pub sensitivity: Option<f64>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Returns `self` with every value set in `overrides` replaced.
    #[must_use]
    pub fn merged(self, overrides: Config) -> Self {
        Self {
            dashboard: DashboardConfig {
                graph_type: overrides.dashboard.graph_type.or(self.dashboard.graph_type),
                parameter: overrides.dashboard.parameter.or(self.dashboard.parameter),
                label: overrides.dashboard.label.or(self.dashboard.label),
                interval: overrides.dashboard.interval.or(self.dashboard.interval),
                bins: overrides.dashboard.bins.or(self.dashboard.bins),
            },
            filter: FilterConfig {
                method: overrides.filter.method.or(self.filter.method),
                sensitivity: overrides.filter.sensitivity.or(self.filter.sensitivity),
            },
        }
    }

    /// Validates the selections and fills in defaults.
    pub fn to_request(&self) -> Result<DashboardRequest> {
        let dashboard = &self.dashboard;
        let kind = dashboard.graph_type.unwrap_or_default();
        let bins = dashboard.bins.unwrap_or(graph::DEFAULT_BINS);
        ensure!(
            graph::BINS_RANGE.contains(&bins),
            "number of bins must be between {} and {}, got {bins}",
            graph::BINS_RANGE.start(),
            graph::BINS_RANGE.end()
        );

        let method = self.filter.method.unwrap_or_default();
        if method == FilterMethod::None && self.filter.sensitivity.is_some() {
            log::warn!("filter sensitivity is ignored without a filter method");
        }
        let mut filter = method.configure(self.filter.sensitivity)?;

        let mut graph = GraphRequest::new(kind, dashboard.parameter.unwrap_or(Parameter::Temperature))
            .with_interval(dashboard.interval.unwrap_or_default())
            .with_bins(bins);
        if kind == ChartKind::Heatmap {
            if dashboard.label.is_some() {
                log::warn!("label selection is ignored for heatmaps");
            }
            if let Some(filter) = filter.take() {
                log::warn!("{} filter is ignored for heatmaps", filter.method());
            }
        } else if let Some(label) = &dashboard.label {
            graph = graph.with_label(label.clone());
        }

        Ok(DashboardRequest { filter, graph })
    }
}

#[cfg(test)]
mod tests {
    use envdash_analysis::filter::OutlierFilter;

    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r##"
            [dashboard]
            graph_type = "histogram"
            parameter = "barometric_temp"
            label = "#location"
            interval = "2H"
            bins = 25

            [filter]
            method = "std-dev"
            sensitivity = 3.5
        "##;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.dashboard.graph_type, Some(ChartKind::Histogram));
        assert_eq!(config.dashboard.parameter, Some(Parameter::BarometricTemp));
        assert_eq!(config.dashboard.label.as_deref(), Some("#location"));
        assert_eq!(config.dashboard.interval, Some(TimeInterval::Hours(2)));
        assert_eq!(config.dashboard.bins, Some(25));
        assert_eq!(config.filter.method, Some(FilterMethod::StdDev));
        assert_eq!(config.filter.sensitivity, Some(3.5));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [filter]
            method = "iqr"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.filter.method, Some(FilterMethod::Iqr));
        assert_eq!(config.dashboard, DashboardConfig::default());
        let request = config.to_request().unwrap();
        assert_eq!(request.filter, Some(OutlierFilter::Iqr { multiplier: 1.5 }));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        let request = config.to_request().unwrap();
        assert_eq!(request.filter, None);
        assert_eq!(request.graph.kind, ChartKind::Scatter);
        assert_eq!(request.graph.parameter, Parameter::Temperature);
        assert_eq!(request.graph.interval, TimeInterval::Minutes(3));
        assert_eq!(request.graph.bins, 10);
        assert_eq!(request.graph.label, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::parse("[dashboard]\ninterval = \"5min\"").is_err());
        assert!(Config::parse("[dashboard]\nparameter = \"co2\"").is_err());
        assert!(Config::parse("[dashboard]\ncolour = \"red\"").is_err());

        let config = Config::parse("[dashboard]\nbins = 60").unwrap();
        assert!(config.to_request().is_err());
        let config = Config::parse("[filter]\nmethod = \"z-score\"\nsensitivity = 0.5").unwrap();
        assert!(config.to_request().is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file = Config::parse(
            r#"
            [dashboard]
            graph_type = "line"
            parameter = "humidity"
            [filter]
            method = "iqr"
            sensitivity = 2.0
            "#,
        )
        .unwrap();
        let flags = Config {
            dashboard: DashboardConfig {
                parameter: Some(Parameter::Light),
                ..DashboardConfig::default()
            },
            filter: FilterConfig {
                sensitivity: Some(0.5),
                ..FilterConfig::default()
            },
        };

        let request = file.merged(flags).to_request().unwrap();
        assert_eq!(request.graph.kind, ChartKind::Line);
        assert_eq!(request.graph.parameter, Parameter::Light);
        assert_eq!(request.filter, Some(OutlierFilter::Iqr { multiplier: 0.5 }));
    }

    #[test]
    fn test_heatmap_drops_label() {
        let config = Config::parse(
            r##"
            [dashboard]
            graph_type = "heatmap"
            label = "#location"
            "##,
        )
        .unwrap();
        assert_eq!(config.to_request().unwrap().graph.label, None);
    }

    #[test]
    fn test_heatmap_drops_filter() {
        let config = Config::parse(
            r#"
            [dashboard]
            graph_type = "heatmap"
            parameter = "humidity"

            [filter]
            method = "iqr"
            sensitivity = 1.5
            "#,
        )
        .unwrap();
        let request = config.to_request().unwrap();
        assert_eq!(request.graph.kind, ChartKind::Heatmap);
        assert_eq!(request.filter, None);

        // An invalid sensitivity is still rejected.
        let config = Config::parse(
            "[dashboard]\ngraph_type = \"heatmap\"\n[filter]\nmethod = \"iqr\"\nsensitivity = 9.0",
        )
        .unwrap();
        assert!(config.to_request().is_err());
    }
}
