//! One dashboard interaction: optional outlier filter, then graph construction.

use crate::{
    filter::OutlierFilter,
    graph::{self, ChartKind, GraphOutput, GraphRequest},
    table::SensorTable,
};

/// Everything the user selected for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub filter: Option<OutlierFilter>,
    pub graph: GraphRequest,
}

#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum RenderOutcome {
    Ready(GraphOutput),
    /// The selection cannot be plotted; `message` is shown to the user.
    NoData { message: String },
}

/// Renders one request against the source table.
///
/// The source table is never modified. Failures to build the graph are
/// reported as [`RenderOutcome::NoData`]. A heatmap correlates every
/// parameter, so it is built from the unfiltered table.
///
/// # Examples
///
/// ```
/// # use envdash_analysis::{filter::OutlierFilter, graph::{ChartKind, GraphRequest}, parameter::Parameter};
/// # use envdash_analysis::{pipeline::{render, DashboardRequest, RenderOutcome}, table::SensorTable};
/// let csv = "\
/// Name,TimeStamp,light
/// a,2024-03-01 10:00:00,120
/// a,2024-03-01 10:03:00,130
/// ";
/// let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
/// let request = DashboardRequest {
///     filter: Some(OutlierFilter::ZScore { threshold: 3.0 }),
///     graph: GraphRequest::new(ChartKind::Histogram, Parameter::Battery),
/// };
/// let RenderOutcome::NoData { message } = render(&table, &request) else {
///     panic!("battery is not in the table");
/// };
/// assert_eq!(message, "no data available for the selected parameter");
/// ```
#[must_use]
pub fn render(source: &SensorTable, request: &DashboardRequest) -> RenderOutcome {
    let parameter = request.graph.parameter;
    let filtered;
    let table = match request.filter {
        Some(filter) if request.graph.kind == ChartKind::Heatmap => {
            log::debug!("{} filter is ignored for heatmaps", filter.method());
            source
        }
        Some(filter) => {
            filtered = filter.apply(source, parameter).table;
            &filtered
        }
        None => source,
    };

    match graph::build_graph(table, &request.graph) {
        Ok(output) => RenderOutcome::Ready(output),
        Err(err) => {
            log::error!("cannot render {} chart for '{parameter}': {err}", request.graph.kind);
            RenderOutcome::NoData {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chart::Chart,
        export::ExportTable,
        filter::FilterMethod,
        parameter::Parameter,
    };

    const READINGS: &str = "\
Name,TimeStamp,temperature,humidity
a,2024-03-01 10:00:00,20.0,40
a,2024-03-01 10:03:00,20.5,41
a,2024-03-01 10:06:00,21.0,40
a,2024-03-01 10:09:00,20.5,42
a,2024-03-01 10:12:00,95.0,41
";

    fn load() -> SensorTable {
        SensorTable::from_reader(READINGS.as_bytes()).unwrap()
    }

    #[test]
    fn test_filter_feeds_graph() {
        let table = load();
        let request = DashboardRequest {
            filter: Some(OutlierFilter::Iqr { multiplier: 1.5 }),
            graph: GraphRequest::new(ChartKind::Line, Parameter::Temperature),
        };
        let RenderOutcome::Ready(output) = render(&table, &request) else {
            panic!("expected a chart");
        };
        let ExportTable::Pivot(pivot) = &output.export else {
            panic!("expected a pivot export");
        };
        // The 95.0 reading is nulled, so its bucket disappears from the pivot.
        assert_eq!(pivot.rows.len(), 4);
        let Chart::Series(chart) = &output.chart else {
            panic!("expected a series chart");
        };
        assert_eq!(chart.series[0].points[4].value, None);
        // The source table is untouched.
        assert_eq!(table.parameter(Parameter::Temperature).unwrap()[4], 95.0);
    }

    #[test]
    fn test_without_filter() {
        let table = load();
        let request = DashboardRequest {
            filter: None,
            graph: GraphRequest::new(ChartKind::Line, Parameter::Temperature),
        };
        let RenderOutcome::Ready(output) = render(&table, &request) else {
            panic!("expected a chart");
        };
        assert_eq!(output.export.len(), 5);
    }

    #[test]
    fn test_missing_parameter_is_no_data() {
        let table = load().without_parameter(Parameter::Temperature);
        for kind in [ChartKind::Scatter, ChartKind::Line, ChartKind::Histogram] {
            let request = DashboardRequest {
                filter: Some(OutlierFilter::StdDev { multiplier: 2.5 }),
                graph: GraphRequest::new(kind, Parameter::Temperature),
            };
            assert!(render(&table, &request).is_no_data());
        }
        let request = DashboardRequest {
            filter: None,
            graph: GraphRequest::new(ChartKind::Heatmap, Parameter::Temperature),
        };
        assert!(render(&table, &request).is_ready());
    }

    const ALL_PARAMETERS: &str = "\
Name,TimeStamp,light,temperature,humidity,barometric_pressure,barometric_temp,battery
a,2024-03-01 10:00:00,100,20.0,40,1010.0,21.0,3.30
a,2024-03-01 10:03:00,200,22.0,38,1011.5,22.5,3.28
b,2024-03-01 10:00:00,150,21.0,45,1009.0,21.0,3.31
b,2024-03-01 10:03:00,400,25.0,30,1012.0,25.5,3.25
b,2024-03-01 10:06:00,250,90.0,43,1010.5,23.0,3.29
";

    fn heatmap_csv(outcome: RenderOutcome) -> String {
        let RenderOutcome::Ready(output) = outcome else {
            panic!("expected a heatmap");
        };
        let mut buf = vec![];
        output.export.write_csv(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_heatmap_ignores_parameter_and_filter() {
        let table = SensorTable::from_reader(ALL_PARAMETERS.as_bytes()).unwrap();
        let unfiltered = heatmap_csv(render(
            &table,
            &DashboardRequest {
                filter: None,
                graph: GraphRequest::new(ChartKind::Heatmap, Parameter::Temperature),
            },
        ));
        assert!(unfiltered.starts_with(",light,temperature,humidity,"));

        let filters = [FilterMethod::Iqr, FilterMethod::StdDev, FilterMethod::ZScore]
            .map(|method| method.configure(None).unwrap());
        for parameter in Parameter::ALL {
            for filter in filters.iter().copied().chain([None]) {
                let request = DashboardRequest {
                    filter,
                    graph: GraphRequest::new(ChartKind::Heatmap, parameter),
                };
                assert_eq!(heatmap_csv(render(&table, &request)), unfiltered);
            }
        }

        // On a line chart the same filter drops the 90.0 reading and its 10:06 bucket.
        let request = DashboardRequest {
            filter: Some(OutlierFilter::Iqr { multiplier: 1.5 }),
            graph: GraphRequest::new(ChartKind::Line, Parameter::Temperature),
        };
        let RenderOutcome::Ready(output) = render(&table, &request) else {
            panic!("expected a chart");
        };
        assert_eq!(output.export.len(), 2);
    }
}
