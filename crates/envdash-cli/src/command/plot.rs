use std::path::PathBuf;

use envdash_analysis::{
    filter::FilterMethod,
    graph::ChartKind,
    interval::TimeInterval,
    parameter::Parameter,
    pipeline::{self, RenderOutcome},
};

use crate::{
    config::{Config, DashboardConfig, FilterConfig},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlotArg {
    /// Readings file (CSV with `Name`, `TimeStamp` and parameter columns)
    data: PathBuf,
    /// TOML file with dashboard selections; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chart kind: scatter, line, histogram or heatmap [default: scatter]
    #[arg(long)]
    graph_type: Option<ChartKind>,
    /// Parameter to plot, e.g. temperature [default: temperature]
    #[arg(long)]
    parameter: Option<Parameter>,
    /// Outlier filter: none, iqr, std-dev or z-score [default: none]
    #[arg(long)]
    filter: Option<FilterMethod>,
    /// Multiplier (iqr, std-dev) or threshold (z-score) of the outlier filter
    #[arg(long)]
    sensitivity: Option<f64>,
    /// Number of histogram bins (5-50) [default: 10]
    #[arg(long)]
    bins: Option<usize>,
    /// Label column to group by, e.g. '#location'
    #[arg(long)]
    label: Option<String>,
    /// Time bucket, e.g. 15min or 2h [default: 3min]
    #[arg(long)]
    interval: Option<TimeInterval>,
    /// Chart description output path (JSON); stdout if omitted
    #[arg(long)]
    chart_output: Option<PathBuf>,
    /// Directory the export table is written to
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

impl PlotArg {
    fn overrides(&self) -> Config {
        Config {
            dashboard: DashboardConfig {
                graph_type: self.graph_type,
                parameter: self.parameter,
                label: self.label.clone(),
                interval: self.interval,
                bins: self.bins,
            },
            filter: FilterConfig {
                method: self.filter,
                sensitivity: self.sensitivity,
            },
        }
    }
}

pub(crate) fn run(arg: &PlotArg) -> anyhow::Result<()> {
    let file_config = match &arg.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let request = file_config.merged(arg.overrides()).to_request()?;
    log::info!(
        "plotting {} of '{}' (filter: {:?}, label: {:?}, interval: {})",
        request.graph.kind,
        request.graph.parameter,
        request.filter,
        request.graph.label,
        request.graph.interval
    );

    let table = util::read_readings_file(&arg.data)?;

    let output = match pipeline::render(&table, &request) {
        RenderOutcome::Ready(output) => output,
        RenderOutcome::NoData { message } => {
            eprintln!("Warning: {message}");
            return Ok(());
        }
    };

    Output::from_output_path(arg.chart_output.clone())?.write_chart(&output.chart)?;

    let export_path = arg.export_dir.join(output.export.file_name());
    let mut export = Output::open(export_path)?;
    export.write_csv(&output.export)?;
    eprintln!(
        "Wrote {} export rows to {}",
        output.export.len(),
        export.display_path()
    );

    Ok(())
}
