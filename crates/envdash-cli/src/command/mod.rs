use clap::{Parser, Subcommand};

use self::{describe::DescribeArg, generate_sample::GenerateSampleArg, plot::PlotArg};

mod describe;
mod generate_sample;
mod plot;

/// Explore environmental sensor readings: filter outliers, plot and export aggregates
#[derive(Debug, Clone, Parser)]
#[command(name = "envdash", author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Build a chart and its export table from a readings file
    Plot(#[clap(flatten)] PlotArg),
    /// Print summary statistics of a readings file
    Describe(#[clap(flatten)] DescribeArg),
    /// Write a synthetic readings file
    GenerateSample(#[clap(flatten)] GenerateSampleArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);
    match args.mode {
        Mode::Plot(arg) => plot::run(&arg)?,
        Mode::Describe(arg) => describe::run(&arg)?,
        Mode::GenerateSample(arg) => generate_sample::run(&arg)?,
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}
