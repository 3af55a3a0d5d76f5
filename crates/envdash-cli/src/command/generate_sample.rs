use std::{io, path::PathBuf};

use anyhow::{Context as _, ensure};
use chrono::{NaiveDateTime, TimeDelta};
use envdash_analysis::{
    parameter::Parameter,
    table::{self, NAME_COLUMN, TIMESTAMP_COLUMN},
};
use rand::{Rng, SeedableRng as _};
use rand_distr::{Distribution as _, Normal};
use rand_pcg::Pcg64;

use crate::util::Output;

const LOCATIONS: [&str; 4] = ["kitchen", "living_room", "bedroom", "cellar"];
const LOCATION_COLUMN: &str = "#location";
const MAX_JITTER_SECONDS: i64 = 20;
/// Distance of an injected outlier from the mean, in standard deviations.
const OUTLIER_SIGMA: f64 = 8.0;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateSampleArg {
    /// Number of sensors
    #[arg(long, default_value_t = 4)]
    sensors: usize,
    /// Readings per sensor
    #[arg(long, default_value_t = 480)]
    readings: usize,
    /// Minutes between two readings of one sensor
    #[arg(long, default_value_t = 1)]
    step_minutes: u32,
    /// Timestamp of the first reading
    #[arg(long, value_parser = parse_start, default_value = "2024-03-01 00:00:00")]
    start: NaiveDateTime,
    /// Probability that a reading is replaced by an outlier
    #[arg(long, default_value_t = 0.01)]
    outlier_rate: f64,
    /// Probability that a reading is missing
    #[arg(long, default_value_t = 0.005)]
    missing_rate: f64,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output file path; stdout if omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_start(s: &str) -> Result<NaiveDateTime, String> {
    table::parse_timestamp(s).ok_or_else(|| format!("invalid timestamp '{s}'"))
}

/// Mean and standard deviation of one parameter for one sensor.
#[derive(Debug, Clone, Copy)]
struct Profile {
    parameter: Parameter,
    mean: f64,
    std_dev: f64,
    decimals: usize,
}

impl Profile {
    #[expect(clippy::cast_precision_loss)]
    fn for_sensor(parameter: Parameter, sensor: usize) -> Self {
        let offset = sensor as f64;
        let (mean, std_dev, decimals) = match parameter {
            Parameter::Light => (300.0 + 50.0 * offset, 40.0, 1),
            Parameter::Temperature => (21.0 + 0.8 * offset, 0.6, 2),
            Parameter::Humidity => (45.0 - 2.0 * offset, 3.0, 2),
            Parameter::BarometricPressure => (1013.0, 1.5, 2),
            Parameter::BarometricTemp => (21.5 + 0.8 * offset, 0.6, 2),
            Parameter::Battery => (3.3 - 0.02 * offset, 0.01, 3),
        };
        Self {
            parameter,
            mean,
            std_dev,
            decimals,
        }
    }
}

pub(crate) fn run(arg: &GenerateSampleArg) -> anyhow::Result<()> {
    let mut output = Output::from_output_path(arg.output.clone())?;
    let rows = generate(arg, &mut output)
        .with_context(|| format!("Failed to write sample to {}", output.display_path()))?;
    eprintln!("Wrote {rows} readings to {}", output.display_path());
    Ok(())
}

fn generate<W>(arg: &GenerateSampleArg, writer: W) -> anyhow::Result<usize>
where
    W: io::Write,
{
    ensure!(arg.sensors > 0, "at least one sensor is required");
    ensure!(
        (0.0..=1.0).contains(&arg.outlier_rate),
        "outlier rate must be between 0 and 1"
    );
    ensure!(
        (0.0..=1.0).contains(&arg.missing_rate),
        "missing rate must be between 0 and 1"
    );

    let mut rng = Pcg64::seed_from_u64(arg.seed);
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![NAME_COLUMN, TIMESTAMP_COLUMN];
    header.extend(Parameter::ALL.map(Parameter::column_name));
    header.push(LOCATION_COLUMN);
    writer.write_record(&header)?;

    let step = TimeDelta::minutes(i64::from(arg.step_minutes));
    let mut rows = 0;
    let mut outliers = 0;
    for reading in 0..arg.readings {
        let slot = arg.start + step * i32::try_from(reading)?;
        for sensor in 0..arg.sensors {
            let jitter = TimeDelta::seconds(rng.random_range(0..=MAX_JITTER_SECONDS));
            let mut record = vec![
                format!("sensor-{:02}", sensor + 1),
                (slot + jitter).format("%Y-%m-%d %H:%M:%S").to_string(),
            ];
            for parameter in Parameter::ALL {
                let profile = Profile::for_sensor(parameter, sensor);
                let cell = match sample(&mut rng, profile, arg)? {
                    Reading::Missing => String::new(),
                    Reading::Normal(value) => format_reading(value, profile.decimals),
                    Reading::Outlier(value) => {
                        outliers += 1;
                        format_reading(value, profile.decimals)
                    }
                };
                record.push(cell);
            }
            record.push(LOCATIONS[sensor % LOCATIONS.len()].to_owned());
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    writer.flush()?;
    log::info!("generated {rows} readings with {outliers} injected outliers");
    Ok(rows)
}

fn format_reading(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

enum Reading {
    Missing,
    Normal(f64),
    Outlier(f64),
}

fn sample<R>(rng: &mut R, profile: Profile, arg: &GenerateSampleArg) -> anyhow::Result<Reading>
where
    R: Rng + ?Sized,
{
    if rng.random_bool(arg.missing_rate) {
        return Ok(Reading::Missing);
    }
    if rng.random_bool(arg.outlier_rate) {
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let value = profile.mean + sign * OUTLIER_SIGMA * profile.std_dev;
        return Ok(Reading::Outlier(value));
    }
    let normal = Normal::new(profile.mean, profile.std_dev)
        .with_context(|| format!("invalid distribution for '{}'", profile.parameter))?;
    Ok(Reading::Normal(normal.sample(rng)))
}
