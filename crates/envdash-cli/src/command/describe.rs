use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use envdash_analysis::{parameter::Parameter, table::SensorTable};
use envdash_stats::comprehensive::ComprehensiveStats;

use crate::util::{self, Output};

const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DescribeArg {
    /// Readings file (CSV)
    data: PathBuf,
    /// Also print a histogram of every parameter
    #[arg(long)]
    histogram: bool,
    /// Number of histogram bins
    #[arg(long, default_value_t = 10)]
    bins: usize,
    /// Output file path; stdout if omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DescribeArg) -> anyhow::Result<()> {
    let table = util::read_readings_file(&arg.data)?;
    let mut output = Output::from_output_path(arg.output.clone())?;
    write_summary(&mut output, &table, arg)
        .with_context(|| format!("Failed to write summary to {}", output.display_path()))?;
    output.flush()?;
    Ok(())
}

fn write_summary<W>(w: &mut W, table: &SensorTable, arg: &DescribeArg) -> anyhow::Result<()>
where
    W: std::io::Write,
{
    writeln!(w, "Rows:          {}", table.len())?;
    writeln!(w, "Sensors:       {}", table.sorted_names().join(", "))?;
    let labels = table.label_columns().collect::<Vec<_>>();
    writeln!(
        w,
        "Label columns: {}",
        if labels.is_empty() {
            "(none)".to_owned()
        } else {
            labels.join(", ")
        }
    )?;
    writeln!(w)?;

    writeln!(
        w,
        "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "parameter", "count", "min", "q1", "median", "q3", "max", "mean", "std"
    )?;
    let mut histograms = vec![];
    for parameter in Parameter::ALL {
        let Some(values) = table.parameter(parameter) else {
            continue;
        };
        let Some(stats) = ComprehensiveStats::new(values.iter().copied(), &QUARTILES, arg.bins)
        else {
            writeln!(w, "{:<20} {:>6}", parameter.column_name(), 0)?;
            continue;
        };
        let quartile = |p| stats.percentiles.get(p).unwrap_or(f64::NAN);
        writeln!(
            w,
            "{:<20} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            parameter.column_name(),
            stats.stats.count,
            stats.stats.min,
            quartile(25.0),
            quartile(50.0),
            quartile(75.0),
            stats.stats.max,
            stats.stats.mean,
            stats.stats.std_dev,
        )?;
        histograms.push((parameter, stats.histogram));
    }

    if arg.histogram {
        for (parameter, histogram) in histograms {
            writeln!(w)?;
            writeln!(w, "{}", parameter.axis_label())?;
            let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0);
            for bin in &histogram.bins {
                writeln!(
                    w,
                    "  {:>10.3} .. {:>10.3} {:>6} {}",
                    bin.range.start,
                    bin.range.end,
                    bin.count,
                    bar(bin.count, max_count)
                )?;
            }
        }
    }
    Ok(())
}

#[expect(clippy::cast_possible_truncation)]
fn bar(count: u64, max_count: u64) -> String {
    const WIDTH: u64 = 40;
    let len = if max_count == 0 {
        0
    } else {
        count * WIDTH / max_count
    };
    "#".repeat(len as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(csv: &str, histogram: bool) -> String {
        let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
        let arg = DescribeArg {
            data: PathBuf::new(),
            histogram,
            bins: 2,
            output: None,
        };
        let mut buf = vec![];
        write_summary(&mut buf, &table, &arg).unwrap();
        String::from_utf8(buf).unwrap()
    }

    const READINGS: &str = "\
Name,TimeStamp,temperature,battery,#location
b,2024-03-01 10:00:00,20.0,,kitchen
a,2024-03-01 10:00:00,22.0,,cellar
a,2024-03-01 10:03:00,24.0,,cellar
";

    #[test]
    fn test_summary() {
        let summary = describe(READINGS, false);
        assert!(summary.contains("Rows:          3\n"));
        assert!(summary.contains("Sensors:       a, b\n"));
        assert!(summary.contains("Label columns: #location\n"));
        let temperature = summary
            .lines()
            .find(|l| l.starts_with("temperature"))
            .unwrap();
        let fields = temperature.split_whitespace().collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![
                "temperature",
                "3",
                "20.000",
                "21.000",
                "22.000",
                "23.000",
                "24.000",
                "22.000",
                "2.000"
            ]
        );
        // An all-missing column reports a zero count.
        assert!(summary.lines().any(|l| l.split_whitespace().eq(["battery", "0"])));
    }

    #[test]
    fn test_histogram() {
        let summary = describe(READINGS, true);
        assert!(summary.contains("temperature (°C)\n"));
        assert_eq!(summary.matches(" .. ").count(), 2);
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(5, 10).len(), 20);
        assert_eq!(bar(10, 10).len(), 40);
    }
}
