use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use envdash_analysis::{chart::Chart, export::ExportTable, table::SensorTable};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Opens `path`, or stdout when no path is given.
    pub fn from_output_path(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Output::Stdout {
                writer: io::stdout().lock(),
            });
        };
        Output::open(path)
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    /// Writes the chart description as pretty JSON followed by a newline.
    pub fn write_chart(&mut self, chart: &Chart) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *self, chart)?;
        writeln!(self)?;
        self.flush()
            .with_context(|| format!("Failed to write chart to {}", self.display_path()))
    }

    pub fn write_csv(&mut self, table: &ExportTable) -> anyhow::Result<()> {
        table
            .write_csv(&mut *self)
            .with_context(|| format!("Failed to write CSV to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Read sensor readings from a CSV file
///
/// # Errors
///
/// Returns error if the file cannot be read or holds no readings
pub fn read_readings_file<P>(path: P) -> anyhow::Result<SensorTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let table = SensorTable::from_path(path)
        .inspect_err(|err| log::error!("{err}"))
        .with_context(|| format!("Failed to load readings file: {}", path.display()))?;
    log::info!(
        "loaded {} readings from {} sensors",
        table.len(),
        table.sorted_names().len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use envdash_analysis::{
        graph::{ChartKind, GraphRequest, build_graph},
        parameter::Parameter,
    };

    use super::*;

    #[test]
    fn test_read_readings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.csv");
        fs::write(
            &path,
            "Name,TimeStamp,light\na,2024-03-01 10:00:00,120\nb,2024-03-01 10:00:00,80\n",
        )
        .unwrap();
        let table = read_readings_file(&path).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_read_empty_readings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.csv");
        fs::write(&path, "Name,TimeStamp,light\n").unwrap();
        let err = read_readings_file(&path).unwrap_err();
        assert_eq!(format!("{:#}", err.root_cause()), "no data available");
    }

    #[test]
    fn test_read_missing_readings_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_readings_file(dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_write_chart_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let table = SensorTable::from_reader(
            "Name,TimeStamp,light,battery\na,2024-03-01 10:00:00,1,3.0\na,2024-03-01 10:03:00,2,4.0\n"
                .as_bytes(),
        )
        .unwrap();
        let request = GraphRequest::new(ChartKind::Heatmap, Parameter::Light);
        let output = build_graph(&table, &request).unwrap();
        let path = dir.path().join(output.export.file_name());
        let mut file = Output::open(path.clone()).unwrap();
        file.write_csv(&output.export).unwrap();
        drop(file);
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            ",light,battery\nlight,1.0,1.0\nbattery,1.0,1.0\n"
        );

        let chart_path = dir.path().join("chart.json");
        let mut file = Output::from_output_path(Some(chart_path.clone())).unwrap();
        assert_eq!(file.display_path(), chart_path.display().to_string());
        file.write_chart(&output.chart).unwrap();
        drop(file);
        let json = fs::read_to_string(chart_path).unwrap();
        assert!(json.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::to_value(&output.chart).unwrap());
    }
}
