//! Column-oriented table of sensor readings.
//!
//! One row is one observation: the reporting sensor (`Name`), when it was taken
//! (`TimeStamp`), the numeric parameters present in the source file and any
//! label columns. Label columns are recognised by the [`LABEL_PREFIX`] marker
//! at the start of their header.
//!
//! Missing numeric readings are stored as NaN; missing labels as `None`.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, Read},
    path::Path,
};

use chrono::{DateTime, NaiveDateTime};

use crate::parameter::Parameter;

/// Header prefix marking a label column.
pub const LABEL_PREFIX: char = '#';

pub const NAME_COLUMN: &str = "Name";
pub const TIMESTAMP_COLUMN: &str = "TimeStamp";

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("failed to read readings: {_0}")]
    #[from]
    Io(io::Error),
    #[display("failed to parse readings: {_0}")]
    #[from]
    Csv(csv::Error),
    #[display("no data available")]
    Empty,
    #[display("required column '{column}' not found")]
    MissingColumn { column: &'static str },
    #[display("row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
    #[display("row {row}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Sensor readings loaded from a delimited file.
///
/// All columns have the same length. The table is never mutated after it is
/// loaded; transformations such as outlier filtering produce a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorTable {
    names: Vec<String>,
    timestamps: Vec<NaiveDateTime>,
    parameters: BTreeMap<Parameter, Vec<f64>>,
    labels: BTreeMap<String, Vec<Option<String>>>,
}

impl SensorTable {
    /// Loads readings from a comma-separated file.
    pub fn from_path<P>(path: P) -> Result<Self, LoadError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Loads readings from comma-separated text with a header row.
    ///
    /// `Name` and `TimeStamp` are required. Any of the six parameter columns may be
    /// present; other columns are ignored unless their header starts with `#`.
    /// A table without rows is rejected as [`LoadError::Empty`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_analysis::{parameter::Parameter, table::SensorTable};
    /// let csv = "\
    /// Name,TimeStamp,temperature,#room
    /// s1,2024-03-01 10:00:00,21.5,kitchen
    /// s2,2024-03-01 10:01:00,,office
    /// ";
    /// let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.parameter(Parameter::Temperature).unwrap()[0], 21.5);
    /// assert!(table.parameter(Parameter::Temperature).unwrap()[1].is_nan());
    /// assert!(table.parameter(Parameter::Humidity).is_none());
    /// assert_eq!(table.label_columns().collect::<Vec<_>>(), ["#room"]);
    /// ```
    pub fn from_reader<R>(reader: R) -> Result<Self, LoadError>
    where
        R: Read,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or(LoadError::MissingColumn { column })
        };
        let name_idx = find(NAME_COLUMN)?;
        let timestamp_idx = find(TIMESTAMP_COLUMN)?;
        let parameter_idx = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| Parameter::from_column_name(h).map(|p| (p, idx)))
            .collect::<Vec<_>>();
        let label_idx = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with(LABEL_PREFIX))
            .map(|(idx, h)| (h.to_owned(), idx))
            .collect::<Vec<_>>();

        let mut table = Self {
            names: vec![],
            timestamps: vec![],
            parameters: parameter_idx.iter().map(|(p, _)| (*p, vec![])).collect(),
            labels: label_idx.iter().map(|(h, _)| (h.clone(), vec![])).collect(),
        };

        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            table.names.push(field(name_idx).to_owned());

            let raw_timestamp = field(timestamp_idx);
            let timestamp =
                parse_timestamp(raw_timestamp).ok_or_else(|| LoadError::InvalidTimestamp {
                    row,
                    value: raw_timestamp.to_owned(),
                })?;
            table.timestamps.push(timestamp);

            for (parameter, idx) in &parameter_idx {
                let raw = field(*idx);
                let value = parse_number(raw).ok_or_else(|| LoadError::InvalidNumber {
                    row,
                    column: parameter.column_name().to_owned(),
                    value: raw.to_owned(),
                })?;
                if let Some(column) = table.parameters.get_mut(parameter) {
                    column.push(value);
                }
            }

            for (header, idx) in &label_idx {
                let raw = field(*idx);
                let label = (!raw.is_empty()).then(|| raw.to_owned());
                if let Some(column) = table.labels.get_mut(header) {
                    column.push(label);
                }
            }
        }

        if table.is_empty() {
            return Err(LoadError::Empty);
        }
        log::debug!(
            "loaded {} readings with parameters [{}] and labels [{}]",
            table.len(),
            table
                .parameters()
                .map(Parameter::column_name)
                .collect::<Vec<_>>()
                .join(", "),
            table.label_columns().collect::<Vec<_>>().join(", "),
        );
        Ok(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sensor name of every row.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Timestamp of every row.
    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Values of a parameter column, or `None` if the table has no such column.
    #[must_use]
    pub fn parameter(&self, parameter: Parameter) -> Option<&[f64]> {
        self.parameters.get(&parameter).map(Vec::as_slice)
    }

    /// Parameters present in the table.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.parameters.keys().copied()
    }

    /// Values of a label column, or `None` if the table has no such column.
    #[must_use]
    pub fn label(&self, column: &str) -> Option<&[Option<String>]> {
        self.labels.get(column).map(Vec::as_slice)
    }

    /// Headers of the label columns, in ascending order.
    pub fn label_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.keys().map(String::as_str)
    }

    /// Unique sensor names in ascending order.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns a copy of this table with one parameter column replaced.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per row.
    #[must_use]
    pub fn with_parameter_values(&self, parameter: Parameter, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), self.len(), "column length must match row count");
        let mut table = self.clone();
        table.parameters.insert(parameter, values);
        table
    }

    /// Returns a copy of this table without the given parameter column.
    #[must_use]
    pub fn without_parameter(&self, parameter: Parameter) -> Self {
        let mut table = self.clone();
        table.parameters.remove(&parameter);
        table
    }
}

/// Parses a timestamp in one of the accepted layouts. Offsets are converted to UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn parse_number(value: &str) -> Option<f64> {
    match value {
        "" | "NaN" | "nan" | "NA" | "null" => Some(f64::NAN),
        _ => value.parse().ok(),
    }
}
