use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A numeric sensor parameter recorded in the readings table.
///
/// Columns are addressed through this identifier instead of raw strings, so an
/// unknown name is rejected once, when it is parsed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Light,
    Temperature,
    Humidity,
    BarometricPressure,
    BarometricTemp,
    Battery,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown parameter '{name}'")]
pub struct UnknownParameterError {
    pub name: String,
}

impl Parameter {
    /// All parameters, in the column order used by the correlation heatmap.
    pub const ALL: [Self; 6] = [
        Self::Light,
        Self::Temperature,
        Self::Humidity,
        Self::BarometricPressure,
        Self::BarometricTemp,
        Self::Battery,
    ];

    /// Column header of this parameter in the readings file.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::BarometricPressure => "barometric_pressure",
            Self::BarometricTemp => "barometric_temp",
            Self::Battery => "battery",
        }
    }

    /// Display unit. Purely presentational.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Light => "lux",
            Self::Temperature | Self::BarometricTemp => "°C",
            Self::Humidity => "%",
            Self::BarometricPressure => "millibars",
            Self::Battery => "Voltage",
        }
    }

    /// Axis label, e.g. `temperature (°C)`.
    #[must_use]
    pub fn axis_label(self) -> String {
        format!("{} ({})", self.column_name(), self.unit())
    }

    /// Column name with only its first letter upper-cased, e.g. `Barometric_pressure`.
    #[must_use]
    pub fn title_name(self) -> String {
        let name = self.column_name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Looks up a parameter by its column header.
    #[must_use]
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.column_name() == name)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Parameter {
    type Err = UnknownParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column_name(s.trim()).ok_or_else(|| UnknownParameterError {
            name: s.to_owned(),
        })
    }
}
