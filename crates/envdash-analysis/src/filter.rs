//! Statistical outlier filters.
//!
//! A filter looks at one parameter column and replaces values outside the
//! accepted range with the missing-value marker (NaN). Rows are never removed
//! and no other column changes. The input table is left untouched; a filtered
//! copy is returned.
//!
//! Three rules are available:
//!
//! - **Interquartile range**: keep `[Q1 - n·IQR, Q3 + n·IQR]`
//! - **Standard deviation**: keep `[mean - n·σ, mean + n·σ]`
//! - **Z-score**: keep values with `|(x - mean) / σ| < threshold`
//!
//! σ is the sample standard deviation. When it is zero or undefined (fewer than
//! two observations) the standard-deviation and z-score rules have no meaningful
//! boundary and nothing is filtered.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use envdash_stats::{descriptive, percentiles};
use serde::{Deserialize, Serialize};

use crate::{parameter::Parameter, table::SensorTable};

/// Outlier detection method selectable by the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMethod {
    #[default]
    None,
    Iqr,
    StdDev,
    ZScore,
}

/// A configured outlier filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierFilter {
    /// Interquartile-range rule with the given IQR multiplier.
    Iqr { multiplier: f64 },
    /// Standard-deviation rule with the given σ multiplier.
    StdDev { multiplier: f64 },
    /// Z-score rule with the given absolute threshold.
    ZScore { threshold: f64 },
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FilterError {
    #[display("{method} sensitivity must be between {min} and {max}, got {value}")]
    SensitivityOutOfRange {
        method: FilterMethod,
        value: f64,
        min: f64,
        max: f64,
    },
    #[display("unknown filter method '{name}' (expected none, iqr, std-dev or z-score)")]
    UnknownMethod { name: String },
}

/// The acceptance rule computed from a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Keep values inside the closed interval.
    Range { lower: f64, upper: f64 },
    /// Keep values whose absolute z-score is strictly below `threshold`.
    ZScore {
        mean: f64,
        std_dev: f64,
        threshold: f64,
    },
}

/// Result of applying a filter.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// The filtered copy of the input table.
    pub table: SensorTable,
    /// The rule that was applied, or `None` if nothing could be filtered.
    pub criterion: Option<Criterion>,
    /// Number of values replaced by the missing-value marker.
    pub nulled: usize,
}

impl FilterMethod {
    pub const ALL: [Self; 4] = [Self::None, Self::Iqr, Self::StdDev, Self::ZScore];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Iqr => "iqr",
            Self::StdDev => "std-dev",
            Self::ZScore => "z-score",
        }
    }

    /// Default sensitivity, or `None` for [`FilterMethod::None`].
    #[must_use]
    pub const fn default_sensitivity(self) -> Option<f64> {
        match self {
            Self::None => None,
            Self::Iqr => Some(1.5),
            Self::StdDev => Some(2.5),
            Self::ZScore => Some(3.0),
        }
    }

    /// Accepted sensitivity range, or `None` for [`FilterMethod::None`].
    #[must_use]
    pub const fn sensitivity_range(self) -> Option<RangeInclusive<f64>> {
        match self {
            Self::None => None,
            Self::Iqr => Some(0.5..=3.0),
            Self::StdDev | Self::ZScore => Some(1.0..=5.0),
        }
    }

    /// Builds the filter for this method.
    ///
    /// `sensitivity` falls back to the method default. Returns `Ok(None)` for
    /// [`FilterMethod::None`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_analysis::filter::{FilterMethod, OutlierFilter};
    /// assert_eq!(
    ///     FilterMethod::Iqr.configure(None),
    ///     Ok(Some(OutlierFilter::Iqr { multiplier: 1.5 }))
    /// );
    /// assert_eq!(FilterMethod::None.configure(Some(2.0)), Ok(None));
    /// assert!(FilterMethod::ZScore.configure(Some(7.0)).is_err());
    /// ```
    pub fn configure(self, sensitivity: Option<f64>) -> Result<Option<OutlierFilter>, FilterError> {
        let Some(value) = sensitivity.or(self.default_sensitivity()) else {
            return Ok(None);
        };
        let filter = match self {
            Self::None => return Ok(None),
            Self::Iqr => OutlierFilter::Iqr { multiplier: value },
            Self::StdDev => OutlierFilter::StdDev { multiplier: value },
            Self::ZScore => OutlierFilter::ZScore { threshold: value },
        };
        filter.validate()?;
        Ok(Some(filter))
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMethod {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilterError::UnknownMethod { name: s.to_owned() })
    }
}

impl OutlierFilter {
    #[must_use]
    pub const fn method(self) -> FilterMethod {
        match self {
            Self::Iqr { .. } => FilterMethod::Iqr,
            Self::StdDev { .. } => FilterMethod::StdDev,
            Self::ZScore { .. } => FilterMethod::ZScore,
        }
    }

    #[must_use]
    pub const fn sensitivity(self) -> f64 {
        match self {
            Self::Iqr { multiplier } | Self::StdDev { multiplier } => multiplier,
            Self::ZScore { threshold } => threshold,
        }
    }

    /// Checks the sensitivity against the range the method accepts.
    pub fn validate(self) -> Result<(), FilterError> {
        let method = self.method();
        let value = self.sensitivity();
        match method.sensitivity_range() {
            Some(range) if !range.contains(&value) => Err(FilterError::SensitivityOutOfRange {
                method,
                value,
                min: *range.start(),
                max: *range.end(),
            }),
            _ => Ok(()),
        }
    }

    /// Computes the acceptance rule for a column.
    ///
    /// Returns `None` when the column gives no usable rule: it has no observed
    /// values, or its standard deviation is zero or undefined for the σ-based rules.
    #[must_use]
    pub fn criterion(self, values: &[f64]) -> Option<Criterion> {
        match self {
            Self::Iqr { multiplier } => {
                let mut sorted = values
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .collect::<Vec<_>>();
                if sorted.is_empty() {
                    return None;
                }
                sorted.sort_by(f64::total_cmp);
                let q1 = percentiles::compute_percentile(&sorted, 25.0);
                let q3 = percentiles::compute_percentile(&sorted, 75.0);
                let iqr = q3 - q1;
                Some(Criterion::Range {
                    lower: q1 - multiplier * iqr,
                    upper: q3 + multiplier * iqr,
                })
            }
            Self::StdDev { multiplier } => {
                let (mean, std_dev) = spread(values)?;
                Some(Criterion::Range {
                    lower: mean - multiplier * std_dev,
                    upper: mean + multiplier * std_dev,
                })
            }
            Self::ZScore { threshold } => {
                let (mean, std_dev) = spread(values)?;
                Some(Criterion::ZScore {
                    mean,
                    std_dev,
                    threshold,
                })
            }
        }
    }

    /// Applies the filter to one parameter column of a table.
    ///
    /// Never fails: an absent column or a degenerate column leaves the data
    /// unfiltered.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_analysis::{filter::OutlierFilter, parameter::Parameter, table::SensorTable};
    /// let csv = "\
    /// Name,TimeStamp,battery
    /// a,2024-03-01 10:00:00,3.0
    /// a,2024-03-01 10:03:00,3.1
    /// a,2024-03-01 10:06:00,3.0
    /// a,2024-03-01 10:09:00,3.1
    /// a,2024-03-01 10:12:00,9.9
    /// ";
    /// let table = SensorTable::from_reader(csv.as_bytes()).unwrap();
    /// let outcome = OutlierFilter::Iqr { multiplier: 1.5 }.apply(&table, Parameter::Battery);
    /// assert_eq!(outcome.nulled, 1);
    /// assert!(outcome.table.parameter(Parameter::Battery).unwrap()[4].is_nan());
    /// assert_eq!(table.parameter(Parameter::Battery).unwrap()[4], 9.9);
    /// ```
    #[must_use]
    pub fn apply(self, table: &SensorTable, parameter: Parameter) -> FilterOutcome {
        let unchanged = |criterion| FilterOutcome {
            table: table.clone(),
            criterion,
            nulled: 0,
        };

        let Some(values) = table.parameter(parameter) else {
            log::warn!("cannot filter '{parameter}': column not present, leaving data unfiltered");
            return unchanged(None);
        };
        let Some(criterion) = self.criterion(values) else {
            log::debug!(
                "{} filter on '{parameter}' has no usable boundary, leaving data unfiltered",
                self.method()
            );
            return unchanged(None);
        };

        let mut nulled = 0;
        let filtered = values
            .iter()
            .map(|&value| {
                if value.is_nan() || criterion.accepts(value) {
                    value
                } else {
                    nulled += 1;
                    f64::NAN
                }
            })
            .collect();
        log::info!(
            "{} filter on '{parameter}' nulled {nulled} of {} values",
            self.method(),
            values.len()
        );

        FilterOutcome {
            table: table.with_parameter_values(parameter, filtered),
            criterion: Some(criterion),
            nulled,
        }
    }
}

impl Criterion {
    #[must_use]
    pub fn accepts(self, value: f64) -> bool {
        match self {
            Self::Range { lower, upper } => value >= lower && value <= upper,
            Self::ZScore {
                mean,
                std_dev,
                threshold,
            } => ((value - mean) / std_dev).abs() < threshold,
        }
    }
}

/// Mean and sample standard deviation, or `None` if the deviation is zero or undefined.
fn spread(values: &[f64]) -> Option<(f64, f64)> {
    let (mean, std_dev) = descriptive::mean_std(values);
    (std_dev.is_finite() && std_dev > 0.0).then_some((mean, std_dev))
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_distr::Normal;
    use rand_pcg::Pcg32;

    use super::*;

    fn table_with(parameter: Parameter, values: &[f64]) -> SensorTable {
        let mut csv = format!("Name,TimeStamp,{parameter},humidity\n");
        for (i, value) in values.iter().enumerate() {
            let value = if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            };
            csv.push_str(&format!("s{},2024-03-01 10:{:02}:00,{value},50\n", i % 2, i % 60));
        }
        SensorTable::from_reader(csv.as_bytes()).unwrap()
    }

    fn nulled_mask(outcome: &FilterOutcome, parameter: Parameter) -> Vec<bool> {
        outcome
            .table
            .parameter(parameter)
            .unwrap()
            .iter()
            .map(|v| v.is_nan())
            .collect()
    }

    fn all_filters() -> [OutlierFilter; 3] {
        [
            OutlierFilter::Iqr { multiplier: 1.5 },
            OutlierFilter::StdDev { multiplier: 2.5 },
            OutlierFilter::ZScore { threshold: 3.0 },
        ]
    }

    #[test]
    fn test_iqr_boundaries_are_inclusive() {
        // Q1 = 20, Q3 = 40, IQR = 20 -> accepted interval [-10, 70]
        let values = [-10.0, 20.0, 20.0, 20.0, 30.0, 40.0, 40.0, 40.0, 70.0];
        let table = table_with(Parameter::Temperature, &values);
        let filter = OutlierFilter::Iqr { multiplier: 1.5 };
        assert_eq!(
            filter.criterion(&values),
            Some(Criterion::Range {
                lower: -10.0,
                upper: 70.0
            })
        );
        let outcome = filter.apply(&table, Parameter::Temperature);
        assert_eq!(outcome.nulled, 0);

        let values = [-10.5, 20.0, 20.0, 20.0, 30.0, 40.0, 40.0, 40.0, 70.5];
        let table = table_with(Parameter::Temperature, &values);
        let outcome = filter.apply(&table, Parameter::Temperature);
        assert_eq!(outcome.nulled, 2);
        let mask = nulled_mask(&outcome, Parameter::Temperature);
        assert_eq!(
            mask,
            vec![true, false, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn test_shape_and_other_columns_untouched() {
        let values = [1.0, 2.0, 1.5, 2.5, 1.0, 50.0, 2.0, f64::NAN, 1.5, 2.0];
        let table = table_with(Parameter::Light, &values);
        for filter in all_filters() {
            let outcome = filter.apply(&table, Parameter::Light);
            let filtered = &outcome.table;
            assert_eq!(filtered.len(), table.len());
            assert_eq!(filtered.names(), table.names());
            assert_eq!(filtered.timestamps(), table.timestamps());
            assert_eq!(
                filtered.parameters().collect::<Vec<_>>(),
                table.parameters().collect::<Vec<_>>()
            );
            assert_eq!(
                filtered.parameter(Parameter::Humidity),
                table.parameter(Parameter::Humidity)
            );
            // Every value is either unchanged or replaced by the missing marker.
            let before = table.parameter(Parameter::Light).unwrap();
            let after = filtered.parameter(Parameter::Light).unwrap();
            for (b, a) in before.iter().zip(after) {
                assert!(a.is_nan() || a.to_bits() == b.to_bits());
            }
        }
    }

    #[test]
    fn test_zero_variance_filters_nothing() {
        let values = [21.0; 8];
        let table = table_with(Parameter::Temperature, &values);
        for filter in all_filters() {
            let outcome = filter.apply(&table, Parameter::Temperature);
            assert_eq!(outcome.nulled, 0, "{filter:?}");
            assert!(
                outcome
                    .table
                    .parameter(Parameter::Temperature)
                    .unwrap()
                    .iter()
                    .all(|v| *v == 21.0)
            );
        }
        assert!(OutlierFilter::StdDev { multiplier: 2.5 }
            .criterion(&values)
            .is_none());
        assert!(OutlierFilter::ZScore { threshold: 3.0 }
            .criterion(&values)
            .is_none());
    }

    #[test]
    fn test_single_observation_filters_nothing() {
        let values = [f64::NAN, 4.2, f64::NAN];
        let table = table_with(Parameter::Battery, &values);
        for filter in all_filters() {
            assert_eq!(filter.apply(&table, Parameter::Battery).nulled, 0);
        }
    }

    #[test]
    fn test_missing_column_leaves_table_unchanged() {
        let table = table_with(Parameter::Light, &[1.0, 2.0, 3.0]);
        for filter in all_filters() {
            let outcome = filter.apply(&table, Parameter::Battery);
            assert_eq!(outcome.nulled, 0);
            assert!(outcome.criterion.is_none());
            assert_eq!(outcome.table, table);
        }
    }

    #[test]
    fn test_std_dev_and_z_score_agree_on_normal_data() {
        let mut rng = Pcg32::seed_from_u64(0x5eed);
        let normal = Normal::new(22.0, 1.5).unwrap();
        let values = (0..500).map(|_| rng.sample(normal)).collect::<Vec<f64>>();
        let table = table_with(Parameter::Temperature, &values);

        for n in [1.0, 1.5, 2.0, 2.5, 3.0] {
            let std_dev = OutlierFilter::StdDev { multiplier: n }.apply(&table, Parameter::Temperature);
            let z_score = OutlierFilter::ZScore { threshold: n }.apply(&table, Parameter::Temperature);
            assert_eq!(
                nulled_mask(&std_dev, Parameter::Temperature),
                nulled_mask(&z_score, Parameter::Temperature),
                "n = {n}"
            );
        }
    }

    #[test]
    fn test_z_score_threshold_is_strict() {
        let criterion = Criterion::ZScore {
            mean: 0.0,
            std_dev: 1.0,
            threshold: 2.0,
        };
        assert!(criterion.accepts(1.999));
        assert!(!criterion.accepts(2.0));
        assert!(!criterion.accepts(-2.0));
    }

    #[test]
    fn test_configure_validates_sensitivity() {
        assert_eq!(
            FilterMethod::StdDev.configure(None),
            Ok(Some(OutlierFilter::StdDev { multiplier: 2.5 }))
        );
        assert_eq!(
            FilterMethod::ZScore.configure(Some(1.0)),
            Ok(Some(OutlierFilter::ZScore { threshold: 1.0 }))
        );
        let err = FilterMethod::Iqr.configure(Some(0.4)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "iqr sensitivity must be between 0.5 and 3, got 0.4"
        );
        assert!(FilterMethod::StdDev.configure(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Z-Score".parse(), Ok(FilterMethod::ZScore));
        assert_eq!("std-dev".parse(), Ok(FilterMethod::StdDev));
        assert!("median".parse::<FilterMethod>().is_err());
    }
}
