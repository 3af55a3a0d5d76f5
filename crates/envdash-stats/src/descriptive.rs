/// Descriptive statistics summarizing a sample.
///
/// Missing values (NaN) are skipped before anything is computed, so `count`
/// is the number of observed values rather than the length of the input.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// The number of non-missing values.
    pub count: usize,
    /// The minimum value in the sample.
    pub min: f64,
    /// The maximum value in the sample.
    pub max: f64,
    /// The arithmetic mean (average) of the sample.
    pub mean: f64,
    /// The median of the sample (mean of the two middle values for even counts).
    pub median: f64,
    /// The sample variance (`n - 1` denominator). NaN when `count < 2`.
    pub variance: f64,
    /// The sample standard deviation. NaN when `count < 2`.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// NaN values are dropped and the rest are sorted internally.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the sample contains at least one non-missing value
    /// * `None` - if the sample is empty or entirely missing
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, f64::NAN, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.variance, 2.5);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted, NaN-free values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order or contains NaN.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order and free of NaN"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let mid = count / 2;
        let median = if count % 2 == 1 {
            sorted_values[mid]
        } else {
            f64::midpoint(sorted_values[mid - 1], sorted_values[mid])
        };
        let variance = if count < 2 {
            f64::NAN
        } else {
            sorted_values
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0)
        };
        let std_dev = variance.sqrt();

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
        })
    }
}

/// Mean and sample standard deviation of the non-missing values.
///
/// Returns `(NaN, NaN)` for an entirely missing sample and a NaN standard
/// deviation for a single observation, matching the usual `skipna` reductions.
///
/// # Examples
///
/// ```
/// # use envdash_stats::descriptive::mean_std;
/// let (mean, std) = mean_std(&[2.0, 4.0, f64::NAN]);
/// assert_eq!(mean, 3.0);
/// assert!((std - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let observed = values.iter().copied().filter(|v| !v.is_nan());
    let (count, sum) = observed
        .clone()
        .fold((0_usize, 0.0), |(c, s), v| (c + 1, s + v));
    if count == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = sum / count as f64;
    if count < 2 {
        return (mean, f64::NAN);
    }
    let variance = observed.map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
    (mean, variance.sqrt())
}
