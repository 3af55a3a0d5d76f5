use crate::{descriptive::DescriptiveStats, histogram::Histogram, percentiles::Percentiles};

/// Comprehensive statistical summary of one sample.
///
/// This structure combines:
/// - Basic descriptive statistics (count, mean, median, standard deviation, etc.)
/// - Percentile values for quantile analysis
/// - A histogram of the distribution
///
/// # Examples
///
/// ```
/// use envdash_stats::comprehensive::ComprehensiveStats;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let stats = ComprehensiveStats::new(values, &[25.0, 50.0, 75.0], 5).unwrap();
///
/// assert_eq!(stats.stats.mean, 5.5);
/// assert_eq!(stats.percentiles.get(50.0), Some(5.5));
/// assert_eq!(stats.histogram.total(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct ComprehensiveStats {
    /// Basic descriptive statistics for the sample.
    pub stats: DescriptiveStats,
    /// Precomputed percentile values for quick lookup.
    pub percentiles: Percentiles,
    /// Histogram showing the distribution of values across bins.
    pub histogram: Histogram,
}

impl ComprehensiveStats {
    /// Computes comprehensive statistics from unsorted values.
    ///
    /// Missing values (NaN) are skipped.
    ///
    /// # Returns
    ///
    /// * `Some(ComprehensiveStats)` - if the sample contains at least one non-missing value
    /// * `None` - if the sample is empty or entirely missing
    #[must_use]
    pub fn new<I>(values: I, percentile_points: &[f64], hist_num_bins: usize) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);

        let stats = DescriptiveStats::from_sorted(&sorted)?;
        let percentiles = Percentiles::from_sorted(&sorted, percentile_points);
        let histogram = Histogram::new(sorted.iter().copied(), hist_num_bins);

        Some(Self {
            stats,
            percentiles,
            histogram,
        })
    }
}
