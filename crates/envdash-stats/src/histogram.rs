use std::ops::Range;

/// An equal-width histogram of a sample.
///
/// The value range is split into `num_bins` bins of identical width. Every bin
/// is half-open except the last one, which also contains the upper bound, so
/// the maximum of the sample is always counted.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The bins comprising the histogram, in ascending order.
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end,
    /// except for the last bin which is inclusive on both sides).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram from values, spanning their own minimum and maximum.
    ///
    /// Missing values (NaN) are ignored. An empty sample produces no bins.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_stats::histogram::Histogram;
    /// let values = [1.0, 2.0, 2.5, 4.0, 5.0];
    /// let histogram = Histogram::new(values, 4);
    /// let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
    /// assert_eq!(counts, vec![1, 2, 0, 2]);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        let Some(range) = value_range(values.iter().copied()) else {
            return Self { bins: vec![] };
        };
        Self::with_range(values, num_bins, range)
    }

    /// Creates a histogram over an explicit value range.
    ///
    /// Several series plotted together share one range so that their bins line up.
    /// Values outside the range are not counted. A degenerate range (`start == end`)
    /// is widened by 0.5 on each side.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_stats::histogram::Histogram;
    /// let histogram = Histogram::with_range([3.0, 3.0, 3.0], 2, 3.0..3.0);
    /// assert_eq!(histogram.bins[0].range, 2.5..3.0);
    /// assert_eq!(histogram.bins[1].count, 3);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn with_range<I>(values: I, num_bins: usize, range: Range<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if num_bins == 0 || range.start.is_nan() || range.end.is_nan() {
            return Self { bins: vec![] };
        }

        let (start, end) = if range.end - range.start < f64::EPSILON {
            (range.start - 0.5, range.end + 0.5)
        } else {
            (range.start, range.end)
        };
        let width = (end - start) / num_bins as f64;

        let mut bins = (0..num_bins)
            .map(|idx| {
                // Recompute boundaries from the origin to avoid accumulating rounding error
                let bin_start = start + idx as f64 * width;
                let bin_end = if idx == num_bins - 1 {
                    end
                } else {
                    start + (idx + 1) as f64 * width
                };
                HistogramBin {
                    range: bin_start..bin_end,
                    count: 0,
                }
            })
            .collect::<Vec<_>>();

        for value in values {
            if value.is_nan() || value < start || value > end {
                continue;
            }
            let idx = (((value - start) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Total number of counted values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Minimum and maximum of the non-missing values, or `None` if there are none.
///
/// # Examples
///
/// ```
/// # use envdash_stats::histogram::value_range;
/// assert_eq!(value_range([3.0, f64::NAN, -1.0, 2.0]), Some(-1.0..3.0));
/// assert_eq!(value_range([f64::NAN]), None);
/// ```
#[must_use]
pub fn value_range<I>(values: I) -> Option<Range<f64>>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<Range<f64>>, v| match acc {
            None => Some(v..v),
            Some(r) => Some(r.start.min(v)..r.end.max(v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        let histogram = Histogram::new(Vec::<f64>::new(), 10);
        assert!(histogram.bins.is_empty());
        let histogram = Histogram::new([f64::NAN, f64::NAN], 10);
        assert!(histogram.bins.is_empty());
    }

    #[test]
    fn test_zero_bins() {
        let histogram = Histogram::new([1.0, 2.0], 0);
        assert!(histogram.bins.is_empty());
    }

    #[test]
    fn test_max_is_counted_in_last_bin() {
        let histogram = Histogram::new([0.0, 10.0], 5);
        assert_eq!(histogram.bins.len(), 5);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[4].count, 1);
        assert_eq!(histogram.bins[4].range.end, 10.0);
    }

    #[test]
    fn test_bins_are_contiguous() {
        let histogram = Histogram::new([0.3, 1.7, 2.2, 9.9, 4.4], 7);
        for pair in histogram.bins.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
        assert_eq!(histogram.total(), 5);
    }

    #[test]
    fn test_shared_range_skips_out_of_range_values() {
        let histogram = Histogram::with_range([-1.0, 0.5, 1.5, 3.0], 2, 0.0..2.0);
        let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
        assert_eq!(counts, vec![1, 1]);
    }
}
