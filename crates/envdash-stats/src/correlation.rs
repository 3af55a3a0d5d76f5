//! Pearson correlation over columns with missing values.
//!
//! Each pair of columns is correlated over the rows where *both* values are
//! present (pairwise-complete observations), so a missing reading in one column
//! never removes data from unrelated pairs.

/// Pearson correlation coefficient of two equally long columns.
///
/// Rows where either side is NaN are skipped. Returns NaN when no pair remains
/// or either side has zero variance over the remaining pairs.
///
/// The running means and co-moments are accumulated with Welford's update,
/// which stays accurate for large offsets such as barometric pressure.
///
/// # Examples
///
/// ```
/// # use envdash_stats::correlation::pearson;
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.0, 6.0, f64::NAN];
/// assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
/// assert!(pearson(&x, &[5.0; 4]).is_nan());
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "columns must have the same length");

    let mut nobs = 0_usize;
    let (mut mean_x, mut mean_y) = (0.0, 0.0);
    let (mut ssqd_x, mut ssqd_y, mut cov_xy) = (0.0, 0.0, 0.0);
    for (&vx, &vy) in x.iter().zip(y) {
        if vx.is_nan() || vy.is_nan() {
            continue;
        }
        nobs += 1;
        let dx = vx - mean_x;
        let dy = vy - mean_y;
        mean_x += dx / nobs as f64;
        mean_y += dy / nobs as f64;
        ssqd_x += (vx - mean_x) * dx;
        ssqd_y += (vy - mean_y) * dy;
        cov_xy += (vx - mean_x) * dy;
    }

    if nobs == 0 {
        return f64::NAN;
    }
    let divisor = (ssqd_x * ssqd_y).sqrt();
    if divisor == 0.0 {
        return f64::NAN;
    }
    cov_xy / divisor
}

/// Symmetric matrix of pairwise Pearson correlations between named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    /// Column names, used for both rows and columns.
    pub names: Vec<String>,
    /// Row-major coefficients; `values[i][j]` correlates `names[i]` with `names[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlates every pair of the given columns.
    ///
    /// # Examples
    ///
    /// ```
    /// # use envdash_stats::correlation::CorrelationMatrix;
    /// let a = [1.0, 2.0, 3.0];
    /// let b = [3.0, 2.0, 1.0];
    /// let matrix = CorrelationMatrix::from_columns([("a", &a[..]), ("b", &b[..])]);
    /// assert_eq!(matrix.get(0, 0), 1.0);
    /// assert!((matrix.get(0, 1) + 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_columns<'a, I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, &'a [f64])>,
        S: Into<String>,
    {
        let (names, columns): (Vec<String>, Vec<&[f64]>) = columns
            .into_iter()
            .map(|(name, column)| (name.into(), column))
            .unzip();

        let k = columns.len();
        let mut values = vec![vec![f64::NAN; k]; k];
        for i in 0..k {
            for j in 0..=i {
                let r = pearson(columns[i], columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self { names, values }
    }

    /// Coefficient at row `i`, column `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Number of columns correlated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
