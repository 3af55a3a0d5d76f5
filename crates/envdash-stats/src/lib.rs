//! Statistical utilities for the envdash sensor dashboard.
//!
//! Every function in this crate treats NaN as a missing reading and skips it,
//! the same way dataframe reductions do with `skipna`.
//!
//! - **Descriptive statistics**: count, mean, median, sample variance and standard deviation
//! - **Percentiles**: linearly interpolated quantiles
//! - **Histogram generation**: equal-width frequency distributions
//! - **Correlation**: pairwise-complete Pearson coefficients and matrices
//! - **Comprehensive statistics**: descriptive statistics, percentiles, and a histogram at once
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing samples
//! - [`percentiles`]: Percentile computation and storage
//! - [`histogram`]: Histogram construction for visualizing distributions
//! - [`correlation`]: Pearson correlation between columns
//! - [`comprehensive`]: Combined statistical summary
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use envdash_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing quartiles
//!
//! ```
//! use envdash_stats::percentiles::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(25.0), Some(2.0));
//! assert_eq!(percentiles.get(75.0), Some(4.0));
//! ```
//!
//! ## Correlating columns
//!
//! ```
//! use envdash_stats::correlation::pearson;
//!
//! let temperature = [20.0, 21.0, 22.0, 23.0];
//! let humidity = [60.0, 58.0, 56.0, 54.0];
//! assert!((pearson(&temperature, &humidity) + 1.0).abs() < 1e-12);
//! ```

pub mod comprehensive;
pub mod correlation;
pub mod descriptive;
pub mod histogram;
pub mod percentiles;
