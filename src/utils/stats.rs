//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use tidy_forecast::utils::quantile_normal;
///
/// // 95% interval -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.959964).abs() < 1e-4);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    match Normal::new(0.0, 1.0) {
        Ok(standard) => standard.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (n denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sum of squares of the finite entries, and how many there were.
pub fn finite_sum_sq(values: &[f64]) -> (f64, usize) {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0), |(sum, n), v| (sum + v * v, n + 1))
}
