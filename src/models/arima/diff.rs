//! Differencing utilities and differencing-order selection for ARIMA models.

use crate::utils::stats::{mean, variance};

/// KPSS 5% critical value for level stationarity.
const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Seasonal strength above which one seasonal difference is taken.
const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Apply differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Coefficients of `(1 - B)^d (1 - B^m)^D`, lowest power first.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal_d {
        let mut factor = vec![0.0; period + 1];
        factor[0] = 1.0;
        factor[period] = -1.0;
        poly = poly_mul(&poly, &factor);
    }
    poly
}

/// Product of two polynomials given by their coefficients.
pub(crate) fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// KPSS statistic for level stationarity, Bartlett kernel with
/// `floor(4 (n/100)^0.25)` lags. Missing values are dropped.
pub fn kpss_statistic(series: &[f64]) -> f64 {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let lags = ((4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize).clamp(1, n / 2);

    let m = mean(&values);
    let residuals: Vec<f64> = values.iter().map(|x| x - m).collect();

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov: f64 = residuals
            .iter()
            .skip(j)
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= 0.0 {
        return 0.0;
    }
    eta / long_run
}

/// Number of first differences needed for KPSS level stationarity at 5%.
pub fn ndiffs(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d {
        let stat = kpss_statistic(&current);
        if !stat.is_finite() || stat <= KPSS_CRITICAL_5PCT {
            break;
        }
        current = difference(&current, 1);
        d += 1;
    }
    d
}

/// Strength of seasonality from a classical decomposition, in `[0, 1]`.
///
/// The trend is a centred moving average over one period; the seasonal
/// component is the mean detrended value per season, centred to zero.
pub fn seasonal_strength(series: &[f64], period: usize) -> f64 {
    let n = series.len();
    if period < 2 || n < 2 * period || series.iter().any(|v| !v.is_finite()) {
        return 0.0;
    }

    let half = period / 2;
    let trend_at = |t: usize| -> f64 {
        if period % 2 == 0 {
            let inner: f64 = series[t + 1 - half..t + half].iter().sum();
            (inner + 0.5 * (series[t - half] + series[t + half])) / period as f64
        } else {
            series[t - half..=t + half].iter().sum::<f64>() / period as f64
        }
    };
    let span = half..n - half;
    let detrended: Vec<(usize, f64)> = span.map(|t| (t, series[t] - trend_at(t))).collect();

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for &(t, x) in &detrended {
        sums[t % period] += x;
        counts[t % period] += 1;
    }
    let raw: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let centre = mean(&raw);

    let (mut remainder, mut seasonal_plus_remainder) = (Vec::new(), Vec::new());
    for &(t, x) in &detrended {
        let s = raw[t % period] - centre;
        remainder.push(x - s);
        seasonal_plus_remainder.push(x);
    }
    let total = variance(&seasonal_plus_remainder);
    if total < 1e-12 {
        return 0.0;
    }
    (1.0 - variance(&remainder) / total).clamp(0.0, 1.0)
}

/// Number of seasonal differences (0 or 1) from the seasonal strength.
pub fn nsdiffs(series: &[f64], period: usize) -> usize {
    usize::from(seasonal_strength(series, period) > SEASONAL_STRENGTH_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal(n: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let noise = ((i * 37 + 11) % 17) as f64 / 17.0 - 0.5;
                50.0 + amplitude * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin() + noise
            })
            .collect()
    }

    #[test]
    fn difference_order_1_and_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&series, 0), series);
        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        let series = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        assert_eq!(seasonal_difference(&series, 1, 4), vec![10.0; 4]);
    }

    #[test]
    fn differencing_polynomial_expands_products() {
        assert_eq!(differencing_polynomial(1, 0, 12), vec![1.0, -1.0]);
        assert_eq!(differencing_polynomial(2, 0, 12), vec![1.0, -2.0, 1.0]);
        // (1 - B)(1 - B^3) = 1 - B - B^3 + B^4
        assert_eq!(
            differencing_polynomial(1, 1, 3),
            vec![1.0, -1.0, 0.0, -1.0, 1.0]
        );
    }

    #[test]
    fn ndiffs_of_stationary_noise_is_zero() {
        let series: Vec<f64> = (0..200)
            .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
            .collect();
        assert_eq!(ndiffs(&series, 2), 0);
    }

    #[test]
    fn ndiffs_of_trend_is_positive() {
        let series: Vec<f64> = (0..120)
            .map(|i| 10.0 + 2.0 * i as f64 + ((i * 7) % 5) as f64)
            .collect();
        assert!(ndiffs(&series, 2) >= 1);
    }

    #[test]
    fn seasonal_strength_separates_patterns() {
        assert!(seasonal_strength(&seasonal(120, 10.0), 12) > 0.9);
        assert!(seasonal_strength(&seasonal(120, 0.0), 12) < 0.64);
        assert_eq!(nsdiffs(&seasonal(120, 10.0), 12), 1);
        assert_eq!(seasonal_strength(&seasonal(10, 10.0), 12), 0.0);
    }
}
