//! Box-Cox power transformation.

/// Lambdas closer to zero than this are treated as the log transform.
pub(crate) const LOG_LAMBDA_EPS: f64 = 1e-10;

/// Box-Cox transform of a single value.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Non-positive inputs give NaN.
pub fn boxcox_value(x: f64, lambda: f64) -> f64 {
    if x <= 0.0 {
        f64::NAN
    } else if lambda.abs() < LOG_LAMBDA_EPS {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

/// Inverse Box-Cox transform of a single value.
///
/// Values below the transform's range map to 0, the limit of the inverse at
/// the boundary, so quantiles stay monotone.
pub fn inv_boxcox_value(y: f64, lambda: f64) -> f64 {
    if lambda.abs() < LOG_LAMBDA_EPS {
        return y.exp();
    }
    let base = lambda * y + 1.0;
    if base <= 0.0 {
        0.0
    } else {
        base.powf(1.0 / lambda)
    }
}

/// Apply Box-Cox transformation with a given lambda.
pub fn boxcox(series: &[f64], lambda: f64) -> Vec<f64> {
    series.iter().map(|&x| boxcox_value(x, lambda)).collect()
}

/// Inverse Box-Cox transformation.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| inv_boxcox_value(y, lambda))
        .collect()
}

/// Find the Box-Cox lambda maximising the normal profile log-likelihood.
///
/// Grid search over [-1, 2] followed by a finer pass around the best value.
pub fn boxcox_lambda(series: &[f64]) -> f64 {
    let positive: Vec<f64> = series.iter().copied().filter(|&x| x > 0.0).collect();
    if positive.len() < 2 {
        return 1.0;
    }

    let search = |lambdas: &mut dyn Iterator<Item = f64>, best: (f64, f64)| {
        lambdas.fold(best, |(best_lambda, best_llf), lambda| {
            let llf = profile_log_likelihood(&positive, lambda);
            if llf > best_llf {
                (lambda, llf)
            } else {
                (best_lambda, best_llf)
            }
        })
    };

    let coarse = search(
        &mut (-100..=200).map(|i| i as f64 / 100.0),
        (1.0, f64::NEG_INFINITY),
    );
    let (lo, hi) = ((coarse.0 - 0.01).max(-1.0), (coarse.0 + 0.01).min(2.0));
    let fine = search(
        &mut (0..=40).map(|i| lo + (hi - lo) * i as f64 / 40.0),
        coarse,
    );
    fine.0
}

fn profile_log_likelihood(series: &[f64], lambda: f64) -> f64 {
    let n = series.len() as f64;
    let transformed = boxcox(series, lambda);
    if transformed.iter().any(|x| !x.is_finite()) {
        return f64::NEG_INFINITY;
    }
    let mean = transformed.iter().sum::<f64>() / n;
    let variance = transformed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    -0.5 * n * variance.ln() + (lambda - 1.0) * log_sum
}

/// Check if data is suitable for Box-Cox transformation.
pub fn is_boxcox_suitable(series: &[f64]) -> bool {
    !series.is_empty() && series.iter().all(|&x| x > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn boxcox_lambda_one_shifts_by_one() {
        let series = vec![1.0, 2.0, 3.0];
        let result = boxcox(&series, 1.0);
        assert_eq!(result, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn boxcox_lambda_zero_is_log() {
        for x in [0.5, 1.0, 10.0] {
            assert_relative_eq!(boxcox_value(x, 0.0), x.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn boxcox_round_trip() {
        let series = vec![3.2, 10.0, 150.5, 0.4];
        for lambda in [-0.5, 0.0, 0.3, 1.0, 1.5] {
            let back = inv_boxcox(&boxcox(&series, lambda), lambda);
            for (a, b) in series.iter().zip(&back) {
                assert_relative_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn boxcox_non_positive_is_nan() {
        assert!(boxcox_value(0.0, 0.3).is_nan());
        assert!(boxcox_value(-1.0, 0.0).is_nan());
    }

    #[test]
    fn inverse_below_range_clamps_to_zero() {
        // 0.3 * -5 + 1 < 0
        assert_eq!(inv_boxcox_value(-5.0, 0.3), 0.0);
    }

    #[test]
    fn boxcox_lambda_beats_grid_endpoints() {
        let series: Vec<f64> = (0..200)
            .map(|i| (1.0 + 0.8 * ((i as f64) * 0.37).sin()).exp())
            .collect();
        let lambda = boxcox_lambda(&series);
        assert!((-1.0..=2.0).contains(&lambda));

        let best = profile_log_likelihood(&series, lambda);
        assert!(best >= profile_log_likelihood(&series, 0.0));
        assert!(best >= profile_log_likelihood(&series, 1.0));
    }

    #[test]
    fn boxcox_suitability() {
        assert!(is_boxcox_suitable(&[1.0, 2.0]));
        assert!(!is_boxcox_suitable(&[1.0, 0.0]));
        assert!(!is_boxcox_suitable(&[]));
    }
}
