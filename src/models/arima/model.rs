//! Seasonal ARIMA (Autoregressive Integrated Moving Average) model.
//!
//! `ARIMA(p,d,q)(P,D,Q)[m]` with an optional constant, estimated by
//! conditional sum of squares. Forecasts run the recursion on the
//! undifferenced scale; standard errors come from the psi-weights.

use std::fmt;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{
    difference, differencing_polynomial, poly_mul, seasonal_difference,
};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean;

/// Largest admissible partial autocorrelation in absolute value.
const MAX_PACF: f64 = 0.999;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing order (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Seasonal period (m)
    pub period: usize,
    /// Include a mean (no differencing) or drift (one difference).
    pub constant: bool,
}

impl ARIMASpec {
    /// Non-seasonal ARIMA(p, d, q) without constant.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 1,
            constant: false,
        }
    }

    /// Seasonal ARIMA(p, d, q)(P, D, Q)\[m\] without constant.
    pub fn seasonal(
        (p, d, q): (usize, usize, usize),
        (seasonal_p, seasonal_d, seasonal_q): (usize, usize, usize),
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period: period.max(1),
            constant: false,
        }
    }

    /// Set whether a constant is included.
    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }

    /// Whether any seasonal term is present.
    pub fn is_seasonal(&self) -> bool {
        self.period > 1 && self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }

    /// Total differencing order `d + D`.
    pub fn total_differencing(&self) -> usize {
        self.d + self.seasonal_d
    }

    /// Number of estimated coefficients, excluding the innovation variance.
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q + usize::from(self.constant)
    }

    /// Observations lost to differencing.
    fn differencing_loss(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Lags needed before the first conditional residual.
    fn conditioning_lags(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Name such as `ARIMA(1,0,1)(0,1,1)[12] w/ drift`.
    pub fn short_name(&self) -> String {
        let mut name = format!("ARIMA({},{},{})", self.p, self.d, self.q);
        if self.is_seasonal() {
            name.push_str(&format!(
                "({},{},{})[{}]",
                self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
            ));
        }
        if self.constant {
            match self.total_differencing() {
                0 => name.push_str(" w/ mean"),
                1 => name.push_str(" w/ drift"),
                _ => {}
            }
        }
        name
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Coefficients in the order AR, MA, seasonal AR, seasonal MA, constant.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
    mean: f64,
}

impl Coefficients {
    fn from_params(spec: &ARIMASpec, params: &[f64]) -> Self {
        let (ar, rest) = params.split_at(spec.p);
        let (ma, rest) = rest.split_at(spec.q);
        let (sar, rest) = rest.split_at(spec.seasonal_p);
        let (sma, rest) = rest.split_at(spec.seasonal_q);
        Self {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sar: sar.to_vec(),
            sma: sma.to_vec(),
            mean: if spec.constant {
                rest.first().copied().unwrap_or(0.0)
            } else {
                0.0
            },
        }
    }

    /// Stationary AR part and invertible MA part.
    fn is_admissible(&self) -> bool {
        let negated = |c: &[f64]| c.iter().map(|x| -x).collect::<Vec<_>>();
        is_stationary(&self.ar)
            && is_stationary(&self.sar)
            && is_stationary(&negated(&self.ma))
            && is_stationary(&negated(&self.sma))
    }

    /// Expanded AR coefficients of `φ(B)Φ(B^m)` as lag weights `a_1..`.
    fn full_ar(&self, period: usize) -> Vec<f64> {
        let poly = poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.sar, period, -1.0),
        );
        poly.iter().skip(1).map(|c| -c).collect()
    }

    /// Expanded MA coefficients of `θ(B)Θ(B^m)` as lag weights `b_1..`.
    fn full_ma(&self, period: usize) -> Vec<f64> {
        let poly = poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.sma, period, 1.0),
        );
        poly.into_iter().skip(1).collect()
    }
}

/// `1 + sign * Σ c_i B^(i * step)` as dense coefficients.
fn lag_polynomial(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Stationarity of `1 - Σ φ_i B^i`, checked by stepping the Durbin-Levinson
/// recursion down to the partial autocorrelations.
pub(crate) fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&kk) = a.last() {
        if !kk.is_finite() || kk.abs() >= MAX_PACF {
            return false;
        }
        let k = a.len() - 1;
        let denom = 1.0 - kk * kk;
        a = (0..k).map(|j| (a[j] + kk * a[k - 1 - j]) / denom).collect();
    }
    true
}

/// Replace missing values by the previous observation; leading gaps take the
/// first observed value.
pub(crate) fn fill_missing(values: &[f64]) -> Option<Vec<f64>> {
    let first = values.iter().copied().find(|v| v.is_finite())?;
    let mut last = first;
    Some(
        values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    last = v;
                }
                last
            })
            .collect(),
    )
}

/// Conditional residuals of the differenced series; the first
/// `conditioning_lags` entries are zero.
fn css_residuals(w: &[f64], coefs: &Coefficients, spec: &ARIMASpec) -> Vec<f64> {
    let ar = coefs.full_ar(spec.period);
    let ma = coefs.full_ma(spec.period);
    let start = spec.conditioning_lags();

    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut e = w[t] - coefs.mean;
        for (k, a) in ar.iter().enumerate() {
            e -= a * (w[t - 1 - k] - coefs.mean);
        }
        for (k, b) in ma.iter().enumerate().take(t) {
            e -= b * residuals[t - 1 - k];
        }
        residuals[t] = e;
    }
    residuals
}

/// Seasonal ARIMA forecasting model.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    coefficients: Coefficients,
    /// Observations with gaps filled.
    history: Option<Vec<f64>>,
    /// Residuals aligned with the observations, NaN before conditioning.
    residuals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    n_eff: usize,
}

impl ARIMA {
    /// Create a non-seasonal ARIMA(p, d, q) model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_spec(ARIMASpec::new(p, d, q))
    }

    /// Create a model from a full specification.
    pub fn with_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            coefficients: Coefficients::default(),
            history: None,
            residuals: None,
            fitted: None,
            sigma2: None,
            log_likelihood: None,
            n_eff: 0,
        }
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.sar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.sma
    }

    /// Mean of the differenced series (zero without a constant).
    pub fn constant(&self) -> f64 {
        self.coefficients.mean
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    fn num_params(&self) -> f64 {
        (self.spec.num_coefficients() + 1) as f64
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.log_likelihood.map(|ll| -2.0 * ll + 2.0 * self.num_params())
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.log_likelihood
            .map(|ll| -2.0 * ll + self.num_params() * (self.n_eff as f64).ln())
    }

    /// Corrected AIC; infinite when there are too few observations.
    pub fn aicc(&self) -> Option<f64> {
        let aic = self.aic()?;
        let k = self.num_params();
        let n = self.n_eff as f64;
        Some(if n - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        } else {
            f64::INFINITY
        })
    }

    fn differenced(&self, values: &[f64]) -> Vec<f64> {
        let seasonal = seasonal_difference(values, self.spec.seasonal_d, self.spec.period);
        difference(&seasonal, self.spec.d)
    }

    /// Estimate coefficients by minimising the conditional sum of squares.
    fn estimate(&self, w: &[f64]) -> Coefficients {
        let spec = self.spec;
        let dims = spec.num_coefficients();
        if dims == 0 {
            return Coefficients::default();
        }
        let mut initial = vec![0.0; dims];
        if spec.constant {
            initial[dims - 1] = mean(w);
        }

        let objective = |params: &[f64]| {
            let coefs = Coefficients::from_params(&spec, params);
            if !coefs.is_admissible() {
                return f64::INFINITY;
            }
            css_residuals(w, &coefs, &spec).iter().map(|e| e * e).sum()
        };
        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-10,
            initial_step: 0.1,
            ..Default::default()
        };
        let result = nelder_mead(objective, &initial, None, config);
        Coefficients::from_params(&spec, &result.optimal_point)
    }

    fn require_fit(&self) -> Result<(&[f64], &[f64], f64)> {
        match (&self.history, &self.residuals, self.sigma2) {
            (Some(h), Some(r), Some(s)) => Ok((h, r, s)),
            _ => Err(ForecastError::FitRequired),
        }
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::with_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let spec = self.spec;
        if spec.constant && spec.total_differencing() > 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} cannot include a constant with {} differences",
                spec.short_name(),
                spec.total_differencing()
            )));
        }

        let values = fill_missing(series.values()).ok_or(ForecastError::EmptyData)?;
        let needed =
            spec.differencing_loss() + spec.conditioning_lags() + spec.num_coefficients() + 2;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = self.differenced(&values);
        let coefficients = self.estimate(&w);
        if !coefficients.is_admissible() {
            return Err(ForecastError::ComputationError(format!(
                "{} estimation left the admissible region",
                spec.short_name()
            )));
        }

        let start = spec.conditioning_lags();
        let conditional = css_residuals(&w, &coefficients, &spec);
        let n_eff = w.len() - start;
        let css: f64 = conditional[start..].iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff as f64;
        if !sigma2.is_finite() || sigma2 <= 0.0 {
            return Err(ForecastError::ComputationError(format!(
                "{} has degenerate residual variance",
                spec.short_name()
            )));
        }

        let offset = spec.differencing_loss();
        let mut residuals = vec![f64::NAN; values.len()];
        for (t, e) in conditional.iter().enumerate().skip(start) {
            residuals[offset + t] = *e;
        }
        let fitted = series
            .values()
            .iter()
            .zip(&residuals)
            .map(|(y, e)| y - e)
            .collect();

        self.log_likelihood = Some(
            -0.5 * n_eff as f64 * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0),
        );
        self.coefficients = coefficients;
        self.history = Some(values);
        self.residuals = Some(residuals);
        self.fitted = Some(fitted);
        self.sigma2 = Some(sigma2);
        self.n_eff = n_eff;
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let (history, residuals, sigma2) = self.require_fit()?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let period = self.spec.period;
        let ar = self.coefficients.full_ar(period);
        let ma = self.coefficients.full_ma(period);

        // Undifferenced AR operator φ(B)Φ(B^m)(1-B)^d(1-B^m)^D.
        let mut stationary = vec![1.0];
        stationary.extend(ar.iter().map(|a| -a));
        let delta = differencing_polynomial(self.spec.d, self.spec.seasonal_d, period);
        let full: Vec<f64> = poly_mul(&stationary, &delta)
            .iter()
            .skip(1)
            .map(|c| -c)
            .collect();
        let intercept = self.coefficients.mean * (1.0 - ar.iter().sum::<f64>());

        let n = history.len();
        let mut y = history.to_vec();
        let mut e: Vec<f64> = residuals
            .iter()
            .map(|r| if r.is_finite() { *r } else { 0.0 })
            .collect();
        for t in n..n + horizon {
            let mut value = intercept;
            for (k, g) in full.iter().enumerate() {
                if t > k {
                    value += g * y[t - 1 - k];
                }
            }
            for (k, b) in ma.iter().enumerate() {
                if t > k {
                    value += b * e[t - 1 - k];
                }
            }
            y.push(value);
            e.push(0.0);
        }

        let mut psi = vec![1.0];
        for j in 1..horizon {
            let mut weight = ma.get(j - 1).copied().unwrap_or(0.0);
            for (k, g) in full.iter().enumerate().take(j) {
                weight += g * psi[j - 1 - k];
            }
            psi.push(weight);
        }
        let mut cumulative = 0.0;
        let std_errors = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (sigma2 * cumulative).sqrt()
            })
            .collect();

        Forecast::from_values_with_std_errors(y[n..].to_vec(), std_errors)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    fn aicc(&self) -> Option<f64> {
        ARIMA::aicc(self)
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn spec_name(&self) -> String {
        self.spec.short_name()
    }
}
