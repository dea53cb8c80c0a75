//! ETS (Error-Trend-Seasonal) state-space forecasting model.
//!
//! Models are written in innovations state-space form with additive or
//! multiplicative errors, no, additive or damped trend, and no, additive or
//! multiplicative seasonality. Parameters are estimated by maximum
//! likelihood with Nelder-Mead.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorType {
    /// Additive errors
    #[default]
    Additive,
    /// Multiplicative errors
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendType {
    /// No trend
    #[default]
    None,
    /// Additive trend
    Additive,
    /// Additive damped trend
    AdditiveDamped,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalType {
    /// No seasonality
    #[default]
    None,
    /// Additive seasonality
    Additive,
    /// Multiplicative seasonality
    Multiplicative,
}

/// ETS model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ETSSpec {
    pub error: ErrorType,
    pub trend: TrendType,
    pub seasonal: SeasonalType,
}

impl ETSSpec {
    /// Create a new ETS specification.
    pub fn new(error: ErrorType, trend: TrendType, seasonal: SeasonalType) -> Self {
        Self {
            error,
            trend,
            seasonal,
        }
    }

    /// ETS(A,N,N) - Simple exponential smoothing with additive errors.
    pub fn ann() -> Self {
        Self::new(ErrorType::Additive, TrendType::None, SeasonalType::None)
    }

    /// ETS(A,Ad,N) - Damped trend with additive errors.
    pub fn aadn() -> Self {
        Self::new(
            ErrorType::Additive,
            TrendType::AdditiveDamped,
            SeasonalType::None,
        )
    }

    /// ETS(A,A,A) - Holt-Winters additive.
    pub fn aaa() -> Self {
        Self::new(
            ErrorType::Additive,
            TrendType::Additive,
            SeasonalType::Additive,
        )
    }

    /// ETS(M,N,N) - Simple exponential smoothing with multiplicative errors.
    pub fn mnn() -> Self {
        Self::new(
            ErrorType::Multiplicative,
            TrendType::None,
            SeasonalType::None,
        )
    }

    /// ETS(M,A,M) - Multiplicative Holt-Winters.
    pub fn mam() -> Self {
        Self::new(
            ErrorType::Multiplicative,
            TrendType::Additive,
            SeasonalType::Multiplicative,
        )
    }

    /// Get a short name for this specification, e.g. `ETS(M,Ad,M)`.
    pub fn short_name(&self) -> String {
        let e = match self.error {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        };
        let t = match self.trend {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
        };
        let s = match self.seasonal {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        format!("ETS({},{},{})", e, t, s)
    }

    /// Check if this model has a trend component.
    pub fn has_trend(&self) -> bool {
        !matches!(self.trend, TrendType::None)
    }

    /// Check if this model has a seasonal component.
    pub fn has_seasonal(&self) -> bool {
        !matches!(self.seasonal, SeasonalType::None)
    }

    /// Check if this model has damping.
    pub fn is_damped(&self) -> bool {
        matches!(self.trend, TrendType::AdditiveDamped)
    }

    /// Whether the model is only defined for strictly positive data.
    pub fn requires_positive(&self) -> bool {
        self.error == ErrorType::Multiplicative || self.seasonal == SeasonalType::Multiplicative
    }

    /// Number of free smoothing parameters.
    fn n_smoothing(&self) -> usize {
        1 + usize::from(self.has_trend())
            + usize::from(self.has_seasonal())
            + usize::from(self.is_damped())
    }
}

/// Smoothing parameters in state-space form.
///
/// `beta` and `gamma` are zero for absent components and `phi` is one
/// unless the trend is damped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

impl SmoothingParams {
    /// Usual admissible region: `0 < beta < alpha`, `0 < gamma < 1 - alpha`.
    fn is_admissible(&self, spec: &ETSSpec) -> bool {
        let unit = |x: f64| x > 0.0 && x < 1.0;
        unit(self.alpha)
            && (!spec.has_trend() || (unit(self.beta) && self.beta < self.alpha))
            && (!spec.has_seasonal() || (unit(self.gamma) && self.gamma < 1.0 - self.alpha))
    }
}

const PARAM_BOUNDS: (f64, f64) = (1e-4, 0.9999);
const PHI_BOUNDS: (f64, f64) = (0.8, 0.98);

#[derive(Debug, Clone, PartialEq)]
struct State {
    level: f64,
    trend: f64,
    /// Seasonal state for time `t` lives at `t % period`.
    seasonals: Vec<f64>,
}

struct Filtered {
    fitted: Vec<f64>,
    state: State,
    sse: f64,
    sum_log_mu: f64,
    count: usize,
}

/// Run the state-space recursions over `values`.
///
/// Missing observations leave the states on their forecast path. Returns
/// `None` when the recursion leaves the model's domain.
fn filter(
    spec: &ETSSpec,
    period: usize,
    params: &SmoothingParams,
    init: &State,
    values: &[f64],
) -> Option<Filtered> {
    let SmoothingParams {
        alpha,
        beta,
        gamma,
        phi,
    } = *params;
    let mut state = init.clone();
    let mut fitted = Vec::with_capacity(values.len());
    let (mut sse, mut sum_log_mu, mut count) = (0.0, 0.0, 0usize);

    for (t, &y) in values.iter().enumerate() {
        let idx = if spec.has_seasonal() { t % period } else { 0 };
        let s = state.seasonals.get(idx).copied().unwrap_or(0.0);
        let base = state.level + phi * state.trend;
        let mu = match spec.seasonal {
            SeasonalType::None => base,
            SeasonalType::Additive => base + s,
            SeasonalType::Multiplicative => base * s,
        };
        if !mu.is_finite() || (spec.error == ErrorType::Multiplicative && mu <= 0.0) {
            return None;
        }
        fitted.push(mu);

        let r = if y.is_finite() {
            let e = match spec.error {
                ErrorType::Additive => y - mu,
                ErrorType::Multiplicative => (y - mu) / mu,
            };
            sse += e * e;
            sum_log_mu += mu.abs().ln();
            count += 1;
            y - mu
        } else {
            0.0
        };

        let trend = if spec.has_trend() { state.trend } else { 0.0 };
        match spec.seasonal {
            SeasonalType::None => {
                state.level = base + alpha * r;
                state.trend = phi * trend + beta * r;
            }
            SeasonalType::Additive => {
                state.level = base + alpha * r;
                state.trend = phi * trend + beta * r;
                state.seasonals[idx] = s + gamma * r;
            }
            SeasonalType::Multiplicative => {
                state.level = base + alpha * r / s;
                state.trend = phi * trend + beta * r / s;
                state.seasonals[idx] = s + gamma * r / base;
            }
        }
        if !spec.has_trend() {
            state.trend = 0.0;
        }
        if !state.level.is_finite() || !state.seasonals.get(idx).map_or(true, |v| v.is_finite()) {
            return None;
        }
    }

    Some(Filtered {
        fitted,
        state,
        sse,
        sum_log_mu,
        count,
    })
}

/// ETS state-space model.
#[derive(Debug, Clone)]
pub struct ETS {
    spec: ETSSpec,
    seasonal_period: usize,
    /// Fixed parameters skip estimation.
    fixed: Option<SmoothingParams>,
    params: Option<SmoothingParams>,
    state: Option<State>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    aicc: Option<f64>,
    bic: Option<f64>,
    n: usize,
}

impl ETS {
    /// Create a new ETS model with the given specification.
    pub fn new(spec: ETSSpec, seasonal_period: usize) -> Self {
        Self {
            spec,
            seasonal_period,
            fixed: None,
            params: None,
            state: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            aicc: None,
            bic: None,
            n: 0,
        }
    }

    /// Create an ETS model with fixed parameters.
    pub fn with_params(
        spec: ETSSpec,
        seasonal_period: usize,
        alpha: f64,
        beta: Option<f64>,
        gamma: Option<f64>,
        phi: Option<f64>,
    ) -> Self {
        let clamp = |x: f64| x.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1);
        let fixed = SmoothingParams {
            alpha: clamp(alpha),
            beta: if spec.has_trend() {
                beta.map_or(0.1, clamp)
            } else {
                0.0
            },
            gamma: if spec.has_seasonal() {
                gamma.map_or(0.1, clamp)
            } else {
                0.0
            },
            phi: if spec.is_damped() {
                phi.map_or(0.98, |p| p.clamp(PHI_BOUNDS.0, PHI_BOUNDS.1))
            } else {
                1.0
            },
        };
        Self {
            fixed: Some(fixed),
            ..Self::new(spec, seasonal_period)
        }
    }

    /// Get the model specification.
    pub fn spec(&self) -> ETSSpec {
        self.spec
    }

    /// Estimated (or fixed) smoothing parameters after fitting.
    pub fn params(&self) -> Option<SmoothingParams> {
        self.params
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }
    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    fn min_length(&self) -> usize {
        if self.spec.has_seasonal() {
            2 * self.seasonal_period
        } else if self.spec.has_trend() {
            3
        } else {
            2
        }
    }

    /// Heuristic initial states from the start of the series.
    ///
    /// Seasonal models use the first two cycles: the trend is the average
    /// change between them and the seasonal indices are the first cycle
    /// around its linear trend, normalised to sum to zero (additive) or
    /// average one (multiplicative).
    fn initial_state(&self, values: &[f64]) -> Result<State> {
        let window = &values[..self.min_length()];
        if window.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "ETS needs observed values at the start of the series".to_string(),
            ));
        }

        if !self.spec.has_seasonal() {
            let trend = if self.spec.has_trend() {
                window[1] - window[0]
            } else {
                0.0
            };
            return Ok(State {
                level: window[0] - trend,
                trend,
                seasonals: vec![],
            });
        }

        let m = self.seasonal_period;
        let mf = m as f64;
        let trend = if self.spec.has_trend() {
            (0..m).map(|i| (window[m + i] - window[i]) / mf).sum::<f64>() / mf
        } else {
            0.0
        };
        let cycle_mean = window[..m].iter().sum::<f64>() / mf;
        let centre = (mf - 1.0) / 2.0;

        let mut seasonals: Vec<f64> = (0..m)
            .map(|i| {
                let smooth = cycle_mean + trend * (i as f64 - centre);
                match self.spec.seasonal {
                    SeasonalType::Multiplicative => window[i] / smooth,
                    _ => window[i] - smooth,
                }
            })
            .collect();
        let seasonal_mean = seasonals.iter().sum::<f64>() / mf;
        for s in seasonals.iter_mut() {
            match self.spec.seasonal {
                SeasonalType::Multiplicative => *s /= seasonal_mean,
                _ => *s -= seasonal_mean,
            }
        }
        if seasonals.iter().any(|s| !s.is_finite()) {
            return Err(ForecastError::ComputationError(
                "could not initialise seasonal states".to_string(),
            ));
        }

        Ok(State {
            level: cycle_mean - trend * (centre + 1.0),
            trend,
            seasonals,
        })
    }

    fn unpack(&self, p: &[f64]) -> SmoothingParams {
        let mut it = p.iter().copied();
        let alpha = it.next().unwrap_or(0.5);
        let beta = if self.spec.has_trend() {
            it.next().unwrap_or(0.0)
        } else {
            0.0
        };
        let gamma = if self.spec.has_seasonal() {
            it.next().unwrap_or(0.0)
        } else {
            0.0
        };
        let phi = if self.spec.is_damped() {
            it.next().unwrap_or(1.0)
        } else {
            1.0
        };
        SmoothingParams {
            alpha,
            beta,
            gamma,
            phi,
        }
    }

    /// Concentrated negative log-likelihood, up to a constant.
    fn objective(&self, params: &SmoothingParams, init: &State, values: &[f64]) -> f64 {
        if !params.is_admissible(&self.spec) {
            return f64::INFINITY;
        }
        match filter(&self.spec, self.seasonal_period, params, init, values) {
            Some(f) if f.count > 0 && f.sse > 0.0 => {
                let n = f.count as f64;
                let mut lik = n * (f.sse / n).ln();
                if self.spec.error == ErrorType::Multiplicative {
                    lik += 2.0 * f.sum_log_mu;
                }
                lik
            }
            _ => f64::INFINITY,
        }
    }

    fn optimize_params(&self, init: &State, values: &[f64]) -> SmoothingParams {
        let mut start = vec![0.3];
        let mut bounds = vec![PARAM_BOUNDS];
        if self.spec.has_trend() {
            start.push(0.05);
            bounds.push(PARAM_BOUNDS);
        }
        if self.spec.has_seasonal() {
            start.push(0.05);
            bounds.push(PARAM_BOUNDS);
        }
        if self.spec.is_damped() {
            start.push(0.95);
            bounds.push(PHI_BOUNDS);
        }

        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-8,
            initial_step: 0.2,
            ..Default::default()
        };
        let result = nelder_mead(
            |p| self.objective(&self.unpack(p), init, values),
            &start,
            Some(&bounds),
            config,
        );
        self.unpack(&result.optimal_point)
    }

    /// Count of estimated parameters: smoothing parameters plus free
    /// initial states.
    fn num_params(&self) -> usize {
        let mut count = self.spec.n_smoothing() + 1;
        if self.spec.has_trend() {
            count += 1;
        }
        if self.spec.has_seasonal() {
            count += self.seasonal_period - 1;
        }
        count
    }

    /// Sum of `phi^1..phi^h`; `h` for an undamped trend.
    fn damped_sum(phi: f64, h: usize) -> f64 {
        if (phi - 1.0).abs() < 1e-10 {
            h as f64
        } else {
            phi * (1.0 - phi.powi(h as i32)) / (1.0 - phi)
        }
    }

    /// Coefficient of the innovation `j` steps back in the h-step error.
    fn psi(&self, params: &SmoothingParams, j: usize) -> f64 {
        let trend = if self.spec.has_trend() {
            params.beta * Self::damped_sum(params.phi, j)
        } else {
            0.0
        };
        let seasonal = if self.spec.has_seasonal() && j % self.seasonal_period == 0 {
            params.gamma
        } else {
            0.0
        };
        params.alpha + trend + seasonal
    }

    /// h-step forecast variance.
    ///
    /// Exact for additive-error models with additive or no seasonality;
    /// multiplicative-error models use the product approximation
    /// `mu_h^2 * ((1 + s2) * prod(1 + psi_j^2 * s2) - 1)`.
    fn forecast_variance(&self, params: &SmoothingParams, sigma2: f64, h: usize, mu: f64) -> f64 {
        match self.spec.error {
            ErrorType::Additive => {
                let sum: f64 = (1..h).map(|j| self.psi(params, j).powi(2)).sum();
                sigma2 * (1.0 + sum)
            }
            ErrorType::Multiplicative => {
                let product: f64 = (1..h)
                    .map(|j| 1.0 + self.psi(params, j).powi(2) * sigma2)
                    .product();
                mu * mu * ((1.0 + sigma2) * product - 1.0)
            }
        }
    }
}

impl Default for ETS {
    fn default() -> Self {
        Self::new(ETSSpec::ann(), 1)
    }
}

impl Forecaster for ETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if self.spec.has_seasonal() && self.seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} needs a seasonal period of at least 2",
                self.spec.short_name()
            )));
        }
        let min_len = self.min_length();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        if self.spec.requires_positive() && values.iter().any(|&v| v.is_finite() && v <= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} requires strictly positive data",
                self.spec.short_name()
            )));
        }

        let init = self.initial_state(values)?;
        let params = match self.fixed {
            Some(params) => params,
            None => self.optimize_params(&init, values),
        };
        let filtered = filter(&self.spec, self.seasonal_period, &params, &init, values)
            .ok_or_else(|| {
                ForecastError::ComputationError(format!(
                    "{} recursion diverged",
                    self.spec.short_name()
                ))
            })?;
        if filtered.count == 0 {
            return Err(ForecastError::EmptyData);
        }

        let n = filtered.count as f64;
        let k = self.num_params() as f64;
        let sigma2 = if filtered.count > self.num_params() {
            filtered.sse / (n - k)
        } else {
            filtered.sse / n
        };
        let mut ll = -0.5 * n * ((2.0 * std::f64::consts::PI * filtered.sse / n).ln() + 1.0);
        if self.spec.error == ErrorType::Multiplicative {
            ll -= filtered.sum_log_mu;
        }
        // Innovation variance is estimated too.
        let k = k + 1.0;
        let aic = -2.0 * ll + 2.0 * k;

        self.residuals = Some(
            values
                .iter()
                .zip(&filtered.fitted)
                .map(|(y, f)| y - f)
                .collect(),
        );
        self.fitted = Some(filtered.fitted);
        self.state = Some(filtered.state);
        self.params = Some(params);
        self.sigma2 = Some(sigma2);
        self.log_likelihood = Some(ll);
        self.aic = Some(aic);
        self.aicc = Some(if n - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        } else {
            f64::INFINITY
        });
        self.bic = Some(-2.0 * ll + k * n.ln());
        self.n = values.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        let params = self.params.ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.unwrap_or(0.0);

        let mut points = Vec::with_capacity(horizon);
        let mut std_errors = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let base = state.level + Self::damped_sum(params.phi, h) * state.trend;
            let mu = match self.spec.seasonal {
                SeasonalType::None => base,
                SeasonalType::Additive => base + state.seasonals[(self.n + h - 1) % self.seasonal_period],
                SeasonalType::Multiplicative => {
                    base * state.seasonals[(self.n + h - 1) % self.seasonal_period]
                }
            };
            points.push(mu);
            std_errors.push(self.forecast_variance(&params, sigma2, h, mu).max(0.0).sqrt());
        }

        Forecast::from_values_with_std_errors(points, std_errors)
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
        self.aicc
    }

    fn name(&self) -> &str {
        "ETS"
    }

    fn spec_name(&self) -> String {
        self.spec.short_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::series_from;
    use approx::assert_relative_eq;

    fn trend_season(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let t = t as f64;
                100.0 + 0.5 * t + 10.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin()
            })
            .collect()
    }

    #[test]
    fn ets_short_names() {
        assert_eq!(ETSSpec::aadn().short_name(), "ETS(A,Ad,N)");
        assert_eq!(ETSSpec::mam().short_name(), "ETS(M,A,M)");
        assert!(ETSSpec::mnn().requires_positive());
        assert!(!ETSSpec::aaa().requires_positive());
    }

    #[test]
    fn ets_alpha_near_one_follows_last_value() {
        let values = vec![10.0, 12.0, 11.0, 15.0, 14.0, 18.0];
        let mut model = ETS::with_params(ETSSpec::ann(), 1, 0.9999, None, None, None);
        model.fit(&series_from(values)).unwrap();
        let forecast = model.predict(3).unwrap();
        for p in forecast.point() {
            assert_relative_eq!(*p, 18.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn ets_ann_variance_grows_with_alpha() {
        let values = vec![10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 14.0, 12.0];
        let mut model = ETS::with_params(ETSSpec::ann(), 1, 0.5, None, None, None);
        model.fit(&series_from(values)).unwrap();
        let se = model.predict(3).unwrap().std_errors().unwrap().to_vec();
        assert_relative_eq!(se[2].powi(2) / se[0].powi(2), 1.5, epsilon = 1e-10);
        assert_relative_eq!(se[0].powi(2), model.sigma2().unwrap(), epsilon = 1e-10);
    }

    #[test]
    fn ets_additive_holt_winters_tracks_deterministic_pattern() {
        let values = trend_season(72);
        let mut model = ETS::new(ETSSpec::aaa(), 12);
        model.fit(&series_from(values)).unwrap();

        let truth = trend_season(84);
        let forecast = model.predict(12).unwrap();
        for (h, p) in forecast.point().iter().enumerate() {
            assert_relative_eq!(*p, truth[72 + h], max_relative = 0.01);
        }
    }

    #[test]
    fn ets_estimates_are_admissible() {
        let values = trend_season(60);
        let mut model = ETS::new(ETSSpec::mam(), 12);
        model.fit(&series_from(values)).unwrap();
        let params = model.params().unwrap();
        assert!(params.beta < params.alpha);
        assert!(params.gamma < 1.0 - params.alpha);
        assert!(model.aicc().unwrap().is_finite());
        assert!(model.aicc().unwrap() > model.aic().unwrap());
        assert_eq!(model.spec_name(), "ETS(M,A,M)");
    }

    #[test]
    fn ets_damped_forecasts_flatten() {
        let values: Vec<f64> = (0..20).map(|t| 50.0 + 2.0 * t as f64).collect();
        let mut model = ETS::with_params(ETSSpec::aadn(), 1, 0.5, Some(0.3), None, Some(0.85));
        model.fit(&series_from(values)).unwrap();
        let points = model.predict(10).unwrap().point().to_vec();
        let steps: Vec<f64> = points.windows(2).map(|w| w[1] - w[0]).collect();
        for pair in steps.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn ets_multiplicative_rejects_non_positive() {
        let mut values = trend_season(36);
        values[5] = 0.0;
        let mut model = ETS::new(ETSSpec::mnn(), 1);
        assert!(matches!(
            model.fit(&series_from(values)),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ets_skips_missing_values() {
        let mut values = trend_season(48);
        values[30] = f64::NAN;
        let mut model = ETS::new(ETSSpec::aaa(), 12);
        model.fit(&series_from(values)).unwrap();
        assert!(model.residuals().unwrap()[30].is_nan());
        assert!(model.predict(6).unwrap().point().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn ets_requires_two_cycles() {
        let mut model = ETS::new(ETSSpec::aaa(), 12);
        let err = model.fit(&series_from(trend_season(20))).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { needed: 24, got: 20 }));
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
    }
}
