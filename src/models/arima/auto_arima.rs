//! Automatic seasonal ARIMA model selection.
//!
//! Differencing orders are fixed first: one seasonal difference when the
//! seasonal strength exceeds 0.64, then first differences until the KPSS
//! test no longer rejects. AR and MA orders are then chosen by a stepwise
//! search that moves to the first neighbouring model with a lower
//! information criterion.

use std::collections::HashSet;

use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{ndiffs, nsdiffs, seasonal_difference};
use crate::models::arima::model::{fill_missing, ARIMASpec, ARIMA};
use crate::models::exponential::SelectionCriterion;
use crate::models::Forecaster;

/// Configuration for AutoARIMA.
#[derive(Debug, Clone)]
pub struct AutoARIMAConfig {
    /// Maximum non-seasonal AR order to consider.
    pub max_p: usize,
    /// Maximum non-seasonal MA order to consider.
    pub max_q: usize,
    /// Maximum non-seasonal differencing order.
    pub max_d: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Maximum of `p + q + P + Q`.
    pub max_order: usize,
    /// Seasonal period; 1 for non-seasonal data.
    pub seasonal_period: usize,
    /// Consider a mean or drift term when `d + D <= 1`.
    pub allow_constant: bool,
    /// Upper bound on the number of models fitted by the search.
    pub max_models: usize,
    pub criterion: SelectionCriterion,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_cap_p: 2,
            max_cap_q: 2,
            max_cap_d: 1,
            max_order: 5,
            seasonal_period: 1,
            allow_constant: true,
            max_models: 94,
            criterion: SelectionCriterion::AICc,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    /// Set seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period.max(1);
        self
    }

    /// Never include a mean or drift term.
    pub fn without_constant(mut self) -> Self {
        self.allow_constant = false;
        self
    }

    /// Set the selection criterion.
    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }
}

/// Search state for one fit: the differencing orders and what is allowed.
#[derive(Debug, Clone, Copy)]
struct SearchSpace {
    d: usize,
    seasonal_d: usize,
    period: usize,
    seasonal: bool,
    allow_constant: bool,
}

/// Automatic seasonal ARIMA selection.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected_model: Option<ARIMA>,
    /// Every fitted candidate with its score, best first.
    model_scores: Vec<(ARIMASpec, f64)>,
}

impl AutoARIMA {
    /// Create AutoARIMA for the given seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::default().with_seasonal_period(seasonal_period))
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected_model: None,
            model_scores: Vec::new(),
        }
    }

    /// Specification of the selected model.
    pub fn selected_spec(&self) -> Option<ARIMASpec> {
        self.selected_model.as_ref().map(ARIMA::spec)
    }

    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected_model.as_ref()
    }

    /// Get all model scores.
    pub fn model_scores(&self) -> &[(ARIMASpec, f64)] {
        &self.model_scores
    }

    fn criterion(&self, model: &ARIMA) -> Option<f64> {
        match self.config.criterion {
            SelectionCriterion::AIC => model.aic(),
            SelectionCriterion::AICc => model.aicc(),
            SelectionCriterion::BIC => model.bic(),
        }
    }

    fn spec(
        &self,
        space: &SearchSpace,
        (p, q, cap_p, cap_q): (usize, usize, usize, usize),
        constant: bool,
    ) -> ARIMASpec {
        ARIMASpec::seasonal(
            (p, space.d, q),
            (cap_p, space.seasonal_d, cap_q),
            space.period,
        )
        .with_constant(constant)
    }

    fn within_limits(&self, space: &SearchSpace, spec: &ARIMASpec) -> bool {
        let c = &self.config;
        let seasonal_terms = spec.seasonal_p + spec.seasonal_q;
        spec.p <= c.max_p
            && spec.q <= c.max_q
            && spec.seasonal_p <= c.max_cap_p
            && spec.seasonal_q <= c.max_cap_q
            && spec.p + spec.q + seasonal_terms <= c.max_order
            && (space.seasonal || seasonal_terms == 0)
            && (space.allow_constant || !spec.constant)
    }

    fn starting_specs(&self, space: &SearchSpace) -> Vec<ARIMASpec> {
        let c = &self.config;
        let seasonal = |x: usize| if space.seasonal { x } else { 0 };
        let mut starts = vec![
            (c.max_p.min(2), c.max_q.min(2), seasonal(c.max_cap_p.min(1)), seasonal(c.max_cap_q.min(1))),
            (0, 0, 0, 0),
            (c.max_p.min(1), 0, seasonal(c.max_cap_p.min(1)), 0),
            (0, c.max_q.min(1), 0, seasonal(c.max_cap_q.min(1))),
        ]
        .into_iter()
        .map(|orders| self.spec(space, orders, space.allow_constant))
        .collect::<Vec<_>>();
        if space.allow_constant {
            starts.push(self.spec(space, (0, 0, 0, 0), false));
        }
        starts
    }

    /// Models one step away from `current`.
    fn neighbours(&self, space: &SearchSpace, current: ARIMASpec) -> Vec<ARIMASpec> {
        let orders = (current.p, current.q, current.seasonal_p, current.seasonal_q);
        let steps: [(i8, i8, i8, i8); 12] = [
            (0, 0, -1, 0),
            (0, 0, 1, 0),
            (0, 0, 0, -1),
            (0, 0, 0, 1),
            (0, 0, -1, -1),
            (0, 0, 1, 1),
            (-1, 0, 0, 0),
            (1, 0, 0, 0),
            (0, -1, 0, 0),
            (0, 1, 0, 0),
            (-1, -1, 0, 0),
            (1, 1, 0, 0),
        ];
        let shift = |value: usize, delta: i8| -> Option<usize> {
            match delta {
                -1 => value.checked_sub(1),
                1 => Some(value + 1),
                _ => Some(value),
            }
        };

        let mut out: Vec<ARIMASpec> = steps
            .iter()
            .filter_map(|&(dp, dq, dcp, dcq)| {
                Some((
                    shift(orders.0, dp)?,
                    shift(orders.1, dq)?,
                    shift(orders.2, dcp)?,
                    shift(orders.3, dcq)?,
                ))
            })
            .map(|o| self.spec(space, o, current.constant))
            .collect();
        out.push(current.with_constant(!current.constant));
        out.retain(|spec| self.within_limits(space, spec));
        out
    }

    /// Fit one candidate; returns its score when it fitted.
    fn evaluate(&mut self, series: &TimeSeries, spec: ARIMASpec) -> Option<(ARIMA, f64)> {
        let mut model = ARIMA::with_spec(spec);
        match model.fit(series) {
            Ok(()) => {
                let score = self.criterion(&model).filter(|s| s.is_finite())?;
                debug!(model = %spec, score, "fitted ARIMA candidate");
                self.model_scores.push((spec, score));
                Some((model, score))
            }
            Err(e) => {
                debug!(model = %spec, error = %e, "ARIMA candidate failed");
                None
            }
        }
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        const MIN_OBSERVATIONS: usize = 8;

        let values = fill_missing(series.values()).ok_or(ForecastError::EmptyData)?;
        if values.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_OBSERVATIONS,
                got: values.len(),
            });
        }

        let m = self.config.seasonal_period;
        let seasonal = m > 1 && values.len() >= 3 * m;
        let seasonal_d = if seasonal {
            nsdiffs(&values, m).min(self.config.max_cap_d)
        } else {
            0
        };
        let max_d = self.config.max_d.min(2usize.saturating_sub(seasonal_d));
        let d = ndiffs(&seasonal_difference(&values, seasonal_d, m), max_d);
        let space = SearchSpace {
            d,
            seasonal_d,
            period: if seasonal { m } else { 1 },
            seasonal,
            allow_constant: self.config.allow_constant && d + seasonal_d <= 1,
        };
        debug!(d, seasonal_d, period = space.period, "ARIMA differencing orders");

        self.model_scores.clear();
        self.selected_model = None;
        let mut visited = HashSet::new();
        let mut best: Option<(ARIMA, f64)> = None;

        let mut consider = |this: &mut Self, spec: ARIMASpec, best: &mut Option<(ARIMA, f64)>| {
            if !visited.insert(spec) {
                return false;
            }
            match this.evaluate(series, spec) {
                Some((model, score)) if best.as_ref().map_or(true, |(_, b)| score < *b) => {
                    *best = Some((model, score));
                    true
                }
                _ => false,
            }
        };

        for spec in self.starting_specs(&space) {
            consider(self, spec, &mut best);
        }

        while let Some(current) = best.as_ref().map(|(model, _)| model.spec()) {
            let mut improved = false;
            for spec in self.neighbours(&space, current) {
                if self.model_scores.len() >= self.config.max_models {
                    break;
                }
                if consider(self, spec, &mut best) {
                    improved = true;
                    break;
                }
            }
            if !improved {
                break;
            }
        }

        self.model_scores
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        match best {
            Some((model, _)) => {
                self.selected_model = Some(model);
                Ok(())
            }
            None => Err(ForecastError::ComputationError(
                "no valid ARIMA model could be fitted".to_string(),
            )),
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn sigma2(&self) -> Option<f64> {
        self.selected_model.as_ref()?.sigma2()
    }

    fn aicc(&self) -> Option<f64> {
        self.selected_model.as_ref()?.aicc()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn spec_name(&self) -> String {
        self.selected_model
            .as_ref()
            .map_or_else(|| self.name().to_string(), |m| m.spec().short_name())
    }
}
