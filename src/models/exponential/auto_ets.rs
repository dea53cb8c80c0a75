//! Automatic ETS model selection.
//!
//! AutoETS fits every admissible ETS specification and keeps the one with
//! the lowest information criterion.

use tracing::debug;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::exponential::ets::{ETSSpec, ErrorType, SeasonalType, TrendType, ETS};
use crate::models::Forecaster;

/// Selection criterion for AutoETS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionCriterion {
    /// Akaike Information Criterion
    AIC,
    /// Corrected Akaike Information Criterion
    #[default]
    AICc,
    /// Bayesian Information Criterion
    BIC,
}

/// Configuration for AutoETS.
#[derive(Debug, Clone)]
pub struct AutoETSConfig {
    /// Selection criterion to use.
    pub criterion: SelectionCriterion,
    /// Seasonal period; 1 for non-seasonal data.
    pub seasonal_period: usize,
    /// Allow multiplicative errors.
    pub allow_multiplicative_error: bool,
    /// Allow multiplicative seasonality.
    pub allow_multiplicative_seasonal: bool,
    /// Allow damped trend.
    pub allow_damped: bool,
}

impl Default for AutoETSConfig {
    fn default() -> Self {
        Self {
            criterion: SelectionCriterion::AICc,
            seasonal_period: 1,
            allow_multiplicative_error: true,
            allow_multiplicative_seasonal: true,
            allow_damped: true,
        }
    }
}

impl AutoETSConfig {
    /// Create a configuration with a specific seasonal period.
    pub fn with_period(period: usize) -> Self {
        Self {
            seasonal_period: period.max(1),
            ..Default::default()
        }
    }

    /// Restrict to additive models only.
    pub fn additive_only(mut self) -> Self {
        self.allow_multiplicative_error = false;
        self.allow_multiplicative_seasonal = false;
        self
    }

    /// Set the selection criterion.
    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }
}

/// Automatic ETS model selection.
#[derive(Debug, Clone)]
pub struct AutoETS {
    config: AutoETSConfig,
    selected_model: Option<ETS>,
    /// Every successfully fitted candidate with its score, best first.
    model_scores: Vec<(ETSSpec, f64)>,
}

impl AutoETS {
    /// Create AutoETS with a specific seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        Self::with_config(AutoETSConfig::with_period(seasonal_period))
    }

    /// Create a new AutoETS with custom configuration.
    pub fn with_config(config: AutoETSConfig) -> Self {
        Self {
            config,
            selected_model: None,
            model_scores: Vec::new(),
        }
    }

    /// Get the selected specification.
    pub fn selected_spec(&self) -> Option<ETSSpec> {
        self.selected_model.as_ref().map(ETS::spec)
    }

    /// The selected, fitted model.
    pub fn selected_model(&self) -> Option<&ETS> {
        self.selected_model.as_ref()
    }

    /// Get all model scores.
    pub fn model_scores(&self) -> &[(ETSSpec, f64)] {
        &self.model_scores
    }

    /// Candidate specifications.
    ///
    /// Additive-error models with multiplicative seasonality are excluded
    /// because of their numerical instability, as are multiplicative
    /// components when the data are not strictly positive.
    fn generate_candidates(&self, seasonal: bool, positive: bool) -> Vec<ETSSpec> {
        let mut error_types = vec![ErrorType::Additive];
        if self.config.allow_multiplicative_error && positive {
            error_types.push(ErrorType::Multiplicative);
        }

        let mut trend_types = vec![TrendType::None, TrendType::Additive];
        if self.config.allow_damped {
            trend_types.push(TrendType::AdditiveDamped);
        }

        let mut seasonal_types = vec![SeasonalType::None];
        if seasonal {
            seasonal_types.push(SeasonalType::Additive);
            if self.config.allow_multiplicative_seasonal && positive {
                seasonal_types.push(SeasonalType::Multiplicative);
            }
        }

        let mut candidates = Vec::new();
        for &error in &error_types {
            for &trend in &trend_types {
                for &season in &seasonal_types {
                    if error == ErrorType::Additive && season == SeasonalType::Multiplicative {
                        continue;
                    }
                    candidates.push(ETSSpec::new(error, trend, season));
                }
            }
        }
        candidates
    }

    fn criterion(&self, model: &ETS) -> Option<f64> {
        match self.config.criterion {
            SelectionCriterion::AIC => model.aic(),
            SelectionCriterion::AICc => model.aicc(),
            SelectionCriterion::BIC => model.bic(),
        }
    }

    fn selected(&self) -> Result<&ETS> {
        self.selected_model.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for AutoETS {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Forecaster for AutoETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 3 {
            return Err(ForecastError::InsufficientData {
                needed: 3,
                got: values.len(),
            });
        }

        let period = self.config.seasonal_period;
        let seasonal = period > 1 && values.len() >= 2 * period;
        let positive = values.iter().filter(|v| v.is_finite()).all(|&v| v > 0.0);

        self.model_scores.clear();
        self.selected_model = None;
        let mut best_score = f64::INFINITY;
        let mut last_error = None;

        for spec in self.generate_candidates(seasonal, positive) {
            let mut model = ETS::new(spec, if spec.has_seasonal() { period } else { 1 });
            match model.fit(series) {
                Ok(()) => {
                    let Some(score) = self.criterion(&model).filter(|s| s.is_finite()) else {
                        continue;
                    };
                    debug!(model = %spec.short_name(), score, "fitted ETS candidate");
                    self.model_scores.push((spec, score));
                    if score < best_score {
                        best_score = score;
                        self.selected_model = Some(model);
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        self.model_scores
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if self.selected_model.is_none() {
            return Err(last_error.unwrap_or_else(|| {
                ForecastError::ComputationError("no valid ETS model could be fitted".to_string())
            }));
        }
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected()?.predict(horizon)
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
        "ETS"
    }

    fn spec_name(&self) -> String {
        self.selected_model
            .as_ref()
            .map_or_else(|| self.name().to_string(), |m| m.spec().short_name())
    }
}
