//! Model definitions written as formulas such as
//! `ets = ETS(box_cox(Turnover, 0.3))`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ForecastError, Result};
use crate::models::arima::AutoARIMA;
use crate::models::baseline::SeasonalNaive;
use crate::models::exponential::AutoETS;
use crate::models::BoxedForecaster;
use crate::transform::Transformation;

/// Model family named on the right hand side of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Exponential smoothing with automatic component selection.
    ETS,
    /// Seasonal ARIMA with automatic order selection.
    ARIMA,
    /// Seasonal naive.
    SNAIVE,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::ETS => "ETS",
            ModelFamily::ARIMA => "ARIMA",
            ModelFamily::SNAIVE => "SNAIVE",
        }
    }

    /// Unfitted estimator for data with the given seasonal period.
    pub fn build(&self, period: usize) -> BoxedForecaster {
        match self {
            ModelFamily::ETS => Box::new(AutoETS::new(period)),
            ModelFamily::ARIMA => Box::new(AutoARIMA::new(period)),
            ModelFamily::SNAIVE => Box::new(SeasonalNaive::new(period)),
        }
    }
}

impl FromStr for ModelFamily {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ETS" => Ok(ModelFamily::ETS),
            "ARIMA" => Ok(ModelFamily::ARIMA),
            "SNAIVE" => Ok(ModelFamily::SNAIVE),
            other => Err(ForecastError::Parse(format!(
                "unknown model family `{}` (expected ETS, ARIMA or SNAIVE)",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named model: family, response column and response transformation.
///
/// # Example
///
/// ```
/// use tidy_forecast::fable::{ModelDefinition, ModelFamily};
/// use tidy_forecast::transform::Transformation;
///
/// let def = ModelDefinition::parse("ets = ETS(box_cox(Turnover, 0.3))").unwrap();
/// assert_eq!(def.name(), "ets");
/// assert_eq!(def.family(), ModelFamily::ETS);
/// assert_eq!(def.response(), "Turnover");
/// assert_eq!(def.transformation(), Transformation::BoxCox { lambda: 0.3 });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    name: String,
    family: ModelFamily,
    response: String,
    transformation: Transformation,
}

impl ModelDefinition {
    pub fn new(
        name: impl Into<String>,
        family: ModelFamily,
        response: impl Into<String>,
        transformation: Transformation,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            response: response.into(),
            transformation,
        }
    }

    /// Parse `name = FAMILY(expr)`. Without a name the lowercase family
    /// name is used.
    pub fn parse(input: &str) -> Result<Self> {
        let (name, call) = match input.split_once('=') {
            Some((name, call)) if !name.contains('(') => (name.trim().to_string(), call.trim()),
            _ => (String::new(), input.trim()),
        };

        let (family, args) = split_call(call)?;
        let family: ModelFamily = family.parse()?;
        let (response, transformation) = parse_response(args)?;

        let name = if name.is_empty() {
            family.as_str().to_lowercase()
        } else {
            name
        };
        if !is_identifier(&name) {
            return Err(ForecastError::Parse(format!(
                "invalid model name `{}` in `{}`",
                name, input
            )));
        }
        Ok(Self::new(name, family, response, transformation))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Column the model is fitted on.
    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Right hand side, e.g. `ARIMA(log(Turnover))`.
    pub fn formula(&self) -> String {
        format!(
            "{}({})",
            self.family,
            self.transformation.describe(&self.response)
        )
    }

    /// Unfitted estimator for this definition.
    pub fn build(&self, period: usize) -> BoxedForecaster {
        self.family.build(period)
    }
}

impl FromStr for ModelDefinition {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.formula())
    }
}

/// Split `f(args)` into `f` and `args`; the closing parenthesis must end
/// the input.
fn split_call(input: &str) -> Result<(&str, &str)> {
    let input = input.trim();
    let open = input
        .find('(')
        .ok_or_else(|| ForecastError::Parse(format!("expected a call, got `{}`", input)))?;
    if !input.ends_with(')') {
        return Err(ForecastError::Parse(format!(
            "unbalanced parentheses in `{}`",
            input
        )));
    }
    let head = input[..open].trim();
    let args = &input[open + 1..input.len() - 1];
    let mut depth = 0i32;
    for c in args.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(ForecastError::Parse(format!(
                "unbalanced parentheses in `{}`",
                input
            )));
        }
    }
    if depth != 0 {
        return Err(ForecastError::Parse(format!(
            "unbalanced parentheses in `{}`",
            input
        )));
    }
    Ok((head, args.trim()))
}

/// Parse `Turnover`, `log(Turnover)` or `box_cox(Turnover, 0.3)`.
fn parse_response(expr: &str) -> Result<(String, Transformation)> {
    if !expr.contains('(') {
        return column_name(expr).map(|c| (c, Transformation::Identity));
    }

    let (func, args) = split_call(expr)?;
    let args: Vec<&str> = args.split(',').map(str::trim).collect();
    match (func, args.as_slice()) {
        ("log", [column]) => Ok((column_name(column)?, Transformation::Log)),
        ("box_cox", [column, lambda]) => {
            let lambda = lambda
                .strip_prefix("lambda")
                .and_then(|rest| rest.trim_start().strip_prefix('='))
                .unwrap_or(lambda)
                .trim();
            let lambda: f64 = lambda.parse().map_err(|_| {
                ForecastError::Parse(format!("invalid Box-Cox lambda `{}`", lambda))
            })?;
            if !lambda.is_finite() {
                return Err(ForecastError::Parse(format!(
                    "invalid Box-Cox lambda `{}`",
                    lambda
                )));
            }
            Ok((column_name(column)?, Transformation::BoxCox { lambda }))
        }
        ("log" | "box_cox", _) => Err(ForecastError::Parse(format!(
            "wrong number of arguments in `{}`",
            expr
        ))),
        (other, _) => Err(ForecastError::Parse(format!(
            "unknown transformation `{}`",
            other
        ))),
    }
}

fn column_name(s: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ForecastError::Parse("missing response column".to_string()));
    }
    let unquoted = s.strip_prefix('`').and_then(|r| r.strip_suffix('`'));
    match unquoted {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ if is_identifier(s) => Ok(s.to_string()),
        _ => Err(ForecastError::Parse(format!("invalid column name `{}`", s))),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_retail_models() {
        let ets = ModelDefinition::parse("ets = ETS(box_cox(Turnover, 0.3))").unwrap();
        let arima = ModelDefinition::parse("arima = ARIMA(log(Turnover))").unwrap();
        let snaive = ModelDefinition::parse("snaive = SNAIVE(Turnover)").unwrap();

        assert_eq!(ets.transformation(), Transformation::BoxCox { lambda: 0.3 });
        assert_eq!(arima.family(), ModelFamily::ARIMA);
        assert_eq!(arima.transformation(), Transformation::Log);
        assert_eq!(snaive.transformation(), Transformation::Identity);
        assert_eq!(snaive.response(), "Turnover");
    }

    #[test]
    fn whitespace_and_named_lambda_are_accepted() {
        let def = ModelDefinition::parse("ets=ETS( box_cox( Turnover , lambda = 0.3 ) )").unwrap();
        assert_eq!(def.name(), "ets");
        assert_eq!(def.transformation(), Transformation::BoxCox { lambda: 0.3 });
    }

    #[test]
    fn unnamed_definition_uses_family_name() {
        let def: ModelDefinition = "SNAIVE(Turnover)".parse().unwrap();
        assert_eq!(def.name(), "snaive");
        let def = ModelDefinition::parse("ETS(box_cox(Turnover, lambda = 0.3))").unwrap();
        assert_eq!(def.name(), "ets");
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "ets = ETS(box_cox(Turnover, 0.3))",
            "arima = ARIMA(log(Turnover))",
            "snaive = SNAIVE(Turnover)",
        ] {
            let def = ModelDefinition::parse(text).unwrap();
            assert_eq!(def.to_string(), text);
            assert_eq!(ModelDefinition::parse(&def.to_string()).unwrap(), def);
        }
    }

    #[test]
    fn unknown_family_and_transform_are_parse_errors() {
        for bad in [
            "m = PROPHET(Turnover)",
            "m = ETS(sqrt(Turnover))",
            "m = ETS(box_cox(Turnover))",
            "m = ETS(box_cox(Turnover, abc))",
            "m = ETS(Turnover",
            "m = ETS()",
            "1m = ETS(Turnover)",
            "ETS",
        ] {
            assert!(
                matches!(ModelDefinition::parse(bad), Err(ForecastError::Parse(_))),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn build_returns_the_family_estimator() {
        let def = ModelDefinition::parse("arima = ARIMA(log(Turnover))").unwrap();
        let model = def.build(12);
        assert_eq!(model.name(), "ARIMA");
        assert!(!model.is_fitted());
        assert_eq!(ModelFamily::SNAIVE.build(12).name(), "SNAIVE");
    }
}
