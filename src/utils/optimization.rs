//! Derivative-free minimisation used for model parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop when the spread of objective values falls below this.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step, relative to each coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Box constraints applied by clamping every trial point.
#[derive(Debug, Clone, Copy)]
struct Bounds<'a>(Option<&'a [(f64, f64)]>);

impl Bounds<'_> {
    fn clamp(&self, mut point: Vec<f64>) -> Vec<f64> {
        if let Some(bounds) = self.0 {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(lo, hi);
            }
        }
        point
    }
}

struct Simplex {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Simplex {
    fn around<F: Fn(&[f64]) -> f64>(
        initial: &[f64],
        step: f64,
        bounds: Bounds<'_>,
        objective: &F,
    ) -> Self {
        let mut vertices = vec![bounds.clamp(initial.to_vec())];
        for i in 0..initial.len() {
            let mut vertex = initial.to_vec();
            vertex[i] += if initial[i].abs() > 1e-10 {
                step * initial[i].abs()
            } else {
                step
            };
            let mut vertex = bounds.clamp(vertex);
            // Clamping can collapse the step onto the start point.
            if vertex == vertices[0] {
                vertex[i] -= 2.0 * step.max(1e-4);
                vertex = bounds.clamp(vertex);
            }
            vertices.push(vertex);
        }
        let values = vertices.iter().map(|v| sanitize(objective(v))).collect();
        Self { vertices, values }
    }

    /// Reorder vertices from best to worst.
    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[a]
                .partial_cmp(&self.values[b])
                .unwrap_or(Ordering::Equal)
        });
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    fn worst(&self) -> usize {
        self.vertices.len() - 1
    }

    fn centroid(&self) -> Vec<f64> {
        let dims = self.vertices[0].len();
        let count = (self.vertices.len() - 1) as f64;
        let mut centroid = vec![0.0; dims];
        for vertex in &self.vertices[..self.worst()] {
            for (c, x) in centroid.iter_mut().zip(vertex) {
                *c += x / count;
            }
        }
        centroid
    }

    fn replace_worst(&mut self, point: Vec<f64>, value: f64) {
        let worst = self.worst();
        self.vertices[worst] = point;
        self.values[worst] = value;
    }

    fn diameter(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices
            .iter()
            .map(|v| {
                v.iter()
                    .zip(best)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max)
    }
}

/// Move from `from` along the direction to `to`, scaled by `coef`.
fn towards(from: &[f64], to: &[f64], coef: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(f, t)| f + coef * (t - f)).collect()
}

/// Non-finite objective values rank as worst.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::MAX
    }
}

/// Minimise `objective` with the Nelder-Mead simplex method.
///
/// # Example
/// ```
/// use tidy_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let bounds = Bounds(bounds);
    let eval = |p: &[f64]| sanitize(objective(p));
    let mut simplex = Simplex::around(initial, config.initial_step, bounds, &objective);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort();

        let worst = simplex.worst();
        let spread = simplex.values[worst] - simplex.values[0];
        if spread.abs() < config.tolerance || simplex.diameter() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = simplex.centroid();
        let reflected = bounds.clamp(towards(&centroid, &simplex.vertices[worst], -config.alpha));
        let f_reflected = eval(&reflected);

        if f_reflected < simplex.values[0] {
            let expanded = bounds.clamp(towards(&centroid, &reflected, config.gamma));
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex.replace_worst(expanded, f_expanded);
            } else {
                simplex.replace_worst(reflected, f_reflected);
            }
            continue;
        }

        if f_reflected < simplex.values[worst - 1] {
            simplex.replace_worst(reflected, f_reflected);
            continue;
        }

        let (contracted, threshold) = if f_reflected < simplex.values[worst] {
            (towards(&centroid, &reflected, config.rho), f_reflected)
        } else {
            (
                towards(&centroid, &simplex.vertices[worst], config.rho),
                simplex.values[worst],
            )
        };
        let contracted = bounds.clamp(contracted);
        let f_contracted = eval(&contracted);
        if f_contracted < threshold {
            simplex.replace_worst(contracted, f_contracted);
            continue;
        }

        let best = simplex.vertices[0].clone();
        for i in 1..simplex.vertices.len() {
            let shrunk = bounds.clamp(towards(&best, &simplex.vertices[i], config.sigma));
            simplex.values[i] = eval(&shrunk);
            simplex.vertices[i] = shrunk;
        }
    }

    simplex.sort();
    NelderMeadResult {
        optimal_point: simplex.vertices[0].clone(),
        optimal_value: simplex.values[0],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.5],
            Some(&[(0.0, 1.0)]),
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_point[0] <= 1.0);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-12,
            ..Default::default()
        };
        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
            &[-1.2, 1.0],
            None,
            config,
        );
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn nelder_mead_treats_nan_as_worst() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.3).powi(2) },
            &[0.8],
            None,
            NelderMeadConfig::default(),
        );
        assert_relative_eq!(result.optimal_point[0], 0.3, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_empty_input() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(result.optimal_point.is_empty());
        assert!(!result.converged);
    }
}
