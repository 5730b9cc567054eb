//! Bounded Nelder-Mead simplex search used to fit smoothing parameters.

use serde::{Deserialize, Serialize};

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values in the simplex.
    pub f_tolerance: f64,
    /// Absolute tolerance on that spread, for objectives that reach zero.
    pub f_abs_tolerance: f64,
    /// Absolute tolerance on the simplex size. Both this and the objective
    /// spread must be met to converge.
    pub x_tolerance: f64,
    /// Reflection coefficient.
    pub reflection: f64,
    /// Expansion coefficient.
    pub expansion: f64,
    /// Contraction coefficient.
    pub contraction: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Initial simplex step, as a share of the bound width (or of the
    /// starting coordinate when unbounded).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            f_tolerance: 1e-10,
            f_abs_tolerance: 1e-14,
            x_tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    pub iterations: usize,
    /// Whether a tolerance was met before `max_iter`.
    pub converged: bool,
}

#[derive(Debug, Clone)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Minimize `objective` starting from `initial`, keeping every coordinate
/// inside `bounds` when given.
///
/// # Example
/// ```
/// use weekly_sales_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 0.4).powi(2) + (x[1] - 0.7).powi(2),
///     &[0.1, 0.1],
///     Some(&[(0.0, 1.0), (0.0, 1.0)]),
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 0.4).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = initial.len();
    if dim == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let eval = |point: Vec<f64>| -> Vertex {
        let point = clamp(point, bounds);
        let value = objective(&point);
        // NaN would break the ordering; treat it as the worst possible value.
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex { point, value }
    };

    let mut simplex: Vec<Vertex> = Vec::with_capacity(dim + 1);
    simplex.push(eval(initial.to_vec()));
    for i in 0..dim {
        let mut point = initial.to_vec();
        let bound = bounds.and_then(|b| b.get(i)).copied();
        // Bounded coordinates step by a share of the box width, so a start
        // next to a bound still spans the feasible range.
        let step = match bound {
            Some((lo, hi)) if (hi - lo).is_finite() && hi > lo => config.initial_step * (hi - lo),
            _ if initial[i].abs() > 1e-10 => config.initial_step * initial[i].abs(),
            _ => config.initial_step,
        };
        point[i] += step;
        // Step backwards if the bound swallowed the move.
        if let Some((_, hi)) = bound {
            if point[i] > hi {
                point[i] = initial[i] - step;
            }
        }
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.value.total_cmp(&b.value));

        let best = simplex[0].value;
        let worst = simplex[dim].value;
        let spread = (worst - best).abs();
        let flat = spread <= config.f_tolerance * (best.abs() + worst.abs()) + config.f_abs_tolerance;

        let centroid = centroid(&simplex[..dim]);
        // Equal values alone are not enough: a wide simplex can straddle the
        // minimum symmetrically.
        let size = simplex
            .iter()
            .map(|v| distance(&v.point, &simplex[0].point))
            .fold(0.0, f64::max);
        if flat && size < config.x_tolerance {
            converged = true;
            break;
        }

        let reflected = eval(towards(&centroid, &simplex[dim].point, -config.reflection));

        if reflected.value < simplex[0].value {
            let expanded = eval(towards(&centroid, &reflected.point, config.expansion));
            simplex[dim] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }

        if reflected.value < simplex[dim - 1].value {
            simplex[dim] = reflected;
            continue;
        }

        let contracted = if reflected.value < simplex[dim].value {
            let outside = eval(towards(&centroid, &reflected.point, config.contraction));
            (outside.value <= reflected.value).then_some(outside)
        } else {
            let inside = eval(towards(&centroid, &simplex[dim].point, config.contraction));
            (inside.value < simplex[dim].value).then_some(inside)
        };

        if let Some(vertex) = contracted {
            simplex[dim] = vertex;
            continue;
        }

        let anchor = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.point, config.shrink);
            *vertex = eval(shrunk);
        }
    }

    simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
    let best = simplex.swap_remove(0);

    NelderMeadResult {
        optimal_point: best.point,
        optimal_value: best.value,
        iterations,
        converged,
    }
}

/// `origin + t * (target - origin)`. Negative `t` reflects through `origin`.
fn towards(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let dim = vertices[0].point.len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (acc, x) in c.iter_mut().zip(&v.point) {
            *acc += x;
        }
    }
    let count = vertices.len() as f64;
    c.iter_mut().for_each(|x| *x /= count);
    c
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, (lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(*lo, *hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
