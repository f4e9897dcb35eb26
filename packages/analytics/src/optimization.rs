//! Derivative-free minimization (Nelder–Mead simplex).

/// Settings for [`nelder_mead`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadConfig {
    /// Iteration cap.
    pub max_iter: usize,
    /// Relative spread of objective values across the simplex at which
    /// the search may stop.
    pub tolerance: f64,
    /// Largest coordinate distance from the best vertex at which the
    /// search may stop. Both tolerances must hold.
    pub point_tolerance: f64,
    /// Offset applied to each coordinate of the start point to build the
    /// initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5_000,
            tolerance: 1e-10,
            point_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

/// Outcome of [`nelder_mead`].
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadResult {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective at [`Self::point`].
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// `true` if both tolerances were met before `max_iter`.
    pub converged: bool,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimizes `f` starting from `x0`.
///
/// Non-finite objective values are treated as `+inf`, so the objective
/// may signal infeasible points by returning `NaN` or infinity.
#[must_use]
pub fn nelder_mead<F>(f: F, x0: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return NelderMeadResult {
            point: Vec::new(),
            value: evaluate(&f, x0),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] += config.initial_step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|x| evaluate(&f, x)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        if best.is_finite()
            && worst.is_finite()
            && (worst - best).abs() <= config.tolerance * (1.0 + best.abs())
            && simplex_size(&simplex) <= config.point_tolerance
        {
            converged = true;
            break;
        }

        iterations += 1;

        let center = centroid(&simplex[..n]);
        let reflected = along(&center, &simplex[n], -REFLECTION);
        let f_reflected = evaluate(&f, &reflected);

        if f_reflected < values[0] {
            let expanded = along(&center, &simplex[n], -REFLECTION * EXPANSION);
            let f_expanded = evaluate(&f, &expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted, accept) = if f_reflected < values[n] {
            let point = along(&center, &reflected, CONTRACTION);
            let value = evaluate(&f, &point);
            let accept = value <= f_reflected;
            (point, value, accept)
        } else {
            let point = along(&center, &simplex[n], CONTRACTION);
            let value = evaluate(&f, &point);
            let accept = value < values[n];
            (point, value, accept)
        };

        if accept {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let anchor = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = along(&anchor, &simplex[i], SHRINK);
            values[i] = evaluate(&f, &simplex[i]);
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i);

    NelderMeadResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

fn evaluate<F: Fn(&[f64]) -> f64>(f: &F, x: &[f64]) -> f64 {
    let v = f(x);
    if v.is_finite() { v } else { f64::INFINITY }
}

/// Largest coordinate distance between the best vertex and any other.
fn simplex_size(simplex: &[Vec<f64>]) -> f64 {
    let best = &simplex[0];
    simplex[1..]
        .iter()
        .flat_map(|v| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max)
}

#[allow(clippy::cast_precision_loss)]
fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let dim = vertices[0].len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v) {
            *ci += vi;
        }
    }
    let count = vertices.len() as f64;
    for ci in &mut c {
        *ci /= count;
    }
    c
}

/// Returns `origin + t * (target - origin)`.
fn along(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect()
}
