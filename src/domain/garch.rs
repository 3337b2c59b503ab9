//! GARCH(1,1) conditional-volatility model.
//!
//! Constant mean, normal innovations:
//!
//! ```text
//! e[t]      = y[t] - mu
//! sigma2[t] = omega + alpha * e[t-1]^2 + beta * sigma2[t-1]
//! ```
//!
//! The pre-sample variance is an exponentially weighted backcast of the first
//! squared deviations. Parameters are fitted by maximum likelihood with a
//! Nelder-Mead simplex on a transformed space that keeps omega > 0,
//! alpha, beta >= 0 and alpha + beta < 1. The data is rescaled to unit variance
//! before fitting and the estimates are mapped back afterwards.

use std::f64::consts::PI;

const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_HORIZON: usize = 75;
const MIN_OBSERVATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GarchError {
    #[error("need at least {minimum} observations, have {observations}")]
    TooFewObservations { observations: usize, minimum: usize },

    #[error("input has zero or non-finite variance")]
    ZeroVariance,

    #[error("optimizer did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("likelihood is not finite at the optimum")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarchParams {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl GarchParams {
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    pub fn is_stationary(&self) -> bool {
        self.omega > 0.0 && self.alpha >= 0.0 && self.beta >= 0.0 && self.persistence() < 1.0
    }
}

#[derive(Debug, Clone)]
pub struct GarchFit {
    pub params: GarchParams,
    pub log_likelihood: f64,
    pub iterations: usize,
    /// sqrt(sigma2[t]) for every input observation, in input order.
    pub conditional_volatility: Vec<f64>,
}

/// Fitting options. The defaults are what the residual standardizer uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarchFitter {
    pub max_iterations: usize,
    /// Relative spread of the simplex objective values at convergence.
    pub tolerance: f64,
}

impl Default for GarchFitter {
    fn default() -> Self {
        GarchFitter {
            max_iterations: 10_000,
            tolerance: 1e-10,
        }
    }
}

impl GarchFitter {
    pub fn fit(&self, data: &[f64]) -> Result<GarchFit, GarchError> {
        let n = data.len();
        if n < MIN_OBSERVATIONS {
            return Err(GarchError::TooFewObservations {
                observations: n,
                minimum: MIN_OBSERVATIONS,
            });
        }

        let mean = data.iter().sum::<f64>() / n as f64;
        let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let scale = var.sqrt();
        // Constant input leaves only rounding residue in the variance.
        let degenerate = f64::EPSILON.sqrt() * mean.abs().max(f64::MIN_POSITIVE);
        if !(scale.is_finite() && scale > degenerate) {
            return Err(GarchError::ZeroVariance);
        }

        let scaled: Vec<f64> = data.iter().map(|v| v / scale).collect();
        let scaled_mean = mean / scale;
        let demeaned: Vec<f64> = scaled.iter().map(|v| v - scaled_mean).collect();
        let backcast = backcast(&demeaned);

        let start = [scaled_mean, 0.1f64.ln(), logit(0.9), logit(1.0 / 9.0)];
        let steps = [0.1, 0.5, 0.5, 0.5];
        let objective = |u: &[f64]| negative_log_likelihood(&from_unconstrained(u), &scaled, backcast);

        let (best, best_value, iterations) =
            nelder_mead(objective, &start, &steps, self.max_iterations, self.tolerance)?;
        if !best_value.is_finite() {
            return Err(GarchError::NonFinite);
        }

        let scaled_params = from_unconstrained(&best);
        let sigma2 = conditional_variance(&scaled_params, &scaled, backcast);
        let params = GarchParams {
            mu: scaled_params.mu * scale,
            omega: scaled_params.omega * scale * scale,
            alpha: scaled_params.alpha,
            beta: scaled_params.beta,
        };

        Ok(GarchFit {
            params,
            log_likelihood: -best_value - n as f64 * scale.ln(),
            iterations,
            conditional_volatility: sigma2.iter().map(|s2| s2.sqrt() * scale).collect(),
        })
    }
}

/// Exponentially weighted mean of the leading squared deviations.
pub fn backcast(demeaned: &[f64]) -> f64 {
    let horizon = demeaned.len().min(BACKCAST_HORIZON);
    let mut weight = 1.0;
    let mut weight_sum = 0.0;
    let mut acc = 0.0;
    for e in &demeaned[..horizon] {
        acc += weight * e * e;
        weight_sum += weight;
        weight *= BACKCAST_DECAY;
    }
    acc / weight_sum
}

pub fn conditional_variance(params: &GarchParams, data: &[f64], backcast: f64) -> Vec<f64> {
    let mut sigma2 = Vec::with_capacity(data.len());
    let mut prev_e2 = backcast;
    let mut prev_s2 = backcast;
    for y in data {
        let s2 = params.omega + params.alpha * prev_e2 + params.beta * prev_s2;
        sigma2.push(s2);
        let e = y - params.mu;
        prev_e2 = e * e;
        prev_s2 = s2;
    }
    sigma2
}

/// Gaussian log-likelihood of `data` under `params`.
pub fn log_likelihood(params: &GarchParams, data: &[f64], backcast: f64) -> f64 {
    -negative_log_likelihood(params, data, backcast)
}

fn negative_log_likelihood(params: &GarchParams, data: &[f64], backcast: f64) -> f64 {
    let ln_2pi = (2.0 * PI).ln();
    let sigma2 = conditional_variance(params, data, backcast);
    let mut nll = 0.0;
    for (y, s2) in data.iter().zip(&sigma2) {
        if !(s2.is_finite() && *s2 > 0.0) {
            return f64::INFINITY;
        }
        let e = y - params.mu;
        nll += 0.5 * (ln_2pi + s2.ln() + e * e / s2);
    }
    if nll.is_finite() { nll } else { f64::INFINITY }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// u = [mu, ln omega, logit persistence, logit alpha share].
fn from_unconstrained(u: &[f64]) -> GarchParams {
    let persistence = logistic(u[2]);
    let share = logistic(u[3]);
    GarchParams {
        mu: u[0],
        omega: u[1].exp(),
        alpha: persistence * share,
        beta: persistence * (1.0 - share),
    }
}

/// Downhill simplex minimisation. Converges when the relative spread between
/// the best and worst vertex values drops below `tolerance`.
fn nelder_mead<F>(
    f: F,
    start: &[f64],
    steps: &[f64],
    max_iterations: usize,
    tolerance: f64,
) -> Result<(Vec<f64>, f64, usize), GarchError>
where
    F: Fn(&[f64]) -> f64,
{
    const TINY: f64 = 1e-10;
    let dim = start.len();

    let mut simplex: Vec<(f64, Vec<f64>)> = Vec::with_capacity(dim + 1);
    simplex.push((f(start), start.to_vec()));
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] += steps[i];
        simplex.push((f(&vertex), vertex));
    }

    for iteration in 0..max_iterations {
        simplex.sort_by(|a, b| a.0.total_cmp(&b.0));
        let best = simplex[0].0;
        let worst = simplex[dim].0;
        let second_worst = simplex[dim - 1].0;

        let spread = 2.0 * (worst - best).abs() / (worst.abs() + best.abs() + TINY);
        if spread < tolerance {
            let (value, point) = simplex.swap_remove(0);
            return Ok((point, value, iteration));
        }

        let mut centroid = vec![0.0; dim];
        for (_, vertex) in &simplex[..dim] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / dim as f64;
            }
        }
        let towards = |from: &[f64], coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coef * (x - c))
                .collect()
        };

        let reflected = towards(&simplex[dim].1, -1.0);
        let reflected_value = f(&reflected);

        if reflected_value < best {
            let expanded = towards(&simplex[dim].1, -2.0);
            let expanded_value = f(&expanded);
            simplex[dim] = if expanded_value < reflected_value {
                (expanded_value, expanded)
            } else {
                (reflected_value, reflected)
            };
            continue;
        }

        if reflected_value < second_worst {
            simplex[dim] = (reflected_value, reflected);
            continue;
        }

        let (contracted, contracted_value, accept) = if reflected_value < worst {
            let outside = towards(&reflected, 0.5);
            let value = f(&outside);
            (outside, value, value <= reflected_value)
        } else {
            let inside = towards(&simplex[dim].1, 0.5);
            let value = f(&inside);
            (inside, value, value < worst)
        };

        if accept {
            simplex[dim] = (contracted_value, contracted);
            continue;
        }

        let anchor = simplex[0].1.clone();
        for (value, vertex) in simplex.iter_mut().skip(1) {
            for (x, a) in vertex.iter_mut().zip(&anchor) {
                *x = a + 0.5 * (*x - a);
            }
            *value = f(&vertex[..]);
        }
    }

    Err(GarchError::NotConverged {
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic standard normal draws (LCG + Box-Muller).
    fn normals(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut uniform = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
        };
        (0..n)
            .map(|_| {
                let u1 = uniform();
                let u2 = uniform();
                (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
            })
            .collect()
    }

    fn simulate(n: usize, omega: f64, alpha: f64, beta: f64) -> Vec<f64> {
        let z = normals(n, 7);
        let mut sigma2 = omega / (1.0 - alpha - beta);
        let mut out = Vec::with_capacity(n);
        for zt in z {
            let e = sigma2.sqrt() * zt;
            out.push(e);
            sigma2 = omega + alpha * e * e + beta * sigma2;
        }
        out
    }

    #[test]
    fn fits_simulated_garch() {
        let data = simulate(1000, 1e-6, 0.1, 0.85);
        let fit = GarchFitter::default().fit(&data).unwrap();

        assert!(fit.params.is_stationary());
        assert_eq!(fit.conditional_volatility.len(), data.len());
        assert!(
            fit.conditional_volatility
                .iter()
                .all(|v| v.is_finite() && *v > 0.0)
        );
        assert!(fit.log_likelihood.is_finite());
    }

    #[test]
    fn optimum_beats_starting_point() {
        let data = simulate(500, 2e-5, 0.15, 0.8);
        let fit = GarchFitter::default().fit(&data).unwrap();

        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
        let demeaned: Vec<f64> = data.iter().map(|v| v - mean).collect();
        let bc = backcast(&demeaned);
        let start = GarchParams {
            mu: mean,
            omega: 0.1 * var,
            alpha: 0.1,
            beta: 0.8,
        };

        let at_start = log_likelihood(&start, &data, bc);
        let at_fit = log_likelihood(&fit.params, &data, bc);
        assert!(at_fit >= at_start - 1e-6);
        assert!((at_fit - fit.log_likelihood).abs() < 1e-6 * at_fit.abs().max(1.0));
    }

    #[test]
    fn iid_noise_converges() {
        let data: Vec<f64> = normals(300, 42).iter().map(|z| 0.01 * z).collect();
        let fit = GarchFitter::default().fit(&data).unwrap();
        assert!(fit.params.is_stationary());
        // Volatility should sit near the sample standard deviation.
        let avg = fit.conditional_volatility.iter().sum::<f64>() / data.len() as f64;
        assert!(avg > 0.005 && avg < 0.02);
    }

    #[test]
    fn iteration_budget_exhausted_is_not_converged() {
        let data = simulate(200, 1e-6, 0.1, 0.85);
        let fitter = GarchFitter {
            max_iterations: 1,
            ..Default::default()
        };
        assert_eq!(
            fitter.fit(&data).unwrap_err(),
            GarchError::NotConverged { iterations: 1 }
        );
    }

    #[test]
    fn constant_input_is_zero_variance() {
        let data = vec![0.003; 50];
        assert_eq!(
            GarchFitter::default().fit(&data).unwrap_err(),
            GarchError::ZeroVariance
        );
    }

    #[test]
    fn zero_and_rounding_level_spread_are_zero_variance() {
        let fitter = GarchFitter::default();
        assert_eq!(fitter.fit(&[0.0; 40]).unwrap_err(), GarchError::ZeroVariance);

        let mut data = vec![0.25; 40];
        data[7] += 1e-15;
        assert_eq!(fitter.fit(&data).unwrap_err(), GarchError::ZeroVariance);
    }

    #[test]
    fn too_few_observations() {
        assert!(matches!(
            GarchFitter::default().fit(&[0.1, -0.1]),
            Err(GarchError::TooFewObservations { observations: 2, .. })
        ));
    }

    #[test]
    fn backcast_weights_recent_less() {
        // Equal squared deviations give the same backcast regardless of weights.
        assert!((backcast(&[0.5, -0.5, 0.5]) - 0.25).abs() < 1e-12);
        // First observation carries the largest weight.
        assert!(backcast(&[1.0, 0.0, 0.0]) > backcast(&[0.0, 0.0, 1.0]));
    }

    #[test]
    fn variance_recursion() {
        let params = GarchParams {
            mu: 0.0,
            omega: 0.1,
            alpha: 0.2,
            beta: 0.5,
        };
        let s2 = conditional_variance(&params, &[1.0, 2.0], 1.0);
        assert!((s2[0] - (0.1 + 0.2 + 0.5)).abs() < 1e-12);
        assert!((s2[1] - (0.1 + 0.2 * 1.0 + 0.5 * 0.8)).abs() < 1e-12);
    }
}
