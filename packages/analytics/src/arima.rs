//! ARIMA(p, d, q) estimation and forecasting.
//!
//! The model has three parts:
//!
//! - **I**: the series is differenced `d` times.
//! - **AR**: each differenced value depends linearly on the previous `p`.
//! - **MA**: and on the previous `q` one-step prediction errors.
//!
//! Parameters are estimated by exact Gaussian maximum likelihood. The
//! likelihood comes from a Kalman filter over the state-space form of the
//! ARMA model, started from the stationary covariance, so every
//! observation of the differenced series contributes. The innovation
//! variance is concentrated out and the remaining parameters are found
//! with [`nelder_mead`], started from a conditional sum-of-squares fit.
//! The optimizer works on unconstrained values that are mapped through
//! partial autocorrelations onto the stationary (AR) and invertible (MA)
//! region, so every candidate it tries is a well-behaved model.
//!
//! A constant (the mean of the differenced series) is estimated only when
//! `d == 0`; with differencing the differenced mean is taken as zero.

use malaria_forecast_analytics_models::{ArimaOrder, ModelFit};

use crate::AnalyticsError;
use crate::optimization::{NelderMeadConfig, nelder_mead};

/// Partial autocorrelations are kept inside this bound when seeding the
/// optimizer.
const PACF_START_BOUND: f64 = 0.95;

/// An unfitted ARIMA model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arima {
    order: ArimaOrder,
}

/// An estimated model that can produce forecasts.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedArima {
    model: ModelFit,
    mean: f64,
    /// Last value of the series at each differencing level `0..d`.
    level_tails: Vec<f64>,
    /// Predicted state after the last observation.
    state: Vec<f64>,
}

/// Unpacked parameter vector.
struct Params {
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

/// Result of running the Kalman filter over a series.
struct KalmanOutput {
    /// Sum of squared innovations, each divided by its variance.
    weighted_squares: f64,
    /// Sum of the log innovation variances.
    log_variances: f64,
    /// Predicted state for the step after the last observation.
    state: Vec<f64>,
}

impl Arima {
    /// Creates a model with the given orders.
    #[must_use]
    pub const fn new(order: ArimaOrder) -> Self {
        Self { order }
    }

    /// The model orders.
    #[must_use]
    pub const fn order(&self) -> ArimaOrder {
        self.order
    }

    const fn has_constant(&self) -> bool {
        self.order.d == 0
    }

    /// Minimum number of observations needed to fit this model.
    #[must_use]
    pub fn min_observations(&self) -> usize {
        let ArimaOrder { p, d, q } = self.order;
        (p + q + usize::from(self.has_constant()) + 1).max(2) + d
    }

    /// Estimates the model on `series`.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::EmptySeries`] if `series` is empty.
    /// * [`AnalyticsError::InsufficientData`] if there are fewer than
    ///   [`Self::min_observations`] values.
    /// * [`AnalyticsError::ModelFit`] if the data contains non-finite
    ///   values or the likelihood cannot be evaluated at the optimum.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(
        &self,
        series: &[f64],
        config: &NelderMeadConfig,
    ) -> Result<FittedArima, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptySeries);
        }
        let required = self.min_observations();
        if series.len() < required {
            return Err(AnalyticsError::InsufficientData {
                order: self.order.to_string(),
                required,
                actual: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ModelFit {
                message: "series contains NaN or infinite values".to_string(),
            });
        }

        let ArimaOrder { p, d, q } = self.order;
        let (differenced, level_tails) = difference(series, d);
        let n = differenced.len() as f64;

        let css_objective = |x: &[f64]| {
            let params = self.unpack(x);
            let residuals = css_residuals(&differenced, &params);
            residuals[p..].iter().map(|e| e * e).sum::<f64>()
        };
        let css = nelder_mead(css_objective, &self.initial_params(&differenced), config);
        log::debug!(
            "ARIMA{} CSS start found after {} iterations",
            self.order,
            css.iterations
        );

        let ml_objective = |x: &[f64]| {
            let params = self.unpack(x);
            kalman_filter(&differenced, &params)
                .map_or(f64::INFINITY, |out| profile_deviance(&out, n))
        };
        let result = nelder_mead(ml_objective, &css.point, config);
        if !result.converged {
            log::warn!(
                "ARIMA{} optimizer stopped after {} iterations without converging",
                self.order,
                result.iterations
            );
        }

        let params = self.unpack(&result.point);
        let filtered = kalman_filter(&differenced, &params)
            .filter(|out| out.weighted_squares.is_finite() && out.log_variances.is_finite())
            .ok_or_else(|| AnalyticsError::ModelFit {
                message: format!("likelihood is not finite for ARIMA{}", self.order),
            })?;

        // A perfect fit (e.g. a constant series) keeps a finite likelihood.
        let sigma2 = (filtered.weighted_squares / n).max(f64::MIN_POSITIVE);
        let log_likelihood = -0.5
            * n.mul_add(
                (2.0 * std::f64::consts::PI * sigma2).ln() + 1.0,
                filtered.log_variances,
            );
        let k = (usize::from(self.has_constant()) + p + q + 1) as f64;

        log::debug!(
            "Fitted ARIMA{}: ar={:?} ma={:?} sigma2={sigma2:.4} llf={log_likelihood:.4}",
            self.order,
            params.ar,
            params.ma
        );

        Ok(FittedArima {
            model: ModelFit {
                order: self.order,
                constant: self.has_constant().then_some(params.mean),
                ar: params.ar,
                ma: params.ma,
                sigma2,
                log_likelihood,
                aic: 2.0f64.mul_add(k, -2.0 * log_likelihood),
                bic: k.mul_add(n.ln(), -2.0 * log_likelihood),
                n_obs: differenced.len(),
                iterations: css.iterations + result.iterations,
                converged: result.converged,
            },
            mean: params.mean,
            level_tails,
            state: filtered.state,
        })
    }

    /// Starting point for the optimizer: sample mean, Yule–Walker partial
    /// autocorrelations for AR, zero for MA.
    fn initial_params(&self, differenced: &[f64]) -> Vec<f64> {
        let ArimaOrder { p, q, .. } = self.order;
        let mut start = Vec::with_capacity(usize::from(self.has_constant()) + p + q);
        if self.has_constant() {
            start.push(mean(differenced));
        }
        start.extend(
            partial_autocorrelations(differenced, p)
                .into_iter()
                .map(|r| unconstrain(r.clamp(-PACF_START_BOUND, PACF_START_BOUND))),
        );
        start.extend(std::iter::repeat_n(0.0, q));
        start
    }

    fn unpack(&self, x: &[f64]) -> Params {
        let ArimaOrder { p, q, .. } = self.order;
        let (mean, rest) = if self.has_constant() {
            (x[0], &x[1..])
        } else {
            (0.0, x)
        };
        let ar_pacf: Vec<f64> = rest[..p].iter().map(|&v| constrain(v)).collect();
        let ma_pacf: Vec<f64> = rest[p..p + q].iter().map(|&v| constrain(v)).collect();
        let ar = coefficients_from_pacf(&ar_pacf);
        let ma = coefficients_from_pacf(&ma_pacf)
            .into_iter()
            .map(|c| -c)
            .collect();
        Params { mean, ar, ma }
    }
}

impl FittedArima {
    /// Estimated parameters and fit statistics.
    #[must_use]
    pub const fn model(&self) -> &ModelFit {
        &self.model
    }

    /// Consumes the fit, returning its [`ModelFit`].
    #[must_use]
    pub fn into_model(self) -> ModelFit {
        self.model
    }

    /// Produces `steps` point forecasts on the original scale.
    ///
    /// Future innovations are set to zero; the filtered state is carried
    /// forward on the differenced scale and then integrated back `d`
    /// times.
    #[must_use]
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let mut state = self.state.clone();
        let mut values = Vec::with_capacity(steps);
        for _ in 0..steps {
            values.push(self.mean + state[0]);
            state = advance(&self.model.ar, &state);
        }
        integrate(&values, &self.level_tails)
    }
}

/// Differences `series` `d` times.
///
/// Returns the differenced series and the last value at each level
/// `0..d`, which [`integrate`] needs to undo the differencing.
#[must_use]
pub fn difference(series: &[f64], d: usize) -> (Vec<f64>, Vec<f64>) {
    let mut current = series.to_vec();
    let mut tails = Vec::with_capacity(d);
    for _ in 0..d {
        tails.push(current.last().copied().unwrap_or_default());
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    (current, tails)
}

/// Undoes [`difference`] for values that continue the differenced series.
#[must_use]
pub fn integrate(differenced: &[f64], tails: &[f64]) -> Vec<f64> {
    let mut values = differenced.to_vec();
    for &last in tails.iter().rev() {
        let mut acc = last;
        for v in &mut values {
            acc += *v;
            *v = acc;
        }
    }
    values
}

/// Residuals of the conditional recursion. Errors before index `p` are
/// fixed at zero.
fn css_residuals(w: &[f64], params: &Params) -> Vec<f64> {
    let p = params.ar.len();
    let mut errors = vec![0.0; w.len()];
    for t in p..w.len() {
        let ar_part: f64 = params
            .ar
            .iter()
            .enumerate()
            .map(|(i, phi)| phi * (w[t - 1 - i] - params.mean))
            .sum();
        let ma_part: f64 = params
            .ma
            .iter()
            .enumerate()
            .filter(|(j, _)| *j < t)
            .map(|(j, theta)| theta * errors[t - 1 - j])
            .sum();
        errors[t] = w[t] - params.mean - ar_part - ma_part;
    }
    errors
}

/// `-2 * log-likelihood` with the innovation variance concentrated out,
/// up to an additive constant.
fn profile_deviance(out: &KalmanOutput, n: f64) -> f64 {
    n.mul_add(
        (out.weighted_squares.max(f64::MIN_POSITIVE) / n).ln(),
        out.log_variances,
    )
}

/// Runs the Kalman filter for an ARMA model (unit innovation variance)
/// over `w`.
///
/// The state has `r = max(p, q + 1)` elements, with transition
/// `(T x)_i = phi_i x_0 + x_{i+1}` and noise loading `[1, theta_1, ..]`.
/// Returns `None` if the stationary covariance cannot be computed or an
/// innovation variance is not positive.
fn kalman_filter(w: &[f64], params: &Params) -> Option<KalmanOutput> {
    let r = params.ar.len().max(params.ma.len() + 1);
    let mut loading = vec![0.0; r];
    loading[0] = 1.0;
    loading[1..=params.ma.len()].copy_from_slice(&params.ma);

    let mut cov = stationary_covariance(&params.ar, &loading)?;
    let mut state = vec![0.0; r];
    let mut weighted_squares = 0.0;
    let mut log_variances = 0.0;

    for &y in w {
        let f = cov[0][0];
        if !(f.is_finite() && f > 0.0) {
            return None;
        }
        let v = y - params.mean - state[0];
        weighted_squares += v * v / f;
        log_variances += f.ln();

        let gain: Vec<f64> = cov.iter().map(|row| row[0]).collect();
        for (s, g) in state.iter_mut().zip(&gain) {
            *s += g * v / f;
        }
        for (row, gi) in cov.iter_mut().zip(&gain) {
            for (c, gj) in row.iter_mut().zip(&gain) {
                *c -= gi * gj / f;
            }
        }

        state = advance(&params.ar, &state);
        cov = propagate(&params.ar, &cov, &loading);
    }

    Some(KalmanOutput {
        weighted_squares,
        log_variances,
        state,
    })
}

/// Applies the state transition: `(T x)_i = phi_i x_0 + x_{i+1}`.
fn advance(ar: &[f64], x: &[f64]) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            ar.get(i)
                .copied()
                .unwrap_or_default()
                .mul_add(x[0], x.get(i + 1).copied().unwrap_or_default())
        })
        .collect()
}

/// Returns `T P T' + R R'`.
fn propagate(ar: &[f64], cov: &[Vec<f64>], loading: &[f64]) -> Vec<Vec<f64>> {
    let r = cov.len();
    let t_cov_columns: Vec<Vec<f64>> = (0..r)
        .map(|j| {
            let column: Vec<f64> = cov.iter().map(|row| row[j]).collect();
            advance(ar, &column)
        })
        .collect();
    (0..r)
        .map(|i| {
            let row: Vec<f64> = t_cov_columns.iter().map(|c| c[i]).collect();
            advance(ar, &row)
                .into_iter()
                .zip(loading)
                .map(|(v, rj)| loading[i].mul_add(*rj, v))
                .collect()
        })
        .collect()
}

/// Solves `P = T P T' + R R'` for the unconditional state covariance.
fn stationary_covariance(ar: &[f64], loading: &[f64]) -> Option<Vec<Vec<f64>>> {
    let r = loading.len();
    let transition: Vec<Vec<f64>> = (0..r)
        .map(|k| {
            let mut unit = vec![0.0; r];
            unit[k] = 1.0;
            advance(ar, &unit)
        })
        .collect();
    // transition[k][i] is T[i][k].
    let m = r * r;
    let mut system = vec![vec![0.0; m]; m];
    let mut rhs = vec![0.0; m];
    for i in 0..r {
        for j in 0..r {
            let row = i * r + j;
            rhs[row] = loading[i] * loading[j];
            system[row][row] += 1.0;
            for k in 0..r {
                for l in 0..r {
                    system[row][k * r + l] -= transition[k][i] * transition[l][j];
                }
            }
        }
    }
    let vec_cov = solve_linear(system, rhs)?;
    Some(vec_cov.chunks(r).map(<[f64]>::to_vec).collect())
}

/// Gaussian elimination with partial pivoting. `None` for a singular
/// system.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            let (upper, lower) = a.split_at_mut(row);
            for (x, p) in lower[0][col..].iter_mut().zip(&upper[col][col..]) {
                *x -= factor * p;
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

/// Maps a real number into `(-1, 1)`.
fn constrain(x: f64) -> f64 {
    x / x.mul_add(x, 1.0).sqrt()
}

/// Inverse of [`constrain`] for `|r| < 1`.
fn unconstrain(r: f64) -> f64 {
    r / r.mul_add(-r, 1.0).sqrt()
}

/// Converts partial autocorrelations into AR coefficients with the
/// Durbin–Levinson recursion. Any sequence inside `(-1, 1)` yields a
/// stationary polynomial.
#[must_use]
pub fn coefficients_from_pacf(pacf: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(pacf.len());
    for (k, &r) in pacf.iter().enumerate() {
        let mut next: Vec<f64> = (0..k).map(|j| phi[j] - r * phi[k - 1 - j]).collect();
        next.push(r);
        phi = next;
    }
    phi
}

/// Sample partial autocorrelations at lags `1..=max_lag` (Durbin–Levinson
/// on the biased autocovariances).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn partial_autocorrelations(series: &[f64], max_lag: usize) -> Vec<f64> {
    let mut pacf = vec![0.0; max_lag];
    let n = series.len();
    if max_lag == 0 || n < 2 {
        return pacf;
    }

    let m = mean(series);
    let acov: Vec<f64> = (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            series[k..]
                .iter()
                .zip(series)
                .map(|(a, b)| (a - m) * (b - m))
                .sum::<f64>()
                / n as f64
        })
        .collect();

    if acov[0] <= f64::EPSILON {
        return pacf;
    }

    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);
    let mut variance = acov[0];
    for k in 0..max_lag {
        let numerator = acov[k + 1]
            - phi
                .iter()
                .enumerate()
                .map(|(j, c)| c * acov[k - j])
                .sum::<f64>();
        let kappa = (numerator / variance).clamp(-1.0, 1.0);
        pacf[k] = kappa;

        let mut next: Vec<f64> = (0..k).map(|j| phi[j] - kappa * phi[k - 1 - j]).collect();
        next.push(kappa);
        phi = next;

        variance *= kappa.mul_add(-kappa, 1.0);
        if variance <= f64::EPSILON {
            break;
        }
    }
    pacf
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic noise in `[-1, 1)`.
    struct Lcg(u64);

    impl Lcg {
        #[allow(clippy::cast_precision_loss)]
        fn sample(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((self.0 >> 11) as f64 / (1_u64 << 53) as f64).mul_add(2.0, -1.0)
        }
    }

    fn ar1_series(phi: f64, n: usize) -> Vec<f64> {
        let mut rng = Lcg(42);
        let mut y = Vec::with_capacity(n);
        let mut prev = 0.0;
        for _ in 0..n + 50 {
            prev = phi.mul_add(prev, rng.sample());
            y.push(prev);
        }
        y.split_off(50)
    }

    fn ma1_series(theta: f64, n: usize) -> Vec<f64> {
        let mut rng = Lcg(7);
        let mut prev = rng.sample();
        (0..n)
            .map(|_| {
                let e = rng.sample();
                let y = theta.mul_add(prev, e);
                prev = e;
                y
            })
            .collect()
    }

    fn params(mean: f64, ar: &[f64], ma: &[f64]) -> Params {
        Params {
            mean,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
        }
    }

    #[test]
    fn kalman_likelihood_matches_exact_ar1() {
        let phi: f64 = 0.6;
        let y = [0.8, -0.3, 1.1, 0.4, -0.9, 0.2];
        let out = kalman_filter(&y, &params(0.0, &[phi], &[])).unwrap();

        let start_variance = 1.0 / phi.mul_add(-phi, 1.0);
        let squares = y[0] * y[0] / start_variance
            + y.windows(2)
                .map(|w| (w[1] - phi * w[0]).powi(2))
                .sum::<f64>();
        assert!((out.weighted_squares - squares).abs() < 1e-12);
        assert!((out.log_variances - start_variance.ln()).abs() < 1e-12);
        assert!((out.state[0] - phi * y[5]).abs() < 1e-12);
    }

    #[test]
    fn kalman_first_innovation_of_ma1_has_full_variance() {
        let theta: f64 = 0.4;
        let out = kalman_filter(&[1.5], &params(0.0, &[], &[theta])).unwrap();
        let variance = theta.mul_add(theta, 1.0);
        assert!((out.log_variances - variance.ln()).abs() < 1e-12);
        assert!((out.weighted_squares - 1.5 * 1.5 / variance).abs() < 1e-12);
    }

    #[test]
    fn stationary_covariance_of_arma11() {
        let (phi, theta): (f64, f64) = (0.5, 0.3);
        let cov = stationary_covariance(&[phi], &[1.0, theta]).unwrap();
        let gamma0 = (2.0 * phi).mul_add(theta, theta.mul_add(theta, 1.0)) / phi.mul_add(-phi, 1.0);
        assert!((cov[0][0] - gamma0).abs() < 1e-12);
        assert!((cov[0][1] - cov[1][0]).abs() < 1e-12);
    }

    #[test]
    fn recovers_ma1_coefficient() {
        let series = ma1_series(0.5, 400);
        let fitted = Arima::new(ArimaOrder::new(0, 0, 1))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        let theta = fitted.model().ma[0];
        assert!((theta - 0.5).abs() < 0.15, "theta = {theta}");
        assert_eq!(fitted.model().n_obs, 400);
    }

    #[test]
    fn difference_and_integrate_invert() {
        let squares = [1.0, 4.0, 9.0, 16.0, 25.0];
        let (diff, tails) = difference(&squares, 2);
        assert_eq!(diff, [2.0, 2.0, 2.0]);
        assert_eq!(tails, [25.0, 9.0]);
        assert_eq!(integrate(&[2.0, 2.0], &tails), [36.0, 49.0]);
    }

    #[test]
    fn pacf_coefficients_are_stationary() {
        for &(a, b) in &[(3.0, -4.0), (-10.0, 10.0), (0.5, 0.5), (50.0, 50.0)] {
            let phi = coefficients_from_pacf(&[constrain(a), constrain(b)]);
            assert!(phi[1].abs() < 1.0, "{phi:?}");
            assert!(phi[0] + phi[1] < 1.0, "{phi:?}");
            assert!(phi[1] - phi[0] < 1.0, "{phi:?}");
        }
    }

    #[test]
    fn constrain_round_trips() {
        for &r in &[-0.9, -0.3, 0.0, 0.42, 0.95] {
            assert!((constrain(unconstrain(r)) - r).abs() < 1e-12);
        }
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let series = ar1_series(0.6, 400);
        let fitted = Arima::new(ArimaOrder::new(1, 0, 0))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        let phi = fitted.model().ar[0];
        assert!((phi - 0.6).abs() < 0.1, "phi = {phi}");
        assert!(fitted.model().constant.unwrap().abs() < 0.3);
        assert!(fitted.model().converged);
    }

    #[test]
    fn ma_coefficients_are_invertible() {
        let series = ar1_series(0.3, 200);
        let fitted = Arima::new(ArimaOrder::new(0, 0, 2))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        let theta = &fitted.model().ma;
        assert_eq!(theta.len(), 2);
        assert!(theta[1].abs() < 1.0);
        assert!(theta[0] + theta[1] > -1.0);
        assert!(theta[1] - theta[0] > -1.0);
    }

    #[test]
    fn random_walk_forecasts_last_value() {
        let series: Vec<f64> = (0..20).map(|t| f64::from(t) * 2.0 + 5.0).collect();
        let fitted = Arima::new(ArimaOrder::new(0, 1, 0))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        let forecast = fitted.forecast(3);
        assert_eq!(forecast.len(), 3);
        for v in forecast {
            assert!((v - 43.0).abs() < 1e-9);
        }
    }

    #[test]
    fn white_noise_forecasts_the_mean() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let fitted = Arima::new(ArimaOrder::new(0, 0, 0))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        for v in fitted.forecast(4) {
            assert!((v - 3.0).abs() < 1e-3, "{v}");
        }
        assert!((fitted.model().sigma2 - 2.0).abs() < 1e-3);
    }

    #[test]
    fn constant_series_fits_and_forecasts_flat() {
        let series = [4.0; 12];
        let fitted = Arima::new(ArimaOrder::new(1, 1, 1))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        assert!(fitted.model().log_likelihood.is_finite());
        for v in fitted.forecast(2) {
            assert!((v - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn forecast_length_matches_steps() {
        let series = ar1_series(0.5, 60);
        let fitted = Arima::new(ArimaOrder::new(2, 1, 1))
            .fit(&series, &NelderMeadConfig::default())
            .unwrap();
        assert_eq!(fitted.forecast(12).len(), 12);
        assert!(fitted.forecast(0).is_empty());
        assert!(fitted.forecast(5).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rejects_short_series() {
        let arima = Arima::new(ArimaOrder::new(1, 1, 1));
        assert_eq!(arima.min_observations(), 4);
        let err = arima
            .fit(&[1.0, 2.0, 3.0], &NelderMeadConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InsufficientData {
                required: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_and_non_finite_series() {
        let arima = Arima::new(ArimaOrder::new(0, 0, 0));
        assert!(matches!(
            arima.fit(&[], &NelderMeadConfig::default()),
            Err(AnalyticsError::EmptySeries)
        ));
        assert!(matches!(
            arima.fit(&[1.0, f64::NAN, 3.0], &NelderMeadConfig::default()),
            Err(AnalyticsError::ModelFit { .. })
        ));
    }

    #[test]
    fn information_criteria_penalize_parameters() {
        let fitted = Arima::new(ArimaOrder::new(1, 0, 0))
            .fit(&ar1_series(0.6, 100), &NelderMeadConfig::default())
            .unwrap();
        let model = fitted.model();
        // k = constant + phi + sigma2
        assert!((model.aic - (-2.0 * model.log_likelihood + 6.0)).abs() < 1e-9);
        assert!(model.bic > model.aic);
        assert_eq!(model.n_obs, 100);
    }
}
