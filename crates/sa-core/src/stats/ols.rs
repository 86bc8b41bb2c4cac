use nalgebra::{DMatrix, DVector};

use super::{mean, StatsError};

/// Column whose residual norm (after projecting out earlier columns) falls
/// below this fraction of its own norm is treated as linearly dependent.
const RANK_TOL: f64 = 1e-12;

/// Intercept and slope of `y = alpha + beta * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionResult {
    pub alpha: f64,
    pub beta: f64,
}

impl RegressionResult {
    #[inline]
    pub fn fitted(&self, x: f64) -> f64 {
        self.beta * x + self.alpha
    }
}

/// Two-variable OLS with intercept, closed form.
///
/// No regularisation: near-collinear windows may produce a very large slope
/// and that is returned as-is. An exactly constant regressor has no unique
/// solution and yields `None`.
pub fn hedge_ratio(x: &[f64], y: &[f64]) -> Option<RegressionResult> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        sxy += dx * (yi - my);
        sxx += dx * dx;
    }
    if sxx <= 0.0 {
        return None;
    }
    let beta = sxy / sxx;
    let alpha = my - beta * mx;
    (alpha.is_finite() && beta.is_finite()).then_some(RegressionResult { alpha, beta })
}

/// Result of a general least-squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: DVector<f64>,
    /// Standard errors of `params`.
    pub bse: DVector<f64>,
    pub resid: DVector<f64>,
    pub ssr: f64,
    /// Centered R²; only meaningful when the design carries an intercept.
    pub rsquared: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn k(&self) -> usize {
        self.params.len()
    }

    pub fn tvalue(&self, i: usize) -> f64 {
        self.params[i] / self.bse[i]
    }

    /// Gaussian log-likelihood at the ML variance estimate `ssr / n`.
    pub fn llf(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every column as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.llf() + 2.0 * self.k() as f64
    }
}

/// Ordinary least squares of `y` on the columns of `x`, via the normal
/// equations and a Cholesky factorisation.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, StatsError> {
    let (n, k) = x.shape();
    if y.len() != n {
        return Err(StatsError::TooShort { needed: n, got: y.len() });
    }
    if n <= k {
        return Err(StatsError::TooShort { needed: k + 1, got: n });
    }

    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let chol = xtx.clone().cholesky().ok_or(StatsError::Singular)?;
    let l = chol.l();
    for i in 0..k {
        let own = xtx[(i, i)];
        if own <= 0.0 || l[(i, i)] * l[(i, i)] < RANK_TOL * own {
            return Err(StatsError::Singular);
        }
    }

    let params = chol.solve(&xty);
    let resid = y - x * &params;
    let ssr = resid.dot(&resid);
    let scale = ssr / (n - k) as f64;
    let cov = chol.inverse();
    let bse = DVector::from_iterator(k, (0..k).map(|i| (cov[(i, i)] * scale).sqrt()));

    let ybar = y.mean();
    let tss: f64 = y.iter().map(|v| (v - ybar) * (v - ybar)).sum();
    let rsquared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };

    if !params.iter().all(|p| p.is_finite()) || !ssr.is_finite() {
        return Err(StatsError::NonFinite);
    }

    Ok(OlsFit {
        params,
        bse,
        resid,
        ssr,
        rsquared,
        nobs: n,
    })
}
