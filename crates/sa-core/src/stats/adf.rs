//! Augmented Dickey-Fuller unit-root test with AIC lag selection.
//!
//! Test regression for lag order `p`:
//!
//! ```text
//! Δx[t] = γ·x[t-1] + Σ_{j=1..p} φ_j·Δx[t-j] (+ c) + ε[t]
//! ```
//!
//! The statistic is the t-value of γ. Lag selection fits every order up to
//! `maxlag` on a common sample and keeps the lowest AIC (smaller order on
//! ties); the chosen order is then refit on the longest available sample.

use nalgebra::{DMatrix, DVector};

use super::mackinnon::mackinnonp;
use super::ols;
use super::StatsError;

/// Deterministic terms in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regression {
    /// Constant only.
    Constant,
    /// No deterministic terms.
    NoConstant,
}

impl Regression {
    fn ntrend(self) -> usize {
        match self {
            Regression::Constant => 1,
            Regression::NoConstant => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfStat {
    pub statistic: f64,
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Schwert's rule `ceil(12 * (n/100)^(1/4))`, capped so the widest
/// regression still leaves degrees of freedom.
pub fn default_maxlag(nobs: usize, regression: Regression) -> Result<usize, StatsError> {
    let schwert = (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as i64;
    let cap = (nobs / 2) as i64 - regression.ntrend() as i64 - 1;
    let maxlag = schwert.min(cap);
    if maxlag < 0 {
        return Err(StatsError::TooShort {
            needed: 2 * (regression.ntrend() + 1),
            got: nobs,
        });
    }
    Ok(maxlag as usize)
}

#[derive(Debug, Clone, Copy)]
enum ConstPos {
    First,
    Last,
}

/// Regression rows for lag order `lags`: target `Δx[t]`, regressors
/// `x[t-1]` and `Δx[t-1] .. Δx[t-lags]`, optionally with a constant column.
fn design(
    x: &[f64],
    xdiff: &[f64],
    lags: usize,
    constant: Option<ConstPos>,
) -> (DMatrix<f64>, DVector<f64>) {
    let rows = xdiff.len() - lags;
    let ncols = 1 + lags + usize::from(constant.is_some());
    let offset = usize::from(matches!(constant, Some(ConstPos::First)));
    let mut m = DMatrix::zeros(rows, ncols);
    for r in 0..rows {
        let t = lags + r;
        m[(r, offset)] = x[t];
        for j in 1..=lags {
            m[(r, offset + j)] = xdiff[t - j];
        }
        match constant {
            Some(ConstPos::First) => m[(r, 0)] = 1.0,
            Some(ConstPos::Last) => m[(r, ncols - 1)] = 1.0,
            None => {}
        }
    }
    let y = DVector::from_iterator(rows, xdiff[lags..].iter().copied());
    (m, y)
}

/// ADF statistic with AIC-selected lag order.
pub fn adf_statistic(x: &[f64], regression: Regression) -> Result<AdfStat, StatsError> {
    let nobs = x.len();
    if nobs < 3 {
        return Err(StatsError::TooShort { needed: 3, got: nobs });
    }
    if super::is_constant(x) {
        return Err(StatsError::ConstantInput);
    }
    if !x.iter().all(|v| v.is_finite()) {
        return Err(StatsError::NonFinite);
    }

    let maxlag = default_maxlag(nobs, regression)?;
    let xdiff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let ntrend = regression.ntrend();

    // Autolag: all candidate orders share the sample fixed by maxlag.
    let best_lag = if maxlag == 0 {
        0
    } else {
        let full_const = (ntrend == 1).then_some(ConstPos::First);
        let (full_x, y) = design(x, &xdiff, maxlag, full_const);
        let start = ntrend + 1;
        let mut best: Option<(f64, usize)> = None;
        for ncols in start..=start + maxlag {
            let sub = full_x.columns(0, ncols).into_owned();
            let aic = match ols::fit(&sub, &y) {
                Ok(f) => f.aic(),
                Err(StatsError::Singular) if ncols > start => continue,
                Err(e) => return Err(e),
            };
            if aic.is_nan() {
                continue;
            }
            if best.map_or(true, |(b, _)| aic < b) {
                best = Some((aic, ncols));
            }
        }
        let (_, ncols) = best.ok_or(StatsError::NonFinite)?;
        ncols - start
    };

    let final_const = (ntrend == 1).then_some(ConstPos::Last);
    let (xm, y) = design(x, &xdiff, best_lag, final_const);
    let fit = ols::fit(&xm, &y)?;
    let statistic = fit.tvalue(0);
    if statistic.is_nan() {
        return Err(StatsError::NonFinite);
    }
    Ok(AdfStat {
        statistic,
        used_lag: best_lag,
        nobs: fit.nobs,
    })
}

/// ADF test with a constant term and its MacKinnon p-value.
pub fn adfuller(x: &[f64]) -> Result<AdfResult, StatsError> {
    let s = adf_statistic(x, Regression::Constant)?;
    Ok(AdfResult {
        statistic: s.statistic,
        pvalue: mackinnonp(s.statistic, 1),
        used_lag: s.used_lag,
        nobs: s.nobs,
    })
}
