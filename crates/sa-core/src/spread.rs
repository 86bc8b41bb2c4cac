use tracing::debug;

use crate::config::SpreadModel;
use crate::reject::RejectReason;
use crate::stats::adf::adfuller;
use crate::stats::ols::{hedge_ratio, RegressionResult};
use crate::stats::{mean, std_pop};

/// Spread statistics at one evaluation bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadStats {
    /// Spread at the evaluation bar (out of sample).
    pub spread: f64,
    pub mean: f64,
    pub std: f64,
    pub zscore: f64,
    pub adf_pvalue: f64,
    /// Hedge regression; `None` for [`SpreadModel::Raw`].
    pub regression: Option<RegressionResult>,
}

/// Why a bar could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadError {
    /// Fewer than `window + 1` bars up to and including the evaluation index.
    InsufficientHistory,
    /// The window regressor is constant, so no hedge ratio exists.
    NoHedgeRatio,
}

impl From<SpreadError> for RejectReason {
    fn from(e: SpreadError) -> Self {
        match e {
            SpreadError::InsufficientHistory => RejectReason::InsufficientHistory,
            SpreadError::NoHedgeRatio => RejectReason::NoHedgeRatio,
        }
    }
}

/// `(x - mean) / std`, or exactly `0.0` when the window has no dispersion.
#[inline]
pub fn zscore(x: f64, mean: f64, std: f64) -> f64 {
    if std > 0.0 {
        (x - mean) / std
    } else {
        0.0
    }
}

/// p-value of an ADF test (constant term) on `spread`; `1.0` when the test
/// cannot run (constant or too-short window, singular design).
pub fn adf_pvalue(spread: &[f64]) -> f64 {
    match adfuller(spread) {
        Ok(r) if !r.pvalue.is_nan() => r.pvalue,
        Ok(_) => 1.0,
        Err(e) => {
            debug!(error = %e, "adf on spread window failed");
            1.0
        }
    }
}

/// Evaluate the spread of `(first, second)` at bar `i`.
///
/// The hedge ratio, mean and deviation come from the trailing window
/// `[i - window, i)`; the spread itself is taken at `i`, outside the window.
pub fn evaluate(
    first: &[f64],
    second: &[f64],
    window: usize,
    i: usize,
    model: SpreadModel,
) -> Result<SpreadStats, SpreadError> {
    if window == 0 || i < window || i >= first.len() || i >= second.len() {
        return Err(SpreadError::InsufficientHistory);
    }
    let wa = &first[i - window..i];
    let wb = &second[i - window..i];

    let (series, current, regression): (Vec<f64>, f64, Option<RegressionResult>) = match model {
        SpreadModel::Regression => {
            let reg = hedge_ratio(wa, wb).ok_or(SpreadError::NoHedgeRatio)?;
            let s = wa.iter().zip(wb).map(|(a, b)| b - reg.fitted(*a)).collect();
            (s, second[i] - reg.fitted(first[i]), Some(reg))
        }
        SpreadModel::Raw => {
            let s = wa.iter().zip(wb).map(|(a, b)| a - b).collect();
            (s, first[i] - second[i], None)
        }
    };

    let m = mean(&series);
    let sd = std_pop(&series);
    Ok(SpreadStats {
        spread: current,
        mean: m,
        std: sd,
        zscore: zscore(current, m, sd),
        adf_pvalue: adf_pvalue(&series),
        regression,
    })
}

/// Evaluate at the last bar.
pub fn evaluate_latest(
    first: &[f64],
    second: &[f64],
    window: usize,
    model: SpreadModel,
) -> Result<SpreadStats, SpreadError> {
    let n = first.len().min(second.len());
    if n == 0 {
        return Err(SpreadError::InsufficientHistory);
    }
    evaluate(first, second, window, n - 1, model)
}
