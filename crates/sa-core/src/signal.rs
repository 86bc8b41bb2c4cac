use serde::{Deserialize, Serialize};

use crate::coint::CointResult;
use crate::config::SpreadModel;
use crate::reject::RejectReason;
use crate::series::PriceSeries;
use crate::spread::SpreadStats;

/// Entry signal for one pair at the latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub zscore: f64,
    /// Cointegration p-value.
    pub pvalue: f64,
    #[serde(rename = "adfpvalue")]
    pub adf_pvalue: f64,
    pub correlation: f64,
    pub spread: f64,
    pub mean: f64,
    pub std: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub long_ticker: String,
    pub short_ticker: String,
    pub long_ticker_price: f64,
    pub short_ticker_price: f64,
    pub timestamp: i64,
}

/// Which leg of `(first, second)` goes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongLeg {
    First,
    Second,
}

/// The undervalued leg goes long. The sign convention follows the spread
/// definition of each model:
///
/// * regression, `spread = second - fitted(first)`: `z > 0` means `second` is
///   rich, so `first` is long;
/// * raw, `spread = first - second`: `z > 0` means `first` is rich, so
///   `second` is long.
///
/// `z == 0` falls to the `z <= 0` branch.
pub fn long_leg(model: SpreadModel, zscore: f64) -> LongLeg {
    match (model, zscore > 0.0) {
        (SpreadModel::Regression, true) | (SpreadModel::Raw, false) => LongLeg::First,
        (SpreadModel::Regression, false) | (SpreadModel::Raw, true) => LongLeg::Second,
    }
}

// ---------------------------------------------------------------------------
// Gates (an absent optional threshold always passes)
// ---------------------------------------------------------------------------

pub fn correlation_gate(correlation: f64, min: Option<f64>) -> Result<(), RejectReason> {
    match min {
        Some(m) if !(correlation.abs() >= m) => Err(RejectReason::LowCorrelation),
        _ => Ok(()),
    }
}

pub fn cointegration_gate(coint: &CointResult) -> Result<(), RejectReason> {
    if coint.is_cointegrated {
        Ok(())
    } else {
        Err(RejectReason::NotCointegrated)
    }
}

pub fn adf_gate(adf_pvalue: f64, level: Option<f64>) -> Result<(), RejectReason> {
    match level {
        Some(l) if !(adf_pvalue <= l) => Err(RejectReason::NonStationarySpread),
        _ => Ok(()),
    }
}

/// Inclusive: `|z| == entry` passes.
pub fn magnitude_gate(zscore: f64, entry: f64) -> Result<(), RejectReason> {
    if zscore.abs() >= entry {
        Ok(())
    } else {
        Err(RejectReason::WeakZscore)
    }
}

/// A named leg of a pair.
#[derive(Debug, Clone, Copy)]
pub struct Leg<'a> {
    pub ticker: &'a str,
    pub series: &'a PriceSeries,
}

/// Apply the ADF and magnitude gates, assign roles and attach the latest
/// price of each leg plus the long leg's latest timestamp.
///
/// The correlation and cointegration gates run earlier in the pipeline
/// because they are cheaper than the spread analysis.
#[allow(clippy::too_many_arguments)]
pub fn build(
    first: Leg<'_>,
    second: Leg<'_>,
    model: SpreadModel,
    correlation: f64,
    coint: &CointResult,
    stats: &SpreadStats,
    zscore_entry: f64,
    adf_level: Option<f64>,
) -> Result<SignalRecord, RejectReason> {
    adf_gate(stats.adf_pvalue, adf_level)?;
    magnitude_gate(stats.zscore, zscore_entry)?;

    let (long, short) = match long_leg(model, stats.zscore) {
        LongLeg::First => (first, second),
        LongLeg::Second => (second, first),
    };
    let (long_price, long_ts, short_price) = match (
        long.series.last_close(),
        long.series.last_timestamp(),
        short.series.last_close(),
    ) {
        (Some(lp), Some(lt), Some(sp)) => (lp, lt, sp),
        _ => return Err(RejectReason::InsufficientHistory),
    };

    Ok(SignalRecord {
        zscore: stats.zscore,
        pvalue: coint.pvalue,
        adf_pvalue: stats.adf_pvalue,
        correlation,
        spread: stats.spread,
        mean: stats.mean,
        std: stats.std,
        alpha: stats.regression.map(|r| r.alpha),
        beta: stats.regression.map(|r| r.beta),
        long_ticker: long.ticker.to_string(),
        short_ticker: short.ticker.to_string(),
        long_ticker_price: long_price,
        short_ticker_price: short_price,
        timestamp: long_ts,
    })
}
