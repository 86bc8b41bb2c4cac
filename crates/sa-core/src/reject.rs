//! Per-pair rejection reasons and their per-run tally.

use serde::Serialize;

/// Why a pair produced no output. Stable names for downstream diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    // Data shape
    MissingSeries,
    LengthMismatch,
    InsufficientHistory,
    ZeroVariance,
    IdenticalSeries,

    // Gates
    LowCorrelation,
    NotCointegrated,
    NoHedgeRatio,
    NonStationarySpread,
    WeakZscore,
}

/// Counts of evaluated pairs and rejections by reason.
///
/// Each worker builds its own tally; the scheduler sums them at the join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectTally {
    pub evaluated: u64,
    pub accepted: u64,
    pub missing_series: u64,
    pub length_mismatch: u64,
    pub insufficient_history: u64,
    pub zero_variance: u64,
    pub identical_series: u64,
    pub low_correlation: u64,
    pub not_cointegrated: u64,
    pub no_hedge_ratio: u64,
    pub non_stationary_spread: u64,
    pub weak_zscore: u64,
}

impl RejectTally {
    pub fn record_accept(&mut self) {
        self.evaluated += 1;
        self.accepted += 1;
    }

    pub fn record(&mut self, reason: RejectReason) {
        self.evaluated += 1;
        *self.slot(reason) += 1;
    }

    pub fn count(&self, reason: RejectReason) -> u64 {
        match reason {
            RejectReason::MissingSeries => self.missing_series,
            RejectReason::LengthMismatch => self.length_mismatch,
            RejectReason::InsufficientHistory => self.insufficient_history,
            RejectReason::ZeroVariance => self.zero_variance,
            RejectReason::IdenticalSeries => self.identical_series,
            RejectReason::LowCorrelation => self.low_correlation,
            RejectReason::NotCointegrated => self.not_cointegrated,
            RejectReason::NoHedgeRatio => self.no_hedge_ratio,
            RejectReason::NonStationarySpread => self.non_stationary_spread,
            RejectReason::WeakZscore => self.weak_zscore,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.evaluated - self.accepted
    }

    pub fn merge(&mut self, other: &RejectTally) {
        self.evaluated += other.evaluated;
        self.accepted += other.accepted;
        self.missing_series += other.missing_series;
        self.length_mismatch += other.length_mismatch;
        self.insufficient_history += other.insufficient_history;
        self.zero_variance += other.zero_variance;
        self.identical_series += other.identical_series;
        self.low_correlation += other.low_correlation;
        self.not_cointegrated += other.not_cointegrated;
        self.no_hedge_ratio += other.no_hedge_ratio;
        self.non_stationary_spread += other.non_stationary_spread;
        self.weak_zscore += other.weak_zscore;
    }

    fn slot(&mut self, reason: RejectReason) -> &mut u64 {
        match reason {
            RejectReason::MissingSeries => &mut self.missing_series,
            RejectReason::LengthMismatch => &mut self.length_mismatch,
            RejectReason::InsufficientHistory => &mut self.insufficient_history,
            RejectReason::ZeroVariance => &mut self.zero_variance,
            RejectReason::IdenticalSeries => &mut self.identical_series,
            RejectReason::LowCorrelation => &mut self.low_correlation,
            RejectReason::NotCointegrated => &mut self.not_cointegrated,
            RejectReason::NoHedgeRatio => &mut self.no_hedge_ratio,
            RejectReason::NonStationarySpread => &mut self.non_stationary_spread,
            RejectReason::WeakZscore => &mut self.weak_zscore,
        }
    }
}
