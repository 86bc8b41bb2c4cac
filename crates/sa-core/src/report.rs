//! Serializable run output.

use serde::Serialize;

use crate::pipeline::{PairTimeseries, ScreenMode};
use crate::reject::RejectTally;
use crate::signal::SignalRecord;

/// Per-mode payload. Serializes as either `"signals": [..]` or `"series": [..]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenOutput {
    Signals(Vec<SignalRecord>),
    Series(Vec<PairTimeseries>),
}

impl ScreenOutput {
    pub fn len(&self) -> usize {
        match self {
            ScreenOutput::Signals(v) => v.len(),
            ScreenOutput::Series(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Full result of one screen run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenReport {
    pub account: String,
    pub mode: ScreenMode,
    pub pairs_total: usize,
    pub pairs_evaluated: u64,
    pub workers: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_chunks: Vec<usize>,
    #[serde(flatten)]
    pub output: ScreenOutput,
    pub rejections: RejectTally,
}

impl ScreenReport {
    pub fn signals(&self) -> &[SignalRecord] {
        match &self.output {
            ScreenOutput::Signals(v) => v,
            ScreenOutput::Series(_) => &[],
        }
    }

    pub fn series(&self) -> &[PairTimeseries] {
        match &self.output {
            ScreenOutput::Series(v) => v,
            ScreenOutput::Signals(_) => &[],
        }
    }

    /// Full envelope, or only the list when `bare`.
    pub fn to_json(&self, bare: bool) -> serde_json::Result<serde_json::Value> {
        if bare {
            match &self.output {
                ScreenOutput::Signals(v) => serde_json::to_value(v),
                ScreenOutput::Series(v) => serde_json::to_value(v),
            }
        } else {
            serde_json::to_value(self)
        }
    }
}
