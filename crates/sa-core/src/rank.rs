//! Best-pair selection over screen output.

use rustc_hash::FxHashSet;

use crate::config::RankingConfig;
use crate::pipeline::{PairTimeseries, ZScoreParam};
use crate::signal::SignalRecord;

/// Fields the ranking criteria look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey {
    pub zscore: f64,
    pub pvalue: f64,
    pub adf_pvalue: f64,
    pub correlation: f64,
}

/// Something that can be ranked: two tickers and a score.
pub trait Rankable {
    fn tickers(&self) -> (&str, &str);
    /// `None` removes the item from the ranking.
    fn key(&self) -> Option<RankKey>;
}

impl Rankable for SignalRecord {
    fn tickers(&self) -> (&str, &str) {
        (&self.long_ticker, &self.short_ticker)
    }

    fn key(&self) -> Option<RankKey> {
        Some(RankKey {
            zscore: self.zscore,
            pvalue: self.pvalue,
            adf_pvalue: self.adf_pvalue,
            correlation: self.correlation,
        })
    }
}

impl Rankable for PairTimeseries {
    fn tickers(&self) -> (&str, &str) {
        (&self.long_ticker, &self.short_ticker)
    }

    /// Scored on the last walk-forward point.
    fn key(&self) -> Option<RankKey> {
        self.zscore_params.last().map(|p: &ZScoreParam| RankKey {
            zscore: p.zscore,
            pvalue: p.pvalue,
            adf_pvalue: p.adfpvalue,
            correlation: p.correlation,
        })
    }
}

impl RankingConfig {
    /// Absent criteria pass.
    pub fn admits(&self, key: &RankKey) -> bool {
        let z = if self.by_abs_zscore { key.zscore.abs() } else { key.zscore };
        self.min_zscore.map_or(true, |m| z >= m)
            && self.max_pvalue.map_or(true, |m| key.pvalue <= m)
            && self.max_adf_pvalue.map_or(true, |m| key.adf_pvalue <= m)
            && self.min_correlation.map_or(true, |m| key.correlation.abs() >= m)
    }

    fn score(&self, key: &RankKey) -> f64 {
        if self.by_abs_zscore {
            key.zscore.abs()
        } else {
            key.zscore
        }
    }
}

/// Greedy selection: take the best-scoring item, drop everything sharing a
/// ticker with it, repeat until `top_n` items are chosen. Equal scores keep
/// input order.
pub fn select<T: Rankable>(items: Vec<T>, cfg: &RankingConfig) -> Vec<T> {
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .filter_map(|it| {
            let key = it.key()?;
            let score = cfg.score(&key);
            (score.is_finite() && cfg.admits(&key)).then_some((score, it))
        })
        .collect();
    // Stable, so ties stay in enumeration order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::with_capacity(cfg.top_n.min(scored.len()));
    for (_, item) in scored {
        if out.len() >= cfg.top_n {
            break;
        }
        let (a, b) = item.tickers();
        if used.contains(a) || used.contains(b) {
            continue;
        }
        used.insert(a.to_string());
        used.insert(b.to_string());
        out.push(item);
    }
    out
}

pub fn rank_signals(records: Vec<SignalRecord>, cfg: &RankingConfig) -> Vec<SignalRecord> {
    select(records, cfg)
}

/// `expected_points` gives the full walk-forward length of a pair
/// (`len - window_size`); shorter series are dropped under `complete_only`.
pub fn rank_series<F>(
    series: Vec<PairTimeseries>,
    cfg: &RankingConfig,
    expected_points: F,
) -> Vec<PairTimeseries>
where
    F: Fn(&PairTimeseries) -> usize,
{
    let kept: Vec<PairTimeseries> = if cfg.complete_only {
        series
            .into_iter()
            .filter(|s| s.zscore_params.len() == expected_points(s))
            .collect()
    } else {
        series
    };
    select(kept, cfg)
}
