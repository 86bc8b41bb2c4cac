//! End-to-end screen: source -> account config -> scheduler -> rank -> sink.

use tracing::info;

use crate::candle::RawCandleMap;
use crate::config::{AccountConfig, RankingConfig, Settings};
use crate::error::{Result, ScreenError};
use crate::pipeline::{PairScreen, ScreenMode};
use crate::rank::{rank_series, rank_signals};
use crate::report::{ScreenOutput, ScreenReport};
use crate::scheduler::{default_workers, enumerate_pairs, run_chunks, PairCandidate};
use crate::series::{extract_all, SeriesMap};

/// Provides the candle snapshot for one run.
pub trait CandleSource {
    fn load(&self) -> Result<RawCandleMap>;

    /// Label used in logs.
    fn describe(&self) -> String {
        "candle source".to_string()
    }
}

/// In-memory snapshot.
impl CandleSource for RawCandleMap {
    fn load(&self) -> Result<RawCandleMap> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory map ({} tickers)", self.len())
    }
}

/// Receives the finished report.
pub trait SignalSink {
    fn emit(&mut self, report: &ScreenReport) -> Result<()>;
}

/// Collects reports; used by tests and embedding callers.
impl SignalSink for Vec<ScreenReport> {
    fn emit(&mut self, report: &ScreenReport) -> Result<()> {
        self.push(report.clone());
        Ok(())
    }
}

/// Per-invocation knobs that are not part of the account config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: ScreenMode,
    /// Test-trade legs.
    pub long_ticker: Option<String>,
    pub short_ticker: Option<String>,
    /// Worker count override; defaults to [`default_workers`].
    pub threads: Option<usize>,
    /// Overrides `ranking.topN`, enabling ranking with defaults if the account
    /// has none.
    pub top_n: Option<usize>,
}

impl RunOptions {
    pub fn with_mode(mode: ScreenMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Load, screen and emit. Returns the report handed to `sink`.
pub fn run<S, K>(
    source: &S,
    settings: &Settings,
    account: &str,
    opts: &RunOptions,
    sink: &mut K,
) -> Result<ScreenReport>
where
    S: CandleSource + ?Sized,
    K: SignalSink + ?Sized,
{
    let raw = source.load()?;
    if raw.is_empty() {
        return Err(ScreenError::MissingInput(format!(
            "candle map from {} is empty",
            source.describe()
        )));
    }
    let cfg = settings.account(account)?;
    info!(account, source = %source.describe(), tickers = raw.len(), mode = ?opts.mode, "screen start");

    let report = screen(&raw, &cfg, account, opts)?;
    info!(
        account,
        pairs = report.pairs_total,
        evaluated = report.pairs_evaluated,
        emitted = report.output.len(),
        workers = report.workers,
        rejected = report.rejections.rejected(),
        "screen done"
    );
    sink.emit(&report)?;
    Ok(report)
}

/// Pure screening step on an already-resolved config.
pub fn screen(
    raw: &RawCandleMap,
    cfg: &AccountConfig,
    account: &str,
    opts: &RunOptions,
) -> Result<ScreenReport> {
    let series = extract_all(raw);
    let pairs_view = PairScreen::new(&series, cfg);
    let workers = opts.threads.unwrap_or_else(default_workers).max(1);
    let tolerate = cfg.tolerate_worker_failures;
    let ranking = effective_ranking(cfg, opts);

    let (pairs, sched_workers, failed, output, tally) = match opts.mode {
        ScreenMode::Signals => {
            let pairs = universe(&series, cfg);
            let run = run_chunks(&pairs, workers, tolerate, |a, b| pairs_view.signal(a, b))?;
            let signals = match &ranking {
                Some(r) => rank_signals(run.results, r),
                None => run.results,
            };
            (pairs, run.workers, run.failed_chunks, ScreenOutput::Signals(signals), run.tally)
        }
        ScreenMode::Timeseries => {
            let pairs = universe(&series, cfg);
            let run = run_chunks(&pairs, workers, tolerate, |a, b| pairs_view.timeseries(a, b))?;
            let list = match &ranking {
                Some(r) => rank_series(run.results, r, |ts| {
                    series
                        .get(&ts.long_ticker)
                        .map_or(0, |s| s.len().saturating_sub(cfg.window_size))
                }),
                None => run.results,
            };
            (pairs, run.workers, run.failed_chunks, ScreenOutput::Series(list), run.tally)
        }
        ScreenMode::TestTrade => {
            let (long, short) = match (&opts.long_ticker, &opts.short_ticker) {
                (Some(l), Some(s)) => (l.clone(), s.clone()),
                _ => {
                    return Err(ScreenError::MalformedRequest(
                        "test-trade mode needs both a long and a short ticker".into(),
                    ))
                }
            };
            let pairs = vec![(long, short)];
            let run = run_chunks(&pairs, 1, tolerate, |l, s| pairs_view.test_trade(l, s))?;
            (pairs, run.workers, run.failed_chunks, ScreenOutput::Series(run.results), run.tally)
        }
    };

    Ok(ScreenReport {
        account: account.to_string(),
        mode: opts.mode,
        pairs_total: pairs.len(),
        pairs_evaluated: tally.evaluated,
        workers: sched_workers,
        failed_chunks: failed,
        output,
        rejections: tally,
    })
}

fn universe(series: &SeriesMap, cfg: &AccountConfig) -> Vec<PairCandidate> {
    enumerate_pairs(series.keys().map(String::as_str), &cfg.blacklist, cfg.max_pairs)
}

fn effective_ranking(cfg: &AccountConfig, opts: &RunOptions) -> Option<RankingConfig> {
    match (cfg.ranking.clone(), opts.top_n) {
        (Some(mut r), Some(n)) => {
            r.top_n = n;
            Some(r)
        }
        (None, Some(n)) => Some(RankingConfig {
            top_n: n,
            ..RankingConfig::default()
        }),
        (r, None) => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::{Candle, RawCandle};

    fn settings() -> Settings {
        Settings::from_yaml_str(
            "global: {windowSize: 5, zscoreEntry: 2.0, significanceLevel: 0.05}\naccounts: {acct: {}}\n",
        )
        .unwrap()
    }

    fn candles(closes: &[f64]) -> Vec<RawCandle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| RawCandle::from(Candle::new(i as i64 * 60_000, *c)))
            .collect()
    }

    #[test]
    fn empty_candle_map_is_missing_input() {
        let mut sink: Vec<ScreenReport> = Vec::new();
        let err = run(&RawCandleMap::new(), &settings(), "acct", &RunOptions::default(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, ScreenError::MissingInput(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn unknown_account_is_fatal() {
        let mut raw = RawCandleMap::new();
        raw.insert("A".into(), candles(&[1.0, 2.0]));
        let mut sink: Vec<ScreenReport> = Vec::new();
        let err = run(&raw, &settings(), "other", &RunOptions::default(), &mut sink).unwrap_err();
        assert!(matches!(err, ScreenError::MissingAccount(ref a) if a == "other"));
    }

    #[test]
    fn test_trade_requires_both_legs() {
        let mut raw = RawCandleMap::new();
        raw.insert("A".into(), candles(&[1.0, 2.0]));
        let opts = RunOptions {
            long_ticker: Some("A".into()),
            ..RunOptions::with_mode(ScreenMode::TestTrade)
        };
        let cfg = AccountConfig::new(5, 2.0, 0.05);
        assert!(matches!(
            screen(&raw, &cfg, "acct", &opts),
            Err(ScreenError::MalformedRequest(_))
        ));
    }

    #[test]
    fn short_history_runs_clean_with_no_output() {
        let mut raw = RawCandleMap::new();
        raw.insert("A".into(), candles(&[1.0, 2.0, 3.0]));
        raw.insert("B".into(), candles(&[2.0, 1.0, 3.0]));
        raw.insert("C".into(), candles(&[3.0, 3.5, 2.0]));
        let mut sink: Vec<ScreenReport> = Vec::new();
        let report = run(&raw, &settings(), "acct", &RunOptions::default(), &mut sink).unwrap();
        assert!(report.output.is_empty());
        assert_eq!(report.pairs_total, 3);
        assert_eq!(report.rejections.insufficient_history, 3);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn top_n_override_enables_ranking() {
        let cfg = AccountConfig::new(5, 2.0, 0.05);
        let opts = RunOptions {
            top_n: Some(3),
            ..RunOptions::default()
        };
        let r = effective_ranking(&cfg, &opts).unwrap();
        assert_eq!(r.top_n, 3);
        assert!(effective_ranking(&cfg, &RunOptions::default()).is_none());
    }
}
