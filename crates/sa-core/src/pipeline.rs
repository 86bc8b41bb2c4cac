//! Per-pair evaluation: data checks, correlation and cointegration gates,
//! spread analysis and signal construction.

use serde::{Deserialize, Serialize};

use crate::coint::{coint_test, CointResult};
use crate::config::{AccountConfig, CorrelationScope};
use crate::reject::RejectReason;
use crate::series::{PriceSeries, SeriesMap};
use crate::signal::{self, long_leg, Leg, LongLeg, SignalRecord};
use crate::spread;
use crate::stats::correlation::pearson;
use crate::stats::{allclose, is_constant};

/// What the screen produces per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenMode {
    /// Latest-bar entry signals.
    #[default]
    Signals,
    /// Walk-forward z-score history for every gated pair.
    #[serde(alias = "send_best_chart", alias = "best-chart")]
    Timeseries,
    /// Walk-forward history for one fixed long/short pair, ungated.
    #[serde(alias = "test_trade")]
    TestTrade,
}

/// Spread statistics at one bar of a walk-forward run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreParam {
    pub zscore: f64,
    pub pvalue: f64,
    pub adfpvalue: f64,
    pub correlation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub spread: f64,
    pub mean: f64,
    pub std: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairTimeseries {
    pub long_ticker: String,
    pub short_ticker: String,
    pub zscore_params: Vec<ZScoreParam>,
}

/// Read-only view shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct PairScreen<'a> {
    pub series: &'a SeriesMap,
    pub cfg: &'a AccountConfig,
}

impl<'a> PairScreen<'a> {
    pub fn new(series: &'a SeriesMap, cfg: &'a AccountConfig) -> Self {
        Self { series, cfg }
    }

    fn leg<'s>(&self, ticker: &'s str) -> Result<Leg<'s>, RejectReason>
    where
        'a: 's,
    {
        self.series
            .get(ticker)
            .map(|series| Leg { ticker, series })
            .ok_or(RejectReason::MissingSeries)
    }

    /// Shape checks shared by every mode.
    fn aligned<'s>(&self, first: &'s str, second: &'s str) -> Result<(Leg<'s>, Leg<'s>), RejectReason>
    where
        'a: 's,
    {
        let a = self.leg(first)?;
        let b = self.leg(second)?;
        if a.series.len() != b.series.len() {
            return Err(RejectReason::LengthMismatch);
        }
        if a.series.len() <= self.cfg.window_size {
            return Err(RejectReason::InsufficientHistory);
        }
        Ok((a, b))
    }

    /// Shape checks plus rejection of degenerate inputs.
    fn checked<'s>(&self, first: &'s str, second: &'s str) -> Result<(Leg<'s>, Leg<'s>), RejectReason>
    where
        'a: 's,
    {
        let (a, b) = self.aligned(first, second)?;
        if is_constant(&a.series.closes) || is_constant(&b.series.closes) {
            return Err(RejectReason::ZeroVariance);
        }
        if allclose(&a.series.closes, &b.series.closes) {
            return Err(RejectReason::IdenticalSeries);
        }
        Ok((a, b))
    }

    /// Pearson correlation over the configured scope; `0.0` when undefined.
    pub fn correlation(&self, a: &PriceSeries, b: &PriceSeries) -> f64 {
        let (xa, xb) = match self.cfg.correlation_scope {
            CorrelationScope::Full => (&a.closes[..], &b.closes[..]),
            CorrelationScope::Window => {
                // Same bars as the spread window: [n-1-W, n-1).
                let n = a.len().min(b.len());
                let w = self.cfg.window_size;
                if n <= w {
                    return 0.0;
                }
                (&a.closes[n - 1 - w..n - 1], &b.closes[n - 1 - w..n - 1])
            }
        };
        pearson(xa, xb).unwrap_or(0.0)
    }

    fn gated_stats(&self, a: Leg<'_>, b: Leg<'_>) -> Result<(f64, CointResult), RejectReason> {
        let corr = self.correlation(a.series, b.series);
        signal::correlation_gate(corr, self.cfg.min_correlation)?;
        let coint = coint_test(&a.series.closes, &b.series.closes, self.cfg.significance_level);
        signal::cointegration_gate(&coint)?;
        Ok((corr, coint))
    }

    /// Latest-bar signal for `(first, second)`.
    pub fn signal(&self, first: &str, second: &str) -> Result<SignalRecord, RejectReason> {
        let (a, b) = self.checked(first, second)?;
        let (corr, coint) = self.gated_stats(a, b)?;
        let stats = spread::evaluate_latest(
            &a.series.closes,
            &b.series.closes,
            self.cfg.window_size,
            self.cfg.spread_model,
        )?;
        signal::build(
            a,
            b,
            self.cfg.spread_model,
            corr,
            &coint,
            &stats,
            self.cfg.zscore_entry,
            self.cfg.adf_significance_level,
        )
    }

    /// Walk-forward history for a gated pair. Roles come from the first
    /// computed z-score and hold for every later bar.
    pub fn timeseries(&self, first: &str, second: &str) -> Result<PairTimeseries, RejectReason> {
        let (a, b) = self.checked(first, second)?;
        let (corr, coint) = self.gated_stats(a, b)?;
        let params = self.walk_forward(a.series, b.series, corr, &coint);
        let first_z = params
            .first()
            .map(|p| p.zscore)
            .ok_or(RejectReason::NoHedgeRatio)?;
        let (long, short) = match long_leg(self.cfg.spread_model, first_z) {
            LongLeg::First => (first, second),
            LongLeg::Second => (second, first),
        };
        Ok(PairTimeseries {
            long_ticker: long.to_string(),
            short_ticker: short.to_string(),
            zscore_params: params,
        })
    }

    /// Walk-forward history of a fixed `(long, short)` pair with no gating.
    pub fn test_trade(&self, long: &str, short: &str) -> Result<PairTimeseries, RejectReason> {
        let (a, b) = self.aligned(long, short)?;
        let corr = self.correlation(a.series, b.series);
        let coint = coint_test(&a.series.closes, &b.series.closes, self.cfg.significance_level);
        Ok(PairTimeseries {
            long_ticker: long.to_string(),
            short_ticker: short.to_string(),
            zscore_params: self.walk_forward(a.series, b.series, corr, &coint),
        })
    }

    /// Re-estimate the spread at every bar from `window_size` to the end.
    /// Bars without a hedge ratio are skipped, so the result can be shorter
    /// than `len - window_size`.
    fn walk_forward(
        &self,
        a: &PriceSeries,
        b: &PriceSeries,
        corr: f64,
        coint: &CointResult,
    ) -> Vec<ZScoreParam> {
        let w = self.cfg.window_size;
        (w..a.len())
            .filter_map(|i| {
                let s = spread::evaluate(&a.closes, &b.closes, w, i, self.cfg.spread_model).ok()?;
                Some(ZScoreParam {
                    zscore: s.zscore,
                    pvalue: coint.pvalue,
                    adfpvalue: s.adf_pvalue,
                    correlation: corr,
                    alpha: s.regression.map(|r| r.alpha),
                    beta: s.regression.map(|r| r.beta),
                    spread: s.spread,
                    mean: s.mean,
                    std: s.std,
                    timestamp: a.timestamps[i],
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpreadModel;

    fn series(closes: Vec<f64>) -> PriceSeries {
        let timestamps = (0..closes.len() as i64).map(|i| i * 1000).collect();
        PriceSeries { closes, timestamps }
    }

    fn map(entries: Vec<(&str, Vec<f64>)>) -> SeriesMap {
        entries
            .into_iter()
            .map(|(t, c)| (t.to_string(), series(c)))
            .collect()
    }

    fn trend(n: usize, slope: f64, wiggle: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + slope * i as f64 + if i % 3 == 0 { wiggle } else { -wiggle / 2.0 })
            .collect()
    }

    #[test]
    fn shape_checks_come_first() {
        let m = map(vec![
            ("A", trend(30, 1.0, 0.3)),
            ("B", trend(29, 1.0, 0.2)),
            ("C", vec![5.0; 30]),
            ("D", trend(30, 1.0, 0.3)),
            ("E", trend(15, 1.0, 0.1)),
            ("F", trend(15, 0.5, 0.2)),
        ]);
        let cfg = AccountConfig::new(20, 2.0, 0.05);
        let screen = PairScreen::new(&m, &cfg);
        assert_eq!(screen.signal("A", "Z").unwrap_err(), RejectReason::MissingSeries);
        assert_eq!(screen.signal("A", "B").unwrap_err(), RejectReason::LengthMismatch);
        assert_eq!(screen.signal("A", "C").unwrap_err(), RejectReason::ZeroVariance);
        assert_eq!(screen.signal("A", "D").unwrap_err(), RejectReason::IdenticalSeries);
        assert_eq!(screen.signal("E", "F").unwrap_err(), RejectReason::InsufficientHistory);
    }

    #[test]
    fn correlation_gate_rejects_before_cointegration() {
        let up: Vec<f64> = trend(40, 1.0, 0.3);
        let down: Vec<f64> = (0..40).map(|i| 200.0 - i as f64 * 0.01 + (i % 2) as f64).collect();
        let m = map(vec![("UP", up), ("FLAT", down)]);
        let mut cfg = AccountConfig::new(20, 2.0, 0.05);
        cfg.min_correlation = Some(0.9);
        let screen = PairScreen::new(&m, &cfg);
        assert_eq!(screen.signal("UP", "FLAT").unwrap_err(), RejectReason::LowCorrelation);
    }

    #[test]
    fn window_scope_uses_bars_before_evaluation() {
        // Perfectly correlated inside the window only.
        let mut a: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let mut b = a.clone();
        for (i, v) in a.iter_mut().enumerate().skip(9) {
            *v = 50.0 + i as f64;
        }
        for (i, v) in b.iter_mut().enumerate().skip(9) {
            *v = 10.0 + 2.0 * i as f64;
        }
        let pa = series(a);
        let pb = series(b);
        let m = SeriesMap::new();
        let mut cfg = AccountConfig::new(20, 2.0, 0.05);
        cfg.correlation_scope = CorrelationScope::Window;
        let screen = PairScreen::new(&m, &cfg);
        assert!((screen.correlation(&pa, &pb) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_trade_keeps_given_roles_and_covers_every_bar() {
        let a = trend(30, 1.0, 0.4);
        let b: Vec<f64> = a.iter().enumerate().map(|(i, v)| v * 1.5 + (i % 4) as f64 * 0.3).collect();
        let m = map(vec![("LONG", a), ("SHORT", b)]);
        let mut cfg = AccountConfig::new(20, 2.0, 0.05);
        cfg.spread_model = SpreadModel::Regression;
        let screen = PairScreen::new(&m, &cfg);
        let ts = screen.test_trade("SHORT", "LONG").unwrap();
        assert_eq!(ts.long_ticker, "SHORT");
        assert_eq!(ts.short_ticker, "LONG");
        assert_eq!(ts.zscore_params.len(), 10);
        assert_eq!(ts.zscore_params[0].timestamp, 20_000);
        assert!(ts.zscore_params.iter().all(|p| p.beta.is_some() && p.zscore.is_finite()));
    }

    #[test]
    fn mode_accepts_legacy_names() {
        let m: ScreenMode = serde_json::from_str("\"send_best_chart\"").unwrap();
        assert_eq!(m, ScreenMode::Timeseries);
        let m: ScreenMode = serde_json::from_str("\"test_trade\"").unwrap();
        assert_eq!(m, ScreenMode::TestTrade);
        let m: ScreenMode = serde_json::from_str("\"signals\"").unwrap();
        assert_eq!(m, ScreenMode::Signals);
    }
}
