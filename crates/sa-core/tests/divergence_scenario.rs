mod common;

use common::*;
use sa_core::config::SpreadModel;
use sa_core::orchestrator::{screen, RunOptions};
use sa_core::pipeline::{PairScreen, ScreenMode};
use sa_core::reject::RejectReason;
use sa_core::series::extract_all;

#[test]
fn diverging_pair_emits_one_regression_signal() {
    let raw = candle_map(&[("AAA", &AAA), ("BBB", &BBB)]);
    let cfg = divergence_cfg(SpreadModel::Regression);
    let report = screen(&raw, &cfg, "test", &RunOptions::default()).unwrap();

    let signals = report.signals();
    assert_eq!(signals.len(), 1);
    let s = &signals[0];
    // BBB jumped above its fitted value, so it is the rich leg.
    assert_eq!(s.long_ticker, "AAA");
    assert_eq!(s.short_ticker, "BBB");
    assert!((s.zscore - 7.7577).abs() < 1e-3, "z = {}", s.zscore);
    assert!((s.pvalue - 4.735e-4).abs() < 1e-5, "p = {}", s.pvalue);
    assert!(s.adf_pvalue < 1e-5);
    assert!((s.correlation - 0.99549).abs() < 1e-4);
    assert!((s.beta.unwrap() - 1.00288).abs() < 1e-4);
    assert!((s.alpha.unwrap() + 0.41381).abs() < 1e-3);
    assert_eq!(s.long_ticker_price, 124.2);
    assert_eq!(s.short_ticker_price, 127.2);
    assert_eq!(s.timestamp, T0 + 24 * BAR_MS);
    assert_eq!(report.rejections.accepted, 1);
}

#[test]
fn diverging_pair_emits_one_raw_signal() {
    let raw = candle_map(&[("AAA", &AAA), ("BBB", &BBB)]);
    let cfg = divergence_cfg(SpreadModel::Raw);
    let report = screen(&raw, &cfg, "test", &RunOptions::default()).unwrap();

    let signals = report.signals();
    assert_eq!(signals.len(), 1);
    let s = &signals[0];
    assert_eq!(s.long_ticker, "AAA");
    assert_eq!(s.short_ticker, "BBB");
    assert!((s.spread + 3.0).abs() < 1e-9);
    assert!((s.zscore + 7.8244).abs() < 1e-3, "z = {}", s.zscore);
    assert!(s.alpha.is_none() && s.beta.is_none());
}

#[test]
fn roles_survive_swapping_the_legs() {
    // Same data, but the AAA leg now sorts second.
    let raw = candle_map(&[("ZZZ", &AAA), ("BBB", &BBB)]);
    for model in [SpreadModel::Raw, SpreadModel::Regression] {
        let report = screen(&raw, &divergence_cfg(model), "test", &RunOptions::default()).unwrap();
        let s = &report.signals()[0];
        assert_eq!((s.long_ticker.as_str(), s.short_ticker.as_str()), ("ZZZ", "BBB"), "{model:?}");
    }

    let series = extract_all(&candle_map(&[("AAA", &AAA), ("BBB", &BBB)]));
    let cfg = divergence_cfg(SpreadModel::Raw);
    let view = PairScreen::new(&series, &cfg);
    let ab = view.signal("AAA", "BBB").unwrap();
    let ba = view.signal("BBB", "AAA").unwrap();
    assert_eq!(ab.long_ticker, ba.long_ticker);
    assert_eq!(ab.short_ticker, ba.short_ticker);
    assert!((ab.zscore.abs() - ba.zscore.abs()).abs() < 1e-12);
    assert_eq!(ab.zscore.signum(), -ba.zscore.signum());
}

#[test]
fn history_shorter_than_window_emits_nothing() {
    let raw = candle_map(&[("AAA", &AAA[..15]), ("BBB", &BBB[..15])]);
    let report = screen(
        &raw,
        &divergence_cfg(SpreadModel::Regression),
        "test",
        &RunOptions::default(),
    )
    .unwrap();
    assert!(report.signals().is_empty());
    assert_eq!(report.rejections.count(RejectReason::InsufficientHistory), 1);
}

#[test]
fn identical_series_never_signal() {
    let raw = candle_map(&[("AAA", &AAA), ("CCC", &AAA)]);
    let report = screen(&raw, &divergence_cfg(SpreadModel::Raw), "test", &RunOptions::default()).unwrap();
    assert!(report.signals().is_empty());
    assert_eq!(report.rejections.count(RejectReason::IdenticalSeries), 1);
}

#[test]
fn raising_the_entry_threshold_suppresses_the_signal() {
    let raw = candle_map(&[("AAA", &AAA), ("BBB", &BBB)]);
    let mut cfg = divergence_cfg(SpreadModel::Regression);
    cfg.zscore_entry = 8.0;
    let report = screen(&raw, &cfg, "test", &RunOptions::default()).unwrap();
    assert!(report.signals().is_empty());
    assert_eq!(report.rejections.count(RejectReason::WeakZscore), 1);
}

#[test]
fn timeseries_mode_walks_every_bar_after_the_window() {
    let raw = candle_map(&[("AAA", &AAA), ("BBB", &BBB)]);
    let cfg = divergence_cfg(SpreadModel::Regression);
    let report = screen(&raw, &cfg, "test", &RunOptions::with_mode(ScreenMode::Timeseries)).unwrap();

    let series = report.series();
    assert_eq!(series.len(), 1);
    let ts = &series[0];
    // First walk-forward z-score is positive: AAA is long for the whole run.
    assert_eq!(ts.long_ticker, "AAA");
    assert_eq!(ts.short_ticker, "BBB");
    assert_eq!(ts.zscore_params.len(), 5);
    assert!((ts.zscore_params[0].zscore - 1.3989).abs() < 1e-3);
    let last = ts.zscore_params.last().unwrap();
    assert!((last.zscore - 7.7577).abs() < 1e-3);
    assert_eq!(last.timestamp, T0 + 24 * BAR_MS);
    assert!(ts.zscore_params.iter().all(|p| p.pvalue == ts.zscore_params[0].pvalue));
}

#[test]
fn test_trade_mode_keeps_requested_roles() {
    let raw = candle_map(&[("AAA", &AAA), ("BBB", &BBB), ("CCC", &AAA)]);
    let cfg = divergence_cfg(SpreadModel::Raw);
    let opts = RunOptions {
        long_ticker: Some("BBB".into()),
        short_ticker: Some("AAA".into()),
        ..RunOptions::with_mode(ScreenMode::TestTrade)
    };
    let report = screen(&raw, &cfg, "test", &opts).unwrap();
    assert_eq!(report.pairs_total, 1);
    let ts = &report.series()[0];
    assert_eq!(ts.long_ticker, "BBB");
    assert_eq!(ts.short_ticker, "AAA");
    assert_eq!(ts.zscore_params.len(), 5);
    assert!((ts.zscore_params[4].spread - 3.0).abs() < 1e-9);
}
