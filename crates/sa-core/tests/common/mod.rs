#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sa_core::candle::{Candle, RawCandle, RawCandleMap};
use sa_core::config::{AccountConfig, SpreadModel};

pub const T0: i64 = 1_700_000_000_000;
pub const BAR_MS: i64 = 3_600_000;

/// Two drifting legs that track each other for 24 bars; BBB jumps on the
/// last bar.
pub const AAA: [f64; 25] = [
    100.94, 101.79, 102.54, 103.62, 105.05, 105.98, 107.08, 107.83, 108.96, 110.25, 111.03,
    111.96, 112.52, 113.78, 114.98, 115.73, 116.63, 117.49, 118.09, 119.31, 120.3, 121.61,
    122.41, 123.13, 124.2,
];
pub const BBB: [f64; 25] = [
    101.13, 101.41, 102.0, 104.1, 104.8, 106.08, 106.65, 107.38, 109.45, 109.71, 110.5, 112.03,
    113.01, 113.45, 115.46, 116.22, 116.17, 117.69, 117.71, 118.97, 120.81, 121.13, 122.46,
    122.74, 127.2,
];

pub fn candles(closes: &[f64]) -> Vec<RawCandle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| RawCandle::from(Candle::new(T0 + i as i64 * BAR_MS, *c)))
        .collect()
}

pub fn candle_map(entries: &[(&str, &[f64])]) -> RawCandleMap {
    entries
        .iter()
        .map(|(t, c)| (t.to_string(), candles(c)))
        .collect()
}

pub fn divergence_cfg(model: SpreadModel) -> AccountConfig {
    let mut cfg = AccountConfig::new(20, 2.0, 0.05);
    cfg.adf_significance_level = Some(0.05);
    cfg.spread_model = model;
    cfg
}

/// `n` tickers of length `bars`: half follow a shared random-walk factor
/// (so some pairs cointegrate), half are independent walks.
pub fn random_universe(seed: u64, n: usize, bars: usize) -> RawCandleMap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut factor = Vec::with_capacity(bars);
    let mut level = 100.0;
    for _ in 0..bars {
        level += rng.gen_range(-1.0..1.0);
        factor.push(level);
    }

    (0..n)
        .map(|k| {
            let closes: Vec<f64> = if k % 2 == 0 {
                let scale = rng.gen_range(0.5..2.0);
                let shift = rng.gen_range(-20.0..20.0);
                factor
                    .iter()
                    .map(|f| scale * f + shift + rng.gen_range(-0.5..0.5))
                    .collect()
            } else {
                let mut p = rng.gen_range(50.0..150.0);
                (0..bars)
                    .map(|_| {
                        p += rng.gen_range(-1.0..1.0);
                        p
                    })
                    .collect()
            };
            (format!("TK{k:02}"), candles(&closes))
        })
        .collect()
}
