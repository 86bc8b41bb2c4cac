use std::collections::BTreeMap;

use serde_json::Value;

use crate::candle::{Candle, RawCandle, RawCandleMap};

/// Positional layout: `[ts, open, high, low, close, volume, ...]`.
const POS_TS: usize = 0;
const POS_OPEN: usize = 1;
const POS_HIGH: usize = 2;
const POS_LOW: usize = 3;
const POS_CLOSE: usize = 4;
const POS_VOLUME: usize = 5;

/// Close prices and timestamps of one ticker, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub closes: Vec<f64>,
    pub timestamps: Vec<i64>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }
}

pub type SeriesMap = BTreeMap<String, PriceSeries>;

/// Extract closes and timestamps from a raw candle sequence.
///
/// Best-effort: entries without a usable timestamp or a finite close are
/// dropped one by one, so the result may be shorter than the input.
pub fn extract(raw: &[RawCandle]) -> PriceSeries {
    let mut out = PriceSeries {
        closes: Vec::with_capacity(raw.len()),
        timestamps: Vec::with_capacity(raw.len()),
    };
    for c in raw.iter().filter_map(normalise) {
        out.closes.push(c.close);
        out.timestamps.push(c.timestamp);
    }
    out
}

/// Extract every ticker of a candle map.
pub fn extract_all(map: &RawCandleMap) -> SeriesMap {
    map.iter()
        .map(|(ticker, raw)| (ticker.clone(), extract(raw)))
        .collect()
}

/// Normalise a single wire candle, or `None` when it is malformed.
pub fn normalise(raw: &RawCandle) -> Option<Candle> {
    let candle = match raw {
        RawCandle::Bar(c) => *c,
        RawCandle::Positional(fields) => {
            if fields.len() <= POS_CLOSE {
                return None;
            }
            Candle {
                timestamp: num_i64(&fields[POS_TS])?,
                close: num_f64(&fields[POS_CLOSE])?,
                open: num_f64(&fields[POS_OPEN]),
                high: num_f64(&fields[POS_HIGH]),
                low: num_f64(&fields[POS_LOW]),
                volume: fields.get(POS_VOLUME).and_then(num_f64),
            }
        }
        RawCandle::Named(obj) => Candle {
            timestamp: obj.get("timestamp").and_then(num_i64)?,
            close: obj.get("close").and_then(num_f64)?,
            open: obj.get("open").and_then(num_f64),
            high: obj.get("high").and_then(num_f64),
            low: obj.get("low").and_then(num_f64),
            volume: obj.get("volume").and_then(num_f64),
        },
        RawCandle::Other(_) => return None,
    };
    candle.close.is_finite().then_some(candle)
}

fn num_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn num_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}
