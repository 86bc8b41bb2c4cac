use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Normalised candle. Only `timestamp` and `close` feed the screener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64, // open time (ms since epoch)
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// A candle as it arrives on the wire.
///
/// Exchange REST payloads ship positional arrays (`[ts, o, h, l, c, v, ...]`)
/// whose elements are frequently numeric strings; internal producers use the
/// named form. Anything else is kept verbatim so one bad entry does not fail
/// the whole document; [`crate::series::extract`] drops it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCandle {
    // Arrays first: a derived struct also accepts a sequence in field order.
    Positional(Vec<serde_json::Value>),
    Bar(Candle),
    Named(serde_json::Map<String, serde_json::Value>),
    Other(serde_json::Value),
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        RawCandle::Bar(c)
    }
}

/// Candle history keyed by ticker. Ordered so that pair enumeration is stable
/// across runs.
pub type RawCandleMap = BTreeMap<String, Vec<RawCandle>>;

/// Per-ticker value of an incoming candle map. Anything that is not a list
/// loads as an empty history, so pairs on that ticker are rejected one by one
/// instead of failing the document.
#[derive(Deserialize)]
#[serde(untagged)]
enum TickerCandles {
    List(Vec<RawCandle>),
    Other(serde_json::Value),
}

/// [`RawCandleMap`] read from JSON, tolerant of non-list ticker entries.
#[derive(Debug, Clone, Default)]
pub struct LenientCandleMap(pub RawCandleMap);

impl<'de> Deserialize<'de> for LenientCandleMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, TickerCandles>::deserialize(deserializer)?;
        let map = entries
            .into_iter()
            .map(|(ticker, value)| match value {
                TickerCandles::List(list) => (ticker, list),
                TickerCandles::Other(v) => {
                    warn!(ticker = %ticker, kind = json_kind(&v), "candle entry is not a list");
                    (ticker, Vec::new())
                }
            })
            .collect();
        Ok(Self(map))
    }
}

impl From<LenientCandleMap> for RawCandleMap {
    fn from(m: LenientCandleMap) -> Self {
        m.0
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
