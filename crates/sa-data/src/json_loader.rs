//! JSON inputs: a bare candle map file, and the combined request envelope
//! (`settings` + `candles_map` + mode) piped on stdin by upstream services.

use std::io::Read;
use std::path::{Path, PathBuf};

use sa_core::candle::{LenientCandleMap, RawCandleMap};
use sa_core::config::Settings;
use sa_core::orchestrator::{CandleSource, RunOptions};
use sa_core::pipeline::ScreenMode;
use sa_core::{Result, ScreenError};
use serde::Deserialize;

/// Account id assigned to the inline settings of a request.
pub const REQUEST_ACCOUNT: &str = "request";

fn read_file(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScreenError::MissingInput(format!("{what} {}", path.display()))
        } else {
            ScreenError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// `{ticker: [candle, ...]}` read from a file.
#[derive(Debug, Clone)]
pub struct JsonCandleFile {
    pub path: PathBuf,
}

impl JsonCandleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandleSource for JsonCandleFile {
    fn load(&self) -> Result<RawCandleMap> {
        let raw = read_file(&self.path, "candle map")?;
        serde_json::from_str::<LenientCandleMap>(&raw)
            .map(RawCandleMap::from)
            .map_err(|e| {
                ScreenError::MalformedRequest(format!("candle map {}: {e}", self.path.display()))
            })
    }

    fn describe(&self) -> String {
        format!("json {}", self.path.display())
    }
}

/// Combined request: inline settings for one account plus the candle map.
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenRequest {
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default, alias = "candlesMap")]
    pub candles_map: Option<LenientCandleMap>,
    #[serde(default)]
    pub mode: Option<ScreenMode>,
    #[serde(default, alias = "longTicker")]
    pub long_ticker: Option<String>,
    #[serde(default, alias = "shortTicker")]
    pub short_ticker: Option<String>,
}

/// A validated request, split into the pieces the orchestrator takes.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub candles: RawCandleMap,
    pub settings: Settings,
    pub options: RunOptions,
}

impl ScreenRequest {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| ScreenError::MalformedRequest(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = read_file(path, "request")?;
        serde_json::from_str(&raw).map_err(|e| ScreenError::MalformedRequest(e.to_string()))
    }

    /// Missing or empty `candles_map` / `settings` are reported by name.
    /// The inline settings become account [`REQUEST_ACCOUNT`].
    pub fn into_parts(self) -> Result<RequestParts> {
        let candles = match self.candles_map {
            Some(LenientCandleMap(m)) if !m.is_empty() => m,
            _ => return Err(ScreenError::MissingInput("'candles_map'".into())),
        };
        let settings = match self.settings {
            Some(v) if v.as_object().is_some_and(|o| !o.is_empty()) => v,
            Some(v) if !v.is_null() && !v.is_object() => {
                return Err(ScreenError::MalformedRequest("'settings' must be an object".into()))
            }
            _ => return Err(ScreenError::MissingInput("'settings'".into())),
        };
        let mut root = serde_json::Map::new();
        root.insert(REQUEST_ACCOUNT.to_string(), settings);
        let settings = Settings::from_json_value(serde_json::Value::Object(root))?;
        let options = RunOptions {
            mode: self.mode.unwrap_or_default(),
            long_ticker: self.long_ticker,
            short_ticker: self.short_ticker,
            ..RunOptions::default()
        };
        Ok(RequestParts {
            candles,
            settings,
            options,
        })
    }
}
