use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreenError};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the spread between the two legs is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadModel {
    /// `second - (beta * first + alpha)`, hedge ratio fit on the trailing window.
    #[default]
    Regression,
    /// `first - second`, no hedge ratio.
    Raw,
}

/// Which slice of history the correlation gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationScope {
    #[default]
    Full,
    Window,
}

// ---------------------------------------------------------------------------
// Account config
// ---------------------------------------------------------------------------

fn default_top_n() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Best-pair selection applied after screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub min_zscore: Option<f64>,
    #[serde(default)]
    pub max_pvalue: Option<f64>,
    #[serde(default)]
    pub max_adf_pvalue: Option<f64>,
    #[serde(default)]
    pub min_correlation: Option<f64>,
    /// Rank by `|z|` instead of signed `z`.
    #[serde(default)]
    pub by_abs_zscore: bool,
    /// Timeseries mode: drop pairs whose series does not cover every bar.
    #[serde(default = "default_true")]
    pub complete_only: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_zscore: None,
            max_pvalue: None,
            max_adf_pvalue: None,
            min_correlation: None,
            by_abs_zscore: false,
            complete_only: true,
        }
    }
}

/// Screening parameters for one account. Optional thresholds are no-ops when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub window_size: usize,
    pub zscore_entry: f64,
    pub significance_level: f64,
    #[serde(default)]
    pub adf_significance_level: Option<f64>,
    #[serde(default)]
    pub min_correlation: Option<f64>,
    /// Truncates the pair enumeration before any filtering.
    #[serde(default)]
    pub max_pairs: Option<usize>,
    #[serde(default)]
    pub spread_model: SpreadModel,
    #[serde(default)]
    pub correlation_scope: CorrelationScope,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub ranking: Option<RankingConfig>,
    /// Drop a panicking chunk with a warning instead of failing the run.
    #[serde(default)]
    pub tolerate_worker_failures: bool,
}

impl AccountConfig {
    /// Minimal config with the three required fields; everything else default.
    pub fn new(window_size: usize, zscore_entry: f64, significance_level: f64) -> Self {
        Self {
            window_size,
            zscore_entry,
            significance_level,
            adf_significance_level: None,
            min_correlation: None,
            max_pairs: None,
            spread_model: SpreadModel::default(),
            correlation_scope: CorrelationScope::default(),
            blacklist: Vec::new(),
            ranking: None,
            tolerate_worker_failures: false,
        }
    }

    /// Range checks on every field. `account` only labels the error.
    pub fn validate(&self, account: &str) -> Result<()> {
        let fail = |reason: String| {
            Err(ScreenError::InvalidConfig {
                account: account.to_string(),
                reason,
            })
        };
        let open_unit = |v: f64| v > 0.0 && v < 1.0;

        if self.window_size == 0 {
            return fail("windowSize must be > 0".into());
        }
        if !(self.zscore_entry.is_finite() && self.zscore_entry > 0.0) {
            return fail(format!("zscoreEntry must be > 0, got {}", self.zscore_entry));
        }
        if !open_unit(self.significance_level) {
            return fail(format!(
                "significanceLevel must be in (0, 1), got {}",
                self.significance_level
            ));
        }
        if let Some(v) = self.adf_significance_level {
            if !open_unit(v) {
                return fail(format!("adfSignificanceLevel must be in (0, 1), got {v}"));
            }
        }
        if let Some(v) = self.min_correlation {
            if !(0.0..=1.0).contains(&v) {
                return fail(format!("minCorrelation must be in [0, 1], got {v}"));
            }
        }
        if let Some(r) = &self.ranking {
            if r.top_n == 0 {
                return fail("ranking.topN must be > 0".into());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Settings document
// ---------------------------------------------------------------------------

/// Layered layout: `global` defaults plus per-account overlays.
#[derive(Debug, Default, Deserialize)]
struct LayeredRoot {
    #[serde(default)]
    global: serde_yaml::Value,
    #[serde(default)]
    accounts: serde_yaml::Value,
}

/// Parsed settings file holding one or more accounts.
///
/// Two layouts are accepted:
///
/// ```yaml
/// # layered
/// global: { windowSize: 20, significanceLevel: 0.05 }
/// accounts:
///   "42": { zscoreEntry: 2.0 }
/// ```
///
/// ```yaml
/// # flat: account id -> full config
/// "42": { windowSize: 20, zscoreEntry: 2.0, significanceLevel: 0.05 }
/// ```
///
/// JSON is valid YAML, so the same loader reads both.
#[derive(Debug, Clone)]
pub struct Settings {
    root: serde_yaml::Value,
}

impl Settings {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let root: serde_yaml::Value = serde_yaml::from_str(raw)?;
        if !root.is_mapping() {
            return Err(ScreenError::MalformedRequest(
                "settings document must be a mapping".into(),
            ));
        }
        Ok(Self { root })
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let root = serde_yaml::to_value(value)?;
        if !root.is_mapping() {
            return Err(ScreenError::MalformedRequest(
                "settings document must be an object".into(),
            ));
        }
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScreenError::MissingInput(format!("settings file {}", path.display()))
            } else {
                ScreenError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_yaml_str(&raw)
    }

    fn is_layered(&self) -> bool {
        self.root.get("accounts").is_some()
    }

    /// Account ids in document order.
    pub fn account_ids(&self) -> Vec<String> {
        let accounts = if self.is_layered() {
            self.root.get("accounts")
        } else {
            Some(&self.root)
        };
        match accounts.and_then(|v| v.as_mapping()) {
            Some(m) => m.keys().filter_map(key_to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Resolve, merge and validate the config for `account`.
    pub fn account(&self, account: &str) -> Result<AccountConfig> {
        let merged = if self.is_layered() {
            let root: LayeredRoot = serde_yaml::from_value(self.root.clone())?;
            let overlay = lookup(&root.accounts, account)
                .ok_or_else(|| ScreenError::MissingAccount(account.to_string()))?;
            let mut base = if root.global.is_mapping() {
                root.global
            } else {
                serde_yaml::Value::Mapping(Default::default())
            };
            deep_merge(&mut base, overlay);
            base
        } else {
            lookup(&self.root, account)
                .cloned()
                .ok_or_else(|| ScreenError::MissingAccount(account.to_string()))?
        };

        let cfg: AccountConfig =
            serde_yaml::from_value(merged).map_err(|e| ScreenError::InvalidConfig {
                account: account.to_string(),
                reason: e.to_string(),
            })?;
        cfg.validate(account)?;
        Ok(cfg)
    }
}

/// Look up an account key as a string first, then as an integer key (YAML
/// turns unquoted chat ids into numbers).
fn lookup<'a>(map: &'a serde_yaml::Value, account: &str) -> Option<&'a serde_yaml::Value> {
    let m = map.as_mapping()?;
    m.get(serde_yaml::Value::String(account.to_string()))
        .or_else(|| {
            let n: i64 = account.trim().parse().ok()?;
            m.get(serde_yaml::Value::Number(n.into()))
        })
        .filter(|v| !v.is_null())
}

fn key_to_string(k: &serde_yaml::Value) -> Option<String> {
    match k {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Recursive mapping merge: overlay keys win, nested mappings merge, a null
/// overlay leaves the base untouched.
pub(crate) fn deep_merge(base: &mut serde_yaml::Value, overlay: &serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            if !overlay.is_null() {
                *base = overlay.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
