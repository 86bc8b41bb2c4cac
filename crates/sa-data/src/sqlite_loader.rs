use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::{Connection, OpenFlags};
use sa_core::candle::{Candle, RawCandle, RawCandleMap};
use sa_core::orchestrator::CandleSource;
use tracing::{debug, info};

use crate::DataError;

pub const VALID_INTERVALS: &[&str] = &["1m", "3m", "5m", "15m", "30m", "1h", "4h", "1d"];

fn validate_interval(interval: &str) -> Result<(), DataError> {
    if !VALID_INTERVALS.contains(&interval) {
        return Err(DataError::InvalidInterval(interval.to_string()));
    }
    Ok(())
}

fn open_read_only(db_path: &Path) -> Result<Connection, DataError> {
    Ok(Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
}

/// `(min_t, max_t)` in milliseconds for `interval`, or `None` when no rows
/// match.
pub fn query_time_range(db_path: &Path, interval: &str) -> Result<Option<(i64, i64)>, DataError> {
    validate_interval(interval)?;
    let conn = open_read_only(db_path)?;
    let mut stmt = conn.prepare("SELECT MIN(t), MAX(t) FROM candles WHERE interval = ?")?;
    let range = stmt.query_row([interval], |row| {
        let min_t: Option<i64> = row.get(0)?;
        let max_t: Option<i64> = row.get(1)?;
        Ok(min_t.zip(max_t))
    })?;
    Ok(range)
}

/// Distinct symbols stored for `interval`, sorted.
pub fn load_symbols(db_path: &Path, interval: &str) -> Result<Vec<String>, DataError> {
    validate_interval(interval)?;
    let conn = open_read_only(db_path)?;
    let mut stmt =
        conn.prepare("SELECT DISTINCT symbol FROM candles WHERE interval = ? ORDER BY symbol")?;
    let symbols = stmt
        .query_map([interval], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(symbols)
}

/// Candles for `interval`, grouped by symbol and sorted by open time.
/// `from_ts` / `to_ts` (inclusive, ms) restrict the range. Rows with a NULL
/// close are skipped.
pub fn load_candles_filtered(
    db_path: &Path,
    interval: &str,
    from_ts: Option<i64>,
    to_ts: Option<i64>,
) -> Result<BTreeMap<String, Vec<Candle>>, DataError> {
    validate_interval(interval)?;
    let start = Instant::now();
    let conn = open_read_only(db_path)?;

    let mut where_parts = vec!["interval = ?1".to_string()];
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(interval.to_string())];
    if let Some(ft) = from_ts {
        params.push(Box::new(ft));
        where_parts.push(format!("t >= ?{}", params.len()));
    }
    if let Some(tt) = to_ts {
        params.push(Box::new(tt));
        where_parts.push(format!("t <= ?{}", params.len()));
    }
    let query = format!(
        "SELECT symbol, t, o, h, l, c, v FROM candles WHERE {} ORDER BY symbol, t ASC",
        where_parts.join(" AND "),
    );
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        let symbol: String = row.get(0)?;
        let t: i64 = row.get(1)?;
        let close: Option<f64> = row.get(5)?;
        let ohlv: [Option<f64>; 4] = [row.get(2)?, row.get(3)?, row.get(4)?, row.get(6)?];
        Ok((symbol, t, close, ohlv))
    })?;

    let mut data: BTreeMap<String, Vec<Candle>> = BTreeMap::new();
    let mut total_bars: u64 = 0;
    let mut skipped: u64 = 0;
    for row in rows {
        let (symbol, t, close, [o, h, l, v]) = row?;
        let Some(close) = close else {
            skipped += 1;
            continue;
        };
        total_bars += 1;
        data.entry(symbol).or_default().push(Candle {
            timestamp: t,
            close,
            open: o,
            high: h,
            low: l,
            volume: v,
        });
    }

    if skipped > 0 {
        debug!(skipped, db = %db_path.display(), "rows without close skipped");
    }
    info!(
        symbols = data.len(),
        bars = total_bars,
        elapsed_s = start.elapsed().as_secs_f64(),
        db = %db_path.display(),
        interval,
        from_ts,
        to_ts,
        "loaded candles"
    );
    Ok(data)
}

/// Like [`load_candles_filtered`] across several partitions. Overlapping bars
/// are deduped by `(symbol, t)`, first partition wins.
pub fn load_candles_filtered_multi(
    db_paths: &[PathBuf],
    interval: &str,
    from_ts: Option<i64>,
    to_ts: Option<i64>,
) -> Result<BTreeMap<String, Vec<Candle>>, DataError> {
    let mut merged: BTreeMap<String, Vec<Candle>> = BTreeMap::new();
    for p in db_paths {
        for (sym, bars) in load_candles_filtered(p, interval, from_ts, to_ts)? {
            merged.entry(sym).or_default().extend(bars);
        }
    }
    for bars in merged.values_mut() {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
    }
    Ok(merged)
}

/// Candle source backed by one or more SQLite partitions.
#[derive(Debug, Clone)]
pub struct SqliteCandleSource {
    pub db_paths: Vec<PathBuf>,
    pub interval: String,
    pub from_ts: Option<i64>,
    pub to_ts: Option<i64>,
}

impl SqliteCandleSource {
    pub fn new(db_paths: Vec<PathBuf>, interval: impl Into<String>) -> Self {
        Self {
            db_paths,
            interval: interval.into(),
            from_ts: None,
            to_ts: None,
        }
    }

    pub fn with_range(mut self, from_ts: Option<i64>, to_ts: Option<i64>) -> Self {
        self.from_ts = from_ts;
        self.to_ts = to_ts;
        self
    }
}

/// What a set of partitions holds for one interval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub symbols: Vec<String>,
    /// Earliest and latest open time over all partitions (ignores the
    /// source's `from_ts` / `to_ts`).
    pub time_range: Option<(i64, i64)>,
}

impl SqliteCandleSource {
    pub fn inventory(&self) -> Result<Inventory, DataError> {
        let mut symbols = BTreeSet::new();
        let mut time_range: Option<(i64, i64)> = None;
        for p in &self.db_paths {
            symbols.extend(load_symbols(p, &self.interval)?);
            if let Some((lo, hi)) = query_time_range(p, &self.interval)? {
                time_range = Some(match time_range {
                    Some((a, b)) => (a.min(lo), b.max(hi)),
                    None => (lo, hi),
                });
            }
        }
        Ok(Inventory {
            symbols: symbols.into_iter().collect(),
            time_range,
        })
    }
}

impl CandleSource for SqliteCandleSource {
    fn load(&self) -> sa_core::Result<RawCandleMap> {
        let missing: Vec<String> = self
            .db_paths
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();
        if self.db_paths.is_empty() || !missing.is_empty() {
            return Err(sa_core::ScreenError::MissingInput(format!(
                "candle database {}",
                missing.join(", ")
            )));
        }
        let data = load_candles_filtered_multi(&self.db_paths, &self.interval, self.from_ts, self.to_ts)?;
        Ok(data
            .into_iter()
            .map(|(sym, bars)| (sym, bars.into_iter().map(RawCandle::from).collect()))
            .collect())
    }

    fn describe(&self) -> String {
        format!("sqlite {:?} interval={}", self.db_paths, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_db_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("sa_data_{tag}_{nanos}.db"))
    }

    fn init_candles_db(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS candles (
                symbol TEXT NOT NULL,
                interval TEXT NOT NULL,
                t INTEGER NOT NULL,
                t_close INTEGER,
                o REAL,
                h REAL,
                l REAL,
                c REAL,
                v REAL,
                n INTEGER,
                PRIMARY KEY (symbol, interval, t)
            );
            "#,
        )
        .unwrap();
        conn
    }

    fn insert_bar(conn: &Connection, symbol: &str, interval: &str, t: i64, c: Option<f64>) {
        conn.execute(
            "INSERT OR REPLACE INTO candles (symbol, interval, t, t_close, o, h, l, c, v, n) \
             VALUES (?1, ?2, ?3, ?4, 1.0, 2.0, 0.5, ?5, 10.0, 3)",
            rusqlite::params![symbol, interval, t, t + 1, c],
        )
        .unwrap();
    }

    #[test]
    fn range_filter_and_null_close() {
        let p = tmp_db_path("range");
        {
            let conn = init_candles_db(&p);
            for t in [1000, 2000, 3000, 4000] {
                insert_bar(&conn, "ETH", "1h", t, Some(t as f64 / 1000.0));
            }
            insert_bar(&conn, "ETH", "1h", 5000, None);
            insert_bar(&conn, "ETH", "5m", 1000, Some(9.0));
        }

        assert_eq!(query_time_range(&p, "1h").unwrap(), Some((1000, 5000)));
        assert_eq!(query_time_range(&p, "4h").unwrap(), None);

        let all = load_candles_filtered(&p, "1h", None, None).unwrap();
        assert_eq!(all["ETH"].len(), 4);
        assert_eq!(all["ETH"][0].open, Some(1.0));

        let some = load_candles_filtered(&p, "1h", Some(2000), Some(3000)).unwrap();
        let ts: Vec<i64> = some["ETH"].iter().map(|c| c.timestamp).collect();
        assert_eq!(ts, vec![2000, 3000]);

        let to_only = load_candles_filtered(&p, "1h", None, Some(1000)).unwrap();
        assert_eq!(to_only["ETH"].len(), 1);

        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn partitions_merge_and_dedupe() {
        let p1 = tmp_db_path("merge1");
        let p2 = tmp_db_path("merge2");
        {
            let c1 = init_candles_db(&p1);
            insert_bar(&c1, "BTC", "5m", 1000, Some(1.0));
            insert_bar(&c1, "BTC", "5m", 2000, Some(2.0));
        }
        {
            let c2 = init_candles_db(&p2);
            insert_bar(&c2, "BTC", "5m", 2000, Some(2.5));
            insert_bar(&c2, "BTC", "5m", 3000, Some(3.0));
            insert_bar(&c2, "ETH", "5m", 1500, Some(7.0));
        }

        let source = SqliteCandleSource::new(vec![p1.clone(), p2.clone()], "5m");
        let map = source.load().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["BTC", "ETH"]);
        let btc = sa_core::series::extract(&map["BTC"]);
        assert_eq!(btc.timestamps, vec![1000, 2000, 3000]);
        assert_eq!(btc.closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(load_symbols(&p2, "5m").unwrap(), vec!["BTC", "ETH"]);

        let inv = source.inventory().unwrap();
        assert_eq!(inv.symbols, vec!["BTC", "ETH"]);
        assert_eq!(inv.time_range, Some((1000, 3000)));
        let empty = SqliteCandleSource::new(vec![p1.clone()], "1h").inventory().unwrap();
        assert_eq!(empty, Inventory::default());

        let _ = std::fs::remove_file(&p1);
        let _ = std::fs::remove_file(&p2);
    }

    #[test]
    fn bad_interval_and_missing_db_are_reported() {
        assert!(matches!(
            load_candles_filtered(Path::new("/nonexistent.db"), "2h", None, None),
            Err(DataError::InvalidInterval(_))
        ));
        let source = SqliteCandleSource::new(vec![tmp_db_path("absent")], "1h");
        assert!(matches!(
            source.load(),
            Err(sa_core::ScreenError::MissingInput(_))
        ));
    }
}
