use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{CandleStore, SortOrder};
use crate::market_data::{parse_alerts, parse_indicators, Candle, CandleUpdate, TickerSymbol};
use crate::types::PeriodType;

/// Rows per `UPDATE ... FROM (VALUES ...)` statement. Three bound parameters
/// per row keeps each statement well under SQLite's variable limit.
const UPDATE_CHUNK_ROWS: usize = 5_000;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ticker_symbols (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL UNIQUE,
        sector_symbol TEXT,
        active        INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS candles (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker_symbol_id INTEGER NOT NULL REFERENCES ticker_symbols(id),
        period           INTEGER NOT NULL,
        period_type      TEXT NOT NULL,
        open             REAL NOT NULL,
        high             REAL NOT NULL,
        low              REAL NOT NULL,
        close            REAL NOT NULL,
        volume           INTEGER NOT NULL,
        indicators       TEXT NOT NULL DEFAULT '{}',
        alerts           TEXT NOT NULL DEFAULT '[]',
        UNIQUE (ticker_symbol_id, period, period_type)
    );
";

const CANDLE_COLUMNS: &str =
    "id, ticker_symbol_id, period, period_type, open, high, low, close, volume, indicators, alerts";

/// Candle row as it comes off the wire, before validation.
struct RawCandle {
    id: i64,
    ticker_symbol_id: i64,
    period: i64,
    period_type: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    indicators: String,
    alerts: String,
}

impl RawCandle {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ticker_symbol_id: row.get(1)?,
            period: row.get(2)?,
            period_type: row.get(3)?,
            open: row.get(4)?,
            high: row.get(5)?,
            low: row.get(6)?,
            close: row.get(7)?,
            volume: row.get(8)?,
            indicators: row.get(9)?,
            alerts: row.get(10)?,
        })
    }

    fn into_candle(self) -> Result<Candle> {
        let period = DateTime::from_timestamp(self.period, 0)
            .ok_or_else(|| anyhow!("candle {} has an out-of-range period {}", self.id, self.period))?;
        let period_type: PeriodType = self.period_type.parse()?;
        let volume = u64::try_from(self.volume)
            .with_context(|| format!("candle {} has a negative volume", self.id))?;

        Ok(Candle::new(
            self.ticker_symbol_id,
            period,
            period_type,
            self.open,
            self.high,
            self.low,
            self.close,
            volume,
        )
        .with_id(self.id)
        .with_analysis(parse_indicators(&self.indicators)?, parse_alerts(&self.alerts)?))
    }
}

fn ticker_symbol_from_row(row: &Row<'_>) -> rusqlite::Result<TickerSymbol> {
    Ok(TickerSymbol {
        id: row.get(0)?,
        name: row.get(1)?,
        sector_symbol: row.get(2)?,
        active: row.get(3)?,
    })
}

/// SQLite-backed [`CandleStore`].
pub struct SqliteCandleStore {
    conn: Mutex<Connection>,
}

impl SqliteCandleStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open candle database {}", path.display()))?;
        info!(path = %path.display(), "candle database opened");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("failed to apply candle schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Register a ticker symbol (or refresh its sector) and return the row.
    pub fn upsert_ticker_symbol(&self, name: &str, sector_symbol: Option<&str>) -> Result<TickerSymbol> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO ticker_symbols (name, sector_symbol) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET sector_symbol = excluded.sector_symbol",
            params![name, sector_symbol],
        )?;
        conn.query_row(
            "SELECT id, name, sector_symbol, active FROM ticker_symbols WHERE name = ?1",
            params![name],
            ticker_symbol_from_row,
        )
        .with_context(|| format!("failed to read back ticker symbol {name}"))
    }

    pub fn set_active(&self, name: &str, active: bool) -> Result<()> {
        self.conn.lock().execute(
            "UPDATE ticker_symbols SET active = ?1 WHERE name = ?2",
            params![active, name],
        )?;
        Ok(())
    }

    /// Ingest OHLCV rows. An existing `(ticker, period, period_type)` row has
    /// its prices refreshed and keeps its analysis columns.
    pub fn upsert_candles(&self, candles: &[Candle]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO candles
                     (ticker_symbol_id, period, period_type, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(ticker_symbol_id, period, period_type) DO UPDATE SET
                     open = excluded.open, high = excluded.high, low = excluded.low,
                     close = excluded.close, volume = excluded.volume",
            )?;
            for c in candles {
                let volume = i64::try_from(c.volume()).context("volume exceeds storage range")?;
                written += stmt.execute(params![
                    c.ticker_symbol_id(),
                    c.period().timestamp(),
                    c.period_type().as_str(),
                    c.open(),
                    c.high(),
                    c.low(),
                    c.close(),
                    volume,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    fn query_candles(&self, sql: &str, params: &[Value]) -> Result<Vec<Candle>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
            .query_map(params_from_iter(params.iter()), RawCandle::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawCandle::into_candle).collect()
    }

    fn candles_sql(filter: &str, order: SortOrder, limit: Option<usize>) -> String {
        let limit = limit.map(|l| format!(" LIMIT {l}")).unwrap_or_default();
        format!(
            "SELECT {CANDLE_COLUMNS} FROM candles WHERE {filter} AND period_type = ?2
             ORDER BY period {}{limit}",
            order.as_sql()
        )
    }
}

impl CandleStore for SqliteCandleStore {
    async fn active_ticker_symbols(&self) -> Result<Vec<TickerSymbol>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, sector_symbol, active FROM ticker_symbols
             WHERE active = 1 ORDER BY name",
        )?;
        let symbols = stmt
            .query_map([], ticker_symbol_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(symbols)
    }

    async fn ticker_symbols_by_name(&self, names: &[String]) -> Result<Vec<TickerSymbol>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "SELECT id, name, sector_symbol, active FROM ticker_symbols WHERE name IN ({placeholders})"
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let symbols = stmt
            .query_map(params_from_iter(names.iter()), ticker_symbol_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(symbols)
    }

    async fn candles(
        &self,
        ticker_symbol_id: i64,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>> {
        let sql = Self::candles_sql("ticker_symbol_id = ?1", order, limit);
        self.query_candles(
            &sql,
            &[
                Value::Integer(ticker_symbol_id),
                Value::Text(period_type.as_str().to_string()),
            ],
        )
        .with_context(|| format!("failed to load candles for ticker {ticker_symbol_id} ({period_type})"))
    }

    async fn candles_by_ticker_name(
        &self,
        name: &str,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>> {
        let id: Option<i64> = self
            .conn
            .lock()
            .query_row("SELECT id FROM ticker_symbols WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?;
        match id {
            Some(id) => self.candles(id, period_type, order, limit).await,
            None => Ok(Vec::new()),
        }
    }

    async fn batch_update_indicators_and_alerts(&self, rows: &[CandleUpdate]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut updated = 0;

        for chunk in rows.chunks(UPDATE_CHUNK_ROWS) {
            let values = vec!["(?, ?, ?)"; chunk.len()].join(", ");
            let sql = format!(
                "WITH v(id, indicators, alerts) AS (VALUES {values})
                 UPDATE candles SET indicators = v.indicators, alerts = v.alerts
                 FROM v WHERE candles.id = v.id"
            );
            let params: Vec<Value> = chunk
                .iter()
                .flat_map(|r| {
                    [
                        Value::Integer(r.candle_id),
                        Value::Text(r.indicators_json.clone()),
                        Value::Text(r.alerts_json.clone()),
                    ]
                })
                .collect();
            updated += tx
                .execute(&sql, params_from_iter(params.iter()))
                .context("batched indicator/alert update failed")?;
        }

        tx.commit()?;
        debug!(rows = rows.len(), updated, "batched indicator/alert update committed");
        Ok(updated)
    }
}
