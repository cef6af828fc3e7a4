use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PeriodType;

/// Prefix of per-pass working keys analyzers may park on a candle. Keys with
/// this prefix are never part of persisted output.
pub const SCRATCH_PREFIX: &str = "_scratch_";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar for one ticker symbol at one `(period, period_type)`.
///
/// The OHLCV and identity fields are fixed at construction. Analyzers only
/// ever touch `indicators` and `alerts`, through the methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    id: i64,
    ticker_symbol_id: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    period: DateTime<Utc>,
    period_type: PeriodType,
    indicators: HashMap<String, Option<f64>>,
    alerts: BTreeSet<String>,
}

impl Candle {
    /// A freshly ingested candle: no storage id yet, empty analysis fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker_symbol_id: i64,
        period: DateTime<Utc>,
        period_type: PeriodType,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            id: 0,
            ticker_symbol_id,
            open,
            high,
            low,
            close,
            volume,
            period,
            period_type,
            indicators: HashMap::new(),
            alerts: BTreeSet::new(),
        }
    }

    /// Attach the storage row id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Attach previously persisted analysis output.
    pub fn with_analysis(
        mut self,
        indicators: HashMap<String, Option<f64>>,
        alerts: BTreeSet<String>,
    ) -> Self {
        self.indicators = indicators;
        self.alerts = alerts;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn ticker_symbol_id(&self) -> i64 {
        self.ticker_symbol_id
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    pub fn period(&self) -> DateTime<Utc> {
        self.period
    }

    pub fn period_type(&self) -> PeriodType {
        self.period_type
    }

    // -- indicators ----------------------------------------------------------

    /// Numeric value stored under `key`; `None` when absent or null.
    pub fn indicator(&self, key: &str) -> Option<f64> {
        self.indicators.get(key).copied().flatten()
    }

    pub fn has_indicator(&self, key: &str) -> bool {
        self.indicators.contains_key(key)
    }

    /// Store a value (or an explicit null) under `key`.
    pub fn set_indicator(&mut self, key: impl Into<String>, value: Option<f64>) {
        self.indicators.insert(key.into(), value);
    }

    pub fn remove_indicator(&mut self, key: &str) -> Option<Option<f64>> {
        self.indicators.remove(key)
    }

    pub fn indicators(&self) -> &HashMap<String, Option<f64>> {
        &self.indicators
    }

    // -- alerts --------------------------------------------------------------

    pub fn has_alert(&self, key: &str) -> bool {
        self.alerts.contains(key)
    }

    pub fn add_alert(&mut self, key: impl Into<String>) {
        self.alerts.insert(key.into());
    }

    pub fn remove_alert(&mut self, key: &str) -> bool {
        self.alerts.remove(key)
    }

    pub fn alerts(&self) -> &BTreeSet<String> {
        &self.alerts
    }

    /// Drop every indicator value and alert.
    pub fn clear_analysis(&mut self) {
        self.indicators.clear();
        self.alerts.clear();
    }

    /// Remove working keys written with [`SCRATCH_PREFIX`].
    pub fn clear_scratch(&mut self) {
        self.indicators.retain(|k, _| !k.starts_with(SCRATCH_PREFIX));
    }

    /// `indicators` in its persisted JSON-object form.
    pub fn indicators_json(&self) -> Result<String> {
        serde_json::to_string(&self.indicators).context("failed to serialise candle indicators")
    }

    /// `alerts` in its persisted JSON-array form.
    pub fn alerts_json(&self) -> Result<String> {
        serde_json::to_string(&self.alerts).context("failed to serialise candle alerts")
    }
}

/// Parse the persisted `indicators` column.
pub fn parse_indicators(json: &str) -> Result<HashMap<String, Option<f64>>> {
    if json.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(json).with_context(|| format!("invalid indicators JSON: {json}"))
}

/// Parse the persisted `alerts` column.
pub fn parse_alerts(json: &str) -> Result<BTreeSet<String>> {
    if json.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    serde_json::from_str(json).with_context(|| format!("invalid alerts JSON: {json}"))
}

/// One row of a batched indicator/alert write, matched by candle id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleUpdate {
    pub candle_id: i64,
    pub indicators_json: String,
    pub alerts_json: String,
}

impl CandleUpdate {
    pub fn from_candle(candle: &Candle) -> Result<Self> {
        Ok(Self {
            candle_id: candle.id(),
            indicators_json: candle.indicators_json()?,
            alerts_json: candle.alerts_json()?,
        })
    }
}

/// A tradable symbol whose candles are analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSymbol {
    pub id: i64,
    pub name: String,
    /// Symbol of the sector reference series (e.g. a sector ETF), if any.
    #[serde(default)]
    pub sector_symbol: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_candle() -> Candle {
        Candle::new(
            7,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            PeriodType::Day,
            10.0,
            12.0,
            9.0,
            11.0,
            1_000,
        )
        .with_id(42)
    }

    #[test]
    fn null_indicator_reads_as_none_but_is_present() {
        let mut c = sample_candle();
        c.set_indicator("sma_20", None);
        assert!(c.has_indicator("sma_20"));
        assert_eq!(c.indicator("sma_20"), None);
        c.set_indicator("sma_20", Some(10.5));
        assert_eq!(c.indicator("sma_20"), Some(10.5));
    }

    #[test]
    fn alerts_have_no_duplicates() {
        let mut c = sample_candle();
        c.add_alert("a");
        c.add_alert("a");
        c.add_alert("b");
        assert_eq!(c.alerts().len(), 2);
        assert!(c.remove_alert("a"));
        assert!(!c.has_alert("a"));
    }

    #[test]
    fn clear_scratch_keeps_regular_keys() {
        let mut c = sample_candle();
        c.set_indicator("atr_14", Some(1.0));
        c.set_indicator(format!("{SCRATCH_PREFIX}weight"), Some(0.5));
        c.clear_scratch();
        assert_eq!(c.indicators().len(), 1);
        assert!(c.has_indicator("atr_14"));
    }

    #[test]
    fn update_row_uses_persisted_json_shape() {
        let mut c = sample_candle();
        c.set_indicator("rvol_20", None);
        c.add_alert("bullish_hammer");
        let row = CandleUpdate::from_candle(&c).unwrap();
        assert_eq!(row.candle_id, 42);
        assert_eq!(row.indicators_json, r#"{"rvol_20":null}"#);
        assert_eq!(row.alerts_json, r#"["bullish_hammer"]"#);

        let indicators = parse_indicators(&row.indicators_json).unwrap();
        assert_eq!(indicators.get("rvol_20"), Some(&None));
        let alerts = parse_alerts(&row.alerts_json).unwrap();
        assert!(alerts.contains("bullish_hammer"));
    }

    #[test]
    fn empty_columns_parse_as_empty() {
        assert!(parse_indicators("").unwrap().is_empty());
        assert!(parse_alerts(" ").unwrap().is_empty());
        assert!(parse_alerts("{not json").is_err());
    }
}
