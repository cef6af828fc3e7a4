// =============================================================================
// Engine Configuration — analysis batch settings with atomic save
// =============================================================================
//
// Everything a batch run needs lives here: where the candles are, which
// tickers and period types to analyse, the update mode, and the parameters of
// every analyzer.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry a serde
// default so an older config file missing new fields still loads.
//
// Environment overrides (applied after loading, `.env` honoured):
//   CANDLE_DB_PATH        database path
//   CANDLE_TICKERS        comma-separated ticker symbols (empty = all active)
//   CANDLE_PERIOD_TYPES   comma-separated period types, e.g. "day,week"
//   CANDLE_DELTA_UPDATE   true / false
//   CANDLE_RESET          true / false
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzers::{
    Analyzer, AtrAnalyzer, LrsiAnalyzer, PriceActionAnalyzer, ReferenceKind,
    RelativeStrengthAnalyzer, RelativeVolumeAnalyzer, TrendCrossAnalyzer,
};
use crate::service::BatchOptions;
use crate::types::PeriodType;

pub const DEFAULT_CONFIG_PATH: &str = "candle_analysis.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_database_path() -> String {
    "candles.db".to_string()
}

fn default_market_symbol() -> Option<String> {
    Some("SPY".to_string())
}

fn default_period_types() -> Vec<PeriodType> {
    vec![PeriodType::Day]
}

fn default_atr_period() -> usize {
    14
}

fn default_sma_pairs() -> Vec<(usize, usize)> {
    vec![(20, 50), (50, 200)]
}

fn default_ema_pairs() -> Vec<(usize, usize)> {
    vec![(9, 21)]
}

fn default_lrsi_gamma() -> f64 {
    0.5
}

fn default_rvol_period() -> usize {
    20
}

fn default_rvol_threshold() -> f64 {
    2.0
}

fn default_rs_length() -> usize {
    20
}

fn default_rs_volume_short() -> usize {
    5
}

fn default_rs_volume_long() -> usize {
    20
}

// =============================================================================
// AnalyzerSettings
// =============================================================================

/// Parameters and enable flags for every analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(default = "default_true")]
    pub enable_atr: bool,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// `(short, long)` pairs for the SMA cross analyzer.
    #[serde(default = "default_true")]
    pub enable_sma_cross: bool,
    #[serde(default = "default_sma_pairs")]
    pub sma_pairs: Vec<(usize, usize)>,

    #[serde(default = "default_true")]
    pub enable_ema_cross: bool,
    #[serde(default = "default_ema_pairs")]
    pub ema_pairs: Vec<(usize, usize)>,

    #[serde(default = "default_true")]
    pub enable_lrsi: bool,
    #[serde(default = "default_lrsi_gamma")]
    pub lrsi_gamma: f64,

    #[serde(default = "default_true")]
    pub enable_rvol: bool,
    #[serde(default = "default_rvol_period")]
    pub rvol_period: usize,
    /// Ratio at which `rvol_{p}_high` fires.
    #[serde(default = "default_rvol_threshold")]
    pub rvol_threshold: f64,

    #[serde(default = "default_true")]
    pub enable_price_action: bool,

    #[serde(default = "default_true")]
    pub enable_market_strength: bool,
    #[serde(default = "default_true")]
    pub enable_sector_strength: bool,
    #[serde(default = "default_rs_length")]
    pub relative_strength_length: usize,
    #[serde(default = "default_rs_volume_short")]
    pub relative_strength_volume_short: usize,
    #[serde(default = "default_rs_volume_long")]
    pub relative_strength_volume_long: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            enable_atr: true,
            atr_period: default_atr_period(),
            enable_sma_cross: true,
            sma_pairs: default_sma_pairs(),
            enable_ema_cross: true,
            ema_pairs: default_ema_pairs(),
            enable_lrsi: true,
            lrsi_gamma: default_lrsi_gamma(),
            enable_rvol: true,
            rvol_period: default_rvol_period(),
            rvol_threshold: default_rvol_threshold(),
            enable_price_action: true,
            enable_market_strength: true,
            enable_sector_strength: true,
            relative_strength_length: default_rs_length(),
            relative_strength_volume_short: default_rs_volume_short(),
            relative_strength_volume_long: default_rs_volume_long(),
        }
    }
}

impl AnalyzerSettings {
    /// Build the enabled analyzers in their run order.
    pub fn build(&self) -> Vec<Box<dyn Analyzer>> {
        let mut analyzers: Vec<Box<dyn Analyzer>> = Vec::new();

        if self.enable_atr {
            analyzers.push(Box::new(AtrAnalyzer::new(self.atr_period)));
        }
        if self.enable_sma_cross && !self.sma_pairs.is_empty() {
            analyzers.push(Box::new(TrendCrossAnalyzer::sma(&self.sma_pairs)));
        }
        if self.enable_ema_cross && !self.ema_pairs.is_empty() {
            analyzers.push(Box::new(TrendCrossAnalyzer::ema(&self.ema_pairs)));
        }
        if self.enable_lrsi {
            analyzers.push(Box::new(LrsiAnalyzer::new(self.lrsi_gamma)));
        }
        if self.enable_rvol {
            analyzers.push(Box::new(RelativeVolumeAnalyzer::new(
                self.rvol_period,
                self.rvol_threshold,
            )));
        }
        if self.enable_price_action {
            analyzers.push(Box::new(PriceActionAnalyzer::new()));
        }
        for (enabled, kind) in [
            (self.enable_market_strength, ReferenceKind::Market),
            (self.enable_sector_strength, ReferenceKind::Sector),
        ] {
            if enabled {
                analyzers.push(Box::new(RelativeStrengthAnalyzer::new(
                    kind,
                    self.relative_strength_length,
                    self.relative_strength_volume_short,
                    self.relative_strength_volume_long,
                )));
            }
        }
        analyzers
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database holding ticker symbols and candles.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Market reference series for relative strength; `None` disables it.
    #[serde(default = "default_market_symbol")]
    pub market_symbol: Option<String>,

    /// Ticker symbols to analyse.  Empty means every active symbol.
    #[serde(default)]
    pub ticker_symbols: Vec<String>,

    #[serde(default = "default_period_types")]
    pub period_types: Vec<PeriodType>,

    #[serde(default)]
    pub delta_update: bool,

    #[serde(default)]
    pub reset_indicators_and_alerts: bool,

    #[serde(default)]
    pub analyzers: AnalyzerSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            market_symbol: default_market_symbol(),
            ticker_symbols: Vec::new(),
            period_types: default_period_types(),
            delta_update: false,
            reset_indicators_and_alerts: false,
            analyzers: AnalyzerSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = ?config.ticker_symbols,
            period_types = ?config.period_types,
            "engine config loaded"
        );
        Ok(config)
    }

    /// Persist to `path` via a `.tmp` sibling and a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }

    /// Apply `CANDLE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = var("CANDLE_DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.database_path = path.trim().to_string();
        }
        if let Some(tickers) = var("CANDLE_TICKERS") {
            self.ticker_symbols = split_list(&tickers).map(str::to_uppercase).collect();
        }
        if let Some(period_types) = var("CANDLE_PERIOD_TYPES") {
            let parsed = split_list(&period_types)
                .map(|s| s.parse::<PeriodType>())
                .collect::<Result<Vec<_>>>()
                .context("invalid CANDLE_PERIOD_TYPES")?;
            if !parsed.is_empty() {
                self.period_types = parsed;
            }
        }
        if let Some(v) = var("CANDLE_DELTA_UPDATE") {
            self.delta_update = parse_flag("CANDLE_DELTA_UPDATE", &v)?;
        }
        if let Some(v) = var("CANDLE_RESET") {
            self.reset_indicators_and_alerts = parse_flag("CANDLE_RESET", &v)?;
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            period_types: self.period_types.clone(),
            reset_indicators_and_alerts: self.reset_indicators_and_alerts,
            delta_update: self.delta_update,
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{name} must be a boolean, got {other:?}"),
    }
}
