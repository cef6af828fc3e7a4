// =============================================================================
// Analyzers
// =============================================================================
//
// An analyzer runs one or more streaming indicators over an ordered candle
// sequence and writes its results onto the candles in place.  Analyzers in a
// set run one after another over the same candles, so the order of the set is
// part of the contract: a later analyzer may read keys an earlier one wrote.
//
// Analyzers hold configuration only.  Indicator state is created fresh inside
// every `analyze` call, so one analyzer instance can be reused across tickers.

pub mod atr;
pub mod lrsi;
pub mod price_action;
pub mod relative_strength;
pub mod relative_volume;
pub mod trend_cross;

pub use atr::AtrAnalyzer;
pub use lrsi::LrsiAnalyzer;
pub use price_action::PriceActionAnalyzer;
pub use relative_strength::{ReferenceKind, RelativeStrengthAnalyzer};
pub use relative_volume::RelativeVolumeAnalyzer;
pub use trend_cross::{MovingAverage, TrendCrossAnalyzer};

use crate::error::AnalysisError;
use crate::market_data::Candle;
use crate::types::{AlertType, ChartSeriesGroup, IndicatorType};

/// Reference series a cross-ticker analyzer may compare against, ascending by
/// period.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceSeries<'a> {
    pub market: Option<&'a [Candle]>,
    pub sector: Option<&'a [Candle]>,
}

impl<'a> ReferenceSeries<'a> {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Capability set shared by every analyzer.
pub trait Analyzer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn indicator_types(&self) -> Vec<IndicatorType>;

    fn alert_types(&self) -> Vec<AlertType>;

    fn chart_series(&self) -> Vec<ChartSeriesGroup>;

    /// Shortest sequence for which this analyzer's values are defined and
    /// its alerts can be evaluated.
    fn minimum_required_candles(&self) -> usize;

    /// Write indicator values and alerts onto `candles` (oldest first).
    ///
    /// Shorter-than-minimum input is not an error: values stay null and no
    /// alerts fire.
    fn analyze(
        &self,
        candles: &mut [Candle],
        references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError>;
}

/// Remove every alert in `keys` from `candle`, so a re-run starts clean.
pub(crate) fn clear_alerts(candle: &mut Candle, keys: &[String]) {
    for key in keys {
        candle.remove_alert(key);
    }
}
