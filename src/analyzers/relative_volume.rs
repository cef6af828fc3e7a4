// =============================================================================
// Relative Volume (RVol) Analyzer
// =============================================================================
//
//   volume_sma_{p} = SMA(p) of volume
//   rvol_{p}       = volume / volume_sma_{p}   (null while the SMA is null or 0)
//
// Alert `rvol_{p}_high` when the ratio reaches the configured threshold.

use super::{clear_alerts, Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::indicators::{Indicator, Sma};
use crate::market_data::Candle;
use crate::types::{AlertType, ChartPane, ChartSeriesGroup, IndicatorType, Sentiment};

pub struct RelativeVolumeAnalyzer {
    period: usize,
    threshold: f64,
    sma_key: String,
    rvol_key: String,
    high_key: String,
}

impl RelativeVolumeAnalyzer {
    pub fn new(period: usize, threshold: f64) -> Self {
        let period = period.max(1);
        Self {
            period,
            threshold,
            sma_key: format!("volume_sma_{period}"),
            rvol_key: format!("rvol_{period}"),
            high_key: format!("rvol_{period}_high"),
        }
    }
}

impl Default for RelativeVolumeAnalyzer {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl Analyzer for RelativeVolumeAnalyzer {
    fn name(&self) -> &str {
        "rvol"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::new(&self.sma_key, format!("Volume SMA ({})", self.period)),
            IndicatorType::new(&self.rvol_key, format!("Relative volume ({})", self.period)),
        ]
    }

    fn alert_types(&self) -> Vec<AlertType> {
        vec![AlertType::new(
            &self.high_key,
            format!("Relative volume ≥ {}", self.threshold),
            Sentiment::Neutral,
        )]
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        vec![ChartSeriesGroup::new("Relative volume", ChartPane::Separate)
            .histogram(&self.rvol_key, "RVol")]
    }

    fn minimum_required_candles(&self) -> usize {
        self.period
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        _references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        let mut volume_sma = Sma::new(self.period);
        let alert_keys = [self.high_key.clone()];

        for candle in candles.iter_mut() {
            let volume = candle.volume() as f64;
            let sma = volume_sma.push(volume);
            let ratio = sma.filter(|&s| s != 0.0).map(|s| volume / s);

            candle.set_indicator(self.sma_key.clone(), sma);
            candle.set_indicator(self.rvol_key.clone(), ratio);
            clear_alerts(candle, &alert_keys);
            if ratio.is_some_and(|r| r >= self.threshold) {
                candle.add_alert(self.high_key.clone());
            }
        }
        Ok(())
    }
}
