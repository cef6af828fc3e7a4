// =============================================================================
// ATR Analyzer
// =============================================================================
//
// Writes `atr_{p}` (rounded to 4 decimals) and `atr_pct_{p}`, the ATR as a
// percentage of the close.  No alerts.

use super::{Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::indicators::{round_to, Atr, Bar, Indicator};
use crate::market_data::Candle;
use crate::types::{AlertType, ChartPane, ChartSeriesGroup, IndicatorType};

pub struct AtrAnalyzer {
    period: usize,
    atr_key: String,
    pct_key: String,
}

impl AtrAnalyzer {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            atr_key: format!("atr_{period}"),
            pct_key: format!("atr_pct_{period}"),
        }
    }

    pub fn atr_key(&self) -> &str {
        &self.atr_key
    }
}

impl Default for AtrAnalyzer {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Analyzer for AtrAnalyzer {
    fn name(&self) -> &str {
        "atr"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::new(&self.atr_key, format!("ATR ({})", self.period)),
            IndicatorType::new(&self.pct_key, format!("ATR % of close ({})", self.period)),
        ]
    }

    fn alert_types(&self) -> Vec<AlertType> {
        Vec::new()
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        vec![ChartSeriesGroup::new(format!("ATR ({})", self.period), ChartPane::Separate)
            .line(&self.atr_key, "ATR")]
    }

    fn minimum_required_candles(&self) -> usize {
        self.period + 1
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        _references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        let mut atr = Atr::new(self.period).with_formatter(round_to(4));

        for candle in candles.iter_mut() {
            let value = atr.push(Bar::from(&*candle));
            let pct = value.and_then(|v| {
                let close = candle.close();
                (close != 0.0).then(|| v / close * 100.0)
            });
            candle.set_indicator(self.atr_key.clone(), value);
            candle.set_indicator(self.pct_key.clone(), pct);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures;

    #[test]
    fn writes_null_until_warm() {
        let mut candles = fixtures::from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        AtrAnalyzer::new(3).analyze(&mut candles, &ReferenceSeries::none()).unwrap();

        for c in &candles[..3] {
            assert!(c.has_indicator("atr_3"));
            assert_eq!(c.indicator("atr_3"), None);
            assert_eq!(c.indicator("atr_pct_3"), None);
        }
        // TR for each step is max(2, |c+1 - prev|, |c-1 - prev|) = 2
        assert_eq!(candles[3].indicator("atr_3"), Some(2.0));
        let pct = candles[4].indicator("atr_pct_3").unwrap();
        assert!((pct - 2.0 / 14.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn minimum_is_period_plus_one() {
        assert_eq!(AtrAnalyzer::new(14).minimum_required_candles(), 15);
    }

    #[test]
    fn short_sequence_does_not_fail() {
        let mut candles = fixtures::from_closes(&[10.0]);
        assert!(AtrAnalyzer::default().analyze(&mut candles, &ReferenceSeries::none()).is_ok());
        assert!(candles[0].alerts().is_empty());
    }

    #[test]
    fn metadata_is_stable_across_runs() {
        let analyzer = AtrAnalyzer::default();
        let before = (analyzer.indicator_types(), analyzer.alert_types(), analyzer.chart_series());
        let mut candles = fixtures::wavy(1, 40, 0.0);
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        let after = (analyzer.indicator_types(), analyzer.alert_types(), analyzer.chart_series());
        assert_eq!(before, after);
    }
}
