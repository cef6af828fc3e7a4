// =============================================================================
// Laguerre RSI Analyzer
// =============================================================================
//
// Writes `lrsi` and raises:
//   lrsi_oversold       value <= 0.2
//   lrsi_overbought     value >= 0.8
//   lrsi_bullish_cross  previous <= 0.2 < current
//   lrsi_bearish_cross  previous >= 0.8 > current

use super::{clear_alerts, Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::indicators::{Indicator, Lrsi};
use crate::market_data::Candle;
use crate::types::{AlertType, ChartPane, ChartSeriesGroup, IndicatorType, Sentiment};

pub const LRSI_KEY: &str = "lrsi";

const OVERSOLD: f64 = 0.2;
const OVERBOUGHT: f64 = 0.8;

const ALERT_OVERSOLD: &str = "lrsi_oversold";
const ALERT_OVERBOUGHT: &str = "lrsi_overbought";
const ALERT_BULLISH_CROSS: &str = "lrsi_bullish_cross";
const ALERT_BEARISH_CROSS: &str = "lrsi_bearish_cross";

pub struct LrsiAnalyzer {
    gamma: f64,
    alert_keys: Vec<String>,
}

impl LrsiAnalyzer {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            alert_keys: [ALERT_OVERSOLD, ALERT_OVERBOUGHT, ALERT_BULLISH_CROSS, ALERT_BEARISH_CROSS]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl Default for LrsiAnalyzer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Analyzer for LrsiAnalyzer {
    fn name(&self) -> &str {
        "lrsi"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::new(LRSI_KEY, format!("Laguerre RSI (γ {})", self.gamma))]
    }

    fn alert_types(&self) -> Vec<AlertType> {
        vec![
            AlertType::new(ALERT_OVERSOLD, "LRSI oversold", Sentiment::Bullish),
            AlertType::new(ALERT_OVERBOUGHT, "LRSI overbought", Sentiment::Bearish),
            AlertType::new(ALERT_BULLISH_CROSS, "LRSI leaves oversold", Sentiment::Bullish),
            AlertType::new(ALERT_BEARISH_CROSS, "LRSI leaves overbought", Sentiment::Bearish),
        ]
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        vec![ChartSeriesGroup::new("Laguerre RSI", ChartPane::Separate).line(LRSI_KEY, "LRSI")]
    }

    fn minimum_required_candles(&self) -> usize {
        2
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        _references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        let mut lrsi = Lrsi::new(self.gamma);
        let mut prev: Option<f64> = None;

        for candle in candles.iter_mut() {
            let value = lrsi.push(candle.close());
            candle.set_indicator(LRSI_KEY, value);
            clear_alerts(candle, &self.alert_keys);

            if let Some(v) = value {
                if v <= OVERSOLD {
                    candle.add_alert(ALERT_OVERSOLD);
                }
                if v >= OVERBOUGHT {
                    candle.add_alert(ALERT_OVERBOUGHT);
                }
                if let Some(p) = prev {
                    if p <= OVERSOLD && v > OVERSOLD {
                        candle.add_alert(ALERT_BULLISH_CROSS);
                    } else if p >= OVERBOUGHT && v < OVERBOUGHT {
                        candle.add_alert(ALERT_BEARISH_CROSS);
                    }
                }
            }
            prev = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures;

    #[test]
    fn every_candle_gets_a_bounded_value() {
        let mut candles = fixtures::wavy(1, 80, 1.0);
        LrsiAnalyzer::default().analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        for c in &candles {
            let v = c.indicator(LRSI_KEY).unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn falling_then_rising_leaves_oversold() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        closes.extend((0..10).map(|i| 71.0 + i as f64 * 3.0));
        let mut candles = fixtures::from_closes(&closes);
        LrsiAnalyzer::default().analyze(&mut candles, &ReferenceSeries::none()).unwrap();

        assert!(candles[29].has_alert(ALERT_OVERSOLD));
        let crossed = candles[30..].iter().filter(|c| c.has_alert(ALERT_BULLISH_CROSS)).count();
        assert_eq!(crossed, 1);
        assert!(candles[20..].iter().all(|c| !c.has_alert(ALERT_BEARISH_CROSS)));
    }

    #[test]
    fn first_candle_never_crosses() {
        let mut candles = fixtures::from_closes(&[50.0]);
        LrsiAnalyzer::default().analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        assert!(!candles[0].has_alert(ALERT_BULLISH_CROSS));
        assert!(!candles[0].has_alert(ALERT_BEARISH_CROSS));
    }
}
