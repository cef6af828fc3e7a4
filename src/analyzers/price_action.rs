// =============================================================================
// Price-Action Analyzer
// =============================================================================
//
// Single-candle shapes:
//   bullish_hammer   long lower wick (>= 2x body, >= half the range), small
//                    upper wick (<= body)
//   bearish_hammer   the mirror image (shooting star)
//   *_volume         the same shape on higher volume than the previous candle
//
// Three-candle range patterns (index >= 2):
//   inside_inside    each candle's range sits within the one before it (II)
//   outside_outside  each candle's range engulfs the one before it (OO)
// =============================================================================

use super::{clear_alerts, Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::market_data::Candle;
use crate::types::{AlertType, ChartSeriesGroup, IndicatorType, Sentiment};

const BULLISH_HAMMER: &str = "bullish_hammer";
const BEARISH_HAMMER: &str = "bearish_hammer";
const BULLISH_HAMMER_VOLUME: &str = "bullish_hammer_volume";
const BEARISH_HAMMER_VOLUME: &str = "bearish_hammer_volume";
const INSIDE_INSIDE: &str = "inside_inside";
const OUTSIDE_OUTSIDE: &str = "outside_outside";

const ALL_ALERTS: [&str; 6] = [
    BULLISH_HAMMER,
    BEARISH_HAMMER,
    BULLISH_HAMMER_VOLUME,
    BEARISH_HAMMER_VOLUME,
    INSIDE_INSIDE,
    OUTSIDE_OUTSIDE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hammer {
    Bullish,
    Bearish,
}

fn hammer(c: &Candle) -> Option<Hammer> {
    let range = c.high() - c.low();
    if !(range > 0.0) {
        return None;
    }
    let body = (c.close() - c.open()).abs();
    let upper_wick = c.high() - c.open().max(c.close());
    let lower_wick = c.open().min(c.close()) - c.low();

    if lower_wick >= 2.0 * body && lower_wick >= range * 0.5 && upper_wick <= body {
        Some(Hammer::Bullish)
    } else if upper_wick >= 2.0 * body && upper_wick >= range * 0.5 && lower_wick <= body {
        Some(Hammer::Bearish)
    } else {
        None
    }
}

/// `outer`'s range covers `inner`'s and is strictly wider on at least one side.
fn engulfs(outer: &Candle, inner: &Candle) -> bool {
    outer.high() >= inner.high()
        && outer.low() <= inner.low()
        && (outer.high() > inner.high() || outer.low() < inner.low())
}

pub struct PriceActionAnalyzer {
    alert_keys: Vec<String>,
}

impl PriceActionAnalyzer {
    pub fn new() -> Self {
        Self {
            alert_keys: ALL_ALERTS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for PriceActionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PriceActionAnalyzer {
    fn name(&self) -> &str {
        "price_action"
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn alert_types(&self) -> Vec<AlertType> {
        vec![
            AlertType::new(BULLISH_HAMMER, "Bullish hammer", Sentiment::Bullish),
            AlertType::new(BEARISH_HAMMER, "Bearish hammer", Sentiment::Bearish),
            AlertType::new(BULLISH_HAMMER_VOLUME, "Bullish hammer on rising volume", Sentiment::Bullish),
            AlertType::new(BEARISH_HAMMER_VOLUME, "Bearish hammer on rising volume", Sentiment::Bearish),
            AlertType::new(INSIDE_INSIDE, "Inside-inside (II)", Sentiment::Neutral),
            AlertType::new(OUTSIDE_OUTSIDE, "Outside-outside (OO)", Sentiment::Neutral),
        ]
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        Vec::new()
    }

    fn minimum_required_candles(&self) -> usize {
        3
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        _references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        for i in 0..candles.len() {
            let (before, rest) = candles.split_at_mut(i);
            let candle = &mut rest[0];
            clear_alerts(candle, &self.alert_keys);

            let prev = before.last();
            let volume_up = prev.is_some_and(|p| candle.volume() > p.volume());

            match hammer(candle) {
                Some(Hammer::Bullish) => {
                    candle.add_alert(BULLISH_HAMMER);
                    if volume_up {
                        candle.add_alert(BULLISH_HAMMER_VOLUME);
                    }
                }
                Some(Hammer::Bearish) => {
                    candle.add_alert(BEARISH_HAMMER);
                    if volume_up {
                        candle.add_alert(BEARISH_HAMMER_VOLUME);
                    }
                }
                None => {}
            }

            if let [.., first, second] = before {
                if engulfs(first, second) && engulfs(second, candle) {
                    candle.add_alert(INSIDE_INSIDE);
                } else if engulfs(second, first) && engulfs(candle, second) {
                    candle.add_alert(OUTSIDE_OUTSIDE);
                }
            }
        }
        Ok(())
    }
}
