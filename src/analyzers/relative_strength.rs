// =============================================================================
// Volume-Weighted Relative Strength (VWRRS) Analyzer
// =============================================================================
//
// Compares a ticker with a reference series (the market index or the ticker's
// sector) candle by candle:
//
//   Δ              = close - SMA(length) of close, for each series
//   vol_weight     = SMA(volume, short) / SMA(volume, long), previous candle
//   vwrrs_{ref}    = (Δsrc / smaSrc - Δref / smaRef) * vol_weight * 100
//
// The weight is lagged by one candle so a bar's own volume never weights its
// own value.  It is parked on candle i under a `_scratch_` key, read and
// removed at candle i+1, and the last one is removed when the pass ends.
//
// Trend and alerts compare the value with the previous candle's value:
//
//   vwrrs_{ref}_trend          +1 rising, -1 falling, 0 flat
//   vwrrs_{ref}_new_strength   previous <= 0 < current
//   vwrrs_{ref}_strength       both > 0 and rising
//   vwrrs_{ref}_new_weakness   previous >= 0 > current
//   vwrrs_{ref}_weakness       both < 0 and falling
// =============================================================================

use tracing::debug;

use super::{clear_alerts, Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::indicators::{Indicator, Sma};
use crate::market_data::{Candle, SCRATCH_PREFIX};
use crate::types::{AlertType, ChartPane, ChartSeriesGroup, IndicatorType, Sentiment};

/// Which reference series the analyzer compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Market,
    Sector,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Sector => "sector",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Sector => "Sector",
        }
    }

    fn select<'a>(&self, references: &ReferenceSeries<'a>) -> Option<&'a [Candle]> {
        match self {
            Self::Market => references.market,
            Self::Sector => references.sector,
        }
    }
}

pub struct RelativeStrengthAnalyzer {
    kind: ReferenceKind,
    length: usize,
    volume_short: usize,
    volume_long: usize,
    name: String,
    value_key: String,
    trend_key: String,
    weight_key: String,
    new_strength: String,
    strength: String,
    new_weakness: String,
    weakness: String,
}

impl RelativeStrengthAnalyzer {
    pub fn new(kind: ReferenceKind, length: usize, volume_short: usize, volume_long: usize) -> Self {
        let base = format!("vwrrs_{}", kind.as_str());
        Self {
            kind,
            length: length.max(1),
            volume_short: volume_short.max(1),
            volume_long: volume_long.max(1),
            name: base.clone(),
            value_key: base.clone(),
            trend_key: format!("{base}_trend"),
            weight_key: format!("{SCRATCH_PREFIX}{base}_vol_weight"),
            new_strength: format!("{base}_new_strength"),
            strength: format!("{base}_strength"),
            new_weakness: format!("{base}_new_weakness"),
            weakness: format!("{base}_weakness"),
        }
    }

    pub fn market() -> Self {
        Self::new(ReferenceKind::Market, 20, 5, 20)
    }

    pub fn sector() -> Self {
        Self::new(ReferenceKind::Sector, 20, 5, 20)
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn value_key(&self) -> &str {
        &self.value_key
    }

    fn alert_keys(&self) -> Vec<String> {
        vec![
            self.new_strength.clone(),
            self.strength.clone(),
            self.new_weakness.clone(),
            self.weakness.clone(),
        ]
    }
}

/// Trim `reference` to the last `source.len()` candles and verify that every
/// index carries the same period and period type as the source.
pub fn align_reference<'a>(
    source: &[Candle],
    reference: &'a [Candle],
) -> Result<&'a [Candle], AnalysisError> {
    if reference.len() < source.len() {
        return Err(AnalysisError::ReferenceTooShort {
            source_len: source.len(),
            reference_len: reference.len(),
        });
    }
    let trimmed = &reference[reference.len() - source.len()..];

    for (index, (s, r)) in source.iter().zip(trimmed).enumerate() {
        if s.period() != r.period() || s.period_type() != r.period_type() {
            return Err(AnalysisError::ReferenceMisaligned {
                index,
                source_period: s.period(),
                source_type: s.period_type(),
                reference_period: r.period(),
                reference_type: r.period_type(),
            });
        }
    }
    Ok(trimmed)
}

/// Close distance from its own moving average, relative to that average.
fn relative_displacement(close: f64, sma: Option<f64>) -> Option<f64> {
    let sma = sma.filter(|&s| s != 0.0)?;
    Some((close - sma) / sma)
}

impl Analyzer for RelativeStrengthAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        let label = self.kind.label();
        vec![
            IndicatorType::new(&self.value_key, format!("VW relative strength vs {label}")),
            IndicatorType::new(&self.trend_key, format!("VW relative strength vs {label} trend")),
        ]
    }

    fn alert_types(&self) -> Vec<AlertType> {
        let label = self.kind.label();
        vec![
            AlertType::new(&self.new_strength, format!("New strength vs {label}"), Sentiment::Bullish),
            AlertType::new(&self.strength, format!("Strength vs {label}"), Sentiment::Bullish),
            AlertType::new(&self.new_weakness, format!("New weakness vs {label}"), Sentiment::Bearish),
            AlertType::new(&self.weakness, format!("Weakness vs {label}"), Sentiment::Bearish),
        ]
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        vec![ChartSeriesGroup::new(
            format!("Relative strength vs {}", self.kind.label()),
            ChartPane::Separate,
        )
        .histogram(&self.value_key, "VWRRS")]
    }

    fn minimum_required_candles(&self) -> usize {
        self.length.max(self.volume_long + 1) + 1
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        let Some(reference) = self.kind.select(references) else {
            debug!(analyzer = %self.name, "no reference series, skipping");
            return Ok(());
        };
        let reference = align_reference(candles, reference)?;

        let mut source_sma = Sma::new(self.length);
        let mut reference_sma = Sma::new(self.length);
        let mut volume_short = Sma::new(self.volume_short);
        let mut volume_long = Sma::new(self.volume_long);
        let alert_keys = self.alert_keys();

        for i in 0..candles.len() {
            let (before, rest) = candles.split_at_mut(i);
            let candle = &mut rest[0];
            let prev = before.last_mut();

            // Bridge from the previous candle, then drop it from that candle.
            let (prev_weight, prev_value) = match prev {
                Some(p) => {
                    let weight = p.indicator(&self.weight_key);
                    p.remove_indicator(&self.weight_key);
                    (weight, p.indicator(&self.value_key))
                }
                None => (None, None),
            };

            let source = relative_displacement(candle.close(), source_sma.push(candle.close()));
            let ref_close = reference[i].close();
            let against = relative_displacement(ref_close, reference_sma.push(ref_close));

            let value = match (source, against, prev_weight) {
                (Some(s), Some(r), Some(w)) => Some((s - r) * w * 100.0),
                _ => None,
            };

            let volume = candle.volume() as f64;
            let weight = match (volume_short.push(volume), volume_long.push(volume)) {
                (Some(short), Some(long)) if long != 0.0 => Some(short / long),
                _ => None,
            };
            candle.set_indicator(self.weight_key.clone(), weight);

            let trend = match (prev_value, value) {
                (Some(p), Some(v)) if v > p => Some(1.0),
                (Some(p), Some(v)) if v < p => Some(-1.0),
                (Some(_), Some(_)) => Some(0.0),
                _ => None,
            };
            candle.set_indicator(self.value_key.clone(), value);
            candle.set_indicator(self.trend_key.clone(), trend);

            clear_alerts(candle, &alert_keys);
            if let (Some(p), Some(v)) = (prev_value, value) {
                if p <= 0.0 && v > 0.0 {
                    candle.add_alert(self.new_strength.clone());
                } else if p > 0.0 && v > p {
                    candle.add_alert(self.strength.clone());
                } else if p >= 0.0 && v < 0.0 {
                    candle.add_alert(self.new_weakness.clone());
                } else if p < 0.0 && v < p {
                    candle.add_alert(self.weakness.clone());
                }
            }
        }

        if let Some(last) = candles.last_mut() {
            last.remove_indicator(&self.weight_key);
        }
        Ok(())
    }
}
