// =============================================================================
// Trend-Cross Analyzer (SMA cross / EMA cross)
// =============================================================================
//
// For every configured `(short, long)` pair of moving averages:
//
//   cross_up    short - long goes from <= 0 to > 0, or the close breaks from
//               at/below the upper average to above both averages
//   cross_down  the mirror image
//   value_zone  close sits between the two averages (neutral)
//
// Cross alerts need both averages on the current AND previous candle; a null
// anywhere suppresses them.  At most one of up/down fires per candle.
// =============================================================================

use super::{clear_alerts, Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::indicators::{Ema, Indicator, Sma};
use crate::market_data::Candle;
use crate::types::{AlertType, ChartPane, ChartSeriesGroup, IndicatorType, Sentiment};

/// Which moving average a trend-cross analyzer compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovingAverage {
    Simple,
    Exponential,
}

impl MovingAverage {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Simple => "sma",
            Self::Exponential => "ema",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Simple => "SMA",
            Self::Exponential => "EMA",
        }
    }

    fn build(&self, period: usize) -> Box<dyn Indicator<Input = f64>> {
        match self {
            Self::Simple => Box::new(Sma::new(period)),
            Self::Exponential => Box::new(Ema::new(period)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Up,
    Down,
}

/// Short/long values and close for one candle.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    short: f64,
    long: f64,
    close: f64,
}

impl Snapshot {
    fn upper(&self) -> f64 {
        self.short.max(self.long)
    }

    fn lower(&self) -> f64 {
        self.short.min(self.long)
    }

    fn in_value_zone(&self) -> bool {
        self.close >= self.lower() && self.close <= self.upper()
    }
}

fn detect_cross(prev: &Snapshot, cur: &Snapshot) -> Option<Cross> {
    let prev_diff = prev.short - prev.long;
    let diff = cur.short - cur.long;

    if prev_diff <= 0.0 && diff > 0.0 {
        Some(Cross::Up)
    } else if prev_diff >= 0.0 && diff < 0.0 {
        Some(Cross::Down)
    } else if prev.close <= prev.upper() && cur.close > cur.upper() {
        Some(Cross::Up)
    } else if prev.close >= prev.lower() && cur.close < cur.lower() {
        Some(Cross::Down)
    } else {
        None
    }
}

struct Pair {
    short: usize,
    long: usize,
    short_key: String,
    long_key: String,
    cross_up: String,
    cross_down: String,
    value_zone: String,
}

pub struct TrendCrossAnalyzer {
    average: MovingAverage,
    periods: Vec<usize>,
    pairs: Vec<Pair>,
}

impl TrendCrossAnalyzer {
    /// Pairs are normalised so the shorter period comes first.
    pub fn new(average: MovingAverage, pairs: &[(usize, usize)]) -> Self {
        let prefix = average.prefix();
        let pairs: Vec<Pair> = pairs
            .iter()
            .map(|&(a, b)| {
                let (short, long) = (a.min(b).max(1), a.max(b).max(1));
                let base = format!("{prefix}_{short}_{long}");
                Pair {
                    short,
                    long,
                    short_key: format!("{prefix}_{short}"),
                    long_key: format!("{prefix}_{long}"),
                    cross_up: format!("{base}_cross_up"),
                    cross_down: format!("{base}_cross_down"),
                    value_zone: format!("{base}_value_zone"),
                }
            })
            .collect();

        let mut periods: Vec<usize> = pairs.iter().flat_map(|p| [p.short, p.long]).collect();
        periods.sort_unstable();
        periods.dedup();

        Self {
            average,
            periods,
            pairs,
        }
    }

    pub fn sma(pairs: &[(usize, usize)]) -> Self {
        Self::new(MovingAverage::Simple, pairs)
    }

    pub fn ema(pairs: &[(usize, usize)]) -> Self {
        Self::new(MovingAverage::Exponential, pairs)
    }

    fn value_key(&self, period: usize) -> String {
        format!("{}_{period}", self.average.prefix())
    }

    fn all_alert_keys(&self) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|p| [p.cross_up.clone(), p.cross_down.clone(), p.value_zone.clone()])
            .collect()
    }

    fn snapshot(candle: &Candle, pair: &Pair) -> Option<Snapshot> {
        Some(Snapshot {
            short: candle.indicator(&pair.short_key)?,
            long: candle.indicator(&pair.long_key)?,
            close: candle.close(),
        })
    }
}

impl Analyzer for TrendCrossAnalyzer {
    fn name(&self) -> &str {
        match self.average {
            MovingAverage::Simple => "sma_cross",
            MovingAverage::Exponential => "ema_cross",
        }
    }

    fn indicator_types(&self) -> Vec<IndicatorType> {
        let label = self.average.label();
        self.periods
            .iter()
            .map(|&p| IndicatorType::new(self.value_key(p), format!("{label} ({p})")))
            .collect()
    }

    fn alert_types(&self) -> Vec<AlertType> {
        let label = self.average.label();
        self.pairs
            .iter()
            .flat_map(|p| {
                let pair = format!("{label} {}/{}", p.short, p.long);
                [
                    AlertType::new(&p.cross_up, format!("{pair} cross up"), Sentiment::Bullish),
                    AlertType::new(&p.cross_down, format!("{pair} cross down"), Sentiment::Bearish),
                    AlertType::new(&p.value_zone, format!("{pair} value zone"), Sentiment::Neutral),
                ]
            })
            .collect()
    }

    fn chart_series(&self) -> Vec<ChartSeriesGroup> {
        let label = self.average.label();
        let group = self
            .periods
            .iter()
            .fold(ChartSeriesGroup::new(label, ChartPane::Overlay), |g, &p| {
                g.line(self.value_key(p), format!("{label} {p}"))
            });
        vec![group]
    }

    fn minimum_required_candles(&self) -> usize {
        self.periods.last().copied().unwrap_or(1) + 1
    }

    fn analyze(
        &self,
        candles: &mut [Candle],
        _references: &ReferenceSeries<'_>,
    ) -> Result<(), AnalysisError> {
        let mut averages: Vec<(String, Box<dyn Indicator<Input = f64>>)> = self
            .periods
            .iter()
            .map(|&p| (self.value_key(p), self.average.build(p)))
            .collect();
        let alert_keys = self.all_alert_keys();

        for i in 0..candles.len() {
            let (before, rest) = candles.split_at_mut(i);
            let candle = &mut rest[0];
            let prev = before.last();

            let close = candle.close();
            for (key, average) in averages.iter_mut() {
                candle.set_indicator(key.clone(), average.push(close));
            }
            clear_alerts(candle, &alert_keys);

            for pair in &self.pairs {
                let Some(cur) = Self::snapshot(candle, pair) else {
                    continue;
                };
                if cur.in_value_zone() {
                    candle.add_alert(pair.value_zone.clone());
                }
                let Some(prev) = prev.and_then(|p| Self::snapshot(p, pair)) else {
                    continue;
                };
                match detect_cross(&prev, &cur) {
                    Some(Cross::Up) => candle.add_alert(pair.cross_up.clone()),
                    Some(Cross::Down) => candle.add_alert(pair.cross_down.clone()),
                    None => {}
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures;

    fn run(analyzer: &TrendCrossAnalyzer, closes: &[f64]) -> Vec<Candle> {
        let mut candles = fixtures::from_closes(closes);
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        candles
    }

    #[test]
    fn detects_cross_down_then_up() {
        let analyzer = TrendCrossAnalyzer::sma(&[(1, 3)]);
        let candles = run(&analyzer, &[10.0, 10.0, 10.0, 10.0, 5.0, 5.0, 5.0, 20.0]);

        let downs: Vec<usize> = (0..candles.len())
            .filter(|&i| candles[i].has_alert("sma_1_3_cross_down"))
            .collect();
        let ups: Vec<usize> = (0..candles.len())
            .filter(|&i| candles[i].has_alert("sma_1_3_cross_up"))
            .collect();
        assert_eq!(downs, vec![4]);
        assert_eq!(ups, vec![7]);
    }

    #[test]
    fn value_zone_when_close_between_averages() {
        let analyzer = TrendCrossAnalyzer::sma(&[(2, 4)]);
        let candles = run(&analyzer, &[10.0, 10.0, 10.0, 10.0, 12.0, 10.8]);
        let last = &candles[5];
        assert!(last.has_alert("sma_2_4_value_zone"));
        assert!(!last.has_alert("sma_2_4_cross_up"));
        assert!(!last.has_alert("sma_2_4_cross_down"));
    }

    #[test]
    fn no_cross_when_previous_value_is_null() {
        // First candle with both averages defined cannot compare backwards.
        let analyzer = TrendCrossAnalyzer::sma(&[(1, 3)]);
        let candles = run(&analyzer, &[1.0, 1.0, 50.0]);
        assert!(candles[1].indicator("sma_3").is_none());
        assert!(!candles[2].has_alert("sma_1_3_cross_up"));
        assert!(!candles[2].has_alert("sma_1_3_cross_down"));
    }

    #[test]
    fn up_and_down_never_fire_together() {
        let analyzer = TrendCrossAnalyzer::ema(&[(3, 8), (5, 13)]);
        let mut candles = fixtures::wavy(1, 200, 0.3);
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();

        let mut fired = 0;
        for (i, c) in candles.iter().enumerate() {
            for base in ["ema_3_8", "ema_5_13"] {
                let up = c.has_alert(&format!("{base}_cross_up"));
                let down = c.has_alert(&format!("{base}_cross_down"));
                assert!(!(up && down), "both fired at {i}");
                fired += usize::from(up || down);
            }
        }
        assert!(fired > 0, "wavy series should produce some crosses");
        // Nothing before the long average plus one comparison candle.
        assert!(candles[..13].iter().all(|c| !c.has_alert("ema_5_13_cross_up")
            && !c.has_alert("ema_5_13_cross_down")));
    }

    #[test]
    fn rerun_does_not_leave_stale_alerts() {
        let analyzer = TrendCrossAnalyzer::sma(&[(1, 3)]);
        let mut candles = fixtures::from_closes(&[10.0, 10.0, 10.0, 10.0, 5.0]);
        candles[4].add_alert("sma_1_3_cross_up");
        candles[4].add_alert("someone_elses_alert");
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        assert!(!candles[4].has_alert("sma_1_3_cross_up"));
        assert!(candles[4].has_alert("sma_1_3_cross_down"));
        assert!(candles[4].has_alert("someone_elses_alert"));
    }

    #[test]
    fn minimum_is_longest_period_plus_one() {
        assert_eq!(TrendCrossAnalyzer::sma(&[(20, 50), (50, 200)]).minimum_required_candles(), 201);
        assert_eq!(TrendCrossAnalyzer::ema(&[(21, 9)]).minimum_required_candles(), 22);
    }

    #[test]
    fn metadata_lists_each_period_once() {
        let analyzer = TrendCrossAnalyzer::sma(&[(10, 20), (20, 50)]);
        let keys: Vec<String> = analyzer.indicator_types().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["sma_10", "sma_20", "sma_50"]);
        assert_eq!(analyzer.alert_types().len(), 6);
        assert_eq!(analyzer.chart_series()[0].series.len(), 3);
    }

    #[test]
    fn metadata_is_stable_across_runs() {
        let analyzer = TrendCrossAnalyzer::ema(&[(5, 10), (10, 20)]);
        let before = (analyzer.indicator_types(), analyzer.alert_types(), analyzer.chart_series());
        let mut candles = fixtures::wavy(1, 40, 0.0);
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        analyzer.analyze(&mut candles, &ReferenceSeries::none()).unwrap();
        let after = (analyzer.indicator_types(), analyzer.alert_types(), analyzer.chart_series());
        assert_eq!(before, after);
    }
}
