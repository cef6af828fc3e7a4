// =============================================================================
// Shared types used across the candle analysis engine
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bar granularity of a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodType {
    #[serde(rename = "1min")]
    Minute1,
    #[serde(rename = "5min")]
    Minute5,
    #[serde(rename = "15min")]
    Minute15,
    #[serde(rename = "30min")]
    Minute30,
    #[serde(rename = "hour")]
    Hour,
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
}

impl PeriodType {
    pub const ALL: [PeriodType; 9] = [
        Self::Minute1,
        Self::Minute5,
        Self::Minute15,
        Self::Minute30,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Stable string form, shared by storage rows and reference-cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1min",
            Self::Minute5 => "5min",
            Self::Minute15 => "15min",
            Self::Minute30 => "30min",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl Default for PeriodType {
    fn default() -> Self {
        Self::Day
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| anyhow::anyhow!("unknown period type: {s}"))
    }
}

/// Direction an alert leans towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

// =============================================================================
// Analyzer metadata (read by presentation collaborators only)
// =============================================================================

/// An indicator key an analyzer writes, with a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorType {
    pub key: String,
    pub label: String,
}

impl IndicatorType {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// An alert key an analyzer may raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertType {
    pub key: String,
    pub label: String,
    pub sentiment: Sentiment,
}

impl AlertType {
    pub fn new(key: impl Into<String>, label: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sentiment,
        }
    }
}

/// Where a chart series group is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartPane {
    /// On top of the price candles.
    Overlay,
    /// In its own pane below the price chart.
    Separate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStyle {
    Line,
    Histogram,
}

/// One plotted indicator key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub indicator_key: String,
    pub label: String,
    pub style: SeriesStyle,
}

/// A set of series rendered together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeriesGroup {
    pub label: String,
    pub pane: ChartPane,
    pub series: Vec<ChartSeries>,
}

impl ChartSeriesGroup {
    pub fn new(label: impl Into<String>, pane: ChartPane) -> Self {
        Self {
            label: label.into(),
            pane,
            series: Vec::new(),
        }
    }

    pub fn line(mut self, indicator_key: impl Into<String>, label: impl Into<String>) -> Self {
        self.series.push(ChartSeries {
            indicator_key: indicator_key.into(),
            label: label.into(),
            style: SeriesStyle::Line,
        });
        self
    }

    pub fn histogram(mut self, indicator_key: impl Into<String>, label: impl Into<String>) -> Self {
        self.series.push(ChartSeries {
            indicator_key: indicator_key.into(),
            label: label.into(),
            style: SeriesStyle::Histogram,
        });
        self
    }
}
