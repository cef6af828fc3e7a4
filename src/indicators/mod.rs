// =============================================================================
// Streaming Technical Indicators
// =============================================================================
//
// Every indicator is a small stateful accumulator: one sample in, the current
// value out.  `push` never looks at anything but the indicator's own state and
// the new sample, and returns `None` until enough history has been seen.

pub mod atr;
pub mod ema;
pub mod lrsi;
pub mod sma;
pub mod true_range;
pub mod vwap;

pub use atr::Atr;
pub use ema::{Ema, Wema};
pub use lrsi::Lrsi;
pub use sma::Sma;
pub use true_range::TrueRange;
pub use vwap::Vwap;

use crate::market_data::Candle;

/// Streaming indicator contract.
pub trait Indicator {
    /// What one `push` consumes: a price for single-series indicators, a
    /// [`Bar`] for range- or volume-aware ones.
    type Input;

    /// Consume the next sample in order and return the current value.
    fn push(&mut self, sample: Self::Input) -> Option<f64>;

    /// Return to the just-constructed state.
    fn reset(&mut self);

    /// Post-process returned values with `formatter`. Internal state keeps
    /// the unformatted numbers.
    fn with_formatter<F>(self, formatter: F) -> Formatted<Self, F>
    where
        Self: Sized,
        F: Fn(f64) -> f64,
    {
        Formatted {
            inner: self,
            formatter,
        }
    }
}

/// An indicator whose output passes through a formatter.
pub struct Formatted<I, F> {
    inner: I,
    formatter: F,
}

impl<I, F> Indicator for Formatted<I, F>
where
    I: Indicator,
    F: Fn(f64) -> f64,
{
    type Input = I::Input;

    fn push(&mut self, sample: Self::Input) -> Option<f64> {
        self.inner.push(sample).map(&self.formatter)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Formatter rounding to `decimals` places (half away from zero).
pub fn round_to(decimals: i32) -> impl Fn(f64) -> f64 {
    let factor = 10f64.powi(decimals);
    move |v| (v * factor).round() / factor
}

/// OHLCV sample for range- and volume-aware indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Optional: VWAP falls back to an HLC typical price without it.
    pub open: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn hlc(high: f64, low: f64, close: f64) -> Self {
        Self {
            open: None,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    pub fn ohlcv(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open: Some(open),
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<&Candle> for Bar {
    fn from(c: &Candle) -> Self {
        Self::ohlcv(c.open(), c.high(), c.low(), c.close(), c.volume() as f64)
    }
}
