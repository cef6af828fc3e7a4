// =============================================================================
// Exponential Moving Average (EMA) and Wilder's EMA (WEMA)
// =============================================================================
//
// EMA gives more weight to recent samples than the SMA does.
//
// Formula:
//   EMA:  exponent = 2 / (period + 1)
//   WEMA: exponent = 1 / period          (Wilder smoothing)
//   value_t = (sample_t - value_{t-1}) * exponent + value_{t-1}
//
// The first value is seeded with the SMA of the first `period` samples; until
// then the indicator returns `None`.
// =============================================================================

use super::{Indicator, Sma};

#[derive(Debug, Clone)]
pub struct Ema {
    exponent: f64,
    seed: Sma,
    value: Option<f64>,
}

impl Ema {
    /// Standard EMA, exponent `2 / (period + 1)`.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self::with_exponent(period, 2.0 / (period + 1) as f64)
    }

    fn with_exponent(period: usize, exponent: f64) -> Self {
        Self {
            exponent,
            seed: Sma::new(period),
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.seed.period()
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

impl Indicator for Ema {
    type Input = f64;

    fn push(&mut self, sample: f64) -> Option<f64> {
        let next = match self.value {
            Some(prev) => (sample - prev) * self.exponent + prev,
            None => self.seed.push(sample)?,
        };
        self.value = Some(next);
        Some(next)
    }

    fn reset(&mut self) {
        self.seed.reset();
        self.value = None;
    }
}

/// Wilder's smoothed moving average, exponent `1 / period`.
#[derive(Debug, Clone)]
pub struct Wema(Ema);

impl Wema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self(Ema::with_exponent(period, 1.0 / period as f64))
    }

    pub fn period(&self) -> usize {
        self.0.period()
    }
}

impl Indicator for Wema {
    type Input = f64;

    fn push(&mut self, sample: f64) -> Option<f64> {
        self.0.push(sample)
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}
