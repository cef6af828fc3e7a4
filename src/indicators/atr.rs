// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
//   TR_t  = max(H - L, |H - prevClose|, |L - prevClose|)
//   ATR_0 = SMA of the first `period` TR values
//   ATR_t = WEMA(period) of TR
//
// The first bar only primes the previous close; its null true range is
// passed through without advancing the smoothing.
// =============================================================================

use super::{Bar, Indicator, TrueRange, Wema};

#[derive(Debug, Clone)]
pub struct Atr {
    true_range: TrueRange,
    smoothing: Wema,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            true_range: TrueRange::new(),
            smoothing: Wema::new(period),
        }
    }

    pub fn period(&self) -> usize {
        self.smoothing.period()
    }
}

impl Indicator for Atr {
    type Input = Bar;

    fn push(&mut self, bar: Bar) -> Option<f64> {
        let tr = self.true_range.push(bar)?;
        self.smoothing.push(tr)
    }

    fn reset(&mut self) {
        self.true_range.reset();
        self.smoothing.reset();
    }
}
