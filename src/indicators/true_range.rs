// =============================================================================
// True Range (TR)
// =============================================================================
//
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close and yields `None`.  A term that comes
// out NaN (missing or broken OHLC data) counts as 0.
// =============================================================================

use super::{Bar, Indicator};

#[derive(Debug, Clone, Default)]
pub struct TrueRange {
    prev_close: Option<f64>,
}

impl TrueRange {
    pub fn new() -> Self {
        Self::default()
    }
}

fn zero_if_nan(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

impl Indicator for TrueRange {
    type Input = Bar;

    fn push(&mut self, bar: Bar) -> Option<f64> {
        let value = self.prev_close.map(|prev_close| {
            let hl = zero_if_nan(bar.high - bar.low);
            let hc = zero_if_nan((bar.high - prev_close).abs());
            let lc = zero_if_nan((bar.low - prev_close).abs());
            hl.max(hc).max(lc)
        });
        self.prev_close = Some(bar.close);
        value
    }

    fn reset(&mut self) {
        self.prev_close = None;
    }
}
