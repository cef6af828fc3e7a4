// =============================================================================
// Volume-Weighted Average Price (VWAP)
// =============================================================================
//
//   typical = (O + H + L + C) / 4   when the open is known
//           = (H + L + C) / 3       otherwise
//   VWAP    = sum(volume * typical) / sum(volume)
//
// Accumulates from construction (or the last reset); there is no window.
// =============================================================================

use super::{Bar, Indicator};

#[derive(Debug, Clone, Default)]
pub struct Vwap {
    price_volume: f64,
    volume: f64,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }
}

fn typical_price(bar: &Bar) -> f64 {
    match bar.open {
        Some(open) => (open + bar.high + bar.low + bar.close) / 4.0,
        None => (bar.high + bar.low + bar.close) / 3.0,
    }
}

impl Indicator for Vwap {
    type Input = Bar;

    fn push(&mut self, bar: Bar) -> Option<f64> {
        self.price_volume += bar.volume * typical_price(&bar);
        self.volume += bar.volume;
        if self.volume == 0.0 {
            return None;
        }
        Some(self.price_volume / self.volume)
    }

    fn reset(&mut self) {
        self.price_volume = 0.0;
        self.volume = 0.0;
    }
}
