// =============================================================================
// Laguerre RSI (LRSI)
// =============================================================================
//
// A four-tap Laguerre filter cascade smoothed by `gamma`:
//
//   L0 = (1 - g) * price + g * L0'
//   L1 = -g * L0 + L0' + g * L1'
//   L2 = -g * L1 + L1' + g * L2'
//   L3 = -g * L2 + L2' + g * L3'
//
// cu = sum of positive (Li - Li+1), cd = sum of |negative (Li - Li+1)|
// LRSI = cu / (cu + cd), or 0 when both are zero.  Output lies in [0, 1] and
// is defined from the first sample (taps start at zero).
// =============================================================================

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Lrsi {
    gamma: f64,
    taps: [f64; 4],
}

impl Lrsi {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            taps: [0.0; 4],
        }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for Lrsi {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Indicator for Lrsi {
    type Input = f64;

    fn push(&mut self, price: f64) -> Option<f64> {
        let g = self.gamma;
        let [p0, p1, p2, p3] = self.taps;

        let l0 = (1.0 - g) * price + g * p0;
        let l1 = -g * l0 + p0 + g * p1;
        let l2 = -g * l1 + p1 + g * p2;
        let l3 = -g * l2 + p2 + g * p3;
        self.taps = [l0, l1, l2, l3];

        let (mut cu, mut cd) = (0.0, 0.0);
        for diff in [l0 - l1, l1 - l2, l2 - l3] {
            if diff >= 0.0 {
                cu += diff;
            } else {
                cd -= diff;
            }
        }

        let total = cu + cd;
        Some(if total != 0.0 { cu / total } else { 0.0 })
    }

    fn reset(&mut self) {
        self.taps = [0.0; 4];
    }
}
