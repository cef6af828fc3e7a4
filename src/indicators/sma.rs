// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the last `period` samples.  The window is re-summed
// oldest-first on every push rather than kept as a running total, so two
// indicators that have seen the same last `period` samples return the same
// bits regardless of how much older history each of them consumed.
// =============================================================================

use std::collections::VecDeque;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
}

impl Sma {
    /// A `period` of zero is treated as one.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    type Input = f64;

    fn push(&mut self, sample: f64) -> Option<f64> {
        self.window.push_back(sample);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.period as f64)
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(period: usize, samples: &[f64]) -> Vec<Option<f64>> {
        let mut sma = Sma::new(period);
        samples.iter().map(|&s| sma.push(s)).collect()
    }

    #[test]
    fn sma_3_over_one_to_five() {
        let out = run(3, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_null_for_first_period_minus_one() {
        let out = run(5, &[10.0; 8]);
        assert!(out[..4].iter().all(Option::is_none));
        assert!(out[4..].iter().all(|v| *v == Some(10.0)));
    }

    #[test]
    fn sma_window_stays_bounded() {
        let mut sma = Sma::new(4);
        for i in 0..1_000 {
            sma.push(i as f64);
        }
        assert_eq!(sma.window.len(), 4);
        assert_eq!(sma.push(1_000.0), Some(998.5));
    }

    #[test]
    fn sma_period_zero_behaves_as_one() {
        assert_eq!(run(0, &[3.0, 4.0]), vec![Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_reset_restarts_warm_up() {
        let mut sma = Sma::new(2);
        sma.push(1.0);
        assert_eq!(sma.push(3.0), Some(2.0));
        sma.reset();
        assert_eq!(sma.push(5.0), None);
        assert_eq!(sma.push(7.0), Some(6.0));
    }

    #[test]
    fn sma_identical_windows_identical_bits() {
        let long: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin() * 13.1 + 50.0).collect();
        let full = run(7, &long);
        let tail = run(7, &long[long.len() - 7..]);
        assert_eq!(full.last(), tail.last());
    }
}
