use super::SignalFilter;
use std::collections::VecDeque;

/// Sliding-window median; drops single-frame keypoint jumps that a mean would
/// smear across the window
pub struct MedianFilter {
    window_size: usize,
    window: VecDeque<f64>,
    scratch: Vec<f64>,
}

impl MedianFilter {
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            window: VecDeque::with_capacity(window_size),
            scratch: Vec::with_capacity(window_size),
        }
    }
}

impl SignalFilter for MedianFilter {
    fn apply(&mut self, value: f64) -> f64 {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);

        self.scratch.clear();
        self.scratch.extend(self.window.iter().copied());
        self.scratch.sort_by(f64::total_cmp);

        let mid = self.scratch.len() / 2;
        if self.scratch.len() % 2 == 0 {
            (self.scratch[mid - 1] + self.scratch[mid]) / 2.0
        } else {
            self.scratch[mid]
        }
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
