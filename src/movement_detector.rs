//! Movement detection for tracking elbow swing during arm exercises.
//!
//! The trainers feed the elbow's horizontal offset from the shoulder every
//! frame. A steady elbow keeps that offset nearly constant; swinging shows up
//! as a wide range over a short window.

use std::collections::VecDeque;

/// Range-based swing detector
///
/// Keeps a window of recent positions and averages the window range over a
/// second, shorter window.
pub struct MovementDetector {
    position_window: usize,
    movement_window: usize,
    positions: VecDeque<f64>,
    movements: VecDeque<f64>,
}

impl MovementDetector {
    /// Create a new movement detector
    #[must_use]
    pub fn new(position_window: usize, movement_window: usize) -> Self {
        Self {
            position_window,
            movement_window,
            positions: VecDeque::with_capacity(position_window),
            movements: VecDeque::with_capacity(movement_window),
        }
    }

    /// Update with a new position and return the smoothed movement amount
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, position: f64) -> f64 {
        push_bounded(&mut self.positions, position, self.position_window);

        // Need at least 3 points for a meaningful range
        if self.positions.len() < 3 {
            return 0.0;
        }

        let stats = calculate_stats(&self.positions);
        push_bounded(&mut self.movements, stats.range, self.movement_window);

        self.movements.iter().sum::<f64>() / self.movements.len() as f64
    }

    /// Statistics of the position window
    pub fn stats(&self) -> Option<Statistics> {
        if self.positions.is_empty() {
            return None;
        }
        Some(calculate_stats(&self.positions))
    }

    /// Reset the detector
    pub fn reset(&mut self) {
        self.positions.clear();
        self.movements.clear();
    }
}

/// Swing detector that weights recent samples more heavily
///
/// Small jitter is suppressed: a window whose weighted variance or range is
/// below the configured floors reports no movement at all.
pub struct WeightedMovementDetector {
    position_window: usize,
    movement_window: usize,
    min_variance: f64,
    min_range: f64,
    damping: f64,
    positions: VecDeque<f64>,
    movements: VecDeque<f64>,
}

impl WeightedMovementDetector {
    /// Detector with the bicep curl tuning (15/10 windows, variance 35, range 30)
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(15, 10, 35.0, 30.0, 0.5)
    }

    #[must_use]
    pub fn with_params(
        position_window: usize,
        movement_window: usize,
        min_variance: f64,
        min_range: f64,
        damping: f64,
    ) -> Self {
        Self {
            position_window,
            movement_window,
            min_variance,
            min_range,
            damping,
            positions: VecDeque::with_capacity(position_window),
            movements: VecDeque::with_capacity(movement_window),
        }
    }

    /// Update with a new position and return the damped movement amount
    pub fn update(&mut self, position: f64) -> f64 {
        push_bounded(&mut self.positions, position, self.position_window);

        if self.positions.len() < 3 {
            return 0.0;
        }

        let stats = calculate_stats(&self.positions);
        let (mut weighted_var, mut total_weight) = (0.0, 0.0);
        for (i, pos) in self.positions.iter().enumerate() {
            let w = recency_weight(i);
            weighted_var += (pos - stats.mean).powi(2) * w;
            total_weight += w;
        }
        if weighted_var / total_weight < self.min_variance {
            return 0.0;
        }
        if stats.range < self.min_range {
            return 0.0;
        }

        push_bounded(&mut self.movements, stats.range, self.movement_window);

        let (mut sum, mut weights) = (0.0, 0.0);
        for (i, value) in self.movements.iter().enumerate() {
            let w = recency_weight(i);
            sum += value * w;
            weights += w;
        }
        sum / weights * self.damping
    }

    pub fn reset(&mut self) {
        self.positions.clear();
        self.movements.clear();
    }
}

impl Default for WeightedMovementDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_precision_loss)]
fn recency_weight(index: usize) -> f64 {
    ((index + 1) as f64).powf(1.5)
}

fn push_bounded(buffer: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if capacity == 0 {
        return;
    }
    if buffer.len() >= capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

/// Calculate statistics for a data window
#[allow(clippy::cast_precision_loss)]
fn calculate_stats(data: &VecDeque<f64>) -> Statistics {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;

    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Statistics {
        mean,
        std_dev,
        min,
        max,
        range: max - min,
    }
}

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}
