use super::SignalFilter;

/// Exponential smoothing: `alpha * value + (1 - alpha) * previous`
///
/// The first sample after construction or reset passes through unchanged.
pub struct ExponentialFilter {
    alpha: f64,
    previous: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, previous: None }
    }
}

impl SignalFilter for ExponentialFilter {
    fn apply(&mut self, value: f64) -> f64 {
        let smoothed = self
            .previous
            .map_or(value, |prev| self.alpha.mul_add(value - prev, prev));
        self.previous = Some(smoothed);
        smoothed
    }

    fn reset(&mut self) {
        self.previous = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elbow_angle_smoothing() {
        let mut filter = ExponentialFilter::new(0.3);

        assert!((filter.apply(90.0) - 90.0).abs() < 1e-9);
        // Jump to full extension arrives over several frames
        assert!((filter.apply(160.0) - 111.0).abs() < 1e-9);
        assert!((filter.apply(160.0) - 125.7).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_one_passes_through() {
        let mut filter = ExponentialFilter::new(1.0);
        filter.apply(10.0);
        assert!((filter.apply(42.0) - 42.0).abs() < 1e-9);

        filter.reset();
        assert!((filter.apply(-3.0) + 3.0).abs() < 1e-9);
    }
}
