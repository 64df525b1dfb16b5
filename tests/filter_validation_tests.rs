//! Tests for filter parameter validation

use form_tracker::filters::{
    create_filter, exponential::ExponentialFilter, landmark::LandmarkSmoother, median::MedianFilter,
    moving_average::MovingAverageFilter, SignalFilter,
};
use form_tracker::landmarks::{BodyPart, Landmark, Pose};

#[test]
#[should_panic(expected = "Window size must be greater than 0")]
fn test_moving_average_zero_window() {
    let _ = MovingAverageFilter::new(0);
}

#[test]
#[should_panic(expected = "Window size must be greater than 0")]
fn test_median_zero_window() {
    let _ = MedianFilter::new(0);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_zero_alpha() {
    let _ = ExponentialFilter::new(0.0);
}

#[test]
#[should_panic(expected = "Alpha must be in (0, 1]")]
fn test_exponential_alpha_above_one() {
    let _ = ExponentialFilter::new(1.5);
}

#[test]
fn test_landmark_smoother_rejects_alpha() {
    for alpha in [0.0, -0.5, 1.5, f64::NAN] {
        assert!(LandmarkSmoother::new(alpha, 0.2).is_err(), "{alpha} should be rejected");
    }
    assert!(LandmarkSmoother::new(1.0, 0.2).is_ok());
}

#[test]
fn test_valid_edge_values() {
    // Window of one passes values straight through
    let mut ma = MovingAverageFilter::new(1);
    assert!((ma.apply(3.0) - 3.0).abs() < f64::EPSILON);
    assert!((ma.apply(7.0) - 7.0).abs() < f64::EPSILON);

    let mut median = MedianFilter::new(1);
    assert!((median.apply(-2.0) + 2.0).abs() < f64::EPSILON);

    // Alpha of one disables smoothing
    let mut exp = ExponentialFilter::new(1.0);
    exp.apply(10.0);
    assert!((exp.apply(20.0) - 20.0).abs() < f64::EPSILON);
}

#[test]
fn test_create_filter_specs() {
    for spec in ["none", "moving_average", "moving_average:10", "median:3", "exponential:0.2", " Median:5 "] {
        assert!(create_filter(spec).is_ok(), "{spec} should be accepted");
    }
    for spec in ["", "kalman", "median:2", "moving_average:-1", "exponential:0", "exponential:nan"] {
        assert!(create_filter(spec).is_err(), "{spec} should be rejected");
    }
}

#[test]
fn test_median_rejects_spike() {
    let mut filter = create_filter("median:3").unwrap();
    filter.apply(1.0);
    filter.apply(1.0);
    // A single-frame spike is dropped
    assert!((filter.apply(50.0) - 1.0).abs() < f64::EPSILON);

    filter.reset();
    assert!((filter.apply(50.0) - 50.0).abs() < f64::EPSILON);
}

#[test]
fn test_landmark_smoother_reset() {
    let mut smoother = LandmarkSmoother::new(0.5, 0.2).unwrap();
    let mut pose = Pose::default();
    *pose.get_mut(BodyPart::LeftWrist) = Landmark::new(0.0, 0.0, 0.9);
    smoother.smooth(&pose);

    *pose.get_mut(BodyPart::LeftWrist) = Landmark::new(100.0, 0.0, 0.9);
    let smoothed = smoother.smooth(&pose);
    assert!((smoothed.get(BodyPart::LeftWrist).x - 50.0).abs() < 1e-9);

    smoother.reset();
    let fresh = smoother.smooth(&pose);
    assert!((fresh.get(BodyPart::LeftWrist).x - 100.0).abs() < 1e-9);
}
