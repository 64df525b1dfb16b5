//! Joint angles and simple body ratios computed from landmark positions.

use crate::{constants::EPSILON, landmarks::Point2};

/// Angle ABC at vertex `b`, in degrees within `[0, 180]`
///
/// Returns `NaN` when either arm of the angle has zero length.
#[must_use]
pub fn joint_angle(a: Point2, b: Point2, c: Point2) -> f64 {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let mag_ba = bax.hypot(bay);
    let mag_bc = bcx.hypot(bcy);
    if mag_ba < EPSILON || mag_bc < EPSILON {
        return f64::NAN;
    }

    let cos = ((bax * bcx + bay * bcy) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Angle between `joint -> end` and the upward image vertical, in degrees
///
/// Image y grows downwards, so "up" is the negative y direction. Degenerate
/// segments yield 0.
#[must_use]
pub fn vertical_angle(joint: Point2, end: Point2) -> f64 {
    let dx = end.x - joint.x;
    let dy = end.y - joint.y;
    let mag = dx.hypot(dy);
    if mag < EPSILON {
        return 0.0;
    }
    // Dot product with (0, -1)
    let cos = (-dy / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Tilt of segment AB from horizontal, folded into `[0, 90]` degrees
#[must_use]
pub fn line_tilt(a: Point2, b: Point2) -> f64 {
    let angle = (b.y - a.y).atan2(b.x - a.x).to_degrees().abs();
    angle.min(180.0 - angle)
}

/// Piecewise-linear interpolation clamped to the output range
///
/// `x` is mapped from `from` onto `to`; values outside `from` clamp to the
/// nearest end, matching `numpy.interp` for a two-point table. `from` may be
/// given in either order.
#[must_use]
pub fn interp(x: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    let ((x0, y0), (x1, y1)) = if from.0 <= from.1 {
        ((from.0, to.0), (from.1, to.1))
    } else {
        ((from.1, to.1), (from.0, to.0))
    };

    if (x1 - x0).abs() < EPSILON {
        return y0;
    }
    if x <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Horizontal span of one pair of points relative to another
///
/// Returns `fallback` when the reference span is zero.
#[must_use]
pub fn width_ratio(a_left: Point2, a_right: Point2, ref_left: Point2, ref_right: Point2, fallback: f64) -> f64 {
    let reference = (ref_right.x - ref_left.x).abs();
    if reference < EPSILON {
        return fallback;
    }
    (a_right.x - a_left.x).abs() / reference
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn test_joint_angle_right_and_straight() {
        let right = joint_angle(p(0.0, -10.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((right - 90.0).abs() < 1e-9);

        let straight = joint_angle(p(-5.0, 0.0), p(0.0, 0.0), p(5.0, 0.0));
        assert!((straight - 180.0).abs() < 1e-9);

        let folded = joint_angle(p(5.0, 0.0), p(0.0, 0.0), p(5.0, 0.0));
        assert!(folded.abs() < 1e-6);
    }

    #[test]
    fn test_joint_angle_degenerate() {
        assert!(joint_angle(p(1.0, 1.0), p(1.0, 1.0), p(3.0, 4.0)).is_nan());
    }

    #[test]
    fn test_vertical_angle() {
        // Straight up from the joint
        assert!(vertical_angle(p(0.0, 0.0), p(0.0, -50.0)).abs() < 1e-9);
        // Horizontal
        assert!((vertical_angle(p(0.0, 0.0), p(50.0, 0.0)) - 90.0).abs() < 1e-9);
        // Straight down
        assert!((vertical_angle(p(0.0, 0.0), p(0.0, 50.0)) - 180.0).abs() < 1e-9);
        assert_eq!(vertical_angle(p(3.0, 3.0), p(3.0, 3.0)), 0.0);
    }

    #[test]
    fn test_interp_clamps() {
        let from = (35.0, 170.0);
        let to = (100.0, 0.0);
        assert_eq!(interp(35.0, from, to), 100.0);
        assert_eq!(interp(170.0, from, to), 0.0);
        assert_eq!(interp(10.0, from, to), 100.0);
        assert_eq!(interp(180.0, from, to), 0.0);
        assert!((interp(102.5, from, to) - 50.0).abs() < 1e-9);
        // Reversed input range gives the same mapping
        assert!((interp(102.5, (170.0, 35.0), (0.0, 100.0)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_ratio_and_tilt() {
        let r = width_ratio(p(0.0, 0.0), p(30.0, 0.0), p(0.0, 5.0), p(20.0, 5.0), 1.0);
        assert!((r - 1.5).abs() < 1e-9);
        assert_eq!(width_ratio(p(0.0, 0.0), p(30.0, 0.0), p(4.0, 5.0), p(4.0, 9.0), 1.0), 1.0);

        assert!(line_tilt(p(0.0, 0.0), p(10.0, 0.0)).abs() < 1e-9);
        assert!(line_tilt(p(10.0, 0.0), p(0.0, 0.0)).abs() < 1e-9);
        assert!((line_tilt(p(0.0, 0.0), p(0.0, 10.0)) - 90.0).abs() < 1e-9);
    }
}
