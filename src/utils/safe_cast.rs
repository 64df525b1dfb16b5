//! Checked numeric conversions for pixel coordinates and chart layout

use crate::{Error, Result};

/// Convert usize to i32, failing on overflow
///
/// # Errors
///
/// Returns an error if the value exceeds i32::MAX
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Round f64 to the nearest i32
///
/// # Errors
///
/// Returns an error if the value is not finite or outside i32 range
#[allow(clippy::cast_possible_truncation)] // Range checked before the cast
pub fn f64_to_i32(value: f64) -> Result<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Ok(rounded as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to i32"
        )))
    }
}

/// Round and clamp a coordinate into `[min, max]`; non-finite maps to `min`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamped before the cast
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(f64::from(min), f64::from(max));
    (clamped as i32).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_usize_to_i32() {
        assert_eq!(usize_to_i32(42).unwrap(), 42);
        assert_eq!(usize_to_i32(0).unwrap(), 0);
        assert_eq!(usize_to_i32(i32::MAX as usize).unwrap(), i32::MAX);

        if std::mem::size_of::<usize>() > 4 {
            assert!(usize_to_i32(i32::MAX as usize + 1).is_err());
        }
    }

    #[test]
    fn test_f64_to_i32_rounds() {
        assert_eq!(f64_to_i32(41.6).unwrap(), 42);
        assert_eq!(f64_to_i32(-41.6).unwrap(), -42);
        assert_eq!(f64_to_i32(0.4).unwrap(), 0);

        assert!(f64_to_i32(f64::INFINITY).is_err());
        assert!(f64_to_i32(f64::NAN).is_err());
        assert!(f64_to_i32(2_147_483_648.0).is_err());
    }

    #[test]
    fn test_f64_to_i32_clamp() {
        assert_eq!(f64_to_i32_clamp(320.2, 0, 639), 320);
        assert_eq!(f64_to_i32_clamp(-15.0, 0, 639), 0);
        assert_eq!(f64_to_i32_clamp(900.0, 0, 639), 639);
        assert_eq!(f64_to_i32_clamp(f64::NAN, 0, 639), 0);
        // Swapped bounds
        assert_eq!(f64_to_i32_clamp(50.0, 100, 0), 50);
    }

    proptest! {
        #[test]
        fn prop_usize_to_i32_within_bounds(value in 0..=i32::MAX as usize) {
            let result = usize_to_i32(value);
            prop_assert!(result.is_ok());
            prop_assert_eq!(result.unwrap() as usize, value);
        }

        #[test]
        fn prop_f64_to_i32_integers_exact(value in i32::MIN..=i32::MAX) {
            prop_assert_eq!(f64_to_i32(f64::from(value)).unwrap(), value);
        }

        #[test]
        fn prop_clamp_always_within_bounds(
            value in any::<f64>(),
            min in -10_000i32..10_000,
            max in -10_000i32..10_000
        ) {
            let result = f64_to_i32_clamp(value, min, max);
            prop_assert!(result >= min.min(max));
            prop_assert!(result <= min.max(max));
        }
    }
}
