//! Frame geometry helpers shared by the capture loop and the overlay.

pub mod safe_cast;

use crate::{Error, Result};
use opencv::core::{self, Mat, Size};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use safe_cast::f64_to_i32;

/// Target size when scaling `(width, height)` to `target_width`, keeping the aspect ratio
///
/// # Errors
///
/// Returns an error if any dimension is not positive
pub fn scaled_size(width: i32, height: i32, target_width: i32) -> Result<Size> {
    if width <= 0 || height <= 0 || target_width <= 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot scale {width}x{height} to width {target_width}"
        )));
    }
    let ratio = f64::from(target_width) / f64::from(width);
    let target_height = f64_to_i32(f64::from(height) * ratio)?.max(1);
    Ok(Size::new(target_width, target_height))
}

/// Resize a frame to `target_width` while keeping its aspect ratio
///
/// Frames already at the target width are returned as a cheap copy.
///
/// # Errors
///
/// Returns an error if the frame is empty or `OpenCV` fails to resize
pub fn resize_with_aspect_ratio(frame: &Mat, target_width: i32) -> Result<Mat> {
    if frame.empty() {
        return Err(Error::InvalidInput("Cannot resize an empty frame".to_string()));
    }
    if frame.cols() == target_width {
        return Ok(frame.clone());
    }

    let size = scaled_size(frame.cols(), frame.rows(), target_width)?;
    let interpolation = if target_width < frame.cols() {
        InterpolationFlags::INTER_AREA
    } else {
        InterpolationFlags::INTER_LINEAR
    };

    let mut resized = Mat::default();
    imgproc::resize(frame, &mut resized, size, 0.0, 0.0, interpolation as i32)?;
    Ok(resized)
}

/// Mirror a frame horizontally, selfie style
///
/// # Errors
///
/// Returns an error if `OpenCV` fails to flip the image
pub fn mirror(frame: &Mat) -> Result<Mat> {
    let mut flipped = Mat::default();
    core::flip(frame, &mut flipped, 1)?;
    Ok(flipped)
}
