use crate::{
    constants::NUM_BODY_LANDMARKS,
    landmarks::{Landmark, Pose},
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use ndarray::{Array4, ArrayViewD, CowArray};
use opencv::core::{Mat, Size, Vec3b};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Input size of the MoveNet Lightning model
const DEFAULT_POSE_INPUT_SIZE: i32 = 192;

/// Single-person body pose detector using a MoveNet `ONNX` model
///
/// The model takes an NHWC RGB image with pixel values in `[0, 255]` and
/// returns `[1, 1, 17, 3]` keypoints as normalised `(y, x, score)`.
pub struct PoseDetector {
    session: Session,
    input_size: i32,
    min_confidence: f64,
}

impl PoseDetector {
    /// Create a new pose detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model file does not exist or cannot be loaded
    /// - The ONNX runtime environment cannot be created
    /// - The model has no inputs
    pub fn new<P: AsRef<Path>>(model_path: P, min_confidence: f64) -> Result<Self> {
        let model_path = model_path.as_ref();
        log::info!("Initializing PoseDetector with model: {}", model_path.display());
        if !model_path.exists() {
            return Err(Error::ModelError(format!(
                "Pose model not found: {}",
                model_path.display()
            )));
        }

        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        // Read the square input size from the model; NHWC so height is dim 1
        let input = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelError("Model has no inputs".to_string()))?;
        let input_size = input
            .dimensions
            .get(1)
            .copied()
            .flatten()
            .and_then(|d| i32::try_from(d).ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_POSE_INPUT_SIZE);
        log::debug!("Pose model input size: {input_size}");

        Ok(Self {
            session,
            input_size,
            min_confidence,
        })
    }

    /// Model input resolution in pixels
    #[must_use]
    pub fn input_size(&self) -> i32 {
        self.input_size
    }

    /// Detect the pose of the first person in a BGR frame
    ///
    /// Returns `Ok(None)` when the mean keypoint score is below the configured
    /// minimum confidence.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing, inference or output parsing fails.
    pub fn detect(&self, frame: &Mat) -> Result<Option<Pose>> {
        let width = f64::from(frame.cols());
        let height = f64::from(frame.rows());
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidInput("Empty frame".to_string()));
        }

        let input = self.preprocess(frame)?;
        let output = self.forward(input)?;
        let pose = keypoints_to_pose(&output.view(), width, height)?;

        if pose.average_visibility() < self.min_confidence {
            log::trace!("Pose rejected, mean score {:.2}", pose.average_visibility());
            return Ok(None);
        }
        Ok(Some(pose))
    }

    /// Resize to the model input and convert BGR to an RGB NHWC tensor
    #[allow(clippy::cast_sign_loss)] // Input size is positive
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let size = self.input_size as usize;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut data = vec![0.0f32; size * size * 3];
        for row in 0..size {
            for col in 0..size {
                let pixel = rgb.at_2d::<Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                let base = (row * size + col) * 3;
                for ch in 0..3 {
                    data[base + ch] = f32::from(pixel[ch]);
                }
            }
        }

        Array4::from_shape_vec((1, size, size, 3), data)
            .map_err(|e| Error::ModelError(format!("Failed to create input array: {e}")))
    }

    /// Run forward pass through the model
    fn forward(&self, input: Array4<f32>) -> Result<ndarray::ArrayD<f32>> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let keypoints = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;

        let tensor = keypoints.try_extract::<f32>()?;
        let view = tensor.view();
        Ok(view.to_owned())
    }
}

/// Map `[1, 1, 17, 3]` normalised `(y, x, score)` output onto frame pixels
///
/// # Errors
///
/// Returns an error if the output holds fewer than 17 keypoints.
pub fn keypoints_to_pose(output: &ArrayViewD<'_, f32>, width: f64, height: f64) -> Result<Pose> {
    let flat: Vec<f32> = output.iter().copied().collect();
    if flat.len() < NUM_BODY_LANDMARKS * 3 {
        return Err(Error::ModelOutputError(format!(
            "Expected {} keypoint values, got {} (shape {:?})",
            NUM_BODY_LANDMARKS * 3,
            flat.len(),
            output.shape()
        )));
    }

    let mut pose = Pose::default();
    for (lm, kp) in pose.landmarks.iter_mut().zip(flat.chunks_exact(3)) {
        *lm = Landmark::new(
            f64::from(kp[1]) * width,
            f64::from(kp[0]) * height,
            f64::from(kp[2]).clamp(0.0, 1.0),
        );
    }
    Ok(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::BodyPart;
    use ndarray::Array4;

    #[test]
    fn test_keypoints_to_pose_scales_to_frame() {
        let mut output = Array4::<f32>::zeros((1, 1, NUM_BODY_LANDMARKS, 3));
        let elbow = BodyPart::RightElbow.index();
        output[[0, 0, elbow, 0]] = 0.5; // y
        output[[0, 0, elbow, 1]] = 0.25; // x
        output[[0, 0, elbow, 2]] = 0.8;

        let dyn_output = output.into_dyn();
        let pose = keypoints_to_pose(&dyn_output.view(), 640.0, 480.0).expect("pose");
        let lm = pose.get(BodyPart::RightElbow);
        assert!((lm.x - 160.0).abs() < 1e-6);
        assert!((lm.y - 240.0).abs() < 1e-6);
        assert!((lm.visibility - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_keypoints_to_pose_rejects_short_output() {
        let output = Array4::<f32>::zeros((1, 1, 5, 3)).into_dyn();
        assert!(matches!(
            keypoints_to_pose(&output.view(), 640.0, 480.0),
            Err(Error::ModelOutputError(_))
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let result = PoseDetector::new("does/not/exist.onnx", 0.3);
        assert!(matches!(result, Err(Error::ModelError(_))));
    }
}
