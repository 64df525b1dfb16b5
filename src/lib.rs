//! Exercise form tracking library: rep counting and form feedback from body
//! pose landmarks.
//!
//! The tracking pipeline for every frame is:
//! 1. Single-person pose detection with a MoveNet `ONNX` model
//! 2. Optional smoothing of landmarks and derived signals
//! 3. Joint angles and position checks fed into an exercise trainer
//! 4. Rep counting state machine, form grading and on-screen feedback
//!
//! At the end of a session the trainer's recorded series are rendered into a
//! chart, rep details are written as JSON and the workout history is updated.
//!
//! # Examples
//!
//! ## Driving a trainer with detected poses
//!
//! ```no_run
//! use form_tracker::{
//!     config::Config,
//!     exercises::{create_trainer, ExerciseKind, FrameInput},
//!     pose_detection::PoseDetector,
//! };
//! use opencv::{imgcodecs, prelude::*};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let detector = PoseDetector::new(&config.models.pose_model, 0.3)?;
//! let mut trainer = create_trainer(ExerciseKind::Squat, &config)?;
//!
//! let image = imgcodecs::imread("squat.jpg", imgcodecs::IMREAD_COLOR)?;
//! let analysis = trainer.process(&FrameInput {
//!     pose: detector.detect(&image)?,
//!     timestamp: Duration::ZERO,
//!     frame_index: 0,
//! });
//! println!("Phase {:?}, reps {}", analysis.phase, analysis.reps);
//! # Ok(())
//! # }
//! ```
//!
//! ## Smoothing a signal
//!
//! ```no_run
//! use form_tracker::filters::{create_filter, SignalFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("moving_average:10")?;
//! let smoothed = filter.apply(1.05);
//! println!("Knee/ankle ratio: {smoothed:.2}");
//! # Ok(())
//! # }
//! ```

/// Body keypoints, sides and poses
pub mod landmarks;

/// Angle helpers on 2D points
pub mod geometry;

/// Single-person pose detection with ONNX Runtime
pub mod pose_detection;

/// Signal filtering algorithms for smoothing measurements
pub mod filters;

/// Movement detection from windows of joint positions
pub mod movement_detector;

/// Session lifecycle, recorder and summary
pub mod session;

/// Persistent on-screen feedback messages
pub mod feedback;

/// Exercise trainers and their rep state machines
pub mod exercises;

/// Frame annotation
pub mod overlay;

/// Session charts and rep details
pub mod report;

/// Workout history file
pub mod history;

/// Utility functions for frame geometry and safe casts
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
