//! Configuration management for the form tracker

use crate::{
    constants::{
        COUNTDOWN_SECONDS, DEFAULT_MIN_KEYPOINT_CONFIDENCE, DEFAULT_MIN_POSE_CONFIDENCE,
        DETECTION_LOST_RESET_FRAMES, DETECTION_LOST_WARN_FRAMES, POSITION_LOCK_FRAMES, REST_SCREEN_SECONDS,
    },
    filters::{create_filter, SignalFilter},
    session::LifecycleParams,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Pose detection thresholds
    pub detection: DetectionConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Session lifecycle timing
    pub session: SessionConfig,

    /// Smoothing of landmarks and derived signals
    pub smoothing: SmoothingConfig,

    /// Report and history output
    pub output: OutputConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the single-pose MoveNet ONNX model
    pub pose_model: PathBuf,
}

/// Pose detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum average keypoint confidence for a pose (0.0-1.0)
    pub min_pose_confidence: f64,

    /// Minimum confidence for each keypoint a trainer requires (0.0-1.0)
    pub min_keypoint_confidence: f64,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// GUI mode: "all" or "none"
    pub gui_mode: String,

    /// Mirror the camera image horizontally
    pub mirror: bool,

    /// Processing width override; exercise default when unset
    pub processing_width: Option<i32>,

    /// Draw the skeleton overlay
    pub draw_skeleton: bool,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rep target; exercise default when unset
    pub max_reps: Option<u32>,

    /// Frames the start position must be held
    pub position_lock_frames: u32,

    /// Countdown before counting starts
    pub countdown_seconds: f64,

    /// Lost-detection frames before a warning is shown
    pub lost_warn_frames: u32,

    /// Lost-detection frames before the trainer resets
    pub lost_reset_frames: u32,

    /// How long the rest screen stays up
    pub rest_screen_seconds: f64,
}

/// Smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter for the squat knee/ankle width ratio
    pub knee_ratio_filter: String,

    /// Landmark smoothing factor for the tricep trainer
    pub tricep_alpha: f64,

    /// Landmark smoothing factor for the bicep trainer
    pub bicep_alpha: f64,

    /// Keypoints below this visibility skip bicep smoothing
    pub bicep_visibility_floor: f64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for charts and rep details
    pub results_dir: PathBuf,

    /// Workout history file
    pub history_file: PathBuf,

    /// Write session charts and details on exit
    pub save_report: bool,

    /// Optional annotated video output
    pub output_video: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pose_model: PathBuf::from("assets/movenet_singlepose_lightning.onnx"),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_pose_confidence: DEFAULT_MIN_POSE_CONFIDENCE,
            min_keypoint_confidence: DEFAULT_MIN_KEYPOINT_CONFIDENCE,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            gui_mode: "all".to_string(),
            mirror: true,
            processing_width: None,
            draw_skeleton: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_reps: None,
            position_lock_frames: POSITION_LOCK_FRAMES,
            countdown_seconds: COUNTDOWN_SECONDS,
            lost_warn_frames: DETECTION_LOST_WARN_FRAMES,
            lost_reset_frames: DETECTION_LOST_RESET_FRAMES,
            rest_screen_seconds: REST_SCREEN_SECONDS,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            knee_ratio_filter: "moving_average:10".to_string(),
            tricep_alpha: crate::constants::tricep::SMOOTHING_ALPHA,
            bicep_alpha: crate::constants::bicep::SMOOTHING_ALPHA,
            bicep_visibility_floor: 0.2,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("session_results"),
            history_file: PathBuf::from("session_results/workout_history.json"),
            save_report: true,
            output_video: None,
        }
    }
}

impl SessionConfig {
    /// Lifecycle timing derived from this section
    ///
    /// Negative or NaN durations become zero and out-of-range ones saturate;
    /// `Config::validate` rejects both before they get here.
    #[must_use]
    pub fn lifecycle_params(&self) -> LifecycleParams {
        LifecycleParams {
            position_lock_frames: self.position_lock_frames,
            countdown: seconds_to_duration(self.countdown_seconds),
            lost_warn_frames: self.lost_warn_frames,
            lost_reset_frames: self.lost_reset_frames,
            rest_screen: seconds_to_duration(self.rest_screen_seconds),
        }
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the knee ratio filter from configuration
    pub fn knee_ratio_filter(&self) -> Result<Box<dyn SignalFilter>> {
        create_filter(&self.smoothing.knee_ratio_filter)
    }

    /// Validate configuration
    ///
    /// Model paths are not checked here; the detector reports a missing model
    /// when it is loaded.
    pub fn validate(&self) -> Result<()> {
        // Validate thresholds
        if !(0.0..=1.0).contains(&self.detection.min_pose_confidence) {
            return Err(Error::ConfigError(
                "Minimum pose confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detection.min_keypoint_confidence) {
            return Err(Error::ConfigError(
                "Minimum keypoint confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Validate smoothing parameters
        for (name, alpha) in [
            ("Tricep", self.smoothing.tricep_alpha),
            ("Bicep", self.smoothing.bicep_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::ConfigError(format!("{name} smoothing alpha must be in (0, 1]")));
            }
        }
        self.knee_ratio_filter()
            .map_err(|e| Error::ConfigError(format!("Invalid knee ratio filter: {e}")))?;

        // Validate session settings
        if self.session.max_reps == Some(0) {
            return Err(Error::ConfigError("Max reps must be greater than 0".to_string()));
        }
        for (name, seconds) in [
            ("Countdown", self.session.countdown_seconds),
            ("Rest screen", self.session.rest_screen_seconds),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} duration must be a finite, non-negative number of seconds, got {seconds}"
                )));
            }
        }
        if self.session.lost_reset_frames <= self.session.lost_warn_frames {
            return Err(Error::ConfigError(
                "Lost reset frames must exceed lost warning frames".to_string(),
            ));
        }

        // Validate display settings
        if !matches!(self.display.gui_mode.as_str(), "all" | "none") {
            return Err(Error::ConfigError(format!(
                "Unknown GUI mode '{}', expected 'all' or 'none'",
                self.display.gui_mode
            )));
        }
        if let Some(width) = self.display.processing_width {
            if width < 64 {
                return Err(Error::ConfigError(format!(
                    "Processing width must be at least 64, got {width}"
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Form Tracker Configuration

# Model paths
models:
  pose_model: "assets/movenet_singlepose_lightning.onnx"

# Pose detection
detection:
  min_pose_confidence: 0.3
  min_keypoint_confidence: 0.2

# Display settings
display:
  gui_mode: "all"
  mirror: true
  draw_skeleton: true

# Session lifecycle
session:
  position_lock_frames: 30
  countdown_seconds: 3.0
  lost_warn_frames: 10
  lost_reset_frames: 30
  rest_screen_seconds: 5.0

# Smoothing
smoothing:
  knee_ratio_filter: "moving_average:10"
  tricep_alpha: 0.3
  bicep_alpha: 0.5
  bicep_visibility_floor: 0.2

# Output
output:
  results_dir: "session_results"
  history_file: "session_results/workout_history.json"
  save_report: true
"#;
