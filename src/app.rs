//! Main application module: capture loop around one exercise trainer.

use crate::{
    config::Config,
    constants::DEFAULT_FPS,
    error::{Error, Result},
    exercises::{create_trainer, ExerciseKind, FrameAnalysis, FrameInput, Trainer},
    history,
    overlay,
    pose_detection::PoseDetector,
    report::ReportWriter,
    session::SessionSummary,
    utils::{mirror, resize_with_aspect_ratio},
};
use log::{debug, error, info, warn};
use opencv::{
    core::{Mat, Size},
    highgui::{self, WINDOW_NORMAL},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter, CAP_PROP_BUFFERSIZE, CAP_PROP_FPS},
};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Consecutive camera read failures tolerated before giving up
const MAX_READ_FAILURES: u32 = 100;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Exercise to track
    pub exercise: ExerciseKind,
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// GUI display mode
    pub gui_mode: GuiMode,
    /// Enable debug output
    pub debug: bool,
    /// Loaded and overridden settings
    pub settings: Config,
}

/// Video source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Show the trainer window
    All,
    /// No GUI (headless)
    None,
}

impl FromStr for GuiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(GuiMode::All),
            "none" => Ok(GuiMode::None),
            other => Err(Error::InvalidInput(format!("Unknown GUI mode '{other}', expected all or none"))),
        }
    }
}

/// Main application struct
pub struct TrainerApp {
    config: AppConfig,
    detector: PoseDetector,
    trainer: Box<dyn Trainer>,
    video_capture: VideoCapture,
    video_writer: Option<VideoWriter>,
    processing_width: i32,
    fps: f64,
    window_name: String,
}

impl TrainerApp {
    /// Create a new trainer application
    ///
    /// # Errors
    ///
    /// Returns an error if the video source cannot be opened, the pose model
    /// cannot be loaded or the configuration is invalid
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing {}", config.exercise.title());
        config.settings.validate()?;

        let video_capture = match &config.video_source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                // Reduce buffer size for lower latency (webcam only)
                cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };
        if !video_capture.is_opened()? {
            return Err(Error::VideoSource(format!("Could not open {:?}", config.video_source)));
        }

        let reported_fps = video_capture.get(CAP_PROP_FPS)?;
        let fps = if reported_fps.is_finite() && reported_fps > 1.0 {
            reported_fps
        } else {
            DEFAULT_FPS
        };
        debug!("Source FPS: {fps:.1}");

        let detector = PoseDetector::new(
            &config.settings.models.pose_model,
            config.settings.detection.min_pose_confidence,
        )?;
        let trainer = create_trainer(config.exercise, &config.settings)?;
        let processing_width = config
            .settings
            .display
            .processing_width
            .unwrap_or_else(|| config.exercise.processing_width());

        let window_name = config.exercise.title().to_string();
        if config.gui_mode == GuiMode::All {
            highgui::named_window(&window_name, WINDOW_NORMAL)?;
        }

        Ok(Self {
            config,
            detector,
            trainer,
            video_capture,
            video_writer: None,
            processing_width,
            fps,
            window_name,
        })
    }

    /// Run the capture loop until the video ends, the user quits or the
    /// rest screen has been shown; then write the report and history
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be processed or displayed
    pub fn run(&mut self) -> Result<SessionSummary> {
        info!("Starting main application loop");
        let start_time = Instant::now();
        let mut frame_index: u64 = 0;
        let mut read_failures = 0;

        loop {
            let mut frame = Mat::default();
            if !self.video_capture.read(&mut frame)? || frame.empty() {
                if matches!(self.config.video_source, VideoSource::File(_)) {
                    info!("End of video file reached");
                    break;
                }
                read_failures += 1;
                if read_failures >= MAX_READ_FAILURES {
                    return Err(Error::VideoSource("Camera stopped delivering frames".to_string()));
                }
                warn!("Failed to read frame, retrying...");
                continue;
            }
            read_failures = 0;

            let mut frame = self.prepare_frame(&frame)?;
            let timestamp = self.timestamp(frame_index, start_time);
            let pose = match self.detector.detect(&frame) {
                Ok(pose) => pose,
                Err(e) => {
                    warn!("Pose detection failed on frame {frame_index}: {e}");
                    None
                }
            };

            let analysis = self.trainer.process(&FrameInput {
                pose,
                timestamp,
                frame_index,
            });
            frame_index += 1;

            if self.config.gui_mode == GuiMode::All || self.config.settings.output.output_video.is_some() {
                overlay::draw_analysis(
                    &mut frame,
                    &analysis,
                    self.config.exercise.title(),
                    self.config.settings.display.draw_skeleton,
                )?;
            }
            self.write_frame(&frame)?;

            if self.config.gui_mode == GuiMode::All {
                highgui::imshow(&self.window_name, &frame)?;
                let key = highgui::wait_key(1)?;
                if key == 27 || key == i32::from(b'q') {
                    info!("Exit requested by user");
                    break;
                }
            }

            if analysis.exit_requested {
                info!("Rest screen done, finishing session");
                break;
            }
            log_progress(&analysis, frame_index);
        }

        if self.config.gui_mode == GuiMode::All {
            highgui::destroy_all_windows()?;
        }
        if let Some(writer) = self.video_writer.as_mut() {
            writer.release()?;
        }

        let summary = self.trainer.summary();
        info!("Application shutting down: {}", summary.headline());
        self.save_results(&summary);
        Ok(summary)
    }

    /// Mirror (if enabled) and scale to the processing width
    fn prepare_frame(&self, frame: &Mat) -> Result<Mat> {
        let frame = if self.config.settings.display.mirror {
            mirror(frame)?
        } else {
            frame.clone()
        };
        resize_with_aspect_ratio(&frame, self.processing_width)
    }

    /// Session time: wall clock for cameras, frame position for files
    fn timestamp(&self, frame_index: u64, start: Instant) -> Duration {
        match self.config.video_source {
            VideoSource::Camera(_) => start.elapsed(),
            #[allow(clippy::cast_precision_loss)]
            VideoSource::File(_) => Duration::from_secs_f64(frame_index as f64 / self.fps),
        }
    }

    /// Append to the output video, opening the writer on the first frame
    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        let Some(path) = &self.config.settings.output.output_video else {
            return Ok(());
        };
        if self.video_writer.is_none() {
            let path_str = path
                .to_str()
                .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 output path: {}", path.display())))?;
            let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
            let writer = VideoWriter::new(path_str, fourcc, self.fps, Size::new(frame.cols(), frame.rows()), true)?;
            if !writer.is_opened()? {
                return Err(Error::VideoSource(format!("Could not open output video {}", path.display())));
            }
            info!("Writing annotated video to {}", path.display());
            self.video_writer = Some(writer);
        }
        if let Some(writer) = self.video_writer.as_mut() {
            writer.write(frame)?;
        }
        Ok(())
    }

    /// Write the report and history; failures are logged, not returned
    fn save_results(&self, summary: &SessionSummary) {
        let output = &self.config.settings.output;
        if output.save_report {
            let writer = ReportWriter::new(&output.results_dir);
            match writer.write(self.config.exercise.title(), summary, self.trainer.recorder()) {
                Ok(report) => debug!("Report written: {report:?}"),
                Err(e) => error!("Failed to write session report: {e}"),
            }
        }
        if let Err(e) = history::record_session(&output.history_file, summary) {
            error!("Failed to update workout history: {e}");
        }
    }
}

fn log_progress(analysis: &FrameAnalysis, frame_index: u64) {
    if frame_index % 300 == 0 {
        debug!(
            "Frame {frame_index}: phase {:?}, reps {}/{}",
            analysis.phase, analysis.reps, analysis.max_reps
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gui_mode_parsing() {
        assert_eq!("all".parse::<GuiMode>().unwrap(), GuiMode::All);
        assert_eq!("NONE".parse::<GuiMode>().unwrap(), GuiMode::None);
        assert!("pointers".parse::<GuiMode>().is_err());
    }

    #[test]
    fn test_missing_video_file_fails() {
        let config = AppConfig {
            exercise: ExerciseKind::Squat,
            video_source: VideoSource::File("does/not/exist.mp4".to_string()),
            gui_mode: GuiMode::None,
            debug: false,
            settings: Config::default(),
        };
        assert!(TrainerApp::new(config).is_err());
    }
}
