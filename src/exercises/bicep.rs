//! Bicep curl trainer, side view.

use super::{FrameAnalysis, FrameInput, Highlight, Trainer, TrainerCore};
use crate::{
    config::Config,
    constants::bicep::{
        BAD_ELBOW_STABILITY_THRESHOLD, DOWN_THRESHOLD, ELBOW_ANGLE_MAX, ELBOW_ANGLE_MIN, FEEDBACK_PERSISTENCE,
        MIN_SECONDS_BETWEEN_REPS, SIDEWAYS_TILT, UP_THRESHOLD,
    },
    exercises::ExerciseKind,
    feedback::{FeedbackMessage, Severity},
    filters::landmark::LandmarkSmoother,
    geometry::{joint_angle, line_tilt},
    landmarks::{BodyPart, Joint, Pose, Side},
    movement_detector::WeightedMovementDetector,
    session::{DetectionEvent, Phase, SessionRecorder, SessionSummary},
    Result,
};
use log::debug;
use std::time::Duration;

const ELBOW_SERIES: &str = "Elbow Angle";
const SWING_SERIES: &str = "Elbow Swing";

const REQUIRED_JOINTS: [Joint; 4] = [Joint::Shoulder, Joint::Elbow, Joint::Wrist, Joint::Hip];

/// Minimum mean keypoint confidence for a frame to be analysed
const MIN_POSE_SCORE: f64 = 0.3;

const POSITION_HINT: &str = "Turn sideways and extend arm down";

/// Arm position in the curl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurlState {
    /// Arm curled
    Up,
    /// Arm extended
    Down,
}

/// Bicep curl trainer
pub struct BicepTrainer {
    core: TrainerCore,
    smoother: LandmarkSmoother,
    visibility_floor: f64,
    swing: WeightedMovementDetector,
    side: Side,
    state: CurlState,
    rep_counted: bool,
    last_rep_at: Option<Duration>,
}

impl BicepTrainer {
    /// # Errors
    ///
    /// Returns `FilterError` if the configured smoothing alpha is out of range
    pub fn new(config: &Config) -> Result<Self> {
        let mut core = TrainerCore::new(ExerciseKind::BicepCurl, config, FEEDBACK_PERSISTENCE);
        core.recorder.declare(
            ELBOW_SERIES,
            "degrees",
            &[("Curled", ELBOW_ANGLE_MIN), ("Extended", ELBOW_ANGLE_MAX)],
        );
        core.recorder
            .declare(SWING_SERIES, "pixels", &[("Swinging", BAD_ELBOW_STABILITY_THRESHOLD)]);
        let visibility_floor = config.smoothing.bicep_visibility_floor;
        Ok(Self {
            core,
            smoother: LandmarkSmoother::new(config.smoothing.bicep_alpha, visibility_floor)?,
            visibility_floor,
            swing: WeightedMovementDetector::new(),
            side: Side::Right,
            state: CurlState::Down,
            rep_counted: false,
            last_rep_at: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> CurlState {
        self.state
    }

    fn reset_rep(&mut self) {
        self.state = CurlState::Down;
        self.rep_counted = false;
    }

    /// Side view check: shoulders stacked rather than level
    fn turned_sideways(pose: &Pose) -> bool {
        line_tilt(pose.point(BodyPart::LeftShoulder), pose.point(BodyPart::RightShoulder)) > SIDEWAYS_TILT
    }

    fn usable(&self, pose: &Pose) -> bool {
        REQUIRED_JOINTS
            .iter()
            .all(|j| pose.get(j.on(self.side)).visibility > self.visibility_floor)
            && pose.average_visibility() > MIN_POSE_SCORE
    }

    fn step(&mut self, elbow: f64, swing: f64) {
        let now = self.core.now;
        match self.state {
            CurlState::Down if elbow < UP_THRESHOLD => {
                debug!("Curl state Down -> Up at {:.1}°", elbow);
                self.state = CurlState::Up;
                self.rep_counted = false;
            }
            CurlState::Up if elbow > DOWN_THRESHOLD => {
                debug!("Curl state Up -> Down at {:.1}°", elbow);
                self.state = CurlState::Down;
                let spaced = self
                    .last_rep_at
                    .map_or(true, |last| now.saturating_sub(last).as_secs_f64() >= MIN_SECONDS_BETWEEN_REPS);
                if self.rep_counted || !spaced {
                    return;
                }
                self.rep_counted = true;
                self.last_rep_at = Some(now);

                let swinging = swing > BAD_ELBOW_STABILITY_THRESHOLD;
                self.core.board.clear();
                if swinging {
                    self.core
                        .board
                        .post(FeedbackMessage::error("Keep your elbow steady! Avoid swinging."));
                } else {
                    self.core.board.post(FeedbackMessage::info("Good form!"));
                }
                let (feedback, issues): (&str, &[&str]) = if swinging {
                    ("Elbow swinging detected", &["elbow_swinging"])
                } else {
                    ("Good form", &[])
                };
                let metrics = vec![("elbow_angle".to_string(), elbow), ("swing".to_string(), swing)];
                self.core.count_rep(metrics, feedback, !swinging, issues);
            }
            _ => {}
        }
    }
}

impl Trainer for BicepTrainer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::BicepCurl
    }

    fn required_parts(&self) -> Vec<BodyPart> {
        REQUIRED_JOINTS.iter().map(|j| j.on(self.side)).collect()
    }

    fn process(&mut self, input: &FrameInput) -> FrameAnalysis {
        self.core.start_frame(input);

        let smoothed = input.pose.as_ref().map(|raw| self.smoother.smooth(raw));
        if let Some(pose) = &smoothed {
            self.side = pose.most_visible_side(&REQUIRED_JOINTS);
        }
        let Some(pose) = smoothed.filter(|p| self.usable(p)) else {
            let event = self.core.observe_detection(false);
            if event == DetectionEvent::Reset {
                self.reset_rep();
                self.smoother.reset();
                self.swing.reset();
            }
            return self.core.lost_analysis(event);
        };
        self.core.observe_detection(true);

        let side = self.side;
        let elbow = joint_angle(
            pose.point(side.shoulder()),
            pose.point(side.elbow()),
            pose.point(side.wrist()),
        );
        if elbow.is_nan() {
            let mut analysis = self.core.analysis();
            analysis.pose = Some(pose);
            return analysis;
        }
        let swing = self
            .swing
            .update(pose.point(side.elbow()).x - pose.point(side.shoulder()).x);

        self.core.recorder.begin_frame();
        self.core.recorder.record(ELBOW_SERIES, elbow);
        self.core.recorder.record(SWING_SERIES, swing);

        match self.core.lifecycle.phase() {
            Phase::Counting => self.step(elbow, swing),
            Phase::Complete => {}
            Phase::Waiting | Phase::Countdown => {
                let in_position = Self::turned_sideways(&pose) && elbow > DOWN_THRESHOLD;
                if in_position {
                    self.core.board.dismiss(POSITION_HINT);
                } else {
                    self.core.board.post(FeedbackMessage::warning(POSITION_HINT));
                }
                self.core.observe_position(in_position);
            }
        }

        let severity = if swing > BAD_ELBOW_STABILITY_THRESHOLD {
            Severity::Error
        } else {
            Severity::Info
        };
        let mut analysis = self.core.analysis();
        analysis.pose = Some(pose);
        analysis.highlights = vec![
            Highlight {
                from: side.shoulder(),
                to: side.elbow(),
                severity,
            },
            Highlight {
                from: side.elbow(),
                to: side.wrist(),
                severity: Severity::Info,
            },
        ];
        analysis.metrics = vec![(ELBOW_SERIES.to_string(), elbow), (SWING_SERIES.to_string(), swing)];
        analysis
    }

    fn summary(&self) -> SessionSummary {
        self.core.summary()
    }

    fn recorder(&self) -> &SessionRecorder {
        &self.core.recorder
    }

    fn reset(&mut self) {
        self.core.reset();
        self.smoother.reset();
        self.swing.reset();
        self.last_rep_at = None;
        self.reset_rep();
    }
}
