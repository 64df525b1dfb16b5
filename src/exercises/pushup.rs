//! Push-up rep counting from the right elbow angle.

use super::{usable_pose, FrameAnalysis, FrameInput, Highlight, Trainer, TrainerCore};
use crate::{
    config::Config,
    constants::pushup::{
        DOWN_THRESHOLD, ELBOW_BENT_ANGLE, ELBOW_TOO_BENT_ANGLE, ELBOW_WIDTH_THRESHOLD, MIN_RANGE_OF_MOTION,
        UP_THRESHOLD,
    },
    exercises::ExerciseKind,
    feedback::{FeedbackMessage, Severity},
    geometry::{joint_angle, width_ratio},
    landmarks::BodyPart,
    session::{DetectionEvent, Phase, SessionRecorder, SessionSummary},
};
use log::debug;

const ELBOW_SERIES: &str = "Elbow Angle";
const WIDTH_SERIES: &str = "Elbow Width Ratio";

const REQUIRED: [BodyPart; 5] = [
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
    BodyPart::LeftElbow,
    BodyPart::RightElbow,
    BodyPart::RightWrist,
];

/// Where the body is in the current rep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushUpState {
    Up,
    GoingDown,
    Down,
    GoingUp,
}

/// Push-up trainer
pub struct PushUpTrainer {
    core: TrainerCore,
    state: PushUpState,
    min_angle: f64,
    max_angle: f64,
    t_shape: bool,
}

impl PushUpTrainer {
    pub fn new(config: &Config) -> Self {
        let mut core = TrainerCore::new(ExerciseKind::PushUp, config, 1);
        core.recorder.declare(
            ELBOW_SERIES,
            "degrees",
            &[("Target Depth", ELBOW_BENT_ANGLE), ("Too Deep", ELBOW_TOO_BENT_ANGLE)],
        );
        core.recorder
            .declare(WIDTH_SERIES, "ratio", &[("T-shape Threshold", ELBOW_WIDTH_THRESHOLD)]);
        Self {
            core,
            state: PushUpState::Up,
            min_angle: f64::INFINITY,
            max_angle: f64::NEG_INFINITY,
            t_shape: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> PushUpState {
        self.state
    }

    fn reset_rep(&mut self) {
        self.state = PushUpState::Up;
        self.min_angle = f64::INFINITY;
        self.max_angle = f64::NEG_INFINITY;
        self.t_shape = false;
    }

    /// Advance the rep state machine by at most one transition
    fn step(&mut self, elbow: f64) {
        self.min_angle = self.min_angle.min(elbow);
        self.max_angle = self.max_angle.max(elbow);

        let next = match self.state {
            PushUpState::Up if elbow < UP_THRESHOLD => PushUpState::GoingDown,
            PushUpState::GoingDown if elbow < DOWN_THRESHOLD => PushUpState::Down,
            PushUpState::Down if elbow > DOWN_THRESHOLD => PushUpState::GoingUp,
            PushUpState::GoingUp if elbow > UP_THRESHOLD => {
                self.finish_rep();
                return;
            }
            state => state,
        };
        if next != self.state {
            debug!("Push-up state {:?} -> {:?} at {:.1}°", self.state, next, elbow);
            self.state = next;
        }
    }

    fn finish_rep(&mut self) {
        let range = self.max_angle - self.min_angle;
        if range > MIN_RANGE_OF_MOTION {
            let (feedback, issues): (&str, &[&str]) = if self.t_shape {
                ("Elbows out (T-shape)", &["elbows_out"])
            } else {
                ("Good form", &[])
            };
            let metrics = vec![
                ("depth".to_string(), self.min_angle),
                ("range_of_motion".to_string(), range),
            ];
            self.core.count_rep(metrics, feedback, !self.t_shape, issues);
        } else {
            debug!("Push-up ignored, range of motion {:.1}° too small", range);
        }
        self.reset_rep();
    }
}

impl Trainer for PushUpTrainer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::PushUp
    }

    fn required_parts(&self) -> Vec<BodyPart> {
        REQUIRED.to_vec()
    }

    fn process(&mut self, input: &FrameInput) -> FrameAnalysis {
        self.core.start_frame(input);

        let min_visibility = self.core.min_keypoint_confidence;
        let Some(pose) = usable_pose(input.pose.as_ref(), &REQUIRED, min_visibility) else {
            let event = self.core.observe_detection(false);
            if event == DetectionEvent::Reset {
                self.reset_rep();
            }
            return self.core.lost_analysis(event);
        };
        self.core.observe_detection(true);

        let elbow = joint_angle(
            pose.point(BodyPart::RightShoulder),
            pose.point(BodyPart::RightElbow),
            pose.point(BodyPart::RightWrist),
        );
        if elbow.is_nan() {
            return self.core.analysis();
        }
        let ratio = width_ratio(
            pose.point(BodyPart::LeftElbow),
            pose.point(BodyPart::RightElbow),
            pose.point(BodyPart::LeftShoulder),
            pose.point(BodyPart::RightShoulder),
            1.0,
        );

        self.core.recorder.begin_frame();
        self.core.recorder.record(ELBOW_SERIES, elbow);
        self.core.recorder.record(WIDTH_SERIES, ratio);

        let mut highlights = Vec::new();
        let phase = self.core.lifecycle.phase();
        if phase == Phase::Counting {
            if ratio > ELBOW_WIDTH_THRESHOLD {
                self.t_shape = true;
                self.core
                    .board
                    .post(FeedbackMessage::error("Keep elbows in! Avoid T-shape"));
                highlights.push(Highlight {
                    from: BodyPart::LeftShoulder,
                    to: BodyPart::LeftElbow,
                    severity: Severity::Error,
                });
                highlights.push(Highlight {
                    from: BodyPart::RightShoulder,
                    to: BodyPart::RightElbow,
                    severity: Severity::Error,
                });
            }
            self.step(elbow);
        } else if phase != Phase::Complete {
            self.core.observe_position(elbow > UP_THRESHOLD);
        }

        let mut analysis = self
            .core
            .waiting_analysis("Get in top pushup position (arms extended)");
        analysis.pose = Some(pose.clone());
        analysis.highlights = highlights;
        analysis.metrics = vec![(ELBOW_SERIES.to_string(), elbow), (WIDTH_SERIES.to_string(), ratio)];
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
        self.reset_rep();
    }
}
