//! Exercise trainers.
//!
//! Every trainer shares the same frame flow:
//!
//! 1. gate on detection (required keypoints visible) and feed the lifecycle,
//! 2. before counting, check the start position and run the countdown,
//! 3. while counting, derive angles, run the rep state machine and post
//!    feedback,
//! 4. stop counting once the rep target is reached.
//!
//! [`TrainerCore`] holds the shared bookkeeping; each exercise module only
//! contributes its measurements, thresholds and rep state machine.

/// Push-up trainer
pub mod pushup;

/// Squat trainer
pub mod squat;

/// Tricep pushdown trainer
pub mod tricep;

/// Bicep curl trainer
pub mod bicep;

use crate::{
    config::Config,
    constants::DEFAULT_PROCESSING_WIDTH,
    feedback::{FeedbackBoard, FeedbackMessage, Severity},
    landmarks::{BodyPart, Pose},
    session::{DetectionEvent, IssueTally, Phase, RepRecord, SessionLifecycle, SessionRecorder, SessionSummary},
    Error, Result,
};
use chrono::{DateTime, Local};
use log::info;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use squat::{DepthGauge, DepthStatus};

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    PushUp,
    Squat,
    TricepPushdown,
    BicepCurl,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::PushUp,
        ExerciseKind::Squat,
        ExerciseKind::TricepPushdown,
        ExerciseKind::BicepCurl,
    ];

    /// Short name used in file names and the history
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::PushUp => "pushup",
            ExerciseKind::Squat => "squat",
            ExerciseKind::TricepPushdown => "tricep",
            ExerciseKind::BicepCurl => "bicep",
        }
    }

    /// Title shown in the window and on charts
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            ExerciseKind::PushUp => "Push-up Trainer",
            ExerciseKind::Squat => "Squat Trainer",
            ExerciseKind::TricepPushdown => "Tricep Pushdown Trainer",
            ExerciseKind::BicepCurl => "Bicep Curl Trainer",
        }
    }

    /// Rep target when the configuration does not set one
    #[must_use]
    pub fn default_max_reps(self) -> u32 {
        match self {
            ExerciseKind::BicepCurl => crate::constants::bicep::MAX_REPS,
            _ => crate::constants::DEFAULT_MAX_REPS,
        }
    }

    /// Frame width the exercise thresholds were tuned at
    #[must_use]
    pub fn processing_width(self) -> i32 {
        match self {
            ExerciseKind::TricepPushdown => crate::constants::tricep::PROCESSING_WIDTH,
            _ => DEFAULT_PROCESSING_WIDTH,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pushup" | "push-up" | "push_up" => Ok(ExerciseKind::PushUp),
            "squat" => Ok(ExerciseKind::Squat),
            "tricep" | "tricep-pushdown" | "tricep_pushdown" => Ok(ExerciseKind::TricepPushdown),
            "bicep" | "bicep-curl" | "bicep_curl" => Ok(ExerciseKind::BicepCurl),
            other => Err(Error::InvalidInput(format!(
                "Unknown exercise '{other}', expected pushup, squat, tricep or bicep"
            ))),
        }
    }
}

/// One frame handed to a trainer
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// First detected person, in processing-frame pixels
    pub pose: Option<Pose>,
    /// Time since the session started
    pub timestamp: Duration,
    /// Index of the captured frame
    pub frame_index: u64,
}

/// Bone to draw in a highlight colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub from: BodyPart,
    pub to: BodyPart,
    pub severity: Severity,
}

/// Everything the overlay needs to draw a frame
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub phase: Phase,
    pub reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
    pub max_reps: u32,
    /// Whole seconds left on the countdown
    pub countdown: Option<u32>,
    /// Start position lock progress in [0, 1]
    pub position_progress: f64,
    /// Start position instruction while waiting
    pub instruction: Option<String>,
    pub feedback: Vec<FeedbackMessage>,
    /// Pose the trainer analysed, after smoothing
    pub pose: Option<Pose>,
    pub highlights: Vec<Highlight>,
    /// Live measurements for the info panel
    pub metrics: Vec<(String, f64)>,
    pub depth_gauge: Option<DepthGauge>,
    pub detection_lost_warning: bool,
    pub session_complete: bool,
    /// Rest screen shown long enough
    pub exit_requested: bool,
}

/// A rep-counting exercise trainer
pub trait Trainer: Send {
    /// Exercise this trainer counts
    fn kind(&self) -> ExerciseKind;

    /// Keypoints that must be visible for a frame to be analysed
    fn required_parts(&self) -> Vec<BodyPart>;

    /// Analyse one frame
    fn process(&mut self, input: &FrameInput) -> FrameAnalysis;

    /// Totals and rep log so far
    fn summary(&self) -> SessionSummary;

    /// Per-frame series and rep log for charts
    fn recorder(&self) -> &SessionRecorder;

    /// Start a fresh session
    fn reset(&mut self);
}

/// Create the trainer for an exercise
pub fn create_trainer(kind: ExerciseKind, config: &Config) -> Result<Box<dyn Trainer>> {
    info!("Creating {} trainer", kind);
    Ok(match kind {
        ExerciseKind::PushUp => Box::new(pushup::PushUpTrainer::new(config)),
        ExerciseKind::Squat => Box::new(squat::SquatTrainer::new(config)?),
        ExerciseKind::TricepPushdown => Box::new(tricep::TricepTrainer::new(config)?),
        ExerciseKind::BicepCurl => Box::new(bicep::BicepTrainer::new(config)?),
    })
}

/// Shared trainer bookkeeping
#[derive(Debug)]
pub(crate) struct TrainerCore {
    kind: ExerciseKind,
    pub lifecycle: SessionLifecycle,
    pub recorder: SessionRecorder,
    pub board: FeedbackBoard,
    pub issues: IssueTally,
    pub max_reps: u32,
    pub min_keypoint_confidence: f64,
    started_at: DateTime<Local>,
    first_seen: Option<Duration>,
    pub now: Duration,
    pub reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
}

impl TrainerCore {
    pub fn new(kind: ExerciseKind, config: &Config, feedback_persistence: u32) -> Self {
        Self {
            kind,
            lifecycle: SessionLifecycle::new(config.session.lifecycle_params()),
            recorder: SessionRecorder::new(),
            board: FeedbackBoard::new(feedback_persistence),
            issues: IssueTally::default(),
            max_reps: config.session.max_reps.unwrap_or_else(|| kind.default_max_reps()),
            min_keypoint_confidence: config.detection.min_keypoint_confidence,
            started_at: Local::now(),
            first_seen: None,
            now: Duration::ZERO,
            reps: 0,
            good_reps: 0,
            bad_reps: 0,
        }
    }

    /// Advance the clock and age feedback
    pub fn start_frame(&mut self, input: &FrameInput) {
        self.first_seen.get_or_insert(input.timestamp);
        self.now = input.timestamp;
        self.board.tick();
    }

    /// Feed detection state; returns the event
    pub fn observe_detection(&mut self, found: bool) -> DetectionEvent {
        self.lifecycle.observe_detection(found)
    }

    /// Feed the start-position check
    pub fn observe_position(&mut self, in_position: bool) {
        self.lifecycle.observe_position(in_position, self.now);
    }

    /// Count a rep, tally its issues and stop at the rep target
    pub fn count_rep(
        &mut self,
        metrics: Vec<(String, f64)>,
        feedback: impl Into<String>,
        good: bool,
        issues: &[&str],
    ) -> &mut RepRecord {
        self.reps += 1;
        if good {
            self.good_reps += 1;
        } else {
            self.bad_reps += 1;
        }
        for issue in issues {
            self.issues.bump(issue);
        }
        info!(
            "{} rep {} counted ({})",
            self.kind,
            self.reps,
            if good { "good" } else { "bad" }
        );
        if self.reps >= self.max_reps {
            self.lifecycle.mark_complete(self.now);
        }
        self.recorder.push_rep(metrics, feedback, good)
    }

    /// Re-grade the most recent rep once more of it has been seen
    pub fn revise_last_rep(&mut self, feedback: &str, good: bool) {
        let Some(rep) = self.recorder.last_rep_mut() else {
            return;
        };
        if rep.good != good {
            if good {
                self.good_reps += 1;
                self.bad_reps = self.bad_reps.saturating_sub(1);
            } else {
                self.bad_reps += 1;
                self.good_reps = self.good_reps.saturating_sub(1);
            }
        }
        rep.good = good;
        if rep.feedback != feedback {
            rep.feedback = feedback.to_string();
        }
    }

    /// Analysis skeleton with the shared fields filled in
    pub fn analysis(&self) -> FrameAnalysis {
        let phase = self.lifecycle.phase();
        FrameAnalysis {
            phase,
            reps: self.reps,
            good_reps: self.good_reps,
            bad_reps: self.bad_reps,
            max_reps: self.max_reps,
            countdown: self.lifecycle.countdown_remaining(self.now),
            position_progress: self.lifecycle.position_progress(),
            instruction: None,
            feedback: self.board.active(),
            pose: None,
            highlights: Vec::new(),
            metrics: Vec::new(),
            depth_gauge: None,
            detection_lost_warning: false,
            session_complete: phase == Phase::Complete,
            exit_requested: self.lifecycle.should_exit(self.now),
        }
    }

    /// Analysis for a frame without a usable pose
    pub fn lost_analysis(&self, event: DetectionEvent) -> FrameAnalysis {
        let mut analysis = self.analysis();
        analysis.detection_lost_warning = matches!(event, DetectionEvent::Warn | DetectionEvent::Reset);
        analysis
    }

    /// Analysis before counting starts
    pub fn waiting_analysis(&self, instruction: &str) -> FrameAnalysis {
        let mut analysis = self.analysis();
        if analysis.phase == Phase::Waiting {
            analysis.instruction = Some(instruction.to_string());
        }
        analysis
    }

    pub fn summary(&self) -> SessionSummary {
        let duration = self
            .first_seen
            .map_or(Duration::ZERO, |first| self.now.saturating_sub(first));
        SessionSummary {
            exercise: self.kind.as_str().to_string(),
            started_at: self.started_at,
            duration_secs: duration.as_secs_f64(),
            total_reps: self.reps,
            good_reps: self.good_reps,
            bad_reps: self.bad_reps,
            issue_counts: self.issues.clone(),
            reps: self.recorder.reps().to_vec(),
        }
    }

    pub fn reset(&mut self) {
        self.lifecycle.reset();
        self.recorder.clear();
        self.board.clear();
        self.issues = IssueTally::default();
        self.started_at = Local::now();
        self.first_seen = None;
        self.reps = 0;
        self.good_reps = 0;
        self.bad_reps = 0;
    }
}

/// Pose gated on every listed part being visible enough
pub(crate) fn usable_pose<'a>(pose: Option<&'a Pose>, parts: &[BodyPart], min_visibility: f64) -> Option<&'a Pose> {
    pose.filter(|p| p.has_all(parts, min_visibility))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Synthetic poses for trainer unit tests.

    use super::FrameInput;
    use crate::landmarks::{BodyPart, Landmark, Pose, Side};
    use std::time::Duration;

    pub const FRAME_SECS: f64 = 1.0 / 30.0;

    /// Pose with every keypoint confidently placed near the frame centre
    pub fn base_pose() -> Pose {
        let mut pose = Pose::default();
        for lm in &mut pose.landmarks {
            *lm = Landmark::new(320.0, 240.0, 0.9);
        }
        pose
    }

    /// Place `end` 100px from `joint` so the angle start-joint-end is `degrees`
    ///
    /// `start` stays where it is; `end` is rotated from it clockwise on screen
    /// unless `counter_clockwise` is set.
    pub fn set_angle(
        pose: &mut Pose,
        start: BodyPart,
        joint: BodyPart,
        end: BodyPart,
        degrees: f64,
        counter_clockwise: bool,
    ) {
        let j = pose.point(joint);
        let s = pose.point(start);
        let base = (s.y - j.y).atan2(s.x - j.x);
        let turn = if counter_clockwise { -degrees.to_radians() } else { degrees.to_radians() };
        let rot = base + turn;
        let visibility = pose.get(end).visibility.max(0.9);
        *pose.get_mut(end) = Landmark::new(j.x + 100.0 * rot.cos(), j.y + 100.0 * rot.sin(), visibility);
    }

    pub fn frame(pose: Option<Pose>, index: u64) -> FrameInput {
        FrameInput {
            pose,
            #[allow(clippy::cast_precision_loss)]
            timestamp: Duration::from_secs_f64(index as f64 * FRAME_SECS),
            frame_index: index,
        }
    }

    pub fn hide(pose: &mut Pose, side: Side) {
        for part in [side.shoulder(), side.elbow(), side.wrist(), side.hip(), side.knee(), side.ankle()] {
            pose.get_mut(part).visibility = 0.05;
        }
    }
}
