//! Tricep pushdown trainer.
//!
//! Tracks the more visible arm. A rep is counted when the arm extends past the
//! down threshold and re-armed once it bends back. Back posture and elbow swing
//! are checked on every counting frame.

use super::{FrameAnalysis, FrameInput, Highlight, Trainer, TrainerCore};
use crate::{
    config::Config,
    constants::tricep::{
        BACK_ANGLE_MAX, BACK_ANGLE_MIN, BAD_ELBOW_STABILITY_THRESHOLD, DOWN_THRESHOLD, ELBOW_ANGLE_MAX,
        ELBOW_ANGLE_MIN, ELBOW_POSITION_MAJOR_THRESHOLD, ELBOW_POSITION_MINOR_THRESHOLD, ELBOW_STABILITY_THRESHOLD,
        MIN_SECONDS_BETWEEN_REPS, START_POSITION_MARGIN, UP_THRESHOLD,
    },
    exercises::ExerciseKind,
    feedback::{FeedbackMessage, Severity},
    filters::landmark::LandmarkSmoother,
    geometry::{joint_angle, vertical_angle},
    landmarks::{BodyPart, Joint, Pose, Side},
    movement_detector::MovementDetector,
    session::{DetectionEvent, Phase, SessionRecorder, SessionSummary},
    Result,
};
use log::debug;
use std::time::Duration;

const ELBOW_SERIES: &str = "Elbow Angle";
const BACK_SERIES: &str = "Back Angle";
const VERTICAL_SERIES: &str = "Elbow Vertical Angle";
const SWING_SERIES: &str = "Elbow Swing";

const ARM_JOINTS: [Joint; 3] = [Joint::Shoulder, Joint::Elbow, Joint::Wrist];
const REQUIRED_JOINTS: [Joint; 5] = [Joint::Shoulder, Joint::Elbow, Joint::Wrist, Joint::Hip, Joint::Ankle];

/// Arm position in the pushdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    /// Arms bent, hands near the chest
    Up,
    /// Arms extended
    Down,
}

/// Measurements for one frame
#[derive(Debug, Clone, Copy)]
struct ArmReading {
    elbow: f64,
    back: f64,
    vertical: f64,
    swing: f64,
}

/// Rep-level problems, as (feedback text, tally key)
///
/// Back posture is tallied per frame by `check_form`, so its key is `None` here.
fn rep_issues(extension: f64, back: f64, vertical: f64) -> Vec<(&'static str, Option<&'static str>)> {
    let mut issues = Vec::new();
    if extension < ELBOW_ANGLE_MAX {
        issues.push(("Elbows not fully extended", Some("incomplete_extension")));
    }
    if back < BACK_ANGLE_MIN {
        issues.push(("Back too tilted", None));
    } else if back > BACK_ANGLE_MAX {
        issues.push(("Back too straight", None));
    }
    if vertical > ELBOW_POSITION_MAJOR_THRESHOLD {
        issues.push(("Elbow leaning too far forward", Some("elbow_leaning_forward")));
    }
    issues
}

/// Tally keys of a rep's issues
fn issue_keys(issues: &[(&'static str, Option<&'static str>)]) -> Vec<&'static str> {
    issues.iter().filter_map(|(_, key)| *key).collect()
}

/// Grade a rep from its peak extension and posture at the count
fn grade_rep(extension: f64, back: f64, vertical: f64) -> (String, bool) {
    let issues = rep_issues(extension, back, vertical);
    if issues.is_empty() {
        ("Good form!".to_string(), true)
    } else {
        let text: Vec<&str> = issues.iter().map(|(text, _)| *text).collect();
        (text.join(", "), false)
    }
}

/// Elbow lean from vertical, mirrored so leaning forward reads positive on both arms
fn elbow_vertical_angle(pose: &Pose, side: Side) -> f64 {
    let shoulder = pose.point(side.shoulder());
    let elbow = pose.point(side.elbow());
    let angle = vertical_angle(elbow, shoulder);
    let outer = match side {
        Side::Right => shoulder.x < elbow.x,
        Side::Left => shoulder.x > elbow.x,
    };
    if outer {
        180.0 - angle
    } else {
        angle
    }
}

/// Tricep pushdown trainer
pub struct TricepTrainer {
    core: TrainerCore,
    smoother: LandmarkSmoother,
    swing: MovementDetector,
    side: Side,
    state: ArmState,
    rep_counted: bool,
    last_rep_at: Option<Duration>,
    peak_extension: f64,
}

impl TricepTrainer {
    pub fn new(config: &Config) -> Result<Self> {
        let mut core = TrainerCore::new(ExerciseKind::TricepPushdown, config, 1);
        core.recorder.declare(
            ELBOW_SERIES,
            "degrees",
            &[("Bent", ELBOW_ANGLE_MIN), ("Extended", ELBOW_ANGLE_MAX)],
        );
        core.recorder.declare(
            BACK_SERIES,
            "degrees",
            &[("Too Tilted", BACK_ANGLE_MIN), ("Too Straight", BACK_ANGLE_MAX)],
        );
        core.recorder.declare(
            VERTICAL_SERIES,
            "degrees",
            &[
                ("Minor Lean", ELBOW_POSITION_MINOR_THRESHOLD),
                ("Major Lean", ELBOW_POSITION_MAJOR_THRESHOLD),
            ],
        );
        core.recorder
            .declare(SWING_SERIES, "pixels", &[("Swinging", BAD_ELBOW_STABILITY_THRESHOLD)]);
        Ok(Self {
            core,
            smoother: LandmarkSmoother::new(config.smoothing.tricep_alpha, 0.0)?,
            swing: MovementDetector::new(30, 20),
            side: Side::Right,
            state: ArmState::Up,
            rep_counted: false,
            last_rep_at: None,
            peak_extension: 0.0,
        })
    }

    #[must_use]
    pub fn state(&self) -> ArmState {
        self.state
    }

    /// Arm currently tracked
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    fn reset_rep(&mut self) {
        self.state = ArmState::Up;
        self.rep_counted = false;
        self.peak_extension = 0.0;
    }

    fn read_arm(&mut self, pose: &Pose) -> Option<ArmReading> {
        let side = self.side;
        let elbow = joint_angle(
            pose.point(side.shoulder()),
            pose.point(side.elbow()),
            pose.point(side.wrist()),
        );
        let back = joint_angle(
            pose.point(side.shoulder()),
            pose.point(side.hip()),
            pose.point(side.ankle()),
        );
        if elbow.is_nan() || back.is_nan() {
            return None;
        }
        let swing = self
            .swing
            .update(pose.point(side.elbow()).x - pose.point(side.shoulder()).x);
        Some(ArmReading {
            elbow,
            back,
            vertical: elbow_vertical_angle(pose, side),
            swing,
        })
    }

    /// Posture checks run on every counting frame
    fn check_form(&mut self, reading: &ArmReading, highlights: &mut Vec<Highlight>) {
        let back_issue = if reading.back > BACK_ANGLE_MAX {
            Some(("Bend your back slightly forward", "back_too_straight"))
        } else if reading.back < BACK_ANGLE_MIN {
            Some(("Straighten your back a bit", "back_too_tilted"))
        } else {
            None
        };
        if let Some((message, issue)) = back_issue {
            self.core.board.post(FeedbackMessage::error(message));
            self.core.issues.bump(issue);
            highlights.push(Highlight {
                from: self.side.shoulder(),
                to: self.side.hip(),
                severity: Severity::Error,
            });
        }

        if reading.swing > ELBOW_STABILITY_THRESHOLD {
            self.core.issues.bump("elbow_swinging");
            if reading.swing > BAD_ELBOW_STABILITY_THRESHOLD {
                self.core.board.post(FeedbackMessage::error("Stop swinging elbows!"));
                highlights.push(Highlight {
                    from: self.side.shoulder(),
                    to: self.side.elbow(),
                    severity: Severity::Error,
                });
            }
        }
    }

    fn step(&mut self, reading: &ArmReading) {
        let now = self.core.now;
        match self.state {
            ArmState::Up if reading.elbow > DOWN_THRESHOLD => {
                debug!("Tricep state Up -> Down at {:.1}°", reading.elbow);
                self.state = ArmState::Down;
                self.peak_extension = reading.elbow;
                let spaced = self
                    .last_rep_at
                    .map_or(true, |last| now.saturating_sub(last).as_secs_f64() >= MIN_SECONDS_BETWEEN_REPS);
                if !self.rep_counted && spaced {
                    self.rep_counted = true;
                    self.last_rep_at = Some(now);
                    let (feedback, good) = grade_rep(reading.elbow, reading.back, reading.vertical);
                    let keys = issue_keys(&rep_issues(reading.elbow, reading.back, reading.vertical));
                    let metrics = vec![
                        ("elbow_angle".to_string(), reading.elbow),
                        ("back_angle".to_string(), reading.back),
                        ("vertical_angle".to_string(), reading.vertical),
                        ("swing".to_string(), reading.swing),
                    ];
                    self.core.count_rep(metrics, feedback, good, &keys);
                }
            }
            ArmState::Down if reading.elbow < UP_THRESHOLD => {
                debug!("Tricep state Down -> Up at {:.1}°", reading.elbow);
                self.state = ArmState::Up;
                self.rep_counted = false;
            }
            ArmState::Down => self.track_extension(reading.elbow),
            ArmState::Up => {}
        }
    }

    /// Keep the counted rep's extension at the deepest point reached
    fn track_extension(&mut self, elbow: f64) {
        if !self.rep_counted || elbow <= self.peak_extension {
            return;
        }
        let previous = self.peak_extension;
        self.peak_extension = elbow;
        let Some(rep) = self.core.recorder.last_rep_mut() else {
            return;
        };
        rep.set_metric("elbow_angle", elbow);
        let back = rep.metric("back_angle").unwrap_or(BACK_ANGLE_MIN);
        let vertical = rep.metric("vertical_angle").unwrap_or_default();

        let before = issue_keys(&rep_issues(previous, back, vertical));
        let after = issue_keys(&rep_issues(elbow, back, vertical));
        for key in before.iter().filter(|k| !after.contains(k)) {
            self.core.issues.unbump(key);
        }
        for key in after.iter().filter(|k| !before.contains(k)) {
            self.core.issues.bump(key);
        }

        let (feedback, good) = grade_rep(elbow, back, vertical);
        self.core.revise_last_rep(&feedback, good);
    }
}

impl Trainer for TricepTrainer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::TricepPushdown
    }

    fn required_parts(&self) -> Vec<BodyPart> {
        REQUIRED_JOINTS.iter().map(|j| j.on(self.side)).collect()
    }

    fn process(&mut self, input: &FrameInput) -> FrameAnalysis {
        self.core.start_frame(input);

        let smoothed = input.pose.as_ref().map(|raw| self.smoother.smooth(raw));
        if let Some(pose) = &smoothed {
            let side = pose.most_visible_side(&ARM_JOINTS);
            if side != self.side {
                debug!("Tracking {:?} arm instead of {:?}", side, self.side);
                self.swing.reset();
                self.side = side;
            }
        }
        let min_visibility = self.core.min_keypoint_confidence;
        let parts = self.required_parts();
        let Some(pose) = smoothed.filter(|p| p.has_all(&parts, min_visibility)) else {
            let event = self.core.observe_detection(false);
            if event == DetectionEvent::Reset {
                self.reset_rep();
                self.smoother.reset();
                self.swing.reset();
            }
            return self.core.lost_analysis(event);
        };
        self.core.observe_detection(true);

        let Some(reading) = self.read_arm(&pose) else {
            let mut analysis = self.core.analysis();
            analysis.pose = Some(pose);
            return analysis;
        };

        self.core.recorder.begin_frame();
        self.core.recorder.record(ELBOW_SERIES, reading.elbow);
        self.core.recorder.record(BACK_SERIES, reading.back);
        self.core.recorder.record(VERTICAL_SERIES, reading.vertical);
        self.core.recorder.record(SWING_SERIES, reading.swing);

        let mut highlights = vec![
            Highlight {
                from: self.side.shoulder(),
                to: self.side.elbow(),
                severity: Severity::Info,
            },
            Highlight {
                from: self.side.elbow(),
                to: self.side.wrist(),
                severity: Severity::Info,
            },
        ];

        match self.core.lifecycle.phase() {
            Phase::Counting => {
                self.check_form(&reading, &mut highlights);
                self.step(&reading);
            }
            // The final rep can still reach full extension after the target is hit
            Phase::Complete if self.state == ArmState::Down => self.track_extension(reading.elbow),
            Phase::Complete => {}
            Phase::Waiting | Phase::Countdown => {
                self.core
                    .observe_position(reading.elbow < UP_THRESHOLD + START_POSITION_MARGIN);
            }
        }

        let mut analysis = self.core.waiting_analysis("Get in position (arms bent)");
        analysis.pose = Some(pose);
        analysis.highlights = highlights;
        analysis.metrics = vec![
            (ELBOW_SERIES.to_string(), reading.elbow),
            (BACK_SERIES.to_string(), reading.back),
            (VERTICAL_SERIES.to_string(), reading.vertical),
            (SWING_SERIES.to_string(), reading.swing),
        ];
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
