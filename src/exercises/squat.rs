//! Squat rep counting from the right knee angle.
//!
//! A rep is latched the first time the knee closes past the good-depth bound
//! and classified when the user stands back up, using the deepest angle seen.
//! Knee caving is tracked from the knee/ankle width ratio while in the squat.

use super::{usable_pose, FrameAnalysis, FrameInput, Highlight, Trainer, TrainerCore};
use crate::{
    config::Config,
    constants::squat::{
        CORRECT_MIN_RATIO, GOOD_LOWER_ANGLE, GOOD_UPPER_ANGLE, KNEE_CAVING_FRAMES, KNEE_CAVING_THRESHOLD,
        KNEE_CHECK_DEPTH_PERCENT, MIN_REQUIRED_LOWER_ANGLE, MIN_REQUIRED_UPPER_ANGLE, STANDING_ANGLE, STAND_MARGIN,
        TOO_DEEP_ANGLE,
    },
    exercises::ExerciseKind,
    feedback::{FeedbackMessage, Severity},
    filters::SignalFilter,
    geometry::{interp, joint_angle, width_ratio},
    landmarks::{BodyPart, Point2, Pose},
    session::{DetectionEvent, Phase, SessionRecorder, SessionSummary},
    Result,
};
use log::debug;

const KNEE_SERIES: &str = "Knee Angle";
const RATIO_SERIES: &str = "Knee/Ankle Ratio";

const REQUIRED: [BodyPart; 3] = [BodyPart::RightHip, BodyPart::RightKnee, BodyPart::RightAnkle];

/// Standing angle that completes a rep
const STAND_UP_ANGLE: f64 = STANDING_ANGLE - STAND_MARGIN;

/// Depth band the current knee angle falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStatus {
    TooShallow,
    Deeper,
    Good,
    TooDeep,
    /// Between the good band and too deep
    AcceptablyDeep,
}

impl DepthStatus {
    /// Classify a knee angle
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        if angle > MIN_REQUIRED_UPPER_ANGLE {
            DepthStatus::TooShallow
        } else if (MIN_REQUIRED_LOWER_ANGLE..=MIN_REQUIRED_UPPER_ANGLE).contains(&angle) {
            DepthStatus::Deeper
        } else if (GOOD_LOWER_ANGLE..=GOOD_UPPER_ANGLE).contains(&angle) {
            DepthStatus::Good
        } else if angle < TOO_DEEP_ANGLE {
            DepthStatus::TooDeep
        } else {
            DepthStatus::AcceptablyDeep
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DepthStatus::TooShallow => "TOO SHALLOW",
            DepthStatus::Deeper => "DEEPER!",
            DepthStatus::Good => "GOOD!",
            DepthStatus::TooDeep => "TOO DEEP",
            DepthStatus::AcceptablyDeep => "GOOD",
        }
    }
}

/// Knee line drawn while squatting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KneeLine {
    pub left: Point2,
    pub right: Point2,
    pub caving: bool,
    /// Where the left knee should be when caving
    pub ideal_left: Option<Point2>,
}

/// Depth gauge state for the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthGauge {
    /// 0 standing, 100 at the too-deep bound
    pub percent: f64,
    pub status: DepthStatus,
    pub knee_line: Option<KneeLine>,
}

/// Map a knee angle onto the depth gauge
#[must_use]
pub fn depth_percent(angle: f64) -> f64 {
    interp(angle, (TOO_DEEP_ANGLE, STANDING_ANGLE), (100.0, 0.0))
}

/// Squat trainer
pub struct SquatTrainer {
    core: TrainerCore,
    knee_filter: Box<dyn SignalFilter>,
    rep_latched: bool,
    min_angle: f64,
    caving_frames: u32,
    knees_caved: bool,
}

impl SquatTrainer {
    pub fn new(config: &Config) -> Result<Self> {
        let mut core = TrainerCore::new(ExerciseKind::Squat, config, 1);
        core.recorder.declare(
            KNEE_SERIES,
            "degrees",
            &[
                ("Too Deep", TOO_DEEP_ANGLE),
                ("Good Depth Lower", GOOD_LOWER_ANGLE),
                ("Good Depth Upper", GOOD_UPPER_ANGLE),
            ],
        );
        core.recorder
            .declare(RATIO_SERIES, "ratio", &[("Knee Caving Threshold", KNEE_CAVING_THRESHOLD)]);
        Ok(Self {
            core,
            knee_filter: config.knee_ratio_filter()?,
            rep_latched: false,
            min_angle: f64::INFINITY,
            caving_frames: 0,
            knees_caved: false,
        })
    }

    fn reset_rep(&mut self) {
        self.rep_latched = false;
        self.min_angle = f64::INFINITY;
        self.caving_frames = 0;
        self.knees_caved = false;
    }

    /// Update knee caving state; returns the knee line to draw
    fn track_knees(&mut self, pose: &Pose, percent: f64, counting: bool) -> Option<KneeLine> {
        let min_visibility = self.core.min_keypoint_confidence;
        if !pose.has_all(&[BodyPart::LeftKnee, BodyPart::LeftAnkle], min_visibility) {
            return None;
        }
        let left_knee = pose.point(BodyPart::LeftKnee);
        let right_knee = pose.point(BodyPart::RightKnee);
        let left_ankle = pose.point(BodyPart::LeftAnkle);
        let right_ankle = pose.point(BodyPart::RightAnkle);

        let ratio = width_ratio(left_knee, right_knee, left_ankle, right_ankle, 0.0);
        if ratio <= 0.0 {
            self.caving_frames = 0;
            return None;
        }
        let smoothed = self.knee_filter.apply(ratio);
        self.core.recorder.record(RATIO_SERIES, smoothed);

        if !counting || percent <= KNEE_CHECK_DEPTH_PERCENT {
            self.caving_frames = 0;
            return None;
        }

        let caving = smoothed < KNEE_CAVING_THRESHOLD;
        if caving {
            self.caving_frames += 1;
        } else {
            self.caving_frames = self.caving_frames.saturating_sub(1);
        }
        if self.caving_frames >= KNEE_CAVING_FRAMES {
            if !self.knees_caved {
                debug!("Knees caving, ratio {:.2}", smoothed);
            }
            self.knees_caved = true;
        }

        let ideal_left = caving.then(|| {
            let ankle_width = (right_ankle.x - left_ankle.x).abs();
            Point2::new(right_knee.x - ankle_width * CORRECT_MIN_RATIO * 1.3, left_knee.y)
        });
        if caving && self.knees_caved {
            self.core.board.post(FeedbackMessage::error("Push knees outward!"));
        }
        Some(KneeLine {
            left: left_knee,
            right: right_knee,
            caving,
            ideal_left,
        })
    }

    fn step(&mut self, angle: f64) {
        self.min_angle = self.min_angle.min(angle);

        if !self.rep_latched {
            if angle < GOOD_UPPER_ANGLE {
                debug!("Squat bottom reached at {:.1}°", angle);
                self.rep_latched = true;
            }
            return;
        }

        if angle > STAND_UP_ANGLE {
            let depth = self.min_angle;
            let (feedback, issue) = if depth < TOO_DEEP_ANGLE {
                ("Too deep", Some("too_deep"))
            } else if self.knees_caved {
                ("Knees caving inward", Some("knee_caving"))
            } else {
                ("Good form", None)
            };
            let issues: Vec<&str> = issue.into_iter().collect();
            self.core
                .count_rep(vec![("depth".to_string(), depth)], feedback, issue.is_none(), &issues);
            self.reset_rep();
        }
    }
}

impl Trainer for SquatTrainer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
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

        let angle = joint_angle(
            pose.point(BodyPart::RightHip),
            pose.point(BodyPart::RightKnee),
            pose.point(BodyPart::RightAnkle),
        );
        if angle.is_nan() || angle <= 0.0 {
            let mut analysis = self.core.analysis();
            analysis.pose = Some(pose.clone());
            return analysis;
        }

        let percent = depth_percent(angle);
        let status = DepthStatus::from_angle(angle);
        self.core.recorder.begin_frame();
        self.core.recorder.record(KNEE_SERIES, angle);

        let phase = self.core.lifecycle.phase();
        let counting = phase == Phase::Counting;
        let knee_line = self.track_knees(pose, percent, counting);

        let mut highlights = Vec::new();
        if counting {
            self.step(angle);
            if status == DepthStatus::TooDeep {
                highlights.push(Highlight {
                    from: BodyPart::RightHip,
                    to: BodyPart::RightKnee,
                    severity: Severity::Error,
                });
                highlights.push(Highlight {
                    from: BodyPart::RightKnee,
                    to: BodyPart::RightAnkle,
                    severity: Severity::Error,
                });
            }
        } else if phase != Phase::Complete {
            self.core.observe_position(angle > STAND_UP_ANGLE);
        }

        let mut analysis = self.core.waiting_analysis("Stand straight to begin");
        analysis.pose = Some(pose.clone());
        analysis.highlights = highlights;
        analysis.metrics = vec![(KNEE_SERIES.to_string(), angle), ("Depth %".to_string(), percent)];
        analysis.depth_gauge = Some(DepthGauge {
            percent,
            status,
            knee_line,
        });
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
        self.knee_filter.reset();
        self.reset_rep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::test_support::{base_pose, frame, set_angle};
    use crate::landmarks::Landmark;

    /// Right leg at `knee` degrees; knees `knee_spread` times wider than ankles
    fn squat_pose(knee: f64, knee_spread: f64) -> Pose {
        let mut pose = base_pose();
        *pose.get_mut(BodyPart::RightKnee) = Landmark::new(360.0, 300.0, 0.9);
        *pose.get_mut(BodyPart::RightAnkle) = Landmark::new(360.0, 400.0, 0.9);
        *pose.get_mut(BodyPart::LeftAnkle) = Landmark::new(280.0, 400.0, 0.9);
        *pose.get_mut(BodyPart::LeftKnee) = Landmark::new(360.0 - 80.0 * knee_spread, 300.0, 0.9);
        set_angle(
            &mut pose,
            BodyPart::RightAnkle,
            BodyPart::RightKnee,
            BodyPart::RightHip,
            knee,
            false,
        );
        pose
    }

    fn start_counting(trainer: &mut SquatTrainer) -> u64 {
        let mut i = 0;
        while trainer.core.lifecycle.phase() != Phase::Counting {
            trainer.process(&frame(Some(squat_pose(175.0, 1.3)), i));
            i += 1;
            assert!(i < 500, "countdown never finished");
        }
        i
    }

    fn run(trainer: &mut SquatTrainer, start: u64, angles: &[f64], spread: f64) -> u64 {
        let mut i = start;
        for &angle in angles {
            trainer.process(&frame(Some(squat_pose(angle, spread)), i));
            i += 1;
        }
        i
    }

    #[test]
    fn test_depth_status_bands() {
        assert_eq!(DepthStatus::from_angle(160.0), DepthStatus::TooShallow);
        assert_eq!(DepthStatus::from_angle(140.0), DepthStatus::Deeper);
        assert_eq!(DepthStatus::from_angle(95.0), DepthStatus::Deeper);
        assert_eq!(DepthStatus::from_angle(70.0), DepthStatus::Good);
        assert_eq!(DepthStatus::from_angle(40.0), DepthStatus::AcceptablyDeep);
        assert_eq!(DepthStatus::from_angle(30.0), DepthStatus::TooDeep);
        assert_eq!(DepthStatus::TooDeep.label(), "TOO DEEP");
    }

    #[test]
    fn test_depth_percent() {
        assert_eq!(depth_percent(170.0), 0.0);
        assert_eq!(depth_percent(35.0), 100.0);
        assert_eq!(depth_percent(20.0), 100.0);
    }

    #[test]
    fn test_good_rep_counts_once() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        let i = start_counting(&mut trainer);
        // Stay at the bottom for several frames before standing
        run(&mut trainer, i, &[170.0, 120.0, 80.0, 70.0, 70.0, 75.0, 120.0, 165.0, 170.0], 1.3);

        let summary = trainer.summary();
        assert_eq!(summary.total_reps, 1);
        assert_eq!(summary.reps[0].feedback, "Good form");
        assert!((summary.reps[0].metric("depth").unwrap_or_default() - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_too_deep_rep_is_bad_and_counted_once() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        let i = start_counting(&mut trainer);
        run(&mut trainer, i, &[120.0, 60.0, 30.0, 30.0, 30.0, 100.0, 160.0], 1.3);

        let summary = trainer.summary();
        assert_eq!(summary.total_reps, 1);
        assert_eq!(summary.bad_reps, 1);
        assert_eq!(summary.reps[0].feedback, "Too deep");
    }

    #[test]
    fn test_knee_caving_flags_rep() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        let i = start_counting(&mut trainer);
        // Knees collapse to the ankle line for the whole descent
        let i = run(&mut trainer, i, &[80.0; 15], 0.5);
        run(&mut trainer, i, &[165.0], 1.3);

        let summary = trainer.summary();
        assert_eq!(summary.total_reps, 1);
        assert_eq!(summary.reps[0].feedback, "Knees caving inward");
        assert_eq!(summary.issue_counts.get("knee_caving"), 1);
    }

    #[test]
    fn test_unmeasurable_knee_width_resets_caving_streak() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        trainer.caving_frames = KNEE_CAVING_FRAMES - 1;
        let mut pose = squat_pose(80.0, 0.5);
        // Ankles stacked, so the knee/ankle ratio has no reference width
        pose.get_mut(BodyPart::LeftAnkle).x = 360.0;
        assert!(trainer.track_knees(&pose, 80.0, true).is_none());
        assert_eq!(trainer.caving_frames, 0);
    }

    #[test]
    fn test_shallow_dip_does_not_count() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        let i = start_counting(&mut trainer);
        run(&mut trainer, i, &[150.0, 120.0, 100.0, 150.0, 170.0], 1.3);
        assert_eq!(trainer.summary().total_reps, 0);
    }

    #[test]
    fn test_gauge_reported() {
        let mut trainer = SquatTrainer::new(&Config::default()).expect("trainer");
        let analysis = trainer.process(&frame(Some(squat_pose(70.0, 1.3)), 0));
        let gauge = analysis.depth_gauge.expect("gauge");
        assert_eq!(gauge.status, DepthStatus::Good);
        assert!(gauge.percent > 50.0);
        assert_eq!(analysis.instruction.as_deref(), Some("Stand straight to begin"));
    }
}
