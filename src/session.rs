//! Session lifecycle shared by every trainer.
//!
//! A session moves through four phases:
//!
//! 1. `Waiting` until the user has held the start position for
//!    [`POSITION_LOCK_FRAMES`] frames,
//! 2. `Countdown` for [`COUNTDOWN_SECONDS`],
//! 3. `Counting` while reps are tracked,
//! 4. `Complete` once the rep target is reached; the rest screen stays up for
//!    [`REST_SCREEN_SECONDS`] before the app exits.
//!
//! Losing the pose for [`DETECTION_LOST_RESET_FRAMES`] frames sends the session
//! back to `Waiting` without touching rep totals.

use crate::constants::{
    COUNTDOWN_SECONDS, DETECTION_LOST_RESET_FRAMES, DETECTION_LOST_WARN_FRAMES, POSITION_DECAY_FRAMES,
    POSITION_LOCK_FRAMES, REST_SCREEN_SECONDS,
};
use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Exercise phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the user to hold the start position
    Waiting,
    /// Start position locked, counting down
    Countdown,
    /// Counting reps
    Counting,
    /// Rep target reached
    Complete,
}

/// Outcome of a detection update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionEvent {
    /// Pose found this frame
    Found,
    /// Pose missing, not yet worth a warning
    Lost,
    /// Pose missing long enough to warn the user
    Warn,
    /// Pose missing long enough that the trainer was reset
    Reset,
}

/// Lifecycle timing parameters
#[derive(Debug, Clone, Copy)]
pub struct LifecycleParams {
    pub position_lock_frames: u32,
    pub countdown: Duration,
    pub lost_warn_frames: u32,
    pub lost_reset_frames: u32,
    pub rest_screen: Duration,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            position_lock_frames: POSITION_LOCK_FRAMES,
            countdown: Duration::from_secs_f64(COUNTDOWN_SECONDS),
            lost_warn_frames: DETECTION_LOST_WARN_FRAMES,
            lost_reset_frames: DETECTION_LOST_RESET_FRAMES,
            rest_screen: Duration::from_secs_f64(REST_SCREEN_SECONDS),
        }
    }
}

/// Position lock, countdown and detection-loss bookkeeping
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    params: LifecycleParams,
    phase: Phase,
    position_frames: u32,
    countdown_started: Option<Duration>,
    lost_frames: u32,
    completed_at: Option<Duration>,
}

impl SessionLifecycle {
    #[must_use]
    pub fn new(params: LifecycleParams) -> Self {
        Self {
            params,
            phase: Phase::Waiting,
            position_frames: 0,
            countdown_started: None,
            lost_frames: 0,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_counting(&self) -> bool {
        self.phase == Phase::Counting
    }

    /// Feed whether the user is in the start position this frame
    ///
    /// Only has an effect before counting starts.
    pub fn observe_position(&mut self, in_position: bool, now: Duration) {
        if !matches!(self.phase, Phase::Waiting | Phase::Countdown) {
            return;
        }

        if in_position {
            self.position_frames = self.position_frames.saturating_add(1);
            if self.position_frames >= self.params.position_lock_frames && self.countdown_started.is_none() {
                debug!("Start position held for {} frames, countdown started", self.position_frames);
                self.countdown_started = Some(now);
                self.phase = Phase::Countdown;
            }
        } else {
            self.position_frames = self.position_frames.saturating_sub(POSITION_DECAY_FRAMES);
            if self.countdown_started.take().is_some() {
                debug!("Start position lost, countdown cancelled");
            }
            self.phase = Phase::Waiting;
        }

        if let Some(started) = self.countdown_started {
            if now.saturating_sub(started) >= self.params.countdown {
                info!("Countdown finished, counting reps");
                self.countdown_started = None;
                self.phase = Phase::Counting;
            }
        }
    }

    /// Whole seconds left on the countdown, if one is running
    #[must_use]
    pub fn countdown_remaining(&self, now: Duration) -> Option<u32> {
        let started = self.countdown_started?;
        let left = self.params.countdown.saturating_sub(now.saturating_sub(started));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = left.as_secs_f64().ceil() as u32;
        (secs > 0).then_some(secs)
    }

    /// Fraction of the position lock achieved
    #[must_use]
    pub fn position_progress(&self) -> f64 {
        if self.params.position_lock_frames == 0 {
            return 1.0;
        }
        (f64::from(self.position_frames) / f64::from(self.params.position_lock_frames)).min(1.0)
    }

    /// Feed whether a usable pose was found this frame
    pub fn observe_detection(&mut self, found: bool) -> DetectionEvent {
        if found {
            self.lost_frames = 0;
            return DetectionEvent::Found;
        }

        self.lost_frames = self.lost_frames.saturating_add(1);
        if self.lost_frames == self.params.lost_reset_frames {
            info!("Detection lost for {} frames, resetting trainer", self.lost_frames);
            if self.phase != Phase::Complete {
                self.phase = Phase::Waiting;
            }
            self.position_frames = 0;
            self.countdown_started = None;
            DetectionEvent::Reset
        } else if self.lost_frames > self.params.lost_warn_frames {
            DetectionEvent::Warn
        } else {
            DetectionEvent::Lost
        }
    }

    #[must_use]
    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    /// Enter the `Complete` phase
    pub fn mark_complete(&mut self, now: Duration) {
        if self.phase != Phase::Complete {
            info!("Session complete");
            self.phase = Phase::Complete;
            self.completed_at = Some(now);
        }
    }

    /// Whether the rest screen has been shown long enough
    #[must_use]
    pub fn should_exit(&self, now: Duration) -> bool {
        self.completed_at
            .is_some_and(|done| now.saturating_sub(done) >= self.params.rest_screen)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }
}

/// A single counted repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    /// 1-based rep number
    pub index: u32,
    /// Analysed-frame index at which the rep was counted
    pub frame: usize,
    /// Named measurements taken for the rep
    pub metrics: Vec<(String, f64)>,
    /// Feedback text shown for the rep
    pub feedback: String,
    /// Whether the rep had no form issues
    pub good: bool,
}

impl RepRecord {
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn set_metric(&mut self, name: &str, value: f64) {
        match self.metrics.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.metrics.push((name.to_string(), value)),
        }
    }
}

/// Horizontal reference line drawn on a chart panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub label: String,
    pub value: f64,
}

/// One recorded per-frame signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub unit: String,
    /// (analysed-frame index, value)
    pub samples: Vec<(usize, f64)>,
    pub thresholds: Vec<ThresholdLine>,
}

/// Per-frame series and rep log for one session
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    frames: usize,
    series: Vec<Series>,
    reps: Vec<RepRecord>,
}

impl SessionRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a series with its chart thresholds
    pub fn declare(&mut self, name: &str, unit: &str, thresholds: &[(&str, f64)]) {
        if self.series.iter().any(|s| s.name == name) {
            return;
        }
        self.series.push(Series {
            name: name.to_string(),
            unit: unit.to_string(),
            samples: Vec::new(),
            thresholds: thresholds
                .iter()
                .map(|(label, value)| ThresholdLine {
                    label: (*label).to_string(),
                    value: *value,
                })
                .collect(),
        });
    }

    /// Drop samples and reps, keeping series declarations
    pub fn clear(&mut self) {
        self.frames = 0;
        self.reps.clear();
        for series in &mut self.series {
            series.samples.clear();
        }
    }

    /// Start a new analysed frame and return its index
    pub fn begin_frame(&mut self) -> usize {
        let index = self.frames;
        self.frames += 1;
        index
    }

    /// Index of the most recent analysed frame
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.frames.saturating_sub(1)
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Record a sample on the current frame; undeclared series are created
    pub fn record(&mut self, name: &str, value: f64) {
        let frame = self.current_frame();
        if let Some(series) = self.series.iter_mut().find(|s| s.name == name) {
            series.samples.push((frame, value));
        } else {
            self.declare(name, "", &[]);
            if let Some(series) = self.series.last_mut() {
                series.samples.push((frame, value));
            }
        }
    }

    /// Append a counted rep and return a handle to it
    pub fn push_rep(&mut self, metrics: Vec<(String, f64)>, feedback: impl Into<String>, good: bool) -> &mut RepRecord {
        #[allow(clippy::cast_possible_truncation)]
        let index = self.reps.len() as u32 + 1;
        let frame = self.current_frame();
        self.reps.push(RepRecord {
            index,
            frame,
            metrics,
            feedback: feedback.into(),
            good,
        });
        let last = self.reps.len() - 1;
        &mut self.reps[last]
    }

    pub fn last_rep_mut(&mut self) -> Option<&mut RepRecord> {
        self.reps.last_mut()
    }

    #[must_use]
    pub fn reps(&self) -> &[RepRecord] {
        &self.reps
    }

    #[must_use]
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    #[must_use]
    pub fn get_series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Frame indices at which reps were counted
    #[must_use]
    pub fn rep_markers(&self) -> Vec<usize> {
        self.reps.iter().map(|r| r.frame).collect()
    }
}

/// Tally of form issues keyed by a stable issue name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTally(BTreeMap<String, u32>);

impl IssueTally {
    pub fn bump(&mut self, issue: &str) {
        *self.0.entry(issue.to_string()).or_insert(0) += 1;
    }

    /// Undo one `bump`; the key disappears when its count reaches zero
    pub fn unbump(&mut self, issue: &str) {
        if let Some(count) = self.0.get_mut(issue) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.0.remove(issue);
            }
        }
    }

    #[must_use]
    pub fn get(&self, issue: &str) -> u32 {
        self.0.get(issue).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// End-of-session summary, written to reports and the workout history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: String,
    pub started_at: DateTime<Local>,
    pub duration_secs: f64,
    pub total_reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
    pub issue_counts: IssueTally,
    pub reps: Vec<RepRecord>,
}

impl SessionSummary {
    /// One-line human readable totals
    #[must_use]
    pub fn headline(&self) -> String {
        let mut line = format!(
            "Total Reps: {}, Good: {}, Form Issues: {}",
            self.total_reps, self.good_reps, self.bad_reps
        );
        for (issue, count) in self.issue_counts.iter() {
            line.push_str(&format!(", {}: {count}", humanize(issue)));
        }
        line
    }
}

fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in key.split('_').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_uppercase());
            } else {
                out.push(first);
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
