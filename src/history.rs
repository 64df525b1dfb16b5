//! Persistent workout history, one JSON file shared by every exercise.

use crate::{
    constants::HISTORY_LIMIT,
    session::{IssueTally, SessionSummary},
    Error, Result,
};
use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub exercise: String,
    pub date: DateTime<Local>,
    pub duration_secs: f64,
    pub total_reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
    #[serde(default)]
    pub issue_counts: IssueTally,
}

impl From<&SessionSummary> for HistoryEntry {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            exercise: summary.exercise.clone(),
            date: summary.started_at,
            duration_secs: summary.duration_secs,
            total_reps: summary.total_reps,
            good_reps: summary.good_reps,
            bad_reps: summary.bad_reps,
            issue_counts: summary.issue_counts.clone(),
        }
    }
}

/// Most recent sessions, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutHistory {
    pub sessions: Vec<HistoryEntry>,
}

impl WorkoutHistory {
    /// Load the history, or an empty one when the file does not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No workout history at {}, starting fresh", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::HistoryError(format!("Corrupt history file {}: {e}", path.display())))
    }

    /// Write the history as pretty JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add a session, dropping the oldest beyond [`HISTORY_LIMIT`]
    pub fn append(&mut self, summary: &SessionSummary) {
        self.sessions.push(HistoryEntry::from(summary));
        if self.sessions.len() > HISTORY_LIMIT {
            let excess = self.sessions.len() - HISTORY_LIMIT;
            self.sessions.drain(..excess);
        }
    }

    /// Sessions of one exercise, oldest first
    pub fn for_exercise<'a>(&'a self, exercise: &'a str) -> impl Iterator<Item = &'a HistoryEntry> + 'a {
        self.sessions.iter().filter(move |e| e.exercise == exercise)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Load, append and save in one step
///
/// # Errors
///
/// Returns an error if the history cannot be read or written
pub fn record_session<P: AsRef<Path>>(path: P, summary: &SessionSummary) -> Result<WorkoutHistory> {
    let path = path.as_ref();
    let mut history = WorkoutHistory::load(path)?;
    history.append(summary);
    history.save(path)?;
    info!(
        "Workout history updated ({} sessions) at {}",
        history.len(),
        path.display()
    );
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn summary(exercise: &str, reps: u32) -> SessionSummary {
        let mut issues = IssueTally::default();
        issues.bump("knee_caving");
        SessionSummary {
            exercise: exercise.to_string(),
            started_at: Local::now(),
            duration_secs: 30.0,
            total_reps: reps,
            good_reps: reps.saturating_sub(1),
            bad_reps: reps.min(1),
            issue_counts: issues,
            reps: Vec::new(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = WorkoutHistory::load(dir.path().join("none.json")).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_append_keeps_last_sessions() {
        let mut history = WorkoutHistory::default();
        for reps in 0..(HISTORY_LIMIT as u32 + 5) {
            history.append(&summary("squat", reps));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.sessions[0].total_reps, 5);
        assert_eq!(history.sessions.last().unwrap().total_reps, HISTORY_LIMIT as u32 + 4);
    }

    #[test]
    fn test_record_session_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");
        record_session(&path, &summary("squat", 4)).unwrap();
        record_session(&path, &summary("pushup", 2)).unwrap();

        let history = WorkoutHistory::load(&path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.for_exercise("pushup").count(), 1);
        assert_eq!(history.sessions[0].issue_counts.get("knee_caving"), 1);
    }

    #[test]
    fn test_corrupt_file_is_history_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(WorkoutHistory::load(&path), Err(Error::HistoryError(_))));
    }
}
