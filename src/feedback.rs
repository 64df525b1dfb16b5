//! On-screen feedback messages.

use serde::{Deserialize, Serialize};

/// How a message is coloured in the feedback bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A line of text for the feedback bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub text: String,
    pub severity: Severity,
}

impl FeedbackMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

/// Messages that stay visible for a number of frames
///
/// With a persistence of 1 a message is shown on the frame it was posted and
/// dropped on the next `tick`.
#[derive(Debug, Clone)]
pub struct FeedbackBoard {
    persistence: u32,
    entries: Vec<(FeedbackMessage, u32)>,
}

impl FeedbackBoard {
    #[must_use]
    pub fn new(persistence_frames: u32) -> Self {
        Self {
            persistence: persistence_frames.max(1),
            entries: Vec::new(),
        }
    }

    /// Post a message; reposting the same text refreshes its lifetime
    pub fn post(&mut self, message: FeedbackMessage) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| m.text == message.text) {
            *entry = (message, self.persistence);
        } else {
            self.entries.push((message, self.persistence));
        }
    }

    /// Age every message by one frame, dropping expired ones
    pub fn tick(&mut self) {
        for (_, left) in &mut self.entries {
            *left = left.saturating_sub(1);
        }
        self.entries.retain(|(_, left)| *left > 0);
    }

    /// Drop a message before it expires
    pub fn dismiss(&mut self, text: &str) {
        self.entries.retain(|(m, _)| m.text != text);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Messages currently on screen, oldest first
    #[must_use]
    pub fn active(&self) -> Vec<FeedbackMessage> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame_persistence() {
        let mut board = FeedbackBoard::new(1);
        board.post(FeedbackMessage::warning("Stop swinging elbows!"));
        assert_eq!(board.active().len(), 1);
        board.tick();
        assert!(board.is_empty());
    }

    #[test]
    fn test_dismiss_removes_only_matching_text() {
        let mut board = FeedbackBoard::new(60);
        board.post(FeedbackMessage::warning("Turn sideways"));
        board.post(FeedbackMessage::error("Stop swinging elbows!"));
        board.dismiss("Turn sideways");
        assert_eq!(board.active(), vec![FeedbackMessage::error("Stop swinging elbows!")]);
        board.dismiss("Not posted");
        assert_eq!(board.active().len(), 1);
    }

    #[test]
    fn test_repost_refreshes() {
        let mut board = FeedbackBoard::new(3);
        board.post(FeedbackMessage::info("Good form!"));
        board.tick();
        board.tick();
        board.post(FeedbackMessage::info("Good form!"));
        board.tick();
        board.tick();
        assert_eq!(board.active(), vec![FeedbackMessage::info("Good form!")]);
        board.tick();
        assert!(board.is_empty());
    }
}
