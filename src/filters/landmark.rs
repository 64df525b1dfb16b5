//! Exponential smoothing of every keypoint between frames.

use crate::{constants::NUM_BODY_LANDMARKS, landmarks::Pose, Error, Result};

/// Smooths landmark positions across frames
///
/// Each keypoint keeps its own history. Keypoints below the visibility floor
/// pass through unchanged and leave their history untouched.
pub struct LandmarkSmoother {
    alpha: f64,
    visibility_floor: f64,
    history: [Option<(f64, f64)>; NUM_BODY_LANDMARKS],
}

impl LandmarkSmoother {
    /// # Errors
    ///
    /// Returns `FilterError` if `alpha` is outside (0, 1]
    pub fn new(alpha: f64, visibility_floor: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self {
            alpha,
            visibility_floor,
            history: [None; NUM_BODY_LANDMARKS],
        })
    }

    /// Return a smoothed copy of `pose` and update history
    pub fn smooth(&mut self, pose: &Pose) -> Pose {
        let mut out = pose.clone();
        for (lm, slot) in out.landmarks.iter_mut().zip(self.history.iter_mut()) {
            if lm.visibility < self.visibility_floor {
                continue;
            }
            let (x, y) = match *slot {
                Some((hx, hy)) => (
                    self.alpha * lm.x + (1.0 - self.alpha) * hx,
                    self.alpha * lm.y + (1.0 - self.alpha) * hy,
                ),
                None => (lm.x, lm.y),
            };
            *slot = Some((x, y));
            lm.x = x;
            lm.y = y;
        }
        out
    }

    pub fn reset(&mut self) {
        self.history = [None; NUM_BODY_LANDMARKS];
    }
}
