//! Body landmark model.
//!
//! Landmarks follow the 17-keypoint COCO layout produced by MoveNet. Coordinates
//! are pixels in the frame the detector was run on; `visibility` is the model's
//! keypoint confidence in `[0, 1]`.

use crate::constants::NUM_BODY_LANDMARKS;
use serde::{Deserialize, Serialize};

/// Keypoint index in the pose model output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    /// All parts in model output order
    pub const ALL: [BodyPart; NUM_BODY_LANDMARKS] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    /// Position in the model output
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a part from its output index
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Bones drawn for the skeleton overlay
pub const SKELETON_EDGES: [(BodyPart, BodyPart); 12] = [
    (BodyPart::LeftShoulder, BodyPart::RightShoulder),
    (BodyPart::LeftShoulder, BodyPart::LeftElbow),
    (BodyPart::LeftElbow, BodyPart::LeftWrist),
    (BodyPart::RightShoulder, BodyPart::RightElbow),
    (BodyPart::RightElbow, BodyPart::RightWrist),
    (BodyPart::LeftShoulder, BodyPart::LeftHip),
    (BodyPart::RightShoulder, BodyPart::RightHip),
    (BodyPart::LeftHip, BodyPart::RightHip),
    (BodyPart::LeftHip, BodyPart::LeftKnee),
    (BodyPart::LeftKnee, BodyPart::LeftAnkle),
    (BodyPart::RightHip, BodyPart::RightKnee),
    (BodyPart::RightKnee, BodyPart::RightAnkle),
];

/// 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Single detected keypoint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    #[must_use]
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Body side used by single-arm / single-leg trainers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn shoulder(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftShoulder,
            Side::Right => BodyPart::RightShoulder,
        }
    }

    #[must_use]
    pub fn elbow(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftElbow,
            Side::Right => BodyPart::RightElbow,
        }
    }

    #[must_use]
    pub fn wrist(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftWrist,
            Side::Right => BodyPart::RightWrist,
        }
    }

    #[must_use]
    pub fn hip(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftHip,
            Side::Right => BodyPart::RightHip,
        }
    }

    #[must_use]
    pub fn knee(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftKnee,
            Side::Right => BodyPart::RightKnee,
        }
    }

    #[must_use]
    pub fn ankle(self) -> BodyPart {
        match self {
            Side::Left => BodyPart::LeftAnkle,
            Side::Right => BodyPart::RightAnkle,
        }
    }
}

/// Keypoint slot on one side of the body, resolved against a `Side`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl Joint {
    #[must_use]
    pub fn on(self, side: Side) -> BodyPart {
        match self {
            Joint::Shoulder => side.shoulder(),
            Joint::Elbow => side.elbow(),
            Joint::Wrist => side.wrist(),
            Joint::Hip => side.hip(),
            Joint::Knee => side.knee(),
            Joint::Ankle => side.ankle(),
        }
    }
}

/// Full-body pose for a single person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub landmarks: [Landmark; NUM_BODY_LANDMARKS],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); NUM_BODY_LANDMARKS],
        }
    }
}

impl Pose {
    #[must_use]
    pub fn new(landmarks: [Landmark; NUM_BODY_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    #[must_use]
    pub fn get(&self, part: BodyPart) -> &Landmark {
        &self.landmarks[part.index()]
    }

    pub fn get_mut(&mut self, part: BodyPart) -> &mut Landmark {
        &mut self.landmarks[part.index()]
    }

    #[must_use]
    pub fn point(&self, part: BodyPart) -> Point2 {
        self.get(part).point()
    }

    /// Whether every listed part is at least `min_visibility` confident
    #[must_use]
    pub fn has_all(&self, parts: &[BodyPart], min_visibility: f64) -> bool {
        parts.iter().all(|&p| self.get(p).visibility >= min_visibility)
    }

    /// Summed visibility of the given joints on one side
    #[must_use]
    pub fn side_visibility(&self, side: Side, joints: &[Joint]) -> f64 {
        joints.iter().map(|j| self.get(j.on(side)).visibility).sum()
    }

    /// Side whose joints are more visible; right wins ties
    #[must_use]
    pub fn most_visible_side(&self, joints: &[Joint]) -> Side {
        if self.side_visibility(Side::Right, joints) >= self.side_visibility(Side::Left, joints) {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Mean visibility over all keypoints
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_visibility(&self) -> f64 {
        self.landmarks.iter().map(|l| l.visibility).sum::<f64>() / NUM_BODY_LANDMARKS as f64
    }

    /// Copy of the pose with coordinates scaled onto another image size
    #[must_use]
    pub fn scaled(&self, sx: f64, sy: f64) -> Pose {
        let mut scaled = self.clone();
        for lm in &mut scaled.landmarks {
            lm.x *= sx;
            lm.y *= sy;
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_part_indices() {
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
            assert_eq!(BodyPart::from_index(i), Some(*part));
        }
        assert_eq!(BodyPart::from_index(NUM_BODY_LANDMARKS), None);
    }

    #[test]
    fn test_most_visible_side() {
        let mut pose = Pose::default();
        pose.get_mut(BodyPart::LeftElbow).visibility = 0.9;
        pose.get_mut(BodyPart::RightElbow).visibility = 0.4;
        let joints = [Joint::Shoulder, Joint::Elbow, Joint::Wrist];
        assert_eq!(pose.most_visible_side(&joints), Side::Left);

        // Ties go to the right side
        let even = Pose::default();
        assert_eq!(even.most_visible_side(&joints), Side::Right);
    }

    #[test]
    fn test_has_all_and_scaled() {
        let mut pose = Pose::default();
        *pose.get_mut(BodyPart::RightKnee) = Landmark::new(10.0, 20.0, 0.8);
        assert!(pose.has_all(&[BodyPart::RightKnee], 0.5));
        assert!(!pose.has_all(&[BodyPart::RightKnee, BodyPart::LeftKnee], 0.5));

        let scaled = pose.scaled(2.0, 0.5);
        assert_eq!(scaled.point(BodyPart::RightKnee), Point2::new(20.0, 10.0));
        assert_eq!(scaled.get(BodyPart::RightKnee).visibility, 0.8);
    }
}
