//! Constants used throughout the application

/// Number of body keypoints produced by the MoveNet pose model
pub const NUM_BODY_LANDMARKS: usize = 17;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Default width of the frame handed to the pose detector
pub const DEFAULT_PROCESSING_WIDTH: i32 = 640;

/// Default minimum average keypoint confidence for a pose to count as detected
pub const DEFAULT_MIN_POSE_CONFIDENCE: f64 = 0.3;

/// Default minimum confidence for an individual required keypoint
pub const DEFAULT_MIN_KEYPOINT_CONFIDENCE: f64 = 0.2;

/// Frames the user must hold the start position before the countdown begins
pub const POSITION_LOCK_FRAMES: u32 = 30;

/// Position frames lost per frame out of position
pub const POSITION_DECAY_FRAMES: u32 = 2;

/// Countdown length before reps are counted (seconds)
pub const COUNTDOWN_SECONDS: f64 = 3.0;

/// Lost-detection frames before an on-screen warning appears
pub const DETECTION_LOST_WARN_FRAMES: u32 = 10;

/// Lost-detection frames before the trainer returns to the waiting phase
pub const DETECTION_LOST_RESET_FRAMES: u32 = 30;

/// Seconds the rest screen stays up once the session is complete
pub const REST_SCREEN_SECONDS: f64 = 5.0;

/// Default rep target for a session
pub const DEFAULT_MAX_REPS: u32 = 12;

/// Minimum analysed frames required to draw session charts
pub const MIN_FRAMES_FOR_REPORT: usize = 10;

/// Sessions kept in the workout history file
pub const HISTORY_LIMIT: usize = 20;

/// Push-up thresholds (right arm, degrees)
pub mod pushup {
    /// Elbow angle above which the arms count as extended
    pub const UP_THRESHOLD: f64 = 140.0;
    /// Elbow angle below which the bottom position is reached
    pub const DOWN_THRESHOLD: f64 = 110.0;
    /// Target bottom depth shown on charts
    pub const ELBOW_BENT_ANGLE: f64 = 100.0;
    /// Too-deep line shown on charts
    pub const ELBOW_TOO_BENT_ANGLE: f64 = 80.0;
    /// Elbow span over shoulder span above which elbows flare into a T
    pub const ELBOW_WIDTH_THRESHOLD: f64 = 1.8;
    /// Minimum elbow range of motion for a rep to count
    pub const MIN_RANGE_OF_MOTION: f64 = 30.0;
}

/// Squat thresholds (right leg, degrees)
pub mod squat {
    /// Standing straight
    pub const STANDING_ANGLE: f64 = 170.0;
    /// Margin below standing that re-arms the rep latch
    pub const STAND_MARGIN: f64 = 20.0;
    /// Deep end of the good depth band
    pub const GOOD_LOWER_ANGLE: f64 = 45.0;
    /// Shallow end of the good depth band
    pub const GOOD_UPPER_ANGLE: f64 = 95.0;
    /// Deep end of the minimum-required band
    pub const MIN_REQUIRED_LOWER_ANGLE: f64 = 95.0;
    /// Shallow end of the minimum-required band
    pub const MIN_REQUIRED_UPPER_ANGLE: f64 = 140.0;
    /// Below this the squat is too deep
    pub const TOO_DEEP_ANGLE: f64 = 35.0;
    /// Smoothed knee/ankle width ratio below which knees cave in
    pub const KNEE_CAVING_THRESHOLD: f64 = 1.1;
    /// Reference ratio for the ideal knee line
    pub const CORRECT_MIN_RATIO: f64 = 0.85;
    /// Samples in the knee ratio moving average
    pub const KNEE_HISTORY_LENGTH: usize = 10;
    /// Consecutive caving frames before a rep is flagged
    pub const KNEE_CAVING_FRAMES: u32 = 3;
    /// Depth percentage above which knee alignment is checked
    pub const KNEE_CHECK_DEPTH_PERCENT: f64 = 30.0;
}

/// Tricep pushdown thresholds (degrees unless noted)
pub mod tricep {
    /// Arms bent
    pub const ELBOW_ANGLE_MIN: f64 = 85.0;
    /// Arms fully extended
    pub const ELBOW_ANGLE_MAX: f64 = 160.0;
    /// Back tilted too far forward below this
    pub const BACK_ANGLE_MIN: f64 = 143.6;
    /// Back too upright above this
    pub const BACK_ANGLE_MAX: f64 = 170.0;
    /// Minor forward elbow lean
    pub const ELBOW_POSITION_MINOR_THRESHOLD: f64 = 10.0;
    /// Major forward elbow lean
    pub const ELBOW_POSITION_MAJOR_THRESHOLD: f64 = 30.0;
    /// Elbow swing (pixels) tracked as a form issue
    pub const ELBOW_STABILITY_THRESHOLD: f64 = 15.0;
    /// Elbow swing (pixels) reported to the user
    pub const BAD_ELBOW_STABILITY_THRESHOLD: f64 = 30.0;
    /// Below this the arms are back in the bent ("up") position
    pub const UP_THRESHOLD: f64 = ELBOW_ANGLE_MIN + 15.0;
    /// Above this the arms are in the extended ("down") position
    pub const DOWN_THRESHOLD: f64 = ELBOW_ANGLE_MAX - 30.0;
    /// Extra leniency for the start position
    pub const START_POSITION_MARGIN: f64 = 20.0;
    /// Landmark smoothing factor
    pub const SMOOTHING_ALPHA: f64 = 0.3;
    /// Minimum spacing between reps (seconds)
    pub const MIN_SECONDS_BETWEEN_REPS: f64 = 0.5;
    /// Frame width the pixel thresholds were calibrated at
    pub const PROCESSING_WIDTH: i32 = 1280;
}

/// Bicep curl thresholds (degrees unless noted)
pub mod bicep {
    /// Fully curled
    pub const ELBOW_ANGLE_MIN: f64 = 70.0;
    /// Fully extended
    pub const ELBOW_ANGLE_MAX: f64 = 160.0;
    /// Below this the arm is curled ("up")
    pub const UP_THRESHOLD: f64 = ELBOW_ANGLE_MIN + 10.0;
    /// Above this the arm is extended ("down")
    pub const DOWN_THRESHOLD: f64 = ELBOW_ANGLE_MAX - 20.0;
    /// Elbow swing tracked as a form issue
    pub const ELBOW_STABILITY_THRESHOLD: f64 = 25.0;
    /// Elbow swing that makes a rep bad
    pub const BAD_ELBOW_STABILITY_THRESHOLD: f64 = 45.0;
    /// Shoulder line tilt that means the user stands sideways
    pub const SIDEWAYS_TILT: f64 = 20.0;
    /// Landmark smoothing factor
    pub const SMOOTHING_ALPHA: f64 = 0.5;
    /// Minimum spacing between reps (seconds)
    pub const MIN_SECONDS_BETWEEN_REPS: f64 = 0.5;
    /// Frames a feedback message stays on screen
    pub const FEEDBACK_PERSISTENCE: u32 = 60;
    /// Rep target
    pub const MAX_REPS: u32 = 10;
}

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
