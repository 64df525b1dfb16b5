//! Frame annotation with `OpenCV` drawing primitives.
//!
//! Everything here draws straight onto the BGR processing frame from a
//! [`FrameAnalysis`]; no trainer state is touched.

use crate::{
    constants::squat::{GOOD_LOWER_ANGLE, GOOD_UPPER_ANGLE, MIN_REQUIRED_UPPER_ANGLE, TOO_DEEP_ANGLE},
    exercises::{squat::depth_percent, DepthGauge, FrameAnalysis},
    feedback::{FeedbackMessage, Severity},
    landmarks::{Point2, Pose, SKELETON_EDGES},
    session::Phase,
    utils::safe_cast::{f64_to_i32, f64_to_i32_clamp, usize_to_i32},
    Result,
};
use opencv::{
    core::{self, Mat, Point, Rect, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};

const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);
const GREEN: (f64, f64, f64) = (0.0, 200.0, 0.0);
const YELLOW: (f64, f64, f64) = (0.0, 220.0, 255.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const BLUE: (f64, f64, f64) = (255.0, 128.0, 0.0);
const BLACK: (f64, f64, f64) = (0.0, 0.0, 0.0);

/// Minimum keypoint score for a joint to be drawn
const DRAW_MIN_VISIBILITY: f64 = 0.2;

fn bgr(color: (f64, f64, f64)) -> Scalar {
    Scalar::new(color.0, color.1, color.2, 0.0)
}

fn severity_color(severity: Severity) -> Scalar {
    match severity {
        Severity::Info => bgr(GREEN),
        Severity::Warning => bgr(YELLOW),
        Severity::Error => bgr(RED),
    }
}

/// Clamp a pose point onto the frame
fn to_pixel(frame: &Mat, p: Point2) -> Point {
    Point::new(
        f64_to_i32_clamp(p.x, 0, frame.cols() - 1),
        f64_to_i32_clamp(p.y, 0, frame.rows() - 1),
    )
}

fn text_width(text: &str, scale: f64, thickness: i32) -> Result<i32> {
    let mut baseline = 0;
    let size = imgproc::get_text_size(text, FONT_HERSHEY_SIMPLEX, scale, thickness, &mut baseline)?;
    Ok(size.width)
}

fn put_text(frame: &mut Mat, text: &str, org: Point, scale: f64, color: Scalar, thickness: i32) -> Result<()> {
    imgproc::put_text(
        frame,
        text,
        org,
        FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        thickness,
        LINE_AA,
        false,
    )?;
    Ok(())
}

fn put_centered(frame: &mut Mat, text: &str, y: i32, scale: f64, color: Scalar, thickness: i32) -> Result<()> {
    let x = (frame.cols() - text_width(text, scale, thickness)?) / 2;
    put_text(frame, text, Point::new(x.max(0), y), scale, color, thickness)
}

/// Fill a rectangle blended over the frame with the given opacity
fn blend_rect(frame: &mut Mat, rect: Rect, color: Scalar, alpha: f64) -> Result<()> {
    let mut overlay = frame.try_clone()?;
    imgproc::rectangle(&mut overlay, rect, color, -1, LINE_8, 0)?;
    let base = frame.try_clone()?;
    core::add_weighted(&overlay, alpha, &base, 1.0 - alpha, 0.0, frame, -1)?;
    Ok(())
}

/// Draw every annotation for one analysed frame
///
/// # Errors
///
/// Returns an error if any `OpenCV` drawing call fails
pub fn draw_analysis(frame: &mut Mat, analysis: &FrameAnalysis, title: &str, draw_skeleton: bool) -> Result<()> {
    if analysis.session_complete {
        return draw_rest_screen(frame, analysis.reps);
    }

    if let Some(pose) = &analysis.pose {
        if draw_skeleton {
            draw_pose(frame, pose)?;
        }
        for highlight in &analysis.highlights {
            let from = to_pixel(frame, pose.point(highlight.from));
            let to = to_pixel(frame, pose.point(highlight.to));
            imgproc::line(
                frame,
                from,
                to,
                severity_color(highlight.severity),
                4,
                LINE_AA,
                0,
            )?;
        }
    }

    draw_rep_counter(frame, analysis, title)?;
    draw_metrics(frame, &analysis.metrics)?;

    match analysis.phase {
        Phase::Waiting => {
            if let Some(instruction) = &analysis.instruction {
                put_centered(frame, instruction, 90, 0.8, bgr(YELLOW), 2)?;
            }
            draw_position_progress(frame, analysis.position_progress)?;
        }
        Phase::Countdown => {
            if let Some(seconds) = analysis.countdown {
                draw_countdown(frame, seconds)?;
            }
        }
        Phase::Counting | Phase::Complete => {}
    }

    if let Some(gauge) = &analysis.depth_gauge {
        draw_depth_gauge(frame, gauge)?;
    }

    if analysis.detection_lost_warning {
        draw_detection_lost(frame)?;
    }

    draw_feedback_bar(frame, &analysis.feedback)
}

/// Draw skeleton bones and joints above the visibility floor
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn draw_pose(frame: &mut Mat, pose: &Pose) -> Result<()> {
    for (a, b) in SKELETON_EDGES {
        let (la, lb) = (pose.get(a), pose.get(b));
        if la.visibility < DRAW_MIN_VISIBILITY || lb.visibility < DRAW_MIN_VISIBILITY {
            continue;
        }
        let (from, to) = (to_pixel(frame, la.point()), to_pixel(frame, lb.point()));
        imgproc::line(frame, from, to, bgr(WHITE), 2, LINE_AA, 0)?;
    }
    let joints: Vec<Point> = pose
        .landmarks
        .iter()
        .filter(|l| l.visibility >= DRAW_MIN_VISIBILITY)
        .map(|l| to_pixel(frame, l.point()))
        .collect();
    for joint in joints {
        imgproc::circle(frame, joint, 4, bgr(BLUE), -1, LINE_AA, 0)?;
    }
    Ok(())
}

fn draw_rep_counter(frame: &mut Mat, analysis: &FrameAnalysis, title: &str) -> Result<()> {
    blend_rect(frame, Rect::new(0, 0, 260, 110), bgr(BLACK), 0.6)?;
    put_text(frame, title, Point::new(10, 24), 0.6, bgr(WHITE), 1)?;
    put_text(
        frame,
        &format!("Reps: {}/{}", analysis.reps, analysis.max_reps),
        Point::new(10, 58),
        1.0,
        bgr(WHITE),
        2,
    )?;
    put_text(
        frame,
        &format!("Good: {}", analysis.good_reps),
        Point::new(10, 92),
        0.7,
        bgr(GREEN),
        2,
    )?;
    put_text(
        frame,
        &format!("Bad: {}", analysis.bad_reps),
        Point::new(130, 92),
        0.7,
        bgr(RED),
        2,
    )
}

fn draw_metrics(frame: &mut Mat, metrics: &[(String, f64)]) -> Result<()> {
    let x = (frame.cols() - 260).max(0);
    for (i, (name, value)) in metrics.iter().enumerate() {
        let y = 30 + usize_to_i32(i)? * 26;
        put_text(frame, &format!("{name}: {value:.1}"), Point::new(x, y), 0.6, bgr(WHITE), 2)?;
    }
    Ok(())
}

/// Progress towards locking the start position
fn draw_position_progress(frame: &mut Mat, progress: f64) -> Result<()> {
    let width = frame.cols() / 2;
    let x = (frame.cols() - width) / 2;
    let y = 110;
    imgproc::rectangle(frame, Rect::new(x, y, width, 16), bgr(WHITE), 2, LINE_8, 0)?;
    let filled = f64_to_i32(f64::from(width) * progress.clamp(0.0, 1.0))?;
    if filled > 0 {
        imgproc::rectangle(frame, Rect::new(x, y, filled, 16), bgr(GREEN), -1, LINE_8, 0)?;
    }
    Ok(())
}

fn draw_countdown(frame: &mut Mat, seconds: u32) -> Result<()> {
    let middle = frame.rows() / 2;
    put_centered(frame, &seconds.to_string(), middle + 40, 4.0, bgr(YELLOW), 8)?;
    put_centered(frame, "Get Ready!", middle - 80, 1.2, bgr(WHITE), 3)
}

fn draw_detection_lost(frame: &mut Mat) -> Result<()> {
    let middle = frame.rows() / 2;
    let band = Rect::new(0, middle - 30, frame.cols(), 50);
    blend_rect(frame, band, bgr(BLACK), 0.6)?;
    put_centered(frame, "Detection lost! Please adjust position.", middle, 0.8, bgr(RED), 2)
}

/// Semi-transparent bar along the bottom with one centred line per message
fn draw_feedback_bar(frame: &mut Mat, feedback: &[FeedbackMessage]) -> Result<()> {
    if feedback.is_empty() {
        return Ok(());
    }
    let line_height = 32;
    let height = usize_to_i32(feedback.len())? * line_height + 16;
    let top = (frame.rows() - height).max(0);
    let bar = Rect::new(0, top, frame.cols(), height);
    blend_rect(frame, bar, bgr(BLACK), 0.6)?;

    for (i, message) in feedback.iter().enumerate() {
        let y = top + 30 + usize_to_i32(i)? * line_height;
        put_centered(frame, &message.text, y, 0.8, severity_color(message.severity), 2)?;
    }
    Ok(())
}

/// Vertical depth gauge on the right edge with the knee line
fn draw_depth_gauge(frame: &mut Mat, gauge: &DepthGauge) -> Result<()> {
    let height = frame.rows() / 2;
    let width = 30;
    let x = frame.cols() - width - 20;
    let top = (frame.rows() - height) / 2;

    let y_at = |percent: f64| -> Result<i32> {
        Ok(top + f64_to_i32(f64::from(height) * percent.clamp(0.0, 100.0) / 100.0)?)
    };

    // Zones, top of the bar is standing
    let min_required = y_at(depth_percent(MIN_REQUIRED_UPPER_ANGLE))?;
    let good_top = y_at(depth_percent(GOOD_UPPER_ANGLE))?;
    let good_bottom = y_at(depth_percent(GOOD_LOWER_ANGLE))?;
    let too_deep = y_at(depth_percent(TOO_DEEP_ANGLE))?;
    blend_rect(frame, Rect::new(x, min_required, width, good_top - min_required), bgr(YELLOW), 0.4)?;
    blend_rect(frame, Rect::new(x, good_top, width, good_bottom - good_top), bgr(GREEN), 0.4)?;
    blend_rect(frame, Rect::new(x, good_bottom, width, (too_deep - good_bottom).max(2)), bgr(RED), 0.4)?;
    imgproc::rectangle(frame, Rect::new(x, top, width, height), bgr(WHITE), 2, LINE_8, 0)?;

    let marker = y_at(gauge.percent)?;
    let color = match gauge.status {
        crate::exercises::DepthStatus::Good | crate::exercises::DepthStatus::AcceptablyDeep => bgr(GREEN),
        crate::exercises::DepthStatus::TooDeep => bgr(RED),
        _ => bgr(YELLOW),
    };
    imgproc::line(
        frame,
        Point::new(x - 6, marker),
        Point::new(x + width + 6, marker),
        color,
        3,
        LINE_8,
        0,
    )?;
    let label = gauge.status.label();
    let label_x = (x - text_width(label, 0.6, 2)? - 10).max(0);
    put_text(frame, label, Point::new(label_x, marker + 6), 0.6, color, 2)?;

    if let Some(knees) = &gauge.knee_line {
        let line_color = if knees.caving { bgr(RED) } else { bgr(GREEN) };
        let (left, right) = (to_pixel(frame, knees.left), to_pixel(frame, knees.right));
        imgproc::line(frame, left, right, line_color, 3, LINE_AA, 0)?;
        if let Some(ideal) = knees.ideal_left {
            let ideal = to_pixel(frame, ideal);
            imgproc::circle(frame, ideal, 8, bgr(GREEN), 2, LINE_AA, 0)?;
            imgproc::arrowed_line(
                frame,
                left,
                ideal,
                bgr(GREEN),
                2,
                LINE_AA,
                0,
                0.3,
            )?;
        }
    }
    Ok(())
}

/// Darkened frame shown once the rep target is reached
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn draw_rest_screen(frame: &mut Mat, reps: u32) -> Result<()> {
    let full = Rect::new(0, 0, frame.cols(), frame.rows());
    blend_rect(frame, full, bgr(BLACK), 0.7)?;
    let middle = frame.rows() / 2;
    put_centered(frame, "NOW TAKE REST", middle - 20, 1.6, bgr(GREEN), 4)?;
    put_centered(frame, &format!("Session complete: {reps} reps"), middle + 40, 0.9, bgr(WHITE), 2)
}
