//! End-of-session report: PNG analysis charts and a JSON rep log.
//!
//! Charts are rendered with `OpenCV`: one panel per recorded series, with its
//! threshold lines and a marker at every counted rep. Files land in
//! `<results_dir>/<exercise>/` as `<exercise>_analysis_<timestamp>.png` and
//! `<exercise>_details_<timestamp>.json`.

use crate::{
    constants::MIN_FRAMES_FOR_REPORT,
    session::{Series, SessionRecorder, SessionSummary},
    utils::safe_cast::{f64_to_i32, usize_to_i32},
    Error, Result,
};
use log::{info, warn};
use opencv::{
    core::{Mat, Point, Rect, Scalar, Vector, CV_8UC3},
    imgcodecs,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const CHART_WIDTH: i32 = 1200;
const TITLE_HEIGHT: i32 = 70;
const PANEL_HEIGHT: i32 = 260;
const MARGIN_LEFT: i32 = 80;
const MARGIN_RIGHT: i32 = 30;
const MARGIN_TOP: i32 = 40;
const MARGIN_BOTTOM: i32 = 40;

/// Threshold line colours, cycled per panel
const THRESHOLD_COLORS: [(f64, f64, f64); 3] = [(0.0, 160.0, 0.0), (0.0, 0.0, 220.0), (200.0, 120.0, 0.0)];

/// Files written for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Chart image, absent when the session was too short
    pub chart: Option<PathBuf>,
    pub details: PathBuf,
}

#[derive(Serialize)]
struct DetailsFile<'a> {
    headline: String,
    frames_analysed: usize,
    #[serde(flatten)]
    summary: &'a SessionSummary,
}

/// Writes session reports under a results directory
pub struct ReportWriter {
    results_dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: Into<PathBuf>>(results_dir: P) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Directory reports for an exercise are written to
    #[must_use]
    pub fn exercise_dir(&self, exercise: &str) -> PathBuf {
        self.results_dir.join(exercise)
    }

    /// Write the chart (when enough frames were analysed) and the rep details
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a file cannot
    /// be written
    pub fn write(&self, title: &str, summary: &SessionSummary, recorder: &SessionRecorder) -> Result<SessionReport> {
        let dir = self.exercise_dir(&summary.exercise);
        fs::create_dir_all(&dir)?;
        let stamp = summary.started_at.format("%Y%m%d_%H%M%S").to_string();

        let chart = if recorder.frame_count() < MIN_FRAMES_FOR_REPORT {
            warn!(
                "Only {} frames analysed, skipping charts (need {})",
                recorder.frame_count(),
                MIN_FRAMES_FOR_REPORT
            );
            None
        } else {
            let path = dir.join(format!("{}_analysis_{stamp}.png", summary.exercise));
            let image = render_chart(title, summary, recorder)?;
            save_png(&path, &image)?;
            info!("Analysis chart saved to {}", path.display());
            Some(path)
        };

        let details = dir.join(format!("{}_details_{stamp}.json", summary.exercise));
        let file = DetailsFile {
            headline: summary.headline(),
            frames_analysed: recorder.frame_count(),
            summary,
        };
        fs::write(&details, serde_json::to_string_pretty(&file)?)?;
        info!("Rep details saved to {}", details.display());

        Ok(SessionReport { chart, details })
    }
}

fn save_png(path: &Path, image: &Mat) -> Result<()> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::ReportError(format!("Non UTF-8 report path: {}", path.display())))?;
    if imgcodecs::imwrite(path_str, image, &Vector::new())? {
        Ok(())
    } else {
        Err(Error::ReportError(format!("Failed to encode chart {}", path.display())))
    }
}

/// Value range covering a series and its thresholds, padded by 10%
#[must_use]
pub fn value_range(series: &Series) -> (f64, f64) {
    let values = series
        .samples
        .iter()
        .map(|(_, v)| *v)
        .chain(series.thresholds.iter().map(|t| t.value));
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(1.0);
    (lo - pad, hi + pad)
}

/// Plot area of one panel and the mapping from data to pixels
struct Panel {
    area: Rect,
    frames: f64,
    range: (f64, f64),
}

impl Panel {
    fn x(&self, frame: usize) -> Result<i32> {
        #[allow(clippy::cast_precision_loss)]
        let t = frame as f64 / self.frames.max(1.0);
        Ok(self.area.x + f64_to_i32(t * f64::from(self.area.width))?)
    }

    fn y(&self, value: f64) -> Result<i32> {
        let (lo, hi) = self.range;
        let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        Ok(self.area.y + self.area.height - f64_to_i32(t * f64::from(self.area.height))?)
    }
}

/// Render all series panels into one image
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn render_chart(title: &str, summary: &SessionSummary, recorder: &SessionRecorder) -> Result<Mat> {
    let series = recorder.series();
    let height = TITLE_HEIGHT + PANEL_HEIGHT * usize_to_i32(series.len().max(1))?;
    let mut image = Mat::new_rows_cols_with_default(height, CHART_WIDTH, CV_8UC3, Scalar::all(255.0))?;

    let black = Scalar::all(0.0);
    put(&mut image, title, Point::new(MARGIN_LEFT, 30), 0.9, black, 2)?;
    put(&mut image, &summary.headline(), Point::new(MARGIN_LEFT, 58), 0.55, black, 1)?;

    #[allow(clippy::cast_precision_loss)]
    let frames = recorder.frame_count() as f64;
    let markers = recorder.rep_markers();
    for (i, s) in series.iter().enumerate() {
        let top = TITLE_HEIGHT + usize_to_i32(i)? * PANEL_HEIGHT;
        let panel = Panel {
            area: Rect::new(
                MARGIN_LEFT,
                top + MARGIN_TOP,
                CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
                PANEL_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
            ),
            frames,
            range: value_range(s),
        };
        draw_panel(&mut image, s, &panel, &markers, top)?;
    }
    Ok(image)
}

fn draw_panel(image: &mut Mat, series: &Series, panel: &Panel, markers: &[usize], top: i32) -> Result<()> {
    let axis = Scalar::all(60.0);
    let area = panel.area;
    let heading = if series.unit.is_empty() {
        series.name.clone()
    } else {
        format!("{} ({})", series.name, series.unit)
    };
    put(image, &heading, Point::new(area.x, top + 28), 0.6, Scalar::all(0.0), 2)?;
    imgproc::rectangle(image, area, axis, 1, LINE_8, 0)?;

    // Y tick labels at the bottom, middle and top of the range
    let (lo, hi) = panel.range;
    for value in [lo, (lo + hi) / 2.0, hi] {
        let y = panel.y(value)?;
        put(image, &format!("{value:.1}"), Point::new(8, y + 5), 0.45, axis, 1)?;
    }
    put(
        image,
        "Frame",
        Point::new(area.x + area.width / 2 - 20, area.y + area.height + 30),
        0.5,
        axis,
        1,
    )?;

    for &frame in markers {
        let x = panel.x(frame)?;
        imgproc::line(
            image,
            Point::new(x, area.y),
            Point::new(x, area.y + area.height),
            Scalar::new(200.0, 200.0, 200.0, 0.0),
            1,
            LINE_8,
            0,
        )?;
    }

    for (i, threshold) in series.thresholds.iter().enumerate() {
        let (b, g, r) = THRESHOLD_COLORS[i % THRESHOLD_COLORS.len()];
        let color = Scalar::new(b, g, r, 0.0);
        let y = panel.y(threshold.value)?;
        dashed_hline(image, area.x, area.x + area.width, y, color)?;
        let label = format!("{} ({:.1})", threshold.label, threshold.value);
        put(image, &label, Point::new(area.x + area.width - 260, y - 6), 0.45, color, 1)?;
    }

    let mut points = Vector::<Point>::new();
    for &(frame, value) in &series.samples {
        points.push(Point::new(panel.x(frame)?, panel.y(value)?));
    }
    if points.len() > 1 {
        let mut curves = Vector::<Vector<Point>>::new();
        curves.push(points);
        imgproc::polylines(image, &curves, false, Scalar::new(180.0, 80.0, 0.0, 0.0), 2, LINE_AA, 0)?;
    }
    Ok(())
}

fn dashed_hline(image: &mut Mat, from: i32, to: i32, y: i32, color: Scalar) -> Result<()> {
    let mut x = from;
    while x < to {
        let end = (x + 10).min(to);
        imgproc::line(image, Point::new(x, y), Point::new(end, y), color, 1, LINE_8, 0)?;
        x += 18;
    }
    Ok(())
}

fn put(image: &mut Mat, text: &str, org: Point, scale: f64, color: Scalar, thickness: i32) -> Result<()> {
    imgproc::put_text(image, text, org, FONT_HERSHEY_SIMPLEX, scale, color, thickness, LINE_AA, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::IssueTally;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn summary() -> SessionSummary {
        SessionSummary {
            exercise: "squat".to_string(),
            started_at: Local.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            duration_secs: 42.0,
            total_reps: 1,
            good_reps: 1,
            bad_reps: 0,
            issue_counts: IssueTally::default(),
            reps: Vec::new(),
        }
    }

    fn recorder(frames: usize) -> SessionRecorder {
        let mut recorder = SessionRecorder::new();
        recorder.declare("Knee Angle", "degrees", &[("Good Depth", 95.0), ("Too Deep", 35.0)]);
        for i in 0..frames {
            recorder.begin_frame();
            recorder.record("Knee Angle", 170.0 - (i as f64 * 7.0) % 100.0);
        }
        recorder
    }

    #[test]
    fn test_value_range_includes_thresholds() {
        let rec = recorder(5);
        let series = rec.get_series("Knee Angle").unwrap();
        let (lo, hi) = value_range(series);
        assert!(lo < 35.0);
        assert!(hi > 170.0);
    }

    #[test]
    fn test_value_range_empty_series() {
        let series = Series::default();
        assert_eq!(value_range(&series), (0.0, 1.0));
    }

    #[test]
    fn test_write_full_report() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let report = writer.write("Squat Trainer", &summary(), &recorder(40)).unwrap();

        let chart = report.chart.expect("chart written");
        assert!(chart.exists());
        assert!(chart.ends_with("squat/squat_analysis_20260314_093000.png"));
        assert!(report.details.ends_with("squat/squat_details_20260314_093000.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report.details).unwrap()).unwrap();
        assert_eq!(json["total_reps"], 1);
        assert_eq!(json["frames_analysed"], 40);
        assert!(json["headline"].as_str().unwrap().starts_with("Total Reps: 1"));
    }

    #[test]
    fn test_short_session_skips_chart() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let report = writer.write("Squat Trainer", &summary(), &recorder(MIN_FRAMES_FOR_REPORT - 1)).unwrap();
        assert!(report.chart.is_none());
        assert!(report.details.exists());
    }

    #[test]
    fn test_render_chart_has_panel_per_series() {
        let mut rec = recorder(20);
        rec.declare("Knee/Ankle Ratio", "", &[]);
        let image = render_chart("Squat Trainer", &summary(), &rec).unwrap();
        assert_eq!(image.rows(), TITLE_HEIGHT + 2 * PANEL_HEIGHT);
        assert_eq!(image.cols(), CHART_WIDTH);
    }
}
