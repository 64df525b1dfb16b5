//! Exercise form tracker: counts reps and coaches form from a webcam or video.

use anyhow::{Context, Result};
use clap::Parser;
use form_tracker::{
    app::{AppConfig, GuiMode, TrainerApp, VideoSource},
    config::Config,
    exercises::ExerciseKind,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exercise to track (pushup, squat, tricep, bicep)
    #[arg(short, long, default_value = "squat")]
    exercise: String,

    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Video file to process instead of the camera
    #[arg(short, long)]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Write the annotated video here (mp4v)
    #[arg(short, long)]
    output_video: Option<PathBuf>,

    /// GUI display mode (all, none)
    #[arg(short, long, default_value = "all")]
    gui: String,

    /// Do not mirror the camera image
    #[arg(long)]
    no_mirror: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Directory for charts and rep details
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Stop after this many reps
    #[arg(long)]
    max_reps: Option<u32>,
}

impl Args {
    /// Apply command line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.output_video {
            config.output.output_video = Some(path.clone());
        }
        if self.no_mirror {
            config.display.mirror = false;
        }
        if let Some(dir) = &self.results_dir {
            config.output.results_dir = dir.clone();
        }
        if let Some(reps) = self.max_reps {
            config.session.max_reps = Some(reps);
        }
        config.display.gui_mode = self.gui.trim().to_lowercase();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let exercise: ExerciseKind = args.exercise.parse().context("Invalid --exercise")?;
    let gui_mode: GuiMode = args.gui.parse().context("Invalid --gui")?;
    info!("Form Tracker - {}", exercise.title());

    let mut settings = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    args.apply(&mut settings);
    settings.validate().context("Invalid configuration")?;

    let config = AppConfig {
        exercise,
        video_source: if let Some(video_path) = &args.video {
            VideoSource::File(video_path.clone())
        } else {
            VideoSource::Camera(args.cam)
        },
        gui_mode,
        debug: args.debug,
        settings,
    };

    let mut app = TrainerApp::new(config).context("Failed to start trainer")?;
    let summary = app.run()?;
    println!("{}", summary.headline());

    Ok(())
}
