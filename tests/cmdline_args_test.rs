//! Tests for command-line argument parsing
//!
//! Note: These tests verify the argument parser configuration by creating
//! a test parser with the same structure as the main application.

use clap::{Arg, ArgAction, Command as ClapCommand};
use form_tracker::{app::GuiMode, exercises::ExerciseKind};

/// Create a command with the same argument structure as the main binary
fn create_test_command() -> ClapCommand {
    ClapCommand::new("form-tracker")
        .version("0.1.0")
        .about("Real-time exercise form tracking")
        .arg(
            Arg::new("exercise")
                .short('e')
                .long("exercise")
                .value_name("NAME")
                .default_value("squat")
                .help("Exercise to track"),
        )
        .arg(
            Arg::new("cam")
                .long("cam")
                .value_name("INDEX")
                .default_value("0")
                .value_parser(clap::value_parser!(i32))
                .help("Camera index"),
        )
        .arg(
            Arg::new("video")
                .short('v')
                .long("video")
                .value_name("PATH")
                .help("Video file path"),
        )
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("PATH")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("output-video")
                .short('o')
                .long("output-video")
                .value_name("PATH")
                .help("Annotated video output"),
        )
        .arg(
            Arg::new("gui")
                .short('g')
                .long("gui")
                .value_name("MODE")
                .default_value("all")
                .help("GUI display mode"),
        )
        .arg(
            Arg::new("no-mirror")
                .long("no-mirror")
                .action(ArgAction::SetTrue)
                .help("Do not mirror the camera image"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debug output"),
        )
        .arg(
            Arg::new("results-dir")
                .long("results-dir")
                .value_name("DIR")
                .help("Directory for charts and rep details"),
        )
        .arg(
            Arg::new("max-reps")
                .long("max-reps")
                .value_name("N")
                .value_parser(clap::value_parser!(u32))
                .help("Stop after this many reps"),
        )
}

#[test]
fn test_help_argument() {
    let cmd = create_test_command();
    let result = cmd.try_get_matches_from(vec!["form-tracker", "--help"]);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
}

#[test]
fn test_no_arguments() {
    let matches = create_test_command().try_get_matches_from(vec!["form-tracker"]).unwrap();

    assert_eq!(matches.get_one::<String>("exercise").map(String::as_str), Some("squat"));
    assert_eq!(matches.get_one::<i32>("cam"), Some(&0));
    assert_eq!(matches.get_one::<String>("gui").map(String::as_str), Some("all"));
    assert!(!matches.get_flag("no-mirror"));
    assert!(!matches.get_flag("debug"));
    assert!(matches.get_one::<u32>("max-reps").is_none());
}

#[test]
fn test_exercise_values_parse() {
    for (arg, expected) in [
        ("pushup", ExerciseKind::PushUp),
        ("squat", ExerciseKind::Squat),
        ("tricep", ExerciseKind::TricepPushdown),
        ("bicep-curl", ExerciseKind::BicepCurl),
    ] {
        let matches = create_test_command()
            .try_get_matches_from(vec!["form-tracker", "--exercise", arg])
            .unwrap();
        let value = matches.get_one::<String>("exercise").unwrap();
        assert_eq!(value.parse::<ExerciseKind>().unwrap(), expected);
    }

    assert!("lunges".parse::<ExerciseKind>().is_err());
}

#[test]
fn test_video_and_output_arguments() {
    let matches = create_test_command()
        .try_get_matches_from(vec![
            "form-tracker",
            "-e",
            "pushup",
            "--video",
            "workout.mp4",
            "-o",
            "annotated.mp4",
            "--gui",
            "none",
            "--no-mirror",
        ])
        .unwrap();

    assert_eq!(matches.get_one::<String>("video").map(String::as_str), Some("workout.mp4"));
    assert_eq!(
        matches.get_one::<String>("output-video").map(String::as_str),
        Some("annotated.mp4")
    );
    assert!(matches.get_flag("no-mirror"));
    let gui = matches.get_one::<String>("gui").unwrap();
    assert_eq!(gui.parse::<GuiMode>().unwrap(), GuiMode::None);
}

#[test]
fn test_max_reps_must_be_number() {
    let result = create_test_command().try_get_matches_from(vec!["form-tracker", "--max-reps", "ten"]);
    assert!(result.is_err());

    let matches = create_test_command()
        .try_get_matches_from(vec!["form-tracker", "--max-reps", "10", "--results-dir", "out"])
        .unwrap();
    assert_eq!(matches.get_one::<u32>("max-reps"), Some(&10));
    assert_eq!(matches.get_one::<String>("results-dir").map(String::as_str), Some("out"));
}

#[test]
fn test_unknown_argument_rejected() {
    let result = create_test_command().try_get_matches_from(vec!["form-tracker", "--filter", "median"]);
    assert!(result.is_err());
}
