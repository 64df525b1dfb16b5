//! Build script: reports the system `OpenCV` found through pkg-config and
//! whether the default pose model is in place. ONNX Runtime binaries are
//! fetched by the `ort` crate itself.

use std::path::Path;
use std::process::Command;

/// Default MoveNet model looked up at runtime
const DEFAULT_POSE_MODEL: &str = "assets/movenet_singlepose_lightning.onnx";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={DEFAULT_POSE_MODEL}");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    if pkg_config_version(&["--version"]).is_none() {
        println!("cargo:warning=pkg-config not found; it is needed to locate OpenCV.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
    }

    let opencv = ["opencv4", "opencv"]
        .iter()
        .find_map(|name| pkg_config_version(&["--modversion", name]));
    match opencv {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
            println!("cargo:warning=On macOS: brew install opencv");
            println!("cargo:warning=The tracker needs the highgui, imgproc, videoio and imgcodecs modules.");
        }
    }

    if !Path::new(DEFAULT_POSE_MODEL).exists() {
        println!("cargo:warning=Pose model {DEFAULT_POSE_MODEL} is missing; download a MoveNet single-pose ONNX export or set models.pose_model in the config.");
    }
}

/// Trimmed stdout of a successful pkg-config call
fn pkg_config_version(args: &[&str]) -> Option<String> {
    let output = Command::new("pkg-config").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
