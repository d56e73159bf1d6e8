//! Build script checking for the native libraries behind the optional vision features.
//!
//! Nothing is checked for a build without `opencv`; the core pipeline has no
//! native dependencies.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_OPENCV").is_some() {
        check_pkg_config();
        check_opencv();
    }

    if env::var_os("CARGO_FEATURE_ONNX").is_some() {
        println!("cargo:rerun-if-env-changed=ORT_STRATEGY");
        println!("cargo:rerun-if-env-changed=ORT_LIB_LOCATION");
    }
}

fn pkg_config_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    if pkg_config_version("opencv4").or_else(|| pkg_config_version("opencv")).is_none() {
        println!("cargo:warning=OpenCV not found via pkg-config. Make sure OpenCV is installed,");
        println!("cargo:warning=or build without it: cargo build --no-default-features");
        println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
        println!("cargo:warning=On macOS: brew install opencv");
    }
}

fn check_pkg_config() {
    let found = Command::new("pkg-config")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());

    if !found {
        println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
    }
}
