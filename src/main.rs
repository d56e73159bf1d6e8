//! Exam proctoring application: watches a camera or video file and writes a session report.

use anyhow::{bail, Context, Result};
use clap::Parser;
use exam_proctor::{
    clock::SystemClock,
    config::{Config, EXAMPLE_CONFIG},
    detectors::EdgeContourExtractor,
    landmarks::{LandmarkProvider, RecordedLandmarks},
    monitor::{Monitor, RunOptions},
    processor::FrameProcessor,
    video::{CaptureSource, SourceSpec},
};
use log::{info, warn};
use opencv::{
    core::Mat,
    highgui::{self, WINDOW_NORMAL},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WINDOW_NAME: &str = "Exam Proctor";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use (defaults to the configured camera)
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to process instead of a camera
    #[arg(short, long)]
    video: Option<PathBuf>,

    /// Recorded landmarks (JSON) to use instead of the ONNX models
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Stop the session after this many seconds
    #[arg(short = 't', long)]
    duration: Option<u64>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Directory for the session report (defaults to the configured directory)
    #[arg(short, long)]
    report_dir: Option<PathBuf>,

    /// GUI display mode (cam, none)
    #[arg(short, long, default_value = "cam")]
    gui: String,

    /// Seconds between alert feed log lines (0 to disable)
    #[arg(long, default_value = "5")]
    alert_interval: u64,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Failed to load config file: {e}. Using defaults.");
            Config::default()
        }
    }
}

fn landmark_provider(args: &Args, config: &Config) -> Result<Box<dyn LandmarkProvider<Mat>>> {
    if let Some(path) = &args.landmarks {
        info!("Replaying landmarks from {}", path.display());
        let recorded = RecordedLandmarks::from_file(path)
            .with_context(|| format!("loading recorded landmarks from {}", path.display()))?;
        return Ok(Box::new(recorded));
    }

    #[cfg(feature = "onnx")]
    {
        let provider = exam_proctor::onnx::OnnxLandmarkProvider::new(&config.models)
            .context("loading landmark models")?;
        Ok(Box::new(provider))
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = config;
        bail!("no landmark source: pass --landmarks or build with the `onnx` feature")
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Exam Proctor");

    let config = load_config(args.config.as_ref());
    config.validate().context("invalid configuration")?;

    let show_gui = match args.gui.as_str() {
        "cam" => true,
        "none" => false,
        other => bail!("unknown GUI mode: {other}"),
    };

    let spec = match &args.video {
        Some(path) => SourceSpec::File(path.clone()),
        None => SourceSpec::Camera(args.cam.unwrap_or(config.capture.camera_index)),
    };
    let mut source = CaptureSource::open(&spec, &config.capture)?;

    let processor = FrameProcessor::new(
        &config,
        landmark_provider(&args, &config)?,
        Box::new(EdgeContourExtractor::new(&config.phone)),
    );
    let monitor = Arc::new(Monitor::new(processor, Arc::new(SystemClock)));

    if show_gui {
        highgui::named_window(WINDOW_NAME, WINDOW_NORMAL)?;
    }

    monitor.start();

    if let Some(secs) = args.duration {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            if monitor.stop() {
                info!("Session duration of {secs}s reached");
            }
        });
    }

    let alert_logger = (args.alert_interval > 0).then(|| {
        let monitor = Arc::clone(&monitor);
        let interval = Duration::from_secs(args.alert_interval);
        thread::spawn(move || {
            while monitor.is_active() {
                thread::sleep(interval);
                match monitor.alerts().to_json() {
                    Ok(json) => info!("Alerts: {json}"),
                    Err(e) => warn!("Failed to serialize alerts: {e}"),
                }
            }
        })
    });

    let options = RunOptions {
        frame_interval: config.capture.frame_interval(),
        max_frames: args.max_frames,
    };
    let summary = monitor.run(&mut source, &options, |frame| {
        if show_gui {
            highgui::imshow(WINDOW_NAME, frame)?;
            let key = highgui::wait_key(1)?;
            if key == 27 || key == i32::from(b'q') {
                info!("Exit requested by user");
                monitor.stop();
            }
        }
        Ok(())
    });
    monitor.stop();

    if let Some(handle) = alert_logger {
        if handle.join().is_err() {
            warn!("Alert logger thread panicked");
        }
    }

    let summary = summary?;
    info!(
        "Processed {} frames, {} detections, {} rewinds",
        summary.frames, summary.detections, summary.rewinds
    );

    let snapshot = monitor.snapshot();
    for (category, count) in snapshot.session.counts.iter() {
        info!("{}: {count}", category.label());
    }

    let report = monitor.report()?;
    let dir = args.report_dir.unwrap_or(config.report.output_dir);
    let path = report.write_to_dir(&dir, config.report.rows_per_page)?;
    println!("Report written to {}", path.display());

    info!("Application shutting down");
    Ok(())
}
