//! Pixel-level tests for the OpenCV contour extractor, overlays and capture
#![cfg(feature = "opencv")]


use exam_proctor::{
    config::{CaptureConfig, Config},
    detectors::{ContourExtractor, EdgeContourExtractor, PhoneShapeDetector},
    event::{BoundingBox, DetectionCategory, DetectionEvent},
    frame::Canvas,
    landmarks::{FrameLandmarks, RecordedLandmarks},
    processor::FrameProcessor,
    video::{CaptureSource, SourceSpec, VideoSource},
    Result,
};
use opencv::{
    core::{Mat, Rect, Scalar, Size, Vec3b, CV_8UC3},
    imgproc::{self, FILLED, LINE_8},
    prelude::*,
    videoio::VideoWriter,
};
use test_helpers::{t0, FRAME_HEIGHT, FRAME_WIDTH};

/// Black 640x480 frame with a filled white 40x70 rectangle at (300, 200)
fn phone_frame() -> Result<Mat> {
    let mut frame = Mat::new_rows_cols_with_default(FRAME_HEIGHT, FRAME_WIDTH, CV_8UC3, Scalar::all(0.0))?;
    imgproc::rectangle(&mut frame, Rect::new(300, 200, 40, 70), Scalar::all(255.0), FILLED, LINE_8, 0)?;
    Ok(frame)
}

fn assert_near(actual: BoundingBox, expected: BoundingBox) {
    let close = |a: i32, b: i32| (a - b).abs() <= 2;
    assert!(
        close(actual.x_min, expected.x_min)
            && close(actual.y_min, expected.y_min)
            && close(actual.x_max, expected.x_max)
            && close(actual.y_max, expected.y_max),
        "{actual:?} is not within 2px of {expected:?}"
    );
}

#[test]
fn test_phone_shaped_rectangle_detected() -> Result<()> {
    let config = Config::default();
    let mut extractor = EdgeContourExtractor::new(&config.phone);
    let contours = extractor.external_contours(&phone_frame()?)?;
    assert!(!contours.is_empty());

    let event = PhoneShapeDetector::new(config.phone)
        .detect(&contours, t0())
        .expect("rectangle should pass the area and aspect filter");
    assert_eq!(event.category(), DetectionCategory::MobilePhone);
    assert_eq!(event.confidence(), 0.75);
    assert_near(event.bbox(), BoundingBox::from_rect(300, 200, 40, 70));
    Ok(())
}

#[test]
fn test_blank_and_empty_frames_have_no_contours() -> Result<()> {
    let mut extractor = EdgeContourExtractor::new(&Config::default().phone);
    let blank = Mat::new_rows_cols_with_default(FRAME_HEIGHT, FRAME_WIDTH, CV_8UC3, Scalar::all(128.0))?;
    assert!(extractor.external_contours(&blank)?.is_empty());
    assert!(extractor.external_contours(&Mat::default())?.is_empty());
    Ok(())
}

#[test]
fn test_processor_annotates_mat() -> Result<()> {
    let config = Config::default();
    let landmarks = RecordedLandmarks::new(vec![FrameLandmarks::default()])?;
    let mut processor: FrameProcessor<Mat> = FrameProcessor::new(
        &config,
        Box::new(landmarks),
        Box::new(EdgeContourExtractor::new(&config.phone)),
    );

    let outcome = processor.process(phone_frame()?, t0())?;
    assert_eq!(outcome.detections.len(), 1);

    let bbox = outcome.detections[0].bbox();
    let pixel = outcome.frame.at_2d::<Vec3b>(bbox.y_min, bbox.x_min + 10)?;
    assert_eq!((pixel[0], pixel[1], pixel[2]), (255, 0, 0));
    Ok(())
}

#[test]
fn test_mat_canvas_draws_edge_boxes() -> Result<()> {
    let mut frame = Mat::new_rows_cols_with_default(FRAME_HEIGHT, FRAME_WIDTH, CV_8UC3, Scalar::all(0.0))?;
    for bbox in [
        BoundingBox::new(0, 0, 640, 480),
        BoundingBox::new(640, 220, 640, 308),
        BoundingBox::new(0, 0, 0, 0),
    ] {
        frame.draw_detection(&DetectionEvent::new(DetectionCategory::Talking, 0.5, bbox, t0()))?;
    }
    frame.draw_caption("Frame: 1")?;
    Ok(())
}

#[test]
#[ignore = "Requires an OpenCV build with an MJPG writer"]
fn test_file_capture_rewinds() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("clip.avi");
    let path_str = path.to_str().expect("temp path is UTF-8");

    let mut writer = VideoWriter::new(
        path_str,
        VideoWriter::fourcc('M', 'J', 'P', 'G')?,
        10.0,
        Size::new(FRAME_WIDTH, FRAME_HEIGHT),
        true,
    )?;
    for _ in 0..3 {
        writer.write(&phone_frame()?)?;
    }
    writer.release()?;

    let mut source = CaptureSource::open(&SourceSpec::File(path.clone()), &CaptureConfig::default())?;
    let mut frames = 0;
    while source.next_frame()?.is_some() {
        frames += 1;
    }
    assert_eq!(frames, 3);

    source.rewind()?;
    assert!(source.next_frame()?.is_some());
    Ok(())
}
