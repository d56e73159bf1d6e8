//! `ONNX` Runtime landmark provider.
//!
//! Runs a 21-point hand landmark model and a 468-point face mesh model over
//! the whole frame. Each model's first output holds landmark coordinates in
//! input pixels (2 or 3 values per point); an optional second output holds a
//! presence score, which gates whether the hand or face is reported at all.

use crate::{
    config::ModelConfig,
    constants::{NUM_FACE_MESH_LANDMARKS, NUM_HAND_LANDMARKS},
    landmarks::{Landmark, LandmarkProvider, LandmarkSet},
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Size, Vec3f, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Input size of the hand landmark model when the graph does not say
const DEFAULT_HAND_INPUT_SIZE: i32 = 224;

/// Input size of the face mesh model when the graph does not say
const DEFAULT_FACE_INPUT_SIZE: i32 = 192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TensorLayout {
    Nhwc,
    Nchw,
}

/// One landmark regression model
struct LandmarkModel {
    session: Session,
    input_size: i32,
    layout: TensorLayout,
    points: usize,
}

impl LandmarkModel {
    fn load(environment: &Arc<Environment>, path: &Path, default_size: i32, points: usize) -> Result<Self> {
        log::info!("Loading landmark model: {}", path.display());
        let session = ort::SessionBuilder::new(environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(path)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelError(format!("{} has no inputs", path.display())))?;

        // [1, H, W, 3] or [1, 3, H, W]
        let dims: Vec<Option<i64>> = input.dimensions.iter().map(|d| d.map(i64::from)).collect();
        let (layout, input_size) = match dims.as_slice() {
            [_, Some(3), Some(h), _] => (TensorLayout::Nchw, *h as i32),
            [_, Some(h), _, Some(3)] => (TensorLayout::Nhwc, *h as i32),
            _ => {
                log::warn!("Unrecognized input shape {dims:?}, assuming NHWC {default_size}x{default_size}");
                (TensorLayout::Nhwc, default_size)
            }
        };

        if session.outputs.is_empty() {
            return Err(Error::ModelError(format!("{} has no outputs", path.display())));
        }

        Ok(Self {
            session,
            input_size,
            layout,
            points,
        })
    }

    /// Resize, convert BGR to RGB and scale to `[0, 1]`
    #[allow(clippy::cast_sign_loss)]
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&resized, &mut rgb, imgproc::COLOR_BGR2RGB)?;

        let mut float_image = Mat::default();
        rgb.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let size = self.input_size as usize;
        let mut data = vec![0.0f32; size * size * 3];
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<Vec3f>(row as i32, col as i32)?;
                for ch in 0..3 {
                    data[(row * size + col) * 3 + ch] = pixel[ch];
                }
            }
        }

        let array = Array4::from_shape_vec((1, size, size, 3), data)
            .map_err(|e| Error::ModelError(format!("Failed to create input array: {e}")))?;

        Ok(match self.layout {
            TensorLayout::Nhwc => array,
            TensorLayout::Nchw => array.permuted_axes([0, 3, 1, 2]).as_standard_layout().to_owned(),
        })
    }

    /// Landmarks plus presence score, if the model reports one
    fn infer(&self, frame: &Mat) -> Result<(LandmarkSet, Option<f32>)> {
        let input = CowArray::from(self.preprocess(frame)?.into_dyn());
        let tensor = Value::from_array(self.session.allocator(), &input)?;
        let outputs = self.session.run(vec![tensor])?;

        let mut outputs = outputs.into_iter();
        let coords = outputs
            .next()
            .ok_or_else(|| Error::ModelError("No output from model".to_string()))?;
        let coords: Vec<f32> = coords.try_extract::<f32>()?.view().iter().copied().collect();

        let presence = match outputs.next() {
            Some(score) => {
                let tensor = score.try_extract::<f32>()?;
                let first = tensor.view().iter().next().copied();
                first
            }
            None => None,
        };

        let landmarks = decode_landmarks(&coords, self.points, self.input_size)?;
        Ok((landmarks, presence.map(presence_probability)))
    }
}

/// Turn a flat coordinate tensor into normalized landmarks
fn decode_landmarks(values: &[f32], points: usize, input_size: i32) -> Result<LandmarkSet> {
    if points == 0 || values.len() < points * 2 {
        return Err(Error::ModelError(format!(
            "expected at least {} landmark values, got {}",
            points * 2,
            values.len()
        )));
    }
    let stride = values.len() / points;
    let scale = f64::from(input_size);

    Ok((0..points)
        .map(|i| {
            let x = f64::from(values[i * stride]) / scale;
            let y = f64::from(values[i * stride + 1]) / scale;
            Landmark::new(x, y)
        })
        .collect::<Vec<_>>()
        .into())
}

/// Raw logits are squashed, probabilities pass through
fn presence_probability(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}

/// Landmark provider backed by two `ONNX` models
pub struct OnnxLandmarkProvider {
    hand: LandmarkModel,
    face: LandmarkModel,
    min_presence: f32,
}

impl OnnxLandmarkProvider {
    /// Load both models named in the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a model file cannot be loaded or has an unexpected structure.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let environment = Arc::new(
            Environment::builder()
                .with_name("exam_proctor")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        Ok(Self {
            hand: LandmarkModel::load(
                &environment,
                &config.hand_landmarks,
                DEFAULT_HAND_INPUT_SIZE,
                NUM_HAND_LANDMARKS,
            )?,
            face: LandmarkModel::load(
                &environment,
                &config.face_mesh,
                DEFAULT_FACE_INPUT_SIZE,
                NUM_FACE_MESH_LANDMARKS,
            )?,
            min_presence: config.min_presence,
        })
    }

    fn present(&self, (landmarks, presence): (LandmarkSet, Option<f32>)) -> Vec<LandmarkSet> {
        match presence {
            Some(score) if score < self.min_presence => {
                log::debug!("Presence {score:.2} below {:.2}", self.min_presence);
                Vec::new()
            }
            _ => vec![landmarks],
        }
    }
}

impl LandmarkProvider<Mat> for OnnxLandmarkProvider {
    fn detect_hands(&mut self, frame: &Mat) -> Result<Vec<LandmarkSet>> {
        let result = self.hand.infer(frame)?;
        Ok(self.present(result))
    }

    fn detect_faces(&mut self, frame: &Mat) -> Result<Vec<LandmarkSet>> {
        let result = self.face.infer(frame)?;
        Ok(self.present(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_xyz_triplets() {
        let mut values = Vec::new();
        for i in 0..NUM_HAND_LANDMARKS {
            values.extend_from_slice(&[i as f32 * 10.0, 112.0, -3.0]);
        }
        let set = decode_landmarks(&values, NUM_HAND_LANDMARKS, 224).unwrap();
        assert_eq!(set.len(), NUM_HAND_LANDMARKS);
        assert!((set.points()[1].x - 10.0 / 224.0).abs() < 1e-9);
        assert!((set.points()[20].y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_decode_rejects_short_output() {
        assert!(decode_landmarks(&[1.0; 10], NUM_HAND_LANDMARKS, 224).is_err());
    }

    #[test]
    fn test_presence_probability() {
        assert_eq!(presence_probability(0.9), 0.9);
        assert!((presence_probability(0.0) - 0.0).abs() < f32::EPSILON);
        assert!(presence_probability(4.0) > 0.98);
        assert!(presence_probability(-4.0) < 0.02);
    }
}
