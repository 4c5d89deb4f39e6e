//! Face detection and emotion models

use frame_intake::Frame;
use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::{Array4, ArrayView3, Ix3};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{DetectError, DetectorConfig};

/// Face detector input size (width, height)
const FACE_INPUT: (u32, u32) = (320, 240);

/// Emotion model input edge length
const EMOTION_INPUT: u32 = 64;

/// Output classes of the FER+ emotion model, in logit order
pub const FERPLUS_LABELS: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Face bounding box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl FaceBox {
    /// Box covering the whole frame
    pub fn full_frame(frame: &Frame) -> Self {
        Self {
            x: 0,
            y: 0,
            width: frame.width,
            height: frame.height,
            confidence: 1.0,
        }
    }
}

fn load_session(path: &str, what: &str) -> Result<Session, DetectError> {
    info!("Loading {} model from {}", what, path);
    Session::builder()
        .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|builder| builder.commit_from_file(path))
        .map_err(|e| {
            error!("Failed to load {} model: {}", what, e);
            DetectError::ModelLoad(format!("{}: {}", path, e))
        })
}

fn inference_error(e: impl std::fmt::Display) -> DetectError {
    DetectError::Inference(e.to_string())
}

/// Face detector using UltraFace or similar
pub struct FaceDetector {
    confidence_threshold: f32,
    session: Option<Session>,
}

impl FaceDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let session = match &config.face_model_path {
            Some(path) => Some(load_session(path, "face detection")?),
            None => {
                warn!("No face model path configured. Treating the whole frame as the face region.");
                None
            }
        };

        Ok(Self {
            confidence_threshold: config.face_confidence,
            session,
        })
    }

    /// Find the most confident face in the frame
    pub fn detect(&self, frame: &Frame) -> Result<Option<FaceBox>, DetectError> {
        let Some(session) = &self.session else {
            return Ok(Some(FaceBox::full_frame(frame)));
        };

        let input = face_input(frame)?;
        let outputs = session
            .run(ort::inputs![input].map_err(inference_error)?)
            .map_err(inference_error)?;

        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?
            .into_dimensionality::<Ix3>()
            .map_err(inference_error)?;
        let boxes = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?
            .into_dimensionality::<Ix3>()
            .map_err(inference_error)?;

        let face = best_face(scores, boxes, self.confidence_threshold, frame.width, frame.height);
        debug!("Face detection on frame {}: {:?}", frame.sequence, face);
        Ok(face)
    }
}

/// Resize to the detector input and normalize to roughly -1..1 (1x3x240x320)
fn face_input(frame: &Frame) -> Result<Array4<f32>, DetectError> {
    let view = frame
        .view()
        .ok_or_else(|| DetectError::ImageProcessing("Failed to create image buffer".into()))?;
    let (width, height) = FACE_INPUT;
    let resized = imageops::resize(&view, width, height, FilterType::Triangle);

    let mut input = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.0) / 128.0;
        }
    }
    Ok(input)
}

/// Pick the highest-scoring anchor above `threshold`.
///
/// `scores` is `[1, N, 2]` (background, face) and `boxes` is `[1, N, 4]` with
/// normalized corner coordinates.
fn best_face(
    scores: ArrayView3<f32>,
    boxes: ArrayView3<f32>,
    threshold: f32,
    frame_width: u32,
    frame_height: u32,
) -> Option<FaceBox> {
    let anchors = scores.shape()[1].min(boxes.shape()[1]);
    let (best, confidence) = (0..anchors)
        .map(|i| (i, scores[[0, i, 1]]))
        .filter(|&(_, score)| score >= threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let fw = frame_width as f32;
    let fh = frame_height as f32;
    let x1 = (boxes[[0, best, 0]].clamp(0.0, 1.0) * fw) as u32;
    let y1 = (boxes[[0, best, 1]].clamp(0.0, 1.0) * fh) as u32;
    let x2 = (boxes[[0, best, 2]].clamp(0.0, 1.0) * fw) as u32;
    let y2 = (boxes[[0, best, 3]].clamp(0.0, 1.0) * fh) as u32;

    let width = x2.saturating_sub(x1).min(frame_width - x1.min(frame_width));
    let height = y2.saturating_sub(y1).min(frame_height - y1.min(frame_height));
    if width == 0 || height == 0 {
        return None;
    }

    Some(FaceBox {
        x: x1,
        y: y1,
        width,
        height,
        confidence,
    })
}

/// FER+ style emotion classifier
pub struct EmotionModel {
    session: Session,
}

impl EmotionModel {
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let path = config
            .emotion_model_path
            .as_deref()
            .ok_or_else(|| DetectError::Config("emotion_model_path is not set".into()))?;

        Ok(Self {
            session: load_session(path, "emotion")?,
        })
    }

    /// Classify a face crop; returns the model label and its probability
    pub fn classify(&self, face: &Frame) -> Result<(&'static str, f32), DetectError> {
        let input = emotion_input(face)?;
        let outputs = self
            .session
            .run(ort::inputs![input].map_err(inference_error)?)
            .map_err(inference_error)?;

        let logits: Vec<f32> = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?
            .iter()
            .copied()
            .collect();

        let probabilities = softmax(&logits);
        let (index, probability) = argmax(&probabilities)
            .ok_or_else(|| DetectError::Inference("Empty emotion output".into()))?;
        let label = FERPLUS_LABELS.get(index).ok_or_else(|| {
            DetectError::Inference(format!("Emotion output index {} out of range", index))
        })?;

        Ok((label, probability))
    }
}

/// Grayscale 64x64 crop as raw 0..255 floats (1x1x64x64)
fn emotion_input(face: &Frame) -> Result<Array4<f32>, DetectError> {
    let gray = GrayImage::from_raw(face.width, face.height, face.to_grayscale())
        .ok_or_else(|| DetectError::ImageProcessing("Failed to create grayscale buffer".into()))?;
    let resized = imageops::resize(&gray, EMOTION_INPUT, EMOTION_INPUT, FilterType::Triangle);

    let edge = EMOTION_INPUT as usize;
    let mut input = Array4::<f32>::zeros((1, 1, edge, edge));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32;
    }
    Ok(input)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
