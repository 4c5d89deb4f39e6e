//! Emotion Detection
//!
//! Per-frame emotion classification for webcam sessions:
//! - Face detection (best face above a confidence threshold)
//! - Emotion classification of the face crop
//! - `EmotionClassifier` seam so sessions can run against any backend

pub mod classifier;
pub mod config;
pub mod detector;

pub use classifier::OnnxEmotionClassifier;
pub use config::DetectorConfig;
pub use detector::{EmotionModel, FaceBox, FaceDetector, FERPLUS_LABELS};

use frame_intake::Frame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result of classifying one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// No face found; statistics stay untouched
    NoFace,

    /// Dominant emotion of the detected face, as named by the model
    Emotion { label: String, confidence: f32 },
}

/// Frame-level emotion classifier.
///
/// Implementations run synchronously; callers move them onto a blocking
/// worker.
pub trait EmotionClassifier: Send + Sync {
    /// Classify the dominant emotion in a frame
    fn classify(&self, frame: &Frame) -> Result<Classification, DetectError>;

    /// Backend name for logs
    fn name(&self) -> &str {
        "classifier"
    }
}
