//! Detector configuration

use serde::{Deserialize, Serialize};

/// Emotion detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Face detection model (UltraFace-style ONNX); when unset the whole
    /// frame is treated as the face region
    pub face_model_path: Option<String>,

    /// Emotion classification model (FER+-style ONNX)
    pub emotion_model_path: Option<String>,

    /// Face detection confidence threshold
    pub face_confidence: f32,

    /// Model load attempts before giving up
    pub load_retries: u32,

    /// Backoff base between load attempts (seconds, grows linearly)
    pub retry_backoff_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            face_model_path: None,
            emotion_model_path: None,
            face_confidence: 0.7,
            load_retries: 3,
            retry_backoff_secs: 5,
        }
    }
}
