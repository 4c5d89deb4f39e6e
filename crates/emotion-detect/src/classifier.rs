//! ONNX-backed emotion classifier

use frame_intake::Frame;
use std::time::Duration;
use tracing::{info, warn};

use crate::detector::{EmotionModel, FaceDetector};
use crate::{Classification, DetectError, DetectorConfig, EmotionClassifier};

/// Face detection followed by emotion classification of the best face
pub struct OnnxEmotionClassifier {
    face_detector: FaceDetector,
    emotion_model: EmotionModel,
}

impl OnnxEmotionClassifier {
    /// Load both models once
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        Ok(Self {
            face_detector: FaceDetector::new(config)?,
            emotion_model: EmotionModel::new(config)?,
        })
    }

    /// Load the models, retrying transient load failures.
    ///
    /// Waits `retry_backoff_secs * attempt` between attempts. Configuration
    /// errors are returned immediately.
    pub async fn load_with_retry(config: &DetectorConfig) -> Result<Self, DetectError> {
        let attempts = config.load_retries.max(1);
        let mut attempt = 1;
        loop {
            info!("Initializing emotion classifier (attempt {}/{})", attempt, attempts);
            match Self::new(config) {
                Ok(classifier) => return Ok(classifier),
                Err(e @ DetectError::Config(_)) => return Err(e),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let wait = Duration::from_secs(config.retry_backoff_secs * u64::from(attempt));
                    warn!("Classifier initialization failed: {}. Retrying in {:?}", e, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&self, frame: &Frame) -> Result<Classification, DetectError> {
        let Some(face) = self.face_detector.detect(frame)? else {
            return Ok(Classification::NoFace);
        };

        let crop = frame
            .crop(face.x, face.y, face.width, face.height)
            .ok_or_else(|| DetectError::ImageProcessing("Face box outside frame".into()))?;
        let (label, confidence) = self.emotion_model.classify(&crop)?;

        Ok(Classification::Emotion {
            label: label.to_string(),
            confidence,
        })
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
