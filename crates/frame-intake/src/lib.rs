//! Frame Intake
//!
//! Turns webcam payloads received over the session channel into decoded
//! RGB frames:
//! - `data:image/...;base64,` data URLs sent as text
//! - Raw encoded images (JPEG/PNG/...) sent as binary
//! - Dimension bounds to reject oversized images before classification

pub mod frame;
pub mod payload;

pub use frame::Frame;
pub use payload::{decode_payload, ImagePayload};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame intake error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Empty image payload")]
    Empty,

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image {width}x{height} exceeds limit {max_width}x{max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
}

/// Frame intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Largest accepted decoded width
    pub max_width: u32,
    /// Largest accepted decoded height
    pub max_height: u32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_width: 4096,
            max_height: 4096,
        }
    }
}
