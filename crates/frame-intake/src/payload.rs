//! Image payload parsing and decoding

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::{ImageError, ImageReader};
use std::io::Cursor;
use tracing::debug;

use crate::{Frame, FrameError, IntakeConfig};

/// Encoded image as received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// `data:image/<fmt>;base64,<data>` text message
    DataUrl(String),
    /// Encoded image bytes from a binary message
    Raw(Vec<u8>),
}

impl ImagePayload {
    /// Size of the payload as received, in bytes
    pub fn len(&self) -> usize {
        match self {
            ImagePayload::DataUrl(s) => s.len(),
            ImagePayload::Raw(b) => b.len(),
        }
    }

    /// Whether the payload carries no data at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything after the first comma; the whole string when there is none
fn strip_data_url_header(url: &str) -> &str {
    match url.split_once(',') {
        Some((_, data)) => data,
        None => url,
    }
}

/// Decode a payload into an RGB frame.
///
/// Dimensions are checked from the image header before the pixels are
/// decoded, so oversized images are rejected cheaply.
pub fn decode_payload(
    payload: &ImagePayload,
    config: &IntakeConfig,
    sequence: u64,
) -> Result<Frame, FrameError> {
    let bytes = match payload {
        ImagePayload::DataUrl(url) => {
            let data = strip_data_url_header(url).trim();
            if data.is_empty() {
                return Err(FrameError::Empty);
            }
            BASE64_STANDARD.decode(data)?
        }
        ImagePayload::Raw(bytes) => bytes.clone(),
    };

    if bytes.is_empty() {
        return Err(FrameError::Empty);
    }

    let (width, height) = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_dimensions()?;

    if width > config.max_width || height > config.max_height {
        return Err(FrameError::TooLarge {
            width,
            height,
            max_width: config.max_width,
            max_height: config.max_height,
        });
    }

    let image = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;

    debug!("Decoded frame {}: {}x{}", sequence, width, height);
    Ok(Frame::from_rgb(image.to_rgb8(), sequence))
}
