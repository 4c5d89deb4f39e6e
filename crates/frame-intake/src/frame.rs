//! Decoded frame type

use image::{ImageBuffer, Rgb, RgbImage};

/// Decoded RGB webcam frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Per-session sequence number of the payload this frame came from
    pub sequence: u64,
}

impl Frame {
    /// Create a frame from an RGB image buffer
    pub fn from_rgb(image: RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            sequence,
        }
    }

    /// Borrow the pixels as an image buffer.
    ///
    /// Returns `None` when `data` does not hold `width * height` RGB pixels.
    pub fn view(&self) -> Option<ImageBuffer<Rgb<u8>, &[u8]>> {
        ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|pixel| {
                // Luminance formula: 0.299*R + 0.587*G + 0.114*B
                (pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114) as u8
            })
            .collect()
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<Frame> {
        if w == 0 || h == 0 || x.checked_add(w)? > self.width || y.checked_add(h)? > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row as usize * self.width as usize) + x as usize) * 3;
            let end = start + (w as usize * 3);
            cropped.extend_from_slice(self.data.get(start..end)?);
        }

        Some(Frame {
            data: cropped,
            width: w,
            height: h,
            sequence: self.sequence,
        })
    }
}
