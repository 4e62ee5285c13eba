//! Decoding of data-URI image payloads into raw pixel arrays.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, RgbImage};

/// Errors produced while turning a client payload into pixels.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Image payload is not a data URI (expected '<header>,<base64>')")]
    MissingPayload,

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
}

/// An interleaved `height x width x channels` array of 8-bit samples.
///
/// Three-channel arrays are stored in BGR order, which is what
/// [`decode`] produces and what model backends read. One, two and four
/// channel arrays keep the source order (gray, gray+alpha, RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelArray {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelArray {
    /// Wrap raw samples. Returns `None` when `data` does not match the shape.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(channels as usize)?;
        if channels == 0 || channels > 4 || data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Convert a decoded image, narrowing to 8-bit and reordering RGB to BGR.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (channels, mut data) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other => {
                let color = other.color();
                if color.has_alpha() && color.has_color() {
                    (4, other.to_rgba8().into_raw())
                } else if color.has_alpha() {
                    (2, other.to_luma_alpha8().into_raw())
                } else if color.has_color() {
                    (3, other.to_rgb8().into_raw())
                } else {
                    (1, other.to_luma8().into_raw())
                }
            }
        };

        if channels == 3 {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }

        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The pixel at `(x, y)` as RGB, whatever the stored layout.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * self.channels as usize;
        let px = &self.data[idx..idx + self.channels as usize];
        match self.channels {
            1 | 2 => [px[0], px[0], px[0]],
            3 => [px[2], px[1], px[0]],
            _ => [px[0], px[1], px[2]],
        }
    }

    /// Copy into an RGB image buffer.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(self.rgb_at(x, y)))
    }
}

/// Decode a `data:<mime>;base64,<data>` payload into a [`PixelArray`].
///
/// Everything up to the first comma is treated as header and ignored; the
/// image format is sniffed from the decoded bytes.
pub fn decode(payload: &str) -> Result<PixelArray, DecodeError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (_header, data) = payload.split_once(',').ok_or(DecodeError::MissingPayload)?;
    let data = data.trim();
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(data)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(PixelArray::from_image(image))
}
