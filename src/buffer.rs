//! # Pixel Buffer
//!
//! This module defines the owned pixel grid that every enhancement stage
//! reads and writes. A buffer is created once from the external
//! image-loading layer, handed from stage to stage (never shared), and
//! finally passed to the external OCR collaborator.

use image::{GrayImage, RgbImage};

use crate::errors::{EnhanceError, EnhanceResult};

/// An owned, mutable 2D grid of intensity samples.
///
/// Samples are stored row-major with interleaved channels; each sample is
/// an integer in [0, 255]. Grayscale and binary buffers have one channel,
/// color buffers three. The shape invariant
/// `data.len() == width * height * channels` is enforced at construction
/// and holds for the buffer's entire lifetime.
///
/// # Examples
///
/// ```
/// use page_prep::PixelBuffer;
///
/// let buffer = PixelBuffer::from_raw(2, 2, 1, vec![0, 64, 128, 255]).unwrap();
/// assert_eq!(buffer.width(), 2);
/// assert_eq!(buffer.sample(1, 1), 255);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer from raw row-major samples.
    ///
    /// # Arguments
    ///
    /// * `width` - Image width in pixels (must be positive)
    /// * `height` - Image height in pixels (must be positive)
    /// * `channels` - Samples per pixel (1 for grayscale/binary, 3 for color)
    /// * `data` - Row-major interleaved samples
    ///
    /// # Errors
    ///
    /// Returns [`EnhanceError::InvalidBuffer`] if width or height is zero,
    /// the channel count is zero, or the sample count does not equal
    /// `width * height * channels`.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> EnhanceResult<Self> {
        if width == 0 || height == 0 {
            return Err(EnhanceError::InvalidBuffer {
                message: format!("dimensions must be positive, got {}x{}", width, height),
            });
        }
        if channels == 0 {
            return Err(EnhanceError::InvalidBuffer {
                message: "channel count must be positive".to_string(),
            });
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(EnhanceError::InvalidBuffer {
                message: format!(
                    "sample count {} does not match {}x{}x{} = {}",
                    data.len(),
                    width,
                    height,
                    channels,
                    expected
                ),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Creates a single-channel buffer filled with a constant intensity.
    pub fn filled(width: u32, height: u32, value: u8) -> EnhanceResult<Self> {
        let len = width as usize * height as usize;
        Self::from_raw(width, height, 1, vec![value; len])
    }

    /// Wraps a grayscale image from the `image` crate without copying.
    pub fn from_gray_image(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 1,
            data: image.into_raw(),
        }
    }

    /// Wraps an RGB image from the `image` crate without copying.
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }

    /// Converts a single-channel buffer into a `GrayImage` for stages that
    /// lean on `image`/`imageproc` operations.
    ///
    /// # Errors
    ///
    /// Returns [`EnhanceError::InvalidBuffer`] if the buffer is not
    /// single-channel.
    pub fn to_gray_image(&self) -> EnhanceResult<GrayImage> {
        if self.channels != 1 {
            return Err(EnhanceError::InvalidBuffer {
                message: format!("expected 1 channel, got {}", self.channels),
            });
        }
        GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            EnhanceError::InvalidBuffer {
                message: "sample count does not match dimensions".to_string(),
            }
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Total pixel count (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Borrow the raw row-major samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return the raw samples, for handoff to the
    /// external OCR collaborator.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Intensity of pixel (x, y) in a single-channel buffer.
    ///
    /// Callers must ensure `x < width`, `y < height` and `channels == 1`;
    /// stages iterate within bounds they already validated.
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Intensity of channel `c` of pixel (x, y).
    pub fn sample_channel(&self, x: u32, y: u32, c: u8) -> u8 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + c as usize;
        self.data[idx]
    }

    /// True if every sample is 0 or 255.
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == 0 || v == 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_from_raw_valid() {
        let buffer = PixelBuffer::from_raw(3, 2, 1, vec![0; 6]).unwrap();
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.pixel_count(), 6);
    }

    #[test]
    fn test_from_raw_rejects_length_mismatch() {
        let result = PixelBuffer::from_raw(3, 2, 1, vec![0; 5]);
        assert!(matches!(result, Err(EnhanceError::InvalidBuffer { .. })));
    }

    #[test]
    fn test_from_raw_rejects_zero_dimensions() {
        assert!(PixelBuffer::from_raw(0, 2, 1, vec![]).is_err());
        assert!(PixelBuffer::from_raw(2, 0, 1, vec![]).is_err());
        assert!(PixelBuffer::from_raw(2, 2, 0, vec![]).is_err());
    }

    #[test]
    fn test_sample_row_major_order() {
        let buffer = PixelBuffer::from_raw(2, 2, 1, vec![10, 20, 30, 40]).unwrap();
        assert_eq!(buffer.sample(0, 0), 10);
        assert_eq!(buffer.sample(1, 0), 20);
        assert_eq!(buffer.sample(0, 1), 30);
        assert_eq!(buffer.sample(1, 1), 40);
    }

    #[test]
    fn test_sample_channel_interleaved() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let buffer = PixelBuffer::from_raw(2, 1, 3, data).unwrap();
        assert_eq!(buffer.sample_channel(0, 0, 0), 1);
        assert_eq!(buffer.sample_channel(0, 0, 2), 3);
        assert_eq!(buffer.sample_channel(1, 0, 1), 5);
    }

    #[test]
    fn test_gray_image_round_trip() {
        let mut img = GrayImage::new(4, 3);
        img.put_pixel(2, 1, Luma([200]));
        let buffer = PixelBuffer::from_gray_image(img);
        assert_eq!(buffer.sample(2, 1), 200);

        let back = buffer.to_gray_image().unwrap();
        assert_eq!(back.get_pixel(2, 1)[0], 200);
        assert_eq!(back.dimensions(), (4, 3));
    }

    #[test]
    fn test_to_gray_image_rejects_color() {
        let buffer = PixelBuffer::from_raw(2, 1, 3, vec![0; 6]).unwrap();
        assert!(buffer.to_gray_image().is_err());
    }

    #[test]
    fn test_is_binary() {
        let binary = PixelBuffer::from_raw(2, 1, 1, vec![0, 255]).unwrap();
        assert!(binary.is_binary());

        let gray = PixelBuffer::from_raw(2, 1, 1, vec![0, 128]).unwrap();
        assert!(!gray.is_binary());
    }

    #[test]
    fn test_filled() {
        let buffer = PixelBuffer::filled(5, 4, 255).unwrap();
        assert_eq!(buffer.pixel_count(), 20);
        assert!(buffer.data().iter().all(|&v| v == 255));
    }
}
