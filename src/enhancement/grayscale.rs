//! # Grayscale Normalization
//!
//! Collapses color input to a single luminance channel using perceptual
//! weighting, the first stage of every pipeline run.

use std::time::Instant;

use crate::buffer::PixelBuffer;
use crate::enhancement::types::GrayscaleResult;
use crate::errors::{EnhanceError, EnhanceResult};

/// Rec.601 luminance weights for the red, green, and blue channels.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Collapses a 1- or 3-channel buffer to a single luminance channel.
///
/// For 3-channel input each output sample is
/// `round(0.299*R + 0.587*G + 0.114*B)` clamped to [0, 255]. For
/// 1-channel input the buffer passes through pixel-exact, so applying the
/// stage to its own output is a no-op.
///
/// # Arguments
///
/// * `buffer` - The input buffer with 1 or 3 channels
///
/// # Returns
///
/// Returns a `Result` containing the single-channel buffer and metadata,
/// or an [`EnhanceError::InvalidBuffer`] for any other channel count.
///
/// # Examples
///
/// ```
/// use page_prep::PixelBuffer;
/// use page_prep::enhancement::normalize_grayscale;
///
/// let color = PixelBuffer::from_raw(1, 1, 3, vec![255, 0, 0]).unwrap();
/// let result = normalize_grayscale(color).unwrap();
/// assert_eq!(result.buffer.channels(), 1);
/// assert_eq!(result.buffer.sample(0, 0), 76); // 0.299 * 255
/// ```
pub fn normalize_grayscale(buffer: PixelBuffer) -> EnhanceResult<GrayscaleResult> {
    let start_time = Instant::now();

    let (width, height) = (buffer.width(), buffer.height());

    let (gray, collapsed) = match buffer.channels() {
        1 => (buffer, false),
        3 => {
            let mut data = Vec::with_capacity(width as usize * height as usize);
            for y in 0..height {
                for x in 0..width {
                    let mut luma = 0.0f32;
                    for (c, weight) in LUMA_WEIGHTS.iter().enumerate() {
                        luma += weight * buffer.sample_channel(x, y, c as u8) as f32;
                    }
                    data.push(luma.round().clamp(0.0, 255.0) as u8);
                }
            }
            (PixelBuffer::from_raw(width, height, 1, data)?, true)
        }
        channels => {
            return Err(EnhanceError::InvalidBuffer {
                message: format!("unsupported channel count {}; expected 1 or 3", channels),
            });
        }
    };

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "enhancement",
        "Grayscale normalization completed in {}ms: collapsed={}, dimensions={}x{}",
        processing_time.as_millis(),
        collapsed,
        width,
        height
    );

    Ok(GrayscaleResult {
        buffer: gray,
        collapsed_channels: collapsed,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_buffer(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
        let mut data = Vec::new();
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        PixelBuffer::from_raw(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_collapses_color_with_perceptual_weights() {
        let result = normalize_grayscale(color_buffer(2, 2, [100, 200, 50])).unwrap();

        // 0.299*100 + 0.587*200 + 0.114*50 = 153.0
        assert!(result.collapsed_channels);
        assert_eq!(result.buffer.channels(), 1);
        assert_eq!(result.buffer.sample(1, 1), 153);
    }

    #[test]
    fn test_preserves_dimensions() {
        let result = normalize_grayscale(color_buffer(7, 3, [10, 20, 30])).unwrap();
        assert_eq!(result.buffer.width(), 7);
        assert_eq!(result.buffer.height(), 3);
    }

    #[test]
    fn test_pure_white_and_black_map_exactly() {
        let white = normalize_grayscale(color_buffer(1, 1, [255, 255, 255])).unwrap();
        assert_eq!(white.buffer.sample(0, 0), 255);

        let black = normalize_grayscale(color_buffer(1, 1, [0, 0, 0])).unwrap();
        assert_eq!(black.buffer.sample(0, 0), 0);
    }

    #[test]
    fn test_idempotent_on_grayscale_input() {
        let gray = PixelBuffer::from_raw(3, 1, 1, vec![0, 127, 255]).unwrap();
        let once = normalize_grayscale(gray.clone()).unwrap();
        assert!(!once.collapsed_channels);
        assert_eq!(once.buffer, gray);

        let twice = normalize_grayscale(once.buffer.clone()).unwrap();
        assert_eq!(twice.buffer, once.buffer);
    }

    #[test]
    fn test_rejects_unsupported_channel_count() {
        let buffer = PixelBuffer::from_raw(2, 2, 2, vec![0; 8]).unwrap();
        let err = normalize_grayscale(buffer).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidBuffer { .. }));
    }
}
