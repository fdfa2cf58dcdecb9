//! # Adaptive Binarization
//!
//! Converts the illumination-corrected, deskewed grayscale page into a
//! two-level ink/background image. The threshold is local (mean of a
//! window around each pixel minus a sensitivity constant) because even
//! after illumination correction no single global cutoff is fair across
//! residual local variation.

use std::time::Instant;

use crate::buffer::PixelBuffer;
use crate::config::BinarizeConfig;
use crate::enhancement::integral::SummedAreaTable;
use crate::enhancement::types::BinarizeResult;
use crate::errors::{EnhanceError, EnhanceResult};

/// Sample value for ink pixels.
pub const INK: u8 = 0;
/// Sample value for background pixels.
pub const BACKGROUND: u8 = 255;

/// Applies an adaptive local-mean threshold to a single-channel buffer.
///
/// For each pixel the mean intensity of the surrounding
/// `window_size x window_size` neighbourhood is computed from a
/// summed-area table; the pixel becomes ink (0) when its intensity is
/// below `local_mean - sensitivity`, background (255) otherwise. Border
/// windows are truncated at the image edge.
///
/// # Arguments
///
/// * `buffer` - Single-channel input buffer
/// * `config` - Window size (odd) and sensitivity constant
///
/// # Returns
///
/// Returns a `Result` containing the binary buffer and metadata, or an
/// [`EnhanceError::InvalidParameter`] when the window is even or larger
/// than the smaller image dimension.
pub fn binarize(buffer: PixelBuffer, config: &BinarizeConfig) -> EnhanceResult<BinarizeResult> {
    let start_time = Instant::now();

    if buffer.channels() != 1 {
        return Err(EnhanceError::InvalidBuffer {
            message: format!("expected 1 channel, got {}", buffer.channels()),
        });
    }
    config.validate()?;

    let (width, height) = (buffer.width(), buffer.height());
    if config.window_size > width.min(height) {
        return Err(EnhanceError::invalid_parameter(
            "window_size",
            config.window_size,
            format!(
                "must not exceed min(width, height) = {} for a {}x{} image",
                width.min(height),
                width,
                height
            ),
        ));
    }

    let table = SummedAreaTable::new(&buffer);
    let radius = config.window_size / 2;

    let mut data = Vec::with_capacity(buffer.pixel_count());
    for y in 0..height {
        for x in 0..width {
            let local_mean = table.window_mean_f32(x, y, radius);
            let value = if (buffer.sample(x, y) as f32) < local_mean - config.sensitivity {
                INK
            } else {
                BACKGROUND
            };
            data.push(value);
        }
    }

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "enhancement",
        "Binarization completed in {}ms: window={}, sensitivity={:.1}, dimensions={}x{}",
        processing_time.as_millis(),
        config.window_size,
        config.sensitivity,
        width,
        height
    );

    Ok(BinarizeResult {
        buffer: PixelBuffer::from_raw(width, height, 1, data)?,
        window_size: config.window_size,
        sensitivity: config.sensitivity,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}
