//! # Summed-Area Table
//!
//! Integral image over a single-channel buffer for O(1) window sums,
//! shared by the illumination background estimate and the adaptive
//! binarizer. Window means computed here are exact integer arithmetic, so
//! a constant image always yields its own value back.

use crate::buffer::PixelBuffer;

/// Integral image with one row/column of zero padding.
pub(crate) struct SummedAreaTable {
    width: usize,
    height: usize,
    sums: Vec<u64>,
}

impl SummedAreaTable {
    /// Builds the table for a single-channel buffer.
    pub(crate) fn new(buffer: &PixelBuffer) -> Self {
        let width = buffer.width() as usize;
        let height = buffer.height() as usize;
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += buffer.sample(x as u32, y as u32) as u64;
                sums[(y + 1) * stride + (x + 1)] = sums[y * stride + (x + 1)] + row_sum;
            }
        }

        Self {
            width,
            height,
            sums,
        }
    }

    /// Sum of the samples in the window centred on (x, y), truncated at
    /// the image borders.
    fn window_sum(&self, x: u32, y: u32, radius: u32) -> (u64, u64) {
        let x0 = (x as usize).saturating_sub(radius as usize);
        let y0 = (y as usize).saturating_sub(radius as usize);
        let x1 = (x as usize + radius as usize + 1).min(self.width);
        let y1 = (y as usize + radius as usize + 1).min(self.height);

        let stride = self.width + 1;
        let sum = self.sums[y1 * stride + x1] + self.sums[y0 * stride + x0]
            - self.sums[y0 * stride + x1]
            - self.sums[y1 * stride + x0];
        let area = ((x1 - x0) * (y1 - y0)) as u64;
        (sum, area)
    }

    /// Window mean rounded to the nearest integer intensity.
    pub(crate) fn window_mean_u8(&self, x: u32, y: u32, radius: u32) -> u8 {
        let (sum, area) = self.window_sum(x, y, radius);
        ((sum + area / 2) / area) as u8
    }

    /// Window mean as a float, for threshold comparisons.
    pub(crate) fn window_mean_f32(&self, x: u32, y: u32, radius: u32) -> f32 {
        let (sum, area) = self.window_sum(x, y, radius);
        sum as f32 / area as f32
    }
}

/// Box-filters a single-channel buffer: every pixel becomes the mean of
/// its `radius`-window, borders truncated. Exactly constant-preserving.
pub(crate) fn box_blur(buffer: &PixelBuffer, radius: u32) -> PixelBuffer {
    let table = SummedAreaTable::new(buffer);
    let (width, height) = (buffer.width(), buffer.height());
    let mut data = Vec::with_capacity(buffer.pixel_count());

    for y in 0..height {
        for x in 0..width {
            data.push(table.window_mean_u8(x, y, radius));
        }
    }

    // Shape is preserved by construction.
    PixelBuffer::from_raw(width, height, 1, data).unwrap_or_else(|_| buffer.clone())
}
