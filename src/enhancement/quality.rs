//! # Quality Validation
//!
//! Heuristics over the final binarized page: ink coverage, connected ink
//! components, and a text-line estimate, combined into an advisory
//! "likely OCR-ready" verdict. The verdict never blocks pipeline output;
//! it is data for the caller's retry logic. The module also provides the
//! contrast/brightness/sharpness scores measured on the grayscale input.

use std::time::Instant;

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::buffer::PixelBuffer;
use crate::config::QualityConfig;
use crate::errors::{EnhanceError, EnhanceResult};
use crate::report::{InputQuality, QualityAssessment};

/// Smallest median component area accepted as plausible character
/// strokes, regardless of image size.
const MIN_PLAUSIBLE_COMPONENT_AREA: f64 = 4.0;

/// Computes statistics and the advisory verdict for a binarized buffer.
///
/// Ink pixels (value 0) are grouped into 4-connected components; the
/// verdict is true iff the ink ratio lies within the configured band, the
/// median component size sits in the plausible character band relative to
/// the image area, and enough components exist for a non-blank page.
///
/// # Arguments
///
/// * `buffer` - The final binarized buffer (not mutated)
/// * `config` - Verdict thresholds
///
/// # Returns
///
/// Returns a `Result` containing the assessment, or an
/// [`EnhanceError::InvalidBuffer`] for a non-single-channel buffer.
pub fn assess_quality(
    buffer: &PixelBuffer,
    config: &QualityConfig,
) -> EnhanceResult<QualityAssessment> {
    let start_time = Instant::now();

    if buffer.channels() != 1 {
        return Err(EnhanceError::InvalidBuffer {
            message: format!("expected 1 channel, got {}", buffer.channels()),
        });
    }
    config.validate()?;

    let total_pixels = buffer.pixel_count();
    let ink_count = buffer.data().iter().filter(|&&v| v == 0).count();
    let ink_ratio = ink_count as f32 / total_pixels as f32;

    let component_sizes = component_sizes(buffer)?;
    let component_count = component_sizes.len();
    let median_component_size = median(&component_sizes);
    let size_histogram = size_histogram(&component_sizes);
    let estimated_line_count = estimate_line_count(buffer);

    let area = total_pixels as f64;
    let min_median = (area * config.min_median_area_fraction).max(MIN_PLAUSIBLE_COMPONENT_AREA);
    let max_median = area * config.max_median_area_fraction;

    let ink_ok = ink_ratio >= config.min_ink_ratio && ink_ratio <= config.max_ink_ratio;
    let median_ok =
        median_component_size as f64 >= min_median && median_component_size as f64 <= max_median;
    let count_ok = component_count >= config.min_component_count;
    let ocr_ready = ink_ok && median_ok && count_ok;

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "enhancement",
        "Quality validation completed in {}ms: ink_ratio={:.4}, components={}, median_size={:.1}, lines={}, ready={}",
        processing_time.as_millis(),
        ink_ratio,
        component_count,
        median_component_size,
        estimated_line_count,
        ocr_ready
    );

    Ok(QualityAssessment {
        ink_ratio,
        component_count,
        size_histogram,
        median_component_size,
        estimated_line_count,
        ocr_ready,
    })
}

/// Sizes of the 4-connected ink components, in pixels.
fn component_sizes(buffer: &PixelBuffer) -> EnhanceResult<Vec<u32>> {
    let gray = buffer.to_gray_image()?;
    let labels = connected_components(&gray, Connectivity::Four, Luma([255u8]));

    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    let mut sizes = vec![0u32; max_label + 1];
    for pixel in labels.pixels() {
        let label = pixel[0] as usize;
        if label > 0 {
            sizes[label] += 1;
        }
    }

    Ok(sizes.into_iter().filter(|&s| s > 0).collect())
}

/// Median of the component sizes; 0 for a blank page.
fn median(sizes: &[u32]) -> f32 {
    if sizes.is_empty() {
        return 0.0;
    }
    let mut sorted = sizes.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f32
    } else {
        (sorted[mid - 1] + sorted[mid]) as f32 / 2.0
    }
}

/// Power-of-two histogram: bucket `i` counts components whose size lies
/// in `[2^i, 2^(i+1))`. Trailing empty buckets are trimmed.
fn size_histogram(sizes: &[u32]) -> Vec<u32> {
    let mut histogram = vec![0u32; 32];
    for &size in sizes {
        let bucket = 31 - size.leading_zeros() as usize;
        histogram[bucket] += 1;
    }
    while histogram.last() == Some(&0) {
        histogram.pop();
    }
    histogram
}

/// Estimates the number of text lines as the number of maximal runs of
/// consecutive rows carrying a meaningful amount of ink.
fn estimate_line_count(buffer: &PixelBuffer) -> usize {
    let (width, height) = (buffer.width(), buffer.height());
    let row_floor = (width / 200).max(2);

    let mut lines = 0usize;
    let mut in_line = false;
    for y in 0..height {
        let row_ink = (0..width).filter(|&x| buffer.sample(x, y) == 0).count() as u32;
        if row_ink >= row_floor {
            if !in_line {
                lines += 1;
                in_line = true;
            }
        } else {
            in_line = false;
        }
    }
    lines
}

/// Measures contrast, brightness, and sharpness on the grayscale input.
///
/// Contrast is the spread between the 90th and 10th intensity
/// percentiles; brightness the normalized mean; sharpness the variance of
/// a Laplacian response, squashed into [0, 1]. Advisory signals only.
pub fn assess_input_quality(buffer: &PixelBuffer) -> EnhanceResult<InputQuality> {
    if buffer.channels() != 1 {
        return Err(EnhanceError::InvalidBuffer {
            message: format!("expected 1 channel, got {}", buffer.channels()),
        });
    }

    Ok(InputQuality {
        contrast: contrast_ratio(buffer),
        brightness: brightness(buffer),
        sharpness: sharpness(buffer),
    })
}

/// Spread between the 90th and 10th intensity percentiles, in [0, 1].
fn contrast_ratio(buffer: &PixelBuffer) -> f32 {
    let mut pixels = buffer.data().to_vec();
    pixels.sort_unstable();

    let len = pixels.len();
    let p10 = pixels[(len as f32 * 0.1) as usize] as f32 / 255.0;
    let p90 = pixels[((len as f32 * 0.9) as usize).min(len - 1)] as f32 / 255.0;
    (p90 - p10).clamp(0.0, 1.0)
}

/// Mean intensity normalized to [0, 1].
fn brightness(buffer: &PixelBuffer) -> f32 {
    let sum: u64 = buffer.data().iter().map(|&v| v as u64).sum();
    sum as f32 / buffer.pixel_count() as f32 / 255.0
}

/// Variance of the 4-neighbour Laplacian response, squashed into [0, 1].
fn sharpness(buffer: &PixelBuffer) -> f32 {
    let (width, height) = (buffer.width(), buffer.height());
    if width < 3 || height < 3 {
        return 0.5;
    }

    let mut sum = 0.0f64;
    let mut count = 0u64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = buffer.sample(x, y) as f64;
            let laplacian = buffer.sample(x - 1, y) as f64
                + buffer.sample(x + 1, y) as f64
                + buffer.sample(x, y - 1) as f64
                + buffer.sample(x, y + 1) as f64
                - 4.0 * center;
            sum += laplacian * laplacian;
            count += 1;
        }
    }

    let variance = sum / count as f64;
    ((variance / 1000.0) as f32).min(1.0)
}
