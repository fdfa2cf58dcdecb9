//! # Skew Correction
//!
//! Detects the dominant text-line angle and rotates the page upright.
//! Detection scores candidate correction angles by the variance of the
//! row projection profile of the ink pixels: aligned text lines produce
//! sharp peaks and valleys (high variance), misaligned text smears the
//! profile flat.

use std::time::Instant;

use crate::buffer::PixelBuffer;
use crate::config::DeskewConfig;
use crate::enhancement::types::DeskewResult;
use crate::errors::{EnhanceError, EnhanceResult};

/// Smallest width/height the detector can work with.
const MIN_USABLE_DIMENSION: u32 = 8;

/// Candidate scores within this relative margin of the best are treated
/// as ties and resolved toward 0 degrees.
const TIE_EPSILON: f32 = 1e-3;

/// Intensity used for canvas area exposed by the rotation (document
/// background is light).
const BACKGROUND_FILL: u8 = 255;

/// Detects and corrects text skew in an illumination-corrected buffer.
///
/// The buffer is provisionally binarized at a coarse Otsu threshold to
/// locate ink pixels. Near-blank pages (provisional ink ratio below
/// `min_ink_ratio`) skip rotation entirely and record angle 0, so a blank
/// or noise-only page is never rotated on garbage evidence. Otherwise the
/// candidate angle whose rotation maximizes the projection-profile
/// variance is applied with bilinear resampling onto a canvas grown to
/// hold the rotated content, newly exposed area filled with background
/// white.
///
/// # Arguments
///
/// * `buffer` - Single-channel, illumination-corrected input
/// * `config` - Search range, angular resolution, and near-blank floor
///
/// # Returns
///
/// Returns a `Result` containing the deskewed buffer and the applied
/// angle, or an [`EnhanceError::DegenerateInput`] when either dimension
/// is below 8 pixels.
pub fn deskew(buffer: PixelBuffer, config: &DeskewConfig) -> EnhanceResult<DeskewResult> {
    let start_time = Instant::now();

    if buffer.channels() != 1 {
        return Err(EnhanceError::InvalidBuffer {
            message: format!("expected 1 channel, got {}", buffer.channels()),
        });
    }
    config.validate()?;

    let (width, height) = (buffer.width(), buffer.height());
    if width < MIN_USABLE_DIMENSION || height < MIN_USABLE_DIMENSION {
        return Err(EnhanceError::DegenerateInput {
            width,
            height,
            message: format!(
                "skew detection needs at least {0}x{0} pixels",
                MIN_USABLE_DIMENSION
            ),
        });
    }

    // Provisional ink mask at a coarse global threshold.
    let threshold = otsu_threshold(&buffer);
    let ink = ink_pixels(&buffer, threshold);
    let ink_ratio = ink.len() as f32 / buffer.pixel_count() as f32;

    if ink_ratio < config.min_ink_ratio {
        tracing::debug!(
            target: "enhancement",
            "Skew correction skipped: ink ratio {:.5} below floor {:.5} (near-blank page)",
            ink_ratio,
            config.min_ink_ratio
        );
        return Ok(DeskewResult {
            buffer,
            angle_degrees: 0.0,
            rotated: false,
            processing_time_ms: start_time.elapsed().as_millis() as u32,
        });
    }

    let angle = detect_correction_angle(&ink, height, config);

    // An already-aligned page needs no resampling pass.
    if angle.abs() < config.angle_step_degrees / 2.0 {
        let processing_time = start_time.elapsed();
        tracing::debug!(
            target: "enhancement",
            "Skew correction completed in {}ms: page already aligned",
            processing_time.as_millis()
        );
        return Ok(DeskewResult {
            buffer,
            angle_degrees: 0.0,
            rotated: false,
            processing_time_ms: processing_time.as_millis() as u32,
        });
    }

    let rotated = rotate_bilinear(&buffer, angle);
    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "enhancement",
        "Skew correction completed in {}ms: applied {:.2} degrees, {}x{} -> {}x{}",
        processing_time.as_millis(),
        angle,
        width,
        height,
        rotated.width(),
        rotated.height()
    );

    Ok(DeskewResult {
        buffer: rotated,
        angle_degrees: angle,
        rotated: true,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Ink pixel coordinates relative to the image centre.
fn ink_pixels(buffer: &PixelBuffer, threshold: u8) -> Vec<(f32, f32)> {
    let cx = buffer.width() as f32 / 2.0;
    let cy = buffer.height() as f32 / 2.0;
    let mut ink = Vec::new();

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            if buffer.sample(x, y) < threshold {
                ink.push((x as f32 - cx, y as f32 - cy));
            }
        }
    }
    ink
}

/// Sweeps candidate correction angles and returns the one maximizing the
/// row-profile variance, with ties resolved toward 0 degrees.
fn detect_correction_angle(ink: &[(f32, f32)], height: u32, config: &DeskewConfig) -> f32 {
    let steps = (config.max_angle_degrees / config.angle_step_degrees).round() as i32;

    // Visit candidates ordered by |angle| so that on a tie the angle
    // closest to zero is kept.
    let mut candidates = Vec::with_capacity((2 * steps + 1) as usize);
    candidates.push(0.0f32);
    for i in 1..=steps {
        let offset = i as f32 * config.angle_step_degrees;
        candidates.push(-offset);
        candidates.push(offset);
    }

    let mut best_angle = 0.0f32;
    let mut best_score = f32::MIN;

    for &angle in &candidates {
        let score = projection_variance(ink, angle, height);
        if score > best_score * (1.0 + TIE_EPSILON) || best_score == f32::MIN {
            best_score = score;
            best_angle = angle;
        }
    }

    best_angle
}

/// Variance of the row projection profile after rotating the ink pixels
/// by `angle_degrees`. Sharp line peaks mean high variance.
fn projection_variance(ink: &[(f32, f32)], angle_degrees: f32, height: u32) -> f32 {
    let angle = angle_degrees.to_radians();
    let (sin_a, cos_a) = angle.sin_cos();
    let cy = height as f32 / 2.0;

    let mut rows = vec![0u32; height as usize];
    for &(dx, dy) in ink {
        let rotated_y = dx * sin_a + dy * cos_a + cy;
        if rotated_y >= 0.0 && rotated_y < height as f32 {
            rows[rotated_y as usize] += 1;
        }
    }

    let mean = rows.iter().map(|&c| c as f32).sum::<f32>() / rows.len() as f32;
    rows.iter()
        .map(|&c| {
            let d = c as f32 - mean;
            d * d
        })
        .sum::<f32>()
        / rows.len() as f32
}

/// Otsu's threshold from the intensity histogram, maximizing between-class
/// variance. Falls back to the midpoint for effectively single-class pages.
fn otsu_threshold(buffer: &PixelBuffer) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in buffer.data() {
        histogram[v as usize] += 1;
    }
    let total = buffer.pixel_count() as f64;

    let mut cumulative = [0f64; 256];
    let mut cumulative_weighted = [0f64; 256];
    let mut sum = 0f64;
    let mut weighted_sum = 0f64;
    for i in 0..256 {
        sum += histogram[i] as f64;
        weighted_sum += i as f64 * histogram[i] as f64;
        cumulative[i] = sum;
        cumulative_weighted[i] = weighted_sum;
    }

    let mut best_threshold = 128u8;
    let mut best_variance = 0f64;
    let total_weighted = cumulative_weighted[255];

    for threshold in 1..255usize {
        let w0 = cumulative[threshold] / total;
        let w1 = 1.0 - w0;
        if w0 == 0.0 || w1 == 0.0 {
            continue;
        }

        let mu0 = cumulative_weighted[threshold] / cumulative[threshold];
        let mu1 = (total_weighted - cumulative_weighted[threshold])
            / (cumulative[255] - cumulative[threshold]);

        let variance = w0 * w1 * (mu0 - mu1) * (mu0 - mu1);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = threshold as u8;
        }
    }

    best_threshold
}

/// Rotates the buffer by `angle_degrees` with bilinear resampling onto a
/// canvas grown to the rotated bounding box; exposed area is filled with
/// background white.
fn rotate_bilinear(buffer: &PixelBuffer, angle_degrees: f32) -> PixelBuffer {
    let angle = angle_degrees.to_radians();
    let (sin_a, cos_a) = angle.sin_cos();
    let (width, height) = (buffer.width(), buffer.height());

    let w = width as f32;
    let h = height as f32;
    let new_width = (w * cos_a.abs() + h * sin_a.abs()).ceil() as u32;
    let new_height = (w * sin_a.abs() + h * cos_a.abs()).ceil() as u32;

    let cx = w / 2.0;
    let cy = h / 2.0;
    let ncx = new_width as f32 / 2.0;
    let ncy = new_height as f32 / 2.0;

    let mut data = Vec::with_capacity(new_width as usize * new_height as usize);
    for y in 0..new_height {
        for x in 0..new_width {
            // Inverse-map the output pixel into the source frame.
            let dx = x as f32 - ncx;
            let dy = y as f32 - ncy;
            let src_x = dx * cos_a + dy * sin_a + cx;
            let src_y = -dx * sin_a + dy * cos_a + cy;
            data.push(sample_bilinear(buffer, src_x, src_y));
        }
    }

    // new_width/new_height are at least the source dimensions.
    PixelBuffer::from_raw(new_width, new_height, 1, data).unwrap_or_else(|_| buffer.clone())
}

/// Bilinear sample with background fill outside the source bounds.
fn sample_bilinear(buffer: &PixelBuffer, x: f32, y: f32) -> u8 {
    let max_x = buffer.width() as f32 - 1.0;
    let max_y = buffer.height() as f32 - 1.0;
    if x < 0.0 || y < 0.0 || x > max_x || y > max_y {
        return BACKGROUND_FILL;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(buffer.width() - 1);
    let y1 = (y0 + 1).min(buffer.height() - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = buffer.sample(x0, y0) as f32 * (1.0 - fx) + buffer.sample(x1, y0) as f32 * fx;
    let bottom = buffer.sample(x0, y1) as f32 * (1.0 - fx) + buffer.sample(x1, y1) as f32 * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with horizontal black bars, the synthetic stand-in for
    /// text lines.
    fn lined_page(width: u32, height: u32, bar_height: u32, spacing: u32) -> PixelBuffer {
        let mut data = vec![255u8; (width * height) as usize];
        let margin = width / 8;
        let mut y = spacing;
        while y + bar_height < height - spacing {
            for row in y..y + bar_height {
                for x in margin..width - margin {
                    data[(row * width + x) as usize] = 0;
                }
            }
            y += spacing;
        }
        PixelBuffer::from_raw(width, height, 1, data).unwrap()
    }

    #[test]
    fn test_rejects_degenerate_size() {
        let buffer = PixelBuffer::filled(6, 100, 255).unwrap();
        let err = deskew(buffer, &DeskewConfig::default()).unwrap_err();
        assert!(matches!(err, EnhanceError::DegenerateInput { .. }));
    }

    #[test]
    fn test_rejects_color_buffer() {
        let buffer = PixelBuffer::from_raw(20, 20, 3, vec![0; 1200]).unwrap();
        assert!(deskew(buffer, &DeskewConfig::default()).is_err());
    }

    #[test]
    fn test_all_white_page_skips_rotation() {
        let buffer = PixelBuffer::filled(120, 90, 255).unwrap();
        let result = deskew(buffer.clone(), &DeskewConfig::default()).unwrap();

        assert_eq!(result.angle_degrees, 0.0);
        assert!(!result.rotated);
        assert_eq!(result.buffer, buffer);
    }

    #[test]
    fn test_aligned_page_reports_zero() {
        let buffer = lined_page(200, 150, 3, 20);
        let result = deskew(buffer, &DeskewConfig::default()).unwrap();

        assert_eq!(result.angle_degrees, 0.0);
        assert!(!result.rotated);
        assert_eq!(result.buffer.width(), 200);
        assert_eq!(result.buffer.height(), 150);
    }

    #[test]
    fn test_detects_known_rotation() {
        let upright = lined_page(300, 200, 3, 20);
        let skewed = rotate_bilinear(&upright, 7.0);

        let result = deskew(skewed, &DeskewConfig::default()).unwrap();

        assert!(
            (result.angle_degrees + 7.0).abs() <= 0.5,
            "expected about -7 degrees, got {}",
            result.angle_degrees
        );
        assert!(result.rotated);
    }

    #[test]
    fn test_detects_opposite_rotation() {
        let upright = lined_page(300, 200, 3, 20);
        let skewed = rotate_bilinear(&upright, -4.0);

        let result = deskew(skewed, &DeskewConfig::default()).unwrap();
        assert!((result.angle_degrees - 4.0).abs() <= 0.5);
    }

    #[test]
    fn test_rotation_never_shrinks_canvas() {
        let buffer = lined_page(160, 120, 3, 16);
        let rotated = rotate_bilinear(&buffer, 10.0);
        assert!(rotated.width() >= 160);
        assert!(rotated.height() >= 120);
    }

    #[test]
    fn test_rotation_fills_exposed_corners_with_white() {
        let buffer = PixelBuffer::filled(100, 60, 0).unwrap();
        let rotated = rotate_bilinear(&buffer, 10.0);

        // The grown canvas corners lie outside the source rectangle.
        assert_eq!(rotated.sample(0, 0), 255);
        assert_eq!(rotated.sample(rotated.width() - 1, 0), 255);
    }

    #[test]
    fn test_otsu_separates_bimodal_page() {
        let buffer = lined_page(100, 100, 4, 10);
        let threshold = otsu_threshold(&buffer);
        assert!(threshold > 0 && threshold < 255);
    }

    #[test]
    fn test_otsu_uniform_falls_back_to_midpoint() {
        let buffer = PixelBuffer::filled(50, 50, 128).unwrap();
        assert_eq!(otsu_threshold(&buffer), 128);
    }

    #[test]
    fn test_projection_variance_peaks_when_aligned() {
        let buffer = lined_page(200, 150, 3, 20);
        let threshold = otsu_threshold(&buffer);
        let ink = ink_pixels(&buffer, threshold);

        let aligned = projection_variance(&ink, 0.0, 150);
        let tilted = projection_variance(&ink, 5.0, 150);
        assert!(aligned > tilted);
    }

    #[test]
    fn test_bilinear_sample_interpolates() {
        let buffer = PixelBuffer::from_raw(2, 1, 1, vec![0, 200]).unwrap();
        assert_eq!(sample_bilinear(&buffer, 0.5, 0.0), 100);
        assert_eq!(sample_bilinear(&buffer, 0.0, 0.0), 0);
        assert_eq!(sample_bilinear(&buffer, -1.0, 0.0), 255);
    }
}
