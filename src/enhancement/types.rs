//! # Shared Types for Enhancement Stages
//!
//! Per-stage result structs: each stage returns its output buffer together
//! with the parameters it applied and its elapsed wall-clock time.

use crate::buffer::PixelBuffer;

/// Result of grayscale normalization.
#[derive(Debug, Clone)]
pub struct GrayscaleResult {
    /// The single-channel output buffer
    pub buffer: PixelBuffer,
    /// True when a 3-channel input was collapsed; false for the
    /// idempotent single-channel path
    pub collapsed_channels: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of edge-preserving noise reduction.
#[derive(Debug, Clone)]
pub struct DenoiseResult {
    /// The smoothed buffer
    pub buffer: PixelBuffer,
    /// Neighbourhood radius used
    pub kernel_radius: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of illumination correction.
#[derive(Debug, Clone)]
pub struct IlluminationResult {
    /// The flattened, contrast-stretched buffer
    pub buffer: PixelBuffer,
    /// Magnitude of the removed background gradient, normalized to [0, 1]
    pub gradient_removed: f32,
    /// Background blur radius derived from the image size
    pub background_radius: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of skew correction.
#[derive(Debug, Clone)]
pub struct DeskewResult {
    /// The deskewed buffer; dimensions may have grown to avoid cropping
    pub buffer: PixelBuffer,
    /// Rotation applied in signed degrees (0 when rotation was skipped)
    pub angle_degrees: f32,
    /// False when the page was near-blank or already aligned
    pub rotated: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of adaptive binarization.
#[derive(Debug, Clone)]
pub struct BinarizeResult {
    /// The binary buffer; every sample is 0 or 255
    pub buffer: PixelBuffer,
    /// Local-mean window side length used
    pub window_size: u32,
    /// Sensitivity constant used
    pub sensitivity: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}
