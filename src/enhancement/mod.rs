//! # Image Enhancement Stages
//!
//! This module provides the individual transforms of the enhancement
//! pipeline. Each stage consumes a [`crate::buffer::PixelBuffer`], applies
//! one deterministic operation, and returns a new buffer with metadata.
//!
//! The module is organized into focused sub-modules:
//! - `grayscale`: perceptual luminance normalization
//! - `denoising`: edge-preserving bilateral smoothing
//! - `illumination`: background gradient removal and contrast stretch
//! - `deskewing`: text-line angle detection and rotation
//! - `binarization`: adaptive local-mean thresholding
//! - `morphology`: optional stroke thickening for thin glyphs
//! - `quality`: OCR-readiness heuristics and input quality scores
//! - `types`: shared per-stage result types

pub mod binarization;
pub mod denoising;
pub mod deskewing;
pub mod grayscale;
pub mod illumination;
pub(crate) mod integral;
pub mod morphology;
pub mod quality;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use types::{
    BinarizeResult, DenoiseResult, DeskewResult, GrayscaleResult, IlluminationResult,
};

// Re-export main functions from sub-modules
pub use binarization::binarize;
pub use denoising::reduce_noise;
pub use deskewing::deskew;
pub use grayscale::normalize_grayscale;
pub use illumination::correct_illumination;
pub use morphology::thicken_strokes;
pub use quality::{assess_input_quality, assess_quality};
