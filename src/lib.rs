//! # page-prep
//!
//! A deterministic image enhancement pipeline that prepares photographed
//! or scanned paper documents for OCR: grayscale normalization,
//! edge-preserving denoising, illumination correction, skew correction,
//! adaptive binarization, and a quality self-check, applied in a
//! disciplined order over an exclusively owned pixel buffer.
//!
//! Reading image files, the CLI, and the OCR engine itself are external
//! collaborators: this crate accepts a raw [`PixelBuffer`] plus a
//! [`PipelineConfig`] and returns a binarized buffer together with an
//! [`EnhancementReport`].

pub mod buffer;
pub mod config;
pub mod enhancement;
pub mod errors;
pub mod pipeline;
pub mod report;

// Re-export types for easier access
pub use buffer::PixelBuffer;
pub use config::PipelineConfig;
pub use errors::{EnhanceError, EnhanceResult, PipelineFailure};
pub use pipeline::{EnhancedDocument, EnhancementStage, Pipeline, PipelineState};
pub use report::{EnhancementReport, InputQuality, QualityAssessment};
