//! # Enhancement Error Types
//!
//! This module defines the error types used throughout the enhancement
//! pipeline. Every error is a structural precondition violation detected
//! synchronously inside a stage; none are transient and none are retried.

use std::fmt;

use crate::pipeline::PipelineState;
use crate::report::EnhancementReport;

/// Errors that can occur during image enhancement operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EnhanceError {
    /// Buffer shape or channel layout does not match what a stage requires
    InvalidBuffer { message: String },
    /// Configuration value outside its legal range
    InvalidParameter {
        parameter: &'static str,
        value: String,
        message: String,
    },
    /// Image too small or structurally unusable for a stage
    DegenerateInput {
        width: u32,
        height: u32,
        message: String,
    },
}

impl fmt::Display for EnhanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnhanceError::InvalidBuffer { message } => {
                write!(f, "Invalid pixel buffer: {}", message)
            }
            EnhanceError::InvalidParameter {
                parameter,
                value,
                message,
            } => {
                write!(f, "Invalid parameter {}={}: {}", parameter, value, message)
            }
            EnhanceError::DegenerateInput {
                width,
                height,
                message,
            } => {
                write!(f, "Degenerate {}x{} input: {}", width, height, message)
            }
        }
    }
}

impl std::error::Error for EnhanceError {}

impl EnhanceError {
    /// Shorthand for an [`EnhanceError::InvalidParameter`] with a displayable value.
    pub(crate) fn invalid_parameter(
        parameter: &'static str,
        value: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        EnhanceError::InvalidParameter {
            parameter,
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for enhancement operations.
pub type EnhanceResult<T> = Result<T, EnhanceError>;

/// A failed pipeline run: the stage that failed, the violated precondition,
/// and whichever report fields were computed before the failure.
///
/// The partial report lets a caller diagnose how far the run progressed and
/// decide whether to adjust configuration and re-run. No retries happen
/// inside the pipeline itself.
#[derive(Debug, Clone)]
pub struct PipelineFailure {
    /// The state the pipeline was in when the error occurred
    pub stage: PipelineState,
    /// The precondition violation reported by the failing stage
    pub error: EnhanceError,
    /// Report fields computed by the stages that ran before the failure
    pub report: EnhancementReport,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipeline failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
