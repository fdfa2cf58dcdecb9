//! # Enhancement Report
//!
//! This module defines the structured summary produced by a pipeline run.
//! The report carries only scalar statistics (never a live buffer), is
//! created once per run, and is immutable after the run completes.

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineState;

/// Quality scores measured on the normalized grayscale input.
///
/// Advisory signals for the caller's retry logic; they do not influence
/// the pipeline's behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputQuality {
    /// Spread between the 90th and 10th intensity percentiles (0.0-1.0,
    /// higher is better)
    pub contrast: f32,
    /// Mean intensity (0.0-1.0, 0.5 is optimal)
    pub brightness: f32,
    /// Variance of the Laplacian response (0.0-1.0, higher is sharper)
    pub sharpness: f32,
}

/// Statistics and verdict computed by the quality validator on the final
/// binarized image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Fraction of pixels classified as ink (value 0)
    pub ink_ratio: f32,
    /// Number of 4-connected ink components
    pub component_count: usize,
    /// Component size histogram: bucket `i` counts components whose pixel
    /// count lies in `[2^i, 2^(i+1))`
    pub size_histogram: Vec<u32>,
    /// Median component size in pixels (0 when the page is blank)
    pub median_component_size: f32,
    /// Text line estimate from runs of consecutive ink-bearing rows
    pub estimated_line_count: usize,
    /// Advisory verdict: true when the page statistics look readable.
    /// Never blocks pipeline output.
    pub ocr_ready: bool,
}

/// Wall-clock duration of one completed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// The state the pipeline was in while the stage ran
    pub stage: PipelineState,
    /// Elapsed wall-clock milliseconds
    pub elapsed_ms: u32,
}

/// Structured summary of a pipeline run.
///
/// Fields are `None` until the stage that computes them has run, so a
/// failed run still returns whichever fields were produced before the
/// failure (see [`crate::errors::PipelineFailure`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancementReport {
    /// Quality scores of the grayscale input
    pub input_quality: Option<InputQuality>,
    /// Magnitude of the removed background gradient, normalized to [0, 1]
    pub illumination_gradient_removed: Option<f32>,
    /// Rotation applied to correct skew, in signed degrees (an input
    /// skewed by +7 degrees reports approximately -7)
    pub skew_angle_degrees: Option<f32>,
    /// Validator statistics and the advisory verdict
    pub quality: Option<QualityAssessment>,
    /// Per-stage wall-clock timings, in execution order
    pub stage_timings: Vec<StageTiming>,
}

impl EnhancementReport {
    /// Convenience accessor for the advisory verdict.
    ///
    /// Returns false when the validator has not run (e.g. on a failed run).
    pub fn ocr_ready(&self) -> bool {
        self.quality.as_ref().map(|q| q.ocr_ready).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_not_ready() {
        let report = EnhancementReport::default();
        assert!(!report.ocr_ready());
        assert!(report.skew_angle_degrees.is_none());
        assert!(report.stage_timings.is_empty());
    }

    #[test]
    fn test_ready_follows_verdict() {
        let mut report = EnhancementReport::default();
        report.quality = Some(QualityAssessment {
            ink_ratio: 0.02,
            component_count: 40,
            size_histogram: vec![0, 0, 1, 5, 30, 4],
            median_component_size: 60.0,
            estimated_line_count: 8,
            ocr_ready: true,
        });
        assert!(report.ocr_ready());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = EnhancementReport::default();
        report.skew_angle_degrees = Some(-5.25);
        report.stage_timings.push(StageTiming {
            stage: PipelineState::Deskewing,
            elapsed_ms: 12,
        });

        let json = serde_json::to_string(&report).unwrap();
        let back: EnhancementReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.skew_angle_degrees, Some(-5.25));
        assert_eq!(back.stage_timings.len(), 1);
    }
}
