//! # Pipeline Orchestrator
//!
//! Owns the stage order and configuration, runs the stages sequentially,
//! and assembles the enhancement report. The orchestrator is a linear
//! state machine: Idle is the only entry state, Done and Failed the only
//! terminal states, and any stage error transitions directly to Failed,
//! aborting the remaining stages.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::config::PipelineConfig;
use crate::enhancement::{
    binarize, correct_illumination, deskew, normalize_grayscale, reduce_noise, thicken_strokes,
};
use crate::enhancement::quality::{assess_input_quality, assess_quality};
use crate::errors::{EnhanceResult, PipelineFailure};
use crate::report::{EnhancementReport, StageTiming};

/// States of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    /// Entry state; no stage has run
    Idle,
    /// Grayscale normalization in progress
    Normalizing,
    /// Noise reduction in progress
    Denoising,
    /// Illumination correction in progress
    CorrectingIllumination,
    /// Skew correction in progress
    Deskewing,
    /// Binarization in progress
    Binarizing,
    /// Quality validation in progress
    Validating,
    /// Terminal: run completed
    Done,
    /// Terminal: a stage reported a precondition violation
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Denoising => "denoising",
            PipelineState::CorrectingIllumination => "correcting illumination",
            PipelineState::Deskewing => "deskewing",
            PipelineState::Binarizing => "binarizing",
            PipelineState::Validating => "validating",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// One transform in the pipeline's ordered stage sequence.
///
/// Stages are polymorphic objects sharing this single capability; a new
/// stage is added by implementing the trait and inserting it into the
/// sequence passed to [`Pipeline::with_stages`].
pub trait EnhancementStage: Send + Sync {
    /// The state the pipeline enters while this stage runs.
    fn state(&self) -> PipelineState;

    /// Transforms the buffer, recording any report fields this stage
    /// produces. The stage owns the buffer exclusively for the duration
    /// of the call.
    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer>;
}

/// Grayscale normalization stage; also records the input quality scores.
pub struct GrayscaleStage;

impl EnhancementStage for GrayscaleStage {
    fn state(&self) -> PipelineState {
        PipelineState::Normalizing
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        _config: &PipelineConfig,
        report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        let result = normalize_grayscale(buffer)?;
        report.input_quality = Some(assess_input_quality(&result.buffer)?);
        Ok(result.buffer)
    }
}

/// Edge-preserving noise reduction stage.
pub struct DenoiseStage;

impl EnhancementStage for DenoiseStage {
    fn state(&self) -> PipelineState {
        PipelineState::Denoising
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        _report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        Ok(reduce_noise(buffer, &config.denoise)?.buffer)
    }
}

/// Illumination correction stage.
pub struct IlluminationStage;

impl EnhancementStage for IlluminationStage {
    fn state(&self) -> PipelineState {
        PipelineState::CorrectingIllumination
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        let result = correct_illumination(buffer, &config.illumination)?;
        report.illumination_gradient_removed = Some(result.gradient_removed);
        Ok(result.buffer)
    }
}

/// Skew correction stage.
pub struct DeskewStage;

impl EnhancementStage for DeskewStage {
    fn state(&self) -> PipelineState {
        PipelineState::Deskewing
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        let result = deskew(buffer, &config.deskew)?;
        report.skew_angle_degrees = Some(result.angle_degrees);
        Ok(result.buffer)
    }
}

/// Adaptive binarization stage, with optional stroke thickening.
pub struct BinarizeStage;

impl EnhancementStage for BinarizeStage {
    fn state(&self) -> PipelineState {
        PipelineState::Binarizing
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        _report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        let result = binarize(buffer, &config.binarize)?;
        if config.morphology.thicken_strokes {
            return thicken_strokes(result.buffer, config.morphology.thicken_passes);
        }
        Ok(result.buffer)
    }
}

/// Quality validation stage; computes statistics without mutating the
/// buffer.
pub struct ValidateStage;

impl EnhancementStage for ValidateStage {
    fn state(&self) -> PipelineState {
        PipelineState::Validating
    }

    fn apply(
        &self,
        buffer: PixelBuffer,
        config: &PipelineConfig,
        report: &mut EnhancementReport,
    ) -> EnhanceResult<PixelBuffer> {
        report.quality = Some(assess_quality(&buffer, &config.quality)?);
        Ok(buffer)
    }
}

/// A successful pipeline run: the binarized buffer ready for the OCR
/// collaborator, plus the run's report.
#[derive(Debug, Clone)]
pub struct EnhancedDocument {
    /// Single-channel buffer containing only values 0 and 255
    pub buffer: PixelBuffer,
    /// Scalar summary of the run
    pub report: EnhancementReport,
}

/// The enhancement pipeline: an ordered sequence of stages run
/// sequentially over an exclusively owned buffer.
///
/// Each run is pure in-memory computation with no suspension points.
/// Independent documents may be processed concurrently by instantiating
/// one pipeline per run; no state is shared between runs.
///
/// # Examples
///
/// ```
/// use page_prep::{Pipeline, PipelineConfig, PixelBuffer};
///
/// let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
/// let page = PixelBuffer::filled(64, 64, 255).unwrap();
/// let enhanced = pipeline.run(page).unwrap();
///
/// assert!(enhanced.buffer.is_binary());
/// assert!(!enhanced.report.ocr_ready()); // blank page
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn EnhancementStage>>,
}

impl Pipeline {
    /// Creates a pipeline with the default stage sequence.
    ///
    /// The configuration is validated here, before any stage can run, so
    /// an out-of-range parameter is rejected eagerly rather than
    /// mid-pipeline.
    pub fn new(config: PipelineConfig) -> EnhanceResult<Self> {
        Self::with_stages(config, default_stages())
    }

    /// Creates a pipeline with a caller-supplied stage sequence.
    pub fn with_stages(
        config: PipelineConfig,
        stages: Vec<Box<dyn EnhancementStage>>,
    ) -> EnhanceResult<Self> {
        config.validate()?;
        Ok(Self { config, stages })
    }

    /// The validated configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage over the buffer, threading ownership stage to
    /// stage.
    ///
    /// On success returns the final buffer and the complete report. On
    /// the first stage error the run transitions to Failed, the remaining
    /// stages never execute, and the failure carries the failing stage
    /// plus whichever report fields were already computed.
    pub fn run(&self, buffer: PixelBuffer) -> Result<EnhancedDocument, PipelineFailure> {
        let mut state = PipelineState::Idle;
        tracing::debug!(
            target: "enhancement",
            "Pipeline starting in state '{}': {}x{}x{} input",
            state,
            buffer.width(),
            buffer.height(),
            buffer.channels()
        );

        let mut report = EnhancementReport::default();
        let mut current = buffer;

        for stage in &self.stages {
            state = stage.state();
            tracing::debug!(target: "enhancement", "Pipeline entering state '{}'", state);

            let started = Instant::now();
            match stage.apply(current, &self.config, &mut report) {
                Ok(next) => {
                    report.stage_timings.push(StageTiming {
                        stage: state,
                        elapsed_ms: started.elapsed().as_millis() as u32,
                    });
                    current = next;
                }
                Err(error) => {
                    let failed_stage = state;
                    state = PipelineState::Failed;
                    tracing::warn!(
                        target: "enhancement",
                        "Pipeline entering state '{}': {} stage reported: {}",
                        state,
                        failed_stage,
                        error
                    );
                    return Err(PipelineFailure {
                        stage: failed_stage,
                        error,
                        report,
                    });
                }
            }
        }

        state = PipelineState::Done;
        tracing::debug!(
            target: "enhancement",
            "Pipeline entering state '{}': {} stages, ready={}",
            state,
            report.stage_timings.len(),
            report.ocr_ready()
        );

        Ok(EnhancedDocument {
            buffer: current,
            report,
        })
    }
}

/// The default stage sequence: Grayscale, Denoise, Illumination, Deskew,
/// Binarize, Validate.
pub fn default_stages() -> Vec<Box<dyn EnhancementStage>> {
    vec![
        Box::new(GrayscaleStage),
        Box::new(DenoiseStage),
        Box::new(IlluminationStage),
        Box::new(DeskewStage),
        Box::new(BinarizeStage),
        Box::new(ValidateStage),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EnhanceError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.binarize.window_size = 24;

        let err = match Pipeline::new(config) {
            Err(err) => err,
            Ok(_) => panic!("even window size must be rejected before any stage runs"),
        };
        assert!(matches!(
            err,
            EnhanceError::InvalidParameter {
                parameter: "window_size",
                ..
            }
        ));
    }

    #[test]
    fn test_blank_page_runs_to_done() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let enhanced = pipeline.run(PixelBuffer::filled(64, 64, 255).unwrap()).unwrap();

        assert!(enhanced.buffer.is_binary());
        assert_eq!(enhanced.report.skew_angle_degrees, Some(0.0));
        assert_eq!(enhanced.report.stage_timings.len(), 6);
        assert!(!enhanced.report.ocr_ready());
    }

    #[test]
    fn test_stage_order_matches_states() {
        let stages = default_stages();
        let states: Vec<PipelineState> = stages.iter().map(|s| s.state()).collect();
        assert_eq!(
            states,
            vec![
                PipelineState::Normalizing,
                PipelineState::Denoising,
                PipelineState::CorrectingIllumination,
                PipelineState::Deskewing,
                PipelineState::Binarizing,
                PipelineState::Validating,
            ]
        );
    }

    #[test]
    fn test_failure_reports_failing_stage() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        // 2-channel buffers are rejected by the grayscale stage.
        let bad = PixelBuffer::from_raw(16, 16, 2, vec![0; 512]).unwrap();

        let failure = pipeline.run(bad).unwrap_err();
        assert_eq!(failure.stage, PipelineState::Normalizing);
        assert!(matches!(failure.error, EnhanceError::InvalidBuffer { .. }));
        assert!(failure.report.stage_timings.is_empty());
    }

    #[test]
    fn test_partial_report_on_mid_pipeline_failure() {
        // Start the sequence at the illumination stage and feed it a
        // color buffer: the failure must name that stage, and the report
        // must contain nothing from later stages.
        let pipeline = Pipeline::with_stages(
            PipelineConfig::default(),
            vec![
                Box::new(IlluminationStage),
                Box::new(DeskewStage),
                Box::new(BinarizeStage),
                Box::new(ValidateStage),
            ],
        )
        .unwrap();

        let color = PixelBuffer::from_raw(32, 32, 3, vec![200; 3072]).unwrap();
        let failure = pipeline.run(color).unwrap_err();

        assert_eq!(failure.stage, PipelineState::CorrectingIllumination);
        assert!(failure.report.skew_angle_degrees.is_none());
        assert!(failure.report.quality.is_none());
    }

    #[test]
    fn test_thickening_keeps_output_binary() {
        let mut config = PipelineConfig::default();
        config.morphology.thicken_strokes = true;

        let pipeline = Pipeline::new(config).unwrap();
        let enhanced = pipeline.run(PixelBuffer::filled(64, 64, 255).unwrap()).unwrap();
        assert!(enhanced.buffer.is_binary());
    }
}
