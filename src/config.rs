//! # Pipeline Configuration
//!
//! This module defines the per-stage configuration structures for the
//! enhancement pipeline. Every parameter has a validated legal range;
//! [`PipelineConfig::validate`] runs before the first stage executes so
//! that out-of-range values are rejected eagerly, never mid-pipeline.

use serde::{Deserialize, Serialize};

use crate::errors::{EnhanceError, EnhanceResult};

/// Noise reduction settings for the bilateral smoothing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenoiseConfig {
    /// Neighbourhood radius in pixels. Must be at least 1 and no larger
    /// than half the smaller image dimension (the latter is checked
    /// against the actual image when the stage runs).
    pub kernel_radius: u32,
    /// Standard deviation of the intensity (range) Gaussian. Neighbours
    /// whose intensity differs from the centre by more than a few sigmas
    /// contribute almost nothing, which is what preserves stroke edges.
    pub intensity_sigma: f32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            kernel_radius: 2,
            intensity_sigma: 30.0,
        }
    }
}

impl DenoiseConfig {
    /// Validate noise reduction parameters.
    pub fn validate(&self) -> EnhanceResult<()> {
        if self.kernel_radius == 0 {
            return Err(EnhanceError::invalid_parameter(
                "kernel_radius",
                self.kernel_radius,
                "must be at least 1",
            ));
        }
        if !(self.intensity_sigma > 0.0 && self.intensity_sigma <= 255.0) {
            return Err(EnhanceError::invalid_parameter(
                "intensity_sigma",
                self.intensity_sigma,
                "must be in (0, 255]",
            ));
        }
        Ok(())
    }
}

/// Illumination correction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IlluminationConfig {
    /// The background blur radius is `min(width, height) / background_divisor`.
    pub background_divisor: u32,
    /// Lower bound on the background blur radius in pixels.
    pub min_background_radius: u32,
}

impl Default for IlluminationConfig {
    fn default() -> Self {
        Self {
            background_divisor: 8,
            min_background_radius: 15,
        }
    }
}

impl IlluminationConfig {
    /// Validate illumination correction parameters.
    pub fn validate(&self) -> EnhanceResult<()> {
        if self.background_divisor == 0 {
            return Err(EnhanceError::invalid_parameter(
                "background_divisor",
                self.background_divisor,
                "must be at least 1",
            ));
        }
        if self.min_background_radius == 0 {
            return Err(EnhanceError::invalid_parameter(
                "min_background_radius",
                self.min_background_radius,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Skew detection and correction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskewConfig {
    /// Half-width of the angle search range in degrees (candidates span
    /// `[-max_angle_degrees, +max_angle_degrees]`).
    pub max_angle_degrees: f32,
    /// Angular resolution of the search in degrees.
    pub angle_step_degrees: f32,
    /// Pages whose provisional ink ratio falls below this fraction are
    /// treated as near-blank: rotation is skipped and angle 0 recorded.
    pub min_ink_ratio: f32,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            max_angle_degrees: 15.0,
            angle_step_degrees: 0.25,
            min_ink_ratio: 0.001,
        }
    }
}

impl DeskewConfig {
    /// Validate skew correction parameters.
    pub fn validate(&self) -> EnhanceResult<()> {
        if !(self.max_angle_degrees > 0.0 && self.max_angle_degrees <= 45.0) {
            return Err(EnhanceError::invalid_parameter(
                "max_angle_degrees",
                self.max_angle_degrees,
                "must be in (0, 45]",
            ));
        }
        if !(self.angle_step_degrees > 0.0 && self.angle_step_degrees <= self.max_angle_degrees) {
            return Err(EnhanceError::invalid_parameter(
                "angle_step_degrees",
                self.angle_step_degrees,
                "must be positive and no larger than max_angle_degrees",
            ));
        }
        if !(0.0..1.0).contains(&self.min_ink_ratio) {
            return Err(EnhanceError::invalid_parameter(
                "min_ink_ratio",
                self.min_ink_ratio,
                "must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// Adaptive binarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinarizeConfig {
    /// Side length of the square local-mean window. Must be odd, at least
    /// 3, and no larger than the smaller image dimension (the latter is
    /// checked against the actual image when the stage runs).
    pub window_size: u32,
    /// Sensitivity constant: a pixel is classified as ink when its
    /// intensity is below the local mean minus this value.
    pub sensitivity: f32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            window_size: 25,
            sensitivity: 15.0,
        }
    }
}

impl BinarizeConfig {
    /// Validate binarization parameters.
    pub fn validate(&self) -> EnhanceResult<()> {
        if self.window_size < 3 {
            return Err(EnhanceError::invalid_parameter(
                "window_size",
                self.window_size,
                "must be at least 3",
            ));
        }
        if self.window_size % 2 == 0 {
            return Err(EnhanceError::invalid_parameter(
                "window_size",
                self.window_size,
                "must be odd",
            ));
        }
        if !(0.0..=128.0).contains(&self.sensitivity) {
            return Err(EnhanceError::invalid_parameter(
                "sensitivity",
                self.sensitivity,
                "must be in [0, 128]",
            ));
        }
        Ok(())
    }
}

/// Post-binarization stroke thickening settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphologyConfig {
    /// When true, ink strokes are dilated after binarization to bolden
    /// thin glyphs. Off by default.
    pub thicken_strokes: bool,
    /// Number of dilation passes applied when thickening is enabled.
    pub thicken_passes: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            thicken_strokes: false,
            thicken_passes: 1,
        }
    }
}

impl MorphologyConfig {
    /// Validate stroke thickening parameters.
    pub fn validate(&self) -> EnhanceResult<()> {
        if !(1..=4).contains(&self.thicken_passes) {
            return Err(EnhanceError::invalid_parameter(
                "thicken_passes",
                self.thicken_passes,
                "must be in [1, 4]",
            ));
        }
        Ok(())
    }
}

/// Quality validation thresholds.
///
/// These bound the advisory "likely OCR-ready" verdict; they never cause
/// a pipeline failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Minimum plausible ink fraction for a readable page.
    pub min_ink_ratio: f32,
    /// Maximum plausible ink fraction before the page reads as smeared.
    pub max_ink_ratio: f32,
    /// Minimum connected-component count for a non-blank page.
    pub min_component_count: usize,
    /// Lower bound of the plausible character band, as a fraction of the
    /// image area (floored at 4 pixels).
    pub min_median_area_fraction: f64,
    /// Upper bound of the plausible character band, as a fraction of the
    /// image area.
    pub max_median_area_fraction: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_ink_ratio: 0.003,
            max_ink_ratio: 0.40,
            min_component_count: 5,
            min_median_area_fraction: 1.0 / 100_000.0,
            max_median_area_fraction: 1.0 / 50.0,
        }
    }
}

impl QualityConfig {
    /// Validate quality thresholds.
    pub fn validate(&self) -> EnhanceResult<()> {
        if !(0.0..=1.0).contains(&self.min_ink_ratio) {
            return Err(EnhanceError::invalid_parameter(
                "min_ink_ratio",
                self.min_ink_ratio,
                "must be in [0, 1]",
            ));
        }
        if !(self.max_ink_ratio > self.min_ink_ratio && self.max_ink_ratio <= 1.0) {
            return Err(EnhanceError::invalid_parameter(
                "max_ink_ratio",
                self.max_ink_ratio,
                "must be greater than min_ink_ratio and at most 1",
            ));
        }
        if self.min_component_count == 0 {
            return Err(EnhanceError::invalid_parameter(
                "min_component_count",
                self.min_component_count,
                "must be at least 1",
            ));
        }
        if !(self.min_median_area_fraction > 0.0
            && self.min_median_area_fraction < self.max_median_area_fraction
            && self.max_median_area_fraction < 1.0)
        {
            return Err(EnhanceError::invalid_parameter(
                "max_median_area_fraction",
                self.max_median_area_fraction,
                "median area fractions must satisfy 0 < min < max < 1",
            ));
        }
        Ok(())
    }
}

/// Complete configuration for one pipeline run.
///
/// # Examples
///
/// ```
/// use page_prep::PipelineConfig;
///
/// let mut config = PipelineConfig::default();
/// config.binarize.window_size = 31;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub denoise: DenoiseConfig,
    pub illumination: IlluminationConfig,
    pub deskew: DeskewConfig,
    pub binarize: BinarizeConfig,
    pub morphology: MorphologyConfig,
    pub quality: QualityConfig,
}

impl PipelineConfig {
    /// Validate every stage's parameters.
    ///
    /// Called by the orchestrator before the first stage runs, so a bad
    /// value can never abort a run halfway through.
    pub fn validate(&self) -> EnhanceResult<()> {
        self.denoise.validate()?;
        self.illumination.validate()?;
        self.deskew.validate()?;
        self.binarize.validate()?;
        self.morphology.validate()?;
        self.quality.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_denoise_rejects_zero_radius() {
        let config = DenoiseConfig {
            kernel_radius: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            EnhanceError::InvalidParameter {
                parameter: "kernel_radius",
                ..
            }
        ));
    }

    #[test]
    fn test_binarize_rejects_even_window() {
        let config = BinarizeConfig {
            window_size: 24,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            EnhanceError::InvalidParameter {
                parameter: "window_size",
                ..
            }
        ));
    }

    #[test]
    fn test_binarize_rejects_tiny_window() {
        let config = BinarizeConfig {
            window_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deskew_rejects_step_wider_than_range() {
        let config = DeskewConfig {
            max_angle_degrees: 5.0,
            angle_step_degrees: 6.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quality_rejects_inverted_ink_bounds() {
        let config = QualityConfig {
            min_ink_ratio: 0.5,
            max_ink_ratio: 0.4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_validate_surfaces_stage_error() {
        let mut config = PipelineConfig::default();
        config.binarize.window_size = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.binarize.window_size, config.binarize.window_size);
        assert_eq!(back.deskew.max_angle_degrees, config.deskew.max_angle_degrees);
    }
}
