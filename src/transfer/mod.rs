//! Color transfer pipeline
//!
//! Runs the stages strictly in order:
//!
//! 1. source and reference to Lab ([`ColorConverter`])
//! 2. per-plane statistics ([`LabStats`])
//! 3. chroma moment matching, lightness untouched ([`MomentMatcher`])
//! 4. back to RGB, re-read as Lab, CLAHE on lightness ([`LocalContrastEnhancer`])
//! 5. blend with the untouched source ([`FinalBlender`])
//!
//! A failing stage aborts the run; no partial image is returned.

pub mod blend;
pub mod clahe;
pub mod matcher;

pub use blend::FinalBlender;
pub use clahe::LocalContrastEnhancer;
pub use matcher::MomentMatcher;

use log::debug;
use serde::Serialize;

use crate::buffer::PixelBuffer;
use crate::color::{ColorConverter, LabStats};
use crate::config::TransferParameters;
use crate::error::Result;

/// Intermediate results of one transfer run
#[derive(Debug, Clone)]
pub struct TransferStages {
    /// Statistics of the source planes
    pub source_stats: LabStats,
    /// Statistics of the reference planes
    pub reference_stats: LabStats,
    /// Moment-matched image, before contrast enhancement
    pub matched: PixelBuffer,
    /// Matched image after CLAHE on lightness
    pub enhanced: PixelBuffer,
    /// Final blended output
    pub output: PixelBuffer,
}

/// Summary of a run, suitable for logging or JSON output
#[derive(Debug, Clone, Serialize)]
pub struct TransferSummary {
    pub width: usize,
    pub height: usize,
    pub source_stats: LabStats,
    pub reference_stats: LabStats,
}

impl TransferStages {
    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            width: self.output.width(),
            height: self.output.height(),
            source_stats: self.source_stats,
            reference_stats: self.reference_stats,
        }
    }
}

/// Configured transfer pipeline
///
/// Holds no per-run state, so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ColorTransfer {
    params: TransferParameters,
    converter: ColorConverter,
    matcher: MomentMatcher,
    enhancer: LocalContrastEnhancer,
    blender: FinalBlender,
}

impl ColorTransfer {
    /// Build the pipeline, validating `params`
    pub fn new(params: TransferParameters) -> Result<Self> {
        params.validate()?;
        let converter = ColorConverter::new();
        Ok(Self {
            matcher: MomentMatcher::new(params.alpha)?,
            enhancer: LocalContrastEnhancer::with_converter(
                params.clip_limit,
                params.tile_grid,
                converter.clone(),
            )?,
            blender: FinalBlender::new(params.final_blend_weight)?,
            converter,
            params,
        })
    }

    pub fn params(&self) -> &TransferParameters {
        &self.params
    }

    /// Restyle `source` toward the colors of `reference`
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidBuffer` if the buffers differ in size;
    /// the reference must be resized by the caller beforehand.
    pub fn run(&self, source: &PixelBuffer, reference: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(self.run_with_stages(source, reference)?.output)
    }

    /// Like [`ColorTransfer::run`], also returning every intermediate stage
    pub fn run_with_stages(
        &self,
        source: &PixelBuffer,
        reference: &PixelBuffer,
    ) -> Result<TransferStages> {
        source.ensure_same_dimensions(reference, "source and reference")?;
        let (width, height) = source.dimensions();
        debug!("color transfer on {}x{} with {:?}", width, height, self.params);

        let source_lab = self.converter.to_perceptual(source)?;
        let reference_lab = self.converter.to_perceptual(reference)?;

        let source_stats = LabStats::from_planes(&source_lab)?;
        let reference_stats = LabStats::from_planes(&reference_lab)?;
        debug!(
            "chroma stats: source a={:?} b={:?}, reference a={:?} b={:?}",
            source_stats.a, source_stats.b, reference_stats.a, reference_stats.b
        );

        let matched_lab = self.matcher.apply(&source_lab, &source_stats, &reference_stats)?;
        let matched = self.converter.to_device(&matched_lab)?;

        let enhanced = self.enhancer.enhance(&matched)?;
        let output = self.blender.blend(&enhanced, source)?;
        debug!("color transfer finished");

        Ok(TransferStages {
            source_stats,
            reference_stats,
            matched,
            enhanced,
            output,
        })
    }
}

/// Restyle `source` toward `reference` with the given parameters
///
/// Convenience wrapper around [`ColorTransfer`].
pub fn transfer(
    source: &PixelBuffer,
    reference: &PixelBuffer,
    params: &TransferParameters,
) -> Result<PixelBuffer> {
    ColorTransfer::new(params.clone())?.run(source, reference)
}
