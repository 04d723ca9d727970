//! Chroma moment matching
//!
//! Re-centers and re-scales each chroma plane of the source toward the
//! reference's mean and standard deviation, then mixes the result with the
//! original chroma by `alpha`. Lightness is never touched here.

use crate::buffer::LabPlanes;
use crate::color::{ChannelStats, LabStats};
use crate::config::validate_unit;
use crate::constants::defaults::STD_EPSILON;
use crate::constants::lab::{CHANNEL_MAX, CHANNEL_MIN};
use crate::error::{Result, TransferError};

/// Statistical chroma transfer with partial blending
#[derive(Debug, Clone)]
pub struct MomentMatcher {
    alpha: f32,
    epsilon: f32,
}

impl MomentMatcher {
    /// Create a matcher with blend strength `alpha` in [0, 1]
    pub fn new(alpha: f32) -> Result<Self> {
        validate_unit("alpha", alpha)?;
        Ok(Self {
            alpha,
            epsilon: STD_EPSILON,
        })
    }

    /// Override the floor applied to the source standard deviation
    pub fn with_epsilon(mut self, epsilon: f32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(TransferError::invalid_parameter("epsilon", epsilon));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Match a single value
    #[inline]
    pub fn match_value(&self, v: f32, source: &ChannelStats, reference: &ChannelStats) -> f32 {
        let scale = reference.std_dev / source.std_dev_floored(self.epsilon);
        let matched = (v - source.mean) * scale + reference.mean;
        matched * self.alpha + v * (1.0 - self.alpha)
    }

    /// Match every value of one chroma plane
    pub fn match_channel(
        &self,
        values: &[f32],
        source: &ChannelStats,
        reference: &ChannelStats,
    ) -> Vec<f32> {
        values
            .iter()
            .map(|&v| self.match_value(v, source, reference))
            .collect()
    }

    /// Match both chroma planes of `source` and pass lightness through.
    ///
    /// The matched chroma is clamped to the encoded channel range and
    /// truncated to whole encoding steps; lightness is returned bit-for-bit.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ProcessingError` if matching yields a
    /// non-finite value.
    pub fn apply(
        &self,
        source: &LabPlanes,
        source_stats: &LabStats,
        reference_stats: &LabStats,
    ) -> Result<LabPlanes> {
        let a = self.match_channel(source.a(), &source_stats.a, &reference_stats.a);
        let b = self.match_channel(source.b(), &source_stats.b, &reference_stats.b);

        if a.iter().chain(&b).any(|v| !v.is_finite()) {
            return Err(TransferError::processing(
                "moment matching produced a non-finite chroma value",
            ));
        }

        let quantize = |v: f32| v.clamp(CHANNEL_MIN, CHANNEL_MAX).trunc();
        let (width, height) = source.dimensions();
        LabPlanes::from_planes(
            width,
            height,
            source.lightness().to_vec(),
            a.into_iter().map(quantize).collect(),
            b.into_iter().map(quantize).collect(),
        )
    }
}
