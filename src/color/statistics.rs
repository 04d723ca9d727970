//! Per-channel statistics over Lab planes

use serde::{Deserialize, Serialize};

use crate::buffer::LabPlanes;
use crate::error::{Result, TransferError};

/// Mean and population standard deviation of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f32,
    /// Population standard deviation; 0 for constant channels
    pub std_dev: f32,
}

impl ChannelStats {
    /// Compute statistics over every value of a channel
    ///
    /// Sums are accumulated in `f64` so large images keep their precision.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidBuffer` for an empty channel and
    /// `TransferError::ProcessingError` if the result is not finite.
    pub fn from_channel(values: &[f32]) -> Result<Self> {
        if values.is_empty() {
            return Err(TransferError::invalid_buffer(
                "cannot compute statistics of an empty channel",
            ));
        }

        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        let stats = Self {
            mean: mean as f32,
            std_dev: variance.sqrt() as f32,
        };
        if !stats.mean.is_finite() || !stats.std_dev.is_finite() {
            return Err(TransferError::processing(format!(
                "non-finite channel statistics: mean={}, std={}",
                stats.mean, stats.std_dev
            )));
        }
        Ok(stats)
    }

    /// Standard deviation floored to `epsilon`
    pub fn std_dev_floored(&self, epsilon: f32) -> f32 {
        self.std_dev.max(epsilon)
    }
}

/// Statistics for all three planes of an image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabStats {
    pub lightness: ChannelStats,
    pub a: ChannelStats,
    pub b: ChannelStats,
}

impl LabStats {
    pub fn from_planes(planes: &LabPlanes) -> Result<Self> {
        Ok(Self {
            lightness: ChannelStats::from_channel(planes.lightness())?,
            a: ChannelStats::from_channel(planes.a())?,
            b: ChannelStats::from_channel(planes.b())?,
        })
    }
}
