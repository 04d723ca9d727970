//! Final linear blend toward the untouched source

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::config::validate_unit;
use crate::error::Result;
use crate::parallel;

/// Pixel-wise `enhanced * weight + original * (1 - weight)`
#[derive(Debug, Clone)]
pub struct FinalBlender {
    weight: f32,
}

impl FinalBlender {
    /// Create a blender giving `weight` in [0, 1] to the enhanced image
    pub fn new(weight: f32) -> Result<Self> {
        validate_unit("final_blend_weight", weight)?;
        Ok(Self { weight })
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Blend two same-sized buffers, rounding each channel to the nearest byte
    pub fn blend(&self, enhanced: &PixelBuffer, original: &PixelBuffer) -> Result<PixelBuffer> {
        enhanced.ensure_same_dimensions(original, "final blend")?;

        let w = self.weight;
        let mix = |(&e, &o): (&u8, &u8)| blend_channel(e, o, w);
        let data: Vec<u8> = if parallel::should_parallelize(enhanced.pixel_count()) {
            enhanced
                .as_raw()
                .par_iter()
                .zip(original.as_raw().par_iter())
                .map(mix)
                .collect()
        } else {
            enhanced
                .as_raw()
                .iter()
                .zip(original.as_raw())
                .map(mix)
                .collect()
        };

        PixelBuffer::new(enhanced.width(), enhanced.height(), data)
    }
}

#[inline]
fn blend_channel(enhanced: u8, original: u8, weight: f32) -> u8 {
    (enhanced as f32 * weight + original as f32 * (1.0 - weight))
        .round()
        .clamp(0.0, 255.0) as u8
}
