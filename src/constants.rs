//! Default parameters and reference values for color transfer
//!
//! This module contains compile-time constants for the transfer pipeline
//! and for the image I/O layer around it.

/// Default transfer parameters
pub mod defaults {
    /// Blend strength of the moment-matched chroma against the source chroma
    pub const ALPHA: f32 = 0.8;

    /// Weight of the enhanced result against the untouched source in the last stage
    pub const FINAL_BLEND_WEIGHT: f32 = 0.8;

    /// CLAHE contrast gain cap
    pub const CLIP_LIMIT: f32 = 2.0;

    /// CLAHE tile grid (columns, rows)
    pub const TILE_GRID: (usize, usize) = (8, 8);

    /// Floor applied to the source standard deviation before dividing by it
    pub const STD_EPSILON: f32 = 1e-6;
}

/// 8-bit scaled CIE L*a*b* encoding
///
/// Lightness is stretched from [0, 100] to [0, 255] and both chroma axes are
/// offset by 128, so every channel lives in [0, 255].
pub mod lab {
    /// Multiplier from L* to encoded lightness
    pub const LIGHTNESS_SCALE: f32 = 255.0 / 100.0;

    /// Offset added to a* and b*
    pub const CHROMA_OFFSET: f32 = 128.0;

    /// Lower bound of every encoded channel
    pub const CHANNEL_MIN: f32 = 0.0;

    /// Upper bound of every encoded channel
    pub const CHANNEL_MAX: f32 = 255.0;
}

/// Contrast-limited adaptive histogram equalization
pub mod clahe {
    /// Number of histogram bins (8-bit lightness)
    pub const HISTOGRAM_BINS: usize = 256;

    /// Largest LUT output value
    pub const MAX_LEVEL: f32 = 255.0;
}

/// Finishing adjustments on the transfer result
pub mod adjust {
    /// Largest slider magnitude; sliders run from -100 to 100
    pub const SLIDER_LIMIT: i32 = 100;

    /// Slider steps per unit of filter amount
    pub const SLIDER_STEPS: f32 = 100.0;

    /// Temperature steps per unit of sepia
    pub const SEPIA_STEPS: f32 = 200.0;

    /// Hue rotation per temperature step, in degrees
    pub const HUE_DEGREES_PER_STEP: f32 = 0.2;
}

/// Upload validation limits used by the request layer
pub mod upload {
    /// Maximum accepted upload size in bytes (16 MiB)
    pub const MAX_CONTENT_LENGTH: u64 = 16 * 1024 * 1024;

    /// File extensions accepted for source and reference uploads
    pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

    /// Number of random bytes encoded into result file names
    pub const RESULT_NAME_RANDOM_BYTES: usize = 8;
}

/// Performance tuning
pub mod performance {
    /// Pixel count from which per-pixel stages switch to rayon
    pub const PARALLEL_THRESHOLD: usize = 64 * 1024;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranges() {
        assert!((0.0..=1.0).contains(&defaults::ALPHA));
        assert!((0.0..=1.0).contains(&defaults::FINAL_BLEND_WEIGHT));
        assert!(defaults::CLIP_LIMIT > 0.0);
        assert!(defaults::TILE_GRID.0 > 0 && defaults::TILE_GRID.1 > 0);
    }

    #[test]
    fn test_lab_encoding_spans_byte_range() {
        assert!((100.0 * lab::LIGHTNESS_SCALE - lab::CHANNEL_MAX).abs() < 1e-4);
        assert!(lab::CHROMA_OFFSET > lab::CHANNEL_MIN && lab::CHROMA_OFFSET < lab::CHANNEL_MAX);
    }

    #[test]
    fn test_upload_limits() {
        assert_eq!(upload::MAX_CONTENT_LENGTH, 16_777_216);
        assert!(upload::ALLOWED_EXTENSIONS.contains(&"jpeg"));
    }
}
