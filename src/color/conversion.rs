//! Color space conversion utilities
//!
//! Converts between 8-bit sRGB device values and CIE L*a*b* (D65), both per
//! pixel and for whole buffers. Buffer-level conversion uses the 8-bit scaled
//! Lab encoding from [`crate::constants::lab`] so that lightness and both
//! chroma planes share the [0, 255] range.

use palette::{FromColor, Lab, Srgb};

use crate::buffer::{LabPlanes, PixelBuffer, CHANNELS};
use crate::constants::lab::{CHANNEL_MAX, CHANNEL_MIN, CHROMA_OFFSET, LIGHTNESS_SCALE};
use crate::constants::performance::PARALLEL_THRESHOLD;
use crate::error::{Result, TransferError};
use crate::parallel;

/// sRGB <-> Lab converter
#[derive(Debug, Clone)]
pub struct ColorConverter {
    /// Pixel count from which buffer conversions run on the rayon pool
    parallel_threshold: usize,
}

impl Default for ColorConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorConverter {
    pub fn new() -> Self {
        Self {
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }

    /// Override the pixel count from which conversions go parallel
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Convert RGB (0-255) to Lab color space
    pub fn rgb_to_lab(&self, r: u8, g: u8, b: u8) -> Lab {
        let srgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        Lab::from_color(srgb)
    }

    /// Convert Lab to 8-bit RGB, clamping out-of-gamut values
    pub fn lab_to_rgb(&self, lab: Lab) -> [u8; 3] {
        let srgb: Srgb<f32> = Srgb::from_color(lab);
        [
            (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
            (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
            (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// Scale a Lab color into the 8-bit encoding
    pub fn encode_lab(&self, lab: Lab) -> [f32; 3] {
        [
            lab.l * LIGHTNESS_SCALE,
            lab.a + CHROMA_OFFSET,
            lab.b + CHROMA_OFFSET,
        ]
    }

    /// Inverse of [`ColorConverter::encode_lab`]
    pub fn decode_lab(&self, encoded: [f32; 3]) -> Lab {
        Lab::new(
            encoded[0] / LIGHTNESS_SCALE,
            encoded[1] - CHROMA_OFFSET,
            encoded[2] - CHROMA_OFFSET,
        )
    }

    /// Convert a device buffer to encoded Lab planes
    pub fn to_perceptual(&self, image: &PixelBuffer) -> Result<LabPlanes> {
        let (width, height) = image.dimensions();
        let parallel = image.pixel_count() >= self.parallel_threshold;

        let encoded = parallel::map_chunks(image.as_raw(), CHANNELS, parallel, |p| {
            self.encode_lab(self.rgb_to_lab(p[0], p[1], p[2]))
        });

        let mut lightness = Vec::with_capacity(encoded.len());
        let mut a = Vec::with_capacity(encoded.len());
        let mut b = Vec::with_capacity(encoded.len());
        for [l, ca, cb] in encoded {
            lightness.push(l);
            a.push(ca);
            b.push(cb);
        }

        LabPlanes::from_planes(width, height, lightness, a, b)
    }

    /// Convert encoded Lab planes back to a device buffer
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ProcessingError` if any plane holds NaN or an
    /// infinite value.
    pub fn to_device(&self, planes: &LabPlanes) -> Result<PixelBuffer> {
        if !planes.is_finite() {
            return Err(TransferError::processing(
                "non-finite value in Lab planes before inverse conversion",
            ));
        }

        let (width, height) = planes.dimensions();
        let count = width * height;
        let parallel = count >= self.parallel_threshold;

        let pixels = parallel::map_range(count, parallel, |i| {
            let [l, a, b] = planes.get(i);
            self.lab_to_rgb(self.decode_lab([
                l.clamp(CHANNEL_MIN, CHANNEL_MAX),
                a.clamp(CHANNEL_MIN, CHANNEL_MAX),
                b.clamp(CHANNEL_MIN, CHANNEL_MAX),
            ]))
        });

        PixelBuffer::new(width, height, pixels.into_iter().flatten().collect())
    }
}
