//! Finishing adjustments applied to a transfer result
//!
//! Brightness, contrast, saturation and temperature are slider values in
//! [-100, 100], with 0 meaning "leave alone". Each one maps onto a color
//! matrix in the style of the CSS filter functions:
//!
//! | Slider | Filter |
//! |---|---|
//! | brightness `b` | `brightness(1 + b/100)` |
//! | contrast `c` | `contrast(1 + c/100)` |
//! | saturation `s` | `saturate(1 + s/100)` |
//! | temperature `t` | `sepia(abs(t)/200)` then `hue-rotate(t/5 deg)` |
//!
//! The matrices run in that order on normalized sRGB values, clamping to
//! [0, 1] after each one, and the result is rounded back to bytes.

use rayon::prelude::*;

use crate::buffer::{PixelBuffer, CHANNELS};
use crate::config::Adjustments;
use crate::constants::adjust::{HUE_DEGREES_PER_STEP, SEPIA_STEPS, SLIDER_STEPS};
use crate::error::Result;
use crate::parallel;

/// Affine color transform: three rows of `[r, g, b, offset]`
type ColorMatrix = [[f32; 4]; 3];

// Rec. 709 luma weights used by the CSS saturate and hue-rotate matrices
const LUMA: [f32; 3] = [0.213, 0.715, 0.072];

/// Applies a fixed set of [`Adjustments`] to device images
#[derive(Debug, Clone)]
pub struct ColorAdjuster {
    matrices: Vec<ColorMatrix>,
}

impl ColorAdjuster {
    /// Build the matrix chain for `adjustments`
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidParameter` if a slider is outside [-100, 100]
    pub fn new(adjustments: &Adjustments) -> Result<Self> {
        adjustments.validate()?;

        let mut matrices = Vec::new();
        if adjustments.brightness != 0 {
            matrices.push(brightness(1.0 + adjustments.brightness as f32 / SLIDER_STEPS));
        }
        if adjustments.contrast != 0 {
            matrices.push(contrast(1.0 + adjustments.contrast as f32 / SLIDER_STEPS));
        }
        if adjustments.saturation != 0 {
            matrices.push(saturate(1.0 + adjustments.saturation as f32 / SLIDER_STEPS));
        }
        if adjustments.temperature != 0 {
            let t = adjustments.temperature as f32;
            matrices.push(sepia(t.abs() / SEPIA_STEPS));
            matrices.push(hue_rotate(t * HUE_DEGREES_PER_STEP));
        }
        Ok(Self { matrices })
    }

    /// True when every slider is at 0
    pub fn is_identity(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Adjust every pixel of `image`
    pub fn apply(&self, image: &PixelBuffer) -> Result<PixelBuffer> {
        if self.is_identity() {
            return Ok(image.clone());
        }

        let adjust = |p: &[u8]| self.adjust_pixel([p[0], p[1], p[2]]);
        let pixels: Vec<[u8; 3]> = if parallel::should_parallelize(image.pixel_count()) {
            image.as_raw().par_chunks_exact(CHANNELS).map(adjust).collect()
        } else {
            image.as_raw().chunks_exact(CHANNELS).map(adjust).collect()
        };

        PixelBuffer::new(
            image.width(),
            image.height(),
            pixels.into_iter().flatten().collect(),
        )
    }

    fn adjust_pixel(&self, rgb: [u8; 3]) -> [u8; 3] {
        let mut v = rgb.map(|c| c as f32 / 255.0);
        for m in &self.matrices {
            v = [0, 1, 2].map(|row| {
                let r = m[row];
                (r[0] * v[0] + r[1] * v[1] + r[2] * v[2] + r[3]).clamp(0.0, 1.0)
            });
        }
        v.map(|c| (c * 255.0).round() as u8)
    }
}

fn brightness(amount: f32) -> ColorMatrix {
    [
        [amount, 0.0, 0.0, 0.0],
        [0.0, amount, 0.0, 0.0],
        [0.0, 0.0, amount, 0.0],
    ]
}

fn contrast(amount: f32) -> ColorMatrix {
    let offset = 0.5 - 0.5 * amount;
    [
        [amount, 0.0, 0.0, offset],
        [0.0, amount, 0.0, offset],
        [0.0, 0.0, amount, offset],
    ]
}

fn saturate(s: f32) -> ColorMatrix {
    let [lr, lg, lb] = LUMA;
    [
        [lr + (1.0 - lr) * s, lg - lg * s, lb - lb * s, 0.0],
        [lr - lr * s, lg + (1.0 - lg) * s, lb - lb * s, 0.0],
        [lr - lr * s, lg - lg * s, lb + (1.0 - lb) * s, 0.0],
    ]
}

fn sepia(amount: f32) -> ColorMatrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k, 0.0],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k, 0.0],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k, 0.0],
    ]
}

fn hue_rotate(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let [lr, lg, lb] = LUMA;
    [
        [
            lr + cos * (1.0 - lr) - sin * lr,
            lg - cos * lg - sin * lg,
            lb - cos * lb + sin * (1.0 - lb),
            0.0,
        ],
        [
            lr - cos * lr + sin * 0.143,
            lg + cos * (1.0 - lg) + sin * 0.140,
            lb - cos * lb - sin * 0.283,
            0.0,
        ],
        [
            lr - cos * lr - sin * (1.0 - lr),
            lg - cos * lg + sin * lg,
            lb + cos * (1.0 - lb) + sin * lb,
            0.0,
        ],
    ]
}
