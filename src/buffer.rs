//! Pixel containers shared by every pipeline stage
//!
//! [`PixelBuffer`] holds interleaved 8-bit RGB device values, [`LabPlanes`]
//! holds the planar perceptual representation used while computing.

use crate::error::{Result, TransferError};

/// Channels per pixel in device space
pub const CHANNELS: usize = 3;

/// Row-major grid of 8-bit RGB pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer from interleaved RGB bytes
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidBuffer` if either dimension is zero or
    /// `data.len() != width * height * 3`
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::from_raw(width, height, CHANNELS, data)
    }

    /// Create a buffer from raw bytes with an explicit channel count
    ///
    /// Only 3-channel input is accepted; anything else is rejected rather
    /// than converted.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TransferError::invalid_buffer(format!(
                "dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if channels != CHANNELS {
            return Err(TransferError::invalid_buffer(format!(
                "expected {} channels, got {}",
                CHANNELS, channels
            )));
        }
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(TransferError::invalid_buffer(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer where every pixel has the same color
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Result<Self> {
        let len = byte_len(width, height)?;
        let data = rgb.iter().copied().cycle().take(len).collect();
        Self::new(width, height, data)
    }

    /// Create a buffer by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        let mut data = Vec::with_capacity(byte_len(width, height)?);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// RGB value at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let idx = (y * self.width + x) * CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Iterate over pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Interleaved RGB bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Fail with `InvalidBuffer` unless `other` has the same width and height
    pub fn ensure_same_dimensions(&self, other: &PixelBuffer, context: &str) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(TransferError::invalid_buffer(format!(
                "{}: dimension mismatch {}x{} vs {}x{}",
                context, self.width, self.height, other.width, other.height
            )));
        }
        Ok(())
    }
}

/// Byte length of a `width * height` RGB buffer
fn byte_len(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| {
            TransferError::invalid_buffer(format!("dimensions {}x{} overflow", width, height))
        })
}

/// Planar perceptual image: lightness plus two chroma planes
///
/// Values use the 8-bit scaled Lab encoding described in
/// [`crate::constants::lab`], stored as `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabPlanes {
    width: usize,
    height: usize,
    lightness: Vec<f32>,
    a: Vec<f32>,
    b: Vec<f32>,
}

impl LabPlanes {
    /// Assemble planes, checking that each one covers `width * height` pixels
    pub fn from_planes(
        width: usize,
        height: usize,
        lightness: Vec<f32>,
        a: Vec<f32>,
        b: Vec<f32>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TransferError::invalid_buffer(format!(
                "dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let expected = width * height;
        for (name, plane) in [("lightness", &lightness), ("a", &a), ("b", &b)] {
            if plane.len() != expected {
                return Err(TransferError::invalid_buffer(format!(
                    "{} plane has {} values, expected {}",
                    name,
                    plane.len(),
                    expected
                )));
            }
        }

        Ok(Self {
            width,
            height,
            lightness,
            a,
            b,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn lightness(&self) -> &[f32] {
        &self.lightness
    }

    pub fn a(&self) -> &[f32] {
        &self.a
    }

    pub fn b(&self) -> &[f32] {
        &self.b
    }

    /// `[L, a, b]` of pixel `index` in row-major order
    pub fn get(&self, index: usize) -> [f32; 3] {
        [self.lightness[index], self.a[index], self.b[index]]
    }

    /// Split into `(lightness, a, b)` planes
    pub fn into_planes(self) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        (self.lightness, self.a, self.b)
    }

    /// True if every value in every plane is finite
    pub fn is_finite(&self) -> bool {
        self.lightness
            .iter()
            .chain(&self.a)
            .chain(&self.b)
            .all(|v| v.is_finite())
    }
}
