//! Image decoding, encoding and resizing
//!
//! Bridges files and byte streams to [`PixelBuffer`] through the `image`
//! crate. Only PNG and JPEG are accepted, matching the upload layer.
//!
//! ## Design
//!
//! Every decoded image is converted to 8-bit RGB, whatever its source
//! layout (gray, RGBA, 16-bit). Alpha is dropped.

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::constants::upload::ALLOWED_EXTENSIONS;
use crate::error::{Result, TransferError};

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?;
        Self::from_extension_str(ext)
    }

    /// Detect format from a bare extension such as `"JPG"`
    pub fn from_extension_str(ext: &str) -> Option<ImageFormat> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Load an image from disk as an RGB pixel buffer
///
/// The extension only gates which files are accepted; the decoder is picked
/// from the file contents, so a PNG saved as `.jpg` still loads.
///
/// # Errors
///
/// Returns `TransferError::ImageLoadError` if:
/// - The extension is not png, jpg or jpeg
/// - File cannot be opened
/// - Decoding fails
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    if ImageFormat::from_extension(path).is_none() {
        return Err(TransferError::ImageLoadError {
            message: format!("Unsupported image format for file: {}", path.display()),
            source: None,
        });
    }

    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| {
            TransferError::image_load(format!("Failed to open image file: {}", path.display()), e)
        })?;

    let img = reader.decode().map_err(|e| {
        TransferError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    from_dynamic(img)
}

/// Decode an in-memory PNG or JPEG
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| TransferError::image_load("Failed to decode image data", e))?;
    from_dynamic(img)
}

/// Encode a buffer to disk; the format follows the path's extension
pub fn save_image(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let format = ImageFormat::from_extension(path).ok_or_else(|| TransferError::ImageSaveError {
        message: format!("Unsupported output format for file: {}", path.display()),
        source: None,
    })?;

    to_rgb_image(buffer)?
        .save_with_format(path, format.codec())
        .map_err(|e| {
            TransferError::image_save(format!("Failed to write image: {}", path.display()), e)
        })
}

/// Resize with a bilinear (triangle) filter
pub fn resize_to(buffer: &PixelBuffer, width: usize, height: usize) -> Result<PixelBuffer> {
    if buffer.dimensions() == (width, height) {
        return Ok(buffer.clone());
    }
    let (w, h) = to_u32_dimensions(width, height)?;
    let resized = image::imageops::resize(&to_rgb_image(buffer)?, w, h, FilterType::Triangle);
    from_rgb_image(resized)
}

/// Convert a pixel buffer into an `image` RGB image
pub fn to_rgb_image(buffer: &PixelBuffer) -> Result<RgbImage> {
    let (w, h) = to_u32_dimensions(buffer.width(), buffer.height())?;
    RgbImage::from_raw(w, h, buffer.as_raw().to_vec()).ok_or_else(|| {
        TransferError::invalid_buffer(format!("buffer does not fill a {}x{} RGB image", w, h))
    })
}

/// Convert an `image` RGB image into a pixel buffer
pub fn from_rgb_image(img: RgbImage) -> Result<PixelBuffer> {
    let (width, height) = img.dimensions();
    PixelBuffer::new(width as usize, height as usize, img.into_raw())
}

fn from_dynamic(img: DynamicImage) -> Result<PixelBuffer> {
    from_rgb_image(img.to_rgb8())
}

fn to_u32_dimensions(width: usize, height: usize) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(TransferError::invalid_buffer(format!(
            "unsupported image dimensions {}x{}",
            width, height
        ))),
    }
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &ALLOWED_EXTENSIONS
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    ImageFormat::from_extension_str(ext).is_some()
}
