//! # Style Grader
//!
//! Statistical color-style transfer between two images.
//!
//! Given a source and a reference image of the same size, the source is
//! restyled so its color distribution resembles the reference while its
//! lightness structure is kept:
//! - Both images are converted to CIE L*a*b*
//! - The source chroma planes are moment-matched to the reference, blended by `alpha`
//! - Local contrast of the lightness channel is equalized tile-wise (CLAHE)
//! - The result is blended back toward the untouched source
//!
//! Optional finishing adjustments (brightness, contrast, saturation,
//! temperature) can be applied to the result through [`adjust`].
//!
//! The transfer itself is a pure function over in-memory buffers. Decoding,
//! resizing, upload validation and result storage live in [`image_loader`],
//! [`upload`] and [`service`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use style_grader::{image_loader, transfer, TransferParameters};
//! use std::path::Path;
//!
//! let source = image_loader::load_image(Path::new("photo.jpg"))?;
//! let reference = image_loader::load_image(Path::new("mood.png"))?;
//! let reference = image_loader::resize_to(&reference, source.width(), source.height())?;
//!
//! let result = transfer(&source, &reference, &TransferParameters::default())?;
//! image_loader::save_image(&result, Path::new("graded.jpg"))?;
//! # Ok::<(), style_grader::TransferError>(())
//! ```

pub mod adjust;
pub mod buffer;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod image_loader;
pub mod parallel;
pub mod service;
pub mod transfer;
pub mod upload;

pub use adjust::ColorAdjuster;
pub use buffer::{LabPlanes, PixelBuffer};
pub use color::{ChannelStats, ColorConverter, LabStats};
pub use config::{Adjustments, ServiceConfig, TileGrid, TransferParameters};
pub use error::{Result, TransferError};
pub use service::{ProcessResponse, ProcessedImage, StyleGradeService, Upload};
pub use transfer::{
    transfer, ColorTransfer, FinalBlender, LocalContrastEnhancer, MomentMatcher, TransferStages,
    TransferSummary,
};
