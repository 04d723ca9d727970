//! Configuration structures for style_grader.
//!
//! [`TransferParameters`] tunes the color transfer itself and is all the core
//! needs. [`ServiceConfig`] carries the directories and limits of the upload
//! layer around it, so none of that lives in process-wide state.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use style_grader::ServiceConfig;
//! use std::path::Path;
//!
//! // Load from file; missing fields take their defaults
//! let config = ServiceConfig::from_json_file(Path::new("stylegrade.json"))?;
//!
//! // Or use defaults
//! let config = ServiceConfig::default();
//! # Ok::<(), style_grader::TransferError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{adjust, defaults, upload};
use crate::error::{Result, TransferError};

/// CLAHE tile layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Tiles across the image width
    pub columns: usize,
    /// Tiles across the image height
    pub rows: usize,
}

impl TileGrid {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        let (columns, rows) = defaults::TILE_GRID;
        Self { columns, rows }
    }
}

/// Tunable parameters of the color transfer pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferParameters {
    /// Strength of the moment-matched chroma (0.0 = source, 1.0 = fully matched)
    pub alpha: f32,

    /// Weight of the enhanced result against the untouched source (0.0-1.0)
    pub final_blend_weight: f32,

    /// CLAHE contrast gain cap; 0.0 disables clipping
    pub clip_limit: f32,

    /// CLAHE tile grid
    pub tile_grid: TileGrid,
}

impl Default for TransferParameters {
    fn default() -> Self {
        Self {
            alpha: defaults::ALPHA,
            final_blend_weight: defaults::FINAL_BLEND_WEIGHT,
            clip_limit: defaults::CLIP_LIMIT,
            tile_grid: TileGrid::default(),
        }
    }
}

impl TransferParameters {
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_final_blend_weight(mut self, weight: f32) -> Self {
        self.final_blend_weight = weight;
        self
    }

    pub fn with_clip_limit(mut self, clip_limit: f32) -> Self {
        self.clip_limit = clip_limit;
        self
    }

    pub fn with_tile_grid(mut self, tile_grid: TileGrid) -> Self {
        self.tile_grid = tile_grid;
        self
    }

    /// Check every parameter against its valid range
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidParameter` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        validate_unit("alpha", self.alpha)?;
        validate_unit("final_blend_weight", self.final_blend_weight)?;
        if !self.clip_limit.is_finite() || self.clip_limit < 0.0 {
            return Err(TransferError::invalid_parameter("clip_limit", self.clip_limit));
        }
        if self.tile_grid.columns == 0 || self.tile_grid.rows == 0 {
            return Err(TransferError::invalid_parameter(
                "tile_grid",
                format!("{}x{}", self.tile_grid.columns, self.tile_grid.rows),
            ));
        }
        Ok(())
    }
}

/// Finishing adjustments applied after the transfer
///
/// Every slider runs from -100 to 100; 0 leaves the image unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    /// Warm (positive) or cool (negative) tint
    pub temperature: i32,
}

impl Adjustments {
    /// True when every slider is at 0
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        let sliders = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("temperature", self.temperature),
        ];
        for (name, value) in sliders {
            if !(-adjust::SLIDER_LIMIT..=adjust::SLIDER_LIMIT).contains(&value) {
                return Err(TransferError::invalid_parameter(name, value));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_unit(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(TransferError::invalid_parameter(name, value));
    }
    Ok(())
}

/// Settings for the upload/result layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory uploaded source and reference files are written to
    pub upload_dir: PathBuf,

    /// Directory result images are written to
    pub result_dir: PathBuf,

    /// Prefix joined with the result file name to form the returned URL
    pub result_url_prefix: String,

    /// Maximum accepted size of a single upload in bytes
    pub max_upload_bytes: u64,

    /// Transfer parameters applied to every request
    pub transfer: TransferParameters,

    /// Adjustments applied to every result before it is written
    pub adjustments: Adjustments,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            result_dir: PathBuf::from("static/results"),
            result_url_prefix: "static/results".to_string(),
            max_upload_bytes: upload::MAX_CONTENT_LENGTH,
            transfer: TransferParameters::default(),
            adjustments: Adjustments::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransferError::io(format!("Failed to read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TransferError::config(format!("Invalid JSON in {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TransferError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| TransferError::io(format!("Failed to write {}", path.display()), e))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(TransferError::invalid_parameter("max_upload_bytes", 0));
        }
        self.transfer.validate()?;
        self.adjustments.validate()
    }

    /// Create the upload and result directories if they do not exist
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.result_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                TransferError::io(format!("Failed to create directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    /// URL under which a result file is exposed
    pub fn result_url(&self, file_name: &str) -> String {
        let prefix = self.result_url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", prefix, file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = TransferParameters::default();
        assert_eq!(params.alpha, 0.8);
        assert_eq!(params.final_blend_weight, 0.8);
        assert_eq!(params.clip_limit, 2.0);
        assert_eq!(params.tile_grid, TileGrid::new(8, 8));
        assert!(params.validate().is_ok());
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_alpha_rejected() {
        let err = TransferParameters::default().with_alpha(1.2).validate().unwrap_err();
        assert!(matches!(
            err,
            TransferError::InvalidParameter { ref parameter, .. } if parameter == "alpha"
        ));

        let nan = TransferParameters::default().with_final_blend_weight(f32::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_clip_limit_and_grid_checks() {
        assert!(TransferParameters::default().with_clip_limit(0.0).validate().is_ok());
        assert!(TransferParameters::default().with_clip_limit(-1.0).validate().is_err());
        assert!(TransferParameters::default()
            .with_tile_grid(TileGrid::new(0, 8))
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "result_dir": "out", "transfer": { "alpha": 0.5 } }"#;
        let config: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.result_dir, PathBuf::from("out"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.transfer.alpha, 0.5);
        assert_eq!(config.transfer.final_blend_weight, 0.8);
        assert!(config.adjustments.is_neutral());
    }

    #[test]
    fn test_adjustments_from_json() {
        let json = r#"{ "adjustments": { "brightness": 20, "temperature": -35 } }"#;
        let config: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.adjustments.brightness, 20);
        assert_eq!(config.adjustments.temperature, -35);
        assert_eq!(config.adjustments.contrast, 0);
        assert!(!config.adjustments.is_neutral());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_adjustment_range_checked() {
        let config = ServiceConfig {
            adjustments: Adjustments {
                contrast: -101,
                ..Adjustments::default()
            },
            ..ServiceConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TransferError::InvalidParameter { .. }));
        assert!(Adjustments {
            brightness: 100,
            temperature: -100,
            ..Adjustments::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("style_grader_config_{}.json", std::process::id()));
        let config = ServiceConfig {
            max_upload_bytes: 1024,
            ..ServiceConfig::default()
        };
        config.to_json_file(&path).unwrap();
        let loaded = ServiceConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_result_url() {
        let config = ServiceConfig::default();
        assert_eq!(config.result_url("result_00.jpg"), "static/results/result_00.jpg");

        let bare = ServiceConfig {
            result_url_prefix: String::new(),
            ..ServiceConfig::default()
        };
        assert_eq!(bare.result_url("a.jpg"), "a.jpg");
    }
}
