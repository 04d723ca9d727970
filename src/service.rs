//! Request processing around the transfer core
//!
//! Takes two uploaded files, validates them, archives them under unique
//! names, decodes them from memory, resizes the reference to the source,
//! runs the transfer plus any finishing adjustments and writes the result
//! image. The outcome is a [`ProcessResponse`] carrying either a
//! result URL or an error message with an HTTP-style status, ready to be
//! serialized as JSON by whatever transport sits in front.

use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::adjust::ColorAdjuster;
use crate::config::ServiceConfig;
use crate::error::{Result, TransferError};
use crate::image_loader;
use crate::transfer::ColorTransfer;
use crate::upload;

/// One uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name
    pub filename: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Outcome of one processing request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessResponse {
    Success {
        result_url: String,
    },
    Failure {
        error: String,
        #[serde(skip)]
        status: u16,
    },
}

impl ProcessResponse {
    fn failure(err: &TransferError) -> Self {
        Self::Failure {
            error: err.user_message(),
            status: err.status_code(),
        }
    }

    /// HTTP-style status code
    pub fn status(&self) -> u16 {
        match self {
            ProcessResponse::Success { .. } => 200,
            ProcessResponse::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessResponse::Success { .. })
    }

    /// JSON body: `{"result_url": ...}` or `{"error": ...}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"Error processing images"}"#.to_string())
    }
}

/// Paths produced by a successful request
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Where the result was written
    pub result_path: PathBuf,
    /// URL the result is exposed under
    pub result_url: String,
}

/// Upload-to-result service with explicit configuration
#[derive(Debug, Clone)]
pub struct StyleGradeService {
    config: ServiceConfig,
    transfer: ColorTransfer,
    adjuster: ColorAdjuster,
}

impl StyleGradeService {
    /// Validate `config` and create its directories
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        config.ensure_directories()?;
        let transfer = ColorTransfer::new(config.transfer.clone())?;
        let adjuster = ColorAdjuster::new(&config.adjustments)?;
        Ok(Self {
            config,
            transfer,
            adjuster,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Handle a request; either upload may be missing
    pub fn process(&self, source: Option<&Upload>, reference: Option<&Upload>) -> ProcessResponse {
        let (source, reference) = match (source, reference) {
            (Some(s), Some(r)) => (s, r),
            _ => {
                warn!("request is missing the source or reference file");
                return ProcessResponse::failure(&TransferError::upload_rejected(
                    "Missing source or reference image",
                ));
            }
        };

        match self.try_process(source, reference) {
            Ok(processed) => {
                info!("wrote result {}", processed.result_path.display());
                ProcessResponse::Success {
                    result_url: processed.result_url,
                }
            }
            Err(err) => {
                if err.is_client_error() {
                    warn!("rejected request: {}", err);
                } else {
                    error!("failed to process images: {}", err);
                }
                ProcessResponse::failure(&err)
            }
        }
    }

    /// Handle a request with both uploads present
    pub fn try_process(&self, source: &Upload, reference: &Upload) -> Result<ProcessedImage> {
        info!(
            "processing source '{}' with reference '{}'",
            source.filename, reference.filename
        );
        self.validate_upload(source)?;
        self.validate_upload(reference)?;

        let source_path = self.store_upload(source)?;
        let reference_path = self.store_upload(reference)?;
        debug!(
            "archived uploads as {} and {}",
            source_path.display(),
            reference_path.display()
        );

        let source_img = image_loader::decode_image(&source.data)?;
        let reference_img = image_loader::decode_image(&reference.data)?;

        let (width, height) = source_img.dimensions();
        let reference_img = image_loader::resize_to(&reference_img, width, height)?;

        let result = self
            .transfer
            .run(&source_img, &reference_img)
            .and_then(|graded| self.adjuster.apply(&graded))
            .map_err(|e| TransferError::processing(e.to_string()))?;

        let file_name = upload::result_filename();
        let result_path = self.config.result_dir.join(&file_name);
        image_loader::save_image(&result, &result_path)?;

        Ok(ProcessedImage {
            result_path,
            result_url: self.config.result_url(&file_name),
        })
    }

    fn validate_upload(&self, file: &Upload) -> Result<()> {
        if file.filename.is_empty() {
            return Err(TransferError::upload_rejected("No selected file"));
        }
        if !upload::allowed_file(&file.filename) {
            return Err(TransferError::upload_rejected(
                "Invalid file type. Allowed types are: png, jpg, jpeg",
            ));
        }
        if file.data.len() as u64 > self.config.max_upload_bytes {
            return Err(TransferError::upload_rejected(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_bytes
            )));
        }
        Ok(())
    }

    fn store_upload(&self, file: &Upload) -> Result<PathBuf> {
        let name = upload::secure_filename(&file.filename);
        if name.is_empty() || !upload::allowed_file(&name) {
            return Err(TransferError::upload_rejected("Invalid file name"));
        }
        let path = self.config.upload_dir.join(upload::stored_filename(&name));
        std::fs::write(&path, &file.data)
            .map_err(|e| TransferError::io(format!("Failed to save {}", path.display()), e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_service(tag: &str) -> (StyleGradeService, PathBuf) {
        temp_service_with(tag, ServiceConfig::default())
    }

    fn temp_service_with(tag: &str, base: ServiceConfig) -> (StyleGradeService, PathBuf) {
        let root = std::env::temp_dir()
            .join(format!("style_grader_service_{}_{}", std::process::id(), tag));
        std::fs::remove_dir_all(&root).ok();
        let config = ServiceConfig {
            upload_dir: root.join("uploads"),
            result_dir: root.join("results"),
            ..base
        };
        (StyleGradeService::new(config).unwrap(), root)
    }

    fn png_upload(name: &str, width: u32, height: u32, rgb: [u8; 3]) -> Upload {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        Upload::new(name, bytes)
    }

    #[test]
    fn test_missing_upload() {
        let (service, root) = temp_service("missing");
        let upload = Upload::new("a.png", vec![1]);
        let response = service.process(Some(&upload), None);
        std::fs::remove_dir_all(root).ok();
        assert_eq!(
            response,
            ProcessResponse::Failure {
                error: "Missing source or reference image".to_string(),
                status: 400
            }
        );
    }

    #[test]
    fn test_empty_filename() {
        let (service, root) = temp_service("empty");
        let ok = Upload::new("a.png", vec![1]);
        let empty = Upload::new("", vec![1]);
        let response = service.process(Some(&ok), Some(&empty));
        std::fs::remove_dir_all(root).ok();
        assert_eq!(response.status(), 400);
        assert_eq!(response.to_json(), r#"{"error":"No selected file"}"#);
    }

    #[test]
    fn test_wrong_extension() {
        let (service, root) = temp_service("ext");
        let ok = Upload::new("a.png", vec![1]);
        let gif = Upload::new("b.gif", vec![1]);
        let response = service.process(Some(&gif), Some(&ok));
        std::fs::remove_dir_all(root).ok();
        assert_eq!(
            response.to_json(),
            r#"{"error":"Invalid file type. Allowed types are: png, jpg, jpeg"}"#
        );
    }

    #[test]
    fn test_undecodable_upload() {
        let (service, root) = temp_service("garbage");
        let a = Upload::new("a.png", b"not a png".to_vec());
        let b = Upload::new("b.jpg", b"not a jpeg".to_vec());
        let response = service.process(Some(&a), Some(&b));
        std::fs::remove_dir_all(root).ok();
        assert_eq!(response.status(), 400);
        assert_eq!(
            response.to_json(),
            r#"{"error":"Invalid image file or unsupported format"}"#
        );
    }

    #[test]
    fn test_oversized_upload() {
        let config = ServiceConfig {
            max_upload_bytes: 4,
            ..ServiceConfig::default()
        };
        let (service, root) = temp_service_with("big", config);
        let small = Upload::new("a.png", vec![0; 4]);
        let large = Upload::new("b.png", vec![0; 5]);
        let response = service.process(Some(&small), Some(&large));
        std::fs::remove_dir_all(root).ok();
        assert_eq!(response.status(), 400);
        assert!(!response.is_success());
    }

    #[test]
    fn test_same_named_uploads_stay_separate() {
        let (service, root) = temp_service("same_name");
        let source = png_upload("photo.png", 40, 30, [30, 160, 60]);
        let reference = png_upload("photo.png", 10, 10, [200, 30, 30]);

        let processed = service.try_process(&source, &reference).unwrap();
        let result = image_loader::load_image(&processed.result_path).unwrap();
        let archived = std::fs::read_dir(root.join("uploads")).unwrap().count();
        std::fs::remove_dir_all(&root).ok();

        assert_eq!(result.dimensions(), (40, 30));
        assert_eq!(archived, 2);
    }

    #[test]
    fn test_mislabeled_upload_decodes_by_content() {
        let (service, root) = temp_service("mislabeled");
        let source = png_upload("a.jpg", 12, 8, [90, 120, 150]);
        let reference = png_upload("b.png", 12, 8, [150, 120, 90]);
        let response = service.process(Some(&source), Some(&reference));
        std::fs::remove_dir_all(&root).ok();
        assert!(response.is_success(), "{}", response.to_json());
    }

    #[test]
    fn test_adjustments_applied_to_result() {
        let config = ServiceConfig {
            adjustments: crate::config::Adjustments {
                brightness: -100,
                ..Default::default()
            },
            ..ServiceConfig::default()
        };
        let (service, root) = temp_service_with("adjusted", config);
        let source = png_upload("a.png", 16, 16, [90, 120, 150]);
        let reference = png_upload("b.png", 16, 16, [150, 120, 90]);

        let processed = service.try_process(&source, &reference).unwrap();
        let result = image_loader::load_image(&processed.result_path).unwrap();
        std::fs::remove_dir_all(&root).ok();

        assert!(result.as_raw().iter().all(|&c| c <= 2));
    }

    #[test]
    fn test_invalid_adjustments_rejected() {
        let config = ServiceConfig {
            upload_dir: std::env::temp_dir().join("style_grader_unused_uploads"),
            result_dir: std::env::temp_dir().join("style_grader_unused_results"),
            adjustments: crate::config::Adjustments {
                saturation: 250,
                ..Default::default()
            },
            ..ServiceConfig::default()
        };
        assert!(matches!(
            StyleGradeService::new(config),
            Err(TransferError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_success_json_shape() {
        let response = ProcessResponse::Success {
            result_url: "static/results/result_ab.jpg".to_string(),
        };
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.to_json(),
            r#"{"result_url":"static/results/result_ab.jpg"}"#
        );
    }
}
