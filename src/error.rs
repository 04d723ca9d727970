//! Error types for the style_grader library

use thiserror::Error;

/// Result type alias for style_grader operations
pub type Result<T> = std::result::Result<T, TransferError>;

/// Error types for color transfer and the surrounding image I/O
#[derive(Error, Debug)]
pub enum TransferError {
    /// Pixel buffer has malformed dimensions or channel layout
    #[error("Invalid buffer: {reason}")]
    InvalidBuffer { reason: String },

    /// A pipeline stage produced an unusable value (NaN, overflow, ...)
    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    /// Invalid transfer or service parameter
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image could not be encoded or written
    #[error("Failed to save image: {message}")]
    ImageSaveError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Uploaded file was refused before any processing
    #[error("Upload rejected: {reason}")]
    UploadRejected { reason: String },

    /// Filesystem operation failed
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransferError {
    /// Create a malformed-buffer error
    pub fn invalid_buffer(reason: impl Into<String>) -> Self {
        Self::InvalidBuffer {
            reason: reason.into(),
        }
    }

    /// Create a stage computation error
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an image save error with context
    pub fn image_save<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageSaveError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upload rejection
    pub fn upload_rejected(reason: impl Into<String>) -> Self {
        Self::UploadRejected {
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidBuffer { .. }
                | TransferError::InvalidParameter { .. }
                | TransferError::ImageLoadError { .. }
                | TransferError::UploadRejected { .. }
        )
    }

    /// HTTP-style status code a request handler should answer with
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            TransferError::UploadRejected { reason } => reason.clone(),
            TransferError::ImageLoadError { .. } => {
                "Invalid image file or unsupported format".to_string()
            }
            TransferError::InvalidParameter { parameter, .. } => {
                format!("Invalid value for '{}'", parameter)
            }
            TransferError::IoError { .. } => "Failed to save uploaded files".to_string(),
            _ => "Error processing images".to_string(),
        }
    }
}
