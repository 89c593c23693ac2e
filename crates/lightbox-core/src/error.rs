//! Error types module
//!
//! Every failure an upload can end in is a variant of `AppError`. The enum
//! carries enough context for the caller to tell what was persisted before the
//! failure, and `ErrorMetadata` describes how a transport layer should render it.

use std::io;

use crate::storage_types::Folder;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like rejected uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File too large: {size} bytes exceeds the {max} byte limit for {kind} files")]
    FileTooLarge {
        size: usize,
        max: usize,
        kind: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// RAW bytes could not be decoded. The original was stored at `raw_url`
    /// before decoding started and is left in place.
    #[error("Failed to decode RAW file: {message}")]
    Decode { message: String, raw_url: String },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// An object-store operation failed. `folder` is where it failed when
    /// known. `written` lists the keys stored for the same upload before the
    /// failure; they are not rolled back.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        folder: Option<Folder>,
        written: Vec<String>,
    },

    /// Every object was written but the mapping could not be recorded.
    #[error("Failed to record mapping for {key}: {message}")]
    Ledger { key: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidFileType(_) => (
            400,
            "INVALID_FILE_TYPE",
            false,
            Some("Upload an image or a supported camera RAW file"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooLarge { .. } => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Decode { .. } => (
            500,
            "DECODE_ERROR",
            false,
            Some("The original file was kept; check that the camera model is supported"),
            false,
            LogLevel::Warn,
        ),
        AppError::Encode(_) => (
            500,
            "ENCODE_ERROR",
            false,
            Some("Check image format and try a different file"),
            false,
            LogLevel::Warn,
        ),
        AppError::Storage { .. } => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Ledger { .. } => (
            500,
            "LEDGER_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the object key exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidFileType(_) => "InvalidFileType",
            AppError::FileTooLarge { .. } => "FileTooLarge",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Decode { .. } => "DecodeError",
            AppError::Encode(_) => "EncodeError",
            AppError::Storage { .. } => "StorageError",
            AppError::Ledger { .. } => "LedgerError",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// True for outcomes decided before any side effect took place.
    pub fn is_rejection(&self) -> bool {
        matches!(self.http_status_code(), 400..=499)
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidFileType(ref msg) => msg.clone(),
            AppError::FileTooLarge { size, max, kind } => format!(
                "File too large: {} bytes, maximum for {} files is {} bytes",
                size, kind, max
            ),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Decode { message, raw_url } => format!(
                "Failed to convert RAW file ({}); original stored at {}",
                message, raw_url
            ),
            AppError::Encode(ref msg) => format!("Failed to generate derivatives: {}", msg),
            AppError::Storage {
                folder, written, ..
            } => {
                let mut msg = match folder {
                    Some(folder) => format!("Storage failed in the {} folder", folder),
                    None => "Storage failed".to_string(),
                };
                if !written.is_empty() {
                    msg.push_str(&format!(
                        "; {} artifact(s) were already stored",
                        written.len()
                    ));
                }
                msg
            }
            AppError::Ledger { key, .. } => format!(
                "File stored as {} but its mapping could not be recorded",
                key
            ),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_invalid_file_type() {
        let err = AppError::InvalidFileType("notes.txt".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_FILE_TYPE");
        assert!(!err.is_recoverable());
        assert!(err.is_rejection());
        assert_eq!(err.client_message(), "notes.txt");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_file_too_large() {
        let err = AppError::FileTooLarge {
            size: 600,
            max: 500,
            kind: "raw",
        };
        assert_eq!(err.http_status_code(), 413);
        assert!(err.is_rejection());
        assert!(err.client_message().contains("600"));
        assert!(err.client_message().contains("500"));
    }

    #[test]
    fn test_error_metadata_decode_keeps_raw_url() {
        let err = AppError::Decode {
            message: "unsupported sensor".to_string(),
            raw_url: "https://photos.s3.amazonaws.com/raw/x.nef".to_string(),
        };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert!(!err.is_rejection());
        assert!(err.client_message().contains("raw/x.nef"));
        assert_eq!(err.error_type(), "DecodeError");
    }

    #[test]
    fn test_error_metadata_storage_reports_partial_writes() {
        let err = AppError::Storage {
            message: "connection reset".to_string(),
            folder: Some(Folder::Processed),
            written: vec!["raw/a.cr2".to_string()],
        };
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert!(err.client_message().contains("1 artifact"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_storage_client_message_names_the_folder() {
        let err = AppError::Storage {
            message: "s3: 503 SlowDown from bucket media-prod".to_string(),
            folder: Some(Folder::Thumbnails),
            written: Vec::new(),
        };
        assert_eq!(err.client_message(), "Storage failed in the thumbnails folder");
        // Backend detail stays server-side.
        assert!(!err.client_message().contains("media-prod"));

        let err = AppError::Storage {
            message: "unknown".to_string(),
            folder: None,
            written: Vec::new(),
        };
        assert_eq!(err.client_message(), "Storage failed");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("writing ledger"));
        let details = err.detailed_message();
        assert!(details.contains("Caused by"));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
