use lightbox_core::AppError;
use thiserror::Error;

use crate::image::DerivativeError;
use crate::raw::RawDecodeError;

/// Failure of the CPU-bound part of an upload.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Decode(#[from] RawDecodeError),

    #[error(transparent)]
    Derivative(#[from] DerivativeError),

    #[error("Processing task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    /// Convert into the application error for an upload whose RAW original is
    /// already stored at `raw_url`, if any.
    pub fn into_app_error(self, raw_url: Option<&str>) -> AppError {
        match (self, raw_url) {
            (ProcessingError::Decode(err), Some(raw_url)) => AppError::Decode {
                message: err.to_string(),
                raw_url: raw_url.to_string(),
            },
            (ProcessingError::Decode(err), None) => AppError::Encode(err.to_string()),
            (ProcessingError::Derivative(err), _) => AppError::Encode(err.to_string()),
            (ProcessingError::Task(err), _) => AppError::Internal(format!(
                "Processing task did not complete: {}",
                err
            )),
        }
    }
}

/// Run CPU-bound work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ProcessingError>
where
    F: FnOnce() -> Result<T, ProcessingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}
