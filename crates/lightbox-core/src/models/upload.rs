use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorMetadata};
use crate::models::raw::RawMetadata;
use crate::storage_types::Folder;

/// Kind of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Regular,
    Raw,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Regular => "regular",
            FileKind::Raw => "raw",
        }
    }

    /// Folder holding the upload's original bytes.
    pub fn original_folder(&self) -> Folder {
        match self {
            FileKind::Regular => Folder::Uploads,
            FileKind::Raw => Folder::Raw,
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(FileKind::Regular),
            "raw" => Ok(FileKind::Raw),
            _ => Err(anyhow::anyhow!("Invalid file kind: {}", s)),
        }
    }
}

/// Inbound upload: payload plus what the client declared about it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Result of classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub filename: String,
    /// Lowercase extension used for the original artifact's key.
    pub extension: String,
    pub kind: FileKind,
    pub size: usize,
}

impl ClassifiedFile {
    pub fn is_raw(&self) -> bool {
        self.kind == FileKind::Raw
    }
}

/// Key prefix shared by every artifact of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueIdentity {
    pub timestamp: String,
    pub token: String,
}

impl UniqueIdentity {
    /// `{timestamp}_{token}`
    pub fn prefix(&self) -> String {
        format!("{}_{}", self.timestamp, self.token)
    }

    /// Object name (key without folder) for an artifact with the given extension.
    pub fn object_name(&self, extension: &str) -> String {
        format!("{}.{}", self.prefix(), extension)
    }
}

impl Display for UniqueIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}_{}", self.timestamp, self.token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Original,
    Processed,
    Thumbnail,
}

/// One stored byte object produced from an upload.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub folder: Folder,
    pub extension: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Success payload of an upload, shaped by the upload's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "file_type", rename_all = "lowercase")]
pub enum UploadReceipt {
    Regular {
        message: String,
        filename: String,
        key: String,
        image_url: String,
        thumbnail_url: String,
    },
    Raw {
        message: String,
        filename: String,
        key: String,
        raw_url: String,
        processed_url: String,
        thumbnail_url: String,
        metadata: RawMetadata,
    },
}

impl UploadReceipt {
    /// Ledger key of the upload.
    pub fn key(&self) -> &str {
        match self {
            UploadReceipt::Regular { key, .. } | UploadReceipt::Raw { key, .. } => key,
        }
    }

    pub fn thumbnail_url(&self) -> &str {
        match self {
            UploadReceipt::Regular { thumbnail_url, .. }
            | UploadReceipt::Raw { thumbnail_url, .. } => thumbnail_url,
        }
    }

    pub fn file_kind(&self) -> FileKind {
        match self {
            UploadReceipt::Regular { .. } => FileKind::Regular,
            UploadReceipt::Raw { .. } => FileKind::Raw,
        }
    }
}

/// Terminal state of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success(UploadReceipt),
    Rejected { code: String, reason: String },
    Failed { code: String, reason: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }
}

impl From<Result<UploadReceipt, AppError>> for UploadOutcome {
    fn from(result: Result<UploadReceipt, AppError>) -> Self {
        match result {
            Ok(receipt) => UploadOutcome::Success(receipt),
            Err(err) if err.is_rejection() => UploadOutcome::Rejected {
                code: err.error_code().to_string(),
                reason: err.client_message(),
            },
            Err(err) => UploadOutcome::Failed {
                code: err.error_code().to_string(),
                reason: err.client_message(),
            },
        }
    }
}
