use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because both configuration and the storage factory use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Logical folders of the object store layout.
///
/// Every artifact of one upload lives under exactly one of these prefixes and
/// shares the upload's key prefix with its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    /// Originals of regular uploads.
    Uploads,
    /// Originals of RAW uploads.
    Raw,
    /// Full-size JPEG converted from a RAW original.
    Processed,
    /// JPEG thumbnails for both kinds.
    Thumbnails,
}

impl Folder {
    pub const ALL: [Folder; 4] = [
        Folder::Uploads,
        Folder::Raw,
        Folder::Processed,
        Folder::Thumbnails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::Uploads => "uploads",
            Folder::Raw => "raw",
            Folder::Processed => "processed",
            Folder::Thumbnails => "thumbnails",
        }
    }
}

impl FromStr for Folder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Folder::ALL
            .into_iter()
            .find(|folder| folder.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown folder: {}", s))
    }
}

impl Display for Folder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
