//! Object key construction and parsing.

use crate::traits::{StorageError, StorageResult};
use crate::Folder;

/// Build the key of `name` inside `folder`.
pub fn object_key(folder: Folder, name: &str) -> String {
    format!("{}/{}", folder.as_str(), name)
}

/// Split a key into its folder and object name.
///
/// Returns `None` for keys outside the four known folders or with nested paths.
pub fn split_object_key(key: &str) -> Option<(Folder, &str)> {
    let (folder, name) = key.split_once('/')?;
    let folder = folder.parse::<Folder>().ok()?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some((folder, name))
}

/// Reject names that would escape their folder.
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Object name contains invalid characters: {}",
            name
        )));
    }
    Ok(())
}

/// Replace the extension of an object name: `a_b.cr2` -> `a_b.jpg`.
pub fn with_extension(name: &str, extension: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    format!("{}.{}", stem, extension)
}
