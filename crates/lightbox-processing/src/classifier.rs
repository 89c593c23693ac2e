//! Format classification
//!
//! Decides from the filename, the declared content type and a content sniff
//! whether an upload is a camera RAW file, a regular image, or not accepted.

use std::path::Path;

use lightbox_core::{AppError, ClassifiedFile, FileKind, UploadSettings};

/// Camera RAW extensions, lowercase.
pub const RAW_EXTENSIONS: &[&str] = &[
    "3fr", "arw", "cr2", "cr3", "crw", "dcr", "dng", "erf", "fff", "iiq", "kdc", "mdc", "mef",
    "mos", "mrw", "nef", "nrw", "orf", "pef", "raf", "raw", "rw2", "rwl", "rwz", "sr2", "srf",
    "srw", "x3f",
];

/// Extensions accepted as regular images when no content type is declared.
const IMAGE_EXTENSIONS: &[&str] = &[
    "avif", "bmp", "gif", "ico", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension used for regular uploads whose format cannot be told from name or bytes.
const FALLBACK_EXTENSION: &str = "jpg";

pub fn is_raw_extension(extension: &str) -> bool {
    RAW_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Lowercase extension of a filename, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Base name of a client-supplied filename, without any directory part.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(filename)
}

/// Media type without parameters, lowercased. Empty values count as undeclared.
pub(crate) fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| !ct.is_empty())
}

/// Classify an upload.
///
/// RAW membership is decided by extension alone. Anything else is a regular
/// image when its declared content type is `image/*`, or, when no specific
/// type was declared, when its extension or its leading bytes identify an
/// image format.
pub fn classify(
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<ClassifiedFile, AppError> {
    let filename = base_name(filename.trim());
    if filename.is_empty() {
        return Err(AppError::InvalidInput("Filename is required".to_string()));
    }
    if data.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is empty", filename)));
    }

    let extension = extension_of(filename);

    if let Some(ext) = extension.as_deref().filter(|ext| is_raw_extension(ext)) {
        return Ok(ClassifiedFile {
            filename: filename.to_string(),
            extension: ext.to_string(),
            kind: FileKind::Raw,
            size: data.len(),
        });
    }

    let sniffed = image::guess_format(data).ok();
    let accepted = match normalize_content_type(content_type).as_deref() {
        Some(ct) if ct.starts_with("image/") => true,
        Some(ct) if ct != GENERIC_CONTENT_TYPE => false,
        _ => {
            extension
                .as_deref()
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
                || sniffed.is_some()
        }
    };

    if !accepted {
        tracing::debug!(
            filename = %filename,
            content_type = ?content_type,
            "Upload rejected by classifier"
        );
        return Err(AppError::InvalidFileType(format!(
            "{} is neither an image nor a supported camera RAW file",
            filename
        )));
    }

    let extension = extension
        .or_else(|| {
            sniffed
                .and_then(|format| format.extensions_str().first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    Ok(ClassifiedFile {
        filename: filename.to_string(),
        extension,
        kind: FileKind::Regular,
        size: data.len(),
    })
}

/// Enforce the size cap of the file's kind.
pub fn check_size(file: &ClassifiedFile, settings: &UploadSettings) -> Result<(), AppError> {
    let max = match file.kind {
        FileKind::Regular => settings.max_image_size_bytes,
        FileKind::Raw => settings.max_raw_size_bytes,
    };

    if file.size > max {
        return Err(AppError::FileTooLarge {
            size: file.size,
            max,
            kind: file.kind.as_str(),
        });
    }

    Ok(())
}
