//! Fixed values of the upload pipeline.

/// Bytes in one megabyte, as used by the size caps.
pub const BYTES_PER_MB: usize = 1024 * 1024;

pub const DEFAULT_MAX_IMAGE_SIZE_MB: usize = 50;
pub const DEFAULT_MAX_RAW_SIZE_MB: usize = 500;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 70;
pub const DEFAULT_THUMBNAIL_MAX_EDGE: u32 = 400;

pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_FILE_MAPPINGS_PATH: &str = "data/file_mappings.json";

/// Listing bounds.
pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MIN_LIST_LIMIT: i64 = 1;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// `strftime` layout of the identity timestamp (UTC, second precision).
pub const IDENTITY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Number of lowercase hex characters in the identity token.
pub const IDENTITY_TOKEN_LEN: usize = 12;

/// Extension and content type of every derivative this pipeline encodes.
pub const DERIVATIVE_EXTENSION: &str = "jpg";
pub const DERIVATIVE_CONTENT_TYPE: &str = "image/jpeg";
