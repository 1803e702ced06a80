//! Pass/fail checks for admin uploads
//!
//! Only the accept/reject decisions live here. Reading, previewing and
//! storing the files is the caller's business.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted upload (5 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted for profile and project images
pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// MIME type accepted for the downloadable resume
pub const RESUME_MIME_TYPE: &str = "application/pdf";

/// What an upload is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Resume,
}

/// Why an upload was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Unsupported file type '{mime}' (expected {expected})")]
    UnsupportedType { mime: String, expected: String },

    #[error("File is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

/// Lower-cased text after the last dot
///
/// A name without a dot is returned whole, lower-cased.
pub fn file_extension(filename: &str) -> String {
    filename.rsplit('.').next().unwrap_or_default().to_lowercase()
}

pub fn is_allowed_image(mime: &str) -> bool {
    IMAGE_MIME_TYPES.contains(&mime)
}

pub fn is_resume(mime: &str) -> bool {
    mime == RESUME_MIME_TYPE
}

pub fn is_within_size_limit(size: u64) -> bool {
    size <= MAX_UPLOAD_BYTES
}

/// Type check first, then size
pub fn check_upload(kind: UploadKind, mime: &str, size: u64) -> Result<(), UploadRejection> {
    let type_ok = match kind {
        UploadKind::Image => is_allowed_image(mime),
        UploadKind::Resume => is_resume(mime),
    };

    if !type_ok {
        let expected = match kind {
            UploadKind::Image => IMAGE_MIME_TYPES.join(", "),
            UploadKind::Resume => RESUME_MIME_TYPE.to_string(),
        };
        return Err(UploadRejection::UnsupportedType {
            mime: mime.to_string(),
            expected,
        });
    }

    if !is_within_size_limit(size) {
        return Err(UploadRejection::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("resume.PDF"), "pdf");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("README"), "readme");
        assert_eq!(file_extension("trailing."), "");
        assert_eq!(file_extension(""), "");
    }

    #[test]
    fn test_image_types() {
        assert!(is_allowed_image("image/png"));
        assert!(is_allowed_image("image/webp"));
        assert!(!is_allowed_image("image/svg+xml"));
        assert!(!is_allowed_image("application/pdf"));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(is_within_size_limit(MAX_UPLOAD_BYTES));
        assert!(!is_within_size_limit(MAX_UPLOAD_BYTES + 1));
    }

    #[test]
    fn test_check_upload() {
        assert!(check_upload(UploadKind::Resume, "application/pdf", 1024).is_ok());
        assert!(check_upload(UploadKind::Image, "image/jpeg", 1024).is_ok());

        let err = check_upload(UploadKind::Resume, "image/png", 1024).unwrap_err();
        assert!(matches!(err, UploadRejection::UnsupportedType { .. }));

        let err = check_upload(UploadKind::Image, "image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(
            err,
            UploadRejection::TooLarge {
                size: MAX_UPLOAD_BYTES + 1,
                limit: MAX_UPLOAD_BYTES
            }
        );
    }
}
