//! Validated file uploads for thumbnails, profile pictures, and transfer
//! proofs.

use std::fmt;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Failures while validating an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadValidationError {
    /// Zero-byte uploads are rejected.
    Empty,
    /// The upload exceeds [`MAX_UPLOAD_BYTES`].
    TooLarge { max_bytes: usize },
    /// The content type is not an accepted image format.
    UnsupportedType { content_type: String },
}

impl fmt::Display for UploadValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "upload must not be empty"),
            Self::TooLarge { max_bytes } => {
                write!(f, "upload must be at most {max_bytes} bytes")
            }
            Self::UnsupportedType { content_type } => {
                write!(f, "unsupported upload type: {content_type}")
            }
        }
    }
}

impl std::error::Error for UploadValidationError {}

/// An image upload that passed size and content-type validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl FileUpload {
    /// Validate raw upload parts.
    ///
    /// # Errors
    ///
    /// Returns [`UploadValidationError`] when the upload is empty, too
    /// large, or not an accepted image format.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, UploadValidationError> {
        let content_type = content_type.into();
        if bytes.is_empty() {
            return Err(UploadValidationError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadValidationError::TooLarge {
                max_bytes: MAX_UPLOAD_BYTES,
            });
        }
        if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(UploadValidationError::UnsupportedType { content_type });
        }

        Ok(Self {
            filename: filename.into(),
            content_type,
            bytes,
        })
    }

    /// Original filename, for the multipart part.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.filename.as_str()
    }

    /// Declared content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Raw file bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}
