//! Error types for slide text and formula extraction.

use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during extraction, recognition and export.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document could not be loaded. Fatal for the whole document.
    #[error("Failed to load document '{path}': {reason}")]
    DocumentLoad { path: String, reason: String },

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Embedded picture bytes could not be decoded.
    #[error("{0}")]
    ImageDecode(String),

    /// A recognition back-end failed or could not be started.
    #[error("{backend} recognizer error: {reason}")]
    Recognizer { backend: String, reason: String },

    /// Writing an exported text file failed.
    #[error("Failed to write '{path}': {reason}")]
    ExportWrite { path: String, reason: String },

    /// The job has nothing that can be exported.
    #[error("Nothing to export: {0}")]
    NotExportable(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a recognizer error for the named back-end.
    pub fn recognizer(backend: impl Into<String>, reason: impl ToString) -> Self {
        Self::Recognizer {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }

    /// Surface any loader failure as a `DocumentLoad` error for `path`.
    ///
    /// Errors that already are `DocumentLoad` pass through unchanged.
    pub fn into_document_load(self, path: &Path) -> Self {
        match self {
            err @ Self::DocumentLoad { .. } => err,
            other => Self::DocumentLoad {
                path: path.display().to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Whether this error is a document-level load failure.
    pub fn is_document_load(&self) -> bool {
        matches!(self, Self::DocumentLoad { .. })
    }
}
