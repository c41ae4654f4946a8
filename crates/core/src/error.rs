//! Error types for presentation conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding or converting a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A single slide's shape tree could not be materialized.
    #[error("Slide decode error: {0}")]
    SlideDecodeError(String),

    /// Failed to extract content from a slide's shape tree.
    #[error("Content extraction error: {0}")]
    ExtractionError(String),
}
