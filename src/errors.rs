use thiserror::Error;

/// Represents errors that can occur while translating an HTML page into a slide.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Error reported by the headless browser backend (launch, navigation, script
    /// evaluation or screenshot failures that the backend considers fatal).
    #[error("Browser error: {0}")]
    Browser(String),

    /// The DOM snapshot returned by the in-page extraction script could not be
    /// deserialized into the expected shape.
    #[error("Failed to deserialize DOM snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// One or more fatal validation errors were accumulated during the walk.
    /// The message lists every issue, prefixed by the source HTML path once.
    #[error("{path}: {message}")]
    Validation { path: String, message: String },

    /// An I/O error occurred, usually while creating the raster temp directory
    /// or writing a captured PNG.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// String formatting failed while assembling builder payloads.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// An unexpected internal inconsistency.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, ConvertError>` for convenience within the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;
