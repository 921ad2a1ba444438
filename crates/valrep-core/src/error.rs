//! Error types for the valrep-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the valrep library.
///
/// Only structural failures end up here. A field that cannot be found or a
/// candidate that fails validation is a normal outcome of extraction and is
/// never reported as an error.
#[derive(Error, Debug)]
pub enum ValrepError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Schema or binding error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input document is missing or unreadable.
    #[error("input document {path}: {reason}")]
    Input { path: PathBuf, reason: String },
}

/// Errors raised by a page rasterizer.
#[derive(Error, Debug)]
pub enum RasterError {
    /// The rendering tool could not be found.
    #[error("rasterizer tool not found: {0}")]
    ToolNotFound(String),

    /// The rendering tool ran but failed.
    #[error("rasterizer failed: {0}")]
    ToolFailed(String),

    /// The file extension is not a supported document or image type.
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// A rendered page could not be decoded.
    #[error("failed to decode page image: {0}")]
    Decode(#[from] image::ImageError),

    /// I/O error while rendering.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection failed.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// The page image is corrupt or has unusable dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to the output schema and its bindings.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A binding or mirror points at a path the template does not define.
    #[error("path not present in schema template: {0}")]
    UnknownPath(String),

    /// A path crosses a leaf value where an object was expected.
    #[error("path {path} crosses non-object value at {segment}")]
    NotAnObject { path: String, segment: String },

    /// The template itself is not an object.
    #[error("schema template root must be an object")]
    InvalidTemplate,
}

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric setting is out of range.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// A configured pattern failed to compile.
    #[error("invalid pattern for {key}: {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error while reading or writing the configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the valrep library.
pub type Result<T> = std::result::Result<T, ValrepError>;
