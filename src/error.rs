//! Error types for the watermark-overlay crate.

use std::path::PathBuf;

/// Errors that can occur while loading, compositing or emitting an image.
///
/// None of these are transient; retrying with the same input fails the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input path does not exist or is not a regular file.
    #[error("unable to open file \"{}\": not found", .0.display())]
    NotFound(PathBuf),

    /// The input path exists but could not be read.
    #[error("unable to open file \"{}\": {source}", path.display())]
    Unreadable {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input bytes are empty or decode to an unusable image.
    #[error("invalid image data: {0}")]
    InvalidData(String),

    /// The image format is not one of GIF, PNG or JPEG.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The decoder rejected the input data.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The response stream already sent its headers, so no content type can be set.
    #[error("headers have already been sent, could not display image")]
    HeadersAlreadySent,

    /// Writing the encoded bytes to the output target failed.
    #[error("failed to write image to {target}: {source}")]
    Write {
        /// Human-readable description of the target (a path or "stream").
        target: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The encoder failed to serialize the composited image.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The option record could not be parsed.
    #[error("invalid watermark options: {0}")]
    Options(#[from] serde_json::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
