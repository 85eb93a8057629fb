//! Error types and the sticky last-error holder.
//!
//! Every fallible operation returns a [`AssetError`]. [`ImageAsset`](crate::ImageAsset)
//! also mirrors the outcome of its most recent call into a [`LastError`], so
//! callers that poll for an error message after each call keep working.

use thiserror::Error;

/// Message recorded when an operation needs a loaded asset.
pub const ERROR_NOT_LOADED: &str = "image asset is not loaded";

/// Message recorded when a requested range falls outside the image.
pub const ERROR_SIZE_OVERFLOW: &str = "range exceeds image size";

/// Broad classification of an [`AssetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File open, seek or read failure.
    Io,
    /// A decoder rejected the bitstream, or it exceeds the configured limits.
    Format,
    /// The asset is in the wrong state for the operation, or the requested
    /// geometry does not fit the current image.
    State,
}

/// Error types for image asset operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// I/O failure, carrying the platform error text.
    #[error("{0}")]
    Io(String),

    /// Decoder diagnostic for a malformed, truncated or unsupported bitstream.
    #[error("{0}")]
    Format(String),

    /// The decoded image would exceed the configured [`Limits`](crate::Limits).
    #[error("Image exceeds decode limits: {0}")]
    LimitExceeded(String),

    /// The operation requires a loaded asset.
    #[error("image asset is not loaded")]
    NotLoaded,

    /// Requested clip bounds fall outside the current image.
    #[error("range exceeds image size")]
    SizeOverflow,

    /// Width, height or channel count is zero, negative or too large.
    #[error("Invalid dimensions: {width}x{height} with {channel_count} channels")]
    InvalidDimensions {
        width: i64,
        height: i64,
        channel_count: i64,
    },

    /// Raw pixel data does not match the declared dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * channels), got {actual}")]
    PixelDataMismatch { expected: usize, actual: usize },

    /// Destination handed to `copy_to` cannot hold the image.
    #[error("Destination too small: need {needed} bytes, got {actual}")]
    DestinationTooSmall { needed: usize, actual: usize },

    /// Pixel buffer allocation failed.
    #[error("Out of memory allocating {0} bytes")]
    OutOfMemory(usize),
}

impl AssetError {
    /// Builds an I/O error with a short description of the failing step.
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        AssetError::Io(format!("{}: {}", context, err))
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::Io(_) => ErrorKind::Io,
            AssetError::Format(_) | AssetError::LimitExceeded(_) => ErrorKind::Format,
            AssetError::NotLoaded
            | AssetError::SizeOverflow
            | AssetError::InvalidDimensions { .. }
            | AssetError::PixelDataMismatch { .. }
            | AssetError::DestinationTooSmall { .. }
            | AssetError::OutOfMemory(_) => ErrorKind::State,
        }
    }
}

impl From<image::ImageError> for AssetError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => AssetError::Io(e.to_string()),
            image::ImageError::Limits(e) => AssetError::LimitExceeded(e.to_string()),
            other => AssetError::Format(other.to_string()),
        }
    }
}

/// Sticky record of the most recent operation's failure.
///
/// Holds a single message, not a history. An empty message means the last
/// call succeeded.
#[derive(Debug, Clone, Default)]
pub struct LastError {
    message: Option<String>,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous outcome.
    pub fn clear(&mut self) {
        self.message = None;
    }

    /// Record a failure message.
    pub fn set(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Returns the last recorded message, or `""` on success.
    pub fn get(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn is_set(&self) -> bool {
        self.message.is_some()
    }

    /// Mirror `result` into the sticky state and hand it back unchanged.
    pub(crate) fn record<T>(&mut self, result: Result<T, AssetError>) -> Result<T, AssetError> {
        if let Err(e) = &result {
            self.set(e.to_string());
        }
        result
    }
}
