//! The image asset: one pixel buffer, its metadata, and a sticky last error.
//!
//! # Error model
//!
//! Every public operation clears the previous error first, validates its
//! preconditions before mutating anything, and returns a `Result`. The
//! failure message is also kept in a [`LastError`] until the next call, for
//! callers that poll [`ImageAsset::error`] instead of matching on results.
//!
//! # State
//!
//! A null buffer is the unloaded state. While loaded, `width`, `height` and
//! `channel_count` are all positive and the buffer holds exactly
//! `width * height * channel_count` bytes in bottom-up row order.

use std::path::Path;

use crate::buffer::{pixel_len, BufferOrigin, PixelBuffer};
use crate::decode::{self, DecodedImage};
use crate::error::{AssetError, LastError};
use crate::limits::Limits;
use crate::transform::{self, PixelView};

/// A decoded image asset.
#[derive(Debug, Default)]
pub struct ImageAsset {
    width: u32,
    height: u32,
    channel_count: u32,
    buffer: PixelBuffer,
    last_error: LastError,
    limits: Limits,
}

impl ImageAsset {
    /// Create an empty (unloaded) asset with no decode limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty asset whose decodes are checked against `limits`.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Decode a file, choosing the backend from its first bytes.
    ///
    /// On failure the previously loaded image (if any) is kept.
    ///
    /// # Errors
    ///
    /// - `AssetError::Io` if the file cannot be opened or read
    /// - `AssetError::Format` / `AssetError::LimitExceeded` from the decoder
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = decode::decode_path(path.as_ref(), &self.limits).map(|image| self.commit(image));
        self.last_error.record(result)
    }

    /// Decode an in-memory encoded image, choosing the backend from its first bytes.
    ///
    /// On failure the previously loaded image (if any) is kept.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = decode::decode_bytes(bytes, &self.limits).map(|image| self.commit(image));
        self.last_error.record(result)
    }

    /// Load raw, already bottom-up pixels without decoding.
    ///
    /// The pixels are copied into a new self-allocated buffer. No format
    /// validation is done beyond checking the length against the dimensions.
    ///
    /// # Errors
    ///
    /// - `AssetError::InvalidDimensions` if any dimension is not positive
    /// - `AssetError::PixelDataMismatch` if `pixels.len()` does not equal
    ///   `width * height * channel_count`
    pub fn load_pixels(
        &mut self,
        pixels: &[u8],
        width: i32,
        height: i32,
        channel_count: i32,
    ) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = Self::copy_pixels(pixels, width, height, channel_count)
            .map(|image| self.commit(image));
        self.last_error.record(result)
    }

    /// The last recorded error message, or `""` if the last call succeeded.
    pub fn error(&self) -> &str {
        self.last_error.get()
    }

    pub fn is_loaded(&self) -> bool {
        !self.buffer.is_null()
    }

    /// Image width in pixels.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NotLoaded` if nothing is loaded.
    pub fn try_width(&mut self) -> Result<u32, AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().map(|_| self.width);
        self.last_error.record(result)
    }

    /// Image height in pixels.
    pub fn try_height(&mut self) -> Result<u32, AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().map(|_| self.height);
        self.last_error.record(result)
    }

    /// Bytes per pixel.
    pub fn try_channel_count(&mut self) -> Result<u32, AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().map(|_| self.channel_count);
        self.last_error.record(result)
    }

    /// Image width, or `-1` with a not-loaded error recorded.
    pub fn width(&mut self) -> i32 {
        self.try_width().map_or(-1, as_i32)
    }

    /// Image height, or `-1` with a not-loaded error recorded.
    pub fn height(&mut self) -> i32 {
        self.try_height().map_or(-1, as_i32)
    }

    /// Channel count, or `-1` with a not-loaded error recorded.
    pub fn channel_count(&mut self) -> i32 {
        self.try_channel_count().map_or(-1, as_i32)
    }

    /// Read-only access to the bottom-up pixel data (empty when unloaded).
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Where the current buffer came from.
    pub fn buffer_origin(&self) -> BufferOrigin {
        self.buffer.origin()
    }

    /// Crop to the `width x height` region at `(x, y)`.
    ///
    /// The region covers storage rows `[height - y - h, height - y)` and
    /// columns `[x, x + w)`; see [`transform::clip_bounds`].
    ///
    /// # Errors
    ///
    /// - `AssetError::NotLoaded` if nothing is loaded
    /// - `AssetError::SizeOverflow` if the region leaves the image; the
    ///   current image is left untouched
    pub fn clip(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = self
            .view()
            .and_then(|view| transform::clip(view, x, y, width, height))
            .map(|image| self.commit(image));
        self.last_error.record(result)
    }

    /// Resize to `width x height` with nearest-neighbor sampling.
    ///
    /// # Errors
    ///
    /// - `AssetError::NotLoaded` if nothing is loaded
    /// - `AssetError::InvalidDimensions` if a target dimension is not positive
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = self
            .view()
            .and_then(|view| transform::resize_nearest(view, width, height))
            .map(|image| self.commit(image));
        self.last_error.record(result)
    }

    /// Release the pixel buffer and zero the metadata.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NotLoaded` if nothing is loaded.
    pub fn unload(&mut self) -> Result<(), AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().map(|_| {
            self.buffer.release();
            self.width = 0;
            self.height = 0;
            self.channel_count = 0;
            log::debug!("unloaded image asset");
        });
        self.last_error.record(result)
    }

    /// Copy the pixel data into `dest`, returning the number of bytes written.
    ///
    /// Exactly `width * height * channel_count` bytes are written; the rest of
    /// `dest` is left alone.
    ///
    /// # Errors
    ///
    /// - `AssetError::NotLoaded` if nothing is loaded
    /// - `AssetError::DestinationTooSmall` if `dest` is shorter than the image
    pub fn copy_to(&mut self, dest: &mut [u8]) -> Result<usize, AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().and_then(|_| {
            let source = self.buffer.as_slice();
            if dest.len() < source.len() {
                return Err(AssetError::DestinationTooSmall {
                    needed: source.len(),
                    actual: dest.len(),
                });
            }
            dest[..source.len()].copy_from_slice(source);
            Ok(source.len())
        });
        self.last_error.record(result)
    }

    /// Deep-copy into a new, independent asset.
    ///
    /// The clone gets its own self-allocated buffer and the same limits.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::NotLoaded` if nothing is loaded.
    pub fn clone_asset(&mut self) -> Result<ImageAsset, AssetError> {
        self.last_error.clear();
        let result = self.require_loaded().and_then(|_| {
            let mut copy = ImageAsset::with_limits(self.limits);
            copy.load_pixels(
                self.buffer.as_slice(),
                as_i32(self.width),
                as_i32(self.height),
                as_i32(self.channel_count),
            )?;
            Ok(copy)
        });
        self.last_error.record(result)
    }

    fn require_loaded(&self) -> Result<(), AssetError> {
        if self.buffer.is_null() {
            Err(AssetError::NotLoaded)
        } else {
            Ok(())
        }
    }

    fn view(&self) -> Result<PixelView<'_>, AssetError> {
        self.require_loaded()?;
        PixelView::new(
            self.buffer.as_slice(),
            self.width,
            self.height,
            self.channel_count,
        )
    }

    fn copy_pixels(
        pixels: &[u8],
        width: i32,
        height: i32,
        channel_count: i32,
    ) -> Result<DecodedImage, AssetError> {
        let invalid = || AssetError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
            channel_count: channel_count.into(),
        };
        let positive = |v: i32| u32::try_from(v).ok().filter(|v| *v > 0);
        let (Some(w), Some(h), Some(c)) = (positive(width), positive(height), positive(channel_count))
        else {
            return Err(invalid());
        };

        let expected = pixel_len(w, h, c).ok_or_else(invalid)?;
        if pixels.len() != expected {
            return Err(AssetError::PixelDataMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(DecodedImage {
            width: w,
            height: h,
            channel_count: c,
            buffer: PixelBuffer::copy_from(pixels)?,
        })
    }

    /// Swap in a new image, releasing the old buffer.
    fn commit(&mut self, image: DecodedImage) {
        debug_assert!(image.is_consistent(), "inconsistent decoded image: {:?}", image);
        let DecodedImage {
            width,
            height,
            channel_count,
            buffer,
        } = image;

        self.buffer.release();
        self.buffer = buffer;
        self.width = width;
        self.height = height;
        self.channel_count = channel_count;
        log::debug!(
            "committed {}x{} image with {} channels ({:?})",
            width,
            height,
            channel_count,
            self.buffer.origin()
        );
    }
}

/// Metadata never exceeds `i32::MAX` in practice; saturate rather than wrap.
fn as_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
