//! Image decoding.
//!
//! This module provides:
//! - Format sniffing on the first 16 bytes of a source
//! - Three independent decode backends (generic multi-format, WebP, JPEG)
//! - A neutral [`DecodedImage`] every backend returns
//!
//! # Orientation
//!
//! Every backend produces **bottom-up** storage: row 0 of the buffer is the
//! bottom scanline of the source image, rows are tightly packed at
//! `width * channel_count` bytes with no padding.
//!
//! | Backend   | Channels       | How bottom-up is reached                          |
//! |-----------|----------------|---------------------------------------------------|
//! | `Generic` | native (1..=4) | rows flipped on the decoded buffer, per call      |
//! | `WebP`    | 4 (RGBA)       | rows written from the last destination row back   |
//! | `Jpeg`    | 3 (RGB)        | lossless vertical flip of the bitstream (`turbojpeg`), or a row flip |
//!
//! # Examples
//!
//! ```ignore
//! use imgasset_core::decode::{decode_bytes, Backend};
//! use imgasset_core::Limits;
//!
//! let bytes = std::fs::read("photo.webp").unwrap();
//! let image = decode_bytes(&bytes, &Limits::none()).unwrap();
//! assert_eq!(image.channel_count, 4);
//! ```

mod generic;
mod jpeg;
mod sniff;
mod webp;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::AssetError;
use crate::limits::Limits;

pub use sniff::{is_jpeg_data, is_webp_data, sniff, SNIFF_LEN};

/// The decode strategy chosen for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Multi-format loader (PNG, GIF, BMP, TGA, PNM, TIFF, ICO, ...).
    Generic,
    /// libwebp, fixed RGBA output.
    WebP,
    /// JPEG, fixed RGB output.
    Jpeg,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Generic => "generic",
            Backend::WebP => "webp",
            Backend::Jpeg => "jpeg",
        }
    }

    /// Decode an in-memory source with this backend.
    pub fn decode(self, bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
        match self {
            Backend::Generic => generic::decode_bytes(bytes, limits),
            Backend::WebP => webp::decode(bytes, limits),
            Backend::Jpeg => jpeg::decode(bytes, limits),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded image in bottom-up, tightly packed layout.
#[derive(Debug)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bytes per pixel.
    pub channel_count: u32,
    /// Pixel data, `width * height * channel_count` bytes.
    pub buffer: PixelBuffer,
}

impl DecodedImage {
    /// Check the buffer invariant: positive dimensions and an exactly sized buffer.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.channel_count > 0
            && crate::buffer::pixel_len(self.width, self.height, self.channel_count)
                == Some(self.buffer.len())
    }
}

/// Sniff and decode an in-memory source.
///
/// # Errors
///
/// Returns the chosen backend's diagnostic on failure.
pub fn decode_bytes(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
    let backend = sniff(bytes);
    log::debug!("decoding {} byte source with the {} backend", bytes.len(), backend);
    backend.decode(bytes, limits)
}

/// Sniff and decode a file.
///
/// Only the first [`SNIFF_LEN`] bytes are read for sniffing, and the file is
/// closed again before decoding. WebP and JPEG sources are then read whole
/// into memory; generic sources are decoded straight from the path.
///
/// # Errors
///
/// - `AssetError::Io` if the file cannot be opened or read, or is empty
/// - The chosen backend's diagnostic if decoding fails
pub fn decode_path(path: &Path, limits: &Limits) -> Result<DecodedImage, AssetError> {
    let backend = {
        let file = File::open(path).map_err(|e| AssetError::Io(e.to_string()))?;
        let mut prefix = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| AssetError::io("failed to detect format (read file)", e))?;
        if prefix.is_empty() {
            return Err(AssetError::Io(
                "failed to detect format (empty file)".to_string(),
            ));
        }
        sniff(&prefix)
    };
    log::debug!("decoding {} with the {} backend", path.display(), backend);

    match backend {
        Backend::Generic => generic::decode_path(path, limits),
        Backend::WebP | Backend::Jpeg => {
            let bytes = std::fs::read(path).map_err(|e| {
                AssetError::io(&format!("Failed to load {} (read file)", backend), e)
            })?;
            backend.decode(&bytes, limits)
        }
    }
}

/// Reverse the row order of a tightly packed buffer in place.
pub(crate) fn flip_rows(pixels: &mut [u8], stride: usize) {
    if stride == 0 {
        return;
    }
    let rows = pixels.len() / stride;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (upper, lower) = pixels.split_at_mut(bottom * stride);
        upper[top * stride..(top + 1) * stride].swap_with_slice(&mut lower[..stride]);
    }
}
