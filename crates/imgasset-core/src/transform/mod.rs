//! Geometry operations on decoded, bottom-up pixel buffers.
//!
//! Both operations read a [`PixelView`] and return a freshly allocated
//! [`DecodedImage`](crate::decode::DecodedImage); the source is never touched,
//! so a failed call leaves the caller's buffer as it was.
//!
//! # Coordinate System
//!
//! - Storage is bottom-up: row 0 is the bottom scanline
//! - Clip coordinates are in pixels; `y` is counted from the last storage
//!   row (see [`clip_bounds`])
//! - Resize uses nearest-neighbor sampling, no interpolation

mod crop;
mod resize;

pub use crop::{clip, clip_bounds, ClipBounds};
pub use resize::{resize_nearest, source_index};

use crate::buffer::pixel_len;
use crate::error::AssetError;

/// A borrowed, tightly packed pixel buffer with its dimensions.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
    channel_count: u32,
}

impl<'a> PixelView<'a> {
    /// Wrap `pixels`, checking they hold exactly `width * height * channel_count` bytes.
    ///
    /// # Errors
    ///
    /// - `AssetError::InvalidDimensions` if any dimension is zero
    /// - `AssetError::PixelDataMismatch` if the length does not match
    pub fn new(
        pixels: &'a [u8],
        width: u32,
        height: u32,
        channel_count: u32,
    ) -> Result<Self, AssetError> {
        let invalid = || AssetError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
            channel_count: channel_count.into(),
        };
        if width == 0 || height == 0 || channel_count == 0 {
            return Err(invalid());
        }
        let expected = pixel_len(width, height, channel_count).ok_or_else(invalid)?;
        if pixels.len() != expected {
            return Err(AssetError::PixelDataMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            channel_count,
        })
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channel_count as usize
    }
}
