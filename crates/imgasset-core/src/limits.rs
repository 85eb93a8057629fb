//! Decode limits.
//!
//! Every backend probes the header first and checks the reported dimensions
//! against [`Limits`] before allocating any pixel memory.

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Caps on decoded image size. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,
    /// Maximum image height in pixels.
    pub max_height: Option<u32>,
    /// Maximum total pixels (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum size of the decoded pixel buffer in bytes.
    pub max_bytes: Option<u64>,
}

impl Limits {
    /// No limits.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    /// Check a probed header against the limits.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::LimitExceeded` naming the first limit violated.
    pub fn check(&self, width: u32, height: u32, channel_count: u32) -> Result<(), AssetError> {
        if let Some(max) = self.max_width {
            if width > max {
                return Err(AssetError::LimitExceeded(format!(
                    "width {} exceeds {}",
                    width, max
                )));
            }
        }
        if let Some(max) = self.max_height {
            if height > max {
                return Err(AssetError::LimitExceeded(format!(
                    "height {} exceeds {}",
                    height, max
                )));
            }
        }

        let pixels = width as u64 * height as u64;
        if let Some(max) = self.max_pixels {
            if pixels > max {
                return Err(AssetError::LimitExceeded(format!(
                    "{} pixels exceeds {}",
                    pixels, max
                )));
            }
        }
        if let Some(max) = self.max_bytes {
            let bytes = pixels.saturating_mul(channel_count as u64);
            if bytes > max {
                return Err(AssetError::LimitExceeded(format!(
                    "{} bytes exceeds {}",
                    bytes, max
                )));
            }
        }
        Ok(())
    }

    /// Equivalent limits for the `image` crate's own decoders.
    ///
    /// Starts from no limits, so `Limits::none()` adds no allocation cap.
    pub(crate) fn to_image_limits(self) -> image::Limits {
        let mut limits = image::Limits::no_limits();
        limits.max_image_width = self.max_width;
        limits.max_image_height = self.max_height;
        limits.max_alloc = self.max_bytes;
        limits
    }
}
