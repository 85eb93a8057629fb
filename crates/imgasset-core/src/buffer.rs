//! Pixel memory with a tagged origin.
//!
//! Decode backends hand their output over in different ways: some fill a
//! buffer allocated here, others produce their own allocation which is adopted
//! without a copy. [`PixelBuffer`] records where the memory came from in a
//! [`BufferOrigin`]. Every region is a `Vec<u8>`, so release is the same drop
//! for either origin; the tag is kept for callers and for diagnostics.

use std::fmt;

use crate::decode::Backend;
use crate::error::AssetError;

/// Who produced a pixel region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOrigin {
    /// Allocated by [`PixelBuffer::allocate`].
    SelfAllocated,
    /// Produced by a decode backend and adopted as-is.
    Foreign(Backend),
}

/// A pixel region plus its origin tag.
///
/// A null region (`is_null()`) is the canonical "nothing held" state.
/// Releasing clears the region, so releasing twice is a no-op.
pub struct PixelBuffer {
    region: Option<Vec<u8>>,
    origin: BufferOrigin,
}

impl PixelBuffer {
    /// A null region tagged as self-allocated.
    pub const fn empty() -> Self {
        Self {
            region: None,
            origin: BufferOrigin::SelfAllocated,
        }
    }

    /// Allocate a zero-filled region of `size` bytes.
    ///
    /// A zero size yields a null region; this is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::OutOfMemory` if the allocator refuses the request.
    pub fn allocate(size: usize) -> Result<Self, AssetError> {
        if size == 0 {
            return Ok(Self::empty());
        }

        let mut region = Vec::new();
        region
            .try_reserve_exact(size)
            .map_err(|_| AssetError::OutOfMemory(size))?;
        region.resize(size, 0);

        log::trace!("allocated {} byte pixel buffer", size);
        Ok(Self {
            region: Some(region),
            origin: BufferOrigin::SelfAllocated,
        })
    }

    /// Allocate a region and fill it with a copy of `bytes`.
    pub fn copy_from(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut buffer = Self::allocate(bytes.len())?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    /// Take ownership of memory produced by a decode backend.
    pub fn adopt(pixels: Vec<u8>, backend: Backend) -> Self {
        if pixels.is_empty() {
            return Self::empty();
        }
        Self {
            region: Some(pixels),
            origin: BufferOrigin::Foreign(backend),
        }
    }

    /// Release the region. No-op when already null.
    pub fn release(&mut self) {
        let Some(region) = self.region.take() else {
            return;
        };
        log::trace!("releasing {} byte buffer ({:?})", region.len(), self.origin);
    }

    pub fn origin(&self) -> BufferOrigin {
        self.origin
    }

    pub fn is_null(&self) -> bool {
        self.region.is_none()
    }

    /// Length of the region in bytes (0 when null).
    pub fn len(&self) -> usize {
        self.region.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.region.as_deref().unwrap_or_default()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.region.as_deref_mut().unwrap_or_default()
    }
}

/// Byte length of a tightly packed `width * height * channel_count` image,
/// or `None` if it does not fit in `usize`.
pub(crate) fn pixel_len(width: u32, height: u32, channel_count: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channel_count as usize)
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.len())
            .field("origin", &self.origin)
            .finish()
    }
}
