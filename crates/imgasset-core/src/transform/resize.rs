//! Nearest-neighbor resizing.
//!
//! Destination pixel `(ix, iy)` takes source pixel
//! `(floor(ix * src_width / width), floor(iy * src_height / height))`.
//! Works for any channel count; each pixel is copied as a whole.

use super::PixelView;
use crate::buffer::{pixel_len, PixelBuffer};
use crate::decode::DecodedImage;
use crate::error::AssetError;

/// Source coordinate sampled for destination coordinate `dest` along one axis.
#[inline]
pub fn source_index(dest: u32, source_len: u32, dest_len: u32) -> usize {
    (u64::from(dest) * u64::from(source_len) / u64::from(dest_len)) as usize
}

/// Resize `view` to `width x height` with nearest-neighbor sampling.
///
/// # Errors
///
/// - `AssetError::InvalidDimensions` if `width` or `height` is not positive
/// - `AssetError::OutOfMemory` if the destination cannot be allocated
pub fn resize_nearest(
    view: PixelView<'_>,
    width: i32,
    height: i32,
) -> Result<DecodedImage, AssetError> {
    let channel_count = view.channel_count();
    let invalid = || AssetError::InvalidDimensions {
        width: width.into(),
        height: height.into(),
        channel_count: channel_count.into(),
    };
    let out_width = u32::try_from(width).ok().filter(|w| *w > 0).ok_or_else(invalid)?;
    let out_height = u32::try_from(height).ok().filter(|h| *h > 0).ok_or_else(invalid)?;

    let size = pixel_len(out_width, out_height, channel_count).ok_or_else(invalid)?;
    let mut buffer = PixelBuffer::allocate(size)?;

    let channels = channel_count as usize;
    let source = view.pixels();
    let source_stride = view.stride();

    // The output buffer is the only allocation
    let dest_stride = out_width as usize * channels;
    for (iy, dest_row) in buffer.as_mut_slice().chunks_exact_mut(dest_stride).enumerate() {
        let py = source_index(iy as u32, view.height(), out_height);
        let source_row = &source[py * source_stride..(py + 1) * source_stride];
        for (ix, dest_px) in dest_row.chunks_exact_mut(channels).enumerate() {
            let offset = source_index(ix as u32, view.width(), out_width) * channels;
            dest_px.copy_from_slice(&source_row[offset..offset + channels]);
        }
    }

    Ok(DecodedImage {
        width: out_width,
        height: out_height,
        channel_count,
        buffer,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
