//! Rectangular clipping.
//!
//! A region `(x, y, w, h)` maps onto storage rows `[height - y - h, height - y)`
//! and columns `[x, x + w)`. `y` is counted from the end of the buffer, so on
//! a bottom-up buffer `y = 0` is the top scanline of the source as encoded.
//! A consumer that presents the buffer bottom-up (row 0 drawn at the bottom)
//! sees this as a bottom-left origin with Y growing upward in its flipped
//! texture space.
//!
//! # Example
//!
//! ```ignore
//! // 4x4 RGB image, keep the centre 2x2 block (storage rows 1-2, columns 1-2)
//! let view = PixelView::new(&pixels, 4, 4, 3)?;
//! let clipped = clip(view, 1, 1, 2, 2)?;
//! assert_eq!(clipped.buffer.len(), 12);
//! ```

use std::ops::Range;

use super::PixelView;
use crate::buffer::{pixel_len, PixelBuffer};
use crate::decode::DecodedImage;
use crate::error::AssetError;

/// A validated clip region in storage coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipBounds {
    /// Storage rows, bottom-up.
    pub rows: Range<usize>,
    /// Pixel columns.
    pub columns: Range<usize>,
}

/// Translate a region into storage rows and columns.
///
/// # Errors
///
/// - `AssetError::SizeOverflow` if any edge falls outside `[0, width]` /
///   `[0, height]`, or the region has a negative size
/// - `AssetError::InvalidDimensions` if the region is empty
pub fn clip_bounds(
    image_width: u32,
    image_height: u32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Result<ClipBounds, AssetError> {
    let (image_w, image_h) = (i64::from(image_width), i64::from(image_height));
    let (x, y, w, h) = (i64::from(x), i64::from(y), i64::from(width), i64::from(height));

    let start_line = image_h - y - h;
    let end_line = image_h - y;
    let start_pixel = x;
    let end_pixel = x + w;

    let in_rows = |v: i64| (0..=image_h).contains(&v);
    let in_columns = |v: i64| (0..=image_w).contains(&v);
    if !in_rows(start_line)
        || !in_rows(end_line)
        || !in_columns(start_pixel)
        || !in_columns(end_pixel)
        || w < 0
        || h < 0
    {
        return Err(AssetError::SizeOverflow);
    }
    if w == 0 || h == 0 {
        return Err(AssetError::InvalidDimensions {
            width: w,
            height: h,
            channel_count: 0,
        });
    }

    // All four values are within [0, u32::MAX] here
    Ok(ClipBounds {
        rows: start_line as usize..end_line as usize,
        columns: start_pixel as usize..end_pixel as usize,
    })
}

/// Copy a region of `view` into a new self-allocated buffer.
///
/// Bounds are validated before anything is allocated.
pub fn clip(
    view: PixelView<'_>,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Result<DecodedImage, AssetError> {
    let bounds = clip_bounds(view.width(), view.height(), x, y, width, height)?;
    let channels = view.channel_count() as usize;
    let out_width = bounds.columns.len() as u32;
    let out_height = bounds.rows.len() as u32;

    let size = pixel_len(out_width, out_height, view.channel_count()).ok_or(
        AssetError::InvalidDimensions {
            width: out_width.into(),
            height: out_height.into(),
            channel_count: view.channel_count().into(),
        },
    )?;
    let mut buffer = PixelBuffer::allocate(size)?;

    let column_bytes = bounds.columns.start * channels..bounds.columns.end * channels;
    let source_rows = view
        .pixels()
        .chunks_exact(view.stride())
        .skip(bounds.rows.start);
    let dest_rows = buffer.as_mut_slice().chunks_exact_mut(column_bytes.len());
    for (dst, src) in dest_rows.zip(source_rows) {
        dst.copy_from_slice(&src[column_bytes.clone()]);
    }

    Ok(DecodedImage {
        width: out_width,
        height: out_height,
        channel_count: view.channel_count(),
        buffer,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
