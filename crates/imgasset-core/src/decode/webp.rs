//! WebP decoding through libwebp.
//!
//! Decoding runs in two phases:
//! 1. Probe the header (dimensions) and the bitstream features. Both must
//!    succeed, and the limits must pass, before any pixel memory is allocated.
//! 2. Decode straight into a self-allocated RGBA buffer handed to libwebp as
//!    external memory. The output descriptor starts at the last row with a
//!    negative stride, so the top scanline lands at the end of the buffer and
//!    the result is bottom-up without a separate flip pass.
//!
//! Scaling is off and multi-threaded decoding is requested. libwebp failures
//! carry the numeric `VP8StatusCode`.

use std::ffi::c_int;

use libwebp_sys::{
    VP8StatusCode, WebPDecode, WebPDecoderConfig, WebPFreeDecBuffer, WebPGetFeatures, WebPGetInfo,
    WebPRGBABuffer, WEBP_CSP_MODE,
};

use super::DecodedImage;
use crate::buffer::{pixel_len, PixelBuffer};
use crate::error::AssetError;
use crate::limits::Limits;

/// WebP output is always RGBA.
pub(crate) const WEBP_CHANNELS: u32 = 4;

pub(crate) fn decode(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
    let (width, height) = probe_dimensions(bytes)?;
    limits.check(width, height, WEBP_CHANNELS)?;

    let mut config = WebPDecoderConfig::new()
        .map_err(|()| AssetError::Format("Failed to initialize decoder config".to_string()))?;
    config.options.use_threads = 1;
    config.options.use_scaling = 0;

    // SAFETY: `bytes` is valid for `bytes.len()` reads and `config.input` is an
    // initialized struct owned by this frame.
    let status = unsafe { WebPGetFeatures(bytes.as_ptr(), bytes.len(), &mut config.input) };
    check_status("Failed to call WebPGetFeatures", status)?;
    log::trace!(
        "webp features: {}x{}, alpha {}, animation {}",
        config.input.width,
        config.input.height,
        config.input.has_alpha != 0,
        config.input.has_animation != 0
    );

    let invalid = || AssetError::InvalidDimensions {
        width: width.into(),
        height: height.into(),
        channel_count: WEBP_CHANNELS.into(),
    };
    let size = pixel_len(width, height, WEBP_CHANNELS).ok_or_else(invalid)?;
    let stride = width as usize * WEBP_CHANNELS as usize;
    let c_stride = c_int::try_from(stride).map_err(|_| invalid())?;
    let mut buffer = PixelBuffer::allocate(size)?;

    let pixels = buffer.as_mut_slice();
    let last_row = pixels.len() - stride;
    config.output.colorspace = WEBP_CSP_MODE::MODE_RGBA;
    config.output.is_external_memory = 1;
    // Both came from c_int in the probe
    config.output.width = width as c_int;
    config.output.height = height as c_int;
    config.output.u.RGBA = WebPRGBABuffer {
        rgba: pixels.as_mut_ptr().wrapping_add(last_row),
        stride: -c_stride,
        size: pixels.len(),
    };

    // SAFETY: the output descriptor spans exactly `pixels`: it starts at the
    // last row and steps back `height - 1` strides to offset 0. `pixels` stays
    // mutably borrowed, and so unaliased, until the call returns.
    let status = unsafe { WebPDecode(bytes.as_ptr(), bytes.len(), &mut config) };
    // SAFETY: libwebp never frees external memory; this only drops its own
    // scratch state. `config.output` is not read afterwards.
    unsafe { WebPFreeDecBuffer(&mut config.output) };
    check_status("Failed to call WebPDecode", status)?;

    Ok(DecodedImage {
        width,
        height,
        channel_count: WEBP_CHANNELS,
        buffer,
    })
}

/// Read the canvas size from the header.
fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), AssetError> {
    let info_error = || AssetError::Format("Failed to get webp info".to_string());
    let (mut width, mut height): (c_int, c_int) = (0, 0);

    // SAFETY: `bytes` is valid for `bytes.len()` reads; both out-pointers refer
    // to locals.
    let ok = unsafe { WebPGetInfo(bytes.as_ptr(), bytes.len(), &mut width, &mut height) };
    if ok == 0 {
        return Err(info_error());
    }

    let positive = |v: c_int| u32::try_from(v).ok().filter(|v| *v > 0);
    match (positive(width), positive(height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(info_error()),
    }
}

fn check_status(context: &str, status: VP8StatusCode) -> Result<(), AssetError> {
    if status == VP8StatusCode::VP8_STATUS_OK {
        return Ok(());
    }
    log::debug!("{} failed with {:?}", context, status);
    Err(AssetError::Format(format!("{}: {}", context, status as i32)))
}
