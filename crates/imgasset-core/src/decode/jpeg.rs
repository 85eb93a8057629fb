//! JPEG decoding to fixed 3-channel RGB, bottom-up.
//!
//! With the `turbojpeg` feature (on by default), decoding is a two-phase
//! libjpeg-turbo pipeline, each phase with its own transient handle that is
//! destroyed when it goes out of scope, including on error paths:
//! 1. A lossless vertical flip applied to the compressed bitstream (on the
//!    encoded coefficients, not on decoded pixels).
//! 2. Header read and decompression of the flipped stream into a
//!    self-allocated RGB buffer.
//!
//! Building with `default-features = false` drops the libjpeg-turbo
//! dependency. The `image` crate's JPEG decoder then probes the header,
//! decompresses into a self-allocated buffer, and the rows are flipped in
//! place. Layout and error contract are the same.

use super::DecodedImage;
use crate::error::AssetError;
use crate::limits::Limits;

/// JPEG output is always RGB.
pub(crate) const JPEG_CHANNELS: u32 = 3;

pub(crate) fn decode(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
    backend::decode(bytes, limits)
}

#[cfg(feature = "turbojpeg")]
mod backend {
    use turbojpeg::{Decompressor, Image, OwnedBuf, PixelFormat, Transform, TransformOp, Transformer};

    use super::JPEG_CHANNELS;
    use crate::buffer::{pixel_len, PixelBuffer};
    use crate::decode::DecodedImage;
    use crate::error::AssetError;
    use crate::limits::Limits;

    fn codec_error(err: turbojpeg::Error) -> AssetError {
        AssetError::Format(err.to_string())
    }

    pub(super) fn decode(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
        let flipped = flip_bitstream(bytes)?;
        decompress(&flipped, limits)
    }

    /// Phase 1: lossless vertical flip of the compressed stream.
    pub(super) fn flip_bitstream(bytes: &[u8]) -> Result<OwnedBuf, AssetError> {
        let mut transformer = Transformer::new().map_err(codec_error)?;
        transformer
            .transform_to_owned(&Transform::op(TransformOp::Vflip), bytes)
            .map_err(codec_error)
    }

    /// Phase 2: decompress the flipped stream into RGB.
    fn decompress(jpeg: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
        let mut decompressor = Decompressor::new().map_err(codec_error)?;
        let header = decompressor.read_header(jpeg).map_err(codec_error)?;
        log::trace!(
            "jpeg header: {}x{}, subsampling {:?}, colorspace {:?}",
            header.width,
            header.height,
            header.subsamp,
            header.colorspace
        );

        let invalid = || AssetError::InvalidDimensions {
            width: header.width as i64,
            height: header.height as i64,
            channel_count: JPEG_CHANNELS.into(),
        };
        let width = u32::try_from(header.width).map_err(|_| invalid())?;
        let height = u32::try_from(header.height).map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        limits.check(width, height, JPEG_CHANNELS)?;

        let size = pixel_len(width, height, JPEG_CHANNELS).ok_or_else(invalid)?;
        let mut buffer = PixelBuffer::allocate(size)?;
        let pitch = header.width * JPEG_CHANNELS as usize;
        let output = Image {
            pixels: buffer.as_mut_slice(),
            width: header.width,
            pitch,
            height: header.height,
            format: PixelFormat::RGB,
        };
        decompressor.decompress(jpeg, output).map_err(codec_error)?;

        Ok(DecodedImage {
            width,
            height,
            channel_count: JPEG_CHANNELS,
            buffer,
        })
    }
}

#[cfg(not(feature = "turbojpeg"))]
mod backend {
    use std::io::Cursor;

    use image::codecs::jpeg::JpegDecoder;
    use image::{ColorType, ImageDecoder};

    use super::JPEG_CHANNELS;
    use crate::buffer::{pixel_len, PixelBuffer};
    use crate::decode::{flip_rows, DecodedImage};
    use crate::error::AssetError;
    use crate::limits::Limits;

    pub(super) fn decode(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
        let mut decoder = JpegDecoder::new(Cursor::new(bytes))?;
        decoder.set_limits(limits.to_image_limits())?;

        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();
        log::trace!("jpeg header: {}x{}, color {:?}", width, height, color);

        let invalid = || AssetError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
            channel_count: JPEG_CHANNELS.into(),
        };
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        limits.check(width, height, JPEG_CHANNELS)?;

        let size = pixel_len(width, height, JPEG_CHANNELS).ok_or_else(invalid)?;
        let mut buffer = PixelBuffer::allocate(size)?;
        match color {
            ColorType::Rgb8 => decoder.read_image(buffer.as_mut_slice())?,
            ColorType::L8 => {
                let mut gray = vec![0u8; (width as usize) * (height as usize)];
                decoder.read_image(&mut gray)?;
                for (value, rgb) in gray
                    .iter()
                    .zip(buffer.as_mut_slice().chunks_exact_mut(3))
                {
                    rgb.fill(*value);
                }
            }
            other => {
                return Err(AssetError::Format(format!(
                    "unsupported jpeg color type {:?}",
                    other
                )))
            }
        }
        flip_rows(buffer.as_mut_slice(), width as usize * JPEG_CHANNELS as usize);

        Ok(DecodedImage {
            width,
            height,
            channel_count: JPEG_CHANNELS,
            buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferOrigin;
    use crate::decode::fixtures::*;

    // Minimal valid JPEG bytes (1x1 gray pixel)
    const MINIMAL_JPEG: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x08, 0x06, 0x06, 0x07, 0x06,
        0x05, 0x08, 0x07, 0x07, 0x07, 0x09, 0x09, 0x08, 0x0A, 0x0C, 0x14, 0x0D, 0x0C, 0x0B, 0x0B,
        0x0C, 0x19, 0x12, 0x13, 0x0F, 0x14, 0x1D, 0x1A, 0x1F, 0x1E, 0x1D, 0x1A, 0x1C, 0x1C, 0x20,
        0x24, 0x2E, 0x27, 0x20, 0x22, 0x2C, 0x23, 0x1C, 0x1C, 0x28, 0x37, 0x29, 0x2C, 0x30, 0x31,
        0x34, 0x34, 0x34, 0x1F, 0x27, 0x39, 0x3D, 0x38, 0x32, 0x3C, 0x2E, 0x33, 0x34, 0x32, 0xFF,
        0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00,
        0x1F, 0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
        0xFF, 0xC4, 0x00, 0xB5, 0x10, 0x00, 0x02, 0x01, 0x03, 0x03, 0x02, 0x04, 0x03, 0x05, 0x05,
        0x04, 0x04, 0x00, 0x00, 0x01, 0x7D, 0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21,
        0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08,
        0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A,
        0x16, 0x17, 0x18, 0x19, 0x1A, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37,
        0x38, 0x39, 0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56,
        0x57, 0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
        0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93,
        0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9,
        0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6,
        0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2,
        0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
        0xF8, 0xF9, 0xFA, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, 0xFB, 0xD5,
        0xDB, 0x20, 0xA8, 0xF1, 0x7E, 0xFF, 0xD9,
    ];

    /// Top half bright red, bottom half dark blue, in 16-row bands so the
    /// split falls on an MCU boundary.
    fn two_band_rgb(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::new();
        for y in 0..height {
            for _ in 0..width {
                if y < height / 2 {
                    pixels.extend_from_slice(&[240, 16, 16]);
                } else {
                    pixels.extend_from_slice(&[16, 16, 240]);
                }
            }
        }
        pixels
    }

    #[test]
    fn test_decode_minimal_jpeg() {
        let image = decode(MINIMAL_JPEG, &Limits::none()).unwrap();
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.channel_count, 3);
        assert_eq!(image.buffer.len(), 3);
        assert_eq!(image.buffer.origin(), BufferOrigin::SelfAllocated);
    }

    #[test]
    fn test_gray_jpeg_expands_to_rgb() {
        let image = decode(MINIMAL_JPEG, &Limits::none()).unwrap();
        let px = image.buffer.as_slice();
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_decode_is_bottom_up() {
        let jpeg = encode_jpeg(&two_band_rgb(16, 32), 16, 32);
        let image = decode(&jpeg, &Limits::none()).unwrap();
        assert_eq!((image.width, image.height, image.channel_count), (16, 32, 3));

        let px = image.buffer.as_slice();
        // Row 0 is the bottom scanline: blue
        assert!(px[2] > 200 && px[0] < 60, "row 0 should be blue: {:?}", &px[..3]);
        // Last row is the top scanline: red
        let last = px.len() - 3;
        assert!(
            px[last] > 200 && px[last + 2] < 60,
            "last row should be red: {:?}",
            &px[last..]
        );
    }

    #[test]
    fn test_decode_invalid_jpeg() {
        let result = decode(&[0xFF, 0xD8, 0x00, 0x01, 0x02], &Limits::none());
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_truncated_jpeg() {
        let result = decode(&MINIMAL_JPEG[0..20], &Limits::none());
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode(&[], &Limits::none()).is_err());
    }

    #[test]
    fn test_decode_respects_limits() {
        let jpeg = encode_jpeg(&two_band_rgb(16, 32), 16, 32);
        let result = decode(&jpeg, &Limits::none().with_max_height(16));
        assert!(matches!(result, Err(AssetError::LimitExceeded(_))));
    }

    #[cfg(feature = "turbojpeg")]
    #[test]
    fn test_flipped_bitstream_is_upside_down() {
        let jpeg = encode_jpeg(&two_band_rgb(16, 32), 16, 32);
        let flipped = backend::flip_bitstream(&jpeg).unwrap();
        assert!(crate::decode::is_jpeg_data(&flipped));

        // Read top-down by an independent decoder, the flipped stream starts blue
        let image = image::load_from_memory(&flipped).unwrap().into_rgb8();
        assert_eq!(image.dimensions(), (16, 32));
        let top = image.get_pixel(0, 0).0;
        let bottom = image.get_pixel(0, 31).0;
        assert!(top[2] > 200 && top[0] < 60, "top should be blue: {:?}", top);
        assert!(bottom[0] > 200 && bottom[2] < 60, "bottom should be red: {:?}", bottom);
    }

    #[cfg(feature = "turbojpeg")]
    #[test]
    fn test_flip_bitstream_rejects_garbage() {
        let result = backend::flip_bitstream(&[0xFF, 0xD8, 0x00, 0x01]);
        assert!(matches!(result, Err(AssetError::Format(_))));
    }
}
