//! Generic multi-format decoding through the `image` crate.
//!
//! The header is probed and checked against the [`Limits`] before any pixels
//! are decoded. The image is returned at its native channel count (gray,
//! gray+alpha, RGB or RGBA, 8 bits per channel). The flip to bottom-up order
//! is applied to each decoded buffer individually, so concurrent decodes on
//! different threads cannot disturb each other's orientation.

use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

use image::{imageops, ColorType, DynamicImage, ImageBuffer, ImageDecoder, ImageReader, Pixel};

use super::{Backend, DecodedImage};
use crate::buffer::PixelBuffer;
use crate::error::AssetError;
use crate::limits::Limits;

/// Decode an in-memory source of any format the `image` crate recognizes.
pub(crate) fn decode_bytes(bytes: &[u8], limits: &Limits) -> Result<DecodedImage, AssetError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AssetError::Io(e.to_string()))?;
    decode_reader(reader, limits)
}

/// Decode straight from a file path.
pub(crate) fn decode_path(path: &Path, limits: &Limits) -> Result<DecodedImage, AssetError> {
    let reader = ImageReader::open(path)
        .map_err(|e| AssetError::Io(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| AssetError::Io(e.to_string()))?;
    decode_reader(reader, limits)
}

fn decode_reader<R: BufRead + Seek>(
    mut reader: ImageReader<R>,
    limits: &Limits,
) -> Result<DecodedImage, AssetError> {
    reader.limits(limits.to_image_limits());
    let decoder = reader.into_decoder()?;

    // Header only so far; no pixel memory until the limits pass
    let (width, height) = decoder.dimensions();
    let channel_count = native_channel_count(decoder.color_type());
    limits.check(width, height, channel_count)?;

    let image = DynamicImage::from_decoder(decoder)?;
    let pixels = into_bottom_up(image, channel_count);
    log::trace!(
        "generic decode: {}x{} with {} channels",
        width,
        height,
        channel_count
    );

    Ok(DecodedImage {
        width,
        height,
        channel_count,
        buffer: PixelBuffer::adopt(pixels, Backend::Generic),
    })
}

/// Channel count as stored in the source, capped at RGBA.
fn native_channel_count(color: ColorType) -> u32 {
    u32::from(color.channel_count()).clamp(1, 4)
}

/// Convert to 8 bits per channel and flip rows to bottom-up order.
fn into_bottom_up(image: DynamicImage, channel_count: u32) -> Vec<u8> {
    match channel_count {
        1 => flipped(image.into_luma8()),
        2 => flipped(image.into_luma_alpha8()),
        3 => flipped(image.into_rgb8()),
        _ => flipped(image.into_rgba8()),
    }
}

fn flipped<P: Pixel<Subpixel = u8>>(mut buffer: ImageBuffer<P, Vec<u8>>) -> Vec<u8> {
    imageops::flip_vertical_in_place(&mut buffer);
    buffer.into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferOrigin;
    use crate::decode::fixtures::*;
    use image::ExtendedColorType;

    #[test]
    fn test_decode_rgb_png_is_bottom_up() {
        let pixels = rgb_pattern(5, 4);
        let png = encode_png(&pixels, 5, 4, ExtendedColorType::Rgb8);

        let image = decode_bytes(&png, &Limits::none()).unwrap();
        assert_eq!((image.width, image.height, image.channel_count), (5, 4, 3));
        assert_eq!(image.buffer.as_slice(), bottom_up(&pixels, 15).as_slice());
        assert_eq!(image.buffer.origin(), BufferOrigin::Foreign(Backend::Generic));
    }

    #[test]
    fn test_decode_keeps_native_gray() {
        let pixels = vec![0u8, 50, 100, 150, 200, 250];
        let png = encode_png(&pixels, 3, 2, ExtendedColorType::L8);

        let image = decode_bytes(&png, &Limits::none()).unwrap();
        assert_eq!(image.channel_count, 1);
        assert_eq!(image.buffer.as_slice(), &[150, 200, 250, 0, 50, 100]);
    }

    #[test]
    fn test_decode_keeps_native_gray_alpha() {
        let pixels = vec![10u8, 255, 20, 128];
        let png = encode_png(&pixels, 1, 2, ExtendedColorType::La8);

        let image = decode_bytes(&png, &Limits::none()).unwrap();
        assert_eq!(image.channel_count, 2);
        assert_eq!(image.buffer.as_slice(), &[20, 128, 10, 255]);
    }

    #[test]
    fn test_decode_keeps_native_rgba() {
        let pixels = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let png = encode_png(&pixels, 1, 2, ExtendedColorType::Rgba8);

        let image = decode_bytes(&png, &Limits::none()).unwrap();
        assert_eq!(image.channel_count, 4);
        assert_eq!(image.buffer.as_slice(), &[5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_16_bit_is_narrowed() {
        // 16-bit gray; extreme values read the same in either byte order
        let pixels = vec![0xFFu8, 0xFF, 0x00, 0x00];
        let png = encode_png(&pixels, 1, 2, ExtendedColorType::L16);

        let image = decode_bytes(&png, &Limits::none()).unwrap();
        assert_eq!(image.channel_count, 1);
        assert_eq!(image.buffer.len(), 2);
        assert_eq!(image.buffer.as_slice(), &[0, 255]);
    }

    #[test]
    fn test_decode_unknown_format() {
        let result = decode_bytes(b"definitely not an image", &Limits::none());
        assert!(matches!(result, Err(AssetError::Format(_))));
    }

    #[test]
    fn test_decode_truncated_png() {
        let png = encode_png(&rgb_pattern(8, 8), 8, 8, ExtendedColorType::Rgb8);
        let result = decode_bytes(&png[..png.len() / 2], &Limits::none());
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_respects_limits() {
        let png = encode_png(&rgb_pattern(8, 8), 8, 8, ExtendedColorType::Rgb8);
        let result = decode_bytes(&png, &Limits::none().with_max_pixels(10));
        assert!(matches!(result, Err(AssetError::LimitExceeded(_))));

        let result = decode_bytes(&png, &Limits::none().with_max_width(4));
        assert!(matches!(result, Err(AssetError::LimitExceeded(_))));
    }

    #[test]
    fn test_limits_checked_before_pixel_data() {
        // Header intact, pixel data cut short: the limit wins over the truncation
        let png = encode_png(&rgb_pattern(64, 64), 64, 64, ExtendedColorType::Rgb8);
        let truncated = &png[..png.len() - 20];

        let result = decode_bytes(truncated, &Limits::none().with_max_pixels(100));
        assert!(matches!(result, Err(AssetError::LimitExceeded(_))));

        let result = decode_bytes(truncated, &Limits::none());
        assert!(matches!(result, Err(AssetError::Format(_))));
    }

    #[test]
    fn test_native_channel_count() {
        assert_eq!(native_channel_count(ColorType::L8), 1);
        assert_eq!(native_channel_count(ColorType::La16), 2);
        assert_eq!(native_channel_count(ColorType::Rgb32F), 3);
        assert_eq!(native_channel_count(ColorType::Rgba8), 4);
    }

    #[test]
    fn test_decode_path_missing() {
        let result = decode_path(Path::new("/nonexistent/dir/image.png"), &Limits::none());
        assert!(matches!(result, Err(AssetError::Io(_))));
    }
}
