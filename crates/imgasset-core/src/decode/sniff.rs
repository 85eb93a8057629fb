//! Magic-number sniffing.

use super::Backend;

/// How many leading bytes of a source are inspected.
pub const SNIFF_LEN: usize = 16;

// "RIFF" <u32 size> "WEBP"
const RIFF_TAG: &[u8; 4] = b"RIFF";
const WEBP_TAG: &[u8; 4] = b"WEBP";

// Start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Check for the RIFF/WEBP container header at offset 0.
#[inline]
pub fn is_webp_data(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == RIFF_TAG && &data[8..12] == WEBP_TAG
}

/// Check for the JPEG start-of-image marker at offset 0.
#[inline]
pub fn is_jpeg_data(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == JPEG_SOI[0] && data[1] == JPEG_SOI[1]
}

/// Pick a backend from the leading bytes of a source.
///
/// Only the first [`SNIFF_LEN`] bytes are looked at. Anything that is neither
/// WebP nor JPEG goes to the generic backend, which does its own probing.
pub fn sniff(data: &[u8]) -> Backend {
    let prefix = &data[..data.len().min(SNIFF_LEN)];
    if is_webp_data(prefix) {
        Backend::WebP
    } else if is_jpeg_data(prefix) {
        Backend::Jpeg
    } else {
        Backend::Generic
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
