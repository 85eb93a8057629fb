//! imgasset Core - Image asset decode and transform engine
//!
//! This crate loads encoded images (WebP, JPEG and the common formats the
//! `image` crate reads) into an [`ImageAsset`], a single bottom-up pixel
//! buffer with width, height and channel count, and provides clip, resize,
//! copy-out and clone operations on it.

pub mod asset;
pub mod buffer;
pub mod decode;
pub mod error;
pub mod limits;
pub mod transform;

pub use asset::ImageAsset;
pub use buffer::{BufferOrigin, PixelBuffer};
pub use decode::{Backend, DecodedImage};
pub use error::{AssetError, ErrorKind, LastError};
pub use limits::Limits;
pub use transform::PixelView;
