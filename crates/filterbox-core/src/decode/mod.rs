//! Image decoding for Filterbox.
//!
//! This module provides functionality for:
//! - Decoding any supported raster format (JPEG, PNG, GIF, WebP, BMP)
//! - Applying EXIF orientation the way browsers do
//!
//! All operations are synchronous; the session models load completion
//! separately.

mod bitmap;
mod types;

pub use bitmap::{decode_image, get_orientation};
pub use types::{DecodeError, DecodedImage, Orientation};
