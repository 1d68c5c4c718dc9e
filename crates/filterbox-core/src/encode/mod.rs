//! Image encoding for export.
//!
//! Exported images are always JPEG. All operations are synchronous.

mod jpeg;

pub use jpeg::{encode_jpeg, encode_rgba_jpeg, flatten_on_black, EncodeError, DEFAULT_JPEG_QUALITY};
