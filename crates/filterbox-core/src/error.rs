//! Session-level error type.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Errors surfaced by the editing session.
///
/// None of these are fatal: the session is left in its previous state and the
/// user can retry the action.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A parameter id outside the configured filter set was used.
    #[error("Unknown filter parameter: {0}")]
    InvalidParameter(String),

    /// Preview or export was requested before any image was loaded.
    #[error("No image loaded")]
    NoImageLoaded,

    /// The supplied file could not be decoded as an image.
    #[error("Could not decode image: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// The export surface could not be encoded.
    #[error("Could not encode image: {0}")]
    Encode(#[from] EncodeError),
}
