//! Editor configuration.
//!
//! The filter table is compiled in; configuration only picks which set of it
//! the editor exposes and how exports are named and encoded. Every field has a
//! default, so an empty object deserializes to the basic editor.

use serde::{Deserialize, Serialize};

use crate::encode::DEFAULT_JPEG_QUALITY;
use crate::filters::FilterSet;

/// Options for the export sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Download name for the exported file.
    pub filename: String,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: "image.jpg".to_string(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub filter_set: FilterSet,
    pub export: ExportOptions,
}

impl EditorConfig {
    pub fn new(filter_set: FilterSet) -> Self {
        Self {
            filter_set,
            ..Self::default()
        }
    }
}
