//! Filterbox WASM - WebAssembly bindings for the Filterbox editor
//!
//! This crate exposes `filterbox-core` to the browser: an [`ImageEditor`]
//! holding the session, a preview sink that writes inline CSS, and a canvas
//! surface for drawing with the browser's own filters.
//!
//! # Module Structure
//!
//! - `editor` - The `ImageEditor` class
//! - `preview` - Inline-style preview sink
//! - `canvas` - `CanvasRenderingContext2d` drawing surface
//! - `object_url` - Object URLs for the preview `<img>`
//!
//! # Usage
//!
//! ```typescript
//! import init, { ImageEditor } from '@filterbox/wasm';
//!
//! await init();
//! const editor = new ImageEditor();
//! editor.load_image(new Uint8Array(await file.arrayBuffer()), file.type);
//! const jpeg = editor.export_jpeg();
//! ```

use wasm_bindgen::prelude::*;

mod canvas;
mod editor;
mod object_url;
mod preview;

pub use canvas::{paint_canvas, CanvasSurface};
pub use editor::{ImageEditor, JsLoadTicket};
pub use preview::ElementPreview;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (e.g. in tests) finds the logger already set.
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
