//! The editor binding exposed to JavaScript.
//!
//! [`ImageEditor`] owns one [`EditorSession`] plus the object URL of the image
//! it shows. Every mutating call returns the stored value so the UI can sync
//! its slider without a second round trip.
//!
//! # Example
//!
//! ```typescript
//! import { ImageEditor } from '@filterbox/wasm';
//!
//! const editor = new ImageEditor({ filterSet: 'extended' });
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! editor.bind_preview(img);
//! const loaded = editor.load_image(bytes, file.type);
//! img.src = loaded.previewUrl;
//!
//! // The bound element's style follows every change.
//! slider.value = editor.select_filter('saturation');
//! slider.oninput = () => editor.set_active_value(Number(slider.value));
//! ```

use filterbox_core::{
    EditorConfig, EditorError, EditorSession, FilterParameter, LoadOutcome, LoadTicket,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement, HtmlImageElement};

use crate::canvas::paint_canvas;
use crate::object_url;
use crate::preview::ElementPreview;

fn to_js_error(e: EditorError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Handle for a load started with [`ImageEditor::begin_load`].
#[wasm_bindgen]
pub struct JsLoadTicket {
    inner: LoadTicket,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadedImage {
    width: u32,
    height: u32,
    preview_url: Option<String>,
}

/// Record a freshly created object URL for the image that was just loaded.
///
/// The load has already been committed, so a failed URL only costs the
/// preview: it is logged and `None` is returned.
fn attach_preview_url<E: std::fmt::Debug>(
    session: &mut EditorSession,
    created: Result<String, E>,
) -> Option<String> {
    let url = match created {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Failed to create preview URL: {e:?}");
            return None;
        }
    };
    match session.attach_preview_handle(url.clone()) {
        Ok(previous) => {
            object_url::release(previous);
            Some(url)
        }
        Err(e) => {
            log::warn!("Failed to attach preview URL: {e}");
            object_url::revoke(&url);
            None
        }
    }
}

#[wasm_bindgen]
pub struct ImageEditor {
    session: EditorSession,
}

impl ImageEditor {
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            session: EditorSession::new(config),
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }
}

#[wasm_bindgen]
impl ImageEditor {
    /// Create an editor.
    ///
    /// # Arguments
    /// * `config` - `{ filterSet?: 'basic' | 'extended', export?: { filename?, quality? } }`,
    ///   or `undefined` for the basic editor
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ImageEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid editor config: {}", e)))?
        };
        Ok(Self::with_config(config))
    }

    /// The parameter table as an array of
    /// `{ id, name, function, unit, defaultValue, min, max }`.
    pub fn filters(&self) -> Result<JsValue, JsValue> {
        let params: Vec<&FilterParameter> = self
            .session
            .store()
            .parameters()
            .map(|(param, _)| param)
            .collect();
        serde_wasm_bindgen::to_value(&params).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current values, transform and active selection.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.snapshot())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // Filter controls

    /// Bind the slider to `id`; returns the value to show on it.
    pub fn select_filter(&mut self, id: &str) -> Result<f32, JsValue> {
        self.session.select_active(id).map_err(to_js_error)
    }

    /// Set the active parameter from the slider; returns the clamped value.
    pub fn set_active_value(&mut self, value: f32) -> f32 {
        self.session.set_active_value(value)
    }

    pub fn set_parameter(&mut self, id: &str, value: f32) -> Result<f32, JsValue> {
        self.session.set_parameter(id, value).map_err(to_js_error)
    }

    pub fn value(&self, id: &str) -> Result<f32, JsValue> {
        self.session.current_value(id).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn active_filter(&self) -> String {
        self.session.active_parameter().id.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn active_value(&self) -> f32 {
        self.session.active_value()
    }

    #[wasm_bindgen(getter)]
    pub fn active_min(&self) -> f32 {
        self.session.active_parameter().min
    }

    #[wasm_bindgen(getter)]
    pub fn active_max(&self) -> f32 {
        self.session.active_parameter().max
    }

    pub fn rotate_left(&mut self) {
        self.session.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.session.rotate_right();
    }

    pub fn flip_horizontal(&mut self) {
        self.session.flip_horizontal();
    }

    pub fn flip_vertical(&mut self) {
        self.session.flip_vertical();
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    // Loading

    /// Start loading a file. Starting another load makes this one stale.
    pub fn begin_load(&mut self, bytes: Vec<u8>, mime: &str) -> JsLoadTicket {
        JsLoadTicket {
            inner: self.session.begin_load(bytes, mime),
        }
    }

    /// Finish a load started with [`Self::begin_load`].
    ///
    /// Returns `{ width, height, previewUrl }`, or `null` if a newer load has
    /// started since. On failure the previous image stays loaded. A loaded
    /// image whose object URL could not be created has `previewUrl: null`.
    pub fn finish_load(&mut self, ticket: &JsLoadTicket) -> Result<JsValue, JsValue> {
        let (width, height, released) = match self
            .session
            .finish_load(ticket.inner)
            .map_err(to_js_error)?
        {
            LoadOutcome::Stale => return Ok(JsValue::NULL),
            LoadOutcome::Loaded {
                width,
                height,
                released_handle,
            } => (width, height, released_handle),
        };
        object_url::release(released);

        let created = match self.session.source() {
            Some(source) => object_url::create(source.bytes(), source.mime()),
            None => Err(JsValue::from_str("No image loaded")),
        };
        let preview_url = attach_preview_url(&mut self.session, created);

        LoadedImage {
            width,
            height,
            preview_url,
        }
        .serialize(&serde_wasm_bindgen::Serializer::new().serialize_missing_as_null(true))
        .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Load a file in one step. See [`Self::finish_load`].
    pub fn load_image(&mut self, bytes: Vec<u8>, mime: &str) -> Result<JsValue, JsValue> {
        let ticket = self.begin_load(bytes, mime);
        self.finish_load(&ticket)
    }

    /// Object URL of the loaded image, for the preview `<img>`.
    #[wasm_bindgen(getter)]
    pub fn preview_url(&self) -> Option<String> {
        self.session
            .source()
            .and_then(|s| s.handle())
            .map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.session.has_image()
    }

    /// Drop the image and revoke its object URL.
    pub fn close(&mut self) {
        object_url::release(self.session.close());
    }

    // Sinks

    /// CSS `filter` value for the preview element.
    pub fn preview_filter(&self) -> String {
        self.session.composition().css_filter()
    }

    /// CSS `transform` value for the preview element (origin at centre).
    pub fn preview_transform(&self) -> String {
        self.session.composition().css_transform()
    }

    /// Keep `element`'s inline style in sync with every later change and load.
    pub fn bind_preview(&mut self, element: HtmlElement) {
        self.session.attach_preview(Box::new(ElementPreview::new(element)));
    }

    /// Stop updating the element passed to [`Self::bind_preview`].
    pub fn unbind_preview(&mut self) {
        self.session.detach_preview();
    }

    /// Write the current filter and transform onto `element`'s inline style once.
    pub fn apply_preview(&self, element: &HtmlElement) -> Result<(), JsValue> {
        self.session
            .refresh_preview(&mut ElementPreview::new(element.clone()))
            .map_err(to_js_error)
    }

    /// Draw `image` onto `canvas` with the browser's own filter pipeline.
    pub fn paint(&self, canvas: &HtmlCanvasElement, image: &HtmlImageElement) -> Result<(), JsValue> {
        if !self.session.has_image() {
            return Err(to_js_error(EditorError::NoImageLoaded));
        }
        paint_canvas(canvas, image, &self.session.composition())
    }

    /// Rasterize and encode the edited image as JPEG bytes.
    pub fn export_jpeg(&self) -> Result<Vec<u8>, JsValue> {
        self.session
            .export()
            .map(|exported| exported.bytes)
            .map_err(to_js_error)
    }

    /// Download name for [`Self::export_jpeg`].
    #[wasm_bindgen(getter)]
    pub fn export_filename(&self) -> String {
        self.session.config().export.filename.clone()
    }
}

impl Drop for ImageEditor {
    fn drop(&mut self) {
        object_url::release(self.session.close());
    }
}
