//! Live preview sink backed by an element's inline style.

use filterbox_core::{PreviewSink, PreviewStyle};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

/// Writes `filter`, `transform` and `transform-origin` onto an element.
pub struct ElementPreview {
    element: HtmlElement,
}

impl ElementPreview {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    fn try_apply(&self, style: &PreviewStyle) -> Result<(), JsValue> {
        let css = self.element.style();
        css.set_property("filter", &style.filter)?;
        css.set_property("transform", &style.transform)?;
        css.set_property("transform-origin", style.transform_origin)?;
        Ok(())
    }
}

impl PreviewSink for ElementPreview {
    fn apply(&mut self, style: &PreviewStyle) {
        if let Err(e) = self.try_apply(style) {
            log::warn!("Failed to update preview style: {e:?}");
        }
    }
}
