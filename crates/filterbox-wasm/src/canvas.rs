//! Browser canvas as a drawing surface.
//!
//! Replays the same [`DrawStep`](filterbox_core::DrawStep)s the software
//! rasterizer uses, so a host can render with the browser's own filter
//! implementation when it prefers to.

use filterbox_core::{Composition, DrawingSurface, FilterChain};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// A 2D context driven through [`DrawingSurface`].
pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Self { context }
    }

    /// Size `canvas` to `width` x `height` and take its 2D context.
    ///
    /// Resizing also clears the canvas and resets its transform and filter.
    pub fn prepare(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Result<Self, JsValue> {
        canvas.set_width(width);
        canvas.set_height(height);
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self::new(context))
    }
}

impl DrawingSurface for CanvasSurface {
    type Image = HtmlImageElement;
    type Error = JsValue;

    fn set_filter(&mut self, filter: &FilterChain) -> Result<(), JsValue> {
        self.context.set_filter(&filter.to_string());
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.context.translate(x, y)
    }

    fn rotate(&mut self, radians: f64) -> Result<(), JsValue> {
        self.context.rotate(radians)
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.context.scale(x, y)
    }

    fn draw_image(
        &mut self,
        image: &HtmlImageElement,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue> {
        self.context
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
    }
}

/// Paint `image` onto `canvas` at the image's natural size.
pub fn paint_canvas(
    canvas: &HtmlCanvasElement,
    image: &HtmlImageElement,
    composition: &Composition,
) -> Result<(), JsValue> {
    let (width, height) = (image.natural_width(), image.natural_height());
    if width == 0 || height == 0 {
        return Err(JsValue::from_str("Image has not finished loading"));
    }
    let mut surface = CanvasSurface::prepare(canvas, width, height)?;
    composition.paint(&mut surface, image, width, height)
}
