//! Composition of filter and transform state into one render description.
//!
//! A [`Composition`] is derived from the store and is the only thing either
//! sink consumes. The live preview renders it as CSS ([`PreviewStyle`]); the
//! export path replays it as canvas-style [`DrawStep`]s against a
//! [`DrawingSurface`]. The two forms differ only in where they are applied.
//!
//! # Composition Order
//!
//! 1. Colour filters, in declaration order
//! 2. Translate to the image centre
//! 3. Rotate by `rotation_degrees` (skipped when it is a multiple of 360)
//! 4. Scale by the flip factors
//! 5. Draw the image offset by minus half its size
//!
//! CSS `rotate(..) scale(..)` with `transform-origin: center` is the same
//! translate / rotate / scale sequence.

use serde::Serialize;

use crate::filters::{FilterChain, FilterOp};
use crate::state::{FilterStore, TransformState};

/// One canvas-style drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    SetFilter(FilterChain),
    Translate { x: f64, y: f64 },
    Rotate { radians: f64 },
    Scale { x: f64, y: f64 },
    DrawImage { x: f64, y: f64, width: f64, height: f64 },
}

/// A 2D drawing target with canvas semantics.
///
/// Transform calls post-multiply the current transform; the filter applies
/// to every subsequent `draw_image`.
pub trait DrawingSurface {
    /// Bitmap type accepted by `draw_image`.
    type Image: ?Sized;
    type Error;

    fn set_filter(&mut self, filter: &FilterChain) -> Result<(), Self::Error>;
    fn translate(&mut self, x: f64, y: f64) -> Result<(), Self::Error>;
    fn rotate(&mut self, radians: f64) -> Result<(), Self::Error>;
    fn scale(&mut self, x: f64, y: f64) -> Result<(), Self::Error>;
    fn draw_image(
        &mut self,
        image: &Self::Image,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), Self::Error>;
}

/// CSS properties for the live preview element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStyle {
    pub filter: String,
    pub transform: String,
    pub transform_origin: &'static str,
}

/// Receives the preview description whenever state changes.
pub trait PreviewSink {
    fn apply(&mut self, style: &PreviewStyle);
}

/// Canonical description of the current visual effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    filter: FilterChain,
    transform: TransformState,
}

impl Composition {
    pub fn new(filter: FilterChain, transform: TransformState) -> Self {
        Self { filter, transform }
    }

    /// Derive the composition from the store's current state.
    pub fn from_store(store: &FilterStore) -> Self {
        let ops = store
            .filters()
            .iter()
            .map(|(param, value)| FilterOp::new(param.function, value))
            .collect();
        Self::new(FilterChain::new(ops), *store.transform())
    }

    pub fn filter(&self) -> &FilterChain {
        &self.filter
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Whether the rotation step is emitted.
    #[inline]
    fn rotates(&self) -> bool {
        self.transform.normalized_rotation() != 0
    }

    /// CSS `filter` value.
    pub fn css_filter(&self) -> String {
        self.filter.to_string()
    }

    /// CSS `transform` value, to be used with `transform-origin: center`.
    pub fn css_transform(&self) -> String {
        let scale = format!(
            "scale({}, {})",
            self.transform.flip_horizontal.factor(),
            self.transform.flip_vertical.factor()
        );
        if self.rotates() {
            format!("rotate({}deg) {}", self.transform.rotation_degrees, scale)
        } else {
            scale
        }
    }

    pub fn preview_style(&self) -> PreviewStyle {
        PreviewStyle {
            filter: self.css_filter(),
            transform: self.css_transform(),
            transform_origin: "center",
        }
    }

    /// Drawing instructions for an image of `width` x `height` drawn onto a
    /// surface of the same size.
    pub fn draw_steps(&self, width: u32, height: u32) -> Vec<DrawStep> {
        let (w, h) = (width as f64, height as f64);
        let mut steps = vec![
            DrawStep::SetFilter(self.filter.clone()),
            DrawStep::Translate { x: w / 2.0, y: h / 2.0 },
        ];
        if self.rotates() {
            steps.push(DrawStep::Rotate {
                radians: self.transform.rotation_radians(),
            });
        }
        steps.push(DrawStep::Scale {
            x: self.transform.flip_horizontal.factor() as f64,
            y: self.transform.flip_vertical.factor() as f64,
        });
        steps.push(DrawStep::DrawImage {
            x: -w / 2.0,
            y: -h / 2.0,
            width: w,
            height: h,
        });
        steps
    }

    /// Replay [`Self::draw_steps`] onto `surface`.
    pub fn paint<S: DrawingSurface>(
        &self,
        surface: &mut S,
        image: &S::Image,
        width: u32,
        height: u32,
    ) -> Result<(), S::Error> {
        for step in self.draw_steps(width, height) {
            match step {
                DrawStep::SetFilter(filter) => surface.set_filter(&filter)?,
                DrawStep::Translate { x, y } => surface.translate(x, y)?,
                DrawStep::Rotate { radians } => surface.rotate(radians)?,
                DrawStep::Scale { x, y } => surface.scale(x, y)?,
                DrawStep::DrawImage {
                    x,
                    y,
                    width,
                    height,
                } => surface.draw_image(image, x, y, width, height)?,
            }
        }
        Ok(())
    }
}
