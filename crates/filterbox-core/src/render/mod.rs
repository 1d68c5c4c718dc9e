//! Offscreen rasterization for export.
//!
//! [`RasterSurface`] is a pixel buffer with the 2D canvas drawing model: a
//! current affine transform, a current filter, and `draw_image` with
//! source-over compositing. Replaying a [`Composition`](crate::Composition)
//! onto it produces the exported bitmap.
//!
//! # Algorithm
//!
//! `draw_image` uses inverse mapping: for every destination pixel centre we
//! invert the current transform to find the source pixel it came from and
//! sample it with nearest-neighbour lookup. Sines and cosines within `1e-12`
//! of -1, 0 or 1 are snapped so quarter turns land exactly on pixel centres.

mod affine;

use std::convert::Infallible;

use image::{Rgba, RgbaImage};

use crate::compose::DrawingSurface;
use crate::filters::FilterChain;

pub use affine::Affine;

/// A transparent-initialised RGBA surface with canvas drawing semantics.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    transform: Affine,
    filter: FilterChain,
}

impl RasterSurface {
    /// Allocate a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            transform: Affine::IDENTITY,
            filter: FilterChain::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

impl DrawingSurface for RasterSurface {
    type Image = RgbaImage;
    type Error = Infallible;

    fn set_filter(&mut self, filter: &FilterChain) -> Result<(), Infallible> {
        self.filter = filter.clone();
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), Infallible> {
        self.transform = self.transform.translate(x, y);
        Ok(())
    }

    fn rotate(&mut self, radians: f64) -> Result<(), Infallible> {
        self.transform = self.transform.rotate(radians);
        Ok(())
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), Infallible> {
        self.transform = self.transform.scale(x, y);
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &RgbaImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), Infallible> {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 || width == 0.0 || height == 0.0 {
            return Ok(());
        }
        // A singular transform collapses the image to nothing.
        let Some(inverse) = self.transform.invert() else {
            return Ok(());
        };

        // The filter runs on the transformed image in surface space, so blur
        // sees transparent pixels around it the way a canvas layer does.
        let mut layer = RgbaImage::new(self.width(), self.height());
        project(&mut layer, image, &inverse, (x, y, width, height));
        self.filter.apply(&mut layer);

        for (dst, src) in self.pixels.pixels_mut().zip(layer.pixels()) {
            *dst = source_over(*src, *dst);
        }
        Ok(())
    }
}

/// Copy `image`, drawn into `rect` under the transform whose inverse is
/// `inverse`, onto `layer` with nearest-neighbour sampling.
fn project(layer: &mut RgbaImage, image: &RgbaImage, inverse: &Affine, rect: (f64, f64, f64, f64)) {
    let (x, y, width, height) = rect;
    let (src_w, src_h) = image.dimensions();
    let scale_x = src_w as f64 / width;
    let scale_y = src_h as f64 / height;

    for (dst_x, dst_y, dst) in layer.enumerate_pixels_mut() {
        let (ux, uy) = inverse.apply(dst_x as f64 + 0.5, dst_y as f64 + 0.5);
        let sx = ((ux - x) * scale_x).floor();
        let sy = ((uy - y) * scale_y).floor();
        if sx < 0.0 || sy < 0.0 || sx >= src_w as f64 || sy >= src_h as f64 {
            continue;
        }
        *dst = *image.get_pixel(sx as u32, sy as u32);
    }
}

/// Porter-Duff source-over of `src` onto `dst` (straight alpha).
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match (src.0[3], dst.0[3]) {
        (255, _) | (_, 0) => return src,
        (0, _) => return dst,
        _ => {}
    }

    let sa = src.0[3] as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = src.0[i] as f32 / 255.0;
        let dc = dst.0[i] as f32 / 255.0;
        let c = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        out[i] = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out[3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba(out)
}
