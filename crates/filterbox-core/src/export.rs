//! Export sink: rasterize the composition and encode it as JPEG.
//!
//! The surface is allocated at the bitmap's natural size regardless of
//! rotation, so a quarter turn of a non-square image crops its long edge and
//! leaves the uncovered area transparent (black after flattening).

use image::RgbaImage;
use serde::Serialize;

use crate::compose::Composition;
use crate::config::ExportOptions;
use crate::encode::encode_rgba_jpeg;
use crate::error::EditorError;
use crate::render::RasterSurface;

/// MIME type of every export.
pub const EXPORT_MIME: &str = "image/jpeg";

/// An encoded export, ready to hand to the browser as a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedImage {
    pub filename: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Replay `composition` onto a fresh surface the size of `source`.
pub fn rasterize(source: &RgbaImage, composition: &Composition) -> RasterSurface {
    let (width, height) = source.dimensions();
    let mut surface = RasterSurface::new(width, height);
    match composition.paint(&mut surface, source, width, height) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    surface
}

/// Rasterize and encode `source` with the current composition.
pub fn export_image(
    source: &RgbaImage,
    composition: &Composition,
    options: &ExportOptions,
) -> Result<ExportedImage, EditorError> {
    let surface = rasterize(source, composition);
    let bytes = encode_rgba_jpeg(surface.pixels(), options.quality)?;
    log::debug!(
        "Exported {}x{} image as {} ({} bytes)",
        surface.width(),
        surface.height(),
        options.filename,
        bytes.len()
    );
    Ok(ExportedImage {
        filename: options.filename.clone(),
        mime: EXPORT_MIME,
        width: surface.width(),
        height: surface.height(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;
    use crate::filters::{FilterChain, FilterSet};
    use crate::state::FilterStore;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 11 % 256) as u8, 255])
        })
    }

    #[test]
    fn test_quarter_turn_keeps_natural_size() {
        let source = RgbaImage::from_pixel(200, 100, Rgba([100, 100, 100, 255]));
        let mut store = FilterStore::new(FilterSet::Basic);
        store.set_parameter("brightness", 150.0).unwrap();
        store.rotate_right();

        let surface = rasterize(&source, &Composition::from_store(&store));
        assert_eq!((surface.width(), surface.height()), (200, 100));
        // The rotated image is 100 wide and centred, covering columns 50..150.
        assert_eq!(*surface.pixels().get_pixel(100, 50), Rgba([150, 150, 150, 255]));
        assert_eq!(*surface.pixels().get_pixel(50, 0), Rgba([150, 150, 150, 255]));
        assert_eq!(*surface.pixels().get_pixel(49, 50), CLEAR);
        assert_eq!(*surface.pixels().get_pixel(150, 99), CLEAR);
    }

    #[test]
    fn test_export_produces_named_jpeg() {
        let source = RgbaImage::from_pixel(200, 100, Rgba([100, 100, 100, 255]));
        let mut store = FilterStore::new(FilterSet::Basic);
        store.set_parameter("brightness", 150.0).unwrap();
        store.rotate_right();

        let exported = export_image(
            &source,
            &Composition::from_store(&store),
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(exported.filename, "image.jpg");
        assert_eq!(exported.mime, "image/jpeg");
        assert_eq!((exported.width, exported.height), (200, 100));
        assert_eq!(&exported.bytes[0..2], &[0xFF, 0xD8]);

        let decoded = decode_image(&exported.bytes, EXPORT_MIME).unwrap();
        assert_eq!((decoded.width, decoded.height), (200, 100));
        // Uncovered corners are flattened to black.
        assert!(decoded.pixels[0..3].iter().all(|&c| c < 8));
    }

    #[test]
    fn test_default_state_is_pixel_identical() {
        let source = gradient(7, 5);
        let surface = rasterize(&source, &Composition::from_store(&FilterStore::default()));
        assert_eq!(surface.pixels(), &source);
    }

    #[test]
    fn test_full_turn_matches_no_rotation() {
        let source = gradient(6, 4);
        let mut store = FilterStore::default();
        let unrotated = rasterize(&source, &Composition::from_store(&store));
        for _ in 0..4 {
            store.rotate_left();
        }
        let rotated = rasterize(&source, &Composition::from_store(&store));
        assert_eq!(rotated.pixels(), unrotated.pixels());
    }

    #[test]
    fn test_preview_filter_rasterizes_like_export() {
        let source = gradient(9, 6);
        let mut store = FilterStore::new(FilterSet::Basic);
        store.set_parameter("grayscale", 100.0).unwrap();
        store.set_parameter("inversion", 100.0).unwrap();
        store.flip_horizontal();
        let composition = Composition::from_store(&store);

        let style = composition.preview_style();
        let parsed: FilterChain = style.filter.parse().unwrap();
        let from_preview = Composition::new(parsed, *store.transform());

        let exported = rasterize(&source, &composition);
        let previewed = rasterize(&source, &from_preview);
        assert_eq!(exported.pixels(), previewed.pixels());
    }

    #[test]
    fn test_grayscale_then_invert_is_gray() {
        let source = gradient(5, 5);
        let mut store = FilterStore::new(FilterSet::Basic);
        store.set_parameter("grayscale", 100.0).unwrap();
        store.set_parameter("inversion", 100.0).unwrap();
        let surface = rasterize(&source, &Composition::from_store(&store));
        for p in surface.pixels().pixels() {
            assert!(p.0[0].abs_diff(p.0[1]) <= 1 && p.0[1].abs_diff(p.0[2]) <= 1);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::filters::{FilterChain, FilterSet};
    use crate::state::FilterStore;
    use image::Rgba;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: The CSS filter string rasterizes to the same bytes as the
        /// export composition it was rendered from.
        #[test]
        fn prop_preview_and_export_agree(
            values in prop::collection::vec(0.0f32..=200.0, 9),
            turns in -4i32..=4,
            flip_h in any::<bool>(),
            flip_v in any::<bool>(),
        ) {
            let mut store = FilterStore::new(FilterSet::Extended);
            let ids: Vec<&str> = FilterSet::Extended.parameters().iter().map(|p| p.id).collect();
            for (id, value) in ids.iter().zip(&values) {
                store.set_parameter(id, *value).unwrap();
            }
            for _ in 0..turns.abs() {
                if turns > 0 { store.rotate_right() } else { store.rotate_left() }
            }
            if flip_h { store.flip_horizontal(); }
            if flip_v { store.flip_vertical(); }

            let source = RgbaImage::from_fn(6, 4, |x, y| {
                Rgba([(x * 40) as u8, (y * 60) as u8, 128, 255])
            });
            let composition = Composition::from_store(&store);
            let parsed: FilterChain = composition.css_filter().parse().unwrap();
            let from_preview = Composition::new(parsed, *store.transform());

            let exported = rasterize(&source, &composition);
            let previewed = rasterize(&source, &from_preview);
            prop_assert_eq!(exported.pixels(), previewed.pixels());
        }
    }
}
