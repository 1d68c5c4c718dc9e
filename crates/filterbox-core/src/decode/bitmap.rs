//! Decoding of any supported raster format into an RGBA bitmap.
//!
//! Browsers honour EXIF orientation both for `<img>` and for canvas
//! `drawImage`, so the natural size reported here is the size after
//! orientation correction.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode image bytes of any supported format, applying EXIF orientation.
///
/// `mime` is the type reported by the file picker; an empty string means
/// unknown. The format itself is always guessed from the content.
///
/// # Errors
///
/// Returns `DecodeError::Empty` for empty input, `DecodeError::NotAnImage` if
/// the MIME type is set and is not `image/*`, `DecodeError::InvalidFormat` if
/// the content matches no known format, and `DecodeError::CorruptedFile` if
/// decoding fails.
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if !mime.is_empty() && !mime.starts_with("image/") {
        return Err(DecodeError::NotAnImage(mime.to_string()));
    }

    let orientation = get_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default()
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encoded(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut buffer, format)
            .unwrap();
        buffer.into_inner()
    }

    /// 2x1 image: red on the left, green on the right.
    fn red_green() -> DynamicImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_decode_png() {
        let img = RgbaImage::from_pixel(200, 100, Rgba([10, 20, 30, 255]));
        let decoded = decode_image(&encoded(&img, ImageFormat::Png), "image/png").unwrap();
        assert_eq!((decoded.width, decoded.height), (200, 100));
        assert_eq!(decoded.pixels.len(), 200 * 100 * 4);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_png_keeps_alpha() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 40]));
        let decoded = decode_image(&encoded(&img, ImageFormat::Png), "").unwrap();
        assert_eq!(decoded.pixels, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_jpeg() {
        let rgb = vec![128u8; 8 * 4 * 3];
        let jpeg = crate::encode::encode_jpeg(&rgb, 8, 4, 90).unwrap();
        let decoded = decode_image(&jpeg, "image/jpeg").unwrap();
        assert_eq!((decoded.width, decoded.height), (8, 4));
        assert_eq!(decoded.pixels[3], 255);
    }

    #[test]
    fn test_mime_does_not_restrict_format() {
        // A PNG labelled as JPEG still decodes; the content decides.
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        assert!(decode_image(&encoded(&img, ImageFormat::Png), "image/jpeg").is_ok());
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(matches!(decode_image(&[], "image/png"), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_non_image_mime() {
        let result = decode_image(b"hello", "text/plain");
        assert!(matches!(result, Err(DecodeError::NotAnImage(m)) if m == "text/plain"));
    }

    #[test]
    fn test_decode_unknown_format() {
        let result = decode_image(&[0x00, 0x01, 0x02, 0x03], "image/png");
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([9, 9, 9, 255]));
        let png = encoded(&img, ImageFormat::Png);
        let result = decode_image(&png[..png.len() / 2], "image/png");
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_orientation_without_exif() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        assert_eq!(get_orientation(&encoded(&img, ImageFormat::Png)), Orientation::Normal);
        assert_eq!(get_orientation(&[0x00, 0x01, 0x02]), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps_dimensions() {
        let result = apply_orientation(red_green(), Orientation::Rotate90CW).into_rgba8();
        assert_eq!(result.dimensions(), (1, 2));
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let result = apply_orientation(red_green(), Orientation::FlipHorizontal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_apply_orientation_normal_is_untouched() {
        let result = apply_orientation(red_green(), Orientation::Normal).into_rgba8();
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }
}
