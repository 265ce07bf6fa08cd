//! Opaque pixel counting.

use image::ImageError;

/// Counts pixels with a non-zero alpha channel in an RGBA8 buffer.
///
/// Alpha is byte `pixel_index * 4 + 3`. A trailing partial pixel is ignored.
pub fn count_opaque_pixels(rgba: &[u8]) -> u32 {
    rgba.chunks_exact(4).filter(|px| px[3] != 0).count() as u32
}

/// Decodes an encoded tile image and counts its opaque pixels.
pub fn count_opaque_pixels_in_image(encoded: &[u8]) -> Result<u32, ImageError> {
    let rgba = image::load_from_memory(encoded)?.to_rgba8();
    Ok(count_opaque_pixels(rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_with_opaque(width: u32, height: u32, opaque: u32) -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        for i in 0..opaque {
            img.put_pixel(i % width, i / width, Rgba([10, 20, 30, 255]));
        }
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_counts_alpha_byte_only() {
        // Pixel 0: opaque; pixel 1: transparent but with colour; pixel 2: faint alpha.
        let rgba = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 1];
        assert_eq!(count_opaque_pixels(&rgba), 2);
    }

    #[test]
    fn test_colour_in_next_pixel_does_not_count() {
        // Reading one byte past the alpha would see the next pixel's red.
        let rgba = [0, 0, 0, 0, 200, 0, 0, 0];
        assert_eq!(count_opaque_pixels(&rgba), 0);
    }

    #[test]
    fn test_partial_pixel_ignored() {
        assert_eq!(count_opaque_pixels(&[0, 0, 0, 9, 1, 1]), 1);
        assert_eq!(count_opaque_pixels(&[]), 0);
    }

    #[test]
    fn test_decoded_png() {
        let png = png_with_opaque(16, 16, 50);
        assert_eq!(count_opaque_pixels_in_image(&png).unwrap(), 50);
    }

    #[test]
    fn test_undecodable_bytes() {
        assert!(count_opaque_pixels_in_image(b"not an image").is_err());
    }
}
