//! PNG decoding helpers for tile assertions.

use image::RgbaImage;
use std::collections::HashSet;

/// Decode PNG bytes into straight RGBA, panicking on invalid data.
pub fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes)
        .expect("Failed to decode PNG")
        .to_rgba8()
}

/// Number of distinct RGBA values in an image.
pub fn distinct_colors(image: &RgbaImage) -> usize {
    image.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

/// Whether every pixel of the image has the same RGBA value.
pub fn is_uniform(image: &RgbaImage) -> bool {
    distinct_colors(image) <= 1
}
