//! Tests for PNG encoding of overlay tiles.
//!
//! Decodes encoder output with the `image` crate to check that both the
//! indexed and RGBA paths produce valid, lossless files.

use renderer::png::{create_png, create_png_auto, create_png_indexed, EncodeError};
use test_utils::decode_png as decode;

// ============================================================================
// Helper functions
// ============================================================================

fn is_indexed(png: &[u8]) -> bool {
    // IHDR colour type byte: signature (8) + length (4) + type (4) + w/h (8) + depth (1)
    png[25] == 3
}

/// Horizontal gradient with `steps` distinct translucent colours.
fn banded_pixels(width: usize, height: usize, steps: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for _ in 0..height {
        for x in 0..width {
            let band = (x * steps / width) as u8;
            pixels.extend_from_slice(&[band, 255 - band, 128, 100 + band % 100]);
        }
    }
    pixels
}

// ============================================================================
// Format selection
// ============================================================================

#[test]
fn test_few_colors_use_indexed_png() {
    let pixels = banded_pixels(64, 64, 16);
    let png = create_png_auto(&pixels, 64, 64).unwrap();
    assert!(is_indexed(&png));
    assert_eq!(decode(&png).into_raw(), pixels);
}

#[test]
fn test_many_colors_fall_back_to_rgba() {
    let mut pixels = Vec::with_capacity(32 * 32 * 4);
    for i in 0..(32 * 32) as u32 {
        pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 0, 255]);
    }
    let png = create_png_auto(&pixels, 32, 32).unwrap();
    assert!(!is_indexed(&png));
    assert_eq!(decode(&png).into_raw(), pixels);
}

#[test]
fn test_large_tile_uses_parallel_path_losslessly() {
    let pixels = banded_pixels(256, 256, 200);
    let png = create_png_auto(&pixels, 256, 256).unwrap();
    assert!(is_indexed(&png));
    assert_eq!(decode(&png).into_raw(), pixels);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_encoding_is_byte_identical_across_calls() {
    let pixels = banded_pixels(256, 256, 120);
    let first = create_png_auto(&pixels, 256, 256).unwrap();
    for _ in 0..5 {
        assert_eq!(create_png_auto(&pixels, 256, 256).unwrap(), first);
    }
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_single_pixel() {
    let png = create_png_auto(&[10, 20, 30, 40], 1, 1).unwrap();
    assert_eq!(decode(&png).get_pixel(0, 0).0, [10, 20, 30, 40]);
}

#[test]
fn test_fully_transparent_tile() {
    let pixels = vec![0u8; 16 * 16 * 4];
    let png = create_png_auto(&pixels, 16, 16).unwrap();
    assert!(decode(&png).pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_rgba_encoder_rejects_short_buffer() {
    let result = create_png(&[0u8; 10], 2, 2);
    assert!(matches!(result, Err(EncodeError::BufferSize { actual: 10, .. })));
}

#[test]
fn test_indexed_encoder_rejects_wrong_index_count() {
    let palette = [(0, 0, 0, 255)];
    let result = create_png_indexed(2, 2, &palette, &[0, 0, 0]);
    assert!(matches!(result, Err(EncodeError::BufferSize { expected: 4, .. })));
}
