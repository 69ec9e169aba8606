//! Tests for tile addressing used as keys by the overlay pipeline.

use overlay_common::tile::MAX_ZOOM;
use overlay_common::TileCoord;
use std::collections::HashSet;

// ============================================================================
// Matrix bounds
// ============================================================================

#[test]
fn test_matrix_size_doubles_per_zoom() {
    assert_eq!(TileCoord::new(0, 0, 0).matrix_size(), 1);
    assert_eq!(TileCoord::new(1, 0, 0).matrix_size(), 2);
    assert_eq!(TileCoord::new(5, 0, 0).matrix_size(), 32);
}

#[test]
fn test_every_tile_at_zoom_two_is_valid() {
    for x in 0..4 {
        for y in 0..4 {
            assert!(TileCoord::new(2, x, y).validate().is_ok(), "2/{}/{}", x, y);
        }
    }
}

#[test]
fn test_max_zoom_corner_is_valid() {
    let n = 1u32 << MAX_ZOOM;
    assert!(TileCoord::new(MAX_ZOOM, n - 1, n - 1).validate().is_ok());
    assert!(TileCoord::new(MAX_ZOOM, n, 0).validate().is_err());
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_display_is_unique_per_tile() {
    let mut paths = HashSet::new();
    for z in 0..4 {
        let n = 1u32 << z;
        for x in 0..n {
            for y in 0..n {
                assert!(paths.insert(TileCoord::new(z, x, y).to_string()));
            }
        }
    }
    assert_eq!(paths.len(), 1 + 4 + 16 + 64);
}

#[test]
fn test_display_parses_back() {
    let coord = TileCoord::new(5, 4, 3);
    assert_eq!(coord.to_string(), "5/4/3");
    assert_eq!(TileCoord::parse_path(&coord.to_string()).unwrap(), coord);
    assert_eq!(TileCoord::parse_path(&format!("/{}.png", coord)).unwrap(), coord);
}

#[test]
fn test_expand_leaves_other_placeholders() {
    let coord = TileCoord::new(3, 5, 2);
    assert_eq!(
        coord.expand("https://tiles.example.com/{time}/{z}/{x}/{y}/{z}.png"),
        "https://tiles.example.com/{time}/3/5/2/3.png"
    );
}
