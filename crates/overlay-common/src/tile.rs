//! Slippy-map tile addressing.
//!
//! Tiles are addressed as z/x/y under the standard Web Mercator scheme. For
//! live-generated layers the coordinate is only a key into deterministic
//! rendering; for registry layers it fills the `{z}/{x}/{y}` placeholders.

use crate::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};

/// Deepest zoom level accepted by the pipeline.
pub const MAX_ZOOM: u32 = 22;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom.
    pub fn matrix_size(&self) -> u32 {
        1u32 << self.z.min(MAX_ZOOM)
    }

    /// Check that the coordinate addresses a real tile.
    pub fn validate(&self) -> OverlayResult<()> {
        if self.z > MAX_ZOOM {
            return Err(OverlayError::InvalidTile(format!(
                "zoom {} exceeds maximum {}",
                self.z, MAX_ZOOM
            )));
        }
        let n = self.matrix_size();
        if self.x >= n || self.y >= n {
            return Err(OverlayError::InvalidTile(format!(
                "{}/{}/{} outside the {}x{} matrix",
                self.z, self.x, self.y, n, n
            )));
        }
        Ok(())
    }

    /// Parse a `z/x/y` path, tolerating an image extension on the row.
    pub fn parse_path(path: &str) -> OverlayResult<Self> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        if parts.len() != 3 {
            return Err(OverlayError::InvalidTile(format!(
                "expected z/x/y, got '{}'",
                path
            )));
        }

        let row = parts[2].split_once('.').map(|(r, _)| r).unwrap_or(parts[2]);
        let parse = |s: &str, name: &str| {
            s.parse::<u32>()
                .map_err(|_| OverlayError::InvalidTile(format!("invalid {} '{}'", name, s)))
        };

        let coord = TileCoord::new(parse(parts[0], "zoom")?, parse(parts[1], "column")?, parse(row, "row")?);
        coord.validate()?;
        Ok(coord)
    }

    /// Fill `{z}`, `{x}` and `{y}` placeholders in a URL template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
