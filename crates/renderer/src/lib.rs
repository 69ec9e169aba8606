//! Tile rendering for climate overlays.
//!
//! - Temperature ramp with radial fade
//! - Wind colour wash and direction arrows
//! - Bitmap-font value labels
//! - Deterministic PNG encoding

pub mod error;
pub mod gradient;
pub mod live;
pub mod numbers;
pub mod png;
pub mod wind;

pub use error::RenderError;
pub use live::{LiveTileGenerator, RenderedTile, DEFAULT_TILE_SIZE};
