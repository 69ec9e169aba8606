//! Common types and utilities shared across the climate overlay crates.

pub mod error;
pub mod layer;
pub mod reading;
pub mod tile;

pub use error::{OverlayError, OverlayResult};
pub use layer::{LayerDescriptor, LayerKind, SourceSpec};
pub use reading::WeatherReading;
pub use tile::TileCoord;
