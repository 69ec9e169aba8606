//! Overlay resolution pipeline.
//!
//! Decides, per layer kind, which tile source a map surface should show:
//! a registry entry, a live-generated tile set, or a radar frame, swapping
//! to the static fallback when the primary cannot be used.

pub mod controller;
pub mod radar;
pub mod readings;
pub mod registry;
pub mod source;
pub mod surface;

pub use controller::{LayerState, LayerStatus, OverlayController, SurfaceEvent};
pub use radar::RadarTimestampResolver;
pub use readings::OpenMeteoClient;
pub use registry::{RegistryEntry, TileSourceRegistry};
pub use source::{DefaultSourceResolver, SourceOrigin, SourceResolver, TileSource};
pub use surface::{AttachedOverlay, AttachmentId, MapSurface, RecordingSurface, SurfaceError};
