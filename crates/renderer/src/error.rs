//! Rendering errors.

use crate::png::EncodeError;
use overlay_common::{LayerKind, OverlayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no usable reading for a live {0} tile")]
    MissingReading(LayerKind),

    #[error("live tiles are not available for {0}")]
    Unsupported(LayerKind),

    #[error("invalid tile: {0}")]
    InvalidTile(String),

    #[error("canvas error: {0}")]
    Canvas(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl From<RenderError> for OverlayError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::MissingReading(kind) => OverlayError::MissingReading(kind),
            RenderError::Unsupported(kind) => OverlayError::UnknownLayer(kind.to_string()),
            RenderError::InvalidTile(msg) => OverlayError::InvalidTile(msg),
            other => OverlayError::Render(other.to_string()),
        }
    }
}
