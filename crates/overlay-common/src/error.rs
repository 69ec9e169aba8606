//! Error types for the overlay pipeline.

use crate::LayerKind;
use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Request Errors ===
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid tile coordinate: {0}")]
    InvalidTile(String),

    // === Data Errors ===
    #[error("No live reading available for {0} layer")]
    MissingReading(LayerKind),

    #[error("Failed to parse upstream response: {0}")]
    Parse(String),

    // === Upstream Errors ===
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("Request timeout")]
    Timeout,

    // === Rendering / Surface Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Map surface error: {0}")]
    Surface(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OverlayError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        OverlayError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from talking to an external provider.
    ///
    /// These are always recovered locally (synthetic values or fallback layers).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            OverlayError::Network(_)
                | OverlayError::UpstreamStatus(_)
                | OverlayError::Timeout
                | OverlayError::Parse(_)
        )
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            OverlayError::InvalidParameter { .. } | OverlayError::InvalidTile(_) => 400,

            OverlayError::UnknownLayer(_) | OverlayError::MissingReading(_) => 404,

            OverlayError::Network(_)
            | OverlayError::UpstreamStatus(_)
            | OverlayError::Parse(_) => 502,
            OverlayError::Timeout => 504,

            _ => 500,
        }
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Parse(format!("JSON error: {}", err))
    }
}
