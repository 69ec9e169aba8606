//! Turning layer descriptors into concrete tile sources.

use crate::radar::RadarTimestampResolver;
use async_trait::async_trait;
use overlay_common::{
    LayerDescriptor, LayerKind, OverlayError, OverlayResult, SourceSpec, TileCoord, WeatherReading,
};
use serde::Serialize;
use tracing::debug;

/// Which registry entry a layer is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Primary,
    Fallback,
}

impl std::fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceOrigin::Primary => f.write_str("primary"),
            SourceOrigin::Fallback => f.write_str("fallback"),
        }
    }
}

/// A resolved source, ready to attach to a map surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TileSource {
    /// Tiles fetched from a fully expanded `{z}/{x}/{y}` template
    Remote {
        kind: LayerKind,
        url_template: String,
        attribution: String,
        opacity: f32,
    },
    /// Tiles rendered locally from a captured reading
    Live {
        kind: LayerKind,
        reading: WeatherReading,
        attribution: String,
        opacity: f32,
    },
    /// Every tile is one translucent colour
    Solid {
        kind: LayerKind,
        rgba: [u8; 4],
        attribution: String,
        opacity: f32,
    },
}

impl TileSource {
    /// Build a source that needs no lookup (static templates and solid fills).
    pub fn from_static(descriptor: &LayerDescriptor) -> Option<TileSource> {
        let kind = descriptor.kind();
        let attribution = descriptor.attribution().to_string();
        let opacity = descriptor.opacity();

        match descriptor.source() {
            SourceSpec::UrlTemplate { template } => Some(TileSource::Remote {
                kind,
                url_template: template.clone(),
                attribution,
                opacity,
            }),
            SourceSpec::Solid { rgba } => Some(TileSource::Solid {
                kind,
                rgba: *rgba,
                attribution,
                opacity,
            }),
            SourceSpec::Live | SourceSpec::RadarFrame { .. } => None,
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            TileSource::Remote { kind, .. }
            | TileSource::Live { kind, .. }
            | TileSource::Solid { kind, .. } => *kind,
        }
    }

    pub fn attribution(&self) -> &str {
        match self {
            TileSource::Remote { attribution, .. }
            | TileSource::Live { attribution, .. }
            | TileSource::Solid { attribution, .. } => attribution,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            TileSource::Remote { opacity, .. }
            | TileSource::Live { opacity, .. }
            | TileSource::Solid { opacity, .. } => *opacity,
        }
    }

    /// URL of one tile, for remote sources.
    pub fn tile_url(&self, coord: TileCoord) -> Option<String> {
        match self {
            TileSource::Remote { url_template, .. } => Some(coord.expand(url_template)),
            _ => None,
        }
    }
}

/// Resolves a primary descriptor into an attachable source.
///
/// Implementations may suspend (network lookups); the controller never holds
/// its lock across a call.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(
        &self,
        descriptor: &LayerDescriptor,
        reading: Option<&WeatherReading>,
    ) -> OverlayResult<TileSource>;
}

/// Resolver backed by the radar index for radar-frame sources.
#[derive(Debug, Clone)]
pub struct DefaultSourceResolver {
    radar: RadarTimestampResolver,
}

impl DefaultSourceResolver {
    pub fn new(radar: RadarTimestampResolver) -> Self {
        Self { radar }
    }
}

#[async_trait]
impl SourceResolver for DefaultSourceResolver {
    async fn resolve(
        &self,
        descriptor: &LayerDescriptor,
        reading: Option<&WeatherReading>,
    ) -> OverlayResult<TileSource> {
        let kind = descriptor.kind();
        let attribution = descriptor.attribution().to_string();
        let opacity = descriptor.opacity();

        match descriptor.source() {
            SourceSpec::RadarFrame { template } => {
                let timestamp = self.radar.latest_timestamp().await;
                debug!(%kind, %timestamp, "Resolved radar frame source");
                Ok(TileSource::Remote {
                    kind,
                    url_template: template.replace("{time}", &timestamp),
                    attribution,
                    opacity,
                })
            }
            SourceSpec::Live => {
                let reading = reading
                    .filter(|r| kind.has_live_input(r))
                    .ok_or(OverlayError::MissingReading(kind))?;
                Ok(TileSource::Live {
                    kind,
                    reading: *reading,
                    attribution,
                    opacity,
                })
            }
            SourceSpec::UrlTemplate { .. } | SourceSpec::Solid { .. } => TileSource::from_static(descriptor)
                .ok_or_else(|| OverlayError::Config(format!("{} source is not static", kind))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_sources() {
        let solid = LayerDescriptor::new(
            LayerKind::Wind,
            SourceSpec::Solid { rgba: [1, 2, 3, 4] },
            "solid",
            0.3,
        )
        .unwrap();
        assert!(matches!(
            TileSource::from_static(&solid),
            Some(TileSource::Solid { rgba: [1, 2, 3, 4], .. })
        ));

        let live = LayerDescriptor::new(LayerKind::Wind, SourceSpec::Live, "live", 0.5).unwrap();
        assert!(TileSource::from_static(&live).is_none());
    }

    #[test]
    fn test_remote_tile_url() {
        let source = TileSource::Remote {
            kind: LayerKind::Wind,
            url_template: "https://tiles.example.com/wind/{z}/{x}/{y}.png".to_string(),
            attribution: "Example".to_string(),
            opacity: 0.5,
        };
        assert_eq!(
            source.tile_url(TileCoord::new(3, 2, 1)).as_deref(),
            Some("https://tiles.example.com/wind/3/2/1.png")
        );
    }
}
