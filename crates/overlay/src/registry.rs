//! Tile source registry.
//!
//! A read-only table of primary and fallback descriptors per layer kind,
//! built once at startup (built-in defaults or a YAML file) and shared by
//! reference with every controller.

use overlay_common::{LayerDescriptor, LayerKind, OverlayError, OverlayResult, SourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// RainViewer radar tiles, 256px, colour scheme 2, smoothed with snow.
pub const RAINVIEWER_TILE_TEMPLATE: &str =
    "https://tilecache.rainviewer.com/v2/radar/{time}/256/{z}/{x}/{y}/2/1_1.png";

/// Primary and fallback descriptors for one layer kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub primary: LayerDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<LayerDescriptor>,
}

impl RegistryEntry {
    pub fn new(primary: LayerDescriptor, fallback: Option<LayerDescriptor>) -> Self {
        let has_fallback = fallback.is_some();
        Self {
            primary: primary.with_fallback(has_fallback),
            fallback: fallback.map(|f| f.with_fallback(false)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TileSourceRegistry {
    layers: BTreeMap<LayerKind, RegistryEntry>,
}

// ============================================================================
// YAML file format
// ============================================================================

#[derive(Debug, Deserialize)]
struct YamlRegistryFile {
    layers: Vec<YamlLayerEntry>,
}

#[derive(Debug, Deserialize)]
struct YamlLayerEntry {
    kind: LayerKind,
    primary: YamlDescriptor,
    #[serde(default)]
    fallback: Option<YamlDescriptor>,
}

#[derive(Debug, Deserialize)]
struct YamlDescriptor {
    source: SourceSpec,
    #[serde(default)]
    attribution: String,
    #[serde(default = "default_opacity")]
    opacity: f32,
}

fn default_opacity() -> f32 {
    0.5
}

impl YamlDescriptor {
    fn into_descriptor(self, kind: LayerKind) -> OverlayResult<LayerDescriptor> {
        LayerDescriptor::new(kind, self.source, self.attribution, self.opacity)
    }
}

impl TileSourceRegistry {
    /// Build a registry, requiring exactly one entry per layer kind.
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> OverlayResult<Self> {
        let mut layers = BTreeMap::new();
        for entry in entries {
            let kind = entry.primary.kind();
            if let Some(fallback) = &entry.fallback {
                if fallback.kind() != kind {
                    return Err(OverlayError::Config(format!(
                        "{} entry has a {} fallback",
                        kind,
                        fallback.kind()
                    )));
                }
                if fallback.is_live() {
                    return Err(OverlayError::Config(format!(
                        "{} fallback must be a static source",
                        kind
                    )));
                }
            }
            if layers.insert(kind, entry).is_some() {
                return Err(OverlayError::Config(format!("{} is declared twice", kind)));
            }
        }

        for kind in LayerKind::all() {
            if !layers.contains_key(kind) {
                return Err(OverlayError::Config(format!("no entry for {}", kind)));
            }
        }

        Ok(Self { layers })
    }

    /// The built-in sources: live temperature and wind, RainViewer radar,
    /// and translucent solid fallbacks for each.
    pub fn builtin() -> OverlayResult<Self> {
        Self::new([
            RegistryEntry::new(
                LayerDescriptor::new(
                    LayerKind::Temperature,
                    SourceSpec::Live,
                    "Live Temperature Data",
                    0.6,
                )?,
                Some(LayerDescriptor::new(
                    LayerKind::Temperature,
                    SourceSpec::Solid {
                        rgba: [255, 100, 100, 77],
                    },
                    "Temperature Simulation Layer",
                    0.5,
                )?),
            ),
            RegistryEntry::new(
                LayerDescriptor::new(
                    LayerKind::Precipitation,
                    SourceSpec::RadarFrame {
                        template: RAINVIEWER_TILE_TEMPLATE.to_string(),
                    },
                    "RainViewer",
                    0.6,
                )?,
                Some(LayerDescriptor::new(
                    LayerKind::Precipitation,
                    SourceSpec::Solid {
                        rgba: [100, 100, 255, 77],
                    },
                    "Precipitation Simulation Layer",
                    0.3,
                )?),
            ),
            RegistryEntry::new(
                LayerDescriptor::new(LayerKind::Wind, SourceSpec::Live, "Live Wind Data", 0.5)?,
                Some(LayerDescriptor::new(
                    LayerKind::Wind,
                    SourceSpec::Solid {
                        rgba: [100, 255, 100, 77],
                    },
                    "Wind Simulation Layer",
                    0.3,
                )?),
            ),
        ])
    }

    /// Parse a registry from YAML text.
    pub fn from_yaml(contents: &str) -> OverlayResult<Self> {
        let file: YamlRegistryFile = serde_yaml::from_str(contents)
            .map_err(|e| OverlayError::Config(format!("invalid registry YAML: {}", e)))?;

        let mut entries = Vec::with_capacity(file.layers.len());
        for layer in file.layers {
            let primary = layer.primary.into_descriptor(layer.kind)?;
            let fallback = layer
                .fallback
                .map(|f| f.into_descriptor(layer.kind))
                .transpose()?;
            entries.push(RegistryEntry::new(primary, fallback));
        }

        Self::new(entries)
    }

    /// Load a registry from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> OverlayResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            OverlayError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let registry = Self::from_yaml(&contents)?;
        info!(path = %path.display(), layers = registry.layers.len(), "Loaded tile source registry");
        Ok(registry)
    }

    pub fn get(&self, kind: LayerKind) -> Option<&RegistryEntry> {
        self.layers.get(&kind)
    }

    pub fn primary(&self, kind: LayerKind) -> Option<&LayerDescriptor> {
        self.get(kind).map(|e| &e.primary)
    }

    pub fn fallback(&self, kind: LayerKind) -> Option<&LayerDescriptor> {
        self.get(kind).and_then(|e| e.fallback.as_ref())
    }

    pub fn entries(&self) -> impl Iterator<Item = (LayerKind, &RegistryEntry)> {
        self.layers.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_kind() {
        let registry = TileSourceRegistry::builtin().unwrap();
        for kind in LayerKind::all() {
            let entry = registry.get(*kind).unwrap();
            assert!(entry.primary.has_fallback());
            assert!(!entry.fallback.as_ref().unwrap().is_live());
        }
    }

    #[test]
    fn test_builtin_radar_template() {
        let registry = TileSourceRegistry::builtin().unwrap();
        let primary = registry.primary(LayerKind::Precipitation).unwrap();
        assert_eq!(primary.attribution(), "RainViewer");
        assert!(matches!(primary.source(), SourceSpec::RadarFrame { template } if template == RAINVIEWER_TILE_TEMPLATE));
    }

    #[test]
    fn test_duplicate_kind_is_rejected() {
        let live = LayerDescriptor::new(LayerKind::Wind, SourceSpec::Live, "w", 0.5).unwrap();
        let result = TileSourceRegistry::new([
            RegistryEntry::new(live.clone(), None),
            RegistryEntry::new(live, None),
        ]);
        assert!(matches!(result, Err(OverlayError::Config(_))));
    }
}
