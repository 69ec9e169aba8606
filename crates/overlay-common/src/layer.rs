//! Layer kinds and tile source declarations.

use crate::{OverlayError, OverlayResult, WeatherReading};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A climate variable that can be drawn as a map overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Temperature,
    Precipitation,
    Wind,
}

impl LayerKind {
    pub const fn all() -> &'static [LayerKind] {
        &[LayerKind::Temperature, LayerKind::Precipitation, LayerKind::Wind]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Temperature => "temperature",
            LayerKind::Precipitation => "precipitation",
            LayerKind::Wind => "wind",
        }
    }

    /// Whether this kind can be synthesized from a scalar reading.
    pub fn supports_live(&self) -> bool {
        matches!(self, LayerKind::Temperature | LayerKind::Wind)
    }

    /// Whether the reading carries what a live tile of this kind needs.
    pub fn has_live_input(&self, reading: &WeatherReading) -> bool {
        match self {
            LayerKind::Temperature => reading.temperature().is_some(),
            LayerKind::Wind => reading.wind().is_some(),
            LayerKind::Precipitation => false,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(LayerKind::Temperature),
            "precipitation" | "precip" | "radar" => Ok(LayerKind::Precipitation),
            "wind" => Ok(LayerKind::Wind),
            _ => Err(OverlayError::UnknownLayer(s.to_string())),
        }
    }
}

/// Where a layer's tiles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    /// Remote tiles addressed by a `{z}/{x}/{y}` URL template
    UrlTemplate { template: String },
    /// Remote radar tiles; `{time}` is filled with the latest frame timestamp
    RadarFrame { template: String },
    /// Tiles synthesized locally from the live reading
    Live,
    /// A single translucent colour, always available
    Solid { rgba: [u8; 4] },
}

impl SourceSpec {
    fn validate(&self, kind: LayerKind) -> OverlayResult<()> {
        let require = |template: &str, placeholders: &[&str]| {
            for p in placeholders {
                if !template.contains(p) {
                    return Err(OverlayError::Config(format!(
                        "{} template '{}' is missing {}",
                        kind, template, p
                    )));
                }
            }
            Ok(())
        };

        match self {
            SourceSpec::UrlTemplate { template } => require(template, &["{z}", "{x}", "{y}"]),
            SourceSpec::RadarFrame { template } => {
                require(template, &["{z}", "{x}", "{y}", "{time}"])
            }
            SourceSpec::Live if !kind.supports_live() => Err(OverlayError::Config(format!(
                "{} layers cannot be generated from a live reading",
                kind
            ))),
            SourceSpec::Live | SourceSpec::Solid { .. } => Ok(()),
        }
    }
}

/// Declarative description of one tile source for a layer kind.
///
/// Immutable once constructed; the registry hands out shared references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDescriptor {
    kind: LayerKind,
    source: SourceSpec,
    attribution: String,
    opacity: f32,
    has_fallback: bool,
}

impl LayerDescriptor {
    pub fn new(
        kind: LayerKind,
        source: SourceSpec,
        attribution: impl Into<String>,
        opacity: f32,
    ) -> OverlayResult<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(OverlayError::invalid_parameter(
                "opacity",
                format!("{} is outside [0, 1]", opacity),
            ));
        }
        source.validate(kind)?;

        Ok(Self {
            kind,
            source,
            attribution: attribution.into(),
            opacity,
            has_fallback: false,
        })
    }

    /// Mark that the registry declares a fallback for this descriptor.
    pub fn with_fallback(mut self, has_fallback: bool) -> Self {
        self.has_fallback = has_fallback;
        self
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn has_fallback(&self) -> bool {
        self.has_fallback
    }

    /// Live sources track current conditions (generated tiles or radar frames).
    pub fn is_live(&self) -> bool {
        matches!(self.source, SourceSpec::Live | SourceSpec::RadarFrame { .. })
    }

    /// Live-generated sources cannot be built without a reading.
    pub fn requires_reading(&self) -> bool {
        matches!(self.source, SourceSpec::Live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Temperature".parse::<LayerKind>().unwrap(), LayerKind::Temperature);
        assert_eq!("radar".parse::<LayerKind>().unwrap(), LayerKind::Precipitation);
        assert!(matches!(
            "humidity".parse::<LayerKind>(),
            Err(OverlayError::UnknownLayer(_))
        ));
    }

    #[test]
    fn test_descriptor_rejects_bad_opacity() {
        let result = LayerDescriptor::new(LayerKind::Wind, SourceSpec::Live, "wind", 1.5);
        assert!(matches!(result, Err(OverlayError::InvalidParameter { .. })));
    }

    #[test]
    fn test_descriptor_requires_placeholders() {
        let missing_time = SourceSpec::RadarFrame {
            template: "https://radar.example.com/{z}/{x}/{y}.png".to_string(),
        };
        assert!(LayerDescriptor::new(LayerKind::Precipitation, missing_time, "radar", 0.6).is_err());

        let ok = SourceSpec::UrlTemplate {
            template: "https://tiles.example.com/{z}/{x}/{y}.png".to_string(),
        };
        assert!(LayerDescriptor::new(LayerKind::Wind, ok, "tiles", 0.5).is_ok());
    }

    #[test]
    fn test_live_precipitation_is_rejected() {
        let result = LayerDescriptor::new(LayerKind::Precipitation, SourceSpec::Live, "x", 0.5);
        assert!(matches!(result, Err(OverlayError::Config(_))));
    }

    #[test]
    fn test_live_flags() {
        let live = LayerDescriptor::new(LayerKind::Temperature, SourceSpec::Live, "t", 0.6).unwrap();
        assert!(live.is_live());
        assert!(live.requires_reading());

        let solid = LayerDescriptor::new(
            LayerKind::Temperature,
            SourceSpec::Solid { rgba: [255, 100, 100, 77] },
            "t",
            0.5,
        )
        .unwrap();
        assert!(!solid.is_live());
        assert!(!solid.requires_reading());
    }

    #[test]
    fn test_source_spec_serde_tag() {
        let spec: SourceSpec = serde_json::from_str(r#"{"type":"solid","rgba":[1,2,3,4]}"#).unwrap();
        assert_eq!(spec, SourceSpec::Solid { rgba: [1, 2, 3, 4] });
    }
}
