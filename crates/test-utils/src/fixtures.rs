//! Common fixtures for overlay tests.

use overlay_common::{TileCoord, WeatherReading};
use std::io::Write;

/// Readings covering the interesting parts of each ramp.
pub mod readings {
    use super::WeatherReading;

    /// A hot afternoon: 35°C, fresh breeze from the south-west.
    pub fn hot_day() -> WeatherReading {
        WeatherReading::default()
            .with_temperature(35.0)
            .with_wind(9.5, 225.0)
            .with_precipitation(0.0)
    }

    /// Below the arrow threshold.
    pub fn calm() -> WeatherReading {
        WeatherReading::default().with_temperature(12.0).with_wind(2.0, 90.0)
    }

    /// Storm strength wind, beyond the top of the wind scale.
    pub fn storm() -> WeatherReading {
        WeatherReading::default().with_temperature(18.0).with_wind(65.0, 300.0)
    }

    /// Temperature only; wind layers have nothing to render.
    pub fn temperature_only(celsius: f32) -> WeatherReading {
        WeatherReading::default().with_temperature(celsius)
    }
}

/// Tile coordinates used across tests.
pub mod tiles {
    use super::TileCoord;

    /// Deep enough for labels on both live layers.
    pub const LABELLED: TileCoord = TileCoord { z: 5, x: 4, y: 3 };

    /// Too shallow for any label.
    pub const OVERVIEW: TileCoord = TileCoord { z: 2, x: 1, y: 1 };

    pub const WORLD: TileCoord = TileCoord { z: 0, x: 0, y: 0 };
}

/// A complete registry file with a static wind template instead of live wind.
pub const REGISTRY_YAML: &str = r#"
layers:
  - kind: temperature
    primary:
      source: { type: live }
      attribution: Live Temperature Data
      opacity: 0.6
    fallback:
      source: { type: solid, rgba: [255, 100, 100, 77] }
      attribution: Temperature Simulation Layer
      opacity: 0.5
  - kind: precipitation
    primary:
      source:
        type: radar_frame
        template: "https://tilecache.rainviewer.com/v2/radar/{time}/256/{z}/{x}/{y}/2/1_1.png"
      attribution: RainViewer
      opacity: 0.6
    fallback:
      source: { type: solid, rgba: [100, 100, 255, 77] }
      opacity: 0.3
  - kind: wind
    primary:
      source:
        type: url_template
        template: "https://tile.openweathermap.org/map/wind_new/{z}/{x}/{y}.png"
      attribution: OpenWeatherMap
      opacity: 0.5
    fallback:
      source: { type: solid, rgba: [100, 255, 100, 77] }
      opacity: 0.3
"#;

/// Write `contents` to a fresh temporary file and return its handle.
pub fn temp_config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("overlay-test-")
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_tiles_are_valid() {
        for coord in [tiles::LABELLED, tiles::OVERVIEW, tiles::WORLD] {
            assert!(coord.validate().is_ok());
        }
    }

    #[test]
    fn test_temp_config_file_round_trip() {
        let file = temp_config_file("layers: []\n");
        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents, "layers: []\n");
    }
}
