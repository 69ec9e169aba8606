//! Scalar weather readings that drive live-generated layers.

use serde::{Deserialize, Serialize};

/// A current weather observation at the selected location.
///
/// Every field is optional; a layer that needs a missing field falls back to
/// its static source instead of rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature in °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Wind speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f32>,
    /// Direction the wind blows from, in degrees clockwise from north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f32>,
    /// Precipitation rate in mm/h
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_rate: Option<f32>,
}

impl WeatherReading {
    pub fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn with_wind(mut self, speed: f32, direction: f32) -> Self {
        self.wind_speed = Some(speed);
        self.wind_direction = Some(direction);
        self
    }

    pub fn with_precipitation(mut self, rate: f32) -> Self {
        self.precipitation_rate = Some(rate);
        self
    }

    /// Temperature, if present and finite.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature.filter(|t| t.is_finite())
    }

    /// Wind speed and direction, only when both are present and finite.
    pub fn wind(&self) -> Option<(f32, f32)> {
        match (self.wind_speed, self.wind_direction) {
            (Some(speed), Some(dir)) if speed.is_finite() && dir.is_finite() => Some((speed, dir)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.wind_speed.is_none()
            && self.wind_direction.is_none()
            && self.precipitation_rate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_requires_both_components() {
        let speed_only = WeatherReading {
            wind_speed: Some(10.0),
            ..Default::default()
        };
        assert!(speed_only.wind().is_none());

        let full = WeatherReading::default().with_wind(10.0, 270.0);
        assert_eq!(full.wind(), Some((10.0, 270.0)));
    }

    #[test]
    fn test_non_finite_values_are_absent() {
        let reading = WeatherReading::default().with_temperature(f32::NAN);
        assert!(reading.temperature().is_none());
        assert!(!reading.is_empty());
    }

    #[test]
    fn test_serde_skips_missing_fields() {
        let reading = WeatherReading::default().with_temperature(21.5);
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(json, r#"{"temperature":21.5}"#);

        let parsed: WeatherReading = serde_json::from_str(r#"{"wind_speed":3.0,"wind_direction":90}"#).unwrap();
        assert_eq!(parsed.wind(), Some((3.0, 90.0)));
        assert!(parsed.temperature.is_none());
    }
}
