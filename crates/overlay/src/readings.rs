//! Current conditions from Open-Meteo.
//!
//! Supplies the live reading that temperature and wind layers are generated
//! from. Callers treat any error here as "no reading", which sends those
//! layers to their static fallback.

use crate::radar::map_reqwest_error;
use overlay_common::{OverlayError, OverlayResult, WeatherReading};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_READINGS_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_READINGS_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENT_FIELDS: &str = "temperature_2m,precipitation,wind_speed_10m,wind_direction_10m";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f32>,
    precipitation: Option<f32>,
    wind_speed_10m: Option<f32>,
    wind_direction_10m: Option<f32>,
}

impl From<CurrentConditions> for WeatherReading {
    fn from(c: CurrentConditions) -> Self {
        WeatherReading {
            temperature: c.temperature_2m,
            wind_speed: c.wind_speed_10m,
            wind_direction: c.wind_direction_10m,
            precipitation_rate: c.precipitation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> OverlayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OverlayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn with_defaults() -> OverlayResult<Self> {
        Self::new(DEFAULT_READINGS_URL, DEFAULT_READINGS_TIMEOUT)
    }

    /// Current temperature, precipitation and wind at a location.
    ///
    /// Wind speed is requested in m/s to match the wind ramp.
    #[instrument(skip(self))]
    pub async fn current(&self, latitude: f64, longitude: f64) -> OverlayResult<WeatherReading> {
        validate_coordinates(latitude, longitude)?;

        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_FIELDS),
                ("wind_speed_unit", "ms"),
            ])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(OverlayError::UpstreamStatus(response.status().as_u16()));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        let reading = parse_current(&body)?;
        debug!(?reading, "Fetched current conditions");
        Ok(reading)
    }
}

fn parse_current(body: &str) -> OverlayResult<WeatherReading> {
    let forecast: ForecastResponse = serde_json::from_str(body)?;
    forecast
        .current
        .map(WeatherReading::from)
        .ok_or_else(|| OverlayError::Parse("response has no current conditions".to_string()))
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> OverlayResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(OverlayError::invalid_parameter(
            "lat",
            format!("{} is outside [-90, 90]", latitude),
        ));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(OverlayError::invalid_parameter(
            "lon",
            format!("{} is outside [-180, 180]", longitude),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current() {
        let body = r#"{
            "latitude": 52.52,
            "longitude": 13.41,
            "current": {
                "time": "2024-06-01T12:00",
                "interval": 900,
                "temperature_2m": 21.5,
                "precipitation": 0.2,
                "wind_speed_10m": 4.1,
                "wind_direction_10m": 250
            }
        }"#;
        let reading = parse_current(body).unwrap();
        assert_eq!(reading.temperature(), Some(21.5));
        assert_eq!(reading.wind(), Some((4.1, 250.0)));
        assert_eq!(reading.precipitation_rate, Some(0.2));
    }

    #[test]
    fn test_parse_null_fields() {
        let body = r#"{"current":{"temperature_2m":null,"wind_speed_10m":3.0}}"#;
        let reading = parse_current(body).unwrap();
        assert_eq!(reading.temperature(), None);
        assert_eq!(reading.wind(), None);
    }

    #[test]
    fn test_missing_current_block() {
        assert!(matches!(parse_current(r#"{"error":true}"#), Err(OverlayError::Parse(_))));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(52.5, 13.4).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
