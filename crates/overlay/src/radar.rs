//! Latest radar frame lookup.
//!
//! The radar aggregator publishes an index of recent frames; the newest
//! frame's timestamp fills the `{time}` placeholder of the radar tile
//! template. Any failure to read the index yields a synthetic timestamp
//! instead, since providers lag real time by about ten minutes.

use chrono::{DateTime, Utc};
use metrics::counter;
use overlay_common::{OverlayError, OverlayResult};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_RADAR_INDEX_URL: &str = "https://api.rainviewer.com/public/weather-maps.json";
pub const DEFAULT_RADAR_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider lag assumed when the index is unavailable.
pub const FALLBACK_SKEW_SECS: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct RadarIndex {
    pub radar: RadarSection,
}

#[derive(Debug, Deserialize)]
pub struct RadarSection {
    #[serde(default)]
    pub past: Vec<RadarFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadarFrame {
    #[serde(default)]
    pub path: String,
    pub time: FrameTime,
}

/// Frame times are Unix seconds; accept them as numbers or strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FrameTime {
    Number(i64),
    Text(String),
}

impl FrameTime {
    /// Unix seconds; text that is not a whole number is a parse error.
    pub fn seconds(&self) -> OverlayResult<i64> {
        match self {
            FrameTime::Number(n) => Ok(*n),
            FrameTime::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| OverlayError::Parse(format!("radar frame time '{}' is not numeric", s))),
        }
    }
}

impl std::fmt::Display for FrameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameTime::Number(n) => write!(f, "{}", n),
            FrameTime::Text(s) => f.write_str(s),
        }
    }
}

/// Newest frame of the index: the last past frame, or the only one.
pub fn select_latest_frame(frames: &[RadarFrame]) -> Option<&RadarFrame> {
    frames.last().or_else(|| frames.first())
}

/// Newest frame timestamp from a raw index body.
pub fn parse_latest_timestamp(body: &str) -> OverlayResult<String> {
    let index: RadarIndex = serde_json::from_str(body)?;
    let frame = select_latest_frame(&index.radar.past)
        .ok_or_else(|| OverlayError::Parse("radar index has no past frames".to_string()))?;
    let seconds = frame.time.seconds()?;

    debug!(time = seconds, path = %frame.path, "Resolved latest radar frame");
    Ok(seconds.to_string())
}

/// Synthetic timestamp used when the index cannot be read.
pub fn fallback_timestamp(now: DateTime<Utc>) -> String {
    (now.timestamp() - FALLBACK_SKEW_SECS).to_string()
}

/// Resolves the newest radar frame timestamp from the provider index.
#[derive(Debug, Clone)]
pub struct RadarTimestampResolver {
    client: Client,
    index_url: String,
}

impl RadarTimestampResolver {
    pub fn new(index_url: impl Into<String>, timeout: Duration) -> OverlayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OverlayError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            index_url: index_url.into(),
        })
    }

    pub fn with_defaults() -> OverlayResult<Self> {
        Self::new(DEFAULT_RADAR_INDEX_URL, DEFAULT_RADAR_TIMEOUT)
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Latest frame timestamp, or the synthetic fallback on any failure.
    ///
    /// Never fails; safe to call repeatedly.
    pub async fn latest_timestamp(&self) -> String {
        match self.fetch_latest().await {
            Ok(timestamp) => timestamp,
            Err(e) => {
                let fallback = fallback_timestamp(Utc::now());
                warn!(error = %e, fallback = %fallback, "Radar index unavailable, using synthetic timestamp");
                counter!("overlay_radar_fallbacks_total").increment(1);
                fallback
            }
        }
    }

    /// Fetch and parse the index, returning the newest frame's timestamp.
    #[instrument(skip(self), fields(url = %self.index_url))]
    pub async fn fetch_latest(&self) -> OverlayResult<String> {
        let response = self
            .client
            .get(&self.index_url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(OverlayError::UpstreamStatus(response.status().as_u16()));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        parse_latest_timestamp(&body)
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> OverlayError {
    if err.is_timeout() {
        OverlayError::Timeout
    } else if err.is_decode() {
        OverlayError::Parse(err.to_string())
    } else {
        OverlayError::Network(err.to_string())
    }
}
