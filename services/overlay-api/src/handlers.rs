//! HTTP request handlers.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use overlay::{AttachedOverlay, AttachmentId, LayerStatus, SurfaceEvent, TileSource};
use overlay_common::{LayerKind, OverlayError, TileCoord, WeatherReading};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::state::{AppState, Session};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session limit of {0} reached")]
    TooManySessions(usize),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Overlay(e) => {
                StatusCode::from_u16(e.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManySessions(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<renderer::RenderError> for ApiError {
    fn from(err: renderer::RenderError) -> Self {
        ApiError::Overlay(err.into())
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn png_response(png: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        png,
    )
        .into_response()
}

fn parse_tile(z: &str, x: &str, y: &str) -> ApiResult<TileCoord> {
    Ok(TileCoord::parse_path(&format!("{}/{}/{}", z, x, y))?)
}

// ============================================================================
// Health and metrics
// ============================================================================

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

/// GET /api/metrics - JSON metrics snapshot
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

// ============================================================================
// Registry and upstream lookups
// ============================================================================

/// GET /api/layers - Tile source registry
pub async fn layers_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.as_ref().clone())
}

/// GET /api/radar/latest - Newest radar frame timestamp (never fails)
#[instrument(skip(state))]
pub async fn radar_latest_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = state.radar.latest_timestamp().await;
    Json(json!({ "timestamp": timestamp }))
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub lat: f64,
    pub lon: f64,
}

/// GET /api/readings?lat=&lon= - Current conditions at a location
#[instrument(skip(state))]
pub async fn readings_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> ApiResult<Json<WeatherReading>> {
    let result = state.readings.current(query.lat, query.lon).await;
    state.metrics.record_readings_request(result.is_ok());
    Ok(Json(result?))
}

// ============================================================================
// Tiles
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LiveTileQuery {
    pub temperature: Option<f32>,
    pub wind_speed: Option<f32>,
    pub wind_direction: Option<f32>,
}

impl From<LiveTileQuery> for WeatherReading {
    fn from(q: LiveTileQuery) -> Self {
        WeatherReading {
            temperature: q.temperature,
            wind_speed: q.wind_speed,
            wind_direction: q.wind_direction,
            precipitation_rate: None,
        }
    }
}

/// GET /tiles/live/:kind/:z/:x/:y - Tile generated from the reading in the query
#[instrument(skip(state, query))]
pub async fn live_tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((kind, z, x, y)): Path<(String, String, String, String)>,
    Query(query): Query<LiveTileQuery>,
) -> ApiResult<Response> {
    let kind: LayerKind = kind.parse()?;
    let coord = parse_tile(&z, &x, &y)?;
    let reading = WeatherReading::from(query);

    let start = Instant::now();
    let result = state.generator.render(kind, &reading, coord);
    state
        .metrics
        .record_render(kind, start.elapsed().as_micros() as u64, result.is_ok())
        .await;

    Ok(png_response(result?.png))
}

/// GET /tiles/fallback/:kind/:z/:x/:y - Tile of the statically declared fallback
#[instrument(skip(state))]
pub async fn fallback_tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((kind, z, x, y)): Path<(String, String, String, String)>,
) -> ApiResult<Response> {
    let kind: LayerKind = kind.parse()?;
    let coord = parse_tile(&z, &x, &y)?;

    let fallback = state
        .registry
        .fallback(kind)
        .ok_or_else(|| OverlayError::UnknownLayer(format!("{} has no fallback", kind)))?;

    match TileSource::from_static(fallback) {
        Some(TileSource::Solid { rgba, .. }) => {
            let tile = state.generator.render_solid(rgba)?;
            Ok(png_response(tile.png))
        }
        Some(source @ TileSource::Remote { .. }) => {
            let url = source.tile_url(coord).unwrap_or_default();
            Ok(Redirect::temporary(&url).into_response())
        }
        _ => Err(OverlayError::Config(format!("{} fallback is not static", kind)).into()),
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<WeatherReading>,
    pub layers: Vec<LayerStatus>,
    pub overlays: Vec<AttachedOverlay>,
}

async fn session_view(session: &Session) -> SessionView {
    SessionView {
        id: session.id,
        created_at: session.created_at,
        reading: session.reading().await,
        layers: session.controller.statuses().await,
        overlays: session.controller.inspect_surface(|s| s.snapshot()).await,
    }
}

async fn find_session(state: &AppState, id: Uuid) -> ApiResult<Arc<Session>> {
    state.session(id).await.ok_or(ApiError::SessionNotFound(id))
}

/// POST /api/sessions
pub async fn create_session_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let session = state.create_session().await?;
    Ok((StatusCode::CREATED, Json(session_view(&session).await)))
}

/// GET /api/sessions/:id
pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    Ok(Json(session_view(&session).await))
}

/// DELETE /api/sessions/:id - Tear down the session's surface
pub async fn delete_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.remove_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// PUT /api/sessions/:id/reading - Replace the reading used by live layers
pub async fn set_reading_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(reading): Json<WeatherReading>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let reading = (!reading.is_empty()).then_some(reading);
    session.set_reading(reading).await;
    Ok(Json(session_view(&session).await))
}

#[derive(Debug, Deserialize)]
pub struct LayerToggle {
    pub enabled: bool,
}

/// PUT /api/sessions/:id/layers/:kind - Toggle a layer
#[instrument(skip(state))]
pub async fn set_layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, kind)): Path<(Uuid, String)>,
    Json(toggle): Json<LayerToggle>,
) -> ApiResult<Json<LayerStatus>> {
    let kind: LayerKind = kind.parse()?;
    let session = find_session(&state, id).await?;
    let reading = session.reading().await;
    let status = session.controller.set_enabled(kind, toggle.enabled, reading).await;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct TileErrorReport {
    pub attachment: u64,
    #[serde(default)]
    pub tile: Option<TileCoord>,
}

/// POST /api/sessions/:id/layers/:kind/tile-error - Report a failed tile load
#[instrument(skip(state))]
pub async fn tile_error_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, kind)): Path<(Uuid, String)>,
    Json(report): Json<TileErrorReport>,
) -> ApiResult<Json<LayerStatus>> {
    let kind: LayerKind = kind.parse()?;
    let session = find_session(&state, id).await?;
    let status = session
        .controller
        .handle_event(SurfaceEvent::TileLoadFailed {
            kind,
            attachment: AttachmentId::new(report.attachment),
            coord: report.tile,
        })
        .await;
    Ok(Json(status))
}
