//! Climate overlay API service library.
//!
//! Serves live and fallback tiles, the tile source registry, radar and
//! reading lookups, and per-session overlay controllers over HTTP.

pub mod handlers;
pub mod metrics;
pub mod state;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the service router with every route and layer attached.
pub fn build_router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/metrics", get(handlers::api_metrics_handler))
        // Registry and upstream lookups
        .route("/api/layers", get(handlers::layers_handler))
        .route("/api/radar/latest", get(handlers::radar_latest_handler))
        .route("/api/readings", get(handlers::readings_handler))
        // Tiles
        .route("/tiles/live/:kind/:z/:x/:y", get(handlers::live_tile_handler))
        .route("/tiles/fallback/:kind/:z/:x/:y", get(handlers::fallback_tile_handler))
        // Controller sessions
        .route("/api/sessions", post(handlers::create_session_handler))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session_handler).delete(handlers::delete_session_handler),
        )
        .route("/api/sessions/:id/reading", put(handlers::set_reading_handler))
        .route("/api/sessions/:id/layers/:kind", put(handlers::set_layer_handler))
        .route(
            "/api/sessions/:id/layers/:kind/tile-error",
            post(handlers::tile_error_handler),
        )
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
