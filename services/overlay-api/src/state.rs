//! Application state and shared resources.

use chrono::{DateTime, Utc};
use overlay::radar::{DEFAULT_RADAR_INDEX_URL, DEFAULT_RADAR_TIMEOUT};
use overlay::readings::{DEFAULT_READINGS_TIMEOUT, DEFAULT_READINGS_URL};
use overlay::{
    DefaultSourceResolver, OpenMeteoClient, OverlayController, RadarTimestampResolver,
    RecordingSurface, TileSourceRegistry,
};
use overlay_common::{OverlayResult, WeatherReading};
use renderer::LiveTileGenerator;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::metrics::MetricsCollector;

/// Sessions untouched for this long are torn down.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Startup configuration, filled from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Registry YAML; the built-in registry is used when absent
    pub registry_path: Option<PathBuf>,
    pub radar_index_url: String,
    pub radar_timeout: Duration,
    pub readings_url: String,
    pub readings_timeout: Duration,
    /// Idle time after which a session is swept
    pub session_ttl: Duration,
    /// Live sessions allowed at once
    pub max_sessions: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            registry_path: None,
            radar_index_url: DEFAULT_RADAR_INDEX_URL.to_string(),
            radar_timeout: DEFAULT_RADAR_TIMEOUT,
            readings_url: DEFAULT_READINGS_URL.to_string(),
            readings_timeout: DEFAULT_READINGS_TIMEOUT,
            session_ttl: DEFAULT_SESSION_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

pub type SessionController = OverlayController<RecordingSurface, DefaultSourceResolver>;

/// One map view: a controller over its own surface plus the reading
/// that live layers are generated from.
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub controller: SessionController,
    reading: RwLock<Option<WeatherReading>>,
    last_seen: RwLock<Instant>,
}

impl Session {
    pub async fn touch(&self) {
        *self.last_seen.write().await = Instant::now();
    }

    /// Time since the session was last looked up.
    pub async fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.read().await)
    }

    pub async fn reading(&self) -> Option<WeatherReading> {
        *self.reading.read().await
    }

    pub async fn set_reading(&self, reading: Option<WeatherReading>) {
        *self.reading.write().await = reading;
    }
}

/// Shared application state.
pub struct AppState {
    pub registry: Arc<TileSourceRegistry>,
    pub generator: LiveTileGenerator,
    pub radar: RadarTimestampResolver,
    pub readings: OpenMeteoClient,
    pub sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    pub metrics: Arc<MetricsCollector>,
    session_ttl: Duration,
    max_sessions: usize,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> OverlayResult<Self> {
        let registry = match &config.registry_path {
            Some(path) => TileSourceRegistry::load_from_file(path)?,
            None => {
                info!("Using built-in tile source registry");
                TileSourceRegistry::builtin()?
            }
        };

        Ok(Self {
            registry: Arc::new(registry),
            generator: LiveTileGenerator::new(),
            radar: RadarTimestampResolver::new(&config.radar_index_url, config.radar_timeout)?,
            readings: OpenMeteoClient::new(&config.readings_url, config.readings_timeout)?,
            sessions: RwLock::new(HashMap::new()),
            metrics: Arc::new(MetricsCollector::new()),
            session_ttl: config.session_ttl,
            max_sessions: config.max_sessions,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start a session with a fresh surface and every layer off.
    ///
    /// At capacity, idle sessions are swept first; if none were idle the
    /// request is refused.
    pub async fn create_session(&self) -> Result<Arc<Session>, ApiError> {
        if self.session_count().await >= self.max_sessions {
            self.sweep_idle_sessions(Instant::now()).await;
        }

        let id = Uuid::new_v4();
        let controller = OverlayController::new(
            self.registry.clone(),
            DefaultSourceResolver::new(self.radar.clone()),
            RecordingSurface::new(),
        );
        let session = Arc::new(Session {
            id,
            created_at: Utc::now(),
            controller,
            reading: RwLock::new(None),
            last_seen: RwLock::new(Instant::now()),
        });

        {
            let mut sessions = self.sessions.write().await;
            if sessions.len() >= self.max_sessions {
                warn!(limit = self.max_sessions, "Session limit reached");
                return Err(ApiError::TooManySessions(self.max_sessions));
            }
            sessions.insert(id, session.clone());
        }
        self.metrics.record_session_created();
        info!(session = %id, "Created overlay session");
        Ok(session)
    }

    /// Look up a session and mark it as recently used.
    pub async fn session(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch().await;
        Some(session)
    }

    /// Remove a session and tear down its surface.
    pub async fn remove_session(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.controller.teardown().await;
                info!(session = %id, "Removed overlay session");
                true
            }
            None => false,
        }
    }

    /// Remove every session idle for at least the TTL as of `now`.
    ///
    /// Returns the number of sessions removed.
    pub async fn sweep_idle_sessions(&self, now: Instant) -> usize {
        let expired: Vec<Uuid> = {
            let sessions = self.sessions.read().await;
            let mut expired = Vec::new();
            for (id, session) in sessions.iter() {
                if session.idle_for(now).await >= self.session_ttl {
                    expired.push(*id);
                }
            }
            expired
        };

        let mut removed = 0;
        for id in expired {
            if self.remove_session(id).await {
                removed += 1;
            }
        }

        if removed > 0 {
            self.metrics.record_sessions_expired(removed as u64);
            info!(removed, ttl_secs = self.session_ttl.as_secs(), "Swept idle sessions");
        } else {
            debug!("No idle sessions to sweep");
        }
        removed
    }
}

/// Sweep idle sessions every `period` until the runtime shuts down.
pub fn spawn_session_sweeper(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            state.sweep_idle_sessions(Instant::now()).await;
        }
    })
}
