//! Climate overlay API service.
//!
//! HTTP server for live overlay tiles, tile source lookups, and per-session
//! overlay controllers.

use anyhow::{Context, Result};
use clap::Parser;
use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use overlay::radar::{DEFAULT_RADAR_INDEX_URL, DEFAULT_RADAR_TIMEOUT};
use overlay::readings::{DEFAULT_READINGS_TIMEOUT, DEFAULT_READINGS_URL};
use overlay_api::state::{spawn_session_sweeper, AppState, ServiceConfig, DEFAULT_MAX_SESSIONS};

#[derive(Parser, Debug)]
#[command(name = "overlay-api")]
#[command(about = "Climate overlay tile and controller server")]
struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Tile source registry YAML (built-in registry when omitted)
    #[arg(long, env = "OVERLAY_REGISTRY")]
    registry_config: Option<PathBuf>,

    /// Radar frame index URL
    #[arg(long, env = "RADAR_INDEX_URL", default_value = DEFAULT_RADAR_INDEX_URL)]
    radar_index_url: String,

    /// Radar index request timeout in seconds
    #[arg(long, env = "RADAR_TIMEOUT_SECS")]
    radar_timeout_secs: Option<u64>,

    /// Current conditions endpoint
    #[arg(long, env = "READINGS_URL", default_value = DEFAULT_READINGS_URL)]
    readings_url: String,

    /// Current conditions request timeout in seconds
    #[arg(long, env = "READINGS_TIMEOUT_SECS")]
    readings_timeout_secs: Option<u64>,

    /// Idle seconds before a session is torn down
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 1800)]
    session_ttl_secs: u64,

    /// Maximum concurrent sessions
    #[arg(long, env = "MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            registry_path: self.registry_config.clone(),
            radar_index_url: self.radar_index_url.clone(),
            radar_timeout: self
                .radar_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RADAR_TIMEOUT),
            readings_url: self.readings_url.clone(),
            readings_timeout: self
                .readings_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_READINGS_TIMEOUT),
            session_ttl: Duration::from_secs(self.session_ttl_secs),
            max_sessions: self.max_sessions,
        }
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    let threads = args.worker_threads.or_else(|| {
        env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
    });
    if let Some(threads) = threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))?;
    Ok(())
}

async fn async_main(args: Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Prometheus metrics exporter initialized");
    info!("Starting climate overlay API server");

    let config = args.service_config();
    let state = Arc::new(AppState::new(&config).context("Failed to initialize state")?);

    spawn_session_sweeper(state.clone(), config.session_ttl / 4);
    info!(ttl_secs = config.session_ttl.as_secs(), "Session sweeper started");

    let app = overlay_api::build_router(state, prometheus_handle);

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
