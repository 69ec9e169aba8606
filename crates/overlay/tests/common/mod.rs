//! Resolvers and helpers shared by the overlay integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use overlay::{OverlayController, RecordingSurface, SourceResolver, TileSource, TileSourceRegistry};
use overlay_common::{LayerDescriptor, OverlayError, OverlayResult, SourceSpec, WeatherReading};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

pub const FIXED_RADAR_TIME: &str = "1700000000";

/// Resolve without any network access.
pub fn resolve_offline(
    descriptor: &LayerDescriptor,
    reading: Option<&WeatherReading>,
) -> OverlayResult<TileSource> {
    let kind = descriptor.kind();
    match descriptor.source() {
        SourceSpec::RadarFrame { template } => Ok(TileSource::Remote {
            kind,
            url_template: template.replace("{time}", FIXED_RADAR_TIME),
            attribution: descriptor.attribution().to_string(),
            opacity: descriptor.opacity(),
        }),
        SourceSpec::Live => {
            let reading = reading
                .filter(|r| kind.has_live_input(r))
                .ok_or(OverlayError::MissingReading(kind))?;
            Ok(TileSource::Live {
                kind,
                reading: *reading,
                attribution: descriptor.attribution().to_string(),
                opacity: descriptor.opacity(),
            })
        }
        _ => TileSource::from_static(descriptor)
            .ok_or_else(|| OverlayError::Config("not static".to_string())),
    }
}

/// Shared handle for observing and releasing a [`GatedResolver`].
pub struct Gate {
    started: Notify,
    permits: Semaphore,
    calls: AtomicUsize,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            started: Notify::new(),
            permits: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Gate {
    /// Wait until a resolution has started and is blocked on the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let `n` blocked resolutions complete.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Resolver that blocks every call until the test releases it.
pub struct GatedResolver {
    gate: Arc<Gate>,
}

impl GatedResolver {
    pub fn new() -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        (Self { gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl SourceResolver for GatedResolver {
    async fn resolve(
        &self,
        descriptor: &LayerDescriptor,
        reading: Option<&WeatherReading>,
    ) -> OverlayResult<TileSource> {
        self.gate.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.started.notify_one();
        let permit = self
            .gate
            .permits
            .acquire()
            .await
            .map_err(|e| OverlayError::Network(e.to_string()))?;
        permit.forget();
        resolve_offline(descriptor, reading)
    }
}

/// Resolver that answers immediately and counts calls.
#[derive(Default)]
pub struct OfflineResolver {
    calls: Arc<AtomicUsize>,
}

impl OfflineResolver {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: calls.clone() }, calls)
    }
}

#[async_trait]
impl SourceResolver for OfflineResolver {
    async fn resolve(
        &self,
        descriptor: &LayerDescriptor,
        reading: Option<&WeatherReading>,
    ) -> OverlayResult<TileSource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        resolve_offline(descriptor, reading)
    }
}

/// Resolver whose every lookup fails like an unreachable provider.
pub struct UnreachableResolver;

#[async_trait]
impl SourceResolver for UnreachableResolver {
    async fn resolve(
        &self,
        _descriptor: &LayerDescriptor,
        _reading: Option<&WeatherReading>,
    ) -> OverlayResult<TileSource> {
        Err(OverlayError::Network("connection refused".to_string()))
    }
}

pub fn controller<R: SourceResolver>(resolver: R) -> OverlayController<RecordingSurface, R> {
    let registry = Arc::new(TileSourceRegistry::builtin().expect("builtin registry"));
    OverlayController::new(registry, resolver, RecordingSurface::new())
}

/// A controller whose surface rejects attaches while the returned flag is set.
pub fn rejecting_controller<R: SourceResolver>(
    resolver: R,
) -> (OverlayController<RecordingSurface, R>, Arc<AtomicBool>) {
    let registry = Arc::new(TileSourceRegistry::builtin().expect("builtin registry"));
    let reject = Arc::new(AtomicBool::new(true));
    let surface = RecordingSurface::with_rejection(reject.clone());
    (OverlayController::new(registry, resolver, surface), reject)
}
