//! Per-layer selection and fallback state machine.
//!
//! Each layer kind moves through
//! `Inactive -> Loading -> Active(primary) -> Active(fallback) -> Inactive`.
//!
//! All surface mutations happen under one lock. Source resolution is the
//! only suspension point and runs outside the lock; its result is applied
//! only if the slot's generation is unchanged, so a newer toggle always wins
//! over an older in-flight resolution.

use crate::registry::{RegistryEntry, TileSourceRegistry};
use crate::source::{SourceOrigin, SourceResolver, TileSource};
use crate::surface::{AttachmentId, MapSurface};
use metrics::counter;
use overlay_common::{LayerKind, OverlayError, TileCoord, WeatherReading};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Inactive,
    Loading,
    Active {
        origin: SourceOrigin,
        attachment: AttachmentId,
    },
}

/// Externally visible state of one layer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerStatus {
    pub kind: LayerKind,
    /// The user wants this layer shown
    pub enabled: bool,
    /// A source is attached to the surface
    pub active: bool,
    pub current_source: Option<SourceOrigin>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentId>,
}

/// Notifications from the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// One or more tiles of an attached overlay failed to load
    TileLoadFailed {
        kind: LayerKind,
        attachment: AttachmentId,
        coord: Option<TileCoord>,
    },
}

#[derive(Debug)]
struct LayerSlot {
    desired: bool,
    generation: u64,
    state: LayerState,
}

impl LayerSlot {
    fn new() -> Self {
        Self {
            desired: false,
            generation: 0,
            state: LayerState::Inactive,
        }
    }

    fn status(&self, kind: LayerKind) -> LayerStatus {
        let (current_source, attachment) = match self.state {
            LayerState::Active { origin, attachment } => (Some(origin), Some(attachment)),
            _ => (None, None),
        };
        LayerStatus {
            kind,
            enabled: self.desired,
            active: attachment.is_some(),
            current_source,
            loading: self.state == LayerState::Loading,
            attachment,
        }
    }
}

struct Inner<S> {
    surface: S,
    slots: BTreeMap<LayerKind, LayerSlot>,
    torn_down: bool,
}

impl<S: MapSurface> Inner<S> {
    fn slot_mut(&mut self, kind: LayerKind) -> &mut LayerSlot {
        self.slots.entry(kind).or_insert_with(LayerSlot::new)
    }

    fn status(&self, kind: LayerKind) -> LayerStatus {
        self.slots
            .get(&kind)
            .map(|s| s.status(kind))
            .unwrap_or_else(|| LayerSlot::new().status(kind))
    }

    /// Detach, logging failures; the surface may already be gone.
    fn detach_logged(&mut self, kind: LayerKind, attachment: AttachmentId) {
        if let Err(e) = self.surface.detach(attachment) {
            warn!(%kind, %attachment, error = %e, "Failed to detach overlay");
        }
    }

    /// Attach and record the result in the slot.
    fn attach_into_slot(&mut self, kind: LayerKind, source: &TileSource, origin: SourceOrigin) {
        let state = match self.surface.attach(source) {
            Ok(attachment) => {
                info!(%kind, %origin, %attachment, "Attached overlay");
                if origin == SourceOrigin::Fallback {
                    counter!("overlay_fallback_activations_total", "kind" => kind.as_str()).increment(1);
                }
                LayerState::Active { origin, attachment }
            }
            Err(e) => {
                error!(%kind, %origin, error = %e, "Failed to attach overlay");
                LayerState::Inactive
            }
        };
        self.slot_mut(kind).state = state;
    }
}

/// Orchestrates which source each layer kind shows on one map surface.
pub struct OverlayController<S, R> {
    registry: Arc<TileSourceRegistry>,
    resolver: R,
    inner: Mutex<Inner<S>>,
}

impl<S, R> OverlayController<S, R>
where
    S: MapSurface,
    R: SourceResolver,
{
    pub fn new(registry: Arc<TileSourceRegistry>, resolver: R, surface: S) -> Self {
        let slots = LayerKind::all().iter().map(|k| (*k, LayerSlot::new())).collect();
        Self {
            registry,
            resolver,
            inner: Mutex::new(Inner {
                surface,
                slots,
                torn_down: false,
            }),
        }
    }

    pub fn registry(&self) -> &TileSourceRegistry {
        &self.registry
    }

    /// Toggle a layer on or off.
    ///
    /// Repeating the current desired state is a no-op, except that enabling
    /// a layer left inactive by a failed attach retries it. Turning a layer on
    /// resolves its primary source (or goes straight to the fallback when a
    /// required reading is missing) and attaches the result, unless the
    /// layer was toggled again in the meantime.
    #[instrument(skip(self, reading))]
    pub async fn set_enabled(
        &self,
        kind: LayerKind,
        enabled: bool,
        reading: Option<WeatherReading>,
    ) -> LayerStatus {
        let generation = {
            let mut inner = self.inner.lock().await;
            if inner.torn_down {
                warn!("Ignoring toggle on a torn-down surface");
                return inner.status(kind);
            }

            let slot = inner.slot_mut(kind);
            let settled = !enabled || slot.state != LayerState::Inactive;
            if slot.desired == enabled && settled {
                debug!(enabled, "Layer already in requested state");
                return slot.status(kind);
            }
            slot.desired = enabled;
            slot.generation += 1;
            let generation = slot.generation;

            if !enabled {
                let previous = std::mem::replace(&mut slot.state, LayerState::Inactive);
                if let LayerState::Active { attachment, .. } = previous {
                    inner.detach_logged(kind, attachment);
                    info!(%attachment, "Layer disabled");
                } else {
                    debug!(?previous, "Layer disabled before it was attached");
                }
                return inner.status(kind);
            }

            slot.state = LayerState::Loading;
            generation
        };

        let selection = match self.registry.get(kind) {
            Some(entry) => self.select_source(kind, entry, reading.as_ref()).await,
            None => {
                error!("No registry entry for layer");
                None
            }
        };

        let mut inner = self.inner.lock().await;
        let stale = inner.torn_down || {
            let slot = inner.slot_mut(kind);
            slot.generation != generation || !slot.desired
        };
        if stale {
            debug!(generation, "Discarding stale source resolution");
            return inner.status(kind);
        }

        match selection {
            Some((source, origin)) => inner.attach_into_slot(kind, &source, origin),
            None => {
                warn!("No usable source for layer");
                inner.slot_mut(kind).state = LayerState::Inactive;
            }
        }
        inner.status(kind)
    }

    /// Pick the primary source, or the fallback when the primary is unusable.
    async fn select_source(
        &self,
        kind: LayerKind,
        entry: &RegistryEntry,
        reading: Option<&WeatherReading>,
    ) -> Option<(TileSource, SourceOrigin)> {
        let primary = &entry.primary;
        let has_input = reading.is_some_and(|r| kind.has_live_input(r));

        let outcome = if primary.requires_reading() && !has_input {
            Err(OverlayError::MissingReading(kind))
        } else {
            self.resolver.resolve(primary, reading).await
        };

        match outcome {
            Ok(source) => Some((source, SourceOrigin::Primary)),
            Err(e) => {
                info!(error = %e, "Primary source unavailable, using fallback");
                fallback_source(entry).map(|s| (s, SourceOrigin::Fallback))
            }
        }
    }

    /// Handle a tile load failure on an attached overlay.
    ///
    /// A failing primary is swapped for the fallback once; failures of the
    /// fallback, or of overlays no longer attached, are ignored.
    #[instrument(skip(self))]
    pub async fn report_tile_error(&self, kind: LayerKind, attachment: AttachmentId) -> LayerStatus {
        let mut inner = self.inner.lock().await;
        if inner.torn_down {
            return inner.status(kind);
        }

        let state = inner.slot_mut(kind).state;
        match state {
            LayerState::Active {
                origin: SourceOrigin::Primary,
                attachment: current,
            } if current == attachment => {
                let Some(fallback) = self.registry.get(kind).and_then(fallback_source) else {
                    warn!("Primary tiles failing and no fallback declared");
                    return inner.status(kind);
                };
                warn!("Primary tiles failed to load, switching to fallback");
                inner.detach_logged(kind, current);
                inner.attach_into_slot(kind, &fallback, SourceOrigin::Fallback);
            }
            LayerState::Active {
                origin: SourceOrigin::Fallback,
                ..
            } => {
                debug!("Fallback tile failed, nothing further to try");
            }
            state => {
                debug!(?state, "Ignoring tile error for a detached overlay");
            }
        }
        inner.status(kind)
    }

    pub async fn handle_event(&self, event: SurfaceEvent) -> LayerStatus {
        match event {
            SurfaceEvent::TileLoadFailed {
                kind,
                attachment,
                coord,
            } => {
                if let Some(coord) = coord {
                    debug!(%kind, %coord, "Tile load failed");
                }
                self.report_tile_error(kind, attachment).await
            }
        }
    }

    /// Apply surface events until every sender is dropped.
    pub async fn run_events(&self, mut events: mpsc::Receiver<SurfaceEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        debug!("Surface event channel closed");
    }

    /// Detach everything and release the surface.
    ///
    /// Later toggles are ignored; in-flight resolutions are discarded.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        if inner.torn_down {
            return;
        }

        let attached: Vec<(LayerKind, AttachmentId)> = inner
            .slots
            .iter_mut()
            .filter_map(|(kind, slot)| {
                slot.desired = false;
                slot.generation += 1;
                match std::mem::replace(&mut slot.state, LayerState::Inactive) {
                    LayerState::Active { attachment, .. } => Some((*kind, attachment)),
                    _ => None,
                }
            })
            .collect();

        for (kind, attachment) in attached {
            inner.detach_logged(kind, attachment);
        }
        inner.surface.teardown();
        inner.torn_down = true;
        info!("Map surface torn down");
    }

    pub async fn is_torn_down(&self) -> bool {
        self.inner.lock().await.torn_down
    }

    pub async fn status(&self, kind: LayerKind) -> LayerStatus {
        self.inner.lock().await.status(kind)
    }

    pub async fn statuses(&self) -> Vec<LayerStatus> {
        let inner = self.inner.lock().await;
        LayerKind::all().iter().map(|k| inner.status(*k)).collect()
    }

    /// Run `f` against the surface under the controller lock.
    pub async fn inspect_surface<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let inner = self.inner.lock().await;
        f(&inner.surface)
    }
}

fn fallback_source(entry: &RegistryEntry) -> Option<TileSource> {
    entry.fallback.as_ref().and_then(TileSource::from_static)
}
