//! Map surface abstraction.
//!
//! The surface is the set of overlays currently composited over the base
//! map. Only the controller mutates it.

use crate::source::TileSource;
use overlay_common::LayerKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Handle for one attached overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AttachmentId(u64);

impl AttachmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("map surface has been torn down")]
    TornDown,

    #[error("no overlay attached as {0}")]
    UnknownAttachment(AttachmentId),

    #[error("surface rejected overlay: {0}")]
    Rejected(String),
}

/// A map that overlays can be attached to and detached from.
pub trait MapSurface: Send {
    fn attach(&mut self, source: &TileSource) -> Result<AttachmentId, SurfaceError>;

    fn detach(&mut self, id: AttachmentId) -> Result<(), SurfaceError>;

    /// Release the surface; later calls fail with `TornDown`.
    fn teardown(&mut self);
}

/// One attached overlay, as reported by [`RecordingSurface::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachedOverlay {
    pub id: AttachmentId,
    pub kind: LayerKind,
    pub source: TileSource,
}

/// In-memory surface that records every attach and detach.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    attached: BTreeMap<AttachmentId, TileSource>,
    next_id: u64,
    attach_count: usize,
    detach_count: usize,
    torn_down: bool,
    reject_attach: Arc<AtomicBool>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose attaches fail with `Rejected` while `reject` is set.
    pub fn with_rejection(reject: Arc<AtomicBool>) -> Self {
        Self {
            reject_attach: reject,
            ..Self::default()
        }
    }

    pub fn attached(&self) -> impl Iterator<Item = (AttachmentId, &TileSource)> {
        self.attached.iter().map(|(id, s)| (*id, s))
    }

    pub fn attached_for(&self, kind: LayerKind) -> Vec<&TileSource> {
        self.attached.values().filter(|s| s.kind() == kind).collect()
    }

    pub fn attached_len(&self) -> usize {
        self.attached.len()
    }

    /// Total successful attaches over the surface's lifetime.
    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn snapshot(&self) -> Vec<AttachedOverlay> {
        self.attached
            .iter()
            .map(|(id, source)| AttachedOverlay {
                id: *id,
                kind: source.kind(),
                source: source.clone(),
            })
            .collect()
    }
}

impl MapSurface for RecordingSurface {
    fn attach(&mut self, source: &TileSource) -> Result<AttachmentId, SurfaceError> {
        if self.torn_down {
            return Err(SurfaceError::TornDown);
        }
        if self.reject_attach.load(Ordering::SeqCst) {
            return Err(SurfaceError::Rejected(format!("{} overlay", source.kind())));
        }

        self.next_id += 1;
        let id = AttachmentId(self.next_id);
        self.attached.insert(id, source.clone());
        self.attach_count += 1;
        Ok(id)
    }

    fn detach(&mut self, id: AttachmentId) -> Result<(), SurfaceError> {
        if self.torn_down {
            return Err(SurfaceError::TornDown);
        }
        self.attached
            .remove(&id)
            .ok_or(SurfaceError::UnknownAttachment(id))?;
        self.detach_count += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        self.attached.clear();
        self.torn_down = true;
    }
}
