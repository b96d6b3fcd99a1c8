//! Deferred image loading.
//!
//! Renderers ask a [`ViewportObserver`] whether a freshly painted card should
//! load its image right away. Surfaces without visibility information use
//! [`ImmediateObserver`]; [`ProximityObserver`] defers cards until the visible
//! range comes within a margin of them.

use std::collections::BTreeMap;

use album_types::PhotoId;

/// Half-open range of card slots currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub start: usize,
    pub end: usize,
}

impl Viewport {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Whether `slot` lies within the range widened by `margin` on both sides.
    pub fn near(&self, slot: usize, margin: usize) -> bool {
        slot + margin >= self.start && slot < self.end.saturating_add(margin)
    }

    /// Whether the bottom of the range is within `margin` slots of the last
    /// rendered card.
    pub fn near_end(&self, rendered: usize, margin: usize) -> bool {
        self.end.saturating_add(margin) >= rendered
    }
}

pub trait ViewportObserver: Send {
    /// Start watching a card. Returns `true` when the image should load now.
    fn register(&mut self, id: PhotoId, slot: usize) -> bool;

    fn unregister(&mut self, id: PhotoId);

    /// Stop watching everything.
    fn disconnect(&mut self);

    /// Report a new viewport; returns the cards that just became due.
    fn poll(&mut self, viewport: Viewport) -> Vec<PhotoId>;

    /// Number of cards still waiting.
    fn pending(&self) -> usize;
}

/// No visibility capability: every image loads as soon as it is painted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateObserver;

impl ViewportObserver for ImmediateObserver {
    fn register(&mut self, _id: PhotoId, _slot: usize) -> bool {
        true
    }

    fn unregister(&mut self, _id: PhotoId) {}

    fn disconnect(&mut self) {}

    fn poll(&mut self, _viewport: Viewport) -> Vec<PhotoId> {
        Vec::new()
    }

    fn pending(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
pub struct ProximityObserver {
    viewport: Viewport,
    margin: usize,
    watched: BTreeMap<PhotoId, usize>,
}

impl ProximityObserver {
    pub fn new(viewport: Viewport, margin: usize) -> Self {
        Self {
            viewport,
            margin,
            watched: BTreeMap::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl ViewportObserver for ProximityObserver {
    fn register(&mut self, id: PhotoId, slot: usize) -> bool {
        if self.viewport.near(slot, self.margin) {
            self.watched.remove(&id);
            return true;
        }
        self.watched.insert(id, slot);
        false
    }

    fn unregister(&mut self, id: PhotoId) {
        self.watched.remove(&id);
    }

    fn disconnect(&mut self) {
        self.watched.clear();
    }

    fn poll(&mut self, viewport: Viewport) -> Vec<PhotoId> {
        self.viewport = viewport;
        let due: Vec<PhotoId> = self
            .watched
            .iter()
            .filter(|(_, slot)| viewport.near(**slot, self.margin))
            .map(|(id, _)| *id)
            .collect();
        for id in &due {
            self.watched.remove(id);
        }
        due
    }

    fn pending(&self) -> usize {
        self.watched.len()
    }
}
