//! Per-scene arena: one entity collection with its spawn cap and event buffer
//!
//! Each scene owns its worlds outright and passes them into the integrator,
//! resolver and emitter explicitly. Removal is mark-then-compact: terminal
//! entities are flagged during the tick and dropped in one `reap` afterwards.

use serde::Serialize;

use super::entity::{Entity, EntityView};
use super::events::SimEvent;
use super::shape::Rect;

/// Entity collection with a spawn cap
#[derive(Debug, Clone)]
pub struct World {
    pub entities: Vec<Entity>,
    /// Playable area; reaping removes entities beyond it plus a margin
    pub bounds: Rect,
    /// Events produced this tick
    pub events: Vec<SimEvent>,
    max_entities: usize,
}

impl World {
    pub fn new(bounds: Rect, max_entities: usize) -> Self {
        Self {
            entities: Vec::new(),
            bounds,
            events: Vec::new(),
            max_entities,
        }
    }

    /// Adopt freshly spawned entities, dropping any beyond the cap.
    ///
    /// Returns how many were kept.
    pub fn adopt(&mut self, spawned: Vec<Entity>) -> usize {
        let room = self.max_entities.saturating_sub(self.entities.len());
        let kept = spawned.len().min(room);
        if kept < spawned.len() {
            log::debug!("Entity cap {} reached, dropping {}", self.max_entities, spawned.len() - kept);
        }
        self.entities.extend(spawned.into_iter().take(kept));
        kept
    }

    pub fn active(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Compact: drop terminal, faded, and out-of-bounds entities.
    ///
    /// An entity is out of bounds once no part of it touches the bounds grown
    /// by `margin`, the same test `resolve_miss` uses, so a miss is always
    /// flagged before the body disappears. Called once per tick after
    /// integration and collision. Returns the number removed.
    pub fn reap(&mut self, margin: f32) -> usize {
        let outer = self.bounds.expand(margin);
        let before = self.entities.len();
        self.entities.retain(|e| e.is_active() && e.touches(&outer));
        before - self.entities.len()
    }

    /// Take this tick's events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Discard everything (scene stop/reset)
    pub fn clear(&mut self) {
        self.entities.clear();
        self.events.clear();
    }

    pub fn views(&self) -> impl Iterator<Item = EntityView> + '_ {
        self.active().map(Entity::view)
    }
}

/// Zones drawn by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ZoneView {
    Rect { name: &'static str, x: f32, y: f32, w: f32, h: f32, active: bool },
    Circle { name: &'static str, x: f32, y: f32, r: f32, active: bool },
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub scene: &'static str,
    pub phase: super::phase::Phase,
    pub entities: Vec<EntityView>,
    pub zones: Vec<ZoneView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl Snapshot {
    pub fn to_json(&self) -> String {
        // Snapshot only holds plain data, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
