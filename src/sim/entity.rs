//! Entity model shared by every mini-game
//!
//! One record type covers particles, falling items, paint blobs, the pendulum bob
//! and physics letters. Position and velocity are crate-private: outside code
//! reads them, and only the integrator, resolver and input coupling change them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circle_rect_overlap, rect_overlap};
use super::shape::{Circle, Rect};

/// Behavior class of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Short-lived splash/splatter/explosion particle
    SplatterParticle,
    /// Paint swept off the canvas by the fan
    DustCrumb,
    /// Ingredient body: catcher drops and bombs, palette swatches
    FallingItem,
    /// Floating paint blob in the bowl
    PaintBlob,
    /// Wrecking ball at the end of the chain
    PendulumBob,
    /// Letter tile that obeys physics
    PhysicsLetter,
    /// Jumping mascot on the entry screen
    Jumper,
}

impl EntityKind {
    /// Kinds that carry a lifetime and fade out
    pub fn fades(&self) -> bool {
        matches!(self, EntityKind::SplatterParticle | EntityKind::DustCrumb)
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let h = hex.strip_prefix('#').unwrap_or(hex);
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Component-wise average, rounded half up
    pub fn blend(&self, other: &Color) -> Color {
        let avg = |a: u8, b: u8| ((a as u16 + b as u16 + 1) / 2) as u8;
        Color::rgb(avg(self.r, other.r), avg(self.g, other.g), avg(self.b, other.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// What an entity carries into a catch/grab event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    Ingredient { id: String, name: String },
    /// Bomb: catching it wipes the collection
    Hazard,
    Glyph(char),
}

impl Payload {
    pub fn ingredient(id: &str, name: &str) -> Self {
        Payload::Ingredient {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self, Payload::Hazard)
    }
}

/// Collision extent, centred on the entity position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { size: Vec2 },
}

/// Terminal markers. Once any is set the entity leaves the simulation for good.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub caught: bool,
    pub missed: bool,
    pub merged: bool,
    pub popped: bool,
}

impl Flags {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.caught || self.missed || self.merged || self.popped
    }
}

/// A simulated body
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Spawn index within its world (stable tie-breaker)
    pub id: u32,
    pub kind: EntityKind,
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub shape: Shape,
    pub color: Color,
    /// Display opacity (0-1), independent of `life`
    pub alpha: f32,
    /// Normalized remaining lifetime for fading kinds
    pub(crate) life: Option<f32>,
    /// Life lost per second
    pub decay: f32,
    pub payload: Payload,
    pub(crate) flags: Flags,
}

impl Entity {
    fn new(id: u32, kind: EntityKind, pos: Vec2, shape: Shape) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            shape,
            color: Color::default(),
            alpha: 1.0,
            life: kind.fades().then_some(1.0),
            decay: 0.0,
            payload: Payload::None,
            flags: Flags::default(),
        }
    }

    /// A circular body
    pub fn circle(id: u32, kind: EntityKind, pos: Vec2, radius: f32) -> Self {
        Self::new(id, kind, pos, Shape::Circle { radius })
    }

    /// An axis-aligned box centred on `pos`
    pub fn rect(id: u32, kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        Self::new(id, kind, pos, Shape::Rect { size })
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Give the entity a lifetime that drains at `decay` per second
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.life = Some(self.life.unwrap_or(1.0));
        self.decay = decay.max(0.0);
        self
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn vel(&self) -> Vec2 {
        self.vel
    }

    #[inline]
    pub fn life(&self) -> Option<f32> {
        self.life
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Still part of the simulation
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.flags.is_terminal() && self.life.is_none_or(|l| l > 0.0)
    }

    /// Circle radius, or half the box diagonal for rectangles
    pub fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { size } => size.length() * 0.5,
        }
    }

    pub(crate) fn set_radius(&mut self, radius: f32) {
        if let Shape::Circle { radius: r } = &mut self.shape {
            *r = radius;
        }
    }

    pub fn bounding_circle(&self) -> Circle {
        Circle::new(self.pos, self.radius())
    }

    /// Axis-aligned bounds (circle bounds for circles)
    pub fn aabb(&self) -> Rect {
        match self.shape {
            Shape::Circle { radius } => Rect::from_center_size(self.pos, Vec2::splat(radius * 2.0)),
            Shape::Rect { size } => Rect::from_center_size(self.pos, size),
        }
    }

    /// Whether any part of the body lies inside `rect`
    pub fn touches(&self, rect: &Rect) -> bool {
        match self.shape {
            Shape::Circle { .. } => circle_rect_overlap(&self.bounding_circle(), rect),
            Shape::Rect { .. } => rect_overlap(&self.aabb(), rect),
        }
    }

    /// Reduce remaining life. Life never increases.
    pub(crate) fn fade(&mut self, amount: f32) {
        if let Some(life) = &mut self.life {
            if amount > 0.0 {
                *life = (*life - amount).max(0.0);
            }
        }
    }

    /// Mark caught. Returns false if the entity was already terminal.
    pub(crate) fn mark_caught(&mut self) -> bool {
        if self.flags.is_terminal() {
            return false;
        }
        self.flags.caught = true;
        true
    }

    pub(crate) fn mark_missed(&mut self) -> bool {
        if self.flags.is_terminal() {
            return false;
        }
        self.flags.missed = true;
        true
    }

    pub(crate) fn mark_merged(&mut self) -> bool {
        if self.flags.is_terminal() {
            return false;
        }
        self.flags.merged = true;
        true
    }

    pub(crate) fn mark_popped(&mut self) -> bool {
        if self.flags.is_terminal() {
            return false;
        }
        self.flags.popped = true;
        true
    }

    /// Read-only view for the presentation layer
    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            kind: self.kind,
            x: self.pos.x,
            y: self.pos.y,
            shape: self.shape,
            color: self.color.to_hex(),
            alpha: self.alpha * self.life.unwrap_or(1.0),
            flags: self.flags,
            glyph: match self.payload {
                Payload::Glyph(c) => Some(c),
                _ => None,
            },
        }
    }
}

/// Per-frame render record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub shape: Shape,
    pub color: String,
    pub alpha: f32,
    pub flags: Flags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph: Option<char>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let c = Color::from_hex("#e74c3c").unwrap();
        assert_eq!(c, Color::rgb(0xe7, 0x4c, 0x3c));
        assert_eq!(c.to_hex(), "#e74c3c");
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_color_blend_average() {
        let a = Color::rgb(255, 0, 10);
        let b = Color::rgb(0, 0, 11);
        assert_eq!(a.blend(&b), Color::rgb(128, 0, 11));
        assert_eq!(Color::WHITE.blend(&Color::WHITE), Color::WHITE);
    }

    #[test]
    fn test_fading_kinds_get_life() {
        let p = Entity::circle(1, EntityKind::SplatterParticle, Vec2::ZERO, 2.0);
        assert_eq!(p.life(), Some(1.0));
        let blob = Entity::circle(2, EntityKind::PaintBlob, Vec2::ZERO, 16.0);
        assert_eq!(blob.life(), None);
    }

    #[test]
    fn test_touches_uses_shape() {
        let r = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(10.0));
        // Box corner reaches in, the circle inside that box does not
        let boxed = Entity::rect(1, EntityKind::FallingItem, Vec2::new(13.0, 13.0), Vec2::splat(8.0));
        let round = Entity::circle(2, EntityKind::DustCrumb, Vec2::new(13.0, 13.0), 4.0);
        assert!(boxed.touches(&r));
        assert!(!round.touches(&r));
        assert!(Entity::circle(3, EntityKind::DustCrumb, Vec2::new(12.0, 5.0), 4.0).touches(&r));
    }

    #[test]
    fn test_fade_is_monotonic() {
        let mut p = Entity::circle(1, EntityKind::DustCrumb, Vec2::ZERO, 2.0);
        p.fade(0.3);
        p.fade(-5.0);
        assert!((p.life().unwrap() - 0.7).abs() < 1e-6);
        p.fade(10.0);
        assert_eq!(p.life(), Some(0.0));
        assert!(!p.is_active());
    }

    #[test]
    fn test_terminal_marking_is_idempotent() {
        let mut item = Entity::rect(1, EntityKind::FallingItem, Vec2::ZERO, Vec2::splat(70.0));
        assert!(item.mark_caught());
        assert!(!item.mark_caught());
        assert!(!item.mark_missed());
        assert!(item.flags().caught);
        assert!(!item.flags().missed);
        assert!(!item.is_active());
    }

    #[test]
    fn test_rect_entity_bounds() {
        let item = Entity::rect(1, EntityKind::FallingItem, Vec2::new(50.0, 50.0), Vec2::new(20.0, 10.0));
        let b = item.aabb();
        assert_eq!(b.min, Vec2::new(40.0, 45.0));
        assert_eq!(b.max, Vec2::new(60.0, 55.0));
    }
}
