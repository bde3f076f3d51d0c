//! Input coupling
//!
//! Turns raw pointer/keyboard samples into forces, selections and launch
//! velocities. Event handlers only write [`InputState`]; the next tick reads it.

use std::collections::HashSet;

use glam::Vec2;

use super::collision::nearest_within;
use super::entity::Entity;
use crate::safe_normal;

/// Keys the mini-games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Backspace,
    Char(char),
}

impl Key {
    /// Map a DOM-style key identifier
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            " " | "Space" => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            "Backspace" => Some(Key::Backspace),
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
        }
    }
}

/// Raw input, in play-surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    /// Pointer left the play surface
    PointerLeave,
    Click { x: f32, y: f32 },
    KeyDown(Key),
    KeyUp(Key),
}

fn sample(x: f32, y: f32) -> Option<Vec2> {
    (x.is_finite() && y.is_finite()).then_some(Vec2::new(x, y))
}

/// Shared per-scene input: single writer (event handler), single reader (tick)
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last valid pointer position; `None` until a real sample arrives
    cursor: Option<Vec2>,
    pressed: bool,
    keys: HashSet<Key>,
    clicks: Vec<Vec2>,
    /// Pointer-down positions not yet consumed
    presses: Vec<Vec2>,
    released: bool,
    /// Key-down events not yet consumed, in order
    key_presses: Vec<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => self.cursor = sample(x, y),
            InputEvent::PointerDown { x, y } => {
                self.cursor = sample(x, y);
                self.pressed = true;
                if let Some(p) = self.cursor {
                    self.presses.push(p);
                }
            }
            InputEvent::PointerUp { x, y } => {
                if let Some(p) = sample(x, y) {
                    self.cursor = Some(p);
                }
                self.pressed = false;
                self.released = true;
            }
            InputEvent::PointerLeave => {
                self.cursor = None;
                self.pressed = false;
                self.released = true;
            }
            InputEvent::Click { x, y } => {
                if let Some(p) = sample(x, y) {
                    self.cursor = Some(p);
                    self.clicks.push(p);
                }
            }
            InputEvent::KeyDown(k) => {
                // Auto-repeat sends KeyDown again without a KeyUp
                if self.keys.insert(k) {
                    self.key_presses.push(k);
                }
            }
            InputEvent::KeyUp(k) => {
                self.keys.remove(&k);
            }
        }
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// One-shot clicks since the last call
    pub fn take_clicks(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.clicks)
    }

    /// One-shot pointer-down positions since the last call
    pub fn take_presses(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.presses)
    }

    /// One-shot key presses since the last call
    pub fn take_keys(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.key_presses)
    }

    /// True once after each pointer release
    pub fn take_release(&mut self) -> bool {
        std::mem::take(&mut self.released)
    }

    /// Forget everything (scene stop/reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// How repulsion strength falls off inside the field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Falloff {
    /// Impulse `(R - d) * gain` per tick
    Linear { gain: f32 },
    /// Acceleration `k / d²`
    InverseSquare { k: f32 },
}

/// Flee-from-cursor field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepulsionField {
    pub radius: f32,
    pub falloff: Falloff,
    /// Per-tick factor applied to a tethered body's offset outside the field
    pub ease: f32,
}

/// Distances below this are ignored (cursor sitting on the body)
const MIN_REPULSE_DISTANCE: f32 = 0.5;

impl RepulsionField {
    /// Velocity change for a body at `pos`, or `None` outside the field
    pub fn impulse(&self, pos: Vec2, cursor: Option<Vec2>, dt: f32) -> Option<Vec2> {
        let cursor = cursor?;
        let d = pos.distance(cursor);
        if d >= self.radius || d < MIN_REPULSE_DISTANCE || !d.is_finite() {
            return None;
        }
        let (away, d) = safe_normal(pos - cursor);
        let magnitude = match self.falloff {
            Falloff::Linear { gain } => (self.radius - d) * gain,
            Falloff::InverseSquare { k } => k / (d * d) * dt,
        };
        Some(away * magnitude)
    }

    /// Push a free body (letters). Returns true when the field acted.
    pub fn push(&self, entity: &mut Entity, cursor: Option<Vec2>, dt: f32) -> bool {
        if !entity.is_active() {
            return false;
        }
        match self.impulse(entity.pos, cursor, dt) {
            Some(dv) => {
                entity.vel += dv;
                true
            }
            None => false,
        }
    }

    /// Push a body tethered to `rest` (palette items).
    ///
    /// Inside the field it gains velocity away from the cursor. Outside, its
    /// velocity is dropped and the offset from `rest` shrinks by `ease`.
    pub fn flee(&self, entity: &mut Entity, rest: Vec2, cursor: Option<Vec2>, dt: f32) -> bool {
        if !entity.is_active() {
            return false;
        }
        if self.push(entity, cursor, dt) {
            return true;
        }
        entity.vel = Vec2::ZERO;
        entity.pos = rest + (entity.pos - rest) * self.ease;
        false
    }
}

/// Clamp a tethered body's offset from its rest point per axis
pub fn clamp_offset(entity: &mut Entity, rest: Vec2, max_offset: Vec2) {
    let offset = (entity.pos - rest).clamp(-max_offset, max_offset);
    entity.pos = rest + offset;
}

/// One-shot grab: nearest candidate within `radius` of the cursor
pub fn grab_nearest<I>(cursor: Option<Vec2>, candidates: I, radius: f32) -> Option<u32>
where
    I: IntoIterator<Item = (u32, Vec2)>,
{
    nearest_within(cursor?, candidates, radius)
}

/// Grab among the active entities of a collection
pub fn grab_entity(cursor: Option<Vec2>, entities: &[Entity], radius: f32) -> Option<u32> {
    grab_nearest(
        cursor,
        entities.iter().filter(|e| e.is_active()).map(|e| (e.id, e.pos)),
        radius,
    )
}

/// Direction and strength of one sweep sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepDelta {
    /// Unit direction of motion
    pub dir: Vec2,
    /// Movement length, capped
    pub magnitude: f32,
}

/// Turns consecutive pointer samples into sweep directions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepTracker {
    last: Option<Vec2>,
    /// Cap on magnitude so focus jumps don't produce huge forces
    pub max_magnitude: f32,
    /// L1 movement below this is ignored
    pub dead_zone: f32,
}

impl SweepTracker {
    pub fn new(max_magnitude: f32) -> Self {
        Self {
            last: None,
            max_magnitude,
            dead_zone: 0.5,
        }
    }

    /// Feed a pointer sample. The first sample after a release only primes the tracker.
    ///
    /// Movement inside the dead zone keeps the old anchor, so a slow drag
    /// still adds up to a sweep.
    pub fn sample(&mut self, pos: Vec2) -> Option<SweepDelta> {
        let Some(prev) = self.last else {
            self.last = Some(pos);
            return None;
        };
        let delta = pos - prev;
        if delta.x.abs() + delta.y.abs() <= self.dead_zone {
            return None;
        }
        self.last = Some(pos);
        let (dir, len) = safe_normal(delta);
        Some(SweepDelta {
            dir,
            magnitude: len.min(self.max_magnitude),
        })
    }

    /// Drop history (pointer released)
    pub fn release(&mut self) {
        self.last = None;
    }
}

/// Kick loose bodies near `center` along the sweep direction, stronger closer in
pub fn push_along(entities: &mut [Entity], center: Vec2, delta: &SweepDelta, radius: f32, force: f32) {
    for e in entities.iter_mut().filter(|e| e.is_active()) {
        let dist = e.pos.distance(center);
        if dist < radius && dist > 0.0 {
            let strength = 1.0 - dist / radius;
            e.vel += delta.dir * force * strength;
        }
    }
}

/// Initial velocity that carries a body from `origin` to `target` in `arrival_time`
/// seconds under constant `gravity`.
///
/// With `step > 0` the result is corrected for the semi-implicit integrator, so
/// stepping with that fixed `dt` hits the target exactly when `arrival_time`
/// is a whole number of steps. `step == 0` gives the continuous answer.
pub fn ballistic_velocity(origin: Vec2, target: Vec2, arrival_time: f32, gravity: Vec2, step: f32) -> Vec2 {
    let t = arrival_time.max(1.0e-3);
    let step = step.max(0.0);
    (target - origin) / t - gravity * 0.5 * (t + step)
}

/// Flight time that scales with distance, at `travel_speed` units/s
pub fn flight_time(origin: Vec2, target: Vec2, travel_speed: f32, min_time: f32) -> f32 {
    (origin.distance(target) / travel_speed.max(1.0)).max(min_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use crate::sim::integrate::{Forces, advance};

    fn body(pos: Vec2) -> Entity {
        Entity::circle(1, EntityKind::PhysicsLetter, pos, 10.0)
    }

    #[test]
    fn test_invalid_coordinates_mean_no_cursor() {
        let mut input = InputState::new();
        assert_eq!(input.cursor(), None);
        input.apply(InputEvent::PointerMove { x: 10.0, y: 20.0 });
        assert_eq!(input.cursor(), Some(Vec2::new(10.0, 20.0)));
        input.apply(InputEvent::PointerMove { x: f32::NAN, y: 20.0 });
        assert_eq!(input.cursor(), None);
    }

    #[test]
    fn test_clicks_are_one_shot() {
        let mut input = InputState::new();
        input.apply(InputEvent::Click { x: 1.0, y: 2.0 });
        input.apply(InputEvent::Click { x: f32::INFINITY, y: 2.0 });
        assert_eq!(input.take_clicks(), vec![Vec2::new(1.0, 2.0)]);
        assert!(input.take_clicks().is_empty());
    }

    #[test]
    fn test_keys_tracked() {
        let mut input = InputState::new();
        input.apply(InputEvent::KeyDown(Key::Left));
        assert!(input.key_down(Key::Left));
        input.apply(InputEvent::KeyDown(Key::Left));
        assert_eq!(input.take_keys(), vec![Key::Left]);
        input.apply(InputEvent::KeyUp(Key::Left));
        assert!(!input.key_down(Key::Left));
        assert_eq!(Key::from_name("A"), Some(Key::Char('a')));
        assert_eq!(Key::from_name("ArrowRight"), Some(Key::Right));
        assert_eq!(Key::from_name("Shift"), None);
    }

    #[test]
    fn test_linear_repulsion_points_away() {
        let field = RepulsionField {
            radius: 75.0,
            falloff: Falloff::Linear { gain: 0.8 },
            ease: 0.85,
        };
        let mut e = body(Vec2::new(110.0, 100.0));
        assert!(field.push(&mut e, Some(Vec2::new(100.0, 100.0)), 1.0 / 60.0));
        assert!(e.vel().x > 0.0);
        assert!((e.vel().x - 52.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_cursor_no_force() {
        let field = RepulsionField {
            radius: 75.0,
            falloff: Falloff::Linear { gain: 0.8 },
            ease: 0.85,
        };
        let mut e = body(Vec2::new(110.0, 100.0));
        assert!(!field.push(&mut e, None, 1.0 / 60.0));
        assert_eq!(e.vel(), Vec2::ZERO);
    }

    #[test]
    fn test_inverse_square_strength() {
        let field = RepulsionField {
            radius: 120.0,
            falloff: Falloff::InverseSquare { k: 8000.0 },
            ease: 1.0,
        };
        let dv = field.impulse(Vec2::new(0.0, 20.0), Some(Vec2::ZERO), 0.5).unwrap();
        assert!((dv.y - 10.0).abs() < 1e-4);
        assert!(field.impulse(Vec2::new(0.0, 0.2), Some(Vec2::ZERO), 0.5).is_none());
    }

    #[test]
    fn test_flee_eases_back() {
        let field = RepulsionField {
            radius: 75.0,
            falloff: Falloff::Linear { gain: 0.8 },
            ease: 0.85,
        };
        let rest = Vec2::ZERO;
        let mut e = body(Vec2::new(20.0, 0.0)).with_velocity(Vec2::new(5.0, 0.0));
        field.flee(&mut e, rest, Some(Vec2::new(500.0, 0.0)), 1.0 / 60.0);
        assert_eq!(e.vel(), Vec2::ZERO);
        assert!((e.pos().x - 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_offset() {
        let mut e = body(Vec2::new(100.0, -100.0));
        clamp_offset(&mut e, Vec2::ZERO, Vec2::new(40.0, 30.0));
        assert_eq!(e.pos(), Vec2::new(40.0, -30.0));
    }

    #[test]
    fn test_grab_requires_cursor() {
        let entities = vec![body(Vec2::new(5.0, 0.0))];
        assert_eq!(grab_entity(None, &entities, 44.0), None);
        assert_eq!(grab_entity(Some(Vec2::ZERO), &entities, 44.0), Some(1));
    }

    #[test]
    fn test_sweep_tracker() {
        let mut t = SweepTracker::new(18.0);
        assert!(t.sample(Vec2::ZERO).is_none());
        assert!(t.sample(Vec2::new(0.2, 0.2)).is_none());
        let d = t.sample(Vec2::new(100.0, 0.2)).unwrap();
        assert_eq!(d.magnitude, 18.0);
        assert!((d.dir.x - 1.0).abs() < 1e-3);
        t.release();
        assert!(t.sample(Vec2::new(300.0, 0.0)).is_none());
    }

    #[test]
    fn test_slow_drag_accumulates_into_sweep() {
        let mut t = SweepTracker::new(18.0);
        assert!(t.sample(Vec2::ZERO).is_none());
        assert!(t.sample(Vec2::new(0.2, 0.0)).is_none());
        assert!(t.sample(Vec2::new(0.4, 0.0)).is_none());
        let d = t.sample(Vec2::new(0.6, 0.0)).unwrap();
        assert!((d.magnitude - 0.6).abs() < 1e-5);
        assert!((d.dir.x - 1.0).abs() < 1e-5);
        // Anchor moved to the last reported point
        assert!(t.sample(Vec2::new(0.8, 0.0)).is_none());
    }

    #[test]
    fn test_ballistic_hits_target_under_integration() {
        let g = Vec2::new(0.0, 1200.0);
        let dt = 1.0 / 60.0;
        let origin = Vec2::new(100.0, 500.0);
        let target = Vec2::new(600.0, 200.0);
        let t = 0.75; // 45 steps
        let v = ballistic_velocity(origin, target, t, g, dt);
        let mut e = Entity::rect(1, EntityKind::Jumper, origin, Vec2::splat(100.0)).with_velocity(v);
        let forces = Forces::gravity(g);
        for _ in 0..45 {
            advance(&mut e, dt, &forces);
        }
        assert!(e.pos().distance(target) <= 2.0, "landed at {:?}", e.pos());
    }

    #[test]
    fn test_flight_time_from_distance() {
        let t = flight_time(Vec2::ZERO, Vec2::new(400.0, 0.0), 400.0, 0.1);
        assert!((t - 1.0).abs() < 1e-6);
        assert_eq!(flight_time(Vec2::ZERO, Vec2::ZERO, 400.0, 0.1), 0.1);
    }
}
