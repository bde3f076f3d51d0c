//! Collision response
//!
//! Turns overlaps into effects: bounce, merge, catch, miss or pop. Every
//! function here is total; degenerate geometry falls back to a fixed normal,
//! or one hashed from the ids for bodies stacked on the same point.

use glam::Vec2;

use super::collision::{circle_contact, reflect_velocity};
use super::entity::{Entity, EntityKind};
use super::events::SimEvent;
use super::shape::{Circle, Rect};
use crate::consts::MIN_DISTANCE;
use crate::{polar_to_cartesian, safe_normal};

/// Extra separation so resolved pairs are strictly apart after float rounding
const SEPARATION_SLOP: f32 = 1.0e-3;

/// Passes over the population before giving up on chained overlaps.
/// A crowded bowl of a dozen bodies needs about a hundred.
const MAX_RELAX_PASSES: usize = 256;

/// When two slow bodies fuse instead of bouncing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeRules {
    /// Relative speed (units/s) below which a contact merges
    pub max_relative_speed: f32,
    /// Merging only happens while the population is above this
    pub min_population: usize,
    /// Fraction of the absorbed radius added to the survivor
    pub growth: f32,
    /// Survivor radius cap
    pub max_radius: f32,
}

/// Body-body response for one kind of entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRules {
    pub restitution: f32,
    pub merge: Option<MergeRules>,
}

/// Rectangular target zone that catches falling items
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchZone {
    pub rect: Rect,
    /// How far below the zone top an item bottom may already be and still count
    pub band_slack: f32,
}

impl CatchZone {
    /// Item bottom edge inside the catch band and item center over the zone
    pub fn accepts(&self, item: &Rect) -> bool {
        let bottom = item.max.y;
        let cx = item.center().x;
        bottom >= self.rect.min.y
            && bottom <= self.rect.max.y + self.band_slack
            && cx >= self.rect.min.x
            && cx <= self.rect.max.x
    }
}

fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (lo, hi) = items.split_at_mut(j);
    (&mut lo[i], &mut hi[0])
}

/// Direction from `a` to `b` for bodies sitting on the same point.
///
/// Hashed from the id pair, so every coincident pair in a stack splits along
/// its own axis and swapping the pair flips the sign.
fn split_direction(a: u32, b: u32) -> Vec2 {
    let (lo, hi) = (a.min(b), a.max(b));
    let hash = lo.wrapping_mul(0x9E37_79B9) ^ hi.wrapping_mul(0x85EB_CA6B);
    let n = polar_to_cartesian(1.0, hash as f32 / u32::MAX as f32 * std::f32::consts::TAU);
    if a <= b { n } else { -n }
}

/// Separate two overlapping circles and reflect their approaching velocity.
///
/// Equal masses; the normal component of relative velocity comes out reversed
/// and scaled by `restitution`. Returns false when they did not overlap.
pub fn bounce_pair(a: &mut Entity, b: &mut Entity, restitution: f32) -> bool {
    if !a.is_active() || !b.is_active() {
        return false;
    }
    let contact = circle_contact(&a.bounding_circle(), &b.bounding_circle());
    if !contact.hit {
        return false;
    }
    let n = if a.pos.distance_squared(b.pos) < MIN_DISTANCE * MIN_DISTANCE {
        split_direction(a.id, b.id)
    } else {
        contact.normal
    };
    let push = (contact.penetration + SEPARATION_SLOP) * 0.5;
    a.pos -= n * push;
    b.pos += n * push;

    let approach = (a.vel - b.vel).dot(n);
    if approach > 0.0 {
        let j = approach * (1.0 + restitution) * 0.5;
        a.vel -= n * j;
        b.vel += n * j;
    }
    true
}

/// Fold `absorbed` into `survivor`: blended color, grown radius, averaged velocity.
pub fn merge_pair(survivor: &mut Entity, absorbed: &mut Entity, rules: &MergeRules) -> Option<SimEvent> {
    if !survivor.is_active() || !absorbed.is_active() {
        return None;
    }
    absorbed.mark_merged();
    survivor.color = survivor.color.blend(&absorbed.color);
    let grown = (survivor.radius() + absorbed.radius() * rules.growth).min(rules.max_radius);
    survivor.set_radius(grown);
    survivor.vel = (survivor.vel + absorbed.vel) * 0.5;
    Some(SimEvent::Merged {
        survivor: survivor.id,
        absorbed: absorbed.id,
        color: survivor.color,
    })
}

/// One sweep over every pair of active circles of `kind`. Returns whether any
/// pair was in contact.
fn relax_pass(
    entities: &mut [Entity],
    kind: EntityKind,
    rules: &PairRules,
    population: &mut usize,
    events: &mut Vec<SimEvent>,
) -> bool {
    let mut touched = false;
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let (a, b) = pair_mut(entities, i, j);
            if a.kind != kind || b.kind != kind || !a.is_active() || !b.is_active() {
                continue;
            }
            let contact = circle_contact(&a.bounding_circle(), &b.bounding_circle());
            if !contact.hit {
                continue;
            }
            touched = true;

            let rel_speed = (a.vel - b.vel).length();
            let merge = rules
                .merge
                .filter(|m| rel_speed < m.max_relative_speed && *population > m.min_population);
            match merge {
                Some(m) => {
                    if let Some(event) = merge_pair(a, b, &m) {
                        log::debug!("Merged entity {} into {}", b.id, a.id);
                        *population -= 1;
                        events.push(event);
                    }
                }
                None => {
                    bounce_pair(a, b, rules.restitution);
                }
            }
        }
    }
    touched
}

fn population_of(entities: &[Entity], kind: EntityKind) -> usize {
    entities.iter().filter(|e| e.kind == kind && e.is_active()).count()
}

/// Resolve all contacts between active circles of `kind`.
///
/// Slow contacts merge while the population allows it, the rest bounce.
/// Relaxation repeats until a pass finds no contact, so chained and stacked
/// overlaps come apart too.
pub fn resolve_pairs(entities: &mut [Entity], kind: EntityKind, rules: &PairRules, events: &mut Vec<SimEvent>) {
    let mut population = population_of(entities, kind);
    for _ in 0..MAX_RELAX_PASSES {
        if !relax_pass(entities, kind, rules, &mut population, events) {
            return;
        }
    }
    log::warn!("Pair relaxation for {:?} hit the pass limit", kind);
}

/// Resolve contacts for bodies that must also stay inside `bowl`.
///
/// Rim clamping and pair separation alternate until a pair pass finds nothing
/// to fix, so the result is both inside the bowl and free of overlaps.
pub fn resolve_in_circle(
    entities: &mut [Entity],
    kind: EntityKind,
    rules: &PairRules,
    bowl: &Circle,
    inset: f32,
    wall_restitution: f32,
    events: &mut Vec<SimEvent>,
) {
    let mut population = population_of(entities, kind);
    let contain_all = |entities: &mut [Entity]| {
        for e in entities.iter_mut().filter(|e| e.kind == kind) {
            contain_in_circle(e, bowl, inset, wall_restitution);
        }
    };
    contain_all(entities);
    for _ in 0..MAX_RELAX_PASSES {
        if !relax_pass(entities, kind, rules, &mut population, events) {
            return;
        }
        contain_all(entities);
    }
    log::warn!("Bowl relaxation for {:?} hit the pass limit", kind);
}

/// Keep a circle inside a circular container (the bowl).
///
/// `inset` keeps a gap from the rim. Outward velocity is reflected with
/// `restitution`. Returns true on wall contact.
pub fn contain_in_circle(entity: &mut Entity, bowl: &Circle, inset: f32, restitution: f32) -> bool {
    if !entity.is_active() {
        return false;
    }
    let max_dist = (bowl.radius - entity.radius() - inset).max(0.0);
    let offset = entity.pos - bowl.center;
    if offset.length() <= max_dist {
        return false;
    }
    let (n, _) = safe_normal(offset);
    entity.pos = bowl.center + n * max_dist;
    let outward = entity.vel.dot(n);
    if outward > 0.0 {
        // Mirror, then give back the part restitution does not keep
        entity.vel = reflect_velocity(entity.vel, n) + n * outward * (1.0 - restitution);
    }
    true
}

/// Keep an entity's bounds inside a rectangle, bouncing off the walls.
pub fn bounce_in_rect(entity: &mut Entity, bounds: &Rect, restitution: f32) -> bool {
    if !entity.is_active() {
        return false;
    }
    let aabb = entity.aabb();
    let mut hit = false;
    if aabb.min.x < bounds.min.x {
        entity.pos.x += bounds.min.x - aabb.min.x;
        entity.vel.x = entity.vel.x.abs() * restitution;
        hit = true;
    } else if aabb.max.x > bounds.max.x {
        entity.pos.x -= aabb.max.x - bounds.max.x;
        entity.vel.x = -entity.vel.x.abs() * restitution;
        hit = true;
    }
    if aabb.min.y < bounds.min.y {
        entity.pos.y += bounds.min.y - aabb.min.y;
        entity.vel.y = entity.vel.y.abs() * restitution;
        hit = true;
    } else if aabb.max.y > bounds.max.y {
        entity.pos.y -= aabb.max.y - bounds.max.y;
        entity.vel.y = -entity.vel.y.abs() * restitution;
        hit = true;
    }
    hit
}

/// Catch an active entity if the zone accepts it
pub fn resolve_catch(entity: &mut Entity, zone: &CatchZone) -> Option<SimEvent> {
    if !entity.is_active() || !zone.accepts(&entity.aabb()) {
        return None;
    }
    entity.mark_caught();
    Some(SimEvent::Caught {
        id: entity.id,
        payload: entity.payload.clone(),
    })
}

/// Mark an active entity missed once it is fully outside `bounds` grown by `margin`
pub fn resolve_miss(entity: &mut Entity, bounds: &Rect, margin: f32) -> Option<SimEvent> {
    if !entity.is_active() || entity.touches(&bounds.expand(margin)) {
        return None;
    }
    entity.mark_missed();
    Some(SimEvent::Missed { id: entity.id })
}

/// Destroy an entity in place
pub fn pop(entity: &mut Entity) -> Option<SimEvent> {
    entity.mark_popped().then(|| SimEvent::Popped {
        id: entity.id,
        pos: entity.pos,
        color: entity.color,
    })
}

/// Push apart near-overlapping bodies with a velocity kick instead of a hard
/// correction (soft tiles that should jostle rather than stack).
pub fn soft_separate(entities: &mut [Entity], kind: EntityKind, spacing: f32, stiffness: f32) {
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let (a, b) = pair_mut(entities, i, j);
            if a.kind != kind || b.kind != kind || !a.is_active() || !b.is_active() {
                continue;
            }
            let delta = a.pos - b.pos;
            let dist = delta.length();
            if dist < spacing && dist > 0.1 {
                let n = delta / dist;
                let push = (spacing - dist) * stiffness;
                a.vel += n * push;
                b.vel -= n * push;
            }
        }
    }
}

/// Replace velocity outright (landing, resets)
pub(crate) fn set_velocity(entity: &mut Entity, vel: Vec2) {
    entity.vel = vel;
}

/// Move without integrating (kinematic bodies such as the pendulum bob)
pub(crate) fn place(entity: &mut Entity, pos: Vec2) {
    entity.pos = pos;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::circle_overlap;
    use crate::sim::entity::{Color, Payload};

    fn blob(id: u32, x: f32, vx: f32, color: Color) -> Entity {
        Entity::circle(id, EntityKind::PaintBlob, Vec2::new(x, 0.0), 10.0)
            .with_velocity(Vec2::new(vx, 0.0))
            .with_color(color)
    }

    const BLOB_RULES: PairRules = PairRules {
        restitution: 0.8,
        merge: Some(MergeRules {
            max_relative_speed: 48.0,
            min_population: 4,
            growth: 0.3,
            max_radius: 30.0,
        }),
    };

    #[test]
    fn test_bounce_separates_and_reflects() {
        let mut a = blob(1, 0.0, 100.0, Color::WHITE);
        let mut b = blob(2, 15.0, -100.0, Color::WHITE);
        assert!(bounce_pair(&mut a, &mut b, 0.8));
        assert!(!circle_overlap(&a.bounding_circle(), &b.bounding_circle()));
        // Relative normal velocity reversed and scaled: 200 -> -160
        assert!(((a.vel() - b.vel()).x + 160.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_coincident_centers() {
        let mut a = blob(1, 5.0, 0.0, Color::WHITE);
        let mut b = blob(2, 5.0, 0.0, Color::WHITE);
        assert!(bounce_pair(&mut a, &mut b, 0.8));
        assert!(a.pos().is_finite() && b.pos().is_finite());
        assert!(!circle_overlap(&a.bounding_circle(), &b.bounding_circle()));
    }

    fn overlapping_pairs(entities: &[Entity]) -> usize {
        let active: Vec<_> = entities.iter().filter(|e| e.is_active()).collect();
        let mut count = 0;
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                if circle_overlap(&a.bounding_circle(), &b.bounding_circle()) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_coincident_stack_fully_separates() {
        let mut v: Vec<_> = (1..=10)
            .map(|id| Entity::circle(id, EntityKind::PaintBlob, Vec2::new(100.0, 100.0), 10.0))
            .collect();
        let rules = PairRules { restitution: 0.8, merge: None };
        let mut events = Vec::new();
        resolve_pairs(&mut v, EntityKind::PaintBlob, &rules, &mut events);
        assert_eq!(overlapping_pairs(&v), 0);
        assert!(v.iter().all(|e| e.pos().is_finite()));
        assert!(events.is_empty());
    }

    #[test]
    fn test_split_direction_per_pair() {
        let d12 = split_direction(1, 2);
        assert!((d12.length() - 1.0).abs() < 1e-5);
        assert_eq!(split_direction(2, 1), -d12);
        assert!(d12.distance(split_direction(1, 3)) > 1e-3);
        assert!(d12.distance(split_direction(2, 3)) > 1e-3);
    }

    #[test]
    fn test_bowl_resolution_contains_and_separates() {
        let bowl = Circle::new(Vec2::new(110.0, 110.0), 110.0);
        let mut v: Vec<_> = (1..=10)
            .map(|id| Entity::circle(id, EntityKind::PaintBlob, bowl.center, 18.0))
            .collect();
        // One straggler outside the rim
        v.push(Entity::circle(11, EntityKind::PaintBlob, Vec2::new(300.0, 110.0), 18.0));
        let rules = PairRules { restitution: 0.6, merge: None };
        let mut events = Vec::new();
        resolve_in_circle(&mut v, EntityKind::PaintBlob, &rules, &bowl, 4.0, 0.6, &mut events);

        assert_eq!(overlapping_pairs(&v), 0);
        for e in &v {
            assert!(e.pos().distance(bowl.center) <= bowl.radius - e.radius() - 4.0 + 1e-3);
        }
    }

    #[test]
    fn test_fast_contact_bounces() {
        let mut v = vec![
            blob(1, 0.0, 100.0, Color::WHITE),
            blob(2, 15.0, -100.0, Color::BLACK),
            blob(3, 200.0, 0.0, Color::WHITE),
            blob(4, 400.0, 0.0, Color::WHITE),
            blob(5, 600.0, 0.0, Color::WHITE),
        ];
        let mut events = Vec::new();
        resolve_pairs(&mut v, EntityKind::PaintBlob, &BLOB_RULES, &mut events);
        assert!(events.is_empty());
        assert!(v.iter().all(|e| e.is_active()));
    }

    #[test]
    fn test_slow_contact_merges() {
        let mut v = vec![
            blob(1, 0.0, 10.0, Color::rgb(255, 0, 0)),
            blob(2, 15.0, 0.0, Color::rgb(0, 0, 255)),
            blob(3, 200.0, 0.0, Color::WHITE),
            blob(4, 400.0, 0.0, Color::WHITE),
            blob(5, 600.0, 0.0, Color::WHITE),
        ];
        let mut events = Vec::new();
        resolve_pairs(&mut v, EntityKind::PaintBlob, &BLOB_RULES, &mut events);
        assert_eq!(events.len(), 1);
        assert!(v[1].flags().merged);
        assert_eq!(v[0].color, Color::rgb(128, 0, 128));
        assert!((v[0].radius() - 13.0).abs() < 1e-5);
        assert!((v[0].vel().x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_merge_blocked_at_population_floor() {
        let mut v = vec![
            blob(1, 0.0, 0.0, Color::WHITE),
            blob(2, 15.0, 0.0, Color::BLACK),
            blob(3, 200.0, 0.0, Color::WHITE),
            blob(4, 400.0, 0.0, Color::WHITE),
        ];
        let mut events = Vec::new();
        resolve_pairs(&mut v, EntityKind::PaintBlob, &BLOB_RULES, &mut events);
        assert!(events.is_empty());
        assert!(!circle_overlap(&v[0].bounding_circle(), &v[1].bounding_circle()));
    }

    #[test]
    fn test_merge_radius_capped() {
        let rules = MergeRules {
            max_relative_speed: 48.0,
            min_population: 0,
            growth: 0.3,
            max_radius: 30.0,
        };
        let mut a = Entity::circle(1, EntityKind::PaintBlob, Vec2::ZERO, 29.0);
        let mut b = Entity::circle(2, EntityKind::PaintBlob, Vec2::ZERO, 20.0);
        merge_pair(&mut a, &mut b, &rules);
        assert_eq!(a.radius(), 30.0);
        assert!(merge_pair(&mut a, &mut b, &rules).is_none());
    }

    #[test]
    fn test_contain_in_bowl() {
        let bowl = Circle::new(Vec2::new(110.0, 110.0), 110.0);
        let mut b = Entity::circle(1, EntityKind::PaintBlob, Vec2::new(215.0, 110.0), 16.0)
            .with_velocity(Vec2::new(60.0, 0.0));
        assert!(contain_in_circle(&mut b, &bowl, 4.0, 0.6));
        assert!((b.pos().x - (110.0 + 90.0)).abs() < 1e-4);
        assert!((b.vel().x + 36.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounce_in_rect_walls() {
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::new(100.0, 100.0));
        let mut letter = Entity::rect(1, EntityKind::PhysicsLetter, Vec2::new(95.0, 50.0), Vec2::splat(38.0))
            .with_velocity(Vec2::new(50.0, 0.0));
        assert!(bounce_in_rect(&mut letter, &bounds, 0.7));
        assert!((letter.aabb().max.x - 100.0).abs() < 1e-4);
        assert!((letter.vel().x + 35.0).abs() < 1e-4);
    }

    #[test]
    fn test_catch_band() {
        let zone = CatchZone {
            rect: Rect::from_origin_size(Vec2::new(100.0, 500.0), Vec2::new(130.0, 90.0)),
            band_slack: 15.0,
        };
        let mut item = Entity::rect(1, EntityKind::FallingItem, Vec2::new(160.0, 470.0), Vec2::splat(70.0))
            .with_payload(Payload::ingredient("egg", "Egg"));
        // Bottom at 505, center x 160: inside
        let event = resolve_catch(&mut item, &zone);
        assert!(matches!(event, Some(SimEvent::Caught { id: 1, .. })));
        assert!(resolve_catch(&mut item, &zone).is_none());

        // Center off to the side
        let mut wide = Entity::rect(2, EntityKind::FallingItem, Vec2::new(240.0, 470.0), Vec2::splat(70.0));
        assert!(resolve_catch(&mut wide, &zone).is_none());
    }

    #[test]
    fn test_miss_outside_margin() {
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::new(800.0, 600.0));
        let mut item = Entity::rect(1, EntityKind::FallingItem, Vec2::new(100.0, 700.0), Vec2::splat(70.0));
        assert!(resolve_miss(&mut item, &bounds, 70.0).is_none());
        let mut gone = Entity::rect(2, EntityKind::FallingItem, Vec2::new(100.0, 720.0), Vec2::splat(70.0));
        assert!(matches!(resolve_miss(&mut gone, &bounds, 70.0), Some(SimEvent::Missed { id: 2 })));
        assert!(gone.flags().missed);
    }

    #[test]
    fn test_pop_once() {
        let mut item = Entity::rect(1, EntityKind::FallingItem, Vec2::new(1.0, 2.0), Vec2::splat(70.0));
        assert!(matches!(pop(&mut item), Some(SimEvent::Popped { id: 1, .. })));
        assert!(pop(&mut item).is_none());
    }

    #[test]
    fn test_soft_separate_pushes_apart() {
        let mut v = vec![
            Entity::rect(1, EntityKind::PhysicsLetter, Vec2::new(0.0, 0.0), Vec2::splat(38.0)),
            Entity::rect(2, EntityKind::PhysicsLetter, Vec2::new(10.0, 0.0), Vec2::splat(38.0)),
        ];
        soft_separate(&mut v, EntityKind::PhysicsLetter, 39.9, 3.0);
        assert!(v[0].vel().x < 0.0);
        assert!(v[1].vel().x > 0.0);
    }
}
