//! Collision detection
//!
//! Pure predicates and contact queries. Nothing here mutates state; the
//! resolver turns the results into effects.

use glam::Vec2;

use super::shape::{Circle, Rect};
use crate::safe_normal;

/// Result of a contact query between two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec2,
    /// Overlap depth along the normal (for position correction)
    pub penetration: f32,
}

impl Contact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// `distance(a, b) < ra + rb`
#[inline]
pub fn circle_overlap(a: &Circle, b: &Circle) -> bool {
    a.center.distance_squared(b.center) < (a.radius + b.radius) * (a.radius + b.radius)
}

/// Separating-axis test for axis-aligned rectangles. Touching edges do not overlap.
#[inline]
pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Inclusive radius test
#[inline]
pub fn point_in_radius(p: Vec2, center: Vec2, r: f32) -> bool {
    p.distance_squared(center) <= r * r
}

/// Inclusive containment test
#[inline]
pub fn point_in_rect(p: Vec2, rect: &Rect) -> bool {
    p.x >= rect.min.x && p.x <= rect.max.x && p.y >= rect.min.y && p.y <= rect.max.y
}

/// Closest-point test between a circle and a rectangle
pub fn circle_rect_overlap(c: &Circle, rect: &Rect) -> bool {
    let closest = rect.clamp_point(c.center);
    c.center.distance_squared(closest) < c.radius * c.radius
}

/// Contact between two circles.
///
/// Coincident centers get the fallback +X normal instead of a division by zero.
pub fn circle_contact(a: &Circle, b: &Circle) -> Contact {
    if !circle_overlap(a, b) {
        return Contact::miss();
    }
    let (normal, dist) = safe_normal(b.center - a.center);
    Contact {
        hit: true,
        normal,
        penetration: (a.radius + b.radius - dist).max(0.0),
    }
}

/// Pick the candidate closest to `point`, at most `max_distance` away.
///
/// Candidates are `(spawn id, center)`. Equal distances go to the lowest id, so
/// the answer does not depend on iteration order.
pub fn nearest_within<I>(point: Vec2, candidates: I, max_distance: f32) -> Option<u32>
where
    I: IntoIterator<Item = (u32, Vec2)>,
{
    let max_sq = max_distance * max_distance;
    let mut best: Option<(f32, u32)> = None;
    for (id, center) in candidates {
        let d = point.distance_squared(center);
        if !d.is_finite() || d > max_sq {
            continue;
        }
        best = match best {
            Some((bd, bid)) if bd < d || (bd == d && bid < id) => Some((bd, bid)),
            _ => Some((d, id)),
        };
    }
    best.map(|(_, id)| id)
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_overlap_strict() {
        let a = Circle::new(Vec2::ZERO, 5.0);
        assert!(circle_overlap(&a, &Circle::new(Vec2::new(9.9, 0.0), 5.0)));
        // Touching is not overlapping
        assert!(!circle_overlap(&a, &Circle::new(Vec2::new(10.0, 0.0), 5.0)));
    }

    #[test]
    fn test_rect_overlap_four_sides() {
        let a = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(10.0));
        let inside = Rect::from_origin_size(Vec2::splat(5.0), Vec2::splat(10.0));
        assert!(rect_overlap(&a, &inside));
        for offset in [Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0), Vec2::new(0.0, 10.0), Vec2::new(0.0, -10.0)] {
            assert!(!rect_overlap(&a, &a.translate(offset)), "edge contact at {offset:?}");
        }
    }

    #[test]
    fn test_point_tests_inclusive() {
        assert!(point_in_radius(Vec2::new(3.0, 4.0), Vec2::ZERO, 5.0));
        assert!(!point_in_radius(Vec2::new(3.0, 4.1), Vec2::ZERO, 5.0));
        let r = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(10.0));
        assert!(point_in_rect(Vec2::new(10.0, 0.0), &r));
        assert!(!point_in_rect(Vec2::new(10.1, 0.0), &r));
    }

    #[test]
    fn test_circle_rect_overlap_corner() {
        let r = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(10.0));
        // Near the corner diagonally: distance sqrt(2)*2 ≈ 2.83
        assert!(circle_rect_overlap(&Circle::new(Vec2::new(12.0, 12.0), 3.0), &r));
        assert!(!circle_rect_overlap(&Circle::new(Vec2::new(12.0, 12.0), 2.5), &r));
    }

    #[test]
    fn test_contact_normal_and_depth() {
        let c = circle_contact(&Circle::new(Vec2::ZERO, 5.0), &Circle::new(Vec2::new(8.0, 0.0), 5.0));
        assert!(c.hit);
        assert_eq!(c.normal, Vec2::X);
        assert!((c.penetration - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_contact_coincident_centers() {
        let c = circle_contact(&Circle::new(Vec2::ONE, 5.0), &Circle::new(Vec2::ONE, 5.0));
        assert!(c.hit);
        assert!(c.normal.is_finite());
        assert!((c.normal.length() - 1.0).abs() < 1e-6);
        assert!(c.penetration.is_finite());
    }

    #[test]
    fn test_nearest_within_tie_break() {
        let candidates = vec![(7, Vec2::new(10.0, 0.0)), (3, Vec2::new(-10.0, 0.0)), (9, Vec2::new(0.0, 30.0))];
        assert_eq!(nearest_within(Vec2::ZERO, candidates.clone(), 50.0), Some(3));
        let reversed: Vec<_> = candidates.into_iter().rev().collect();
        assert_eq!(nearest_within(Vec2::ZERO, reversed, 50.0), Some(3));
    }

    #[test]
    fn test_nearest_within_radius_limit() {
        let candidates = vec![(1, Vec2::new(45.0, 0.0)), (2, Vec2::new(20.0, 0.0))];
        assert_eq!(nearest_within(Vec2::ZERO, candidates.clone(), 44.0), Some(2));
        assert_eq!(nearest_within(Vec2::ZERO, candidates, 10.0), None);
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }
}
