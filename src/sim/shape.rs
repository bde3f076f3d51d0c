//! Plain geometry used for entity extents and for target zones
//!
//! Zones (basket, bowl, target ring, landing button) are not entities. They are
//! values of these types handed to the collision functions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A circle in play-surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// An axis-aligned rectangle stored as min/max corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Build from the top-left corner and a size (screen convention, +Y down)
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Build from a center point and a full size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grow (or shrink, for negative values) on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Same size, moved by `delta`
    pub fn translate(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_constructors_agree() {
        let a = Rect::from_origin_size(Vec2::new(10.0, 20.0), Vec2::new(30.0, 40.0));
        let b = Rect::from_center_size(Vec2::new(25.0, 40.0), Vec2::new(30.0, 40.0));
        assert_eq!(a, b);
        assert_eq!(a.width(), 30.0);
        assert_eq!(a.height(), 40.0);
        assert_eq!(a.center(), Vec2::new(25.0, 40.0));
    }

    #[test]
    fn test_rect_expand_and_clamp() {
        let r = Rect::from_origin_size(Vec2::ZERO, Vec2::new(10.0, 10.0)).expand(5.0);
        assert_eq!(r.min, Vec2::splat(-5.0));
        assert_eq!(r.max, Vec2::splat(15.0));
        assert_eq!(r.clamp_point(Vec2::new(100.0, -100.0)), Vec2::new(15.0, -5.0));
    }
}
