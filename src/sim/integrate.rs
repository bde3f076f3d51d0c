//! Semi-implicit Euler integration
//!
//! Per tick: gravity, then impulse, then damping, then position. Damping is a
//! flat per-tick multiplier, which is what the tuning values were made for.

use glam::Vec2;

use super::entity::Entity;
use crate::consts::MAX_DT;
use crate::finite_or_zero;

/// Force descriptor for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    /// Constant acceleration (units/s²)
    pub gravity: Vec2,
    /// Instantaneous velocity change applied once this step
    pub impulse: Vec2,
    /// Per-tick velocity multiplier (1.0 = no damping)
    pub damping: f32,
}

impl Default for Forces {
    fn default() -> Self {
        Self::NONE
    }
}

impl Forces {
    pub const NONE: Forces = Forces {
        gravity: Vec2::ZERO,
        impulse: Vec2::ZERO,
        damping: 1.0,
    };

    pub fn gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::NONE
        }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_impulse(mut self, impulse: Vec2) -> Self {
        self.impulse = impulse;
        self
    }
}

/// Clamp a raw step length. Non-positive or non-finite input becomes 0.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        0.0
    } else {
        dt.min(MAX_DT)
    }
}

/// Advance one entity by `dt` seconds.
///
/// Terminal entities and `dt <= 0` are no-ops. Fading entities lose
/// `decay * dt` life.
pub fn advance(entity: &mut Entity, dt: f32, forces: &Forces) {
    let dt = clamp_dt(dt);
    if dt == 0.0 || entity.flags.is_terminal() {
        return;
    }

    let mut vel = entity.vel + forces.gravity * dt;
    vel += forces.impulse;
    vel *= forces.damping;
    // Never let a bad force poison the body
    vel = finite_or_zero(vel);

    entity.vel = vel;
    entity.pos = finite_or_zero(entity.pos + vel * dt);
    entity.fade(entity.decay * dt);
}

/// Advance every active entity in a collection with the same forces
pub fn advance_all(entities: &mut [Entity], dt: f32, forces: &Forces) {
    for entity in entities.iter_mut() {
        advance(entity, dt, forces);
    }
}

/// Scalar version for angle-driven bodies (the pendulum).
///
/// Returns the new `(angle, angular_vel)`.
pub fn advance_angular(angle: f32, angular_vel: f32, angular_accel: f32, damping: f32, dt: f32) -> (f32, f32) {
    let dt = clamp_dt(dt);
    if dt == 0.0 {
        return (angle, angular_vel);
    }
    let mut w = (angular_vel + angular_accel * dt) * damping;
    if !w.is_finite() {
        w = 0.0;
    }
    let a = angle + w * dt;
    (if a.is_finite() { a } else { angle }, w)
}
