//! Design Disaster - physics core for a set of kitchen mini-games
//!
//! Core modules:
//! - `sim`: Simulation core (entities, integration, collisions, emitters, input, phases)
//! - `scenes`: The mini-games, each built only from `sim`
//! - `narration`: Classification service collaborator and fallback text
//! - `tuning`: Data-driven game balance
//! - `settings`: Quality presets and accessibility toggles

pub mod narration;
pub mod scenes;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (tuning values assume 60 Hz frames)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest frame time the scheduler will accumulate in one frame
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Largest step the integrator accepts (frame hitches are clamped to this)
    pub const MAX_DT: f32 = 0.05;

    /// Distance substituted for zero when normalizing contact directions
    pub const MIN_DISTANCE: f32 = 1.0e-4;

    /// Logical play surface, independent of display scaling
    pub const PLAY_WIDTH: f32 = 1000.0;
    pub const PLAY_HEIGHT: f32 = 700.0;
}

/// Direction and length of `delta`, with a fixed +X direction for degenerate input.
///
/// The returned length is never below [`consts::MIN_DISTANCE`], so callers may divide by it.
#[inline]
pub fn safe_normal(delta: Vec2) -> (Vec2, f32) {
    let dist = delta.length();
    if !dist.is_finite() || dist < consts::MIN_DISTANCE {
        (Vec2::X, consts::MIN_DISTANCE)
    } else {
        (delta / dist, dist)
    }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Replace non-finite components with zero
#[inline]
pub fn finite_or_zero(v: Vec2) -> Vec2 {
    Vec2::new(
        if v.x.is_finite() { v.x } else { 0.0 },
        if v.y.is_finite() { v.y } else { 0.0 },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_normal_regular() {
        let (n, d) = safe_normal(Vec2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
        assert!((n - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_safe_normal_degenerate() {
        let (n, d) = safe_normal(Vec2::ZERO);
        assert_eq!(n, Vec2::X);
        assert!(d > 0.0);

        let (n, _) = safe_normal(Vec2::new(f32::NAN, 1.0));
        assert_eq!(n, Vec2::X);
    }

    #[test]
    fn test_finite_or_zero() {
        let v = finite_or_zero(Vec2::new(f32::INFINITY, 2.0));
        assert_eq!(v, Vec2::new(0.0, 2.0));
    }
}
