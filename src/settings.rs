//! Player-facing settings: quality and accessibility
//!
//! Scenes read these once at construction; changing them takes effect on the
//! next start or reset.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Live particle cap per scene (splashes, splatter, crumbs, explosions)
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 600,
            QualityPreset::High => 2500,
        }
    }

    /// Sweep sampling step on the canvas; coarser means fewer crumbs
    pub fn sweep_step(&self) -> usize {
        match self {
            QualityPreset::Low => 4,
            QualityPreset::Medium | QualityPreset::High => 2,
        }
    }
}

/// Settings shared by every scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Particle budget preset
    pub quality: QualityPreset,
    /// Particle effects (splashes, splatter, explosions)
    pub particles: bool,

    // === Accessibility ===
    /// Reduced motion (no earthquakes, no wind gusts)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Whether periodic shocks (keyboard quake, pendulum gusts) run
    pub fn shocks_enabled(&self) -> bool {
        !self.reduced_motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_cap() {
        let mut s = Settings::from_preset(QualityPreset::Low);
        assert_eq!(s.max_particles(), 150);
        s.particles = false;
        assert_eq!(s.max_particles(), 0);
        s.apply_preset(QualityPreset::High);
        assert_eq!(s.quality, QualityPreset::High);
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_reduced_motion_disables_shocks() {
        let s: Settings = serde_json::from_str(r#"{"reduced_motion": true}"#).unwrap();
        assert!(!s.shocks_enabled());
        assert_eq!(s.quality, QualityPreset::Medium);
    }
}
