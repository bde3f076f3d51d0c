//! Data-driven game balance
//!
//! Every number a mini-game uses lives here, in per-second units at the
//! `SIM_DT` step. Damping factors are per-step multipliers. A tuning file only
//! needs the fields it overrides; everything else falls back to the defaults.

use std::f32::consts::FRAC_PI_3;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::emit::BurstParams;

/// Tuning load failures
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {}", value)))
    }
}

fn unit_factor(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be in (0, 1], got {}", value)))
    }
}

fn burst(field: &'static str, b: &BurstParams) -> Result<(), TuningError> {
    if b.count_min > b.count_max || b.speed_min > b.speed_max || b.radius_min > b.radius_max {
        return Err(invalid(field, "min above max"));
    }
    Ok(())
}

/// A named, colored ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDef {
    pub id: String,
    pub name: String,
    /// `#rrggbb`
    pub color: String,
}

impl IngredientDef {
    fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

fn cuisines() -> Vec<String> {
    ["indian", "chinese", "mexican", "italian", "french", "japanese"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Blob bowl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintPoolTuning {
    pub blob_colors: Vec<String>,
    pub bowl_radius: f32,
    pub bowl_inset: f32,
    pub gravity: f32,
    pub damping: f32,
    /// Seconds between random shoves
    pub shake_interval: f32,
    /// Full width of the random shove (units/s)
    pub shake_impulse: f32,
    /// Full width of the random starting velocity (units/s)
    pub blob_speed: f32,
    pub blob_radius_min: f32,
    pub blob_radius_max: f32,
    pub wall_restitution: f32,
    pub pair_restitution: f32,
    pub merge_speed: f32,
    pub min_blobs: usize,
    pub merge_growth: f32,
    pub max_radius: f32,
    pub splash: BurstParams,
    pub splash_gravity: f32,
}

impl Default for PaintPoolTuning {
    fn default() -> Self {
        Self {
            blob_colors: ["#e74c3c", "#f39c12", "#2ecc71", "#3498db", "#9b59b6", "#e67e22", "#1abc9c", "#f1c40f"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bowl_radius: 110.0,
            bowl_inset: 4.0,
            gravity: 144.0,
            damping: 0.985,
            shake_interval: 3.0,
            shake_impulse: 90.0,
            blob_speed: 72.0,
            blob_radius_min: 16.0,
            blob_radius_max: 24.0,
            wall_restitution: 0.6,
            pair_restitution: 0.6,
            merge_speed: 48.0,
            min_blobs: 4,
            merge_growth: 0.3,
            max_radius: 30.0,
            splash: BurstParams {
                count_min: 10,
                count_max: 17,
                speed_min: 90.0,
                speed_max: 270.0,
                radius_min: 2.0,
                radius_max: 5.0,
                alpha_min: 1.0,
                alpha_max: 1.0,
                upward_bias: 90.0,
                decay: 1.5,
            },
            splash_gravity: 432.0,
        }
    }
}

/// Chop-to-pick ingredient row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteTuning {
    pub ingredients: Vec<IngredientDef>,
    pub width: f32,
    pub height: f32,
    pub item_radius: f32,
    pub dodge_radius: f32,
    /// Flee speed per unit of depth inside the dodge radius
    pub flee_gain: f32,
    pub max_offset: Vec2,
    pub ease: f32,
    pub chops_required: u32,
    pub chop_window: f32,
    pub wrong_color_chance: f32,
    pub shuffle_interval: f32,
    pub splatter: BurstParams,
    pub splatter_gravity: f32,
}

impl Default for PaletteTuning {
    fn default() -> Self {
        Self {
            ingredients: vec![
                IngredientDef::new("tomato", "Tomato", "#e74c3c"),
                IngredientDef::new("carrot", "Carrot", "#e67e22"),
                IngredientDef::new("lemon", "Lemon", "#f1c40f"),
                IngredientDef::new("basil", "Basil", "#27ae60"),
                IngredientDef::new("blueberry", "Blueberry", "#2980b9"),
                IngredientDef::new("eggplant", "Eggplant", "#8e44ad"),
                IngredientDef::new("chocolate", "Chocolate", "#6d4c2a"),
                IngredientDef::new("garlic", "Garlic", "#ecf0f1"),
            ],
            width: 760.0,
            height: 200.0,
            item_radius: 28.0,
            dodge_radius: 75.0,
            flee_gain: 48.0,
            max_offset: Vec2::new(40.0, 30.0),
            ease: 0.85,
            chops_required: 3,
            chop_window: 0.9,
            wrong_color_chance: 0.25,
            shuffle_interval: 4.0,
            splatter: BurstParams {
                count_min: 8,
                count_max: 15,
                speed_min: 120.0,
                speed_max: 360.0,
                radius_min: 2.0,
                radius_max: 6.0,
                alpha_min: 1.0,
                alpha_max: 1.0,
                upward_bias: 120.0,
                decay: 1.2,
            },
            splatter_gravity: 540.0,
        }
    }
}

/// Drawing surface and fan eraser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasTuning {
    pub width: usize,
    pub height: usize,
    pub brush_width: f32,
    /// Stroke follows the pointer by this fraction per sample
    pub smoothing: f32,
    pub fan_radius: f32,
    pub sample_step: usize,
    pub push_force: f32,
    pub nearby_push: f32,
    pub nearby_radius: f32,
    pub max_sweep: f32,
    pub reference_speed: f32,
    pub crumb_damping: f32,
    /// Random wobble added to crumb velocity every step (full width, units/s)
    pub crumb_jitter: f32,
    pub crumb_scatter: f32,
    /// Crumbs die this far past the edge
    pub crumb_margin: f32,
    pub splatter_min: u32,
    pub splatter_max: u32,
    pub splatter_distance: Vec2,
    pub splatter_radius: Vec2,
}

impl Default for CanvasTuning {
    fn default() -> Self {
        Self {
            width: 480,
            height: 360,
            brush_width: 4.0,
            smoothing: 0.35,
            fan_radius: 32.0,
            sample_step: 2,
            push_force: 300.0,
            nearby_push: 108.0,
            nearby_radius: 64.0,
            max_sweep: 18.0,
            reference_speed: 8.0,
            crumb_damping: 0.985,
            crumb_jitter: 9.0,
            crumb_scatter: 90.0,
            crumb_margin: 10.0,
            splatter_min: 6,
            splatter_max: 11,
            splatter_distance: Vec2::new(4.0, 18.0),
            splatter_radius: Vec2::new(1.2, 3.7),
        }
    }
}

/// Wrecking-ball confirm button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumTuning {
    pub gravity: f32,
    pub chain_length: f32,
    pub damping: f32,
    pub time_limit: f32,
    pub target_radius: f32,
    pub bob_radius: f32,
    pub start_angle: f32,
    pub start_angle_spread: f32,
    /// Full width of the random starting spin (rad/s)
    pub start_spin: f32,
    /// Chance per step of a wind gust
    pub gust_chance: f32,
    pub gust_strength: f32,
    pub panic_time: f32,
    pub panic_factor: f32,
    pub frenzy_time: f32,
    pub frenzy_factor: f32,
    pub confirm_delay: f32,
    pub chain_links: usize,
}

impl Default for PendulumTuning {
    fn default() -> Self {
        Self {
            gravity: 28.0,
            chain_length: 320.0,
            damping: 0.9985,
            time_limit: 15.0,
            target_radius: 65.0,
            bob_radius: 40.0,
            start_angle: FRAC_PI_3,
            start_angle_spread: 0.4,
            start_spin: 3.0,
            gust_chance: 0.008,
            gust_strength: 4.0,
            panic_time: 8.0,
            panic_factor: 1.002,
            frenzy_time: 4.0,
            frenzy_factor: 1.003,
            confirm_delay: 0.6,
            chain_links: 14,
        }
    }
}

/// Jump-to-enter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpTuning {
    pub gravity: f32,
    /// Flight time is distance over this
    pub travel_speed: f32,
    pub jumper_size: f32,
    pub start: Vec2,
    pub button_size: Vec2,
    pub ground_offset: f32,
    pub button_lift: f32,
    pub button_margin: f32,
    /// Landings on the button that are refused no matter what
    pub rejected_landings: u32,
    pub min_landing_speed: f32,
    pub success_delay: f32,
}

impl Default for JumpTuning {
    fn default() -> Self {
        Self {
            gravity: 1200.0,
            travel_speed: 400.0,
            jumper_size: 100.0,
            start: Vec2::new(150.0, 150.0),
            button_size: Vec2::new(120.0, 60.0),
            ground_offset: 20.0,
            button_lift: 20.0,
            button_margin: 50.0,
            rejected_landings: 2,
            min_landing_speed: 600.0,
            success_delay: 1.5,
        }
    }
}

/// Falling-item catcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatcherTuning {
    pub items: Vec<IngredientDef>,
    pub total_spawns: usize,
    pub hazards: usize,
    pub spawn_interval: f32,
    pub base_speed: f32,
    pub speed_spread: f32,
    pub speed_per_index: f32,
    pub basket_speed: f32,
    pub item_size: f32,
    pub basket_size: Vec2,
    pub basket_lift: f32,
    pub catch_slack: f32,
    pub invert_cycle: f32,
    pub invert_on: f32,
    pub countdown: f32,
    pub review_delay: f32,
    pub transition_steps: Vec<f32>,
    pub transition_time: f32,
    pub explosion: BurstParams,
    pub explosion_gravity: f32,
}

impl Default for CatcherTuning {
    fn default() -> Self {
        Self {
            items: vec![
                IngredientDef::new("egg", "Egg", "#fdf6e3"),
                IngredientDef::new("flour", "Flour", "#f5f0e1"),
                IngredientDef::new("cheese", "Cheese", "#f7c948"),
                IngredientDef::new("water", "Bottle of Water", "#8ecae6"),
                IngredientDef::new("milk", "Milk", "#ffffff"),
                IngredientDef::new("tomato", "Tomato", "#e63946"),
                IngredientDef::new("mushroom", "Mushroom", "#b08968"),
                IngredientDef::new("pasta", "Pasta", "#f4d35e"),
                IngredientDef::new("carrot", "Carrot", "#f77f00"),
                IngredientDef::new("mango", "Mango", "#ffb703"),
                IngredientDef::new("lime", "Lime", "#80b918"),
                IngredientDef::new("bittergourd", "Bitter Gourd", "#2d6a4f"),
                IngredientDef::new("bottlegourd", "Bottle Gourd", "#95d5b2"),
                IngredientDef::new("garlic", "Garlic", "#ede0d4"),
                IngredientDef::new("mustard", "Mustard Sauce", "#e9c46a"),
            ],
            total_spawns: 25,
            hazards: 4,
            spawn_interval: 1.1,
            base_speed: 150.0,
            speed_spread: 90.0,
            speed_per_index: 3.6,
            basket_speed: 420.0,
            item_size: 70.0,
            basket_size: Vec2::new(130.0, 90.0),
            basket_lift: 20.0,
            catch_slack: 15.0,
            invert_cycle: 11.0,
            invert_on: 8.0,
            countdown: 3.0,
            review_delay: 0.5,
            transition_steps: vec![1.8, 3.5],
            transition_time: 5.5,
            explosion: BurstParams {
                count_min: 18,
                count_max: 26,
                speed_min: 120.0,
                speed_max: 420.0,
                radius_min: 3.0,
                radius_max: 8.0,
                alpha_min: 0.7,
                alpha_max: 1.0,
                upward_bias: 120.0,
                decay: 1.2,
            },
            explosion_gravity: 300.0,
        }
    }
}

/// Letters that fall and flee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardTuning {
    pub alphabet: String,
    pub keywords: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub tile: f32,
    pub gravity: f32,
    pub repulse_radius: f32,
    pub repulse_k: f32,
    /// Letters closer than `tile * spacing_factor` push apart
    pub spacing_factor: f32,
    pub push_stiffness: f32,
    pub damping: f32,
    pub bounce: f32,
    pub explode_min: f32,
    pub explode_max: f32,
    pub explode_lift: f32,
    pub quake_interval: f32,
    pub quake_kick: f32,
    pub start_speed: f32,
    pub max_dt: f32,
    pub confirm_delay: f32,
}

impl Default for KeyboardTuning {
    fn default() -> Self {
        Self {
            alphabet: ALPHABET.to_string(),
            keywords: cuisines(),
            width: 640.0,
            height: 320.0,
            tile: 38.0,
            gravity: 400.0,
            repulse_radius: 120.0,
            repulse_k: 8000.0,
            spacing_factor: 1.05,
            push_stiffness: 3.0,
            damping: 0.998,
            bounce: 0.7,
            explode_min: 300.0,
            explode_max: 580.0,
            explode_lift: 180.0,
            quake_interval: 8.0,
            quake_kick: 350.0,
            start_speed: 100.0,
            max_dt: 0.04,
            confirm_delay: 2.2,
        }
    }
}

/// Lanes of moving letter tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConveyorTuning {
    pub alphabet: String,
    pub keywords: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub lanes: usize,
    pub tile: f32,
    pub gap: f32,
    pub lane_margin: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub chaos_interval: f32,
    pub reverse_chance: f32,
    pub reverse_boost: f32,
    /// Speeds beyond `speed_max * speed_cap_factor` are re-rolled
    pub speed_cap_factor: f32,
    pub grab_radius: f32,
    /// Speed multiplier range applied after a grab
    pub regrab_boost: Vec2,
    pub confirm_delay: f32,
}

impl Default for ConveyorTuning {
    fn default() -> Self {
        Self {
            alphabet: ALPHABET.to_string(),
            keywords: cuisines(),
            width: 800.0,
            height: 240.0,
            lanes: 4,
            tile: 40.0,
            gap: 6.0,
            lane_margin: 8.0,
            speed_min: 40.0,
            speed_max: 140.0,
            chaos_interval: 5.0,
            reverse_chance: 0.5,
            reverse_boost: 1.3,
            speed_cap_factor: 1.8,
            grab_radius: 44.0,
            regrab_boost: Vec2::new(1.2, 1.7),
            confirm_delay: 2.2,
        }
    }
}

/// Sentence assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordDragTuning {
    pub sentence: Vec<String>,
    pub intro: f32,
    pub displace_interval: f32,
    pub success_time: f32,
    pub transition_time: f32,
    pub slot_size: Vec2,
    pub card_size: Vec2,
}

impl Default for WordDragTuning {
    fn default() -> Self {
        Self {
            sentence: ["please", "draw", "to", "place", "order"].iter().map(|s| s.to_string()).collect(),
            intro: 6.2,
            displace_interval: 5.0,
            success_time: 1.2,
            transition_time: 0.8,
            slot_size: Vec2::new(110.0, 44.0),
            card_size: Vec2::new(100.0, 40.0),
        }
    }
}

/// Balance for every mini-game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub paint_pool: PaintPoolTuning,
    pub palette: PaletteTuning,
    pub canvas: CanvasTuning,
    pub pendulum: PendulumTuning,
    pub jump: JumpTuning,
    pub catcher: CatcherTuning,
    pub keyboard: KeyboardTuning,
    pub conveyor: ConveyorTuning,
    pub word_drag: WordDragTuning,
}

impl Tuning {
    /// Parse and validate a tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::debug!("Loaded tuning overrides");
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.paint_pool;
        positive("paint_pool.bowl_radius", p.bowl_radius)?;
        positive("paint_pool.shake_interval", p.shake_interval)?;
        unit_factor("paint_pool.damping", p.damping)?;
        burst("paint_pool.splash", &p.splash)?;
        if p.blob_radius_min > p.blob_radius_max {
            return Err(invalid("paint_pool.blob_radius_min", "above blob_radius_max"));
        }

        let pa = &self.palette;
        if pa.ingredients.len() < 2 {
            return Err(invalid("palette.ingredients", "need at least two"));
        }
        positive("palette.shuffle_interval", pa.shuffle_interval)?;
        positive("palette.dodge_radius", pa.dodge_radius)?;
        unit_factor("palette.ease", pa.ease)?;
        burst("palette.splatter", &pa.splatter)?;
        if pa.chops_required == 0 {
            return Err(invalid("palette.chops_required", "must be at least 1"));
        }

        let c = &self.canvas;
        if c.width == 0 || c.height == 0 {
            return Err(invalid("canvas.width", "field must not be empty"));
        }
        positive("canvas.fan_radius", c.fan_radius)?;
        positive("canvas.reference_speed", c.reference_speed)?;
        unit_factor("canvas.crumb_damping", c.crumb_damping)?;

        let pe = &self.pendulum;
        positive("pendulum.chain_length", pe.chain_length)?;
        positive("pendulum.time_limit", pe.time_limit)?;
        unit_factor("pendulum.damping", pe.damping)?;

        let j = &self.jump;
        positive("jump.gravity", j.gravity)?;
        positive("jump.travel_speed", j.travel_speed)?;

        let ca = &self.catcher;
        if ca.hazards > ca.total_spawns {
            return Err(invalid("catcher.hazards", "more hazards than spawns"));
        }
        if ca.items.is_empty() {
            return Err(invalid("catcher.items", "empty item pool"));
        }
        positive("catcher.spawn_interval", ca.spawn_interval)?;
        positive("catcher.invert_cycle", ca.invert_cycle)?;
        burst("catcher.explosion", &ca.explosion)?;

        let k = &self.keyboard;
        if k.alphabet.is_empty() {
            return Err(invalid("keyboard.alphabet", "empty"));
        }
        positive("keyboard.quake_interval", k.quake_interval)?;
        unit_factor("keyboard.damping", k.damping)?;
        if k.explode_min > k.explode_max {
            return Err(invalid("keyboard.explode_min", "above explode_max"));
        }

        let co = &self.conveyor;
        if co.lanes == 0 || co.alphabet.is_empty() {
            return Err(invalid("conveyor.lanes", "need lanes and letters"));
        }
        positive("conveyor.chaos_interval", co.chaos_interval)?;
        if co.speed_min > co.speed_max {
            return Err(invalid("conveyor.speed_min", "above speed_max"));
        }

        let w = &self.word_drag;
        if w.sentence.is_empty() {
            return Err(invalid("word_drag.sentence", "empty"));
        }
        positive("word_drag.displace_interval", w.displace_interval)?;
        Ok(())
    }
}
