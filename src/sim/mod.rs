//! Deterministic simulation core
//!
//! Every mini-game is assembled from these pieces. The core is pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by spawn index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod emit;
pub mod entity;
pub mod events;
pub mod field;
pub mod input;
pub mod integrate;
pub mod phase;
pub mod resolve;
pub mod scheduler;
pub mod shape;
pub mod world;

pub use collision::{Contact, circle_contact, circle_overlap, nearest_within, point_in_radius, point_in_rect, rect_overlap};
pub use emit::{BurstParams, Emitter, SpawnSchedule, SweepParams};
pub use entity::{Color, Entity, EntityKind, EntityView, Flags, Payload, Shape};
pub use events::{CollectedSet, SimEvent};
pub use field::{Image, PaintField};
pub use input::{Falloff, InputEvent, InputState, Key, RepulsionField, SweepDelta, SweepTracker, ballistic_velocity};
pub use integrate::{Forces, advance, advance_all};
pub use phase::{Phase, PhaseChange, PhaseMachine, TimedTransition};
pub use resolve::{CatchZone, MergeRules, PairRules, resolve_in_circle, resolve_pairs};
pub use scheduler::{Scene, SceneRunner, Scheduler};
pub use shape::{Circle, Rect};
pub use world::{Snapshot, World, ZoneView};
