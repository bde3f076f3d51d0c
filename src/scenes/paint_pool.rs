//! Paint pool: blobs drifting in a round bowl
//!
//! Blobs sink under light gravity, get shoved around every few seconds,
//! bounce off the rim and each other, and fuse when they meet slowly. Clicking
//! a blob picks its color and throws a splash.

use glam::Vec2;

use super::{Interval, parse_color};
use crate::settings::Settings;
use crate::sim::collision::{nearest_within, point_in_radius};
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind};
use crate::sim::events::SimEvent;
use crate::sim::input::{InputEvent, InputState};
use crate::sim::integrate::{Forces, advance_all};
use crate::sim::phase::{Phase, PhaseMachine};
use crate::sim::resolve::{MergeRules, PairRules, resolve_in_circle};
use crate::sim::scheduler::Scene;
use crate::sim::shape::{Circle, Rect};
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::polar_to_cartesian;
use crate::tuning::PaintPoolTuning;

/// Splash particles are dropped this far outside the bowl's box
const SPLASH_MARGIN: f32 = 60.0;

/// What happened in the bowl
#[derive(Debug, Clone, PartialEq)]
pub enum PaintPoolEvent {
    /// Player picked a blob; its color is the new brush color
    ColorPicked { blob: u32, color: Color },
    Merged { survivor: u32, absorbed: u32, color: Color },
}

#[derive(Debug)]
pub struct PaintPool {
    tuning: PaintPoolTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    bowl: Circle,
    blobs: World,
    splash: World,
    shake: Interval,
    selected: Option<Color>,
    events: Vec<PaintPoolEvent>,
}

impl PaintPool {
    pub fn new(tuning: PaintPoolTuning, settings: &Settings, seed: u64) -> Self {
        let r = tuning.bowl_radius;
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::splat(r * 2.0));
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(Vec::new()),
            bowl: Circle::new(Vec2::splat(r), r),
            blobs: World::new(bounds, tuning.blob_colors.len()),
            splash: World::new(bounds, settings.max_particles()),
            shake: Interval::new(tuning.shake_interval),
            selected: None,
            events: Vec::new(),
            tuning,
        }
    }

    /// Current brush color, once a blob has been picked
    pub fn selected(&self) -> Option<Color> {
        self.selected
    }

    pub fn blobs(&self) -> &World {
        &self.blobs
    }

    pub fn take_events(&mut self) -> Vec<PaintPoolEvent> {
        std::mem::take(&mut self.events)
    }

    fn spawn_blobs(&mut self) {
        let t = &self.tuning;
        let mut spawned = Vec::with_capacity(t.blob_colors.len());
        for hex in &t.blob_colors {
            let angle = self.emitter.range(0.0, std::f32::consts::TAU);
            let dist = self.emitter.range(0.0, t.bowl_radius * 0.5);
            let pos = self.bowl.center + polar_to_cartesian(dist, angle);
            let vel = Vec2::new(self.emitter.jitter(t.blob_speed), self.emitter.jitter(t.blob_speed));
            let radius = self.emitter.range(t.blob_radius_min, t.blob_radius_max);
            let id = self.emitter.next_id();
            spawned.push(
                Entity::circle(id, EntityKind::PaintBlob, pos, radius)
                    .with_velocity(vel)
                    .with_color(parse_color(hex)),
            );
        }
        self.blobs.adopt(spawned);
    }

    fn pick(&mut self, click: Vec2) {
        let under_cursor = self
            .blobs
            .active()
            .filter(|b| point_in_radius(click, b.pos(), b.radius()))
            .map(|b| (b.id, b.pos()));
        let Some(id) = nearest_within(click, under_cursor, f32::MAX) else {
            return;
        };
        let Some((pos, color)) = self.blobs.get(id).map(|b| (b.pos(), b.color)) else {
            return;
        };
        self.selected = Some(color);
        self.events.push(PaintPoolEvent::ColorPicked { blob: id, color });
        let drops = self
            .emitter
            .burst(EntityKind::SplatterParticle, pos, color, &self.tuning.splash);
        self.splash.adopt(drops);
    }

    fn shove(&mut self) {
        let width = self.tuning.shake_impulse;
        for blob in self.blobs.entities.iter_mut() {
            blob.vel += Vec2::new(self.emitter.jitter(width), self.emitter.jitter(width));
        }
    }
}

impl Scene for PaintPool {
    fn name(&self) -> &'static str {
        "paint_pool"
    }

    fn start(&mut self) {
        self.spawn_blobs();
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.blobs.clear();
        self.splash.clear();
        self.input.clear();
        self.events.clear();
        self.shake.reset();
        self.selected = None;
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        self.phases.tick(dt);
        if !self.phases.is(Phase::Active) {
            return;
        }
        for click in self.input.take_clicks() {
            self.pick(click);
        }

        if self.shake.tick(dt) {
            self.shove();
        }

        let t = &self.tuning;
        let forces = Forces::gravity(Vec2::new(0.0, t.gravity)).with_damping(t.damping);
        advance_all(&mut self.blobs.entities, dt, &forces);
        let rules = PairRules {
            restitution: t.pair_restitution,
            merge: Some(MergeRules {
                max_relative_speed: t.merge_speed,
                min_population: t.min_blobs,
                growth: t.merge_growth,
                max_radius: t.max_radius,
            }),
        };
        resolve_in_circle(
            &mut self.blobs.entities,
            EntityKind::PaintBlob,
            &rules,
            &self.bowl,
            t.bowl_inset,
            t.wall_restitution,
            &mut self.blobs.events,
        );
        for event in self.blobs.drain_events() {
            if let SimEvent::Merged { survivor, absorbed, color } = event {
                self.events.push(PaintPoolEvent::Merged { survivor, absorbed, color });
            }
        }
        self.blobs.reap(t.bowl_radius);

        let splash_forces = Forces::gravity(Vec2::new(0.0, t.splash_gravity));
        advance_all(&mut self.splash.entities, dt, &splash_forces);
        self.splash.reap(SPLASH_MARGIN);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.blobs.views().chain(self.splash.views()).collect(),
            zones: vec![ZoneView::Circle {
                name: "bowl",
                x: self.bowl.center.x,
                y: self.bowl.center.y,
                r: self.bowl.radius,
                active: true,
            }],
            narration: None,
        }
    }
}
