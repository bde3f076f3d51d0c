//! Falling-item catcher
//!
//! Ingredients and bombs drop from the top and the player steers a basket
//! with the arrow keys, which are inverted most of the time. A caught bomb
//! blows up everything collected so far. Once the last item is caught or
//! missed the collection gets reviewed, and Enter (or a click) moves on.

use glam::Vec2;

use super::parse_color;
use crate::consts::{PLAY_HEIGHT, PLAY_WIDTH};
use crate::narration::{NarrationSlot, order_review};
use crate::settings::Settings;
use crate::sim::emit::{Emitter, SpawnSchedule};
use crate::sim::entity::{Color, Entity, EntityKind, Payload};
use crate::sim::events::{CollectedSet, SimEvent};
use crate::sim::input::{InputEvent, InputState, Key};
use crate::sim::integrate::{Forces, advance_all};
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::resolve::{CatchZone, pop, resolve_catch, resolve_miss};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::tuning::CatcherTuning;

const BOMB_COLOR: Color = Color::rgb(0x22, 0x22, 0x22);
const FIRE_COLOR: Color = Color::rgb(0xff, 0x6b, 0x1a);

#[derive(Debug, Clone, PartialEq)]
pub enum CatcherEvent {
    Caught { name: String },
    /// A bomb landed in the basket and took `lost` items with it
    Boom { lost: usize },
    Missed,
    ControlsInverted(bool),
}

#[derive(Debug)]
pub struct Catcher {
    tuning: CatcherTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    pool: Vec<Payload>,
    colors: Vec<(String, Color)>,
    schedule: SpawnSchedule<Payload>,
    items: World,
    explosions: World,
    collected: CollectedSet,
    basket_x: f32,
    inverted: bool,
    narration: NarrationSlot,
    events: Vec<CatcherEvent>,
}

impl Catcher {
    pub fn new(tuning: CatcherTuning, settings: &Settings, seed: u64) -> Self {
        let table = vec![
            TimedTransition::new(Phase::Intro, tuning.countdown, Phase::Active),
            TimedTransition::new(Phase::Resolution, tuning.review_delay, Phase::Narration),
            TimedTransition::new(Phase::Transition, tuning.transition_time, Phase::Terminal),
        ];
        let play = Rect::from_origin_size(Vec2::ZERO, Vec2::new(PLAY_WIDTH, PLAY_HEIGHT));
        let pool = tuning.items.iter().map(|d| Payload::ingredient(&d.id, &d.name)).collect();
        let colors = tuning.items.iter().map(|d| (d.id.clone(), parse_color(&d.color))).collect();
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            pool,
            colors,
            schedule: SpawnSchedule::new(Vec::new(), tuning.spawn_interval),
            items: World::new(play, tuning.total_spawns),
            explosions: World::new(play, settings.max_particles()),
            collected: CollectedSet::new(),
            basket_x: (PLAY_WIDTH - tuning.basket_size.x) * 0.5,
            inverted: true,
            narration: NarrationSlot::new(),
            events: Vec::new(),
            tuning,
        }
    }

    pub fn collected(&self) -> &CollectedSet {
        &self.collected
    }

    pub fn items(&self) -> &World {
        &self.items
    }

    pub fn schedule(&self) -> &SpawnSchedule<Payload> {
        &self.schedule
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn narration(&self) -> &NarrationSlot {
        &self.narration
    }

    /// Whole seconds left on the countdown
    pub fn countdown(&self) -> u32 {
        match self.phases.phase() {
            Phase::Idle => self.tuning.countdown.ceil() as u32,
            Phase::Intro => self.phases.remaining(self.tuning.countdown).ceil() as u32,
            _ => 0,
        }
    }

    /// Transition animation stage: how many step marks have passed
    pub fn transition_step(&self) -> usize {
        if !self.phases.is(Phase::Transition) {
            return 0;
        }
        let elapsed = self.phases.elapsed();
        self.tuning.transition_steps.iter().filter(|&&at| elapsed >= at).count()
    }

    pub fn basket(&self) -> Rect {
        let t = &self.tuning;
        let top = PLAY_HEIGHT - t.basket_size.y - t.basket_lift;
        Rect::from_origin_size(Vec2::new(self.basket_x, top), t.basket_size)
    }

    pub fn take_events(&mut self) -> Vec<CatcherEvent> {
        std::mem::take(&mut self.events)
    }

    fn color_of(&self, payload: &Payload) -> Color {
        match payload {
            Payload::Ingredient { id, .. } => self
                .colors
                .iter()
                .find(|(c, _)| c == id)
                .map_or(Color::WHITE, |(_, color)| *color),
            _ => BOMB_COLOR,
        }
    }

    fn spawn(&mut self, payload: Payload) {
        let t = &self.tuning;
        let index = self.schedule.spawned() as f32;
        let half = t.item_size * 0.5;
        let x = self.emitter.range(0.0, PLAY_WIDTH - t.item_size) + half;
        let speed = t.base_speed + self.emitter.range(0.0, t.speed_spread) + index * t.speed_per_index;
        let id = self.emitter.next_id();
        let item = Entity::rect(id, EntityKind::FallingItem, Vec2::new(x, -half), Vec2::splat(t.item_size))
            .with_velocity(Vec2::new(0.0, speed))
            .with_color(self.color_of(&payload))
            .with_payload(payload);
        self.items.adopt(vec![item]);
    }

    fn steer(&mut self, dt: f32) {
        let t = &self.tuning;
        let phase_in_cycle = self.phases.elapsed() % t.invert_cycle.max(f32::EPSILON);
        let inverted = phase_in_cycle < t.invert_on;
        if inverted != self.inverted {
            self.inverted = inverted;
            self.events.push(CatcherEvent::ControlsInverted(inverted));
        }

        let left = self.input.key_down(Key::Left) || self.input.key_down(Key::Char('a'));
        let right = self.input.key_down(Key::Right) || self.input.key_down(Key::Char('d'));
        let mut dir = right as i32 as f32 - left as i32 as f32;
        if self.inverted {
            dir = -dir;
        }
        let max_x = PLAY_WIDTH - t.basket_size.x;
        self.basket_x = (self.basket_x + dir * t.basket_speed * dt).clamp(0.0, max_x);
    }

    fn resolve_items(&mut self) {
        let zone = CatchZone {
            rect: self.basket(),
            band_slack: self.tuning.catch_slack,
        };
        let bounds = self.items.bounds;
        let margin = self.tuning.item_size;
        for item in self.items.entities.iter_mut() {
            let event = if item.payload.is_hazard() && zone.accepts(&item.aabb()) {
                pop(item)
            } else {
                resolve_catch(item, &zone).or_else(|| resolve_miss(item, &bounds, margin))
            };
            self.items.events.extend(event);
        }

        for event in self.items.drain_events() {
            match event {
                SimEvent::Caught { payload, .. } => {
                    self.collected.apply(&payload);
                    if let Payload::Ingredient { name, .. } = payload {
                        self.events.push(CatcherEvent::Caught { name });
                    }
                }
                SimEvent::Popped { pos, .. } => {
                    let lost = self.collected.len();
                    self.collected.apply(&Payload::Hazard);
                    let debris = self
                        .emitter
                        .burst(EntityKind::SplatterParticle, pos, FIRE_COLOR, &self.tuning.explosion);
                    self.explosions.adopt(debris);
                    self.events.push(CatcherEvent::Boom { lost });
                }
                SimEvent::Missed { .. } => self.events.push(CatcherEvent::Missed),
                SimEvent::Merged { .. } => {}
            }
        }
        self.items.reap(margin);
    }

    fn finished(&self) -> bool {
        self.schedule.is_drained() && self.items.active_count() == 0
    }
}

impl Scene for Catcher {
    fn name(&self) -> &'static str {
        "catcher"
    }

    fn start(&mut self) {
        let t = &self.tuning;
        let regular = t.total_spawns.saturating_sub(t.hazards);
        let queue = self.emitter.payload_queue(&self.pool, regular, t.hazards);
        self.schedule = SpawnSchedule::new(queue, t.spawn_interval);
        self.phases.go(Phase::Intro);
    }

    fn stop(&mut self) {
        self.items.clear();
        self.explosions.clear();
        self.collected.clear();
        self.input.clear();
        self.events.clear();
        self.schedule = SpawnSchedule::new(Vec::new(), self.tuning.spawn_interval);
        self.basket_x = (PLAY_WIDTH - self.tuning.basket_size.x) * 0.5;
        self.inverted = true;
        self.narration.clear();
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        if let Some(change) = self.phases.tick(dt) {
            if change.to == Phase::Narration {
                self.narration.set(order_review(&self.collected.names()));
            }
        }
        let keys = self.input.take_keys();
        let clicks = self.input.take_clicks();

        match self.phases.phase() {
            Phase::Active => {
                self.steer(dt);
                if let Some(payload) = self.schedule.tick(dt) {
                    self.spawn(payload);
                }
                advance_all(&mut self.items.entities, dt, &Forces::NONE);
                self.resolve_items();
                if self.finished() {
                    log::info!("Catcher done with {} items collected", self.collected.len());
                    self.phases.go(Phase::Resolution);
                }
            }
            Phase::Narration => {
                if keys.contains(&Key::Enter) || !clicks.is_empty() {
                    self.phases.go(Phase::Transition);
                }
            }
            _ => {}
        }

        let forces = Forces::gravity(Vec2::new(0.0, self.tuning.explosion_gravity));
        advance_all(&mut self.explosions.entities, dt, &forces);
        self.explosions.reap(self.tuning.item_size);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let b = self.basket();
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.items.views().chain(self.explosions.views()).collect(),
            zones: vec![ZoneView::Rect {
                name: "basket",
                x: b.min.x,
                y: b.min.y,
                w: b.width(),
                h: b.height(),
                active: self.inverted,
            }],
            narration: self.narration.text(),
        }
    }
}
