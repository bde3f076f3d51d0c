//! Physics keyboard
//!
//! Letter tiles fall, bounce off the walls, shove each other and run from the
//! cursor. Clicking a tile types its letter, then every tile gets blasted
//! outward and the letters are dealt out again. An earthquake hits every few
//! seconds.

use std::f32::consts::TAU;

use glam::Vec2;

use super::{Interval, TypedWord, edit_word};
use crate::polar_to_cartesian;
use crate::settings::Settings;
use crate::sim::collision::{nearest_within, point_in_rect};
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind, Payload};
use crate::sim::input::{Falloff, InputEvent, InputState, RepulsionField};
use crate::sim::integrate::{Forces, advance_all};
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::resolve::{bounce_in_rect, soft_separate};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::tuning::KeyboardTuning;

const TILE_COLOR: Color = Color::rgb(0xf5, 0x9e, 0x0b);
/// Extra random spread when laying out the starting grid
const GRID_JITTER: f32 = 20.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardEvent {
    Typed(char),
    Quake,
    Confirmed(String),
}

#[derive(Debug)]
pub struct Keyboard {
    tuning: KeyboardTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    field: RepulsionField,
    quakes: bool,
    quake: Interval,
    letters: World,
    word: TypedWord,
    chosen: Option<String>,
    events: Vec<KeyboardEvent>,
}

impl Keyboard {
    pub fn new(tuning: KeyboardTuning, settings: &Settings, seed: u64) -> Self {
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::new(tuning.width, tuning.height));
        let table = vec![TimedTransition::new(Phase::Transition, tuning.confirm_delay, Phase::Terminal)];
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            field: RepulsionField {
                radius: tuning.repulse_radius,
                falloff: Falloff::InverseSquare { k: tuning.repulse_k },
                ease: 1.0,
            },
            quakes: settings.shocks_enabled(),
            quake: Interval::new(tuning.quake_interval),
            letters: World::new(bounds, tuning.alphabet.chars().count()),
            word: TypedWord::default(),
            chosen: None,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn letters(&self) -> &World {
        &self.letters
    }

    pub fn typed(&self) -> &str {
        self.word.text()
    }

    /// Keywords still reachable from what has been typed
    pub fn partial_matches(&self) -> Vec<&str> {
        self.word.partial_matches(&self.tuning.keywords)
    }

    pub fn matched(&self) -> Option<&str> {
        self.word.matched(&self.tuning.keywords)
    }

    /// Keyword confirmed with Enter
    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<KeyboardEvent> {
        std::mem::take(&mut self.events)
    }

    fn shuffled_glyphs(&mut self) -> Vec<char> {
        let mut glyphs: Vec<char> = self.tuning.alphabet.chars().collect();
        self.emitter.shuffle(&mut glyphs);
        glyphs
    }

    fn spawn_letters(&mut self) {
        let glyphs = self.shuffled_glyphs();
        let t = &self.tuning;
        let n = glyphs.len();
        let cols = (n as f32).sqrt().ceil().max(1.0) as usize;
        let rows = n.div_ceil(cols).max(1);
        let half = t.tile * 0.5;
        let mut spawned = Vec::with_capacity(n);
        for (i, glyph) in glyphs.into_iter().enumerate() {
            let x = (i % cols) as f32 / cols as f32 * (t.width - t.tile) + self.emitter.range(0.0, GRID_JITTER);
            let y = (i / cols) as f32 / rows as f32 * (t.height - t.tile) + self.emitter.range(0.0, GRID_JITTER);
            let vel = Vec2::new(self.emitter.jitter(t.start_speed), self.emitter.jitter(t.start_speed));
            let id = self.emitter.next_id();
            spawned.push(
                Entity::rect(id, EntityKind::PhysicsLetter, Vec2::new(x + half, y + half), Vec2::splat(t.tile))
                    .with_velocity(vel)
                    .with_color(TILE_COLOR)
                    .with_payload(Payload::Glyph(glyph)),
            );
        }
        self.letters.adopt(spawned);
    }

    /// Tile under the click; overlapping tiles go to the closest center
    fn letter_at(&self, click: Vec2) -> Option<char> {
        let under = self
            .letters
            .active()
            .filter(|e| point_in_rect(click, &e.aabb()))
            .map(|e| (e.id, e.pos()));
        let id = nearest_within(click, under, f32::MAX)?;
        match self.letters.get(id)?.payload {
            Payload::Glyph(c) => Some(c),
            _ => None,
        }
    }

    fn explode(&mut self) {
        let (lo, hi, lift) = (self.tuning.explode_min, self.tuning.explode_max, self.tuning.explode_lift);
        for letter in self.letters.entities.iter_mut() {
            let angle = self.emitter.range(0.0, TAU);
            let speed = self.emitter.range(lo, hi);
            letter.vel += polar_to_cartesian(speed, angle) - Vec2::new(0.0, lift);
        }
        let glyphs = self.shuffled_glyphs();
        for (letter, glyph) in self.letters.entities.iter_mut().zip(glyphs) {
            letter.payload = Payload::Glyph(glyph);
        }
    }

    fn shake(&mut self) {
        let kick = self.tuning.quake_kick;
        for letter in self.letters.entities.iter_mut() {
            letter.vel += Vec2::new(self.emitter.jitter(kick * 2.0), -self.emitter.range(0.0, kick));
        }
        self.events.push(KeyboardEvent::Quake);
    }

    fn simulate(&mut self, dt: f32) {
        let t = &self.tuning;
        let cursor = self.input.cursor();
        for letter in self.letters.entities.iter_mut() {
            self.field.push(letter, cursor, dt);
        }
        soft_separate(
            &mut self.letters.entities,
            EntityKind::PhysicsLetter,
            t.tile * t.spacing_factor,
            t.push_stiffness,
        );
        let forces = Forces::gravity(Vec2::new(0.0, t.gravity)).with_damping(t.damping);
        advance_all(&mut self.letters.entities, dt, &forces);
        let bounds = self.letters.bounds;
        for letter in self.letters.entities.iter_mut() {
            bounce_in_rect(letter, &bounds, t.bounce);
        }
    }
}

impl Scene for Keyboard {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn start(&mut self) {
        self.spawn_letters();
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.letters.clear();
        self.input.clear();
        self.events.clear();
        self.word.clear();
        self.chosen = None;
        self.quake.reset();
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        self.phases.tick(dt);
        let keys = self.input.take_keys();
        let clicks = self.input.take_clicks();
        if self.phases.is(Phase::Idle) {
            return;
        }
        let dt = dt.min(self.tuning.max_dt);

        if self.phases.is(Phase::Active) {
            for click in clicks {
                if let Some(c) = self.letter_at(click) {
                    self.word.push(c);
                    self.events.push(KeyboardEvent::Typed(c));
                    self.explode();
                }
            }
            if let Some(keyword) = edit_word(&mut self.word, &keys, &self.tuning.keywords) {
                log::info!("Keyboard confirmed {:?}", keyword);
                self.events.push(KeyboardEvent::Confirmed(keyword.clone()));
                self.chosen = Some(keyword);
                self.phases.go(Phase::Transition);
            }
            if self.quake.tick(dt) && self.quakes {
                self.shake();
            }
        }
        self.simulate(dt);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.letters.views().collect(),
            zones: vec![ZoneView::Rect {
                name: "keyboard",
                x: 0.0,
                y: 0.0,
                w: self.tuning.width,
                h: self.tuning.height,
                active: self.matched().is_some(),
            }],
            narration: (!self.word.text().is_empty()).then(|| self.word.text().to_string()),
        }
    }
}
