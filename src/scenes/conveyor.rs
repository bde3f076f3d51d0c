//! Magnet conveyor
//!
//! Letter tiles ride horizontal belts at different speeds and directions,
//! wrapping around at the ends. A click grabs the nearest tile under the
//! magnet, and then every belt gets a new speed and the letters are dealt
//! out again. Belts also lurch on their own every few seconds.

use glam::Vec2;

use super::{Interval, TypedWord, edit_word};
use crate::settings::Settings;
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind, Payload};
use crate::sim::input::{InputEvent, InputState, grab_entity};
use crate::sim::integrate::{Forces, advance};
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::resolve::{place, set_velocity};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::tuning::ConveyorTuning;

const TILE_COLOR: Color = Color::rgb(0xd9, 0x77, 0x06);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConveyorEvent {
    Grabbed(char),
    Chaos,
    Confirmed(String),
}

#[derive(Debug)]
pub struct Conveyor {
    tuning: ConveyorTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    /// Signed belt speed per lane (units/s, +X is right)
    speeds: Vec<f32>,
    tiles: World,
    /// Lane of each tile, parallel to `tiles.entities`
    lane_of: Vec<usize>,
    chaos: Interval,
    word: TypedWord,
    chosen: Option<String>,
    events: Vec<ConveyorEvent>,
}

impl Conveyor {
    pub fn new(tuning: ConveyorTuning, _settings: &Settings, seed: u64) -> Self {
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::new(tuning.width, tuning.height));
        let table = vec![TimedTransition::new(Phase::Transition, tuning.confirm_delay, Phase::Terminal)];
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            speeds: Vec::new(),
            tiles: World::new(bounds, tuning.alphabet.chars().count()),
            lane_of: Vec::new(),
            chaos: Interval::new(tuning.chaos_interval),
            word: TypedWord::default(),
            chosen: None,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn tiles(&self) -> &World {
        &self.tiles
    }

    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn typed(&self) -> &str {
        self.word.text()
    }

    pub fn matched(&self) -> Option<&str> {
        self.word.matched(&self.tuning.keywords)
    }

    pub fn partial_matches(&self) -> Vec<&str> {
        self.word.partial_matches(&self.tuning.keywords)
    }

    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    pub fn take_events(&mut self) -> Vec<ConveyorEvent> {
        std::mem::take(&mut self.events)
    }

    fn lane_height(&self) -> f32 {
        (self.tuning.height - 2.0 * self.tuning.lane_margin) / self.tuning.lanes.max(1) as f32
    }

    fn lane_y(&self, lane: usize) -> f32 {
        let h = self.lane_height();
        self.tuning.lane_margin + lane as f32 * h + h * 0.5
    }

    /// Speed in `[min, max)` with a random direction
    fn random_speed(&mut self) -> f32 {
        let speed = self.emitter.range(self.tuning.speed_min, self.tuning.speed_max);
        if self.emitter.chance(0.5) { speed } else { -speed }
    }

    fn per_lane(&self, n: usize) -> usize {
        n.div_ceil(self.tuning.lanes.max(1)).max(1)
    }

    fn shuffled_glyphs(&mut self) -> Vec<char> {
        let mut glyphs: Vec<char> = self.tuning.alphabet.chars().collect();
        self.emitter.shuffle(&mut glyphs);
        glyphs
    }

    fn build_lanes(&mut self) {
        self.speeds = (0..self.tuning.lanes).map(|_| self.random_speed()).collect();
        let glyphs = self.shuffled_glyphs();
        let per_lane = self.per_lane(glyphs.len());
        let pitch = self.tuning.tile + self.tuning.gap;
        let half = self.tuning.tile * 0.5;
        let mut spawned = Vec::with_capacity(glyphs.len());
        self.lane_of.clear();
        for (i, glyph) in glyphs.into_iter().enumerate() {
            let lane = i / per_lane;
            let slot = i % per_lane;
            let pos = Vec2::new(slot as f32 * pitch + half, self.lane_y(lane));
            let id = self.emitter.next_id();
            spawned.push(
                Entity::rect(id, EntityKind::PhysicsLetter, pos, Vec2::splat(self.tuning.tile))
                    .with_velocity(Vec2::new(self.speeds[lane], 0.0))
                    .with_color(TILE_COLOR)
                    .with_payload(Payload::Glyph(glyph)),
            );
            self.lane_of.push(lane);
        }
        self.tiles.adopt(spawned);
    }

    fn lurch(&mut self) {
        let (reverse_chance, reverse_boost) = (self.tuning.reverse_chance, self.tuning.reverse_boost);
        let cap = self.tuning.speed_max * self.tuning.speed_cap_factor;
        for i in 0..self.speeds.len() {
            let mut speed = if self.emitter.chance(reverse_chance) {
                -self.speeds[i] * reverse_boost
            } else {
                self.random_speed()
            };
            if speed.abs() > cap {
                speed = self.random_speed();
            }
            self.speeds[i] = speed;
        }
        self.events.push(ConveyorEvent::Chaos);
    }

    fn grab(&mut self, click: Vec2) {
        let Some(glyph) = grab_entity(Some(click), &self.tiles.entities, self.tuning.grab_radius)
            .and_then(|id| self.tiles.get(id))
            .and_then(|tile| match tile.payload {
                Payload::Glyph(c) => Some(c),
                _ => None,
            })
        else {
            return;
        };
        self.word.push(glyph);
        self.events.push(ConveyorEvent::Grabbed(glyph));

        let glyphs = self.shuffled_glyphs();
        for (tile, glyph) in self.tiles.entities.iter_mut().zip(glyphs) {
            tile.payload = Payload::Glyph(glyph);
        }
        let boost = self.tuning.regrab_boost;
        for i in 0..self.speeds.len() {
            let speed = self.random_speed();
            self.speeds[i] = speed * self.emitter.range(boost.x, boost.y);
        }
    }

    fn run_belts(&mut self, dt: f32) {
        let (tile, gap, width) = (self.tuning.tile, self.tuning.gap, self.tuning.width);
        let half = tile * 0.5;
        for (entity, &lane) in self.tiles.entities.iter_mut().zip(&self.lane_of) {
            let speed = self.speeds.get(lane).copied().unwrap_or(0.0);
            set_velocity(entity, Vec2::new(speed, 0.0));
            advance(entity, dt, &Forces::NONE);

            let left = entity.pos().x - half;
            let y = entity.pos().y;
            if speed > 0.0 && left > width + tile {
                place(entity, Vec2::new(-tile - gap + half, y));
            } else if speed < 0.0 && left < -tile - gap {
                place(entity, Vec2::new(width + tile + half, y));
            }
        }
    }
}

impl Scene for Conveyor {
    fn name(&self) -> &'static str {
        "conveyor"
    }

    fn start(&mut self) {
        self.build_lanes();
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.tiles.clear();
        self.lane_of.clear();
        self.speeds.clear();
        self.input.clear();
        self.events.clear();
        self.word.clear();
        self.chosen = None;
        self.chaos.reset();
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
        if self.phases.is(Phase::Active) {
            for click in clicks {
                self.grab(click);
            }
            if let Some(keyword) = edit_word(&mut self.word, &keys, &self.tuning.keywords) {
                log::info!("Conveyor confirmed {:?}", keyword);
                self.events.push(ConveyorEvent::Confirmed(keyword.clone()));
                self.chosen = Some(keyword);
                self.phases.go(Phase::Transition);
            }
            if self.chaos.tick(dt) {
                self.lurch();
            }
        }
        self.run_belts(dt);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let h = self.lane_height();
        // Active lanes run rightward
        let zones = self
            .speeds
            .iter()
            .enumerate()
            .map(|(lane, &speed)| ZoneView::Rect {
                name: "lane",
                x: 0.0,
                y: self.lane_y(lane) - h * 0.5,
                w: self.tuning.width,
                h,
                active: speed > 0.0,
            })
            .collect();
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.tiles.views().collect(),
            zones,
            narration: (!self.word.text().is_empty()).then(|| self.word.text().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::input::Key;

    fn conveyor() -> Conveyor {
        let mut c = Conveyor::new(ConveyorTuning::default(), &Settings::default(), 17);
        c.start();
        c
    }

    fn speed_ok(c: &Conveyor, lo: f32, hi: f32) -> bool {
        c.speeds().iter().all(|s| s.abs() >= lo && s.abs() <= hi)
    }

    fn grab_glyph(c: &mut Conveyor, glyph: char) {
        let pos = c
            .tiles()
            .entities
            .iter()
            .find(|e| e.payload == Payload::Glyph(glyph))
            .map(|e| e.pos())
            .unwrap();
        c.handle_input(InputEvent::Click { x: pos.x, y: pos.y });
        c.step(SIM_DT);
    }

    #[test]
    fn test_lanes_layout() {
        let c = conveyor();
        assert_eq!(c.speeds().len(), 4);
        assert!(speed_ok(&c, 40.0, 140.0));
        assert_eq!(c.tiles().entities.len(), 26);
        let per_lane: Vec<usize> = (0..4).map(|l| c.lane_of.iter().filter(|&&x| x == l).count()).collect();
        assert_eq!(per_lane, vec![7, 7, 7, 5]);
    }

    #[test]
    fn test_tiles_ride_their_belt() {
        let mut c = conveyor();
        c.speeds = vec![100.0, -100.0, 50.0, -50.0];
        let before: Vec<Vec2> = c.tiles().entities.iter().map(|e| e.pos()).collect();
        c.step(SIM_DT);
        for ((e, &lane), start) in c.tiles().entities.iter().zip(&c.lane_of).zip(before) {
            let moved = e.pos() - start;
            assert!((moved.x - c.speeds[lane] * SIM_DT).abs() < 1e-3);
            assert_eq!(moved.y, 0.0);
        }
    }

    #[test]
    fn test_tiles_wrap_around() {
        let mut c = conveyor();
        c.speeds = vec![100.0; 4];
        let y = c.tiles.entities[0].pos().y;
        place(&mut c.tiles.entities[0], Vec2::new(c.tuning.width + 100.0, y));
        c.step(SIM_DT);
        assert!(c.tiles().entities[0].pos().x < 0.0);

        c.speeds = vec![-100.0; 4];
        place(&mut c.tiles.entities[1], Vec2::new(-80.0, y));
        c.step(SIM_DT);
        assert!(c.tiles().entities[1].pos().x > c.tuning.width);
    }

    #[test]
    fn test_chaos_keeps_speeds_capped() {
        let mut c = conveyor();
        for _ in 0..(60 * 31) {
            c.step(SIM_DT);
        }
        let chaos = c.take_events().iter().filter(|e| **e == ConveyorEvent::Chaos).count();
        assert_eq!(chaos, 6);
        assert!(speed_ok(&c, 40.0, 140.0 * 1.8));
    }

    #[test]
    fn test_grab_types_and_speeds_up() {
        let mut c = conveyor();
        grab_glyph(&mut c, 'q');
        assert_eq!(c.typed(), "q");
        assert!(speed_ok(&c, 40.0 * 1.2, 140.0 * 1.7));

        // Nothing within reach of the magnet
        c.handle_input(InputEvent::Click { x: 400.0, y: -200.0 });
        c.step(SIM_DT);
        assert_eq!(c.typed(), "q");
    }

    #[test]
    fn test_typing_a_cuisine_and_enter() {
        let mut c = conveyor();
        for g in "french".chars() {
            grab_glyph(&mut c, g);
        }
        assert!(c.partial_matches().contains(&"french"));
        c.handle_input(InputEvent::KeyDown(Key::Enter));
        c.step(SIM_DT);
        assert_eq!(c.chosen(), Some("french"));
        for _ in 0..140 {
            c.step(SIM_DT);
        }
        assert_eq!(c.phase(), Phase::Terminal);
    }
}
