//! Ingredient palette: chop three times, fast, to get a color
//!
//! Ingredients sit on rest slots and run from the cursor. Three chops inside
//! the chop window select the color, except when the palette decides to hand
//! over a different one. Slots are reshuffled on a timer.

use glam::Vec2;

use super::{Interval, parse_color};
use crate::settings::Settings;
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind, Payload};
use crate::sim::input::{Falloff, InputEvent, InputState, RepulsionField, clamp_offset, grab_entity};
use crate::sim::integrate::{Forces, advance, advance_all};
use crate::sim::phase::{Phase, PhaseMachine};
use crate::sim::resolve::{place, set_velocity};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::tuning::PaletteTuning;

const TAUNTS: &[&str] = &[
    "Too slow, chef!",
    "Nope!",
    "That was the other one.",
    "Chop like you mean it.",
    "Close. Not really.",
];

#[derive(Debug, Clone, PartialEq)]
pub enum PaletteEvent {
    Chopped { ingredient: String, progress: u32 },
    /// `wrong` means the palette swapped in another ingredient's color
    ColorSelected { color: Color, ingredient: String, wrong: bool },
    Taunt(&'static str),
    Shuffled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChopState {
    count: u32,
    last: f32,
}

#[derive(Debug)]
pub struct Palette {
    tuning: PaletteTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    field: RepulsionField,
    colors: Vec<Color>,
    /// `order[slot]` is the ingredient shown in that slot
    order: Vec<usize>,
    items: World,
    splatter: World,
    chops: Vec<ChopState>,
    shuffle: Interval,
    clock: f32,
    selected: Option<Color>,
    events: Vec<PaletteEvent>,
}

impl Palette {
    pub fn new(tuning: PaletteTuning, settings: &Settings, seed: u64) -> Self {
        let bounds = Rect::from_origin_size(Vec2::ZERO, Vec2::new(tuning.width, tuning.height));
        let n = tuning.ingredients.len();
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(Vec::new()),
            field: RepulsionField {
                radius: tuning.dodge_radius,
                falloff: Falloff::Linear { gain: tuning.flee_gain },
                ease: tuning.ease,
            },
            colors: tuning.ingredients.iter().map(|i| parse_color(&i.color)).collect(),
            order: (0..n).collect(),
            items: World::new(bounds, n),
            splatter: World::new(bounds, settings.max_particles()),
            chops: vec![ChopState::default(); n],
            shuffle: Interval::new(tuning.shuffle_interval),
            clock: 0.0,
            selected: None,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn selected(&self) -> Option<Color> {
        self.selected
    }

    pub fn items(&self) -> &World {
        &self.items
    }

    /// Chops landed on an ingredient inside the current window
    pub fn chop_progress(&self, ingredient: usize) -> u32 {
        self.chops.get(ingredient).map_or(0, |c| c.count)
    }

    pub fn take_events(&mut self) -> Vec<PaletteEvent> {
        std::mem::take(&mut self.events)
    }

    fn slot_pos(&self, slot: usize) -> Vec2 {
        let n = self.order.len().max(1) as f32;
        Vec2::new(self.tuning.width * (slot as f32 + 0.5) / n, self.tuning.height * 0.5)
    }

    /// Rest point of an ingredient in its current slot
    fn rest_of(&self, ingredient: usize) -> Vec2 {
        let slot = self.order.iter().position(|&i| i == ingredient).unwrap_or(ingredient);
        self.slot_pos(slot)
    }

    fn ingredient_of(&self, id: u32) -> Option<usize> {
        self.items.entities.iter().position(|e| e.id == id)
    }

    fn spawn_items(&mut self) {
        let spawned: Vec<Entity> = self
            .tuning
            .ingredients
            .iter()
            .enumerate()
            .map(|(i, def)| {
                Entity::circle(i as u32 + 1, EntityKind::FallingItem, self.rest_of(i), self.tuning.item_radius)
                    .with_color(self.colors[i])
                    .with_payload(Payload::ingredient(&def.id, &def.name))
            })
            .collect();
        self.items.adopt(spawned);
    }

    fn reshuffle(&mut self) {
        let old: Vec<Vec2> = (0..self.order.len()).map(|i| self.rest_of(i)).collect();
        let mut order = std::mem::take(&mut self.order);
        self.emitter.shuffle(&mut order);
        self.order = order;
        for i in 0..self.items.entities.len() {
            let rest = self.rest_of(i);
            let item = &mut self.items.entities[i];
            let offset = item.pos() - old[i];
            place(item, rest + offset);
        }
        self.events.push(PaletteEvent::Shuffled);
    }

    fn chop(&mut self, click: Vec2) {
        let Some(idx) = grab_entity(Some(click), &self.items.entities, self.tuning.item_radius)
            .and_then(|id| self.ingredient_of(id))
        else {
            return;
        };
        let state = &mut self.chops[idx];
        if self.clock - state.last > self.tuning.chop_window {
            state.count = 0;
        }
        state.count += 1;
        state.last = self.clock;
        let progress = state.count;

        let name = self.tuning.ingredients[idx].name.clone();
        let pos = self.items.entities[idx].pos();
        let drops = self
            .emitter
            .burst(EntityKind::SplatterParticle, pos, self.colors[idx], &self.tuning.splatter);
        self.splatter.adopt(drops);
        self.events.push(PaletteEvent::Chopped {
            ingredient: name.clone(),
            progress,
        });

        if progress < self.tuning.chops_required {
            return;
        }
        self.chops[idx].count = 0;
        let n = self.colors.len();
        let wrong = n > 1 && self.emitter.chance(self.tuning.wrong_color_chance);
        let color = if wrong {
            // Any ingredient but the one chopped
            let pick = self.emitter.count(0, n as u32 - 2) as usize;
            self.colors[if pick >= idx { pick + 1 } else { pick }]
        } else {
            self.colors[idx]
        };
        log::debug!("Palette selected {} (wrong: {})", color.to_hex(), wrong);
        self.selected = Some(color);
        self.events.push(PaletteEvent::ColorSelected {
            color,
            ingredient: name,
            wrong,
        });
        if wrong {
            let taunt = TAUNTS[self.emitter.count(0, TAUNTS.len() as u32 - 1) as usize];
            self.events.push(PaletteEvent::Taunt(taunt));
        }
    }

    fn dodge(&mut self, dt: f32) {
        let cursor = self.input.cursor();
        let max_offset = self.tuning.max_offset;
        for i in 0..self.items.entities.len() {
            let rest = self.rest_of(i);
            let item = &mut self.items.entities[i];
            set_velocity(item, Vec2::ZERO);
            self.field.flee(item, rest, cursor, dt);
            advance(item, dt, &Forces::NONE);
            clamp_offset(item, rest, max_offset);
        }
    }
}

impl Scene for Palette {
    fn name(&self) -> &'static str {
        "palette"
    }

    fn start(&mut self) {
        self.spawn_items();
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.items.clear();
        self.splatter.clear();
        self.input.clear();
        self.events.clear();
        self.chops.iter_mut().for_each(|c| *c = ChopState::default());
        self.order = (0..self.tuning.ingredients.len()).collect();
        self.shuffle.reset();
        self.clock = 0.0;
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
        self.clock += dt;

        for click in self.input.take_clicks() {
            self.chop(click);
        }
        // Idle progress decays
        let (clock, window) = (self.clock, self.tuning.chop_window);
        for c in self.chops.iter_mut().filter(|c| c.count > 0 && clock - c.last > window) {
            c.count = 0;
        }
        if self.shuffle.tick(dt) {
            self.reshuffle();
        }
        self.dodge(dt);

        let forces = Forces::gravity(Vec2::new(0.0, self.tuning.splatter_gravity));
        advance_all(&mut self.splatter.entities, dt, &forces);
        self.splatter.reap(self.tuning.height);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let zones = (0..self.order.len())
            .map(|slot| {
                let p = self.slot_pos(slot);
                ZoneView::Circle {
                    name: "slot",
                    x: p.x,
                    y: p.y,
                    r: self.tuning.item_radius,
                    active: false,
                }
            })
            .collect();
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.items.views().chain(self.splatter.views()).collect(),
            zones,
            narration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn palette(tuning: PaletteTuning) -> Palette {
        let mut p = Palette::new(tuning, &Settings::default(), 5);
        p.start();
        p
    }

    fn click_item(p: &mut Palette, idx: usize) {
        let pos = p.items().entities[idx].pos();
        p.handle_input(InputEvent::Click { x: pos.x, y: pos.y });
        // Move the cursor away again so the item settles back
        p.handle_input(InputEvent::PointerLeave);
        p.step(SIM_DT);
    }

    #[test]
    fn test_three_quick_chops_select() {
        let mut p = palette(PaletteTuning {
            wrong_color_chance: 0.0,
            ..PaletteTuning::default()
        });
        for _ in 0..3 {
            click_item(&mut p, 2);
        }
        assert_eq!(p.selected(), Some(Color::from_hex("#f1c40f").unwrap()));
        assert_eq!(p.chop_progress(2), 0);
        let events = p.take_events();
        assert!(events.iter().any(|e| matches!(e, PaletteEvent::ColorSelected { wrong: false, .. })));
        assert!(p.splatter.active_count() > 0);
    }

    #[test]
    fn test_slow_chops_reset() {
        let mut p = palette(PaletteTuning::default());
        click_item(&mut p, 0);
        click_item(&mut p, 0);
        assert_eq!(p.chop_progress(0), 2);
        for _ in 0..60 {
            p.step(SIM_DT);
        }
        assert_eq!(p.chop_progress(0), 0);
        assert_eq!(p.selected(), None);
    }

    #[test]
    fn test_wrong_color_is_another_ingredient() {
        let mut p = palette(PaletteTuning {
            wrong_color_chance: 1.0,
            ..PaletteTuning::default()
        });
        for _ in 0..3 {
            click_item(&mut p, 4);
        }
        let chosen = p.selected().unwrap();
        assert_ne!(chosen, p.colors[4]);
        assert!(p.colors.contains(&chosen));
        assert!(p.take_events().iter().any(|e| matches!(e, PaletteEvent::Taunt(_))));
    }

    #[test]
    fn test_items_flee_and_return() {
        let mut p = palette(PaletteTuning::default());
        let rest = p.rest_of(3);
        p.handle_input(InputEvent::PointerMove {
            x: rest.x - 10.0,
            y: rest.y,
        });
        p.step(SIM_DT);
        let fled = p.items().entities[3].pos() - rest;
        assert!(fled.x > 0.0);
        assert!(fled.x <= p.tuning.max_offset.x + 1e-3);

        p.handle_input(InputEvent::PointerLeave);
        for _ in 0..60 {
            p.step(SIM_DT);
        }
        let back = (p.items().entities[3].pos() - p.rest_of(3)).length();
        assert!(back < fled.length());
        assert!(back < 1.0);
    }

    #[test]
    fn test_shuffle_moves_slots() {
        let mut p = palette(PaletteTuning {
            shuffle_interval: 0.5,
            ..PaletteTuning::default()
        });
        for _ in 0..31 {
            p.step(SIM_DT);
        }
        assert!(p.take_events().contains(&PaletteEvent::Shuffled));
        let mut seen: Vec<usize> = p.order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }
}
