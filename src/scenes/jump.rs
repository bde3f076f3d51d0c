//! Jump-to-enter
//!
//! The mascot jumps toward wherever the player clicks and has to land on the
//! enter button hard enough to press it. The button hops somewhere else on
//! every jump, and the first few landings on it never count.

use glam::Vec2;

use crate::consts::{PLAY_HEIGHT, PLAY_WIDTH, SIM_DT};
use crate::settings::Settings;
use crate::sim::collision::rect_overlap;
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind};
use crate::sim::input::{InputEvent, InputState, ballistic_velocity, flight_time};
use crate::sim::integrate::{Forces, advance};
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::resolve::{place, set_velocity};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, ZoneView};
use crate::tuning::JumpTuning;

/// Shortest flight, so a click on the mascot itself still makes a hop
const MIN_FLIGHT: f32 = 0.05;
const JUMPER_COLOR: Color = Color::rgb(0x8e, 0x44, 0xad);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpEvent {
    Launched { target: Vec2 },
    /// Landed next to the button
    Missed,
    /// Landed on the button but it refused anyway
    Rejected { attempt: u32 },
    /// Landed on the button too gently
    TooSoft { speed: f32 },
    Entered { speed: f32 },
}

#[derive(Debug)]
pub struct Jump {
    tuning: JumpTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    ground: f32,
    jumper: Entity,
    airborne: bool,
    button: Rect,
    /// Landings on the button so far
    attempts: u32,
    events: Vec<JumpEvent>,
}

impl Jump {
    pub fn new(tuning: JumpTuning, _settings: &Settings, seed: u64) -> Self {
        let table = vec![TimedTransition::new(Phase::Transition, tuning.success_delay, Phase::Terminal)];
        let ground = PLAY_HEIGHT - tuning.ground_offset;
        let button_origin = Vec2::new(
            PLAY_WIDTH - tuning.button_size.x - tuning.button_margin,
            ground - tuning.button_size.y - tuning.button_lift,
        );
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            ground,
            jumper: Self::spawn_jumper(&tuning),
            airborne: false,
            button: Rect::from_origin_size(button_origin, tuning.button_size),
            attempts: 0,
            events: Vec::new(),
            tuning,
        }
    }

    fn spawn_jumper(tuning: &JumpTuning) -> Entity {
        let half = tuning.jumper_size * 0.5;
        Entity::rect(1, EntityKind::Jumper, tuning.start + Vec2::splat(half), Vec2::splat(tuning.jumper_size))
            .with_color(JUMPER_COLOR)
    }

    pub fn jumper(&self) -> &Entity {
        &self.jumper
    }

    pub fn button(&self) -> Rect {
        self.button
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn take_events(&mut self) -> Vec<JumpEvent> {
        std::mem::take(&mut self.events)
    }

    fn move_button(&mut self) {
        let t = &self.tuning;
        let max_x = PLAY_WIDTH - t.button_size.x - t.button_margin;
        let x = self.emitter.range(t.button_margin, max_x);
        let y = self.ground - t.button_size.y - t.button_lift;
        self.button = Rect::from_origin_size(Vec2::new(x, y), t.button_size);
    }

    fn launch(&mut self, target: Vec2) {
        let origin = self.jumper.pos();
        let gravity = Vec2::new(0.0, self.tuning.gravity);
        let t = flight_time(origin, target, self.tuning.travel_speed, MIN_FLIGHT);
        set_velocity(&mut self.jumper, ballistic_velocity(origin, target, t, gravity, SIM_DT));
        self.airborne = true;
        self.events.push(JumpEvent::Launched { target });
        self.move_button();
    }

    fn land(&mut self) {
        let speed = self.jumper.vel().y.abs();
        let half = self.tuning.jumper_size * 0.5;
        let x = self.jumper.pos().x;
        place(&mut self.jumper, Vec2::new(x, self.ground - half));
        set_velocity(&mut self.jumper, Vec2::ZERO);
        self.airborne = false;

        if !rect_overlap(&self.jumper.aabb(), &self.button) {
            self.events.push(JumpEvent::Missed);
            return;
        }
        if self.attempts < self.tuning.rejected_landings {
            self.attempts += 1;
            log::debug!("Landing {} on the button rejected", self.attempts);
            self.events.push(JumpEvent::Rejected { attempt: self.attempts });
        } else if speed > self.tuning.min_landing_speed {
            log::info!("Entered with landing speed {:.0}", speed);
            self.events.push(JumpEvent::Entered { speed });
            self.phases.go(Phase::Transition);
        } else {
            self.events.push(JumpEvent::TooSoft { speed });
        }
    }
}

impl Scene for Jump {
    fn name(&self) -> &'static str {
        "jump"
    }

    fn start(&mut self) {
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.input.clear();
        self.events.clear();
        self.jumper = Self::spawn_jumper(&self.tuning);
        self.airborne = false;
        self.attempts = 0;
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        self.phases.tick(dt);
        let clicks = self.input.take_clicks();
        if !self.phases.is(Phase::Active) {
            return;
        }
        // Mid-air clicks are ignored
        if let Some(&target) = clicks.first().filter(|_| !self.airborne) {
            self.launch(target);
        }
        if !self.airborne {
            return;
        }
        advance(&mut self.jumper, dt, &Forces::gravity(Vec2::new(0.0, self.tuning.gravity)));
        if self.jumper.aabb().max.y >= self.ground {
            self.land();
        }
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let b = self.button;
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: vec![self.jumper.view()],
            zones: vec![ZoneView::Rect {
                name: "enter_button",
                x: b.min.x,
                y: b.min.y,
                w: b.width(),
                h: b.height(),
                active: self.phases.phase() >= Phase::Transition,
            }],
            narration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Jump {
        let mut j = Jump::new(JumpTuning::default(), &Settings::default(), 4);
        j.start();
        j
    }

    /// Jump straight up to `height`, with the button slid under the landing spot
    fn hop(j: &mut Jump, height: f32, on_button: bool) -> Vec<JumpEvent> {
        let from = j.jumper().pos();
        j.handle_input(InputEvent::Click {
            x: from.x,
            y: from.y - height,
        });
        j.step(SIM_DT);
        assert!(j.is_airborne());
        let under = Vec2::new(from.x - 60.0, j.button.min.y);
        let away = Vec2::new(from.x + 400.0, j.button.min.y);
        j.button = Rect::from_origin_size(if on_button { under } else { away }, j.tuning.button_size);
        for _ in 0..600 {
            if !j.is_airborne() {
                break;
            }
            j.step(SIM_DT);
        }
        assert!(!j.is_airborne());
        j.take_events()
    }

    #[test]
    fn test_lands_on_ground() {
        let mut j = scene();
        let events = hop(&mut j, 100.0, false);
        assert!(events.contains(&JumpEvent::Missed));
        let bottom = j.jumper().aabb().max.y;
        assert!((bottom - j.ground).abs() < 1e-3);
        assert_eq!(j.jumper().vel(), Vec2::ZERO);
    }

    #[test]
    fn test_button_moves_on_every_jump() {
        let mut j = scene();
        let before = j.button();
        j.handle_input(InputEvent::Click { x: 500.0, y: 300.0 });
        j.step(SIM_DT);
        let after = j.button();
        assert_ne!(before, after);
        assert!(after.min.x >= j.tuning.button_margin);
        assert!(after.max.x <= PLAY_WIDTH - j.tuning.button_margin + 1e-3);
    }

    #[test]
    fn test_first_landings_rejected_then_hard_landing_enters() {
        let mut j = scene();
        for attempt in 1..=2 {
            let events = hop(&mut j, 450.0, true);
            assert!(events.contains(&JumpEvent::Rejected { attempt }));
            assert_eq!(j.phase(), Phase::Active);
        }
        let events = hop(&mut j, 450.0, true);
        assert!(events.iter().any(|e| matches!(e, JumpEvent::Entered { speed } if *speed > 600.0)));
        assert_eq!(j.phase(), Phase::Transition);
        for _ in 0..95 {
            j.step(SIM_DT);
        }
        assert_eq!(j.phase(), Phase::Terminal);
    }

    #[test]
    fn test_soft_landing_does_not_count() {
        let mut j = scene();
        hop(&mut j, 100.0, false);
        j.attempts = j.tuning.rejected_landings;
        let events = hop(&mut j, 30.0, true);
        assert!(events.iter().any(|e| matches!(e, JumpEvent::TooSoft { .. })));
        assert_eq!(j.phase(), Phase::Active);
    }

    #[test]
    fn test_mid_air_clicks_ignored() {
        let mut j = scene();
        j.handle_input(InputEvent::Click { x: 200.0, y: 50.0 });
        j.step(SIM_DT);
        let button = j.button();
        j.handle_input(InputEvent::Click { x: 900.0, y: 50.0 });
        j.step(SIM_DT);
        assert_eq!(j.button(), button);
        let launches = j
            .take_events()
            .iter()
            .filter(|e| matches!(e, JumpEvent::Launched { .. }))
            .count();
        assert_eq!(launches, 1);
    }
}
