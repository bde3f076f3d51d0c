//! Wrecking-ball confirm button
//!
//! The confirm button hangs off a chain and swings. A click only counts while
//! the ball passes through the target ring at the bottom of the arc, and the
//! swing gets wilder as the timer runs down.

use glam::Vec2;

use crate::consts::PLAY_WIDTH;
use crate::settings::Settings;
use crate::sim::collision::point_in_radius;
use crate::sim::emit::Emitter;
use crate::sim::entity::{Color, Entity, EntityKind};
use crate::sim::input::{InputEvent, InputState};
use crate::sim::integrate::advance_angular;
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::resolve::place;
use crate::sim::scheduler::Scene;
use crate::sim::world::{Snapshot, ZoneView};
use crate::tuning::PendulumTuning;

const BOB_COLOR: Color = Color::rgb(0x44, 0x44, 0x44);
const LINK_RADIUS: f32 = 5.0;
/// Taunts rotate every this many seconds
const TAUNT_PERIOD: f32 = 3.0;

const TAUNTS: &[&str] = &[
    "Swing it, chef!",
    "Tick tock...",
    "Aim carefully!",
    "Time's running out!",
    "You got this... maybe.",
    "Wrecking ball incoming!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendulumEvent {
    Gust,
    /// Clicked the ball outside the ring
    Missed,
    Confirmed,
    Expired,
}

#[derive(Debug)]
pub struct Pendulum {
    tuning: PendulumTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    gusts: bool,
    pivot: Vec2,
    angle: f32,
    angular_vel: f32,
    bob: Entity,
    events: Vec<PendulumEvent>,
}

impl Pendulum {
    pub fn new(tuning: PendulumTuning, settings: &Settings, seed: u64) -> Self {
        // Expiry is a timed transition; confirming jumps straight to Transition
        let table = vec![
            TimedTransition::new(Phase::Active, tuning.time_limit, Phase::Resolution),
            TimedTransition::new(Phase::Transition, tuning.confirm_delay, Phase::Terminal),
        ];
        let pivot = Vec2::new(PLAY_WIDTH * 0.5, 0.0);
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            gusts: settings.shocks_enabled(),
            pivot,
            angle: 0.0,
            angular_vel: 0.0,
            bob: Entity::circle(1, EntityKind::PendulumBob, pivot, tuning.bob_radius).with_color(BOB_COLOR),
            events: Vec::new(),
            tuning,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn bob(&self) -> &Entity {
        &self.bob
    }

    pub fn target(&self) -> Vec2 {
        self.pivot + Vec2::new(0.0, self.tuning.chain_length)
    }

    /// Ball center inside the target ring
    pub fn in_zone(&self) -> bool {
        point_in_radius(self.bob.pos(), self.target(), self.tuning.target_radius)
    }

    /// Seconds left on the clock
    pub fn time_left(&self) -> f32 {
        match self.phases.phase() {
            Phase::Idle | Phase::Intro => self.tuning.time_limit,
            Phase::Active => self.phases.remaining(self.tuning.time_limit),
            _ => 0.0,
        }
    }

    pub fn confirmed(&self) -> bool {
        self.phases.phase() >= Phase::Transition
    }

    pub fn taunt(&self) -> &'static str {
        let slot = (self.phases.elapsed() / TAUNT_PERIOD) as usize;
        TAUNTS[slot % TAUNTS.len()]
    }

    /// Try again after the timer ran out
    pub fn retry(&mut self) -> bool {
        if !self.phases.is(Phase::Resolution) {
            return false;
        }
        self.reset();
        true
    }

    pub fn take_events(&mut self) -> Vec<PendulumEvent> {
        std::mem::take(&mut self.events)
    }

    fn bob_position(&self, angle: f32) -> Vec2 {
        self.pivot + Vec2::new(angle.sin(), angle.cos()) * self.tuning.chain_length
    }

    fn swing(&mut self, dt: f32) {
        let t = &self.tuning;
        let accel = -(t.gravity / (t.chain_length / 100.0)) * self.angle.sin();
        (self.angle, self.angular_vel) = advance_angular(self.angle, self.angular_vel, accel, t.damping, dt);

        if self.gusts && self.emitter.chance(t.gust_chance) {
            self.angular_vel += self.emitter.jitter(t.gust_strength);
            self.events.push(PendulumEvent::Gust);
        }
        let left = self.phases.remaining(t.time_limit);
        if left < t.panic_time {
            self.angular_vel *= t.panic_factor;
        }
        if left < t.frenzy_time {
            self.angular_vel *= t.frenzy_factor;
        }
        let pos = self.bob_position(self.angle);
        place(&mut self.bob, pos);
    }
}

impl Scene for Pendulum {
    fn name(&self) -> &'static str {
        "pendulum"
    }

    fn start(&mut self) {
        let t = &self.tuning;
        let side = if self.emitter.chance(0.5) { 1.0 } else { -1.0 };
        self.angle = side * (t.start_angle + self.emitter.range(0.0, t.start_angle_spread));
        self.angular_vel = self.emitter.jitter(t.start_spin);
        let pos = self.bob_position(self.angle);
        place(&mut self.bob, pos);
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.input.clear();
        self.events.clear();
        self.angle = 0.0;
        self.angular_vel = 0.0;
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        if let Some(change) = self.phases.tick(dt) {
            if change.to == Phase::Resolution {
                log::info!("Pendulum timer expired");
                self.events.push(PendulumEvent::Expired);
            }
        }
        if !self.phases.is(Phase::Active) {
            self.input.take_clicks();
            return;
        }
        self.swing(dt);

        for click in self.input.take_clicks() {
            if !point_in_radius(click, self.bob.pos(), self.bob.radius()) {
                continue;
            }
            if self.in_zone() {
                self.phases.go(Phase::Transition);
                self.events.push(PendulumEvent::Confirmed);
                break;
            }
            self.events.push(PendulumEvent::Missed);
        }
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let target = self.target();
        let mut zones = vec![ZoneView::Circle {
            name: "target",
            x: target.x,
            y: target.y,
            r: self.tuning.target_radius,
            active: self.in_zone(),
        }];
        // Links drape along a partial angle
        let n = self.tuning.chain_links;
        zones.extend((1..=n).map(|i| {
            let frac = i as f32 / (n + 1) as f32;
            let a = self.angle * frac;
            let p = self.pivot + Vec2::new(a.sin(), a.cos()) * self.tuning.chain_length * frac;
            ZoneView::Circle {
                name: "link",
                x: p.x,
                y: p.y,
                r: LINK_RADIUS,
                active: false,
            }
        }));
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: vec![self.bob.view()],
            zones,
            narration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn calm() -> Settings {
        Settings {
            reduced_motion: true,
            ..Settings::default()
        }
    }

    fn hanging(tuning: PendulumTuning) -> Pendulum {
        let mut p = Pendulum::new(tuning, &calm(), 3);
        p.start();
        p.angle = 0.0;
        p.angular_vel = 0.0;
        p.step(SIM_DT);
        p
    }

    #[test]
    fn test_bob_stays_on_chain() {
        let mut p = Pendulum::new(PendulumTuning::default(), &Settings::default(), 8);
        p.start();
        let start = p.angle();
        assert!(start.abs() >= PendulumTuning::default().start_angle);
        for _ in 0..120 {
            p.step(SIM_DT);
            let len = p.bob().pos().distance(p.pivot);
            assert!((len - p.tuning.chain_length).abs() < 1e-2);
        }
        assert_ne!(p.angle(), start);
    }

    #[test]
    fn test_click_outside_ring_is_ignored() {
        let mut p = Pendulum::new(PendulumTuning::default(), &calm(), 3);
        p.start();
        p.angle = 1.2;
        p.angular_vel = 0.0;
        p.step(SIM_DT);
        assert!(!p.in_zone());
        let at = p.bob().pos();
        p.handle_input(InputEvent::Click { x: at.x, y: at.y });
        p.step(SIM_DT);
        assert_eq!(p.phase(), Phase::Active);
        assert!(p.take_events().contains(&PendulumEvent::Missed));
    }

    #[test]
    fn test_click_in_ring_confirms() {
        let mut p = hanging(PendulumTuning::default());
        assert!(p.in_zone());
        let at = p.target();
        p.handle_input(InputEvent::Click { x: at.x, y: at.y });
        p.step(SIM_DT);
        assert!(p.confirmed());
        assert_eq!(p.phase(), Phase::Transition);
        for _ in 0..40 {
            p.step(SIM_DT);
        }
        assert_eq!(p.phase(), Phase::Terminal);
        assert!(!p.retry());
    }

    #[test]
    fn test_timer_expires_and_retry_resets() {
        let mut p = hanging(PendulumTuning {
            time_limit: 1.0,
            ..PendulumTuning::default()
        });
        for _ in 0..61 {
            p.step(SIM_DT);
        }
        assert_eq!(p.phase(), Phase::Resolution);
        assert_eq!(p.time_left(), 0.0);
        assert!(p.take_events().contains(&PendulumEvent::Expired));

        // Clicking after time is up does nothing
        let at = p.target();
        p.handle_input(InputEvent::Click { x: at.x, y: at.y });
        p.step(SIM_DT);
        assert_eq!(p.phase(), Phase::Resolution);

        assert!(p.retry());
        assert_eq!(p.phase(), Phase::Active);
        assert!((p.time_left() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_has_ring_and_links() {
        let p = hanging(PendulumTuning::default());
        let snap = p.snapshot();
        assert_eq!(snap.zones.len(), 1 + p.tuning.chain_links);
        assert_eq!(snap.entities.len(), 1);
        assert!(snap.to_json().contains("\"target\""));
    }
}
