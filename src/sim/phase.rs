//! Scene phase sequencing
//!
//! Every mini-game walks the same forward-only chain. Timed steps (intro
//! length, success pause, transition delay) live in a table consumed by
//! [`PhaseMachine::tick`], so sequencing runs on the simulation clock.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a scene. Declaration order is the only legal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Created, not started
    Idle,
    /// Instructions / countdown
    Intro,
    /// Physics and input live
    Active,
    /// Outcome decided, physics settling
    Resolution,
    /// Waiting on or showing narration
    Narration,
    /// Leaving the scene
    Transition,
    /// Done for good
    Terminal,
}

/// Move from `from` to `to` once `after` seconds have passed in `from`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedTransition {
    pub from: Phase,
    pub after: f32,
    pub to: Phase,
}

impl TimedTransition {
    pub const fn new(from: Phase, after: f32, to: Phase) -> Self {
        Self { from, after, to }
    }
}

/// Reported on every accepted transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
}

/// Forward-only phase machine with a virtual clock
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    previous: Phase,
    /// Seconds spent in the current phase
    elapsed: f32,
    table: Vec<TimedTransition>,
    entered_this_tick: bool,
}

impl PhaseMachine {
    pub fn new(table: Vec<TimedTransition>) -> Self {
        Self {
            phase: Phase::Idle,
            previous: Phase::Idle,
            elapsed: 0.0,
            table,
            entered_this_tick: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn previous(&self) -> Phase {
        self.previous
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is(&self, phase: Phase) -> bool {
        self.phase == phase
    }

    /// True until the first tick after the last transition
    pub fn just_entered(&self) -> bool {
        self.entered_this_tick
    }

    /// Seconds left of a `duration`-long phase, never negative
    pub fn remaining(&self, duration: f32) -> f32 {
        (duration - self.elapsed).max(0.0)
    }

    /// Request a transition. Backward, repeated and post-terminal moves are refused.
    pub fn go(&mut self, next: Phase) -> Option<PhaseChange> {
        if next <= self.phase {
            log::debug!("Rejected phase change {:?} -> {:?}", self.phase, next);
            return None;
        }
        let change = PhaseChange {
            from: self.phase,
            to: next,
        };
        self.previous = std::mem::replace(&mut self.phase, next);
        self.elapsed = 0.0;
        self.entered_this_tick = true;
        log::info!("Phase {:?} -> {:?}", change.from, change.to);
        Some(change)
    }

    /// Advance the phase clock and fire at most one due timed transition
    pub fn tick(&mut self, dt: f32) -> Option<PhaseChange> {
        self.entered_this_tick = false;
        self.elapsed += dt.max(0.0);
        let due = self
            .table
            .iter()
            .find(|t| t.from == self.phase && self.elapsed >= t.after)
            .map(|t| t.to)?;
        self.go(due)
    }

    /// Back to `Idle` with the same table (retry)
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.previous = Phase::Idle;
        self.elapsed = 0.0;
        self.entered_this_tick = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> PhaseMachine {
        PhaseMachine::new(vec![
            TimedTransition::new(Phase::Intro, 3.0, Phase::Active),
            TimedTransition::new(Phase::Transition, 1.5, Phase::Terminal),
        ])
    }

    #[test]
    fn test_forward_only() {
        let mut m = machine();
        assert!(m.go(Phase::Active).is_some());
        assert!(m.go(Phase::Intro).is_none());
        assert!(m.go(Phase::Active).is_none());
        assert_eq!(m.phase(), Phase::Active);
        assert_eq!(m.previous(), Phase::Idle);
    }

    #[test]
    fn test_terminal_is_final() {
        let mut m = machine();
        m.go(Phase::Terminal);
        for p in [Phase::Idle, Phase::Active, Phase::Transition, Phase::Terminal] {
            assert!(m.go(p).is_none());
        }
        assert!(m.tick(100.0).is_none());
    }

    #[test]
    fn test_timed_transition_fires_once() {
        let mut m = machine();
        m.go(Phase::Intro);
        let mut changes = Vec::new();
        for _ in 0..400 {
            if let Some(c) = m.tick(1.0 / 60.0) {
                changes.push(c);
            }
        }
        assert_eq!(
            changes,
            vec![PhaseChange {
                from: Phase::Intro,
                to: Phase::Active
            }]
        );
        assert!(m.elapsed() > 3.0);
    }

    #[test]
    fn test_just_entered_lasts_one_tick() {
        let mut m = machine();
        m.go(Phase::Transition);
        assert!(m.just_entered());
        assert!(m.tick(0.1).is_none());
        assert!(!m.just_entered());
        assert!(m.tick(1.5).is_some());
        assert!(m.just_entered());
        assert!(m.is(Phase::Terminal));
    }

    #[test]
    fn test_reset_and_remaining() {
        let mut m = machine();
        m.go(Phase::Intro);
        m.tick(1.0);
        assert!((m.remaining(3.0) - 2.0).abs() < 1e-6);
        assert_eq!(m.remaining(0.5), 0.0);
        m.reset();
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.elapsed(), 0.0);
        assert!(m.go(Phase::Intro).is_some());
    }
}
