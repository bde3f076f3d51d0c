//! Fixed-step scheduler and the scene lifecycle
//!
//! The host calls [`SceneRunner::frame`] once per animation frame with the raw
//! frame time. Time is accumulated and consumed in `SIM_DT` steps, at most
//! `MAX_SUBSTEPS` per frame, so simulation speed never depends on frame rate.

use super::input::InputEvent;
use super::phase::Phase;
use super::world::Snapshot;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// One mini-game built on the core
pub trait Scene {
    /// Short identifier used in snapshots and logs
    fn name(&self) -> &'static str;
    /// Spawn the initial population and enter the first phase
    fn start(&mut self);
    /// Discard all collections and pending state
    fn stop(&mut self);
    /// Back to a fresh start (retry)
    fn reset(&mut self) {
        self.stop();
        self.start();
    }
    /// Record input for the next step; never mutates physics directly
    fn handle_input(&mut self, event: InputEvent);
    /// Advance by one fixed step
    fn step(&mut self, dt: f32);
    fn phase(&self) -> Phase;
    fn snapshot(&self) -> Snapshot;
}

/// Accumulator loop
#[derive(Debug, Clone)]
pub struct Scheduler {
    running: bool,
    accumulator: f32,
    step: f32,
    max_substeps: u32,
    ticks: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl Scheduler {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            running: false,
            accumulator: 0.0,
            step,
            max_substeps: max_substeps.max(1),
            ticks: 0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.accumulator = 0.0;
    }

    /// Halt; leftover time is dropped so a restart never replays it
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total fixed steps run since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Feed one frame of wall time and run the due fixed steps.
    ///
    /// Returns the number of steps run.
    pub fn frame(&mut self, frame_dt: f32, mut step: impl FnMut(f32)) -> u32 {
        if !self.running {
            return 0;
        }
        let dt = if frame_dt.is_finite() { frame_dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            step(self.step);
            self.accumulator -= self.step;
            self.ticks += 1;
            substeps += 1;
        }
        // Behind by more than the cap: drop the backlog instead of spiralling
        if substeps == self.max_substeps && self.accumulator >= self.step {
            self.accumulator = 0.0;
        }
        substeps
    }
}

/// Owns one scene and its scheduler
#[derive(Debug)]
pub struct SceneRunner<S: Scene> {
    scene: S,
    scheduler: Scheduler,
}

impl<S: Scene> SceneRunner<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            scheduler: Scheduler::default(),
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn start(&mut self) {
        log::info!("Starting scene {}", self.scene.name());
        self.scene.start();
        self.scheduler.start();
    }

    /// Halt the loop and discard the scene's collections
    pub fn stop(&mut self) {
        log::info!("Stopping scene {}", self.scene.name());
        self.scheduler.stop();
        self.scene.stop();
    }

    pub fn reset(&mut self) {
        log::info!("Resetting scene {}", self.scene.name());
        self.scheduler.stop();
        self.scene.reset();
        self.scheduler.start();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if self.scheduler.is_running() {
            self.scene.handle_input(event);
        }
    }

    /// Run one animation frame; returns the fixed steps taken
    pub fn frame(&mut self, frame_dt: f32) -> u32 {
        let scene = &mut self.scene;
        self.scheduler.frame(frame_dt, |dt| scene.step(dt))
    }

    /// Run `seconds` of simulated time in 60 Hz frames
    pub fn run_for(&mut self, seconds: f32) -> u32 {
        let frames = (seconds / SIM_DT).round().max(0.0) as u32;
        (0..frames).map(|_| self.frame(SIM_DT)).sum()
    }

    pub fn phase(&self) -> Phase {
        self.scene.phase()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.scene.snapshot()
    }
}
