//! Emitter: creates entities from bursts, schedules and sweeps
//!
//! All randomness flows through the emitter's seeded PCG so a fixed seed gives
//! a fixed sequence of spawns.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Color, Entity, EntityKind, Payload};
use super::field::PaintField;
use super::input::SweepDelta;
use crate::polar_to_cartesian;

/// Randomized radial burst (splash, splatter, explosion)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstParams {
    pub count_min: u32,
    pub count_max: u32,
    /// Launch speed range (units/s)
    pub speed_min: f32,
    pub speed_max: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub alpha_min: f32,
    pub alpha_max: f32,
    /// Extra upward velocity (units/s, +Y is down)
    pub upward_bias: f32,
    /// Life lost per second
    pub decay: f32,
}

/// Fan sweep that rips paint off a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    /// Sampling radius around the fan
    pub radius: f32,
    /// Sample every N cells
    pub sample_step: usize,
    /// Base push (units/s) at full strength and reference speed
    pub push_force: f32,
    /// Sweep magnitude that yields exactly `push_force`
    pub reference_speed: f32,
    /// Random scatter added to crumb velocity (units/s, full width)
    pub scatter: f32,
}

/// Seeded entity factory
#[derive(Debug, Clone)]
pub struct Emitter {
    rng: Pcg32,
    next_id: u32,
}

impl Emitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new spawn index
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Shared random source (shuffles, gusts, quakes)
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Uniform sample in `[lo, hi)`; returns `lo` for empty ranges
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo { self.rng.random_range(lo..hi) } else { lo }
    }

    /// Uniform integer in `[lo, hi]`
    pub fn count(&mut self, lo: u32, hi: u32) -> u32 {
        if hi > lo { self.rng.random_range(lo..=hi) } else { lo }
    }

    /// Symmetric jitter in `[-width/2, width/2)`
    pub fn jitter(&mut self, width: f32) -> f32 {
        (self.rng.random::<f32>() - 0.5) * width
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.random::<f32>() < p
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Spawn a radial burst of fading circles at `origin`
    pub fn burst(&mut self, kind: EntityKind, origin: Vec2, color: Color, params: &BurstParams) -> Vec<Entity> {
        let n = self.count(params.count_min, params.count_max);
        (0..n)
            .map(|_| {
                let angle = self.range(0.0, TAU);
                let speed = self.range(params.speed_min, params.speed_max);
                let vel = polar_to_cartesian(speed, angle) - Vec2::Y * params.upward_bias;
                let radius = self.range(params.radius_min, params.radius_max);
                let alpha = self.range(params.alpha_min, params.alpha_max);
                let id = self.next_id();
                Entity::circle(id, kind, origin, radius)
                    .with_velocity(vel)
                    .with_color(color)
                    .with_alpha(alpha)
                    .with_decay(params.decay)
            })
            .collect()
    }

    /// `regular` random picks from `pool` plus `hazards` bombs, shuffled
    pub fn payload_queue(&mut self, pool: &[Payload], regular: usize, hazards: usize) -> Vec<Payload> {
        let mut queue = Vec::with_capacity(regular + hazards);
        if !pool.is_empty() {
            for _ in 0..regular {
                let i = self.rng.random_range(0..pool.len());
                queue.push(pool[i].clone());
            }
        }
        queue.extend(std::iter::repeat_n(Payload::Hazard, hazards));
        self.shuffle(&mut queue);
        queue
    }

    /// Rip painted cells within the fan radius off `field` and turn them into crumbs.
    ///
    /// Crumb velocity follows the sweep direction, scaled by closeness to the
    /// fan and by sweep speed. Converted cells are cleared.
    pub fn sweep(&mut self, field: &mut PaintField, center: Vec2, delta: &SweepDelta, params: &SweepParams) -> Vec<Entity> {
        let r = params.radius;
        let step = params.sample_step.max(1) as i64;
        let x0 = (center.x - r).floor().max(0.0) as i64;
        let y0 = (center.y - r).floor().max(0.0) as i64;
        let x1 = ((center.x + r).ceil() as i64).min(field.width() as i64);
        let y1 = ((center.y + r).ceil() as i64).min(field.height() as i64);
        let speed_scale = delta.magnitude / params.reference_speed.max(f32::EPSILON);

        let mut crumbs = Vec::new();
        let mut y = y0;
        while y < y1 {
            let mut x = x0;
            while x < x1 {
                let cell_pos = Vec2::new(x as f32, y as f32);
                let dist = cell_pos.distance(center);
                let visible = field.cell(x, y).filter(|c| c[3] >= 10 && dist <= r);
                if let Some([cr, cg, cb, ca]) = visible {
                    let strength = 1.0 - dist / r;
                    let push = params.push_force * strength * speed_scale;
                    let vel = delta.dir * push + Vec2::new(self.jitter(params.scatter), self.jitter(params.scatter));
                    let size = step as f32 + self.range(0.0, 1.5);
                    let id = self.next_id();
                    crumbs.push(
                        Entity::rect(id, EntityKind::DustCrumb, cell_pos, Vec2::splat(size))
                            .with_velocity(vel)
                            .with_color(Color::rgb(cr, cg, cb))
                            .with_alpha(ca as f32 / 255.0),
                    );
                    for cy in y..(y + step).min(y1) {
                        for cx in x..(x + step).min(x1) {
                            field.set_cell(cx, cy, [0; 4]);
                        }
                    }
                }
                x += step;
            }
            y += step;
        }
        crumbs
    }
}

/// Emits one queued payload every `interval` seconds until the queue is empty
#[derive(Debug, Clone)]
pub struct SpawnSchedule<T> {
    queue: VecDeque<T>,
    interval: f32,
    since_last: f32,
    spawned: usize,
    total: usize,
}

impl<T> SpawnSchedule<T> {
    pub fn new(items: Vec<T>, interval: f32) -> Self {
        let total = items.len();
        Self {
            queue: items.into(),
            interval,
            since_last: 0.0,
            spawned: 0,
            total,
        }
    }

    /// Advance the schedule clock; yields the next payload when it is due
    pub fn tick(&mut self, dt: f32) -> Option<T> {
        if self.queue.is_empty() {
            return None;
        }
        self.since_last += dt.max(0.0);
        if self.since_last <= self.interval {
            return None;
        }
        self.since_last = 0.0;
        self.spawned += 1;
        self.queue.pop_front()
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }
}
