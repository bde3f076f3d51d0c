//! Drawing canvas with a fan instead of an eraser
//!
//! The brush paints smoothed strokes into a [`PaintField`]. The fan rips
//! painted cells off the field as crumbs that slide in the sweep direction
//! and only disappear once pushed past the edge. Submitting hands the field
//! image to the classifier and shows whatever it says.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::narration::{ClassifyError, Classifier, NarrationRequest, NarrationSlot};
use crate::polar_to_cartesian;
use crate::settings::Settings;
use crate::sim::emit::{Emitter, SweepParams};
use crate::sim::entity::Color;
use crate::sim::field::{Image, PaintField};
use crate::sim::input::{InputEvent, InputState, SweepTracker, push_along};
use crate::sim::integrate::{Forces, advance};
use crate::sim::phase::{Phase, PhaseMachine};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, World, ZoneView};
use crate::tuning::CanvasTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Brush,
    Fan,
}

#[derive(Debug)]
pub struct Canvas {
    tuning: CanvasTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    field: PaintField,
    crumbs: World,
    tool: Tool,
    color: Color,
    /// Last painted point and the smoothed pointer, while a stroke is open
    stroke: Option<(Vec2, Vec2)>,
    sweep: SweepTracker,
    sweep_params: SweepParams,
    narration: NarrationSlot,
}

impl Canvas {
    pub fn new(tuning: CanvasTuning, settings: &Settings, seed: u64) -> Self {
        let size = Vec2::new(tuning.width as f32, tuning.height as f32);
        let sweep_params = SweepParams {
            radius: tuning.fan_radius,
            sample_step: tuning.sample_step.max(settings.quality.sweep_step()),
            push_force: tuning.push_force,
            reference_speed: tuning.reference_speed,
            scatter: tuning.crumb_scatter,
        };
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(Vec::new()),
            field: PaintField::new(tuning.width, tuning.height),
            crumbs: World::new(Rect::from_origin_size(Vec2::ZERO, size), settings.max_particles()),
            tool: Tool::default(),
            color: Color::BLACK,
            stroke: None,
            sweep: SweepTracker::new(tuning.max_sweep),
            sweep_params,
            narration: NarrationSlot::new(),
            tuning,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switching tools ends any open stroke or sweep
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.stroke = None;
        self.sweep.release();
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn field(&self) -> &PaintField {
        &self.field
    }

    pub fn crumbs(&self) -> &World {
        &self.crumbs
    }

    pub fn narration(&self) -> &NarrationSlot {
        &self.narration
    }

    /// Wipe the drawing; loose crumbs keep sliding
    pub fn clear_drawing(&mut self) {
        self.field.clear();
        self.stroke = None;
    }

    /// Start a classification of the current drawing.
    ///
    /// The caller delivers the result through the returned request whenever the
    /// service answers. Refused while a request is outstanding.
    pub fn request_narration(&mut self) -> Result<(NarrationRequest, Image), ClassifyError> {
        let request = self.narration.request()?;
        self.phases.go(Phase::Narration);
        Ok((request, self.field.to_image()))
    }

    /// Classify synchronously and narrate the answer
    pub fn submit(&mut self, classifier: &dyn Classifier) -> Result<(), ClassifyError> {
        let (request, image) = self.request_narration()?;
        request.fulfil(classifier, &image);
        Ok(())
    }

    fn splatter(&mut self, at: Vec2) {
        let t = &self.tuning;
        let n = self.emitter.count(t.splatter_min, t.splatter_max);
        for _ in 0..n {
            let angle = self.emitter.range(0.0, TAU);
            let dist = self.emitter.range(t.splatter_distance.x, t.splatter_distance.y);
            let radius = self.emitter.range(t.splatter_radius.x, t.splatter_radius.y);
            self.field
                .paint_disc(at + polar_to_cartesian(dist, angle), radius, self.color, 255);
        }
    }

    fn draw(&mut self, cursor: Vec2) {
        let Some((last, smooth)) = self.stroke else {
            return;
        };
        let smooth = smooth + (cursor - smooth) * self.tuning.smoothing;
        self.field.stroke(last, smooth, self.tuning.brush_width, self.color);
        self.stroke = Some((smooth, smooth));
    }

    fn blow(&mut self, cursor: Vec2) {
        let Some(delta) = self.sweep.sample(cursor) else {
            return;
        };
        push_along(
            &mut self.crumbs.entities,
            cursor,
            &delta,
            self.tuning.nearby_radius,
            self.tuning.nearby_push,
        );
        let ripped = self.emitter.sweep(&mut self.field, cursor, &delta, &self.sweep_params);
        self.crumbs.adopt(ripped);
    }

    fn slide_crumbs(&mut self, dt: f32) {
        let (damping, jitter) = (self.tuning.crumb_damping, self.tuning.crumb_jitter);
        for crumb in self.crumbs.entities.iter_mut() {
            let wobble = Vec2::new(self.emitter.jitter(jitter), self.emitter.jitter(jitter));
            advance(crumb, dt, &Forces::NONE.with_damping(damping).with_impulse(wobble));
        }
        self.crumbs.reap(self.tuning.crumb_margin);
    }
}

impl Scene for Canvas {
    fn name(&self) -> &'static str {
        "canvas"
    }

    fn start(&mut self) {
        self.phases.go(Phase::Active);
    }

    fn stop(&mut self) {
        self.field.clear();
        self.crumbs.clear();
        self.input.clear();
        self.stroke = None;
        self.sweep.release();
        self.narration.clear();
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        self.phases.tick(dt);
        if self.phases.is(Phase::Idle) {
            return;
        }
        let drawing = self.phases.is(Phase::Active);

        for press in self.input.take_presses() {
            if !drawing {
                continue;
            }
            match self.tool {
                Tool::Brush => {
                    self.stroke = Some((press, press));
                    self.splatter(press);
                }
                Tool::Fan => {
                    self.sweep.release();
                    self.sweep.sample(press);
                }
            }
        }
        let cursor = self.input.cursor().filter(|_| drawing && self.input.is_pressed());
        if let Some(cursor) = cursor {
            match self.tool {
                Tool::Brush => self.draw(cursor),
                Tool::Fan => self.blow(cursor),
            }
        }
        if self.input.take_release() {
            self.stroke = None;
            self.sweep.release();
        }

        self.slide_crumbs(dt);
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let zone = ZoneView::Rect {
            name: "canvas",
            x: 0.0,
            y: 0.0,
            w: self.tuning.width as f32,
            h: self.tuning.height as f32,
            active: self.phases.is(Phase::Active),
        };
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: self.crumbs.views().collect(),
            zones: vec![zone],
            narration: self.narration.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::narration::{ERROR_TEXT, Label};
    use crate::sim::entity::{Entity, EntityKind};

    struct Always(Result<Label, ClassifyError>);

    impl Classifier for Always {
        fn classify(&self, _image: &Image) -> Result<Label, ClassifyError> {
            self.0.clone()
        }
    }

    fn canvas() -> Canvas {
        let mut c = Canvas::new(CanvasTuning::default(), &Settings::default(), 9);
        c.start();
        c
    }

    #[test]
    fn test_brush_paints_stroke_and_splatter() {
        let mut c = canvas();
        c.handle_input(InputEvent::PointerDown { x: 100.0, y: 100.0 });
        c.step(SIM_DT);
        let dots = c.field().painted_cells();
        assert!(dots > 0);

        c.handle_input(InputEvent::PointerMove { x: 200.0, y: 100.0 });
        for _ in 0..30 {
            c.step(SIM_DT);
        }
        assert_eq!(c.field().cell(150, 100).map(|p| p[3]), Some(255));
        assert!(c.field().painted_cells() > dots);

        // Released pointer stops painting
        c.handle_input(InputEvent::PointerUp { x: 200.0, y: 100.0 });
        c.step(SIM_DT);
        let painted = c.field().painted_cells();
        c.handle_input(InputEvent::PointerMove { x: 200.0, y: 300.0 });
        c.step(SIM_DT);
        assert_eq!(c.field().painted_cells(), painted);
    }

    #[test]
    fn test_fan_turns_paint_into_crumbs() {
        let mut c = canvas();
        c.field.paint_disc(Vec2::new(120.0, 150.0), 12.0, Color::rgb(200, 30, 30), 255);
        let before = c.field().painted_cells();
        c.set_tool(Tool::Fan);
        c.handle_input(InputEvent::PointerDown { x: 100.0, y: 150.0 });
        c.step(SIM_DT);
        // First sample only primes the sweep
        assert_eq!(c.crumbs().active_count(), 0);

        c.handle_input(InputEvent::PointerMove { x: 110.0, y: 150.0 });
        c.step(SIM_DT);
        assert!(c.crumbs().active_count() > 0);
        assert!(c.field().painted_cells() < before);
        assert!(c.crumbs().active().all(|e| e.kind == EntityKind::DustCrumb));
    }

    #[test]
    fn test_crumbs_die_past_the_edge() {
        let mut c = canvas();
        let crumb = Entity::rect(1, EntityKind::DustCrumb, Vec2::new(478.0, 100.0), Vec2::splat(2.0))
            .with_velocity(Vec2::new(600.0, 0.0));
        let stuck = Entity::rect(2, EntityKind::DustCrumb, Vec2::new(240.0, 180.0), Vec2::splat(2.0));
        c.crumbs.adopt(vec![crumb, stuck]);
        for _ in 0..10 {
            c.step(SIM_DT);
        }
        let left: Vec<u32> = c.crumbs().active().map(|e| e.id).collect();
        assert_eq!(left, vec![2]);
    }

    #[test]
    fn test_submit_narrates_and_refuses_twice() {
        let mut c = canvas();
        c.submit(&Always(Ok(Label::Known("A cat".into())))).unwrap();
        assert_eq!(c.phase(), Phase::Narration);
        assert_eq!(c.snapshot().narration.as_deref(), Some("A cat"));

        let (pending, _image) = c.request_narration().unwrap();
        assert_eq!(c.submit(&Always(Ok(Label::Unknown))).unwrap_err(), ClassifyError::Busy);
        assert!(pending.complete(Err(ClassifyError::Request("offline".into()))));
        assert_eq!(c.narration().text().as_deref(), Some(ERROR_TEXT));
    }

    #[test]
    fn test_no_drawing_after_submit() {
        let mut c = canvas();
        c.submit(&Always(Ok(Label::Unknown))).unwrap();
        c.handle_input(InputEvent::PointerDown { x: 50.0, y: 50.0 });
        c.step(SIM_DT);
        assert_eq!(c.field().painted_cells(), 0);

        c.reset();
        assert_eq!(c.phase(), Phase::Active);
        assert_eq!(c.narration().text(), None);
    }
}
