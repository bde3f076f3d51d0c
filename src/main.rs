//! Design Disaster headless demo
//!
//! Runs every mini-game on virtual time with a short scripted input and logs
//! how far each one got. Pass a tuning JSON path as the first argument to try
//! balance overrides. Set `RUST_LOG=debug` for the full trace.

use design_disaster::narration::{Classifier, ClassifyError, Label};
use design_disaster::scenes::{Canvas, Catcher, Conveyor, Jump, Keyboard, PaintPool, Palette, Pendulum, WordDrag};
use design_disaster::sim::{Image, InputEvent, Key, Phase, Scene, SceneRunner};
use design_disaster::{Settings, Tuning};

const SEED: u64 = 0x00D1_5A57;

/// Scripted input: fire `event` once `at` seconds have passed
type Script = Vec<(f32, InputEvent)>;

/// Calls anything with enough paint a pizza
struct PaintCounter;

impl Classifier for PaintCounter {
    fn classify(&self, image: &Image) -> Result<Label, ClassifyError> {
        let painted = image.rgba.chunks_exact(4).filter(|px| px[3] > 0).count();
        match painted {
            0 => Err(ClassifyError::Empty),
            n if n > 500 => Ok(Label::Known("A pizza, probably".to_string())),
            _ => Ok(Label::Unknown),
        }
    }
}

fn load_tuning() -> Tuning {
    let Some(path) = std::env::args().nth(1) else {
        return Tuning::default();
    };
    let loaded = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::error!("Could not load tuning from {}: {}", path, e);
            Tuning::default()
        }
    }
}

/// Run a scene for `seconds`, feeding the script in order
fn play<S: Scene>(runner: &mut SceneRunner<S>, mut script: Script, seconds: f32) -> Phase {
    script.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut script = script.into_iter().peekable();
    let mut clock = 0.0;
    runner.start();
    while clock < seconds {
        while let Some((_, event)) = script.next_if(|(at, _)| *at <= clock) {
            runner.handle_input(event);
        }
        runner.run_for(0.1);
        clock += 0.1;
    }
    let phase = runner.phase();
    log::info!("{} finished the demo in {:?}", runner.scene().name(), phase);
    phase
}

/// Clicks along a row, then Enter
fn poke_row(y: f32, at: f32) -> Script {
    (0..6)
        .map(|i| click(at + i as f32 * 0.3, 150.0 + i as f32 * 120.0, y))
        .chain([(at + 2.0, InputEvent::KeyDown(Key::Enter))])
        .collect()
}

fn click(at: f32, x: f32, y: f32) -> (f32, InputEvent) {
    (at, InputEvent::Click { x, y })
}

fn main() {
    env_logger::init();
    log::info!("Design Disaster (native) starting...");

    let tuning = load_tuning();
    let settings = Settings::default();
    let mut results = Vec::new();

    let mut pool = SceneRunner::new(PaintPool::new(tuning.paint_pool.clone(), &settings, SEED));
    let phase = play(&mut pool, vec![click(1.0, 500.0, 350.0)], 4.0);
    results.push(("paint_pool", phase, format!("{:?}", pool.scene().selected())));

    let mut palette = SceneRunner::new(Palette::new(tuning.palette.clone(), &settings, SEED));
    let chops = (0..3).map(|i| click(1.0 + i as f32 * 0.1, 500.0, 350.0)).collect();
    let phase = play(&mut palette, chops, 3.0);
    results.push(("palette", phase, format!("{:?}", palette.scene().selected())));

    let mut canvas = SceneRunner::new(Canvas::new(tuning.canvas.clone(), &settings, SEED));
    let stroke = (0..20)
        .map(|i| {
            let x = 200.0 + i as f32 * 15.0;
            (0.5 + i as f32 * 0.05, InputEvent::PointerMove { x, y: 200.0 })
        })
        .chain([
            (0.45, InputEvent::PointerDown { x: 200.0, y: 200.0 }),
            (1.6, InputEvent::PointerUp { x: 500.0, y: 200.0 }),
        ])
        .collect();
    play(&mut canvas, stroke, 2.0);
    if let Err(e) = canvas.scene_mut().submit(&PaintCounter) {
        log::warn!("Canvas narration refused: {}", e);
    }
    results.push(("canvas", canvas.phase(), canvas.scene().narration().text().unwrap_or_default()));

    let mut pendulum = SceneRunner::new(Pendulum::new(tuning.pendulum.clone(), &settings, SEED));
    let phase = play(&mut pendulum, vec![click(2.0, 500.0, 320.0)], 16.0);
    results.push(("pendulum", phase, pendulum.scene().taunt().to_string()));

    let mut jump = SceneRunner::new(Jump::new(tuning.jump.clone(), &settings, SEED));
    let hops = (0..4).map(|i| click(0.5 + i as f32 * 2.0, 800.0, 300.0)).collect();
    let phase = play(&mut jump, hops, 10.0);
    results.push(("jump", phase, format!("{} button landings", jump.scene().attempts())));

    let mut catcher = SceneRunner::new(Catcher::new(tuning.catcher.clone(), &settings, SEED));
    let phase = play(&mut catcher, Vec::new(), 40.0);
    results.push(("catcher", phase, catcher.scene().narration().text().unwrap_or_default()));

    let mut keyboard = SceneRunner::new(Keyboard::new(tuning.keyboard.clone(), &settings, SEED));
    let phase = play(&mut keyboard, poke_row(600.0, 1.0), 5.0);
    results.push(("keyboard", phase, format!("typed {:?}", keyboard.scene().typed())));

    let mut conveyor = SceneRunner::new(Conveyor::new(tuning.conveyor.clone(), &settings, SEED));
    let phase = play(&mut conveyor, poke_row(70.0, 1.0), 5.0);
    results.push(("conveyor", phase, format!("typed {:?}", conveyor.scene().typed())));

    let mut word_drag = SceneRunner::new(WordDrag::new(tuning.word_drag.clone(), &settings, SEED));
    let phase = play(&mut word_drag, Vec::new(), 8.0);
    results.push(("word_drag", phase, word_drag.scene().sentence()));

    for (name, phase, outcome) in results {
        log::info!("{:<12} {:<12} {}", name, format!("{:?}", phase), outcome);
    }
}
