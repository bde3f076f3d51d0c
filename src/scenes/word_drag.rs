//! Word-drag order puzzle
//!
//! The chef's speech bubble has one slot per word of a fixed sentence and the
//! words sit shuffled in a tray below. Dragging a word onto its own empty slot
//! fills it. Every few seconds a filled slot spits its word back into the tray.

use glam::Vec2;

use crate::consts::PLAY_WIDTH;
use crate::settings::Settings;
use crate::sim::collision::point_in_rect;
use crate::sim::emit::Emitter;
use crate::sim::input::{InputEvent, InputState};
use crate::sim::phase::{Phase, PhaseMachine, TimedTransition};
use crate::sim::scheduler::Scene;
use crate::sim::shape::Rect;
use crate::sim::world::{Snapshot, ZoneView};
use crate::tuning::WordDragTuning;

use super::Interval;

const SLOT_ROW_Y: f32 = 220.0;
const TRAY_ROW_Y: f32 = 560.0;
const SLOT_GAP: f32 = 12.0;
const CARD_GAP: f32 = 16.0;
const BLANK: &str = "____";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordDragEvent {
    Picked(String),
    Placed { slot: usize, word: String },
    /// Wrong word or slot already taken
    Rejected { slot: usize },
    Displaced { slot: usize, word: String },
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub word: String,
    pub rect: Rect,
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Card {
    word: String,
    placed: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Drag {
    card: usize,
    at: Vec2,
}

#[derive(Debug)]
pub struct WordDrag {
    tuning: WordDragTuning,
    emitter: Emitter,
    input: InputState,
    phases: PhaseMachine,
    slots: Vec<Slot>,
    /// Tray order; placed cards keep their spot but are hidden
    tray: Vec<Card>,
    drag: Option<Drag>,
    displace: Interval,
    events: Vec<WordDragEvent>,
}

impl WordDrag {
    pub fn new(tuning: WordDragTuning, _settings: &Settings, seed: u64) -> Self {
        let table = vec![
            TimedTransition::new(Phase::Intro, tuning.intro, Phase::Active),
            TimedTransition::new(Phase::Resolution, tuning.success_time, Phase::Transition),
            TimedTransition::new(Phase::Transition, tuning.transition_time, Phase::Terminal),
        ];
        Self {
            emitter: Emitter::new(seed),
            input: InputState::new(),
            phases: PhaseMachine::new(table),
            slots: Self::layout_slots(&tuning),
            tray: Vec::new(),
            drag: None,
            displace: Interval::new(tuning.displace_interval),
            events: Vec::new(),
            tuning,
        }
    }

    fn layout_slots(tuning: &WordDragTuning) -> Vec<Slot> {
        let n = tuning.sentence.len() as f32;
        let size = tuning.slot_size;
        let row = n * size.x + (n - 1.0).max(0.0) * SLOT_GAP;
        let left = (PLAY_WIDTH - row) * 0.5;
        tuning
            .sentence
            .iter()
            .enumerate()
            .map(|(i, word)| Slot {
                word: word.clone(),
                rect: Rect::from_origin_size(Vec2::new(left + i as f32 * (size.x + SLOT_GAP), SLOT_ROW_Y), size),
                filled: false,
            })
            .collect()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Words still in the tray, in tray order, with where each card sits
    pub fn tray(&self) -> Vec<(&str, Rect)> {
        let waiting: Vec<&Card> = self.tray.iter().filter(|c| !c.placed).collect();
        let size = self.tuning.card_size;
        let n = waiting.len() as f32;
        let row = n * size.x + (n - 1.0).max(0.0) * CARD_GAP;
        let left = (PLAY_WIDTH - row) * 0.5;
        waiting
            .into_iter()
            .enumerate()
            .map(|(i, card)| {
                let origin = Vec2::new(left + i as f32 * (size.x + CARD_GAP), TRAY_ROW_Y);
                (card.word.as_str(), Rect::from_origin_size(origin, size))
            })
            .collect()
    }

    /// Word being dragged and where it is
    pub fn dragging(&self) -> Option<(&str, Vec2)> {
        let drag = self.drag.as_ref()?;
        Some((self.tray[drag.card].word.as_str(), drag.at))
    }

    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|s| s.filled)
    }

    /// The sentence so far, blanks for empty slots
    pub fn sentence(&self) -> String {
        self.slots
            .iter()
            .map(|s| if s.filled { s.word.as_str() } else { BLANK })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn take_events(&mut self) -> Vec<WordDragEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop `word` on a slot. Only its own empty slot takes it.
    pub fn try_place(&mut self, slot: usize, word: &str) -> bool {
        if !self.phases.is(Phase::Active) {
            return false;
        }
        let Some(target) = self.slots.get_mut(slot) else {
            return false;
        };
        let Some(card) = self.tray.iter_mut().find(|c| c.word == word && !c.placed) else {
            return false;
        };
        if target.filled || target.word != word {
            self.events.push(WordDragEvent::Rejected { slot });
            return false;
        }
        target.filled = true;
        card.placed = true;
        self.events.push(WordDragEvent::Placed {
            slot,
            word: word.to_string(),
        });

        if self.is_complete() {
            log::info!("Sentence complete: {}", self.sentence());
            self.events.push(WordDragEvent::Completed);
            self.drag = None;
            self.phases.go(Phase::Resolution);
        }
        true
    }

    /// Kick one filled slot back to the tray and swap one adjacent tray pair
    fn displace_one(&mut self) {
        let filled: Vec<usize> = (0..self.slots.len()).filter(|&i| self.slots[i].filled).collect();
        if filled.is_empty() {
            return;
        }
        let pick = filled[self.emitter.count(0, filled.len() as u32 - 1) as usize];
        let slot = &mut self.slots[pick];
        slot.filled = false;
        let word = slot.word.clone();
        if let Some(card) = self.tray.iter_mut().find(|c| c.word == word && c.placed) {
            card.placed = false;
        }
        self.nudge_tray();
        log::debug!("Displaced {:?} from slot {}", word, pick);
        self.events.push(WordDragEvent::Displaced { slot: pick, word });
    }

    fn nudge_tray(&mut self) {
        if self.tray.len() < 2 {
            return;
        }
        // A dragged card is tracked by index
        if self.drag.is_some() {
            return;
        }
        let i = self.emitter.count(0, self.tray.len() as u32 - 2) as usize;
        self.tray.swap(i, i + 1);
    }

    fn pick_up(&mut self, at: Vec2) {
        let Some(word) = self
            .tray()
            .into_iter()
            .find(|(_, rect)| point_in_rect(at, rect))
            .map(|(word, _)| word.to_string())
        else {
            return;
        };
        let Some(card) = self.tray.iter().position(|c| c.word == word && !c.placed) else {
            return;
        };
        self.drag = Some(Drag { card, at });
        self.events.push(WordDragEvent::Picked(word));
    }

    fn drop_card(&mut self, at: Option<Vec2>) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        // Off-target or off-screen drops go back to the tray
        let Some(slot) = at.and_then(|p| self.slots.iter().position(|s| point_in_rect(p, &s.rect))) else {
            return;
        };
        let word = self.tray[drag.card].word.clone();
        self.try_place(slot, &word);
    }
}

impl Scene for WordDrag {
    fn name(&self) -> &'static str {
        "word_drag"
    }

    fn start(&mut self) {
        self.tray = self
            .tuning
            .sentence
            .iter()
            .map(|w| Card {
                word: w.clone(),
                placed: false,
            })
            .collect();
        self.emitter.shuffle(&mut self.tray);
        self.phases.go(Phase::Intro);
    }

    fn stop(&mut self) {
        self.input.clear();
        self.events.clear();
        self.tray.clear();
        self.drag = None;
        for slot in &mut self.slots {
            slot.filled = false;
        }
        self.displace.reset();
        self.phases.reset();
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    fn step(&mut self, dt: f32) {
        self.phases.tick(dt);
        let presses = self.input.take_presses();
        let released = self.input.take_release();
        if !self.phases.is(Phase::Active) {
            return;
        }

        if self.drag.is_none() {
            if let Some(&at) = presses.last() {
                self.pick_up(at);
            }
        }
        if let (Some(drag), Some(cursor)) = (self.drag.as_mut(), self.input.cursor()) {
            drag.at = cursor;
        }
        if released {
            self.drop_card(self.input.cursor());
        }

        if self.phases.is(Phase::Active) && self.displace.tick(dt) {
            self.displace_one();
        }
    }

    fn phase(&self) -> Phase {
        self.phases.phase()
    }

    fn snapshot(&self) -> Snapshot {
        let mut zones: Vec<ZoneView> = self
            .slots
            .iter()
            .map(|s| ZoneView::Rect {
                name: "slot",
                x: s.rect.min.x,
                y: s.rect.min.y,
                w: s.rect.width(),
                h: s.rect.height(),
                active: s.filled,
            })
            .collect();
        let dragged = self.dragging().map(|(word, _)| word);
        let size = self.tuning.card_size;
        for (word, rect) in self.tray() {
            let held = dragged == Some(word);
            let rect = match self.drag.as_ref().filter(|_| held) {
                Some(drag) => Rect::from_center_size(drag.at, size),
                None => rect,
            };
            zones.push(ZoneView::Rect {
                name: "card",
                x: rect.min.x,
                y: rect.min.y,
                w: rect.width(),
                h: rect.height(),
                active: held,
            });
        }
        Snapshot {
            scene: self.name(),
            phase: self.phase(),
            entities: Vec::new(),
            zones,
            narration: (self.phases.phase() >= Phase::Active).then(|| self.sentence()),
        }
    }
}
