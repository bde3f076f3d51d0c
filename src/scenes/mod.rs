//! The mini-games
//!
//! Each scene is a [`Scene`](crate::sim::Scene) built only from the simulation
//! core: its own worlds, input state, phase machine and seeded emitter.

pub mod canvas;
pub mod catcher;
pub mod conveyor;
pub mod jump;
pub mod keyboard;
pub mod paint_pool;
pub mod palette;
pub mod pendulum;
pub mod word_drag;

pub use canvas::Canvas;
pub use catcher::Catcher;
pub use conveyor::Conveyor;
pub use jump::Jump;
pub use keyboard::Keyboard;
pub use paint_pool::PaintPool;
pub use palette::Palette;
pub use pendulum::Pendulum;
pub use word_drag::WordDrag;

use crate::sim::entity::Color;
use crate::sim::input::Key;

/// Parse a tuning color; bad input falls back to white
pub(crate) fn parse_color(hex: &str) -> Color {
    Color::from_hex(hex).unwrap_or_else(|| {
        log::warn!("Bad color {:?} in tuning, using white", hex);
        Color::WHITE
    })
}

/// Repeating timer on the simulation clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    period: f32,
    elapsed: f32,
}

impl Interval {
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }

    /// True on the step the period elapses; keeps the remainder for an even cadence
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.period {
            self.elapsed -= self.period;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Letters typed so far, matched against a keyword list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedWord {
    text: String,
}

impl TypedWord {
    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Exact keyword match, ignoring case and surrounding space
    pub fn matched<'a>(&self, keywords: &'a [String]) -> Option<&'a str> {
        let typed = self.text.trim().to_lowercase();
        keywords.iter().find(|k| k.as_str() == typed).map(String::as_str)
    }

    /// Keywords still reachable by typing more
    pub fn partial_matches<'a>(&self, keywords: &'a [String]) -> Vec<&'a str> {
        let typed = self.text.trim().to_lowercase();
        if typed.is_empty() {
            return Vec::new();
        }
        keywords
            .iter()
            .filter(|k| k.starts_with(typed.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Apply editing keys to a typed word: Backspace deletes, Enter confirms.
///
/// Returns the keyword when Enter lands on an exact match.
pub(crate) fn edit_word(word: &mut TypedWord, keys: &[Key], keywords: &[String]) -> Option<String> {
    let mut confirmed = None;
    for key in keys {
        match key {
            Key::Backspace => word.backspace(),
            Key::Enter => {
                confirmed = word.matched(keywords).map(str::to_string);
                if confirmed.is_some() {
                    break;
                }
            }
            _ => {}
        }
    }
    confirmed
}
