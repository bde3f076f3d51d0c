//! Domain events produced by the resolver, plus the collected set they feed

use glam::Vec2;
use serde::Serialize;

use super::entity::{Color, Payload};

/// Something the resolver decided this tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    /// Entity landed in a catch zone
    Caught { id: u32, payload: Payload },
    /// Entity left the play area uncaught
    Missed { id: u32 },
    /// `absorbed` was folded into `survivor`
    Merged { survivor: u32, absorbed: u32, color: Color },
    /// Entity destroyed in place (explosion, splash)
    Popped { id: u32, pos: Vec2, color: Color },
}

/// What the catcher has collected so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedSet {
    items: Vec<Payload>,
}

impl CollectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a caught payload: hazards wipe the set, anything else adds one entry.
    ///
    /// Returns true when the set was wiped.
    pub fn apply(&mut self, payload: &Payload) -> bool {
        if payload.is_hazard() {
            log::info!("Hazard caught, dropping {} collected items", self.items.len());
            self.items.clear();
            true
        } else {
            self.items.push(payload.clone());
            false
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Payload] {
        &self.items
    }

    /// Display names, in catch order
    pub fn names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|p| match p {
                Payload::Ingredient { name, .. } => Some(name.clone()),
                Payload::Glyph(c) => Some(c.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_adds_exactly_one() {
        let mut set = CollectedSet::new();
        assert!(!set.apply(&Payload::ingredient("egg", "Egg")));
        assert!(!set.apply(&Payload::ingredient("egg", "Egg")));
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["Egg".to_string(), "Egg".to_string()]);
    }

    #[test]
    fn test_hazard_empties_set() {
        let mut set = CollectedSet::new();
        for _ in 0..5 {
            set.apply(&Payload::ingredient("flour", "Flour"));
        }
        assert!(set.apply(&Payload::Hazard));
        assert!(set.is_empty());
        // A hazard on an empty set is still a wipe
        assert!(set.apply(&Payload::Hazard));
        assert!(set.is_empty());
    }
}
