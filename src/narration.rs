//! Narration: the bridge to the external classification service
//!
//! The service runs outside the simulation tick. A scene hands out a one-shot
//! [`NarrationRequest`]; whoever talks to the service completes it later, and
//! the only thing that ever comes back into the scene is a string in its
//! [`NarrationSlot`]. Physics state is never touched by a result.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::sim::field::Image;

/// Shown before any result arrives
pub const PLACEHOLDER: &str = "___";
/// Shown when the service could not tell what was drawn
pub const UNKNOWN_TEXT: &str = "Unknown";
/// Shown when the service failed
pub const ERROR_TEXT: &str = "Error: try again";

/// Classification service failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("classifier is busy with another request")]
    Busy,
    #[error("classification request failed: {0}")]
    Request(String),
    #[error("classifier returned an empty answer")]
    Empty,
}

/// What the service thinks the image shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Known(String),
    Unknown,
}

/// External image classifier
pub trait Classifier {
    fn classify(&self, image: &Image) -> Result<Label, ClassifyError>;
}

/// Map a service answer to narration text; failures degrade to a fallback
pub fn narrate(result: Result<Label, ClassifyError>) -> String {
    match result {
        Ok(Label::Known(text)) => {
            let text = text.trim();
            if text.is_empty() { UNKNOWN_TEXT.to_string() } else { text.to_string() }
        }
        Ok(Label::Unknown) => UNKNOWN_TEXT.to_string(),
        Err(err) => {
            log::warn!("Classification failed, using fallback narration: {}", err);
            ERROR_TEXT.to_string()
        }
    }
}

/// Review line for the items a player collected
pub fn order_review(names: &[String]) -> String {
    match names {
        [] => "Your tray is empty. Bold choice.".to_string(),
        [one] => format!("You ordered: {}. Just that.", one),
        _ => format!("You ordered: {}.", names.join(", ")),
    }
}

#[derive(Debug, Default)]
struct SlotState {
    text: Option<String>,
    pending: bool,
    /// Bumped on clear so results of abandoned requests are dropped
    generation: u64,
}

/// Shared, single-threaded narration cell owned by a scene
#[derive(Debug, Clone, Default)]
pub struct NarrationSlot(Rc<RefCell<SlotState>>);

impl NarrationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current narration, if any has arrived
    pub fn text(&self) -> Option<String> {
        self.0.borrow().text.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().pending
    }

    /// Write narration directly (locally generated text)
    pub fn set(&self, text: impl Into<String>) {
        self.0.borrow_mut().text = Some(text.into());
    }

    /// Start a request. Refused with [`ClassifyError::Busy`] while one is outstanding.
    pub fn request(&self) -> Result<NarrationRequest, ClassifyError> {
        let mut state = self.0.borrow_mut();
        if state.pending {
            return Err(ClassifyError::Busy);
        }
        state.pending = true;
        Ok(NarrationRequest {
            slot: self.clone(),
            generation: state.generation,
        })
    }

    /// Drop text and orphan any outstanding request (scene stop/reset)
    pub fn clear(&self) {
        let mut state = self.0.borrow_mut();
        state.text = None;
        state.pending = false;
        state.generation += 1;
    }
}

/// One-shot completion handle; consumed by [`NarrationRequest::complete`].
///
/// Dropping it unfinished frees the slot for the next request.
#[derive(Debug)]
#[must_use = "a dropped request never delivers narration"]
pub struct NarrationRequest {
    slot: NarrationSlot,
    generation: u64,
}

impl NarrationRequest {
    /// Deliver the service result. Returns false if the slot was cleared meanwhile.
    pub fn complete(self, result: Result<Label, ClassifyError>) -> bool {
        let mut state = self.slot.0.borrow_mut();
        if state.generation != self.generation {
            log::debug!("Dropping narration for an abandoned request");
            return false;
        }
        state.pending = false;
        state.text = Some(narrate(result));
        true
    }

    /// Run a classifier synchronously against `image` and deliver its answer
    pub fn fulfil(self, classifier: &dyn Classifier, image: &Image) -> bool {
        let result = classifier.classify(image);
        self.complete(result)
    }
}

impl Drop for NarrationRequest {
    fn drop(&mut self) {
        let Ok(mut state) = self.slot.0.try_borrow_mut() else {
            return;
        };
        if state.generation == self.generation {
            state.pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Label, ClassifyError>);

    impl Classifier for Fixed {
        fn classify(&self, _image: &Image) -> Result<Label, ClassifyError> {
            self.0.clone()
        }
    }

    fn image() -> Image {
        Image {
            width: 1,
            height: 1,
            rgba: vec![0; 4],
        }
    }

    #[test]
    fn test_narrate_fallbacks() {
        assert_eq!(narrate(Ok(Label::Known(" Pizza \n".into()))), "Pizza");
        assert_eq!(narrate(Ok(Label::Known("".into()))), UNKNOWN_TEXT);
        assert_eq!(narrate(Ok(Label::Unknown)), UNKNOWN_TEXT);
        assert_eq!(narrate(Err(ClassifyError::Request("timeout".into()))), ERROR_TEXT);
    }

    #[test]
    fn test_request_is_one_shot_and_exclusive() {
        let slot = NarrationSlot::new();
        let req = slot.request().unwrap();
        assert_eq!(slot.request().unwrap_err(), ClassifyError::Busy);
        assert!(slot.is_pending());
        assert!(req.fulfil(&Fixed(Ok(Label::Known("Burger".into()))), &image()));
        assert_eq!(slot.text().as_deref(), Some("Burger"));
        assert!(!slot.is_pending());
        assert!(slot.request().is_ok());
    }

    #[test]
    fn test_cleared_slot_ignores_late_result() {
        let slot = NarrationSlot::new();
        let req = slot.request().unwrap();
        slot.clear();
        assert!(!req.complete(Err(ClassifyError::Empty)));
        assert_eq!(slot.text(), None);
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_abandoned_request_frees_slot() {
        let slot = NarrationSlot::new();
        drop(slot.request().unwrap());
        assert!(!slot.is_pending());
        let req = slot.request().unwrap();
        assert!(req.complete(Ok(Label::Known("Soup".into()))));
        assert_eq!(slot.text().as_deref(), Some("Soup"));
    }

    #[test]
    fn test_stale_request_drop_keeps_newer_one_pending() {
        let slot = NarrationSlot::new();
        let stale = slot.request().unwrap();
        slot.clear();
        let fresh = slot.request().unwrap();
        drop(stale);
        assert!(slot.is_pending());
        assert!(fresh.complete(Err(ClassifyError::Empty)));
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_order_review() {
        assert!(order_review(&[]).contains("empty"));
        let names = vec!["Egg".to_string(), "Milk".to_string()];
        assert_eq!(order_review(&names), "You ordered: Egg, Milk.");
    }
}
