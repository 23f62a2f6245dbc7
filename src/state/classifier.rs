//! Gesture classifier
//!
//! Samples the hold/action levels once per step over a short validation
//! window and resolves them to a single `Intent`. The window absorbs the
//! frame or two between two presses a player means as simultaneous.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::input::GestureState;

/// Classified outcome of a validation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Everything was released before the window finished
    None,
    /// Camera raised, no shutter: flash only
    HoldOnly,
    /// Shutter without raising: photo, no flash
    ActionOnly,
    /// Both together: photo with flash
    Both,
}

impl Intent {
    /// Side effects this intent asks the sequencer for
    pub fn plan(self) -> Option<ActionPlan> {
        match self {
            Intent::None => None,
            Intent::HoldOnly => Some(ActionPlan {
                do_photo: false,
                do_flash: true,
            }),
            Intent::ActionOnly => Some(ActionPlan {
                do_photo: true,
                do_flash: false,
            }),
            Intent::Both => Some(ActionPlan {
                do_photo: true,
                do_flash: true,
            }),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::None => write!(f, "None"),
            Intent::HoldOnly => write!(f, "HoldOnly"),
            Intent::ActionOnly => write!(f, "ActionOnly"),
            Intent::Both => write!(f, "Both"),
        }
    }
}

/// What a sequence should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub do_photo: bool,
    pub do_flash: bool,
}

/// Step-driven validation window
#[derive(Debug)]
pub struct GestureClassifier {
    validation_steps: u32,
    /// Steps elapsed in the running window, `None` when idle
    elapsed: Option<u32>,
}

impl GestureClassifier {
    pub fn new(validation_steps: u32) -> Self {
        Self {
            validation_steps: validation_steps.max(1),
            elapsed: None,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.elapsed.is_some()
    }

    /// Open a window. A window that is already running keeps going.
    pub fn begin(&mut self) -> bool {
        if self.elapsed.is_some() {
            return false;
        }
        self.elapsed = Some(0);
        true
    }

    /// Drop the running window without an outcome
    pub fn abort(&mut self) {
        self.elapsed = None;
    }

    /// Sample the current levels for one step.
    ///
    /// Returns the intent once the window closes: immediately on "neither"
    /// or "both", otherwise after the last step.
    pub fn step(&mut self, state: &GestureState) -> Option<Intent> {
        let elapsed = self.elapsed.as_mut()?;
        *elapsed += 1;
        let step = *elapsed;

        let intent = if state.is_idle() {
            Some(Intent::None)
        } else if state.is_both() {
            Some(Intent::Both)
        } else if step >= self.validation_steps {
            Some(if state.is_holding {
                Intent::HoldOnly
            } else {
                Intent::ActionOnly
            })
        } else {
            None
        };

        trace!(step, ?state, ?intent, "classification step");
        if intent.is_some() {
            self.elapsed = None;
        }
        intent
    }
}
