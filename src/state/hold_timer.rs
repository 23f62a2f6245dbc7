//! Hold-to-shoot trigger
//!
//! Simpler alternative to the validation window: keep the hold gesture
//! down for `hold_frames` steps to take a photo with flash, let go earlier
//! to fire the flash alone.

use tracing::trace;

use super::classifier::Intent;
use crate::input::GestureState;

#[derive(Debug)]
pub struct HoldTimer {
    hold_frames: u32,
    /// Steps the current press has lasted, `None` when not armed
    held_for: Option<u32>,
}

impl HoldTimer {
    pub fn new(hold_frames: u32) -> Self {
        Self {
            hold_frames,
            held_for: None,
        }
    }

    /// Arm on a new press. Restarts the timer.
    pub fn press(&mut self) {
        self.held_for = Some(0);
    }

    pub fn disarm(&mut self) {
        self.held_for = None;
    }

    /// Advance one step and resolve if the press completed or ended
    pub fn step(&mut self, state: &GestureState) -> Option<Intent> {
        let held = self.held_for.as_mut()?;

        if !state.is_holding {
            trace!(held_for = *held, "released before hold time");
            self.held_for = None;
            return Some(Intent::HoldOnly);
        }

        *held += 1;
        if *held >= self.hold_frames {
            trace!(held_for = *held, "hold time reached");
            self.held_for = None;
            return Some(Intent::Both);
        }
        None
    }
}
