//! Input module for camera gestures
//!
//! Collapses start/perform/cancel edges of the hold and action controls
//! into boolean levels and fans them out to consumers.

mod gesture;
mod hub;
mod listener;

pub use gesture::{Gesture, GestureEvent, GestureState};
#[cfg(test)]
pub use gesture::Edge;
pub use hub::InputHub;
pub use listener::InputListener;
