//! State module: turning gestures into timed flash and capture sequences
//!
//! - `GestureClassifier`: validation window resolving hold/action to an `Intent`
//! - `HoldTimer`: hold-to-shoot alternative trigger
//! - `TimedActionSequencer`: step-driven flash/capture plan
//! - `PhotoCamera`: the controller wiring them to input, flash and capture

mod classifier;
mod hold_timer;
mod machine;
mod sequencer;

pub use classifier::Intent;
pub use machine::PhotoCamera;
pub use sequencer::SequenceEnd;
