//! Gesture definitions and level tracking
//!
//! Each physical control reports start/perform/cancel edges. Those edges
//! collapse to a single active/inactive level per gesture.

use serde::{Deserialize, Serialize};

/// The two independent camera gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Secondary control: raise and hold the camera
    Hold,
    /// Primary control: trigger the shutter
    Action,
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gesture::Hold => write!(f, "hold"),
            Gesture::Action => write!(f, "action"),
        }
    }
}

/// Input edge reported by the control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    Perform,
    Cancel,
}

impl Edge {
    /// Level the gesture has after this edge
    pub fn is_active(self) -> bool {
        !matches!(self, Edge::Cancel)
    }
}

/// A single tagged input message: which gesture, which edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub edge: Edge,
}

impl GestureEvent {
    pub fn new(gesture: Gesture, edge: Edge) -> Self {
        Self { gesture, edge }
    }
}

/// Current level of both gestures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    /// Hold gesture is active
    pub is_holding: bool,
    /// Action gesture is active
    pub is_actioning: bool,
}

impl GestureState {
    /// Apply an edge. Returns true when the gesture went from inactive to active.
    pub fn apply(&mut self, event: GestureEvent) -> bool {
        let level = match event.gesture {
            Gesture::Hold => &mut self.is_holding,
            Gesture::Action => &mut self.is_actioning,
        };
        let was_active = *level;
        *level = event.edge.is_active();
        !was_active && *level
    }

    /// Neither gesture is active
    pub fn is_idle(&self) -> bool {
        !self.is_holding && !self.is_actioning
    }

    /// Both gestures are active at once
    pub fn is_both(&self) -> bool {
        self.is_holding && self.is_actioning
    }
}
