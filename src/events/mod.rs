//! Events emitted by the photo camera controller

use serde::{Deserialize, Serialize};

use crate::state::{Intent, SequenceEnd};

/// Events broadcast while the camera classifies input and runs sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraEvent {
    /// Subscribed to the input hub, ready for gestures
    InputAttached {
        /// Ticks it took to find the hub
        attempts: u32,
    },

    /// A validation window closed
    IntentClassified { intent: Intent },

    /// A flash/capture sequence began
    SequenceStarted {
        do_photo: bool,
        do_flash: bool,
        total_frames: u32,
    },

    /// The flash light changed state
    FlashChanged { active: bool },

    /// A photo was captured and handed to the display
    PhotoCaptured { width: u32, height: u32 },

    /// A photo was written to disk
    PhotoSaved { path: String },

    /// Writing a photo failed; the photo itself is still valid
    PhotoSaveFailed { error: String },

    /// Rendering the photo failed
    CaptureFailed { error: String },

    /// A sequence ended
    SequenceFinished { end: SequenceEnd },

    /// The feature turned itself off and will ignore input
    Disabled { reason: String },
}

impl std::fmt::Display for CameraEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraEvent::InputAttached { attempts } => {
                write!(f, "INPUT_ATTACHED (after {} tries)", attempts)
            }
            CameraEvent::IntentClassified { intent } => write!(f, "INTENT_CLASSIFIED ({})", intent),
            CameraEvent::SequenceStarted {
                do_photo,
                do_flash,
                total_frames,
            } => write!(
                f,
                "SEQUENCE_STARTED (photo={}, flash={}, {} frames)",
                do_photo, do_flash, total_frames
            ),
            CameraEvent::FlashChanged { active } => {
                write!(f, "FLASH_{}", if *active { "ON" } else { "OFF" })
            }
            CameraEvent::PhotoCaptured { width, height } => {
                write!(f, "PHOTO_CAPTURED ({}x{})", width, height)
            }
            CameraEvent::PhotoSaved { path } => write!(f, "PHOTO_SAVED ({})", path),
            CameraEvent::PhotoSaveFailed { error } => write!(f, "PHOTO_SAVE_FAILED ({})", error),
            CameraEvent::CaptureFailed { error } => write!(f, "CAPTURE_FAILED ({})", error),
            CameraEvent::SequenceFinished { end } => write!(f, "SEQUENCE_FINISHED ({:?})", end),
            CameraEvent::Disabled { reason } => write!(f, "DISABLED ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CameraEvent::IntentClassified {
            intent: Intent::HoldOnly,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"intent_classified","intent":"hold_only"}"#);
    }

    #[test]
    fn test_sequence_finished_round_trips() {
        let event = CameraEvent::SequenceFinished {
            end: SequenceEnd::Cancelled,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("cancelled"));
        let back: CameraEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"flash_changed","active":true}"#;
        let event: CameraEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, CameraEvent::FlashChanged { active: true });
        assert_eq!(event.to_string(), "FLASH_ON");
    }
}
