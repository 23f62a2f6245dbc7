//! Frame clock: converts durations to whole frame steps

use std::time::Duration;

/// Frame rate assumed when none is configured
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// `tokio::time::interval` rejects a zero period
const MIN_FRAME_INTERVAL: Duration = Duration::from_nanos(1);

/// Effective frame rate and time scale used for step conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    target_frame_rate: Option<u32>,
    time_scale: f32,
}

impl FrameClock {
    pub fn new(target_frame_rate: Option<u32>, time_scale: f32) -> Self {
        Self {
            target_frame_rate,
            time_scale,
        }
    }

    /// Target frame rate, falling back to 60 when unset or zero
    pub fn effective_frame_rate(&self) -> u32 {
        match self.target_frame_rate {
            Some(rate) if rate > 0 => rate,
            _ => DEFAULT_FRAME_RATE,
        }
    }

    /// `round(seconds * time_scale * frame_rate)`, never negative
    pub fn seconds_to_frames(&self, seconds: f32) -> u32 {
        let frames = (seconds * self.time_scale * self.effective_frame_rate() as f32).round();
        if frames.is_finite() && frames > 0.0 {
            frames as u32
        } else {
            0
        }
    }

    /// Wall-clock length of one step, at least one nanosecond
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.effective_frame_rate()))
            .max(MIN_FRAME_INTERVAL)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(None, 1.0)
    }
}
