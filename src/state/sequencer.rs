//! Timed action sequencer
//!
//! Runs one flash/capture plan as a step-driven state machine. The flash
//! stays on for `total_frames` steps and the photo is taken on
//! `midpoint_frame`. Side effects are returned as `Effect`s for the caller
//! to apply, in order.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::classifier::ActionPlan;
use crate::timing::FrameClock;

/// A side effect requested by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FlashOn,
    Capture,
    FlashOff,
}

/// How a sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceEnd {
    Completed,
    Cancelled,
}

/// The in-flight run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionSequence {
    pub do_photo: bool,
    pub do_flash: bool,
    pub total_frames: u32,
    pub midpoint_frame: u32,
    pub current_frame: u32,
}

/// Effects produced by one call, plus whether the sequence is over
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Advance {
    pub effects: Vec<Effect>,
    pub finished: Option<SequenceEnd>,
}

impl Advance {
    fn finished(effects: Vec<Effect>, end: SequenceEnd) -> Self {
        Self {
            effects,
            finished: Some(end),
        }
    }
}

#[derive(Debug)]
pub struct TimedActionSequencer {
    flash_duration: f32,
    active: Option<ActionSequence>,
}

impl TimedActionSequencer {
    pub fn new(flash_duration: f32) -> Self {
        Self {
            flash_duration,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&ActionSequence> {
        self.active.as_ref()
    }

    /// Flash length in whole steps at the given clock
    pub fn frames_for(&self, clock: &FrameClock) -> u32 {
        clock.seconds_to_frames(self.flash_duration)
    }

    /// Begin a sequence for `plan`.
    ///
    /// Returns `None` without touching the running sequence if one is
    /// already in flight.
    pub fn start(&mut self, plan: ActionPlan, clock: &FrameClock) -> Option<Advance> {
        if let Some(running) = &self.active {
            debug!(?running, "sequence already running, ignoring start");
            return None;
        }

        let total_frames = self.frames_for(clock);
        let sequence = ActionSequence {
            do_photo: plan.do_photo,
            do_flash: plan.do_flash,
            total_frames,
            midpoint_frame: total_frames / 2,
            current_frame: 0,
        };
        debug!(?sequence, "sequence starting");

        if !plan.do_flash {
            let effects = if plan.do_photo {
                vec![Effect::Capture]
            } else {
                Vec::new()
            };
            return Some(Advance::finished(effects, SequenceEnd::Completed));
        }

        if total_frames == 0 {
            // No frame to show the flash on: switch it and shoot in one go.
            let mut effects = vec![Effect::FlashOn];
            if plan.do_photo {
                effects.push(Effect::Capture);
            }
            effects.push(Effect::FlashOff);
            return Some(Advance::finished(effects, SequenceEnd::Completed));
        }

        let mut effects = vec![Effect::FlashOn];
        effects.extend(Self::frame_effects(&sequence));
        self.active = Some(sequence);
        Some(Advance {
            effects,
            finished: None,
        })
    }

    /// Advance the running sequence by one step
    pub fn step(&mut self) -> Advance {
        let Some(sequence) = self.active.as_mut() else {
            return Advance::default();
        };

        sequence.current_frame += 1;
        trace!(frame = sequence.current_frame, total = sequence.total_frames, "sequence step");

        if sequence.current_frame >= sequence.total_frames {
            self.active = None;
            debug!("sequence complete");
            return Advance::finished(vec![Effect::FlashOff], SequenceEnd::Completed);
        }

        Advance {
            effects: Self::frame_effects(sequence).collect(),
            finished: None,
        }
    }

    /// Force-stop the running sequence. A pending capture is skipped and
    /// the flash is switched off.
    pub fn cancel(&mut self) -> Advance {
        match self.active.take() {
            Some(sequence) => {
                debug!(frame = sequence.current_frame, "sequence cancelled");
                let effects = if sequence.do_flash {
                    vec![Effect::FlashOff]
                } else {
                    Vec::new()
                };
                Advance::finished(effects, SequenceEnd::Cancelled)
            }
            None => Advance::default(),
        }
    }

    fn frame_effects(sequence: &ActionSequence) -> impl Iterator<Item = Effect> {
        (sequence.do_photo && sequence.current_frame == sequence.midpoint_frame)
            .then_some(Effect::Capture)
            .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLASH_ONLY: ActionPlan = ActionPlan {
        do_photo: false,
        do_flash: true,
    };
    const PHOTO_ONLY: ActionPlan = ActionPlan {
        do_photo: true,
        do_flash: false,
    };
    const PHOTO_AND_FLASH: ActionPlan = ActionPlan {
        do_photo: true,
        do_flash: true,
    };

    /// Start then step to completion, collecting every effect in order
    fn run_to_end(sequencer: &mut TimedActionSequencer, plan: ActionPlan) -> (Vec<Effect>, u32) {
        let clock = FrameClock::default();
        let mut advance = sequencer.start(plan, &clock).unwrap();
        let mut effects = std::mem::take(&mut advance.effects);
        let mut steps = 0;
        while advance.finished.is_none() {
            advance = sequencer.step();
            steps += 1;
            effects.extend(advance.effects.iter().copied());
        }
        (effects, steps)
    }

    fn count(effects: &[Effect], wanted: Effect) -> usize {
        effects.iter().filter(|e| **e == wanted).count()
    }

    #[test]
    fn test_flash_only_runs_fifteen_steps_without_capture() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let (effects, steps) = run_to_end(&mut sequencer, FLASH_ONLY);
        assert_eq!(steps, 15);
        assert_eq!(effects, vec![Effect::FlashOn, Effect::FlashOff]);
        assert!(!sequencer.is_active());
    }

    #[test]
    fn test_photo_with_flash_captures_at_midpoint() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let clock = FrameClock::default();
        let start = sequencer.start(PHOTO_AND_FLASH, &clock).unwrap();
        assert_eq!(start.effects, vec![Effect::FlashOn]);
        assert_eq!(sequencer.active().unwrap().midpoint_frame, 7);

        for frame in 1..15 {
            let advance = sequencer.step();
            if frame == 7 {
                assert_eq!(advance.effects, vec![Effect::Capture]);
            } else {
                assert!(advance.effects.is_empty(), "frame {frame}");
            }
        }
        let last = sequencer.step();
        assert_eq!(last.effects, vec![Effect::FlashOff]);
        assert_eq!(last.finished, Some(SequenceEnd::Completed));
    }

    #[test]
    fn test_photo_without_flash_is_immediate() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let advance = sequencer.start(PHOTO_ONLY, &FrameClock::default()).unwrap();
        assert_eq!(advance.effects, vec![Effect::Capture]);
        assert_eq!(advance.finished, Some(SequenceEnd::Completed));
        assert!(!sequencer.is_active());
    }

    #[test]
    fn test_empty_plan_is_noop() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let plan = ActionPlan {
            do_photo: false,
            do_flash: false,
        };
        let advance = sequencer.start(plan, &FrameClock::default()).unwrap();
        assert!(advance.effects.is_empty());
        assert!(!sequencer.is_active());
    }

    #[test]
    fn test_zero_duration_still_captures_once() {
        let mut sequencer = TimedActionSequencer::new(0.0);
        let advance = sequencer.start(PHOTO_AND_FLASH, &FrameClock::default()).unwrap();
        assert_eq!(
            advance.effects,
            vec![Effect::FlashOn, Effect::Capture, Effect::FlashOff]
        );
        assert_eq!(advance.finished, Some(SequenceEnd::Completed));
        assert!(!sequencer.is_active());
    }

    #[test]
    fn test_single_frame_captures_on_first_frame() {
        // 1 frame at 60fps: midpoint 0, captured before the first step.
        let mut sequencer = TimedActionSequencer::new(1.0 / 60.0);
        let (effects, steps) = run_to_end(&mut sequencer, PHOTO_AND_FLASH);
        assert_eq!(steps, 1);
        assert_eq!(
            effects,
            vec![Effect::FlashOn, Effect::Capture, Effect::FlashOff]
        );
    }

    #[test]
    fn test_start_while_active_is_noop() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let clock = FrameClock::default();
        sequencer.start(FLASH_ONLY, &clock).unwrap();
        sequencer.step();

        assert!(sequencer.start(PHOTO_ONLY, &clock).is_none());
        let running = sequencer.active().unwrap();
        assert!(!running.do_photo);
        assert_eq!(running.current_frame, 1);
    }

    #[test]
    fn test_cancel_turns_flash_off_once_and_skips_capture() {
        let mut sequencer = TimedActionSequencer::new(0.25);
        let clock = FrameClock::default();
        let mut effects = sequencer.start(PHOTO_AND_FLASH, &clock).unwrap().effects;
        for _ in 0..3 {
            effects.extend(sequencer.step().effects);
        }

        let cancelled = sequencer.cancel();
        assert_eq!(cancelled.finished, Some(SequenceEnd::Cancelled));
        effects.extend(cancelled.effects);

        assert_eq!(count(&effects, Effect::FlashOn), 1);
        assert_eq!(count(&effects, Effect::FlashOff), 1);
        assert_eq!(count(&effects, Effect::Capture), 0);

        // Nothing left to turn off.
        assert_eq!(sequencer.cancel(), Advance::default());
        assert_eq!(sequencer.step(), Advance::default());
    }

    #[test]
    fn test_flash_off_exactly_once_for_every_duration() {
        for frames in 0..40u32 {
            let mut sequencer = TimedActionSequencer::new(frames as f32 / 60.0);
            let (effects, _) = run_to_end(&mut sequencer, PHOTO_AND_FLASH);
            assert_eq!(count(&effects, Effect::FlashOn), 1, "{frames} frames");
            assert_eq!(count(&effects, Effect::FlashOff), 1, "{frames} frames");
            assert_eq!(count(&effects, Effect::Capture), 1, "{frames} frames");
            assert_eq!(effects.last(), Some(&Effect::FlashOff));
        }
    }
}
