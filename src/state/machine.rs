//! Photo camera controller
//!
//! Owns the gesture levels, the trigger (validation window or hold timer),
//! the sequencer and the capture service. Input edges and ticks are the
//! only things that move it forward; everything runs on one task.

use tokio::sync::broadcast;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::classifier::{GestureClassifier, Intent};
use super::hold_timer::HoldTimer;
use super::sequencer::{Advance, Effect, TimedActionSequencer};
use crate::capture::{
    Camera, CaptureService, FixedScreen, FlashLight, LayerTable, PhotoDisplay, PresentationSink,
    Screen, ScreenshotWriter,
};
use crate::config::{Config, TriggerMode};
use crate::events::CameraEvent;
use crate::input::{Gesture, GestureEvent, GestureState, InputHub};
use crate::lifecycle::Registry;
use crate::timing::FrameClock;

/// Missing collaborators detected at startup
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("camera reference is missing")]
    MissingCamera,

    #[error("flash light reference is missing")]
    MissingFlash,
}

/// How gestures become intents
#[derive(Debug)]
enum Trigger {
    Window(GestureClassifier),
    HoldTimer(HoldTimer),
}

pub struct PhotoCameraBuilder {
    config: Config,
    camera: Option<Box<dyn Camera>>,
    flash: Option<Box<dyn FlashLight>>,
    screen: Option<Box<dyn Screen>>,
    presentation: Option<Box<dyn PresentationSink>>,
    layers: LayerTable,
}

impl PhotoCameraBuilder {
    pub fn camera(mut self, camera: Box<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn flash(mut self, flash: Box<dyn FlashLight>) -> Self {
        self.flash = Some(flash);
        self
    }

    pub fn screen(mut self, screen: Box<dyn Screen>) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn presentation(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.presentation = Some(sink);
        self
    }

    pub fn layers(mut self, layers: LayerTable) -> Self {
        self.layers = layers;
        self
    }

    pub fn build(self, event_tx: broadcast::Sender<CameraEvent>) -> Result<PhotoCamera, BuildError> {
        let config = self.config;
        let camera = self.camera.ok_or(BuildError::MissingCamera)?;
        let mut flash = self.flash.ok_or(BuildError::MissingFlash)?;
        flash.set_active(false);

        let clock = config.frame_clock();

        let exclusion_layer = match config.exclusion_layer_name.as_deref() {
            Some(name) => {
                let layer = self.layers.index_of(name);
                if layer.is_none() {
                    warn!(layer = name, "exclusion layer not found, photos will include it");
                }
                layer
            }
            None => None,
        };

        let screen = self.screen.unwrap_or_else(|| {
            let (width, height) = config.resolution;
            Box::new(FixedScreen { width, height })
        });
        let presentation = self.presentation.unwrap_or_else(|| {
            Box::new(PhotoDisplay::new(
                clock.seconds_to_frames(config.photo_display_duration),
            ))
        });
        let writer = config
            .save_to_folder
            .then(|| ScreenshotWriter::new(config.screenshot_dir.clone()));

        let capture = CaptureService::new(camera, screen)
            .with_exclusion_layer(exclusion_layer)
            .with_presentation(presentation)
            .with_writer(writer)
            .with_debug_logs(config.enable_debug_logs);

        let trigger = match config.trigger_mode {
            TriggerMode::Gesture => Trigger::Window(GestureClassifier::new(config.frames_to_validate)),
            TriggerMode::HoldTimer => {
                Trigger::HoldTimer(HoldTimer::new(clock.seconds_to_frames(config.hold_time)))
            }
        };

        Ok(PhotoCamera {
            gestures: GestureState::default(),
            trigger,
            sequencer: TimedActionSequencer::new(config.flash_duration),
            capture,
            flash,
            clock,
            event_tx,
            debug_logs: config.enable_debug_logs,
            enabled: true,
            input_attach_attempts: config.input_attach_attempts,
        })
    }
}

/// The camera feature: gestures in, flash and photos out
pub struct PhotoCamera {
    gestures: GestureState,
    trigger: Trigger,
    sequencer: TimedActionSequencer,
    capture: CaptureService,
    flash: Box<dyn FlashLight>,
    clock: FrameClock,
    event_tx: broadcast::Sender<CameraEvent>,
    debug_logs: bool,
    enabled: bool,
    input_attach_attempts: u32,
}

impl PhotoCamera {
    pub fn builder(config: Config) -> PhotoCameraBuilder {
        PhotoCameraBuilder {
            config,
            camera: None,
            flash: None,
            screen: None,
            presentation: None,
            layers: LayerTable::standard(),
        }
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub fn is_sequence_active(&self) -> bool {
        self.sequencer.is_active()
    }

    #[cfg(test)]
    pub fn is_flash_on(&self) -> bool {
        self.flash.is_active()
    }

    /// Run until the input hub closes.
    ///
    /// Looks the hub up once per tick, up to the configured number of
    /// attempts, and disables the camera if it never shows up.
    pub async fn run(&mut self, registry: &Registry) {
        let mut ticker = tokio::time::interval(self.clock.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let Some(mut input_rx) = self.attach_input(registry, &mut ticker).await else {
            return;
        };

        info!("photo camera started");

        loop {
            tokio::select! {
                received = input_rx.recv() => match received {
                    Ok(event) => self.handle_input(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "gesture receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ticker.tick() => self.tick(),
            }
        }

        self.shutdown();
        info!("photo camera stopped");
    }

    async fn attach_input(
        &mut self,
        registry: &Registry,
        ticker: &mut Interval,
    ) -> Option<broadcast::Receiver<GestureEvent>> {
        for attempt in 1..=self.input_attach_attempts {
            if let Some(hub) = registry.try_get::<InputHub>() {
                if self.debug_logs {
                    info!(attempt, "found input hub");
                }
                let rx = hub.subscribe();
                self.emit(CameraEvent::InputAttached { attempts: attempt });
                return Some(rx);
            }
            ticker.tick().await;
        }

        self.disable(format!(
            "input hub not found after {} attempts",
            self.input_attach_attempts
        ));
        None
    }

    /// Apply one input edge
    pub fn handle_input(&mut self, event: GestureEvent) {
        if !self.enabled {
            return;
        }

        let rising = self.gestures.apply(event);
        debug!(gesture = %event.gesture, edge = ?event.edge, state = ?self.gestures, "gesture level changed");
        if !rising {
            return;
        }

        match &mut self.trigger {
            Trigger::Window(classifier) => {
                if classifier.begin() {
                    debug!("classification window opened");
                }
            }
            Trigger::HoldTimer(timer) => {
                if event.gesture == Gesture::Hold {
                    timer.press();
                }
            }
        }
    }

    /// Advance one step: running sequence, then classification, then display
    pub fn tick(&mut self) {
        if !self.enabled {
            return;
        }

        let advance = self.sequencer.step();
        self.apply(advance);

        let intent = match &mut self.trigger {
            Trigger::Window(classifier) => classifier.step(&self.gestures),
            Trigger::HoldTimer(timer) => timer.step(&self.gestures),
        };
        if let Some(intent) = intent {
            self.on_intent(intent);
        }

        self.capture.tick();
    }

    fn on_intent(&mut self, intent: Intent) {
        if self.debug_logs {
            match intent {
                Intent::None => info!("stopped reading actions"),
                Intent::HoldOnly => info!("holding the camera"),
                Intent::ActionOnly => info!("actioning the camera"),
                Intent::Both => info!("holding and actioning the camera"),
            }
        }
        self.emit(CameraEvent::IntentClassified { intent });

        let Some(plan) = intent.plan() else {
            if self.sequencer.is_active() {
                self.cancel();
            }
            return;
        };

        match self.sequencer.start(plan, &self.clock) {
            Some(advance) => {
                self.emit(CameraEvent::SequenceStarted {
                    do_photo: plan.do_photo,
                    do_flash: plan.do_flash,
                    total_frames: self.sequencer.frames_for(&self.clock),
                });
                self.apply(advance);
            }
            None => debug!(%intent, "sequence in flight, intent dropped"),
        }
    }

    /// Force-stop the running sequence, turning the flash off
    pub fn cancel(&mut self) {
        let advance = self.sequencer.cancel();
        self.apply(advance);
    }

    /// Stop everything in flight. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.cancel();
        match &mut self.trigger {
            Trigger::Window(classifier) => classifier.abort(),
            Trigger::HoldTimer(timer) => timer.disarm(),
        }
        if self.flash.is_active() {
            self.set_flash(false);
        }
    }

    /// Turn the feature off. Logged once; later input is ignored.
    pub fn disable(&mut self, reason: String) {
        if !self.enabled {
            return;
        }
        error!(%reason, "photo camera disabled");
        self.shutdown();
        self.enabled = false;
        self.emit(CameraEvent::Disabled { reason });
    }

    fn apply(&mut self, advance: Advance) {
        for effect in advance.effects {
            match effect {
                Effect::FlashOn => self.set_flash(true),
                Effect::FlashOff => self.set_flash(false),
                Effect::Capture => self.take_photo(),
            }
        }
        if let Some(end) = advance.finished {
            self.emit(CameraEvent::SequenceFinished { end });
        }
    }

    fn set_flash(&mut self, active: bool) {
        self.flash.set_active(active);
        self.emit(CameraEvent::FlashChanged { active });
    }

    fn take_photo(&mut self) {
        if self.debug_logs {
            info!("taking photo");
        }
        match self.capture.capture() {
            Ok(outcome) => {
                self.emit(CameraEvent::PhotoCaptured {
                    width: outcome.image.width(),
                    height: outcome.image.height(),
                });
                match outcome.saved {
                    Some(Ok(path)) => self.emit(CameraEvent::PhotoSaved {
                        path: path.display().to_string(),
                    }),
                    Some(Err(e)) => self.emit(CameraEvent::PhotoSaveFailed {
                        error: e.to_string(),
                    }),
                    None => {}
                }
            }
            Err(e) => {
                error!(%e, "capture failed");
                self.emit(CameraEvent::CaptureFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: CameraEvent) {
        debug!(%event, "emitting camera event");
        let _ = self.event_tx.send(event);
    }
}
