//! Capture service
//!
//! Renders the current view into an offscreen target with the exclusion
//! layer hidden, reads the pixels back and hands the result to the
//! configured sinks. The camera mask is restored and the target released
//! on every path, including render failures.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::RgbImage;
use tracing::{debug, info, warn};

use super::camera::{Camera, LayerMask, RenderError, RenderTarget, Screen};
use super::sinks::{PersistError, PresentationSink, ScreenshotWriter};

/// Depth buffer precision requested for capture targets
const DEPTH_BITS: u8 = 24;

/// A finished photo: shared RGB pixels plus the time it was taken
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: Arc<RgbImage>,
    taken_at: DateTime<Local>,
}

impl CapturedImage {
    pub fn new(pixels: Arc<RgbImage>, taken_at: DateTime<Local>) -> Self {
        Self { pixels, taken_at }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn taken_at(&self) -> &DateTime<Local> {
        &self.taken_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result of one successful capture
#[derive(Debug)]
pub struct CaptureOutcome {
    pub image: CapturedImage,
    /// `None` when saving is disabled
    pub saved: Option<Result<PathBuf, PersistError>>,
}

/// Restores the camera mask when dropped
struct MaskGuard<'a> {
    camera: &'a mut dyn Camera,
    original: LayerMask,
}

impl<'a> MaskGuard<'a> {
    fn exclude(camera: &'a mut dyn Camera, layer: Option<u8>) -> Self {
        let original = camera.culling_mask();
        if let Some(layer) = layer {
            camera.set_culling_mask(original.without(layer));
        }
        Self { camera, original }
    }
}

impl Drop for MaskGuard<'_> {
    fn drop(&mut self) {
        self.camera.set_culling_mask(self.original);
    }
}

pub struct CaptureService {
    camera: Box<dyn Camera>,
    screen: Box<dyn Screen>,
    exclusion_layer: Option<u8>,
    presentation: Option<Box<dyn PresentationSink>>,
    writer: Option<ScreenshotWriter>,
    /// Last readback buffer, reused when nobody else still holds it
    last: Option<Arc<RgbImage>>,
    debug_logs: bool,
}

impl CaptureService {
    pub fn new(camera: Box<dyn Camera>, screen: Box<dyn Screen>) -> Self {
        Self {
            camera,
            screen,
            exclusion_layer: None,
            presentation: None,
            writer: None,
            last: None,
            debug_logs: true,
        }
    }

    pub fn with_exclusion_layer(mut self, layer: Option<u8>) -> Self {
        self.exclusion_layer = layer;
        self
    }

    pub fn with_presentation(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.presentation = Some(sink);
        self
    }

    pub fn with_writer(mut self, writer: Option<ScreenshotWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }

    #[cfg(test)]
    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    /// Take a photo of the current view
    pub fn capture(&mut self) -> Result<CaptureOutcome, CaptureError> {
        let (width, height) = self.screen.resolution();
        let taken_at = Local::now();

        let pixels = {
            let guard = MaskGuard::exclude(self.camera.as_mut(), self.exclusion_layer);
            let mut target = RenderTarget::acquire(width, height, DEPTH_BITS)?;
            guard.camera.render(&mut target)?;
            read_back(&target, self.last.take())
        };

        let pixels = Arc::new(pixels);
        self.last = Some(Arc::clone(&pixels));
        let image = CapturedImage::new(pixels, taken_at);
        debug!(width, height, "frame captured");

        let saved = self.writer.as_ref().map(|writer| writer.save(&image));
        match &saved {
            Some(Ok(path)) if self.debug_logs => {
                info!(path = %path.display(), "screenshot taken and saved");
            }
            Some(Err(e)) => warn!(%e, "failed to save screenshot"),
            _ => {}
        }

        if let Some(sink) = self.presentation.as_mut() {
            sink.present(image.clone());
        }

        Ok(CaptureOutcome { image, saved })
    }

    /// Advance the presentation sink by one step
    pub fn tick(&mut self) {
        if let Some(sink) = self.presentation.as_mut() {
            sink.tick();
        }
    }
}

/// Copy the target's pixels, into `reuse` when it is unshared and the same size
fn read_back(target: &RenderTarget, reuse: Option<Arc<RgbImage>>) -> RgbImage {
    let source = target.color();
    match reuse.and_then(|buffer| Arc::try_unwrap(buffer).ok()) {
        Some(mut buffer) if buffer.dimensions() == source.dimensions() => {
            buffer.copy_from_slice(source.as_raw());
            buffer
        }
        _ => source.clone(),
    }
}
