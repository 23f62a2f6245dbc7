//! Capture module: offscreen photo capture, flash and photo sinks

mod camera;
mod flash;
mod service;
mod sinks;
mod software;

pub use camera::{Camera, FixedScreen, LayerTable, Screen};
#[cfg(test)]
pub use camera::{LayerMask, RenderError, RenderTarget};
pub use flash::{FlashLight, SimulatedFlash};
pub use service::CaptureService;
pub use sinks::{PhotoDisplay, PresentationSink, ScreenshotWriter};
pub use software::SoftwareCamera;
