//! photo-camera: gesture-driven in-game photo camera
//!
//! Runs the camera feature as a small daemon:
//! - Reads hold/action gesture edges from stdin (`hold start`, `a c`, `quit`)
//! - Classifies them into an intent over a short validation window
//! - Drives the timed flash and frame-accurate photo capture
//! - Shows the photo for a few seconds and optionally saves it as PNG

mod capture;
mod config;
mod events;
mod input;
mod lifecycle;
mod state;
mod timing;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::{FixedScreen, LayerTable, PhotoDisplay, SimulatedFlash, SoftwareCamera};
use crate::config::Config;
use crate::events::CameraEvent;
use crate::input::{InputHub, InputListener};
use crate::lifecycle::{Registry, ShutdownSignal};
use crate::state::PhotoCamera;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "photo-camera starting");

    let config = Config::load()?;
    info!(
        trigger_mode = ?config.trigger_mode,
        save_to_folder = config.save_to_folder,
        frame_rate = config.frame_clock().effective_frame_rate(),
        "configuration loaded"
    );

    let shutdown = ShutdownSignal::new();
    let registry = Registry::global();

    // Input source -> hub -> camera
    let Some(hub) = registry.get_or_init(InputHub::new) else {
        anyhow::bail!("service registry unavailable");
    };
    // Camera -> event log
    let (event_tx, mut event_rx) = broadcast::channel::<CameraEvent>(64);

    let layers = LayerTable::standard();
    let first_person = layers.index_of("FirstPerson").unwrap_or(0);
    let (width, height) = config.resolution;
    let display_frames = config
        .frame_clock()
        .seconds_to_frames(config.photo_display_duration);
    let mut camera = match PhotoCamera::builder(config)
        .camera(Box::new(SoftwareCamera::demo(first_person)))
        .flash(Box::new(SimulatedFlash::new()))
        .screen(Box::new(FixedScreen { width, height }))
        .presentation(Box::new(PhotoDisplay::new(display_frames)))
        .layers(layers)
        .build(event_tx.clone())
    {
        Ok(camera) => Some(camera),
        Err(e) => {
            error!(%e, "photo camera disabled");
            None
        }
    };

    let listener = InputListener::new((*hub).clone(), shutdown.handle());
    match listener.start() {
        Ok(()) => info!("input listener started, type e.g. `hold start`, `action cancel`, `quit`"),
        Err(e) => {
            error!(%e, "failed to start input listener");
            warn!("continuing without input");
        }
    }

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Classifies gestures and runs flash/capture sequences
        _ = drive_camera(camera.as_mut(), registry) => {}

        // Log camera events
        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => info!(%event, "camera event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "camera event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("camera event logger exited");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    listener.stop();
    if let Some(camera) = camera.as_mut() {
        camera.shutdown();
    }
    registry.shutdown();

    info!("photo-camera stopped");

    Ok(())
}

/// Run the camera if there is one. Never returns: a camera that stopped or
/// disabled itself leaves the rest of the daemon running.
async fn drive_camera(camera: Option<&mut PhotoCamera>, registry: &Registry) {
    if let Some(camera) = camera {
        camera.run(registry).await;
        warn!("photo camera stopped, daemon keeps running");
    }
    std::future::pending::<()>().await
}
