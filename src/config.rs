//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::timing::FrameClock;

/// Which classifier turns gestures into intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Hold/action validation window
    #[default]
    Gesture,
    /// Hold long enough to shoot, release early to flash only
    HoldTimer,
}

/// Camera configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Write every photo to `screenshot_dir` as PNG
    pub save_to_folder: bool,

    /// Per-action informational logs. Warnings and errors are always logged.
    pub enable_debug_logs: bool,

    /// Length of the classification window in steps
    pub frames_to_validate: u32,

    /// Flash duration in seconds
    pub flash_duration: f32,

    /// Render layer hidden from the photo, if it exists
    pub exclusion_layer_name: Option<String>,

    /// Where saved photos go
    pub screenshot_dir: PathBuf,

    /// Target frame rate; 0 means the default of 60
    pub target_frame_rate: u32,

    pub time_scale: f32,

    /// How long a new photo stays on the display, in seconds
    pub photo_display_duration: f32,

    pub trigger_mode: TriggerMode,

    /// Hold time in seconds for `TriggerMode::HoldTimer`
    pub hold_time: f32,

    /// Ticks spent looking for the input hub before giving up
    pub input_attach_attempts: u32,

    /// Display resolution used by the software camera
    pub resolution: (u32, u32),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_to_folder: false,
            enable_debug_logs: true,
            frames_to_validate: 8,
            flash_duration: 0.25,
            exclusion_layer_name: Some("FirstPerson".to_string()),
            screenshot_dir: PathBuf::from("Screenshots"),
            target_frame_rate: 60,
            time_scale: 1.0,
            photo_display_duration: 5.0,
            trigger_mode: TriggerMode::Gesture,
            hold_time: 1.5,
            input_attach_attempts: 20,
            resolution: (320, 180),
        }
    }
}

impl Config {
    /// Load configuration from an optional JSON file and the environment
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os("PHOTO_CAMERA_CONFIG") {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config.normalized())
    }

    /// `$HOME/.local/share/photo-camera/config.json`
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("photo-camera")
                .join("config.json"),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.normalized())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PHOTO_CAMERA_SAVE_TO_FOLDER") {
            self.save_to_folder = parse_bool(&v).context("PHOTO_CAMERA_SAVE_TO_FOLDER")?;
        }
        if let Some(v) = lookup("PHOTO_CAMERA_DEBUG_LOGS") {
            self.enable_debug_logs = parse_bool(&v).context("PHOTO_CAMERA_DEBUG_LOGS")?;
        }
        if let Some(v) = lookup("PHOTO_CAMERA_FRAME_RATE") {
            self.target_frame_rate = v.trim().parse().context("PHOTO_CAMERA_FRAME_RATE")?;
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.frames_to_validate = self.frames_to_validate.max(1);
        if self
            .exclusion_layer_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.exclusion_layer_name = None;
        }
        self
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(Some(self.target_frame_rate), self.time_scale)
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.save_to_folder);
        assert_eq!(config.frames_to_validate, 8);
        assert_eq!(config.flash_duration, 0.25);
        assert_eq!(config.frame_clock().seconds_to_frames(config.flash_duration), 15);
        assert_eq!(config.trigger_mode, TriggerMode::Gesture);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(
            r#"{"save_to_folder": true, "trigger_mode": "hold_timer", "frames_to_validate": 0}"#,
        )
        .unwrap();
        assert!(config.save_to_folder);
        assert_eq!(config.trigger_mode, TriggerMode::HoldTimer);
        assert_eq!(config.frames_to_validate, 1);
        assert_eq!(config.hold_time, 1.5);
    }

    #[test]
    fn test_blank_exclusion_layer_is_none() {
        let config = Config::from_json(r#"{"exclusion_layer_name": "  "}"#).unwrap();
        assert!(config.exclusion_layer_name.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PHOTO_CAMERA_SAVE_TO_FOLDER", "yes"),
            ("PHOTO_CAMERA_DEBUG_LOGS", "0"),
            ("PHOTO_CAMERA_FRAME_RATE", "30"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(config.save_to_folder);
        assert!(!config.enable_debug_logs);
        assert_eq!(config.frame_clock().effective_frame_rate(), 30);
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|key| (key == "PHOTO_CAMERA_DEBUG_LOGS").then(|| "maybe".to_string()))
            .is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"flash_duration": 0.5, "screenshot_dir": "/tmp/shots"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.flash_duration, 0.5);
        assert_eq!(config.screenshot_dir, PathBuf::from("/tmp/shots"));
    }
}
