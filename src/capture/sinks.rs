//! Where captured photos go: an on-screen display and a PNG folder

use std::path::PathBuf;

use chrono::{DateTime, Local};
use image::ImageFormat;
use tracing::debug;

use super::service::CapturedImage;

/// Receives each new photo for display
pub trait PresentationSink: Send {
    fn present(&mut self, image: CapturedImage);

    /// Called once per step
    fn tick(&mut self) {}
}

/// Shows the latest photo for a fixed number of steps, then hides it.
/// A new photo restarts the countdown.
#[derive(Debug)]
pub struct PhotoDisplay {
    visible_frames: u32,
    remaining: u32,
    current: Option<CapturedImage>,
}

impl PhotoDisplay {
    pub fn new(visible_frames: u32) -> Self {
        Self {
            visible_frames,
            remaining: 0,
            current: None,
        }
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&CapturedImage> {
        self.current.as_ref()
    }

    fn hide(&mut self) {
        if self.current.take().is_some() {
            debug!("photo hidden");
        }
    }
}

impl PresentationSink for PhotoDisplay {
    fn present(&mut self, image: CapturedImage) {
        if self.visible_frames == 0 {
            return;
        }
        debug!(
            width = image.width(),
            height = image.height(),
            frames = self.visible_frames,
            "photo shown"
        );
        self.current = Some(image);
        self.remaining = self.visible_frames;
    }

    fn tick(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.hide();
        }
    }
}

/// Errors writing a photo to disk
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to create screenshot directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Writes photos as `Ss<YYYYMMDDHHMMSS>.png` into a directory
#[derive(Debug, Clone)]
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(taken_at: &DateTime<Local>) -> String {
        format!("Ss{}.png", taken_at.format("%Y%m%d%H%M%S"))
    }

    /// Encode and write. Creates the directory if needed.
    pub fn save(&self, image: &CapturedImage) -> Result<PathBuf, PersistError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(Self::file_name(image.taken_at()));
        image
            .pixels()
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "png written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::RgbImage;
    use std::sync::Arc;

    fn photo(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(Arc::new(RgbImage::new(width, height)), Local::now())
    }

    #[test]
    fn test_file_name_pattern() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(ScreenshotWriter::file_name(&at), "Ss20240309070501.png");
    }

    #[test]
    fn test_save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ScreenshotWriter::new(tmp.path().join("nested").join("shots"));

        let path = writer.save(&photo(8, 4)).unwrap();
        assert!(path.exists());
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_save_into_a_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let writer = ScreenshotWriter::new(file.path().join("shots"));
        assert!(matches!(
            writer.save(&photo(2, 2)),
            Err(PersistError::CreateDir { .. })
        ));
    }

    #[test]
    fn test_display_hides_after_countdown() {
        let mut display = PhotoDisplay::new(3);
        display.present(photo(2, 2));
        assert!(display.is_visible());

        display.tick();
        display.tick();
        assert!(display.is_visible());
        display.tick();
        assert!(!display.is_visible());
    }

    #[test]
    fn test_new_photo_restarts_countdown() {
        let mut display = PhotoDisplay::new(2);
        display.present(photo(2, 2));
        display.tick();
        display.present(photo(4, 4));
        display.tick();
        assert_eq!(display.current().map(|p| p.width()), Some(4));
        display.tick();
        assert!(!display.is_visible());
    }

    #[test]
    fn test_zero_length_display_never_shows() {
        let mut display = PhotoDisplay::new(0);
        display.present(photo(2, 2));
        assert!(!display.is_visible());
    }
}
