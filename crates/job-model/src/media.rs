//! Probed media inputs.
//!
//! Planner and orchestrator only ever see these values; how they are
//! obtained (ffprobe, a test stub, ...) sits behind [`MediaProbe`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slidecast_common::error::{SlidecastError, SlidecastResult};

/// A still image with known pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> SlidecastResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 {
            return Err(SlidecastError::invalid_input(format!(
                "Image {} has zero dimensions ({width}x{height})",
                path.display()
            )));
        }
        Ok(Self {
            path,
            width,
            height,
        })
    }

    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }
}

/// An audio track with a known duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSource {
    pub path: PathBuf,
    pub duration_secs: f64,
}

impl AudioSource {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> SlidecastResult<Self> {
        let path = path.into();
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(SlidecastError::invalid_input(format!(
                "Audio {} has non-positive duration {duration_secs}",
                path.display()
            )));
        }
        Ok(Self {
            path,
            duration_secs,
        })
    }
}

/// Any media input of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    Image(ImageSource),
    Audio(AudioSource),
}

impl MediaSource {
    /// Location the renderer reads raw frames/samples from.
    pub fn path(&self) -> &Path {
        match self {
            MediaSource::Image(image) => &image.path,
            MediaSource::Audio(audio) => &audio.path,
        }
    }

    /// Pixel dimensions, for visual sources.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            MediaSource::Image(image) => Some((image.width, image.height)),
            MediaSource::Audio(_) => None,
        }
    }

    /// Playback duration, for timed sources.
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            MediaSource::Image(_) => None,
            MediaSource::Audio(audio) => Some(audio.duration_secs),
        }
    }
}

impl From<ImageSource> for MediaSource {
    fn from(value: ImageSource) -> Self {
        MediaSource::Image(value)
    }
}

impl From<AudioSource> for MediaSource {
    fn from(value: AudioSource) -> Self {
        MediaSource::Audio(value)
    }
}

/// Reads the properties the planner and orchestrator need from media files.
pub trait MediaProbe: Send + Sync {
    fn probe_image(&self, path: &Path) -> SlidecastResult<ImageSource>;

    fn probe_audio(&self, path: &Path) -> SlidecastResult<AudioSource>;

    /// Container duration of any timed media, including rendered output.
    fn probe_duration(&self, path: &Path) -> SlidecastResult<f64> {
        self.probe_audio(path).map(|audio| audio.duration_secs)
    }
}

/// Fail fast with `UnreadableInput` when a path is missing or not a file.
pub fn ensure_readable(path: &Path) -> SlidecastResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(SlidecastError::unreadable(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_rejects_zero_dimensions() {
        assert!(ImageSource::new("a.png", 0, 100).is_err());
        let image = ImageSource::new("a.png", 720, 1280).unwrap();
        assert!(image.is_portrait());
    }

    #[test]
    fn test_audio_rejects_non_positive_duration() {
        assert!(AudioSource::new("a.mp3", 0.0).is_err());
        assert!(AudioSource::new("a.mp3", f64::NAN).is_err());
        assert!(AudioSource::new("a.mp3", 12.5).is_ok());
    }

    #[test]
    fn test_media_source_capabilities() {
        let image: MediaSource = ImageSource::new("img1.jpg", 1920, 1080).unwrap().into();
        let audio: MediaSource = AudioSource::new("audio.mp3", 9.0).unwrap().into();

        assert_eq!(image.dimensions(), Some((1920, 1080)));
        assert_eq!(image.duration_secs(), None);
        assert_eq!(audio.duration_secs(), Some(9.0));
        assert_eq!(audio.path(), Path::new("audio.mp3"));
    }

    #[test]
    fn test_ensure_readable_reports_path() {
        let err = ensure_readable(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
