//! Media probing through `ffprobe`.

use std::path::Path;
use std::process::Command;

use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::media::{ensure_readable, AudioSource, ImageSource, MediaProbe};

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

impl FfprobeProbe {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, path: &Path, args: &[&str]) -> SlidecastResult<Option<String>> {
        ensure_readable(path)?;

        let output = Command::new("ffprobe")
            .args(["-v", "error"])
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| SlidecastError::render(format!("Failed to start ffprobe: {e}")))?;

        if !output.status.success() {
            tracing::debug!(
                path = %path.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffprobe rejected input"
            );
            return Ok(None);
        }

        Ok(String::from_utf8(output.stdout).ok())
    }

    fn container_duration(&self, path: &Path) -> SlidecastResult<f64> {
        let raw = self.run(
            path,
            &[
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ],
        )?;
        raw.as_deref().and_then(parse_duration).ok_or_else(|| {
            SlidecastError::invalid_input(format!(
                "Could not read a duration from {}",
                path.display()
            ))
        })
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe_image(&self, path: &Path) -> SlidecastResult<ImageSource> {
        let raw = self.run(
            path,
            &[
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "csv=p=0:s=x",
            ],
        )?;
        let (width, height) = raw.as_deref().and_then(parse_dimensions).ok_or_else(|| {
            SlidecastError::invalid_input(format!("Could not decode image {}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), width, height, "Probed image");
        ImageSource::new(path, width, height)
    }

    fn probe_audio(&self, path: &Path) -> SlidecastResult<AudioSource> {
        let duration_secs = self.container_duration(path)?;
        tracing::debug!(path = %path.display(), duration_secs, "Probed audio");
        AudioSource::new(path, duration_secs)
    }

    fn probe_duration(&self, path: &Path) -> SlidecastResult<f64> {
        self.container_duration(path)
    }
}

/// Parse `WIDTHxHEIGHT` as printed by `ffprobe -of csv=p=0:s=x`.
fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.trim().parse::<u32>().ok()?;
    let height = h.trim().parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

fn parse_duration(raw: &str) -> Option<f64> {
    let secs = raw.lines().next()?.trim().parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
