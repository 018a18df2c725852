//! Render entry point and backend contract.

use std::path::{Path, PathBuf};

use slidecast_common::config::CodecParams;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::scene::Scene;

/// One encode handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Label used in logs (usually the job id).
    pub label: &'a str,

    /// Validated scene to encode.
    pub scene: &'a Scene,

    /// Where the backend must write the encoded file.
    ///
    /// This is a staging path; [`render`] moves it into place on success.
    pub output_path: &'a Path,

    /// Encoder parameters.
    pub codec: &'a CodecParams,
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

impl RenderProgress {
    pub fn at_stage(stage: RenderStage, total_frames: u64) -> Self {
        let done = matches!(stage, RenderStage::Complete);
        Self {
            progress: if done { 1.0 } else { 0.0 },
            frames_rendered: if done { total_frames } else { 0 },
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// Stages of a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Encode the request's scene to `request.output_path`.
    fn render(
        &mut self,
        request: &RenderRequest<'_>,
        progress: Option<ProgressCallback>,
    ) -> SlidecastResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render a scene to `output_path`.
///
/// The backend writes to a staging file next to the output, which is
/// renamed into place only after the backend reports success. On failure
/// no file is left at `output_path`, including one from an earlier run.
pub fn render(
    label: &str,
    scene: &Scene,
    output_path: &Path,
    codec: &CodecParams,
    backend: &mut dyn RenderBackend,
    progress: Option<ProgressCallback>,
) -> SlidecastResult<PathBuf> {
    scene.validate()?;

    tracing::info!(
        job = label,
        output = %output_path.display(),
        format = ?codec.format,
        duration_secs = scene.duration_secs,
        "Starting render"
    );

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    remove_if_exists(output_path)?;

    if !backend.is_available() {
        return Err(SlidecastError::render(format!(
            "Render backend '{}' is not available",
            backend.name()
        )));
    }

    let staging = staging_path(output_path);
    remove_if_exists(&staging)?;

    let request = RenderRequest {
        label,
        scene,
        output_path: &staging,
        codec,
    };

    tracing::info!(backend = backend.name(), staging = %staging.display(), "Using render backend");
    let started = std::time::Instant::now();

    if let Err(err) = backend.render(&request, progress) {
        discard_staging(&staging);
        tracing::error!(job = label, error = %err, "Render failed");
        return Err(as_render_error(err));
    }

    if !staging.is_file() {
        return Err(SlidecastError::render(format!(
            "Backend '{}' reported success but wrote no file",
            backend.name()
        )));
    }

    if let Err(err) = std::fs::rename(&staging, output_path) {
        discard_staging(&staging);
        return Err(SlidecastError::render(format!(
            "Failed to move {} into place: {err}",
            staging.display()
        )));
    }

    tracing::info!(
        job = label,
        output = %output_path.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Render finished"
    );

    Ok(output_path.to_path_buf())
}

/// Staging location for an output: `<stem>.partial.<ext>` in the same directory.
pub fn staging_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match output_path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    output_path.with_file_name(name)
}

fn as_render_error(err: SlidecastError) -> SlidecastError {
    if err.is_render() {
        err
    } else {
        SlidecastError::render(err.to_string())
    }
}

fn remove_if_exists(path: &Path) -> SlidecastResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale file");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn discard_staging(staging: &Path) {
    if let Err(err) = remove_if_exists(staging) {
        tracing::warn!(path = %staging.display(), error = %err, "Failed to remove staging file");
    }
}
