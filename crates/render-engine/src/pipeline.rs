//! Job pipeline: `Received → Planned → Composed → Rendering → Done`.
//!
//! Probing and rendering shell out to external tools, so both run on
//! tokio's blocking pool while the caller awaits the outcome. Each job
//! only touches the paths it is given; concurrent jobs share nothing but
//! the runner's immutable configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use slidecast_common::clock::{DurationDrift, FrameClock};
use slidecast_common::config::CompositionConfig;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::job::{JobError, JobId, JobStage, MediaJob};
use slidecast_job_model::media::{AudioSource, ImageSource, MediaProbe, MediaSource};
use slidecast_job_model::scene::Scene;
use slidecast_job_model::timeline::Plan;
use slidecast_planner::plan_job;

use crate::compositor::build_scene;
use crate::export::{render, ProgressCallback, RenderBackend};
use crate::ffmpeg::FfmpegBackend;
use crate::probe::FfprobeProbe;

/// Creates a fresh backend for each render.
pub type BackendFactory = Arc<dyn Fn() -> Box<dyn RenderBackend> + Send + Sync>;

/// Output may differ from the narration by at most this many frames.
const DURATION_TOLERANCE_FRAMES: u32 = 1;

/// Result of a finished job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub output_path: PathBuf,
    pub plan: Plan,
    pub scene: Scene,

    /// Probed inputs: the images in slot order, then the narration.
    pub inputs: Vec<MediaSource>,
    pub elapsed: Duration,

    /// Measured output duration against the narration, when the output
    /// could be probed.
    pub drift: Option<DurationDrift>,
}

/// Runs jobs end to end with a shared probe, backend factory and configuration.
#[derive(Clone)]
pub struct JobRunner {
    probe: Arc<dyn MediaProbe>,
    backends: BackendFactory,
    config: CompositionConfig,
}

impl JobRunner {
    /// Runner using `ffprobe` and `ffmpeg` from `PATH`.
    pub fn new(config: CompositionConfig) -> Self {
        Self {
            probe: Arc::new(FfprobeProbe::new()),
            backends: Arc::new(|| Box::new(FfmpegBackend::new()) as Box<dyn RenderBackend>),
            config,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_backend_factory(mut self, backends: BackendFactory) -> Self {
        self.backends = backends;
        self
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Probe, plan and compose a job without rendering it.
    pub async fn prepare(&self, job: &MediaJob) -> Result<(Plan, Scene), JobError> {
        let mut tracker = StageTracker::new(job.id.clone());
        let (plan, scene, _inputs) = self.prepare_tracked(job, &mut tracker).await?;
        Ok((plan, scene))
    }

    /// Run a job to completion, writing the video to `output_path`.
    pub async fn run(
        &self,
        job: MediaJob,
        output_path: PathBuf,
        progress: Option<ProgressCallback>,
    ) -> Result<JobOutcome, JobError> {
        let started = Instant::now();
        let mut tracker = StageTracker::new(job.id.clone());
        let (plan, scene, inputs) = self.prepare_tracked(&job, &mut tracker).await?;

        tracker.advance(JobStage::Rendering);
        let rendered = {
            let backends = Arc::clone(&self.backends);
            let codec = self.config.codec.clone();
            let scene = scene.clone();
            let label = job.id.to_string();
            let output_path = output_path.clone();
            tokio::task::spawn_blocking(move || {
                let mut backend = backends();
                render(&label, &scene, &output_path, &codec, backend.as_mut(), progress)
            })
            .await
        };
        let output_path = tracker.check(joined(rendered))?;

        let drift = {
            let probe = Arc::clone(&self.probe);
            let path = output_path.clone();
            let expected = scene.duration_secs;
            let clock = FrameClock::new(scene.canvas.fps);
            tokio::task::spawn_blocking(move || verify_output_duration(probe.as_ref(), &path, expected, clock))
                .await
                .unwrap_or(None)
        };

        tracker.advance(JobStage::Done);
        tracing::info!(
            job_id = %job.id,
            output = %output_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Job finished"
        );

        Ok(JobOutcome {
            job_id: job.id,
            output_path,
            plan,
            scene,
            inputs,
            elapsed: started.elapsed(),
            drift,
        })
    }

    async fn prepare_tracked(
        &self,
        job: &MediaJob,
        tracker: &mut StageTracker,
    ) -> Result<(Plan, Scene, Vec<MediaSource>), JobError> {
        tracing::info!(
            job_id = %job.id,
            images = job.images.len(),
            zoom_speed = job.zoom_speed,
            "Job received"
        );

        let probed = {
            let probe = Arc::clone(&self.probe);
            let job = job.clone();
            tokio::task::spawn_blocking(move || probe_inputs(probe.as_ref(), &job)).await
        };
        let (images, audio) = tracker.check(joined(probed))?;
        let inputs: Vec<MediaSource> = images
            .iter()
            .cloned()
            .map(MediaSource::from)
            .chain(std::iter::once(MediaSource::from(audio.clone())))
            .collect();
        for input in &inputs {
            tracing::debug!(
                job_id = %job.id,
                path = %input.path().display(),
                dimensions = ?input.dimensions(),
                duration_secs = ?input.duration_secs(),
                "Input probed"
            );
        }

        let plan = tracker.check(plan_job(job, &audio, &self.config.timing))?;
        tracker.advance(JobStage::Planned);

        let scene = tracker.check(build_scene(&plan, &images, &audio, &self.config))?;
        tracker.advance(JobStage::Composed);

        Ok((plan, scene, inputs))
    }
}

/// Tracks the stage of one job and tags failures with it.
struct StageTracker {
    job_id: JobId,
    stage: JobStage,
}

impl StageTracker {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            stage: JobStage::Received,
        }
    }

    fn advance(&mut self, to: JobStage) {
        debug_assert!(self.stage.can_transition_to(to), "{} -> {}", self.stage, to);
        tracing::info!(job_id = %self.job_id, from = %self.stage, to = %to, "Job stage changed");
        self.stage = to;
    }

    fn check<T>(&mut self, result: SlidecastResult<T>) -> Result<T, JobError> {
        result.map_err(|source| {
            let failed_at = self.stage;
            tracing::error!(
                job_id = %self.job_id,
                stage = %failed_at,
                error = %source,
                "Job failed"
            );
            self.stage = JobStage::Failed;
            JobError::new(self.job_id.clone(), failed_at, source)
        })
    }
}

fn joined<T>(result: Result<SlidecastResult<T>, tokio::task::JoinError>) -> SlidecastResult<T> {
    result.unwrap_or_else(|e| Err(SlidecastError::render(format!("Job worker failed: {e}"))))
}

/// Validate and probe every input before any rendering work.
fn probe_inputs(
    probe: &dyn MediaProbe,
    job: &MediaJob,
) -> SlidecastResult<(Vec<ImageSource>, AudioSource)> {
    if job.images.is_empty() {
        return Err(SlidecastError::invalid_input("At least one image is required"));
    }

    let images = job
        .images
        .iter()
        .map(|path| probe.probe_image(path))
        .collect::<SlidecastResult<Vec<_>>>()
        .map_err(as_input_error)?;
    let audio = probe.probe_audio(&job.audio).map_err(as_input_error)?;

    Ok((images, audio))
}

/// Anything that prevents reading an input is the caller's problem, except
/// a missing probe tool.
fn as_input_error(err: SlidecastError) -> SlidecastError {
    match err {
        SlidecastError::Io(io) => SlidecastError::invalid_input(io.to_string()),
        other => other,
    }
}

/// Compare the rendered duration with the narration; logs but never fails.
fn verify_output_duration(
    probe: &dyn MediaProbe,
    output: &Path,
    expected_secs: f64,
    clock: FrameClock,
) -> Option<DurationDrift> {
    let measured_secs = match probe.probe_duration(output) {
        Ok(secs) => secs,
        Err(err) => {
            tracing::warn!(output = %output.display(), error = %err, "Could not verify output duration");
            return None;
        }
    };

    let drift = DurationDrift {
        expected_secs,
        measured_secs,
    };
    if drift.within_frames(clock, DURATION_TOLERANCE_FRAMES) {
        tracing::debug!(drift_ms = drift.drift_ms(), "Output duration verified");
    } else {
        tracing::warn!(
            expected_secs,
            measured_secs,
            drift_ms = drift.drift_ms(),
            "Output duration differs from narration by more than one frame"
        );
    }
    Some(drift)
}

/// Run one job with the given runner.
pub async fn run_job(
    runner: &JobRunner,
    job: MediaJob,
    output_path: impl AsRef<Path>,
    progress: Option<ProgressCallback>,
) -> Result<JobOutcome, JobError> {
    runner
        .run(job, output_path.as_ref().to_path_buf(), progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        output_secs: f64,
    }

    impl MediaProbe for FixedProbe {
        fn probe_image(&self, path: &Path) -> SlidecastResult<ImageSource> {
            ImageSource::new(path, 1080, 1920)
        }

        fn probe_audio(&self, path: &Path) -> SlidecastResult<AudioSource> {
            AudioSource::new(path, 4.0)
        }

        fn probe_duration(&self, _path: &Path) -> SlidecastResult<f64> {
            Ok(self.output_secs)
        }
    }

    #[test]
    fn test_tracker_tags_failures_with_current_stage() {
        let mut tracker = StageTracker::new(JobId::parse("abc123").unwrap());
        tracker.advance(JobStage::Planned);
        let err = tracker
            .check::<()>(Err(SlidecastError::invalid_input("bad")))
            .unwrap_err();
        assert_eq!(err.stage, JobStage::Planned);
        assert_eq!(tracker.stage, JobStage::Failed);
    }

    #[test]
    fn test_empty_image_list_is_invalid_input() {
        let probe = FixedProbe { output_secs: 4.0 };
        let job = MediaJob::new(vec![], "audio.mp3", "hi", 0.03);
        let err = probe_inputs(&probe, &job).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_duration_within_one_frame_passes() {
        let clock = FrameClock::new(25);
        let probe = FixedProbe { output_secs: 4.03 };
        let drift = verify_output_duration(&probe, Path::new("out.mp4"), 4.0, clock).unwrap();
        assert!(drift.within_frames(clock, 1));

        let probe = FixedProbe { output_secs: 4.2 };
        let drift = verify_output_duration(&probe, Path::new("out.mp4"), 4.0, clock).unwrap();
        assert!(!drift.within_frames(clock, 1));
    }

    #[test]
    fn test_io_probe_errors_become_invalid_input() {
        let err = as_input_error(SlidecastError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert!(err.is_invalid_input());
        assert!(as_input_error(SlidecastError::render("no ffprobe")).is_render());
    }
}
