//! Render a video from staged inputs.

use std::path::PathBuf;

use slidecast_common::config::{AppConfig, OutputFormat};
use slidecast_job_model::job::{JobId, MediaJob};
use slidecast_job_model::media::MediaSource;
use slidecast_job_model::workspace::JobWorkspace;
use slidecast_planner::save_captions;
use slidecast_render_engine::{run_job, JobRunner, RenderProgress};

use super::JobArgs;

pub async fn run(
    mut config: AppConfig,
    args: JobArgs,
    workspace: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    captions: bool,
) -> anyhow::Result<()> {
    if let Some(format) = format {
        config.composition.codec.format = OutputFormat::parse(&format).ok_or_else(|| {
            anyhow::anyhow!("Unknown format: {format}. Use: mp4-h264, mp4-h265, webm")
        })?;
    }

    let subtitle_text = args.subtitle_text()?;
    let zoom_speed = args
        .zoom_speed
        .unwrap_or(config.composition.default_zoom_speed.0);

    let root = workspace.unwrap_or_else(|| config.workspace_dir.clone());
    let workspace = JobWorkspace::create(&root, JobId::generate())
        .map_err(|e| anyhow::anyhow!("Failed to create job workspace: {e}"))?;
    let staged = workspace
        .stage_inputs(&args.images, &args.audio)
        .map_err(|e| anyhow::anyhow!("Failed to stage inputs: {e}"))?;

    let job = MediaJob::with_id(
        workspace.job_id().clone(),
        staged.images,
        staged.audio,
        subtitle_text,
        zoom_speed,
    );
    let output_path = output.unwrap_or_else(|| {
        workspace.output_path_with_ext(config.composition.codec.format.extension())
    });

    println!("Generating job {}", job.id);
    println!("  Images: {}", job.images.len());
    println!("  Zoom speed: {zoom_speed}");
    println!("  Output: {}", output_path.display());

    let progress_cb: Box<dyn Fn(RenderProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
    });

    let runner = JobRunner::new(config.composition.clone());
    let outcome = match run_job(&runner, job, &output_path, Some(progress_cb)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!();
            return Err(anyhow::anyhow!("Generation failed: {e}"));
        }
    };

    println!("\nVideo ready: {}", outcome.output_path.display());
    for input in &outcome.inputs {
        match input {
            MediaSource::Image(image) => {
                println!("  Image: {} ({}x{})", image.path.display(), image.width, image.height)
            }
            MediaSource::Audio(audio) => {
                println!("  Narration: {} ({:.3}s)", audio.path.display(), audio.duration_secs)
            }
        }
    }
    if let Some(drift) = outcome.drift {
        println!("  Duration: {:.3}s ({:+.0}ms vs narration)", drift.measured_secs, drift.drift_ms());
    }

    if captions {
        let caption_path = outcome.output_path.with_extension("srt");
        save_captions(&outcome.plan.segments, &caption_path)
            .map_err(|e| anyhow::anyhow!("Failed to write captions: {e}"))?;
        println!("  Captions: {}", caption_path.display());
    }

    tracing::debug!(elapsed_secs = outcome.elapsed.as_secs_f64(), "Generate command finished");
    Ok(())
}
