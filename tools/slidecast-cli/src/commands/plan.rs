//! Print the composed scene without rendering.

use slidecast_common::config::AppConfig;
use slidecast_job_model::job::MediaJob;
use slidecast_render_engine::{compute_compositions, JobRunner};

use super::JobArgs;

pub async fn run(config: AppConfig, args: JobArgs, sample_every: Option<u64>) -> anyhow::Result<()> {
    let subtitle_text = args.subtitle_text()?;
    let zoom_speed = args
        .zoom_speed
        .unwrap_or(config.composition.default_zoom_speed.0);
    let job = MediaJob::new(args.images, args.audio, subtitle_text, zoom_speed);

    let runner = JobRunner::new(config.composition);
    let (_plan, scene) = runner
        .prepare(&job)
        .await
        .map_err(|e| anyhow::anyhow!("Planning failed: {e}"))?;

    let json = match sample_every {
        Some(stride) => serde_json::to_string_pretty(&serde_json::json!({
            "scene": &scene,
            "frames": compute_compositions(&scene, stride),
        }))?,
        None => scene.to_json_pretty()?,
    };
    println!("{json}");

    Ok(())
}
