//! Whole-job planning.

use slidecast_common::config::SubtitleTiming;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::job::MediaJob;
use slidecast_job_model::media::AudioSource;
use slidecast_job_model::timeline::{ImageSlot, Plan, ZoomMotion};

use crate::slots::allocate_image_durations;
use crate::subtitles::plan_subtitles;

/// Build the plan for one job: one slot per image, in order, plus the
/// subtitle segments, all spanning the narration's duration.
pub fn plan_job(job: &MediaJob, audio: &AudioSource, timing: &SubtitleTiming) -> SlidecastResult<Plan> {
    if !job.zoom_speed.is_finite() || job.zoom_speed < 0.0 {
        return Err(SlidecastError::invalid_input(format!(
            "Zoom speed must be a non-negative number, got {}",
            job.zoom_speed
        )));
    }

    let durations = allocate_image_durations(job.images.len(), audio.duration_secs)?;
    let zoom = ZoomMotion::new(job.zoom_speed);

    let mut slots = Vec::with_capacity(durations.len());
    let mut start = 0.0;
    for (image, duration) in job.images.iter().zip(durations) {
        slots.push(ImageSlot {
            image: image.clone(),
            start_secs: start,
            duration_secs: duration,
            zoom,
        });
        start += duration;
    }

    let segments = plan_subtitles(&job.subtitle_text, audio.duration_secs, timing)?;

    tracing::info!(
        job_id = %job.id,
        slots = slots.len(),
        segments = segments.len(),
        audio_duration_secs = audio.duration_secs,
        zoom_speed = job.zoom_speed,
        "Job planned"
    );

    Ok(Plan {
        audio_duration_secs: audio.duration_secs,
        slots,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job(images: usize, text: &str, zoom: f64) -> MediaJob {
        let images = (1..=images)
            .map(|i| PathBuf::from(format!("img{i}.jpg")))
            .collect();
        MediaJob::new(images, "audio.mp3", text, zoom)
    }

    #[test]
    fn test_slots_follow_image_order_and_tile_audio() {
        let audio = AudioSource::new("audio.mp3", 9.0).unwrap();
        let plan = plan_job(&job(3, "hello there", 0.03), &audio, &SubtitleTiming::default()).unwrap();

        let images: Vec<_> = plan.slots.iter().map(|s| s.image.clone()).collect();
        assert_eq!(
            images,
            vec![
                PathBuf::from("img1.jpg"),
                PathBuf::from("img2.jpg"),
                PathBuf::from("img3.jpg")
            ]
        );
        let starts: Vec<f64> = plan.slots.iter().map(|s| s.start_secs).collect();
        assert_eq!(starts, vec![0.0, 3.0, 6.0]);
        assert_eq!(plan.slots_total_secs(), 9.0);
        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.segments[0].end_secs, 9.0);
    }

    #[test]
    fn test_single_slot_zoom_reaches_one_point_six() {
        let audio = AudioSource::new("audio.mp3", 20.0).unwrap();
        let plan = plan_job(&job(1, "", 0.03), &audio, &SubtitleTiming::default()).unwrap();
        assert!((plan.slots[0].final_scale() - 1.6).abs() < 1e-12);
        assert!(plan.segments.is_empty());
    }

    #[test]
    fn test_negative_zoom_rejected() {
        let audio = AudioSource::new("audio.mp3", 5.0).unwrap();
        let err = plan_job(&job(1, "", -0.1), &audio, &SubtitleTiming::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_no_images_rejected() {
        let audio = AudioSource::new("audio.mp3", 5.0).unwrap();
        let err = plan_job(&job(0, "text", 0.03), &audio, &SubtitleTiming::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
