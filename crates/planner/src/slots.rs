//! Image duration allocation.

use slidecast_common::error::{SlidecastError, SlidecastResult};

/// Split `audio_duration_secs` equally among `image_count` images.
///
/// The first `n - 1` slots get `duration / n`; the last slot gets the
/// remainder, so summing the result left to right reproduces
/// `audio_duration_secs` exactly.
pub fn allocate_image_durations(
    image_count: usize,
    audio_duration_secs: f64,
) -> SlidecastResult<Vec<f64>> {
    if image_count == 0 {
        return Err(SlidecastError::invalid_input(
            "At least one image is required",
        ));
    }
    if !audio_duration_secs.is_finite() || audio_duration_secs <= 0.0 {
        return Err(SlidecastError::invalid_input(format!(
            "Audio duration must be positive, got {audio_duration_secs}"
        )));
    }

    let per_image = audio_duration_secs / image_count as f64;
    let mut durations = Vec::with_capacity(image_count);
    let mut allotted = 0.0;
    for _ in 1..image_count {
        durations.push(per_image);
        allotted += per_image;
    }
    durations.push(audio_duration_secs - allotted);

    Ok(durations)
}
