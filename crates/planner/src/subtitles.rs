//! Subtitle segmentation.
//!
//! Text is split on whitespace into chunks of at most
//! `max_words_per_chunk` words. Each chunk gets a natural reading duration
//! (`words / reading_words_per_second`, floored at `min_chunk_secs`), and
//! all durations are then scaled by one common factor so the segments
//! tile `[0, audio_duration]` exactly.

use slidecast_common::config::SubtitleTiming;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::timeline::SubtitleSegment;

/// Plan subtitle segments covering the whole narration.
///
/// Empty or whitespace-only text yields no segments. The final segment
/// always ends at exactly `audio_duration_secs`.
pub fn plan_subtitles(
    text: &str,
    audio_duration_secs: f64,
    timing: &SubtitleTiming,
) -> SlidecastResult<Vec<SubtitleSegment>> {
    if !audio_duration_secs.is_finite() || audio_duration_secs <= 0.0 {
        return Err(SlidecastError::invalid_input(format!(
            "Audio duration must be positive, got {audio_duration_secs}"
        )));
    }
    validate_timing(timing)?;

    let chunks = chunk_words(text, timing.max_words_per_chunk);
    if chunks.is_empty() {
        return Ok(vec![]);
    }

    let estimates: Vec<f64> = chunks
        .iter()
        .map(|chunk| estimate_reading_secs(chunk.len(), timing))
        .collect();

    let mut total_estimated: f64 = estimates.iter().sum();
    if total_estimated <= 0.0 {
        total_estimated = chunks.len() as f64;
    }
    let scale = audio_duration_secs / total_estimated;

    let mut segments = Vec::with_capacity(chunks.len());
    let mut cursor = 0.0;
    for (chunk, estimate) in chunks.iter().zip(&estimates) {
        let end = cursor + estimate * scale;
        segments.push(SubtitleSegment {
            start_secs: cursor,
            end_secs: end,
            text: chunk.join(" "),
        });
        cursor = end;
    }

    // Absorb accumulated float drift into the last segment.
    if let Some(last) = segments.last_mut() {
        last.end_secs = audio_duration_secs;
    }

    let shortest = segments
        .iter()
        .map(SubtitleSegment::duration_secs)
        .fold(f64::INFINITY, f64::min);
    if shortest < timing.min_chunk_secs {
        tracing::warn!(
            segments = segments.len(),
            shortest_secs = shortest,
            audio_duration_secs,
            "Subtitle segments compressed below the reading floor"
        );
    }

    tracing::debug!(
        chunks = segments.len(),
        scale,
        total_estimated,
        "Planned subtitle segments"
    );

    Ok(segments)
}

/// Greedy, order-preserving word chunking.
pub fn chunk_words(text: &str, max_words_per_chunk: usize) -> Vec<Vec<&str>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words_per_chunk.max(1))
        .map(<[&str]>::to_vec)
        .collect()
}

/// Natural reading duration of a chunk before scaling.
pub fn estimate_reading_secs(word_count: usize, timing: &SubtitleTiming) -> f64 {
    (word_count as f64 / timing.reading_words_per_second).max(timing.min_chunk_secs)
}

fn validate_timing(timing: &SubtitleTiming) -> SlidecastResult<()> {
    if timing.max_words_per_chunk == 0 {
        return Err(SlidecastError::invalid_input(
            "max_words_per_chunk must be at least 1",
        ));
    }
    if !timing.reading_words_per_second.is_finite() || timing.reading_words_per_second <= 0.0 {
        return Err(SlidecastError::invalid_input(format!(
            "reading_words_per_second must be positive, got {}",
            timing.reading_words_per_second
        )));
    }
    if !timing.min_chunk_secs.is_finite() || timing.min_chunk_secs < 0.0 {
        return Err(SlidecastError::invalid_input(format!(
            "min_chunk_secs must be non-negative, got {}",
            timing.min_chunk_secs
        )));
    }
    Ok(())
}
