//! Caption sidecars in SRT and VTT formats.

use slidecast_common::error::SlidecastResult;
use slidecast_job_model::timeline::SubtitleSegment;

/// Generate SRT subtitle content from planned segments.
pub fn generate_srt(segments: &[SubtitleSegment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(segment.start_secs),
            format_srt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content from planned segments.
pub fn generate_vtt(segments: &[SubtitleSegment]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for segment in segments {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(segment.start_secs),
            format_vtt_time(segment.end_secs),
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// Split seconds into (hours, minutes, seconds, millis), rounding to the
/// nearest millisecond so contiguous segments share identical stamps.
fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save captions to a file; `.vtt` selects WebVTT, anything else SRT.
pub fn save_captions(segments: &[SubtitleSegment], path: &std::path::Path) -> SlidecastResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(segments),
        _ => generate_srt(segments),
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), segments = segments.len(), "Wrote captions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> SubtitleSegment {
        SubtitleSegment {
            start_secs: start,
            end_secs: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_srt_generation() {
        let segments = vec![
            segment(0.0, 2.5, "Hello world"),
            segment(2.5, 5.0, "This is a test"),
        ];

        let srt = generate_srt(&segments);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500\nHello world"));
        assert!(srt.contains("2\n00:00:02,500 --> 00:00:05,000\nThis is a test"));
    }

    #[test]
    fn test_vtt_generation() {
        let segments = vec![segment(61.5, 63.0, "One minute in")];

        let vtt = generate_vtt(&segments);
        assert!(vtt.starts_with("WEBVTT\n"));
        assert!(vtt.contains("00:01:01.500 --> 00:01:03.000"));
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
        assert_eq!(format_vtt_time(3661.5), "01:01:01.500");
        // 8.0 reached through float scaling must not print as 7.999.
        assert_eq!(format_srt_time(7.999_999_999_9), "00:00:08,000");
    }

    #[test]
    fn test_save_captions_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![segment(0.0, 1.0, "hi")];

        let vtt_path = dir.path().join("job.vtt");
        save_captions(&segments, &vtt_path).unwrap();
        assert!(std::fs::read_to_string(&vtt_path).unwrap().starts_with("WEBVTT"));

        let srt_path = dir.path().join("job.srt");
        save_captions(&segments, &srt_path).unwrap();
        assert!(std::fs::read_to_string(&srt_path).unwrap().starts_with("1\n"));
    }
}
