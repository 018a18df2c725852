//! Generation requests and their lifecycle.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use slidecast_common::error::SlidecastError;

/// Short per-request identifier used to namespace job files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Length of generated identifiers.
    pub const LEN: usize = 8;

    /// Generate a fresh identifier (first 8 hex digits of a v4 UUID).
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple[..Self::LEN].to_string())
    }

    /// Wrap an existing identifier, rejecting anything that could escape
    /// a job directory.
    pub fn parse(raw: impl Into<String>) -> Result<Self, SlidecastError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SlidecastError::invalid_input(format!(
                "Invalid job identifier: {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One end-to-end request to produce one output video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaJob {
    pub id: JobId,

    /// Image files in display order.
    pub images: Vec<PathBuf>,

    /// Narration track.
    pub audio: PathBuf,

    /// Raw subtitle text; may be empty.
    pub subtitle_text: String,

    /// Fractional scale growth per second.
    pub zoom_speed: f64,

    /// When the request arrived (RFC 3339).
    pub received_at: String,
}

impl MediaJob {
    /// Create a job with a freshly generated identifier.
    pub fn new(
        images: Vec<PathBuf>,
        audio: impl Into<PathBuf>,
        subtitle_text: impl Into<String>,
        zoom_speed: f64,
    ) -> Self {
        Self::with_id(JobId::generate(), images, audio, subtitle_text, zoom_speed)
    }

    /// Create a job with a caller-assigned identifier.
    pub fn with_id(
        id: JobId,
        images: Vec<PathBuf>,
        audio: impl Into<PathBuf>,
        subtitle_text: impl Into<String>,
        zoom_speed: f64,
    ) -> Self {
        Self {
            id,
            images,
            audio: audio.into(),
            subtitle_text: subtitle_text.into(),
            zoom_speed,
            received_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Stages of one job.
///
/// `Received → Planned → Composed → Rendering → Done`, or `Failed` from
/// any non-terminal stage. No stage is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Received,
    Planned,
    Composed,
    Rendering,
    Done,
    Failed,
}

impl JobStage {
    /// The stage that follows a successful completion of this one.
    pub fn next(self) -> Option<JobStage> {
        match self {
            JobStage::Received => Some(JobStage::Planned),
            JobStage::Planned => Some(JobStage::Composed),
            JobStage::Composed => Some(JobStage::Rendering),
            JobStage::Rendering => Some(JobStage::Done),
            JobStage::Done | JobStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }

    pub fn can_transition_to(self, to: JobStage) -> bool {
        match to {
            JobStage::Failed => !self.is_terminal(),
            other => self.next() == Some(other),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStage::Received => "received",
            JobStage::Planned => "planned",
            JobStage::Composed => "composed",
            JobStage::Rendering => "rendering",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job failure, tagged with the stage it originated in.
#[derive(Debug, thiserror::Error)]
#[error("Job {job_id} failed at stage '{stage}': {source}")]
pub struct JobError {
    pub job_id: JobId,
    /// The stage whose work failed (`Received` covers input validation).
    pub stage: JobStage,
    #[source]
    pub source: SlidecastError,
}

impl JobError {
    pub fn new(job_id: JobId, stage: JobStage, source: SlidecastError) -> Self {
        Self {
            job_id,
            stage,
            source,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        self.source.is_invalid_input()
    }

    pub fn is_render(&self) -> bool {
        self.source.is_render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_short_hex_and_distinct() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_eq!(a.as_str().len(), JobId::LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_path_components() {
        assert!(JobId::parse("ab12cd34").is_ok());
        assert!(JobId::parse("../etc").is_err());
        assert!(JobId::parse("a/b").is_err());
        assert!(JobId::parse("").is_err());
    }

    #[test]
    fn test_stage_machine_is_linear() {
        let mut stage = JobStage::Received;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_transition_to(next));
            stage = next;
            visited.push(stage);
        }
        assert_eq!(
            visited,
            vec![
                JobStage::Received,
                JobStage::Planned,
                JobStage::Composed,
                JobStage::Rendering,
                JobStage::Done
            ]
        );
    }

    #[test]
    fn test_failed_reachable_from_any_active_stage() {
        for stage in [
            JobStage::Received,
            JobStage::Planned,
            JobStage::Composed,
            JobStage::Rendering,
        ] {
            assert!(stage.can_transition_to(JobStage::Failed));
        }
        assert!(!JobStage::Done.can_transition_to(JobStage::Failed));
        assert!(!JobStage::Received.can_transition_to(JobStage::Rendering));
    }

    #[test]
    fn test_job_error_display_names_stage() {
        let err = JobError::new(
            JobId::parse("deadbeef").unwrap(),
            JobStage::Rendering,
            SlidecastError::render("encoder exited with status 1"),
        );
        let text = err.to_string();
        assert!(text.contains("deadbeef"));
        assert!(text.contains("rendering"));
        assert!(err.is_render());
    }
}
