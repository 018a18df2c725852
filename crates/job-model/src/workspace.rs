//! On-disk namespacing of job inputs and outputs.
//!
//! ```text
//! <root>/
//!   uploads/<job_id>/img1.jpg, img2.png, ..., audio.mp3
//!   outputs/<job_id>.mp4
//! ```
//!
//! Concurrent jobs never touch each other's files. Cleaning up stale job
//! directories is left to the caller.

use std::path::{Path, PathBuf};

use slidecast_common::error::{SlidecastError, SlidecastResult};

use crate::job::JobId;
use crate::media::ensure_readable;

const DEFAULT_IMAGE_EXT: &str = "jpg";
const DEFAULT_AUDIO_EXT: &str = "mp3";

/// Directories and file names reserved for one job.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    root: PathBuf,
    job_id: JobId,
}

/// Inputs copied into a job's upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInputs {
    pub images: Vec<PathBuf>,
    pub audio: PathBuf,
}

impl JobWorkspace {
    /// Create the upload and output directories for a job.
    pub fn create(root: impl AsRef<Path>, job_id: JobId) -> SlidecastResult<Self> {
        let workspace = Self {
            root: root.as_ref().to_path_buf(),
            job_id,
        };
        for dir in [workspace.upload_dir(), workspace.output_dir()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(workspace)
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.join("uploads").join(self.job_id.as_str())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Output path for the given container extension.
    pub fn output_path_with_ext(&self, ext: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{}.{ext}", self.job_id.as_str()))
    }

    /// Default MP4 output path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path_with_ext("mp4")
    }

    /// Copy inputs into the upload directory as `img<N>.<ext>` and
    /// `audio.<ext>`, keeping the images' order.
    pub fn stage_inputs(&self, images: &[PathBuf], audio: &Path) -> SlidecastResult<StagedInputs> {
        if images.is_empty() {
            return Err(SlidecastError::invalid_input("At least one image is required"));
        }

        let upload_dir = self.upload_dir();
        let mut staged_images = Vec::with_capacity(images.len());
        for (idx, image) in images.iter().enumerate() {
            ensure_readable(image)?;
            let target = upload_dir.join(format!(
                "img{}.{}",
                idx + 1,
                extension_or(image, DEFAULT_IMAGE_EXT)
            ));
            std::fs::copy(image, &target)?;
            staged_images.push(target);
        }

        ensure_readable(audio)?;
        let staged_audio = upload_dir.join(format!("audio.{}", extension_or(audio, DEFAULT_AUDIO_EXT)));
        std::fs::copy(audio, &staged_audio)?;

        tracing::debug!(
            job_id = %self.job_id,
            images = staged_images.len(),
            dir = %upload_dir.display(),
            "Staged job inputs"
        );

        Ok(StagedInputs {
            images: staged_images,
            audio: staged_audio,
        })
    }
}

fn extension_or<'a>(path: &'a Path, fallback: &'a str) -> &'a str {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(fallback)
}
