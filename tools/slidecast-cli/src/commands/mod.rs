//! Subcommand implementations.

use std::path::PathBuf;

use clap::Args;

pub mod check;
pub mod generate;
pub mod plan;

/// Inputs shared by `generate` and `plan`.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Image file, in display order (repeat for each image)
    #[arg(long = "image", required = true)]
    pub images: Vec<PathBuf>,

    /// Narration audio file
    #[arg(long)]
    pub audio: PathBuf,

    /// Subtitle text
    #[arg(long, conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Read subtitle text from a file
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    /// Zoom growth per second (defaults to the configured speed, 0.03)
    #[arg(long)]
    pub zoom_speed: Option<f64>,
}

impl JobArgs {
    /// Subtitle text from `--text` or `--text-file`; empty when neither is given.
    pub fn subtitle_text(&self) -> anyhow::Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }
}
