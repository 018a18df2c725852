//! Slidecast CLI: command-line interface for narrated vertical slideshows.
//!
//! Usage:
//!   slidecast generate [OPTIONS]   Render a video from images, narration and text
//!   slidecast plan [OPTIONS]       Print the composed scene as JSON
//!   slidecast check                Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::JobArgs;

#[derive(Parser)]
#[command(
    name = "slidecast",
    about = "Turn images, narration and subtitle text into a vertical zoom video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage inputs into a job workspace and render the video
    Generate {
        #[command(flatten)]
        job: JobArgs,

        /// Workspace root for uploads and outputs
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Output file path (defaults to <workspace>/outputs/<job_id>.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4-h264, mp4-h265, webm
        #[arg(long)]
        format: Option<String>,

        /// Also write an .srt caption sidecar next to the output
        #[arg(long)]
        captions: bool,
    },

    /// Probe, plan and compose without rendering; prints the scene as JSON
    Plan {
        #[command(flatten)]
        job: JobArgs,

        /// Also sample every Nth frame's composition
        #[arg(long)]
        sample_every: Option<u64>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => slidecast_common::config::AppConfig::load_from(path),
        None => slidecast_common::config::AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    slidecast_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Generate {
            job,
            workspace,
            output,
            format,
            captions,
        } => commands::generate::run(config, job, workspace, output, format, captions).await,
        Commands::Plan { job, sample_every } => commands::plan::run(config, job, sample_every).await,
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
    }
}
