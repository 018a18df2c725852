//! Application configuration.
//!
//! Every planner and orchestrator call receives the record it needs
//! explicitly; nothing here is read through globals.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory under which per-job uploads and outputs are namespaced.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// Timing and composition parameters.
    #[serde(default)]
    pub composition: CompositionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Parameters for planning and composing one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Output canvas geometry and frame rate.
    pub canvas: CanvasConfig,

    /// Subtitle chunking and reading-speed parameters.
    pub timing: SubtitleTiming,

    /// Zoom speed used when a job does not request one.
    pub default_zoom_speed: DefaultZoomSpeed,

    /// Subtitle overlay appearance.
    pub subtitle_style: SubtitleStyle,

    /// Encoder parameters.
    pub codec: CodecParams,
}

/// Output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 25,
        }
    }
}

/// Subtitle chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleTiming {
    /// Maximum words per subtitle chunk.
    pub max_words_per_chunk: usize,

    /// Approximate narration speed used to weight chunks.
    pub reading_words_per_second: f64,

    /// Floor applied to each chunk's estimated duration before scaling.
    pub min_chunk_secs: f64,
}

impl Default for SubtitleTiming {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 8,
            reading_words_per_second: 3.0,
            min_chunk_secs: 0.5,
        }
    }
}

/// Fractional scale growth per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultZoomSpeed(pub f64);

impl Default for DefaultZoomSpeed {
    fn default() -> Self {
        Self(0.03)
    }
}

/// Subtitle overlay appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    /// Fontconfig family name, used when no font file is given.
    pub font: String,

    /// Explicit font file; takes precedence over `font`.
    pub font_file: Option<PathBuf>,

    /// Font size in output pixels.
    pub font_size: u32,

    /// Text color (ffmpeg color syntax, e.g. `white` or `#ffffff`).
    pub color: String,

    /// Distance kept free on the left and right of the wrapped text.
    pub side_margin: u32,

    /// Distance between the bottom of the text block and the canvas bottom.
    pub bottom_margin: u32,

    /// Extra pixels between wrapped lines.
    pub line_spacing: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "Sans Bold".to_string(),
            font_file: None,
            font_size: 48,
            color: "white".to_string(),
            side_margin: 100,
            bottom_margin: 200,
            line_spacing: 8,
        }
    }
}

/// Output container/codec combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Webm,
}

impl OutputFormat {
    /// File extension (without the dot) of the container.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4H264 | OutputFormat::Mp4H265 => "mp4",
            OutputFormat::Webm => "webm",
        }
    }

    /// Parse the CLI/config spelling of a format.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mp4-h264" | "h264" => Some(OutputFormat::Mp4H264),
            "mp4-h265" | "h265" => Some(OutputFormat::Mp4H265),
            "webm" => Some(OutputFormat::Webm),
            _ => None,
        }
    }
}

/// Encoder parameters handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecParams {
    pub format: OutputFormat,

    /// x264/x265 preset.
    pub preset: String,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4H264,
            preset: "medium".to_string(),
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "slidecast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            composition: CompositionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the given location.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("slidecast").join("config.json")
}

/// Default job workspace directory.
fn default_workspace_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("slidecast").join("jobs")
}
