//! Slidecast Render Engine
//!
//! Turns a planned job into a finished vertical video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! img1.jpg ─┐
//! img2.jpg ─┼── probe ── plan ── Scene ──┬── visual layers (fit, center, zoom)
//! audio.mp3 ┘                            ├── text layers (wrapped, timed)
//!                                        └── audio layer
//!                                                 │
//!                                                 ▼
//!                                        RenderBackend (ffmpeg)
//!                                                 │
//!                                                 ▼
//!                                    <id>.partial.mp4 → <id>.mp4
//! ```

pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod pipeline;
pub mod probe;

pub use compositor::{build_scene, compute_compositions, wrap_text, FrameComposition};
pub use export::*;
pub use ffmpeg::FfmpegBackend;
pub use pipeline::{run_job, BackendFactory, JobOutcome, JobRunner};
pub use probe::{command_exists, FfprobeProbe};
