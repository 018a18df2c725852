//! Slidecast Timeline Planner
//!
//! Computes the numeric plan of a job from its inputs:
//! - **Slots:** Equal split of the narration among the images
//! - **Subtitles:** Word chunks with reading-speed weighted timings,
//!   scaled to fill the narration exactly
//! - **Captions:** SRT/VTT rendering of the planned segments
//!
//! Planning is pure computation: no I/O and no hidden state, so identical
//! inputs always yield identical plans. Only caption saving touches disk.

pub mod captions;
pub mod plan;
pub mod slots;
pub mod subtitles;

pub use captions::{generate_srt, generate_vtt, save_captions};
pub use plan::plan_job;
pub use slots::allocate_image_durations;
pub use subtitles::plan_subtitles;
