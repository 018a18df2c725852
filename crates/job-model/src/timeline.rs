//! Timed plan entries: image slots and subtitle segments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing accumulated float timings.
pub const TIME_EPSILON: f64 = 1e-6;

/// Continuous uniform zoom-in: `scale(t) = 1 + speed * t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomMotion {
    /// Fractional scale growth per second.
    pub speed: f64,
}

impl ZoomMotion {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    /// Scale factor `t` seconds after the slot began.
    pub fn scale_at(&self, t: f64) -> f64 {
        1.0 + self.speed * t.max(0.0)
    }
}

/// The interval during which one input image is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub image: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub zoom: ZoomMotion,
}

impl ImageSlot {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Zoom scale at the end of the slot.
    pub fn final_scale(&self) -> f64 {
        self.zoom.scale_at(self.duration_secs)
    }
}

/// The interval during which one subtitle chunk is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

impl SubtitleSegment {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether `t` falls in the half-open display window `[start, end)`.
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }
}

/// Planner output for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub audio_duration_secs: f64,
    pub slots: Vec<ImageSlot>,
    pub segments: Vec<SubtitleSegment>,
}

impl Plan {
    /// Sum of all slot durations.
    pub fn slots_total_secs(&self) -> f64 {
        self.slots.iter().map(|slot| slot.duration_secs).sum()
    }
}
