//! Frame clock utilities.
//!
//! Output videos run at a fixed frame rate, so several places need the
//! same conversions:
//! - Seconds to frame counts (progress totals)
//! - Snapping a timestamp to its nearest frame boundary
//! - Checking that a measured duration lands within N frames of the
//!   expected one

/// A fixed-rate frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock for the given frame rate (clamped to at least 1 fps).
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of a single frame in seconds.
    pub fn frame_secs(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Number of frames needed to cover `duration_secs`.
    pub fn frames_for(&self, duration_secs: f64) -> u64 {
        if duration_secs <= 0.0 {
            return 0;
        }
        (duration_secs * self.fps as f64).ceil() as u64
    }

    /// Start time of the given frame.
    pub fn frame_time(&self, frame: u64) -> f64 {
        frame as f64 / self.fps as f64
    }

    /// Frame boundary nearest to `secs`.
    pub fn nearest_frame(&self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.fps as f64).round() as u64
    }
}

/// Difference between an expected and a measured media duration.
#[derive(Debug, Clone, Copy)]
pub struct DurationDrift {
    pub expected_secs: f64,
    pub measured_secs: f64,
}

impl DurationDrift {
    /// Drift in seconds (positive = measured is longer).
    pub fn drift_secs(&self) -> f64 {
        self.measured_secs - self.expected_secs
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_secs() * 1000.0
    }

    /// Whether the measured duration is within `frames` frames of the expected one.
    pub fn within_frames(&self, clock: FrameClock, frames: u32) -> bool {
        self.drift_secs().abs() <= clock.frame_secs() * frames as f64 + 1e-9
    }
}
