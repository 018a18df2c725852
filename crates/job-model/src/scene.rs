//! The declarative composition handed to a renderer.
//!
//! A [`Scene`] is plain data: it can be serialized, inspected, and
//! validated without invoking any renderer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use slidecast_common::config::CanvasConfig;
use slidecast_common::error::{SlidecastError, SlidecastResult};

use crate::geometry::FittedRect;
use crate::timeline::{ZoomMotion, TIME_EPSILON};

/// Complete composition for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub canvas: CanvasConfig,

    /// Total duration; equals the audio duration.
    pub duration_secs: f64,

    /// Image layers, concatenated back to back with hard cuts.
    pub visual_layers: Vec<VisualLayer>,

    /// Timed subtitle overlays above the visual track.
    pub text_layers: Vec<TextLayer>,

    /// Narration spanning the whole scene.
    pub audio: AudioLayer,
}

/// One zooming still image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLayer {
    pub source: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,

    /// Placement at zoom scale 1.0.
    pub placement: FittedRect,

    pub zoom: ZoomMotion,
}

impl VisualLayer {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Placement `t` seconds into the scene, zoom applied.
    pub fn placement_at(&self, t: f64) -> FittedRect {
        self.placement.scaled(self.zoom.scale_at(t - self.start_secs))
    }
}

/// Text appearance, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: String,
    pub font_file: Option<PathBuf>,
    pub font_size: u32,
    pub color: String,
    pub line_spacing: u32,
}

/// One subtitle overlay, visible during `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub start_secs: f64,
    pub end_secs: f64,

    /// Unwrapped text.
    pub text: String,

    /// Text after word wrapping, one entry per rendered line.
    pub lines: Vec<String>,

    pub style: TextStyle,

    /// Maximum line width in pixels.
    pub wrap_width: u32,

    /// Distance between the bottom of the text block and the canvas bottom.
    pub bottom_margin: u32,
}

impl TextLayer {
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }
}

/// The narration track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLayer {
    pub source: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl Scene {
    /// Sum of visual layer durations.
    pub fn visual_duration_secs(&self) -> f64 {
        self.visual_layers.iter().map(|l| l.duration_secs).sum()
    }

    /// Visual layer on screen at time `t`.
    pub fn visual_at(&self, t: f64) -> Option<&VisualLayer> {
        self.visual_layers
            .iter()
            .find(|layer| t >= layer.start_secs && t < layer.end_secs())
    }

    /// Text layer visible at time `t`.
    pub fn text_at(&self, t: f64) -> Option<&TextLayer> {
        self.text_layers.iter().find(|layer| layer.is_visible_at(t))
    }

    /// Check the timeline invariants a renderer relies on.
    pub fn validate(&self) -> SlidecastResult<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(invalid(format!(
                "scene duration must be positive, got {}",
                self.duration_secs
            )));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 || self.canvas.fps == 0 {
            return Err(invalid("canvas dimensions and fps must be non-zero"));
        }
        if self.visual_layers.is_empty() {
            return Err(invalid("scene has no visual layers"));
        }

        let mut cursor = 0.0;
        for (idx, layer) in self.visual_layers.iter().enumerate() {
            if layer.duration_secs <= 0.0 {
                return Err(invalid(format!("visual layer {idx} has no duration")));
            }
            if (layer.start_secs - cursor).abs() > TIME_EPSILON {
                return Err(invalid(format!(
                    "visual layer {idx} starts at {:.6}s, expected {:.6}s",
                    layer.start_secs, cursor
                )));
            }
            if !layer.zoom.speed.is_finite() || layer.zoom.speed < 0.0 {
                return Err(invalid(format!("visual layer {idx} has invalid zoom speed")));
            }
            cursor = layer.end_secs();
        }
        if (cursor - self.duration_secs).abs() > TIME_EPSILON {
            return Err(invalid(format!(
                "visual track lasts {cursor:.6}s but scene lasts {:.6}s",
                self.duration_secs
            )));
        }

        let mut previous_end = 0.0;
        for (idx, layer) in self.text_layers.iter().enumerate() {
            if layer.end_secs <= layer.start_secs {
                return Err(invalid(format!("text layer {idx} has an empty window")));
            }
            if layer.start_secs < previous_end - TIME_EPSILON {
                return Err(invalid(format!("text layer {idx} overlaps its predecessor")));
            }
            if layer.end_secs > self.duration_secs + TIME_EPSILON {
                return Err(invalid(format!("text layer {idx} runs past the scene end")));
            }
            previous_end = layer.end_secs;
        }

        if self.audio.start_secs.abs() > TIME_EPSILON
            || (self.audio.duration_secs - self.duration_secs).abs() > TIME_EPSILON
        {
            return Err(invalid("audio layer must span the whole scene"));
        }

        Ok(())
    }

    pub fn to_json_pretty(&self) -> SlidecastResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(msg: impl Into<String>) -> SlidecastError {
    SlidecastError::invalid_input(format!("Invalid scene: {}", msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageSource;

    fn style() -> TextStyle {
        TextStyle {
            font: "Sans Bold".to_string(),
            font_file: None,
            font_size: 48,
            color: "white".to_string(),
            line_spacing: 8,
        }
    }

    fn layer(start: f64, duration: f64) -> VisualLayer {
        VisualLayer {
            source: format!("img{start}.jpg").into(),
            start_secs: start,
            duration_secs: duration,
            placement: FittedRect::fit_shorter_side(
                &ImageSource::new("img1.jpg", 1080, 1920).unwrap(),
                1080,
                1920,
            ),
            zoom: ZoomMotion::new(0.03),
        }
    }

    fn text(start: f64, end: f64) -> TextLayer {
        TextLayer {
            start_secs: start,
            end_secs: end,
            text: "hello world".to_string(),
            lines: vec!["hello world".to_string()],
            style: style(),
            wrap_width: 880,
            bottom_margin: 200,
        }
    }

    fn scene() -> Scene {
        Scene {
            canvas: CanvasConfig::default(),
            duration_secs: 6.0,
            visual_layers: vec![layer(0.0, 3.0), layer(3.0, 3.0)],
            text_layers: vec![text(0.0, 4.0), text(4.0, 6.0)],
            audio: AudioLayer {
                source: "audio.mp3".into(),
                start_secs: 0.0,
                duration_secs: 6.0,
            },
        }
    }

    #[test]
    fn test_valid_scene_passes() {
        scene().validate().unwrap();
    }

    #[test]
    fn test_gap_between_visual_layers_is_rejected() {
        let mut s = scene();
        s.visual_layers[1].start_secs = 3.5;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("visual layer 1"));
    }

    #[test]
    fn test_overlapping_text_is_rejected() {
        let mut s = scene();
        s.text_layers[1].start_secs = 3.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_short_audio_is_rejected() {
        let mut s = scene();
        s.audio.duration_secs = 5.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_lookup_by_time() {
        let s = scene();
        assert_eq!(s.visual_at(3.0).unwrap().start_secs, 3.0);
        assert_eq!(s.text_at(4.0).unwrap().start_secs, 4.0);
        assert!(s.text_at(6.0).is_none());
        let zoomed = s.visual_layers[1].placement_at(5.0);
        assert!((zoomed.width - 1080.0 * 1.06).abs() < 1e-9);
    }

    #[test]
    fn test_scene_serializes_to_json() {
        let json = scene().to_json_pretty().unwrap();
        let parsed: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scene());
    }
}
