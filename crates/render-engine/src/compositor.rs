//! Scene composition: turns a numeric plan into layered, timed elements.
//!
//! This module only produces data. Nothing here touches a renderer; the
//! resulting [`Scene`] can be inspected, serialized, or sampled frame by
//! frame before anything is encoded.

use serde::Serialize;
use slidecast_common::clock::FrameClock;
use slidecast_common::config::CompositionConfig;
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::geometry::FittedRect;
use slidecast_job_model::media::{AudioSource, ImageSource};
use slidecast_job_model::scene::{AudioLayer, Scene, TextLayer, TextStyle, VisualLayer};
use slidecast_job_model::timeline::{Plan, TIME_EPSILON};

/// Average glyph advance as a fraction of the font size, used for wrapping.
const AVG_GLYPH_WIDTH_RATIO: f64 = 0.55;

/// Build the scene for a planned job.
///
/// `images` must be the probed sources of the plan's slots, in slot order.
pub fn build_scene(
    plan: &Plan,
    images: &[ImageSource],
    audio: &AudioSource,
    config: &CompositionConfig,
) -> SlidecastResult<Scene> {
    if images.len() != plan.slots.len() {
        return Err(SlidecastError::invalid_input(format!(
            "Plan has {} slots but {} image sources were supplied",
            plan.slots.len(),
            images.len()
        )));
    }
    if (plan.audio_duration_secs - audio.duration_secs).abs() > TIME_EPSILON {
        return Err(SlidecastError::invalid_input(format!(
            "Plan covers {:.6}s but the audio lasts {:.6}s",
            plan.audio_duration_secs, audio.duration_secs
        )));
    }

    let canvas = config.canvas;
    let visual_layers = plan
        .slots
        .iter()
        .zip(images)
        .map(|(slot, image)| {
            if slot.image != image.path {
                return Err(SlidecastError::invalid_input(format!(
                    "Slot image {} does not match probed source {}",
                    slot.image.display(),
                    image.path.display()
                )));
            }
            Ok(VisualLayer {
                source: image.path.clone(),
                start_secs: slot.start_secs,
                duration_secs: slot.duration_secs,
                placement: FittedRect::fit_shorter_side(image, canvas.width, canvas.height),
                zoom: slot.zoom,
            })
        })
        .collect::<SlidecastResult<Vec<_>>>()?;

    let style = &config.subtitle_style;
    let wrap_width = canvas
        .width
        .saturating_sub(style.side_margin.saturating_mul(2))
        .max(style.font_size);
    let text_style = TextStyle {
        font: style.font.clone(),
        font_file: style.font_file.clone(),
        font_size: style.font_size,
        color: style.color.clone(),
        line_spacing: style.line_spacing,
    };

    let text_layers = plan
        .segments
        .iter()
        .map(|segment| TextLayer {
            start_secs: segment.start_secs,
            end_secs: segment.end_secs,
            text: segment.text.clone(),
            lines: wrap_text(&segment.text, wrap_width, style.font_size),
            style: text_style.clone(),
            wrap_width,
            bottom_margin: style.bottom_margin,
        })
        .collect();

    let scene = Scene {
        canvas,
        duration_secs: audio.duration_secs,
        visual_layers,
        text_layers,
        audio: AudioLayer {
            source: audio.path.clone(),
            start_secs: 0.0,
            duration_secs: audio.duration_secs,
        },
    };
    scene.validate()?;

    tracing::debug!(
        visual_layers = scene.visual_layers.len(),
        text_layers = scene.text_layers.len(),
        duration_secs = scene.duration_secs,
        "Scene composed"
    );

    Ok(scene)
}

/// Greedy word wrap against an estimated glyph width.
///
/// Words longer than a full line are kept whole on their own line.
pub fn wrap_text(text: &str, wrap_width: u32, font_size: u32) -> Vec<String> {
    let max_chars = max_chars_per_line(wrap_width, font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn max_chars_per_line(wrap_width: u32, font_size: u32) -> usize {
    let glyph = (font_size.max(1) as f64) * AVG_GLYPH_WIDTH_RATIO;
    ((wrap_width as f64 / glyph).floor() as usize).max(1)
}

/// A single frame's composition, sampled from a scene.
#[derive(Debug, Clone, Serialize)]
pub struct FrameComposition {
    /// Frame number.
    pub frame_index: u64,

    /// Time in seconds.
    pub time_secs: f64,

    /// Index of the visual layer on screen.
    pub layer_index: usize,

    /// Zoom scale of that layer at this frame.
    pub scale: f64,

    /// Image placement with zoom applied.
    pub placement: FittedRect,

    /// Index of the visible text layer, if any.
    pub text_index: Option<usize>,
}

/// Sample the composition of every `stride`-th frame of the scene.
pub fn compute_compositions(scene: &Scene, stride: u64) -> Vec<FrameComposition> {
    let clock = FrameClock::new(scene.canvas.fps);
    let total_frames = clock.frames_for(scene.duration_secs);
    let stride = stride.max(1);
    let mut compositions = Vec::with_capacity((total_frames / stride + 1) as usize);

    let mut layer_index = 0usize;
    for frame in (0..total_frames).step_by(stride as usize) {
        let time_secs = clock.frame_time(frame);

        while layer_index + 1 < scene.visual_layers.len()
            && time_secs >= scene.visual_layers[layer_index].end_secs()
        {
            layer_index += 1;
        }
        let Some(layer) = scene.visual_layers.get(layer_index) else {
            break;
        };

        let local = (time_secs - layer.start_secs).max(0.0);
        compositions.push(FrameComposition {
            frame_index: frame,
            time_secs,
            layer_index,
            scale: layer.zoom.scale_at(local),
            placement: layer.placement_at(time_secs),
            text_index: scene
                .text_layers
                .iter()
                .position(|text| text.is_visible_at(time_secs)),
        });
    }

    compositions
}
