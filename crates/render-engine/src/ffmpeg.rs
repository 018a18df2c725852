//! FFmpeg render backend.
//!
//! Each visual layer becomes a looped still input that is scaled to its
//! fitted size, overlaid on a black canvas, zoomed with `zoompan` and
//! trimmed to a whole number of frames. Slot cuts land on the frame nearest
//! each slot's absolute start, so the slots always add up to the narration's
//! frame count. The layers are concatenated with hard cuts, padded
//! by cloning the last frame, and subtitles are burned with one `drawtext`
//! per wrapped line. Subtitle text reaches ffmpeg through text files so no
//! user text ever needs filter-graph escaping.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use slidecast_common::clock::FrameClock;
use slidecast_common::config::{CanvasConfig, CodecParams, OutputFormat};
use slidecast_common::error::{SlidecastError, SlidecastResult};
use slidecast_job_model::scene::{Scene, TextLayer, VisualLayer};

use crate::export::{ProgressCallback, RenderBackend, RenderProgress, RenderRequest, RenderStage};
use crate::probe::command_exists;

/// Upper bound for the zoom factor handed to `zoompan`.
const MAX_ZOOM: f64 = 10.0;

/// ffmpeg-driven [`RenderBackend`].
#[derive(Debug, Default)]
pub struct FfmpegBackend;

/// Everything needed to spawn one ffmpeg run.
#[derive(Debug, Clone)]
struct RenderPlan {
    ffmpeg_args: Vec<String>,
    total_frames: u64,
    expected_duration_secs: f64,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn run_ffmpeg(
        &self,
        label: &str,
        plan: &RenderPlan,
        progress: Option<ProgressCallback>,
    ) -> SlidecastResult<()> {
        tracing::debug!(args = ?plan.ffmpeg_args, "Running ffmpeg");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&plan.ffmpeg_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| SlidecastError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            job = label,
            pid = child.id(),
            args_len = plan.ffmpeg_args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SlidecastError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlidecastError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe is full.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = match reader.read_line(&mut line) {
                Ok(bytes) => bytes,
                Err(err) => {
                    let stderr_output = abort_child(&mut child, stderr_task);
                    return Err(SlidecastError::render(format!(
                        "Failed reading ffmpeg progress: {err}: {}",
                        stderr_tail(&stderr_output, 20)
                    )));
                }
            };
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = &progress {
                cb(progress_report(
                    &latest,
                    plan.total_frames,
                    plan.expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    job = label,
                    out_time_secs = latest.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| SlidecastError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            if let Some(cb) = &progress {
                cb(RenderProgress::at_stage(RenderStage::Failed, plan.total_frames));
            }
            return Err(SlidecastError::render(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_tail(&stderr_output, 20)
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress::at_stage(RenderStage::Complete, plan.total_frames));
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        request: &RenderRequest<'_>,
        progress: Option<ProgressCallback>,
    ) -> SlidecastResult<()> {
        let scene = request.scene;
        let clock = FrameClock::new(scene.canvas.fps);
        let total_frames = clock.frames_for(scene.duration_secs);

        if let Some(cb) = &progress {
            cb(RenderProgress::at_stage(RenderStage::Preparing, total_frames));
        }

        let scratch = scratch_dir(request.output_path);
        std::fs::create_dir_all(&scratch)?;

        let result = write_text_files(&scratch, &scene.text_layers).and_then(|text_files| {
            let plan = RenderPlan {
                ffmpeg_args: build_ffmpeg_args(scene, request.codec, &text_files, request.output_path),
                total_frames,
                expected_duration_secs: scene.duration_secs,
            };
            self.run_ffmpeg(request.label, &plan, progress)
        });

        if let Err(err) = std::fs::remove_dir_all(&scratch) {
            tracing::warn!(path = %scratch.display(), error = %err, "Failed to remove ffmpeg scratch dir");
        }

        result
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Kill a child whose progress can no longer be followed, reap it and
/// collect whatever it wrote to stderr.
fn abort_child(child: &mut Child, stderr_task: JoinHandle<String>) -> String {
    if let Err(err) = child.kill() {
        tracing::warn!(pid = child.id(), error = %err, "Failed to kill ffmpeg");
    }
    if let Err(err) = child.wait() {
        tracing::warn!(pid = child.id(), error = %err, "Failed to reap ffmpeg");
    }
    stderr_task
        .join()
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
}

/// Scratch directory for subtitle text files, next to the encoded file.
fn scratch_dir(output_path: &Path) -> PathBuf {
    let name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_path.with_file_name(format!(".{name}.text"))
}

/// One file per wrapped line, indexed `[layer][line]`.
fn write_text_files(dir: &Path, layers: &[TextLayer]) -> SlidecastResult<Vec<Vec<PathBuf>>> {
    layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            layer
                .lines
                .iter()
                .enumerate()
                .map(|(j, line)| -> SlidecastResult<PathBuf> {
                    let path = dir.join(format!("seg{i:04}_{j:02}.txt"));
                    std::fs::write(&path, line)?;
                    Ok(path)
                })
                .collect::<SlidecastResult<Vec<_>>>()
        })
        .collect()
}

/// Full ffmpeg command line (without the binary name).
fn build_ffmpeg_args(
    scene: &Scene,
    codec: &CodecParams,
    text_files: &[Vec<PathBuf>],
    output_path: &Path,
) -> Vec<String> {
    let clock = FrameClock::new(scene.canvas.fps);
    let fps = clock.fps();
    let mut args: Vec<String> = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
    ];

    // One spare frame per input so `trim` always has enough to cut from.
    for (layer, frames) in scene.visual_layers.iter().zip(slot_frame_counts(scene)) {
        args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.to_string(),
            "-t".to_string(),
            format_secs(clock.frame_time(frames + 1)),
            "-i".to_string(),
            layer.source.to_string_lossy().into_owned(),
        ]);
    }
    args.extend(["-i".to_string(), scene.audio.source.to_string_lossy().into_owned()]);
    let audio_index = scene.visual_layers.len();

    args.extend([
        "-filter_complex".to_string(),
        build_filter_graph(scene, text_files),
        "-map".to_string(),
        "[vout]".to_string(),
        "-map".to_string(),
        format!("{audio_index}:a:0"),
        "-t".to_string(),
        format_secs(scene.duration_secs),
        "-r".to_string(),
        fps.to_string(),
    ]);
    args.extend(codec_args(codec));
    args.extend([
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        output_path.to_string_lossy().into_owned(),
    ]);

    args
}

/// Frames each visual layer is shown for.
///
/// Every cut sits on the frame nearest the slot's end and the last slot
/// ends on the narration's final frame, so the counts sum to
/// `frames_for(duration)` exactly. When there are at least as many frames
/// as slots each slot keeps one frame or more; otherwise some slots get
/// none.
fn slot_frame_counts(scene: &Scene) -> Vec<u64> {
    let clock = FrameClock::new(scene.canvas.fps);
    let total = clock.frames_for(scene.duration_secs);
    let layers = scene.visual_layers.len() as u64;

    let mut counts = Vec::with_capacity(scene.visual_layers.len());
    let mut start = 0u64;
    for (i, layer) in scene.visual_layers.iter().enumerate() {
        let after = layers - i as u64 - 1;
        let nearest = clock.nearest_frame(layer.end_secs());
        let end = if after == 0 {
            total
        } else if total >= layers {
            nearest.max(start + 1).min(total - after)
        } else {
            nearest.clamp(start, total)
        };
        counts.push(end - start);
        start = end;
    }
    counts
}

fn build_filter_graph(scene: &Scene, text_files: &[Vec<PathBuf>]) -> String {
    let canvas = scene.canvas;
    let shown: Vec<(usize, u64)> = slot_frame_counts(scene)
        .into_iter()
        .enumerate()
        .filter(|&(i, frames)| {
            if frames == 0 {
                tracing::warn!(
                    layer = i,
                    source = %scene.visual_layers[i].source.display(),
                    "Slot shorter than one frame, image skipped"
                );
            }
            frames > 0
        })
        .collect();

    let mut chains: Vec<String> = shown
        .iter()
        .map(|&(i, frames)| visual_chain(i, &scene.visual_layers[i], canvas, frames))
        .collect();

    let labels: String = shown.iter().map(|(i, _)| format!("[v{i}]")).collect();
    chains.push(format!(
        "{labels}concat=n={n}:v=1:a=0,format=yuv420p,tpad=stop_mode=clone:stop_duration={pad}[base]",
        n = shown.len(),
        pad = format_secs(2.0 / canvas.fps.max(1) as f64),
    ));

    let drawtexts: Vec<String> = scene
        .text_layers
        .iter()
        .zip(text_files)
        .flat_map(|(layer, files)| drawtext_filters(layer, files))
        .collect();
    if drawtexts.is_empty() {
        chains.push("[base]null[vout]".to_string());
    } else {
        chains.push(format!("[base]{}[vout]", drawtexts.join(",")));
    }

    chains.join(";")
}

/// scale → overlay on black → zoompan → trim for one slot of `frames` frames.
fn visual_chain(index: usize, layer: &VisualLayer, canvas: CanvasConfig, frames: u64) -> String {
    let clock = FrameClock::new(canvas.fps);
    let fps = clock.fps();
    let rect = layer.placement;
    format!(
        "[{index}:v]scale={w}:{h}:flags=lanczos,setsar=1[img{index}];\
         color=c=black:s={cw}x{ch}:r={fps}:d={dur}[bg{index}];\
         [bg{index}][img{index}]overlay=x={x}:y={y}:shortest=1,\
         zoompan=z='min(1+{speed}*on/{fps},{max_zoom})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={cw}x{ch}:fps={fps},\
         trim=end_frame={frames},setpts=PTS-STARTPTS[v{index}]",
        w = rect.width.round() as i64,
        h = rect.height.round() as i64,
        cw = canvas.width,
        ch = canvas.height,
        x = rect.x.round() as i64,
        y = rect.y.round() as i64,
        dur = format_secs(clock.frame_time(frames + 1)),
        speed = layer.zoom.speed,
        max_zoom = MAX_ZOOM,
    )
}

/// One `drawtext` per wrapped line, stacked upward from the bottom margin.
fn drawtext_filters(layer: &TextLayer, files: &[PathBuf]) -> Vec<String> {
    let style = &layer.style;
    let line_height = style.font_size + style.line_spacing;
    let font = match &style.font_file {
        Some(file) => format!("fontfile={}", escape_value(&file.to_string_lossy())),
        None => format!("font={}", escape_value(&style.font)),
    };
    let count = files.len();

    files
        .iter()
        .enumerate()
        .map(|(j, file)| {
            let rise = layer.bottom_margin + (count - j) as u32 * line_height;
            format!(
                "drawtext=textfile={file}:expansion=none:{font}:fontsize={size}:fontcolor={color}:\
                 x=(w-text_w)/2:y=h-{rise}:enable='gte(t,{start})*lt(t,{end})'",
                file = escape_value(&file.to_string_lossy()),
                size = style.font_size,
                color = escape_value(&style.color),
                start = format_secs(layer.start_secs),
                end = format_secs(layer.end_secs),
            )
        })
        .collect()
}

fn codec_args(codec: &CodecParams) -> Vec<String> {
    let video_bitrate = format!("{}k", codec.video_bitrate_kbps.max(500));
    let audio_bitrate = format!("{}k", codec.audio_bitrate_kbps.max(64));

    let mut args: Vec<String> = match codec.format {
        OutputFormat::Mp4H264 => vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            codec.preset.clone(),
            "-profile:v".to_string(),
            "high".to_string(),
        ],
        OutputFormat::Mp4H265 => vec![
            "-c:v".to_string(),
            "libx265".to_string(),
            "-preset".to_string(),
            codec.preset.clone(),
            "-tag:v".to_string(),
            "hvc1".to_string(),
        ],
        OutputFormat::Webm => vec!["-c:v".to_string(), "libvpx-vp9".to_string()],
    };

    args.extend([
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-b:v".to_string(),
        video_bitrate,
    ]);

    match codec.format {
        OutputFormat::Mp4H264 | OutputFormat::Mp4H265 => args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            audio_bitrate,
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]),
        OutputFormat::Webm => args.extend([
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            audio_bitrate,
        ]),
    }

    args
}

/// Escape a filter option value for both levels ffmpeg parses it at:
/// first as an option inside its filter, then as part of the graph.
fn escape_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn format_secs(secs: f64) -> String {
    format!("{:.6}", secs.max(0.0))
}

/// Last `lines` lines of ffmpeg's stderr, which hold the actual error.
fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.trim().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Rendering
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_job_model::geometry::FittedRect;
    use slidecast_job_model::media::ImageSource;
    use slidecast_job_model::scene::{AudioLayer, TextStyle};
    use slidecast_job_model::timeline::ZoomMotion;

    fn visual(source: &str, start: f64, duration: f64, w: u32, h: u32) -> VisualLayer {
        VisualLayer {
            source: PathBuf::from(source),
            start_secs: start,
            duration_secs: duration,
            placement: FittedRect::fit_shorter_side(&ImageSource::new(source, w, h).unwrap(), 1080, 1920),
            zoom: ZoomMotion::new(0.03),
        }
    }

    fn text(start: f64, end: f64, lines: &[&str]) -> TextLayer {
        TextLayer {
            start_secs: start,
            end_secs: end,
            text: lines.join(" "),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            style: TextStyle {
                font: "Sans Bold".to_string(),
                font_file: None,
                font_size: 48,
                color: "white".to_string(),
                line_spacing: 8,
            },
            wrap_width: 880,
            bottom_margin: 200,
        }
    }

    fn scene() -> Scene {
        Scene {
            canvas: CanvasConfig::default(),
            duration_secs: 6.0,
            visual_layers: vec![
                visual("/up/img1.jpg", 0.0, 3.0, 1920, 1080),
                visual("/up/img2.jpg", 3.0, 3.0, 900, 1200),
            ],
            text_layers: vec![
                text(0.0, 4.0, &["first line", "second line"]),
                text(4.0, 6.0, &["tail"]),
            ],
            audio: AudioLayer {
                source: PathBuf::from("/up/audio.mp3"),
                start_secs: 0.0,
                duration_secs: 6.0,
            },
        }
    }

    fn files() -> Vec<Vec<PathBuf>> {
        vec![
            vec![PathBuf::from("/t/seg0000_00.txt"), PathBuf::from("/t/seg0000_01.txt")],
            vec![PathBuf::from("/t/seg0001_00.txt")],
        ]
    }

    #[test]
    fn test_args_map_inputs_in_order() {
        let args = build_ffmpeg_args(&scene(), &CodecParams::default(), &files(), Path::new("/o/x.partial.mp4"));
        let inputs: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-i")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(inputs, vec!["/up/img1.jpg", "/up/img2.jpg", "/up/audio.mp3"]);

        let joined = args.join(" ");
        assert!(joined.contains("-map 2:a:0"));
        assert!(joined.contains("-t 6.000000 -r 25"));
        assert!(joined.contains("-c:v libx264 -preset medium"));
        assert!(joined.contains("-c:a aac"));
        assert_eq!(args.last().map(String::as_str), Some("/o/x.partial.mp4"));
    }

    #[test]
    fn test_filter_graph_layers_and_zoom() {
        let graph = build_filter_graph(&scene(), &files());

        // Landscape fills canvas height; portrait fills canvas width.
        assert!(graph.contains("[0:v]scale=3414:1920"));
        assert!(graph.contains("overlay=x=-1167:y=0"));
        assert!(graph.contains("[1:v]scale=1080:1440"));
        assert!(graph.contains("overlay=x=0:y=240"));
        assert!(graph.contains("zoompan=z='min(1+0.03*on/25,10)'"));
        assert!(graph.contains("trim=end_frame=75,"));
        assert!(graph.contains("[v0][v1]concat=n=2:v=1:a=0"));
        assert!(graph.ends_with("[vout]"));
    }

    #[test]
    fn test_drawtext_per_line_with_enable_window() {
        let graph = build_filter_graph(&scene(), &files());
        assert_eq!(graph.matches("drawtext=").count(), 3);
        assert!(graph.contains("textfile=/t/seg0000_00.txt:expansion=none"));
        // Two lines of 56px stacked above the 200px margin.
        assert!(graph.contains("y=h-312:enable='gte(t,0.000000)*lt(t,4.000000)'"));
        assert!(graph.contains("y=h-256:enable='gte(t,0.000000)*lt(t,4.000000)'"));
        assert!(graph.contains("y=h-256:enable='gte(t,4.000000)*lt(t,6.000000)'"));
        assert!(graph.contains("font=Sans Bold:fontsize=48:fontcolor=white:"));
    }

    #[test]
    fn test_no_text_layers_pass_base_through() {
        let mut scene = scene();
        scene.text_layers.clear();
        let graph = build_filter_graph(&scene, &[]);
        assert!(graph.ends_with("[base]null[vout]"));
        assert!(!graph.contains("drawtext"));
    }

    #[test]
    fn test_codec_args_per_format() {
        let webm = CodecParams {
            format: OutputFormat::Webm,
            ..CodecParams::default()
        };
        let args = codec_args(&webm).join(" ");
        assert!(args.contains("libvpx-vp9"));
        assert!(args.contains("libopus"));
        assert!(!args.contains("faststart"));

        let h265 = CodecParams {
            format: OutputFormat::Mp4H265,
            preset: "fast".to_string(),
            ..CodecParams::default()
        };
        let args = codec_args(&h265).join(" ");
        assert!(args.contains("libx265 -preset fast"));
        assert!(args.contains("-b:v 8000k"));
    }

    #[test]
    fn test_filter_values_escaped_for_option_and_graph() {
        assert_eq!(escape_value("plain value"), "plain value");
        assert_eq!(escape_value("a:b"), "a\\\\:b");
        assert_eq!(escape_value("it's"), "it\\\\\\'s");
        assert_eq!(escape_value("C:\\fonts"), "C\\\\:\\\\\\\\fonts");
        assert_eq!(escape_value("x[1],y;z"), "x\\[1\\]\\,y\\;z");
    }

    #[test]
    fn test_font_file_with_separators_stays_one_option() {
        let mut scene = scene();
        scene.text_layers[1].style.font_file = Some(PathBuf::from("/fonts/it's:bold.ttf"));
        let graph = build_filter_graph(&scene, &files());
        assert!(graph.contains("fontfile=/fonts/it\\\\\\'s\\\\:bold.ttf:fontsize=48"));
        assert!(!graph.contains("'s:bold"));
    }

    fn layers_from_allocation(count: usize, duration: f64) -> Scene {
        let durations = slidecast_planner::allocate_image_durations(count, duration).unwrap();
        let mut start = 0.0;
        let visual_layers = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let layer = visual(&format!("/up/img{i}.jpg"), start, d, 1080, 1920);
                start += d;
                layer
            })
            .collect();
        Scene {
            duration_secs: duration,
            visual_layers,
            text_layers: Vec::new(),
            ..scene()
        }
    }

    fn trimmed_frames(graph: &str) -> Vec<u64> {
        graph
            .split("trim=end_frame=")
            .skip(1)
            .map(|rest| rest.split(',').next().unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn test_short_slots_fill_the_narration_exactly() {
        for (count, duration) in [(30, 10.0), (7, 10.0), (3, 9.0), (1, 2.5)] {
            let scene = layers_from_allocation(count, duration);
            let frames = trimmed_frames(&build_filter_graph(&scene, &[]));
            let total = FrameClock::new(25).frames_for(duration);

            assert_eq!(frames.len(), count, "{count} images over {duration}s");
            assert_eq!(frames.iter().sum::<u64>(), total, "{count} images over {duration}s");
            assert!(frames.iter().all(|&f| f > 0));
        }
    }

    #[test]
    fn test_slot_cuts_follow_absolute_starts() {
        // 10s / 7 at 25 fps: cuts at round(k * 250 / 7).
        let scene = layers_from_allocation(7, 10.0);
        assert_eq!(slot_frame_counts(&scene), vec![36, 35, 36, 36, 36, 35, 36]);

        let args = build_ffmpeg_args(&scene, &CodecParams::default(), &[], Path::new("/o/x.mp4")).join(" ");
        assert!(args.contains("-t 1.480000 -i /up/img0.jpg"));
        assert!(args.contains("-t 10.000000 -r 25"));
    }

    #[test]
    fn test_slots_shorter_than_a_frame_are_skipped() {
        // 30 images over 13 frames.
        let scene = layers_from_allocation(30, 0.5);
        let counts = slot_frame_counts(&scene);
        assert_eq!(counts.iter().sum::<u64>(), 13);
        let shown = counts.iter().filter(|&&f| f > 0).count();
        assert!(shown < 30);

        let graph = build_filter_graph(&scene, &[]);
        let frames = trimmed_frames(&graph);
        assert_eq!(frames.len(), shown);
        assert_eq!(frames.iter().sum::<u64>(), 13);
        assert!(graph.contains(&format!("concat=n={shown}:")));
    }

    #[test]
    fn test_aborted_child_is_killed_and_reaped() {
        let mut child = Command::new("sh")
            .args(["-c", "echo started >&2; exec sleep 30"])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut stderr = child.stderr.take().unwrap();
        let stderr_task = std::thread::spawn(move || {
            let mut output = String::new();
            stderr.read_to_string(&mut output).ok();
            output
        });

        let started = std::time::Instant::now();
        abort_child(&mut child, stderr_task);

        assert!(child.try_wait().unwrap().is_some());
        assert!(started.elapsed().as_secs() < 10);
    }

    #[test]
    fn test_text_files_written_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let layers = scene().text_layers;
        let files = write_text_files(dir.path(), &layers).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].len(), 2);
        assert_eq!(std::fs::read_to_string(&files[0][1]).unwrap(), "second line");
    }

    #[test]
    fn test_scratch_dir_sits_next_to_output() {
        assert_eq!(
            scratch_dir(Path::new("/out/ab.partial.mp4")),
            PathBuf::from("/out/.ab.partial.mp4.text")
        );
    }

    #[test]
    fn test_progress_state_parsing() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "3000000");
        assert!((state.out_time_secs - 3.0).abs() < 1e-9);

        let report = progress_report(&state, 150, 6.0, 2.0);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert_eq!(report.frames_rendered, 75);
        assert!((report.eta_secs - 2.0).abs() < 1e-9);
        assert_eq!(report.stage, RenderStage::Rendering);

        state.update("progress", "end");
        let report = progress_report(&state, 150, 6.0, 4.0);
        assert_eq!(report.progress, 1.0);
        assert_eq!(report.stage, RenderStage::Finalizing);
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = "a\nb\nc\nd\n";
        assert_eq!(stderr_tail(stderr, 2), "c\nd");
        assert_eq!(stderr_tail("", 5), "");
    }
}
