use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::EncodeSettings;
use crate::foundation::core::Canvas;
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::ensure_parent_dir;
use crate::sequence::scan::AttributeSequence;

use super::executor::SequenceEncoder;

/// Encodes an image sequence with the system `ffmpeg` binary (H.264, yuv420p, MP4).
///
/// Every frame is overlaid at the top-left of an opaque background sized to an even canvas, so
/// odd-sized frames are padded and translucent pixels are composited instead of dropped.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
    probe_program: PathBuf,
    threads: Option<u32>,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            probe_program: PathBuf::from("ffprobe"),
            threads: None,
        }
    }
}

impl FfmpegEncoder {
    /// Encoder using `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `ffmpeg` executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Limit the encoder threads of each ffmpeg process.
    pub fn with_threads(mut self, threads: Option<u32>) -> Self {
        self.threads = threads;
        self
    }

    /// Canvas the sequence is encoded onto: the forced size, else the largest width and height
    /// across every frame, both rounded up to even dimensions.
    ///
    /// Smaller frames sit at the top-left of the canvas over the background.
    pub fn canvas_for(seq: &AttributeSequence, settings: &EncodeSettings) -> SplatSeqResult<Canvas> {
        if let Some(size) = settings.frame_size {
            return size.to_even();
        }
        if seq.frames.is_empty() {
            return Err(SplatSeqError::encode(&seq.attribute, "sequence has no frames"));
        }
        let (mut width, mut height) = (0u32, 0u32);
        for frame in &seq.frames {
            let (w, h) = image::image_dimensions(frame).map_err(|e| {
                SplatSeqError::encode(
                    &seq.attribute,
                    format!("cannot read dimensions of '{}': {e}", frame.display()),
                )
            })?;
            width = width.max(w);
            height = height.max(h);
        }
        Canvas::new(width, height)?.to_even()
    }

    /// Build the ffmpeg invocation for one sequence.
    pub fn command(
        &self,
        seq: &AttributeSequence,
        canvas: Canvas,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> Command {
        let fps = settings.fps.to_string();
        let scale = if settings.frame_size.is_some() {
            // Nearest-neighbour keeps attribute texels exact instead of blending them.
            format!("scale={}:{}:flags=neighbor,", canvas.width, canvas.height)
        } else {
            String::new()
        };
        let background = format!(
            "color=c={}:s={}x{}:r={}",
            settings.background.to_ffmpeg(),
            canvas.width,
            canvas.height,
            fps
        );
        let filter = format!(
            "[0:v]{scale}format=rgba[fg];[1:v][fg]overlay=0:0:shortest=1,format=yuv420p[out]"
        );

        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input 0: the frame sequence. Input 1: the opaque backdrop.
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-framerate", &fps, "-start_number", "0", "-i"])
            .arg(seq.pattern())
            .args(["-f", "lavfi", "-i", &background])
            .args(["-filter_complex", &filter, "-map", "[out]"])
            .args(["-frames:v", &seq.len().to_string()])
            .args([
                "-an",
                "-c:v",
                "libx264",
                "-crf",
                &settings.quality.to_string(),
                "-g",
                &settings.keyframe_interval.to_string(),
                "-pix_fmt",
                "yuv420p",
            ]);
        if let Some(threads) = self.threads {
            cmd.args(["-threads", &threads.to_string()]);
        }
        cmd.args(["-movflags", "+faststart"]).arg(out_path);
        cmd
    }
}

impl SequenceEncoder for FfmpegEncoder {
    #[tracing::instrument(skip_all, fields(attribute = %seq.attribute, frames = seq.len()))]
    fn encode(
        &self,
        seq: &AttributeSequence,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> SplatSeqResult<()> {
        if seq.is_empty() {
            return Err(SplatSeqError::encode(&seq.attribute, "sequence has no frames"));
        }
        ensure_parent_dir(out_path)?;
        let canvas = Self::canvas_for(seq, settings)?;
        let mut cmd = self.command(seq, canvas, out_path, settings);
        tracing::debug!(?cmd, "running ffmpeg");

        let output = cmd.output().map_err(|e| {
            SplatSeqError::encode(
                &seq.attribute,
                format!("failed to spawn ffmpeg (is it installed and on PATH?): {e}"),
            )
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplatSeqError::encode(
                &seq.attribute,
                format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        if settings.verify && is_tool_on_path(&self.probe_program) {
            let probe = probe_video(&self.probe_program, out_path)
                .map_err(|e| SplatSeqError::encode(&seq.attribute, e.to_string()))?;
            if probe.frames != seq.len() as u64 {
                return Err(SplatSeqError::encode(
                    &seq.attribute,
                    format!(
                        "video has {} frames, sequence has {}",
                        probe.frames,
                        seq.len()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Stream facts read back from an encoded video.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoProbe {
    /// Coded width.
    pub width: u32,
    /// Coded height.
    pub height: u32,
    /// Decoded frame count.
    pub frames: u64,
}

/// Count the decoded frames of the first video stream with `ffprobe`.
pub fn probe_video(ffprobe: &Path, video: &Path) -> SplatSeqResult<VideoProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        width: Option<u32>,
        height: Option<u32>,
        nb_read_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=width,height,nb_read_frames",
            "-of",
            "json",
        ])
        .arg(video)
        .output()
        .map_err(|e| SplatSeqError::validation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SplatSeqError::validation(format!(
            "ffprobe failed for '{}': {}",
            video.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SplatSeqError::validation(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| SplatSeqError::validation("no video stream found"))?;
    let frames = stream
        .nb_read_frames
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| SplatSeqError::validation("ffprobe did not report a frame count"))?;
    Ok(VideoProbe {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        frames,
    })
}

/// Return `true` when `program -version` runs successfully.
pub fn is_tool_on_path(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path(Path::new("ffmpeg"))
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    is_tool_on_path(Path::new("ffprobe"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
