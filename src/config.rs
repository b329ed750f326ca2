//! Run configuration.
//!
//! A [`PipelineConfig`] is built by the CLI (or by library callers) and validated once before any
//! filesystem work starts.

use std::path::{Path, PathBuf};

use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{SplatSeqError, SplatSeqResult};

/// What to do when the converter fails for one input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertFailurePolicy {
    /// Abort the whole run, naming the first failing input in catalog order.
    #[default]
    Abort,
    /// Log a warning and drop the input from the catalog.
    Skip,
}

/// What to do when an attribute image would land at a different frame index than the one
/// already recorded for its source object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Record and log the mismatch, keep the object's first-seen index.
    #[default]
    Warn,
    /// Fail the run on the first mismatch.
    Fail,
}

/// Which executor handles the fallback transcode when ffmpeg cannot decode a sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Decode in-process with the `image` crate and write PNG.
    #[default]
    Image,
    /// Invoke the external `dwebp` tool.
    Dwebp,
    /// No fallback; primary failures are surfaced as-is.
    None,
}

/// External converter invocation settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ConverterConfig {
    /// Converter executable (looked up on `PATH` when not a path).
    pub program: PathBuf,
    /// Arguments inserted before `<input> <output-meta>`.
    pub extra_args: Vec<String>,
    /// Input file extensions (lower-case, without dot) picked up from the input root.
    pub input_exts: Vec<String>,
    /// Abort or skip when one input fails to convert.
    pub on_failure: ConvertFailurePolicy,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("splat-transform"),
            extra_args: Vec::new(),
            input_exts: ["ply", "splat", "ksplat", "spz"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            on_failure: ConvertFailurePolicy::Abort,
        }
    }
}

/// Video encoder settings shared by every attribute.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncodeSettings {
    /// Output frame rate.
    pub fps: u32,
    /// x264 constant rate factor; lower is higher quality.
    pub quality: u32,
    /// Maximum distance between keyframes, in frames.
    pub keyframe_interval: u32,
    /// Forced canvas; frames are scaled onto it. `None` covers the largest frame.
    pub frame_size: Option<Canvas>,
    /// Backdrop the (possibly translucent) frames are composited over.
    pub background: Rgb8,
    /// Check the produced video's frame count with `ffprobe` when it is available.
    pub verify: bool,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            quality: 15,
            keyframe_interval: 30,
            frame_size: None,
            background: Rgb8::BLACK,
            verify: true,
        }
    }
}

impl EncodeSettings {
    /// Reject settings ffmpeg/libx264 would refuse.
    pub fn validate(&self) -> SplatSeqResult<()> {
        if self.fps == 0 {
            return Err(SplatSeqError::validation("encode fps must be non-zero"));
        }
        if self.quality > 51 {
            return Err(SplatSeqError::validation(format!(
                "encode quality must be within 0..=51, got {}",
                self.quality
            )));
        }
        if self.keyframe_interval == 0 {
            return Err(SplatSeqError::validation(
                "encode keyframe interval must be non-zero",
            ));
        }
        if let Some(size) = self.frame_size {
            Canvas::new(size.width, size.height)?.to_even()?;
        }
        Ok(())
    }
}

/// Full configuration of one pipeline run.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Input file or directory of point clouds. Not used in rebuild mode.
    pub input: Option<PathBuf>,
    /// Run output root.
    pub output: PathBuf,
    /// Converter invocation.
    pub converter: ConverterConfig,
    /// Encoder settings shared by every attribute.
    pub encode: EncodeSettings,
    /// Fallback executor for sequences ffmpeg cannot decode.
    pub fallback: FallbackKind,
    /// Worker count for conversion and encoding; `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Delete pre-existing converter output for an object instead of suffixing its directory.
    pub overwrite: bool,
    /// Skip conversion and sequence the existing `<output>/sog/*` directories.
    pub rebuild: bool,
    /// Handling of frame index mismatches.
    pub mismatch_policy: MismatchPolicy,
}

impl PipelineConfig {
    /// Defaults writing below `output`, with no input set.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            input: None,
            output: output.into(),
            converter: ConverterConfig::default(),
            encode: EncodeSettings::default(),
            fallback: FallbackKind::default(),
            jobs: None,
            overwrite: false,
            rebuild: false,
            mismatch_policy: MismatchPolicy::default(),
        }
    }

    /// Set the input file or directory.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Check paths, worker count and encoder settings before any filesystem work.
    pub fn validate(&self) -> SplatSeqResult<()> {
        if self.output.as_os_str().is_empty() {
            return Err(SplatSeqError::validation("output path is required"));
        }
        if !self.rebuild {
            let input = self.input.as_deref().ok_or_else(|| {
                SplatSeqError::validation("input path is required unless rebuilding")
            })?;
            if !input.exists() {
                return Err(SplatSeqError::validation(format!(
                    "input path '{}' does not exist",
                    input.display()
                )));
            }
            if self.converter.program.as_os_str().is_empty() {
                return Err(SplatSeqError::validation("converter executable is required"));
            }
            if self.converter.input_exts.is_empty() {
                return Err(SplatSeqError::validation(
                    "at least one input extension is required",
                ));
            }
        }
        if let Some(n) = self.jobs
            && n == 0
        {
            return Err(SplatSeqError::validation("jobs must be >= 1 when set"));
        }
        self.encode.validate()
    }

    /// Worker count, falling back to the host's available parallelism.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Directory layout below [`PipelineConfig::output`].
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output)
    }
}

/// Directory layout below the run output root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    /// Run output root.
    pub root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Converter output, one directory per source object.
    pub fn sog_dir(&self) -> PathBuf {
        self.root.join("sog")
    }

    /// Per-attribute frame sequences, rebuilt on every run.
    pub fn sequences_dir(&self) -> PathBuf {
        self.root.join("sequences")
    }

    /// Side directories holding transcoded frames for the fallback encode path.
    pub fn fallback_dir(&self) -> PathBuf {
        self.root.join("fallback")
    }

    /// Encoded attribute videos and the manifest.
    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    /// `videos/manifest.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.videos_dir().join("manifest.json")
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
