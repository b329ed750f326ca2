//! splatseq turns per-object splat attribute images into per-attribute videos.
//!
//! A run converts every input with an external converter (or reuses existing converter output),
//! gives each object one frame index, links its attribute images into one frame sequence per
//! attribute, encodes each sequence with ffmpeg and writes a manifest mapping every object to its
//! frame and rewritten metadata.
//!
//! - Configure a [`PipelineConfig`]
//! - Pick [`Executors`] (usually [`Executors::from_config`])
//! - Call [`run`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Source catalog: converter invocation and attribute image discovery.
pub mod catalog;
/// Run configuration.
pub mod config;
/// Attribute sequence encoding.
pub mod encode;
/// Tracing subscriber setup.
pub mod logging;
/// Metadata rewriting and the manifest document.
pub mod manifest;
/// End-to-end run.
pub mod pipeline;
/// Frame index assignment and sequence directories.
pub mod sequence;

pub use crate::foundation::core::{
    Canvas, FrameIndex, Rgb8, STILL_IMAGE_EXTS, VIDEO_EXT, frame_pattern,
};
pub use crate::foundation::error::{SplatSeqError, SplatSeqResult};

pub use crate::catalog::convert::{CommandConverter, Converter};
pub use crate::catalog::source::{SourceCatalog, SourceObject};
pub use crate::config::{
    ConvertFailurePolicy, ConverterConfig, EncodeSettings, FallbackKind, MismatchPolicy,
    OutputLayout, PipelineConfig,
};
pub use crate::encode::executor::{FrameTranscoder, SequenceEncoder};
pub use crate::encode::ffmpeg::{
    FfmpegEncoder, VideoProbe, is_ffmpeg_on_path, is_ffprobe_on_path, probe_video,
};
pub use crate::encode::orchestrator::{
    EncodeOrchestrator, EncodeOutcome, EncodePath, EncodeReport, EncodeStage,
};
pub use crate::encode::transcode::{CommandTranscoder, ImageTranscoder};
pub use crate::manifest::document::{Manifest, ManifestEntry};
pub use crate::manifest::rewrite::rewrite_meta;
pub use crate::pipeline::{Executors, RunSummary, run};
pub use crate::sequence::builder::{FrameMismatch, SequenceBuild, SequenceBuilder};
pub use crate::sequence::scan::AttributeSequence;
