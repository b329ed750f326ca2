//! End-to-end run: catalog, sequence, encode, manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use crate::catalog::convert::{CommandConverter, Converter};
use crate::catalog::source::SourceCatalog;
use crate::config::{FallbackKind, OutputLayout, PipelineConfig};
use crate::encode::executor::{FrameTranscoder, SequenceEncoder};
use crate::encode::ffmpeg::FfmpegEncoder;
use crate::encode::orchestrator::EncodeOrchestrator;
use crate::encode::transcode::{CommandTranscoder, ImageTranscoder};
use crate::foundation::core::VIDEO_EXT;
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::{
    recreate_dir, remove_dir_if_exists, remove_file_if_exists, remove_files_with_ext,
};
use crate::manifest::document::Manifest;
use crate::sequence::builder::{FrameMismatch, SequenceBuilder};
use crate::sequence::scan::list_sequence_dirs;

/// The external programs a run talks to. Swappable so tests can run without them.
#[derive(Clone)]
pub struct Executors {
    /// Produces `meta.json` and attribute images for one input.
    pub converter: Arc<dyn Converter>,
    /// Encodes one attribute sequence into a video.
    pub encoder: Arc<dyn SequenceEncoder>,
    /// Transcoder for sequences the encoder cannot decode.
    pub fallback: Option<Arc<dyn FrameTranscoder>>,
}

impl Executors {
    /// Converter command, system ffmpeg and the configured fallback.
    ///
    /// Each ffmpeg process gets an equal share of the host's cores.
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let per_job = (cores / cfg.effective_jobs().max(1)).max(1);
        let fallback: Option<Arc<dyn FrameTranscoder>> = match cfg.fallback {
            FallbackKind::Image => Some(Arc::new(ImageTranscoder)),
            FallbackKind::Dwebp => Some(Arc::new(CommandTranscoder::dwebp())),
            FallbackKind::None => None,
        };
        Self {
            converter: Arc::new(CommandConverter::from_config(&cfg.converter)),
            encoder: Arc::new(FfmpegEncoder::new().with_threads(Some(per_job as u32))),
            fallback,
        }
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Objects in the catalog.
    pub objects: usize,
    /// Objects that received a frame index.
    pub frames: u64,
    /// Attributes with a video, sorted.
    pub videos: Vec<String>,
    /// Attributes whose video came from the fallback path.
    pub fallback_used: Vec<String>,
    /// Sequence directories without frames.
    pub skipped_sequences: Vec<String>,
    /// Frame index mismatches recorded under the lenient policy.
    pub mismatches: Vec<FrameMismatch>,
    /// Manifest references without a video file.
    pub missing_videos: Vec<PathBuf>,
    /// Where the manifest was written.
    pub manifest: PathBuf,
}

fn build_pool(jobs: usize) -> SplatSeqResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| SplatSeqError::validation(format!("failed to build rayon thread pool: {e}")))
}

/// Clear the per-run directories, videos left by earlier runs and any stale manifest.
///
/// Sequences are rebuilt from scratch, so every video that should exist after this run is
/// re-encoded by it.
fn prepare_layout(layout: &OutputLayout) -> SplatSeqResult<()> {
    std::fs::create_dir_all(&layout.root)
        .with_context(|| format!("failed to create output root '{}'", layout.root.display()))?;
    recreate_dir(&layout.sequences_dir())?;
    recreate_dir(&layout.fallback_dir())?;
    let stale = remove_files_with_ext(&layout.videos_dir(), VIDEO_EXT)?;
    if !stale.is_empty() {
        tracing::info!(count = stale.len(), "removed videos from a previous run");
    }
    if remove_file_if_exists(&layout.manifest_path())? {
        tracing::info!(path = %layout.manifest_path().display(), "removed stale manifest");
    }
    Ok(())
}

/// Run every stage. The manifest is written only when all stages succeed.
#[tracing::instrument(skip_all, fields(output = %cfg.output.display(), rebuild = cfg.rebuild))]
pub fn run(cfg: &PipelineConfig, executors: &Executors) -> SplatSeqResult<RunSummary> {
    cfg.validate()?;
    let layout = cfg.layout();
    prepare_layout(&layout)?;
    let pool = build_pool(cfg.effective_jobs())?;

    let catalog = if cfg.rebuild {
        SourceCatalog::from_existing(&layout.sog_dir())?
    } else {
        SourceCatalog::convert(cfg, executors.converter.as_ref(), &pool)?
    };

    let build = SequenceBuilder::build(layout.sequences_dir(), cfg.mismatch_policy, &catalog)?;
    if !build.mismatches.is_empty() {
        tracing::warn!(
            mismatches = build.mismatches.len(),
            "frame indices are inconsistent across attributes; videos may be desynchronised"
        );
    }

    let orchestrator = EncodeOrchestrator::new(
        executors.encoder.clone(),
        executors.fallback.clone(),
        layout.fallback_dir(),
        layout.videos_dir(),
        cfg.encode.clone(),
    );
    let dirs = list_sequence_dirs(&layout.sequences_dir())?;
    let report = orchestrator.encode_all(&dirs, &pool).into_result()?;
    remove_dir_if_exists(&layout.fallback_dir())?;

    let manifest = Manifest::assemble(&catalog, &build.frames, VIDEO_EXT)?;
    let missing_videos = manifest.missing_videos(&layout.videos_dir(), VIDEO_EXT);
    for path in &missing_videos {
        tracing::warn!(video = %path.display(), "manifest references a video that was not produced");
    }
    let manifest_path = layout.manifest_path();
    manifest.write_atomic(&manifest_path)?;

    let summary = RunSummary {
        objects: catalog.len(),
        frames: build.frame_count(),
        videos: report.encoded().map(|o| o.attribute.clone()).collect(),
        fallback_used: report
            .encoded()
            .filter(|o| o.used_fallback())
            .map(|o| o.attribute.clone())
            .collect(),
        skipped_sequences: report.skipped,
        mismatches: build.mismatches,
        missing_videos,
        manifest: manifest_path,
    };
    tracing::info!(
        objects = summary.objects,
        frames = summary.frames,
        videos = summary.videos.len(),
        "run complete"
    );
    Ok(summary)
}
