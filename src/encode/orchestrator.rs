use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::EncodeSettings;
use crate::foundation::core::{FrameIndex, VIDEO_EXT};
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::{recreate_dir, remove_dir_if_exists, remove_file_if_exists};
use crate::sequence::scan::AttributeSequence;

use super::executor::{FrameTranscoder, SequenceEncoder};

/// Where a single attribute's encode currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeStage {
    /// Not started; the previous video has not been removed yet.
    Pending,
    /// Encoding the sequence as-is.
    PrimaryAttempt,
    /// Transcoding the frames and encoding the transcoded copy.
    FallbackAttempt,
    /// A video was written.
    Succeeded,
    /// No video was produced.
    Failed,
}

/// Which path produced a video.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodePath {
    /// The sequence frames were encoded directly.
    Primary,
    /// The frames went through the fallback transcoder first.
    Fallback,
}

/// Result of encoding one attribute sequence.
#[derive(Debug)]
pub struct EncodeOutcome {
    /// Attribute name.
    pub attribute: String,
    /// Sequence length (0 when the sequence could not be scanned).
    pub frames: usize,
    /// Target video path.
    pub video: PathBuf,
    /// Every stage visited, starting with `Pending`.
    pub stages: Vec<EncodeStage>,
    /// Path that produced the video, or the error that stopped it.
    pub result: SplatSeqResult<EncodePath>,
}

impl EncodeOutcome {
    /// `true` when a video was written.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// `true` when the video came from the fallback path.
    pub fn used_fallback(&self) -> bool {
        matches!(self.result, Ok(EncodePath::Fallback))
    }
}

/// All outcomes of one encode pass, in attribute order.
#[derive(Debug, Default)]
pub struct EncodeReport {
    /// One outcome per non-empty sequence.
    pub outcomes: Vec<EncodeOutcome>,
    /// Sequence directories that held no frames.
    pub skipped: Vec<String>,
}

impl EncodeReport {
    /// Outcomes without a video.
    pub fn failures(&self) -> impl Iterator<Item = &EncodeOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Outcomes with a video.
    pub fn encoded(&self) -> impl Iterator<Item = &EncodeOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    /// Fold every failed attribute into one error, or `Ok` when all encodes succeeded.
    pub fn into_result(self) -> SplatSeqResult<Self> {
        let failed: Vec<String> = self
            .failures()
            .map(|o| match &o.result {
                Err(e) => format!("{}: {}", o.attribute, detail(e)),
                Ok(_) => o.attribute.clone(),
            })
            .collect();
        if failed.is_empty() {
            return Ok(self);
        }
        let attributes = self
            .failures()
            .map(|o| o.attribute.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(SplatSeqError::encode(attributes, failed.join("; ")))
    }
}

/// Drives every attribute sequence through primary encode and, when that fails and a
/// transcoder can handle the frames, a transcode-then-encode fallback.
pub struct EncodeOrchestrator {
    encoder: Arc<dyn SequenceEncoder>,
    fallback: Option<Arc<dyn FrameTranscoder>>,
    fallback_root: PathBuf,
    videos_dir: PathBuf,
    settings: EncodeSettings,
}

impl EncodeOrchestrator {
    /// Orchestrator writing `<videos_dir>/<attribute>.mp4` and staging fallback frames below
    /// `fallback_root`.
    pub fn new(
        encoder: Arc<dyn SequenceEncoder>,
        fallback: Option<Arc<dyn FrameTranscoder>>,
        fallback_root: impl Into<PathBuf>,
        videos_dir: impl Into<PathBuf>,
        settings: EncodeSettings,
    ) -> Self {
        Self {
            encoder,
            fallback,
            fallback_root: fallback_root.into(),
            videos_dir: videos_dir.into(),
            settings,
        }
    }

    /// Output video path for `attribute`.
    pub fn video_path(&self, attribute: &str) -> PathBuf {
        self.videos_dir.join(format!("{attribute}.{VIDEO_EXT}"))
    }

    /// Encode every `(attribute, dir)` pair on `pool`. Sequences are independent; one failing
    /// never stops the others.
    #[tracing::instrument(skip_all, fields(sequences = dirs.len()))]
    pub fn encode_all(&self, dirs: &[(String, PathBuf)], pool: &rayon::ThreadPool) -> EncodeReport {
        let results: Vec<Option<EncodeOutcome>> = pool.install(|| {
            dirs.par_iter()
                .map(|(attribute, dir)| self.encode_dir(attribute, dir))
                .collect()
        });

        let mut report = EncodeReport::default();
        for ((attribute, _), outcome) in dirs.iter().zip(results) {
            match outcome {
                Some(o) => report.outcomes.push(o),
                None => report.skipped.push(attribute.clone()),
            }
        }
        report
    }

    /// `None` when the directory holds no frames.
    pub fn encode_dir(&self, attribute: &str, dir: &Path) -> Option<EncodeOutcome> {
        let video = self.video_path(attribute);
        let seq = match AttributeSequence::scan(attribute, dir) {
            Ok(Some(seq)) => seq,
            Ok(None) => {
                tracing::info!(attribute, "no frames, skipping");
                return None;
            }
            Err(e) => {
                tracing::error!(attribute, error = %e, "sequence is unusable");
                return Some(EncodeOutcome {
                    attribute: attribute.to_string(),
                    frames: 0,
                    video,
                    stages: vec![EncodeStage::Pending, EncodeStage::Failed],
                    result: Err(e),
                });
            }
        };
        Some(self.encode_sequence(&seq))
    }

    /// Run one sequence through the stage machine. Never panics on executor errors.
    pub fn encode_sequence(&self, seq: &AttributeSequence) -> EncodeOutcome {
        let video = self.video_path(&seq.attribute);
        let mut stages = vec![EncodeStage::Pending];
        let mut stage = EncodeStage::Pending;
        let mut primary_error: Option<SplatSeqError> = None;

        let result = loop {
            stage = match stage {
                EncodeStage::Pending => {
                    if let Err(e) = remove_file_if_exists(&video) {
                        stages.push(EncodeStage::Failed);
                        break Err(e);
                    }
                    EncodeStage::PrimaryAttempt
                }
                EncodeStage::PrimaryAttempt => {
                    match self.encoder.encode(seq, &video, &self.settings) {
                        Ok(()) => {
                            stages.push(EncodeStage::Succeeded);
                            break Ok(EncodePath::Primary);
                        }
                        Err(e) => match &self.fallback {
                            Some(fb) if fb.is_available(&seq.ext) => {
                                tracing::warn!(
                                    attribute = %seq.attribute,
                                    transcoder = fb.name(),
                                    error = %e,
                                    "primary encode failed, retrying through fallback"
                                );
                                primary_error = Some(e);
                                EncodeStage::FallbackAttempt
                            }
                            _ => {
                                stages.push(EncodeStage::Failed);
                                break Err(e);
                            }
                        },
                    }
                }
                EncodeStage::FallbackAttempt => match self.run_fallback(seq, &video) {
                    Ok(()) => {
                        stages.push(EncodeStage::Succeeded);
                        break Ok(EncodePath::Fallback);
                    }
                    Err(e) => {
                        stages.push(EncodeStage::Failed);
                        let primary = primary_error
                            .take()
                            .map(|p| format!("; primary: {}", detail(&p)))
                            .unwrap_or_default();
                        break Err(SplatSeqError::encode(
                            &seq.attribute,
                            format!("fallback failed: {}{primary}", detail(&e)),
                        ));
                    }
                },
                EncodeStage::Succeeded | EncodeStage::Failed => unreachable!("terminal stage"),
            };
            stages.push(stage);
        };

        match &result {
            Ok(path) => {
                tracing::info!(attribute = %seq.attribute, frames = seq.len(), ?path, "encoded")
            }
            Err(e) => tracing::error!(attribute = %seq.attribute, error = %e, "encode failed"),
        }

        EncodeOutcome {
            attribute: seq.attribute.clone(),
            frames: seq.len(),
            video,
            stages,
            result,
        }
    }

    fn run_fallback(&self, seq: &AttributeSequence, video: &Path) -> SplatSeqResult<()> {
        let Some(fb) = &self.fallback else {
            return Err(SplatSeqError::encode(&seq.attribute, "no fallback configured"));
        };
        let side_dir = self.fallback_root.join(&seq.attribute);
        recreate_dir(&side_dir)?;

        let ext = fb.output_ext().to_string();
        let mut frames = Vec::with_capacity(seq.len());
        for (i, src) in seq.frames.iter().enumerate() {
            let dst = side_dir.join(FrameIndex(i as u64).file_name(&ext));
            fb.transcode(src, &dst).map_err(|e| {
                SplatSeqError::encode(
                    &seq.attribute,
                    format!("transcoding '{}' failed: {}", src.display(), detail(&e)),
                )
            })?;
            frames.push(dst);
        }

        let transcoded = AttributeSequence {
            attribute: seq.attribute.clone(),
            dir: side_dir.clone(),
            ext,
            frames,
        };
        remove_file_if_exists(video)?;
        self.encoder.encode(&transcoded, video, &self.settings)?;
        remove_dir_if_exists(&side_dir)?;
        Ok(())
    }
}

/// Error text without the `encode error for attribute` prefix, for folding into an outer
/// encode error that already names the attribute.
fn detail(e: &SplatSeqError) -> String {
    match e {
        SplatSeqError::Encode { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/orchestrator.rs"]
mod tests;
