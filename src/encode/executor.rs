use std::path::Path;

use crate::config::EncodeSettings;
use crate::foundation::error::SplatSeqResult;
use crate::sequence::scan::AttributeSequence;

/// Primary codec path: turns a whole frame sequence into one video.
///
/// Failure of `encode` is a failure for the whole sequence; the orchestrator decides whether a
/// fallback attempt follows.
pub trait SequenceEncoder: Send + Sync {
    /// Encode `seq` into `out_path`, replacing any file there.
    fn encode(
        &self,
        seq: &AttributeSequence,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> SplatSeqResult<()>;
}

/// Fallback path: converts single frames into a raster format the primary encoder reads.
pub trait FrameTranscoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this transcoder can run on this host for frames with extension `source_ext`.
    fn is_available(&self, source_ext: &str) -> bool;

    /// Extension of the transcoded frames.
    fn output_ext(&self) -> &str {
        "png"
    }

    /// Decode `src` and write it to `dst` in [`FrameTranscoder::output_ext`] format.
    fn transcode(&self, src: &Path, dst: &Path) -> SplatSeqResult<()>;
}
