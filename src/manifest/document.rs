use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::Value;

use crate::catalog::source::SourceCatalog;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::write_atomic;

use super::rewrite::{rewrite_meta, video_references};

/// One manifest row per source object.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    /// Source object identifier.
    pub original: String,
    /// Frame index, `null` for objects without metadata.
    pub frame: Option<FrameIndex>,
    /// Rewritten converter metadata.
    pub meta: Option<Value>,
}

/// `{ "splats": [ ... ] }`, entries in catalog order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    /// One entry per source object.
    pub splats: Vec<ManifestEntry>,
}

impl Manifest {
    /// Pair every catalog object with its frame index and rewritten metadata.
    ///
    /// `frames` must be parallel to `catalog.objects()`.
    #[tracing::instrument(skip_all, fields(objects = catalog.len()))]
    pub fn assemble(
        catalog: &SourceCatalog,
        frames: &[Option<FrameIndex>],
        video_ext: &str,
    ) -> SplatSeqResult<Self> {
        if frames.len() != catalog.len() {
            return Err(SplatSeqError::manifest(format!(
                "{} frame assignments for {} objects",
                frames.len(),
                catalog.len()
            )));
        }

        let mut splats = Vec::with_capacity(catalog.len());
        for (obj, frame) in catalog.objects().iter().zip(frames) {
            let meta = if obj.has_meta() {
                let text = std::fs::read_to_string(&obj.meta_path)
                    .with_context(|| format!("read '{}'", obj.meta_path.display()))?;
                let parsed: Value = serde_json::from_str(&text).map_err(|e| {
                    SplatSeqError::manifest(format!(
                        "invalid metadata for '{}' ({}): {e}",
                        obj.original,
                        obj.meta_path.display()
                    ))
                })?;
                Some(rewrite_meta(&parsed, video_ext))
            } else {
                None
            };
            splats.push(ManifestEntry {
                original: obj.original.clone(),
                frame: *frame,
                meta,
            });
        }
        Ok(Self { splats })
    }

    /// Video references (by file name) that have no file in `videos_dir`, deduplicated and sorted.
    pub fn missing_videos(&self, videos_dir: &Path, video_ext: &str) -> Vec<PathBuf> {
        let mut names = BTreeSet::new();
        for meta in self.splats.iter().filter_map(|e| e.meta.as_ref()) {
            for reference in video_references(meta, video_ext) {
                let name = reference.rsplit('/').next().unwrap_or(&reference).to_string();
                names.insert(name);
            }
        }
        names
            .into_iter()
            .map(|n| videos_dir.join(n))
            .filter(|p| !p.is_file())
            .collect()
    }

    /// Pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> SplatSeqResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SplatSeqError::manifest(format!("serialize manifest: {e}")))
    }

    /// Serialise the complete document and move it into place in one rename.
    pub fn write_atomic(&self, path: &Path) -> SplatSeqResult<()> {
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        write_atomic(path, json.as_bytes())?;
        tracing::info!(path = %path.display(), entries = self.splats.len(), "manifest written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/document.rs"]
mod tests;
