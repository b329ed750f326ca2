use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::catalog::source::{SourceCatalog, SourceObject};
use crate::config::MismatchPolicy;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::link_or_copy;

/// An attribute image that would have landed at a different index than its object's frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameMismatch {
    /// Source object identifier.
    pub object: String,
    /// Attribute whose image was misplaced.
    pub attribute: String,
    /// Next free index of the attribute's own sequence.
    pub expected: FrameIndex,
    /// Index actually used: the object's first-seen frame.
    pub assigned: FrameIndex,
}

impl std::fmt::Display for FrameMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "object '{}' attribute '{}': sequence expected frame {}, object frame is {}",
            self.object, self.attribute, self.expected, self.assigned
        )
    }
}

/// Result of sequencing a whole catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceBuild {
    /// Frame index per catalog entry, `None` when the object contributed no frames.
    pub frames: Vec<Option<FrameIndex>>,
    /// Attributes that received at least one frame, sorted.
    pub attributes: Vec<String>,
    /// Mismatches recorded under [`MismatchPolicy::Warn`].
    pub mismatches: Vec<FrameMismatch>,
}

impl SequenceBuild {
    /// Number of frames assigned (the length of every consistent attribute sequence).
    pub fn frame_count(&self) -> u64 {
        self.frames.iter().flatten().count() as u64
    }
}

/// Assigns frame indices in catalog order and links attribute images into
/// `<root>/<attribute>/frame_<index>.<ext>`.
///
/// The builder is the only owner of the frame counters: one global counter for objects and an
/// explicit per-attribute "next expected index" map used to detect desynchronised attributes.
#[derive(Debug)]
pub struct SequenceBuilder {
    root: PathBuf,
    policy: MismatchPolicy,
    next_frame: FrameIndex,
    next_by_attribute: BTreeMap<String, FrameIndex>,
    frames: Vec<Option<FrameIndex>>,
    mismatches: Vec<FrameMismatch>,
}

impl SequenceBuilder {
    /// Builder writing sequences below `root`.
    pub fn new(root: impl Into<PathBuf>, policy: MismatchPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
            next_frame: FrameIndex(0),
            next_by_attribute: BTreeMap::new(),
            frames: Vec::new(),
            mismatches: Vec::new(),
        }
    }

    /// Sequences root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sequence every object of `catalog`, in order.
    #[tracing::instrument(skip_all, fields(objects = catalog.len()))]
    pub fn build(
        root: impl Into<PathBuf>,
        policy: MismatchPolicy,
        catalog: &SourceCatalog,
    ) -> SplatSeqResult<SequenceBuild> {
        let mut builder = Self::new(root, policy);
        for obj in catalog.objects() {
            builder.add_object(obj)?;
        }
        Ok(builder.finish())
    }

    /// Assign the next frame index to `obj` and link all of its attribute images.
    ///
    /// Objects without metadata or without images get no index.
    pub fn add_object(&mut self, obj: &SourceObject) -> SplatSeqResult<Option<FrameIndex>> {
        if !obj.has_meta() {
            tracing::warn!(object = %obj.original, "no metadata emitted; object gets no frame");
            self.frames.push(None);
            return Ok(None);
        }
        let images = obj.images().collect_images()?;
        if images.is_empty() {
            tracing::warn!(object = %obj.original, "no attribute images; object gets no frame");
            self.frames.push(None);
            return Ok(None);
        }

        let frame = self.next_frame;
        self.next_frame = frame.next();

        let mut seen = BTreeSet::<&str>::new();
        for img in &images {
            let expected = self
                .next_by_attribute
                .get(&img.attribute)
                .copied()
                .unwrap_or(FrameIndex(0));
            if expected != frame {
                let mismatch = FrameMismatch {
                    object: obj.original.clone(),
                    attribute: img.attribute.clone(),
                    expected,
                    assigned: frame,
                };
                if self.policy == MismatchPolicy::Fail {
                    return Err(SplatSeqError::sequence(format!(
                        "frame index mismatch: {mismatch}"
                    )));
                }
                tracing::warn!(%mismatch, "frame index mismatch; keeping object frame");
                self.mismatches.push(mismatch);
            }
            if !seen.insert(img.attribute.as_str()) {
                tracing::warn!(
                    object = %obj.original,
                    attribute = %img.attribute,
                    path = %img.path.display(),
                    "duplicate attribute image replaces the earlier one"
                );
            }

            let dir = self.root.join(&img.attribute);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create '{}'", dir.display()))?;
            link_or_copy(&img.path, &dir.join(frame.file_name(&img.ext)))?;
            self.next_by_attribute
                .insert(img.attribute.clone(), frame.next());
        }

        tracing::debug!(object = %obj.original, %frame, images = images.len(), "sequenced");
        self.frames.push(Some(frame));
        Ok(Some(frame))
    }

    /// Frame assignments, attributes seen and mismatches recorded so far.
    pub fn finish(self) -> SequenceBuild {
        let build = SequenceBuild {
            frames: self.frames,
            attributes: self.next_by_attribute.into_keys().collect(),
            mismatches: self.mismatches,
        };
        tracing::info!(
            frames = build.frame_count(),
            attributes = build.attributes.len(),
            mismatches = build.mismatches.len(),
            "sequences built"
        );
        build
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/builder.rs"]
mod tests;
