use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{FrameIndex, frame_pattern, parse_frame_file_name};
use crate::foundation::error::{SplatSeqError, SplatSeqResult};

/// Frames of one attribute, contiguous from index 0, sharing one extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSequence {
    /// Attribute name, the sequence directory name.
    pub attribute: String,
    /// Directory holding the frames.
    pub dir: PathBuf,
    /// Lower-cased extension shared by every frame.
    pub ext: String,
    /// Frame paths in index order; `frames[i]` is `frame_<i>.<ext>`.
    pub frames: Vec<PathBuf>,
}

impl AttributeSequence {
    /// Read a sequence directory.
    ///
    /// Returns `Ok(None)` when the directory holds no frames. A gap in the indices, a sequence
    /// not starting at 0, or frames with different extensions are errors.
    pub fn scan(attribute: &str, dir: &Path) -> SplatSeqResult<Option<Self>> {
        let mut by_index = BTreeMap::<FrameIndex, (String, PathBuf)>::new();
        let mut ext: Option<String> = None;

        for entry in
            std::fs::read_dir(dir).with_context(|| format!("failed to list '{}'", dir.display()))?
        {
            let entry = entry.with_context(|| format!("failed to list '{}'", dir.display()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some((idx, frame_ext)) = parse_frame_file_name(&name) else {
                tracing::debug!(file = %name, attribute, "ignoring non-frame file");
                continue;
            };
            match &ext {
                Some(e) if *e != frame_ext => {
                    return Err(SplatSeqError::sequence(format!(
                        "attribute '{attribute}' mixes frame formats '{e}' and '{frame_ext}'"
                    )));
                }
                Some(_) => {}
                None => ext = Some(frame_ext.clone()),
            }
            if by_index.insert(idx, (frame_ext, entry.path())).is_some() {
                return Err(SplatSeqError::sequence(format!(
                    "attribute '{attribute}' has more than one file for frame {idx}"
                )));
            }
        }

        let Some(ext) = ext else {
            return Ok(None);
        };

        let mut frames = Vec::with_capacity(by_index.len());
        for (expected, (idx, (_, path))) in by_index.into_iter().enumerate() {
            if idx.0 != expected as u64 {
                return Err(SplatSeqError::sequence(format!(
                    "attribute '{attribute}' is missing frame {expected} (next present frame is {idx})"
                )));
            }
            frames.push(path);
        }

        Ok(Some(Self {
            attribute: attribute.to_string(),
            dir: dir.to_path_buf(),
            ext,
            frames,
        }))
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the sequence holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// image2-style input pattern covering every frame.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(frame_pattern(&self.ext))
    }
}

/// Attribute sequence directories below `root`, sorted by attribute name.
///
/// Hidden directories and plain files are ignored. A missing `root` yields no sequences.
pub fn list_sequence_dirs(root: &Path) -> SplatSeqResult<Vec<(String, PathBuf)>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(root).with_context(|| format!("failed to list '{}'", root.display()))?
    {
        let entry = entry.with_context(|| format!("failed to list '{}'", root.display()))?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        out.push((name, entry.path()));
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/scan.rs"]
mod tests;
