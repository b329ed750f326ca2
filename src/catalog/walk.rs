use std::path::{Path, PathBuf};

use anyhow::Context as _;
use walkdir::WalkDir;

use crate::foundation::core::still_image_ext;
use crate::foundation::error::SplatSeqResult;

/// One attribute still-image emitted by the converter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StillImage {
    /// Attribute channel, the file name without its extension.
    pub attribute: String,
    /// Location of the image.
    pub path: PathBuf,
    /// Lower-cased extension.
    pub ext: String,
}

impl StillImage {
    fn from_path(path: PathBuf) -> Option<Self> {
        let ext = still_image_ext(&path)?;
        let attribute = path.file_stem()?.to_str()?.to_string();
        if attribute.is_empty() {
            return None;
        }
        Some(Self {
            attribute,
            path,
            ext,
        })
    }
}

/// Iterative walk over every still image below a directory, at any depth.
///
/// Each call to [`StillImageWalk::iter`] starts a fresh traversal, so the walk can be repeated.
/// Entries are visited in file-name order within each directory; symlinks are not followed.
#[derive(Clone, Debug)]
pub struct StillImageWalk {
    root: PathBuf,
}

impl StillImageWalk {
    /// Walk below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the walk starts from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield every still image, surfacing traversal errors as items.
    pub fn iter(&self) -> impl Iterator<Item = SplatSeqResult<StillImage>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    StillImage::from_path(entry.into_path()).map(Ok)
                }
                Ok(_) => None,
                Err(e) => Some(Err(anyhow::Error::new(e)
                    .context(format!("failed to walk '{}'", self.root.display()))
                    .into())),
            })
    }

    /// Collect the whole walk, failing on the first traversal error.
    pub fn collect_images(&self) -> SplatSeqResult<Vec<StillImage>> {
        self.iter().collect()
    }
}

/// Recursively list files below `root` whose lower-cased extension is in `exts`, sorted by
/// their `/`-separated path relative to `root`.
pub(crate) fn find_inputs(root: &Path, exts: &[String]) -> SplatSeqResult<Vec<(String, PathBuf)>> {
    if root.is_file() {
        let id = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![(id, root.to_path_buf())]);
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk '{}'", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let id = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push((id, entry.into_path()));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/walk.rs"]
mod tests;
