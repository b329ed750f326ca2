use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::SplatSeqResult;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SplatSeqResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Remove `dir` (if present) and create it again, empty.
pub fn recreate_dir(dir: &Path) -> SplatSeqResult<()> {
    remove_dir_if_exists(dir)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    Ok(())
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists(dir: &Path) -> SplatSeqResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to remove directory '{}'", dir.display()))
            .into()),
    }
}

/// Remove a file; a missing file is not an error. Returns whether something was removed.
pub fn remove_file_if_exists(path: &Path) -> SplatSeqResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("failed to remove '{}'", path.display()))
            .into()),
    }
}

/// Remove every regular file in `dir` whose extension is `ext` (case-insensitive), leaving other
/// files and subdirectories alone. A missing `dir` is not an error. Returns the removed paths.
pub fn remove_files_with_ext(dir: &Path, ext: &str) -> SplatSeqResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to list '{}'", dir.display()))
                .into());
        }
    };
    let mut removed = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list '{}'", dir.display()))?
            .path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches && path.is_file() && remove_file_if_exists(&path)? {
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

/// Hard-link `src` to `dst`, copying when linking is not possible (e.g. across devices).
///
/// An existing `dst` is replaced.
pub fn link_or_copy(src: &Path, dst: &Path) -> SplatSeqResult<()> {
    remove_file_if_exists(dst)?;
    if std::fs::hard_link(src, dst).is_ok() {
        return Ok(());
    }
    std::fs::copy(src, dst)
        .with_context(|| format!("failed to copy '{}' to '{}'", src.display(), dst.display()))?;
    Ok(())
}

/// Write `bytes` to `path` through a sibling temporary file and a rename, so readers never
/// observe a partially written document.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SplatSeqResult<()> {
    ensure_parent_dir(path)?;
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, bytes).with_context(|| format!("failed to write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| {
        format!(
            "failed to move '{}' into place at '{}'",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fs.rs"]
mod tests;
