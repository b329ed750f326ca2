use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use anyhow::Context as _;

use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::ensure_parent_dir;

use super::executor::FrameTranscoder;
use super::ffmpeg::is_tool_on_path;

/// In-process fallback: decode with the `image` crate, write PNG (alpha preserved).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageTranscoder;

impl FrameTranscoder for ImageTranscoder {
    fn name(&self) -> &str {
        "image"
    }

    fn is_available(&self, source_ext: &str) -> bool {
        image::ImageFormat::from_extension(source_ext)
            .map(|f| f.reading_enabled())
            .unwrap_or(false)
    }

    fn transcode(&self, src: &Path, dst: &Path) -> SplatSeqResult<()> {
        ensure_parent_dir(dst)?;
        let img = image::open(src).with_context(|| format!("decode '{}'", src.display()))?;
        img.to_rgba8()
            .save_with_format(dst, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", dst.display()))?;
        Ok(())
    }
}

/// Fallback through an external tool, e.g. `dwebp <in> -o <out>`.
///
/// `{input}` and `{output}` in the argument template are replaced per frame.
#[derive(Debug)]
pub struct CommandTranscoder {
    program: PathBuf,
    args: Vec<String>,
    source_exts: Vec<String>,
    available: OnceLock<bool>,
}

impl CommandTranscoder {
    /// Transcoder running `program` with the `args` template for frames in `source_exts`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, source_exts: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            source_exts,
            available: OnceLock::new(),
        }
    }

    /// libwebp's `dwebp` decoder writing PNG.
    pub fn dwebp() -> Self {
        Self::new(
            "dwebp",
            vec!["{input}".into(), "-o".into(), "{output}".into()],
            vec!["webp".into()],
        )
    }

    fn command(&self, src: &Path, dst: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            match arg.as_str() {
                "{input}" => cmd.arg(src),
                "{output}" => cmd.arg(dst),
                other => cmd.arg(other),
            };
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl FrameTranscoder for CommandTranscoder {
    fn name(&self) -> &str {
        self.program.to_str().unwrap_or("transcoder")
    }

    fn is_available(&self, source_ext: &str) -> bool {
        let handles_ext = self
            .source_exts
            .iter()
            .any(|e| e.eq_ignore_ascii_case(source_ext));
        handles_ext && *self.available.get_or_init(|| is_tool_on_path(&self.program))
    }

    fn transcode(&self, src: &Path, dst: &Path) -> SplatSeqResult<()> {
        ensure_parent_dir(dst)?;
        let output = self.command(src, dst).output().map_err(|e| {
            SplatSeqError::validation(format!(
                "failed to spawn '{}': {e}",
                self.program.display()
            ))
        })?;
        if !output.status.success() {
            return Err(SplatSeqError::validation(format!(
                "'{}' exited with {} for '{}': {}",
                self.program.display(),
                output.status,
                src.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/transcode.rs"]
mod tests;
