use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ConverterConfig;
use crate::foundation::error::{SplatSeqError, SplatSeqResult};

/// Turns one point-cloud input into a metadata file plus attribute still images.
pub trait Converter: Send + Sync {
    /// Convert `input`; on success `meta_out` and its sibling images exist.
    ///
    /// `object` is the input identifier used in error messages.
    fn convert(&self, object: &str, input: &Path, meta_out: &Path) -> SplatSeqResult<()>;
}

/// Runs an external converter as `<program> [extra-args...] <input> <meta-out>`.
#[derive(Clone, Debug)]
pub struct CommandConverter {
    program: PathBuf,
    extra_args: Vec<OsString>,
}

impl CommandConverter {
    /// Converter without extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Program and extra arguments from the run configuration.
    pub fn from_config(cfg: &ConverterConfig) -> Self {
        Self::new(&cfg.program).with_args(cfg.extra_args.iter())
    }

    /// Append arguments passed before the paths.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self, input: &Path, meta_out: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.extra_args)
            .arg(input)
            .arg(meta_out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Converter for CommandConverter {
    #[tracing::instrument(skip(self, input, meta_out), fields(program = %self.program.display()))]
    fn convert(&self, object: &str, input: &Path, meta_out: &Path) -> SplatSeqResult<()> {
        let output = self.command(input, meta_out).output().map_err(|e| {
            SplatSeqError::conversion(
                object,
                format!(
                    "failed to spawn '{}' (is it installed and on PATH?): {e}",
                    self.program.display()
                ),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplatSeqError::conversion(
                object,
                format!("converter exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        if !meta_out.is_file() {
            return Err(SplatSeqError::conversion(
                object,
                format!(
                    "converter exited successfully but '{}' was not written",
                    meta_out.display()
                ),
            ));
        }
        tracing::debug!(input = %input.display(), "converted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/convert.rs"]
mod tests;
