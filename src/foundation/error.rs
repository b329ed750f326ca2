/// Convenience result type used across splatseq.
pub type SplatSeqResult<T> = Result<T, SplatSeqError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum SplatSeqError {
    /// Invalid user-provided configuration or input layout.
    #[error("validation error: {0}")]
    Validation(String),

    /// The external converter failed for one source object.
    #[error("conversion error for '{object}': {message}")]
    Conversion {
        /// Identifier of the source object whose conversion failed.
        object: String,
        /// Exit status and diagnostics reported by the converter.
        message: String,
    },

    /// Frame sequencing failed (frame index mismatch under strict policy, gaps, mixed formats).
    #[error("sequence error: {0}")]
    Sequence(String),

    /// Encoding one attribute sequence into a video failed.
    #[error("encode error for attribute '{attribute}': {message}")]
    Encode {
        /// Attribute whose video could not be produced.
        attribute: String,
        /// Underlying executor diagnostics.
        message: String,
    },

    /// Loading, rewriting or writing the manifest failed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SplatSeqError {
    /// Build a [`SplatSeqError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SplatSeqError::Conversion`] value.
    pub fn conversion(object: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conversion {
            object: object.into(),
            message: msg.into(),
        }
    }

    /// Build a [`SplatSeqError::Sequence`] value.
    pub fn sequence(msg: impl Into<String>) -> Self {
        Self::Sequence(msg.into())
    }

    /// Build a [`SplatSeqError::Encode`] value.
    pub fn encode(attribute: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Encode {
            attribute: attribute.into(),
            message: msg.into(),
        }
    }

    /// Build a [`SplatSeqError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
