//! Video encoding of attribute sequences.
//!
//! [`orchestrator::EncodeOrchestrator`] runs each sequence through a [`executor::SequenceEncoder`]
//! (ffmpeg by default) and, if that fails, through a [`executor::FrameTranscoder`] followed by a
//! second encode of the transcoded frames.

/// Encoder and transcoder traits.
pub mod executor;
/// System ffmpeg encoder and ffprobe helpers.
pub mod ffmpeg;
/// Per-attribute primary/fallback state machine.
pub mod orchestrator;
/// Fallback frame transcoders.
pub mod transcode;
