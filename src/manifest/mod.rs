//! Per-object metadata rewriting and the final `manifest.json`.

/// The manifest document.
pub mod document;
/// Attribute reference rewriting.
pub mod rewrite;
