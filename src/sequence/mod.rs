//! Frame sequencing: one frame index per source object, one directory of frames per attribute.

/// Frame index assignment and frame linking.
pub mod builder;
/// Sequence directory scanning.
pub mod scan;
