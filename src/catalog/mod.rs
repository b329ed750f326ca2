//! Source catalog: the ordered list of processed source objects and the attribute still images
//! each one produced.

/// External converter invocation.
pub mod convert;
/// Source objects and the ordered catalog.
pub mod source;
/// Still-image and input discovery.
pub mod walk;
