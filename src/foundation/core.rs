use std::path::Path;

use crate::foundation::error::{SplatSeqError, SplatSeqResult};

/// Still-image extensions the converter may emit (lower-case, without dot).
pub const STILL_IMAGE_EXTS: &[&str] = &["webp", "png", "jpg", "jpeg"];

/// Extension of every produced attribute video.
pub const VIDEO_EXT: &str = "mp4";

/// Largest canvas side accepted, matching the H.264 level 6.2 frame limit.
pub const MAX_CANVAS_DIMENSION: u32 = 16384;

/// Zero-padded width of the numeric part of a sequence frame file name.
pub const FRAME_DIGITS: usize = 5;

/// Dense 0-based position of a source object inside every attribute sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Sequence file name for this index, e.g. `frame_00012.webp`.
    pub fn file_name(self, ext: &str) -> String {
        format!("frame_{:0width$}.{ext}", self.0, width = FRAME_DIGITS)
    }

    /// The index immediately after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `ffmpeg` image2 input pattern matching [`FrameIndex::file_name`].
pub fn frame_pattern(ext: &str) -> String {
    format!("frame_%0{FRAME_DIGITS}d.{ext}")
}

/// Parse a sequence frame file name back into `(index, ext)`.
///
/// Accepts any number of digits so that over-wide indices are still recognised.
pub fn parse_frame_file_name(name: &str) -> Option<(FrameIndex, String)> {
    let rest = name.strip_prefix("frame_")?;
    let (digits, ext) = rest.split_once('.')?;
    if digits.is_empty() || ext.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let idx = digits.parse::<u64>().ok()?;
    Some((FrameIndex(idx), ext.to_ascii_lowercase()))
}

/// Lower-cased extension of `path` when it is a recognised still-image extension.
pub fn still_image_ext(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    STILL_IMAGE_EXTS.contains(&ext.as_str()).then_some(ext)
}

/// Pixel dimensions of the video canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Checked constructor: both sides must be in `1..=MAX_CANVAS_DIMENSION`.
    pub fn new(width: u32, height: u32) -> SplatSeqResult<Self> {
        if width == 0 || height == 0 {
            return Err(SplatSeqError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if width > MAX_CANVAS_DIMENSION || height > MAX_CANVAS_DIMENSION {
            return Err(SplatSeqError::validation(format!(
                "canvas {width}x{height} exceeds the {MAX_CANVAS_DIMENSION}px limit"
            )));
        }
        Ok(Self { width, height })
    }

    /// Round both dimensions up to the next even value (yuv420p chroma subsampling).
    pub fn to_even(self) -> SplatSeqResult<Self> {
        let even = |v: u32| {
            v.checked_add(v & 1).ok_or_else(|| {
                SplatSeqError::validation(format!("canvas side {v} cannot be rounded to even"))
            })
        };
        Self::new(even(self.width)?, even(self.height)?)
    }
}

/// Opaque background the frames are composited over before encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// `000000`, the default backdrop.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Parse `RRGGBB` (an optional leading `#` is accepted).
    pub fn parse_hex(s: &str) -> SplatSeqResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SplatSeqError::validation(format!(
                "background color must be RRGGBB hex, got '{s}'"
            )));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| SplatSeqError::validation(format!("invalid color '{s}': {e}")))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Color literal understood by ffmpeg's `color` source.
    pub fn to_ffmpeg(self) -> String {
        format!("0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb8 {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
