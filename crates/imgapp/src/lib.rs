//! # imgapp
//!
//! A small harness for moving pixels between headerless raw RGBA buffers and
//! encoded image files.
//!
//! ## Features
//!
//! - **Parameters**: string-keyed request validation into typed [`Request`]s
//! - **Raw buffers**: exact `width * height * 4` byte R,G,B,A dumps, row-major
//! - **Codec adapter**: the [`Codec`] trait, with an `image`-backed default
//! - **Statistics**: per-channel mean and standard deviation of raw dumps
//!
//! ## Quick Start
//!
//! ### Encoding a raw buffer to PNG
//!
//! ```ignore
//! use imgapp::{run, ImageCodec, ParameterSet};
//!
//! let params = ParameterSet::from_pairs([
//!     ("encode", ""),
//!     ("input", "green.rgba"),
//!     ("output", "green.png"),
//!     ("width", "10"),
//!     ("height", "10"),
//! ]);
//! let outcome = run(&params, &ImageCodec)?;
//! println!("{} bytes written", outcome.bytes_written);
//! ```
//!
//! ### Decoding an image to a raw buffer
//!
//! ```ignore
//! use imgapp::{Codec, ImageCodec};
//!
//! let data = std::fs::read("photo.png")?;
//! let grid = ImageCodec.decode(&data, None)?;
//! imgapp::write_raw(&grid, "photo.rgba")?;
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod codec;
pub mod params;
pub mod raw;
pub mod run;
pub mod stats;

pub use codec::{Codec, ImageCodec};
pub use params::{
    validate, ColorSpace, CompressFormat, DecodeRequest, EncodeRequest, Mode, ParameterSet,
    Quality, Request,
};
pub use raw::{read_raw, read_raw_from, write_raw, write_raw_to, PixelGrid};
pub use run::{execute, run, Outcome};
pub use stats::{analyze_bytes, analyze_grid, ChannelStats, RawStats};

/// Errors that can occur while validating, reading, converting or writing.
#[derive(Debug, Error)]
pub enum ImgError {
    /// Mode selection is missing or conflicting (`encode` / `decode`)
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    /// A required parameter was not supplied
    #[error("missing parameter: \"{0}\"")]
    MissingParameter(&'static str),

    /// A parameter was supplied but its value is not acceptable
    #[error("invalid parameter {key}={value:?}: {reason}")]
    InvalidParameter {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Width or height is zero, or the buffer size overflows
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel buffer length doesn't match the dimensions
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The raw input holds fewer bytes than its dimensions require
    #[error("truncated input: expected {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    /// The codec rejected the encoded input
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// The codec failed to compress the pixel grid
    #[error("encode failure: {0}")]
    EncodeFailure(String),

    /// The codec cannot produce pixels in the requested color space
    #[error("unsupported color space: {0}")]
    UnsupportedColorSpace(ColorSpace),

    /// Filesystem error on read or write
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on a reader or writer that has no path attached
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),
}

impl ImgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImgError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach `path` to a path-less stream error.
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            ImgError::Stream(source) => ImgError::io(path, source),
            other => other,
        }
    }
}

/// Result type for imgapp operations.
pub type Result<T> = core::result::Result<T, ImgError>;

/// Bytes per packed pixel in a raw buffer.
pub const CHANNELS: usize = 4;

/// Size in bytes of a `width x height` raw buffer, or `None` on overflow.
#[inline]
pub fn raw_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(CHANNELS)
}
