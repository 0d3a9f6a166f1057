//! Headerless raw RGBA buffers.
//!
//! A raw buffer is `height` rows of `width` pixels, each pixel packed as
//! `[R, G, B, A]`, with no header, padding or stride. The dimensions are not
//! stored and must be supplied by the caller.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::{raw_len, ImgError, Result, CHANNELS};

/// In-memory pixel grid: row-major, top-to-bottom, left-to-right RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelGrid {
    /// Create a grid from row-major RGBA pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Result<Self> {
        let expected = checked_len(width, height)?;
        if pixels.len() * CHANNELS != expected {
            return Err(ImgError::BufferSizeMismatch {
                expected,
                actual: pixels.len() * CHANNELS,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a grid with every pixel set to `pixel`.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self> {
        let len = checked_len(width, height)? / CHANNELS;
        Self::new(width, height, vec![pixel; len])
    }

    /// Create a grid from packed R,G,B,A bytes.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = checked_len(width, height)?;
        if bytes.len() != expected {
            return Err(ImgError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(CHANNELS)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a grid from packed `0xAARRGGBB` words.
    pub fn from_argb_words(width: u32, height: u32, words: &[u32]) -> Result<Self> {
        let pixels = words
            .iter()
            .map(|&w| {
                let [a, r, g, b] = w.to_be_bytes();
                [r, g, b, a]
            })
            .collect();
        Self::new(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always false; zero-sized grids cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Size of the raw buffer representation in bytes.
    #[inline]
    pub fn raw_len(&self) -> usize {
        self.pixels.len() * CHANNELS
    }

    #[inline]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Pixel at column `x`, row `y` as a packed `0xAARRGGBB` word.
    pub fn argb_word(&self, x: u32, y: u32) -> Option<u32> {
        self.pixel(x, y)
            .map(|[r, g, b, a]| u32::from_be_bytes([a, r, g, b]))
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[[u8; 4]]> {
        self.pixels.chunks_exact(self.width as usize)
    }

    /// Borrow the pixels as packed R,G,B,A bytes.
    #[inline]
    pub fn as_rgba_bytes(&self) -> &[u8] {
        self.pixels.as_flattened()
    }

    /// Copy out packed R,G,B,A bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.as_rgba_bytes().to_vec()
    }
}

/// Upper bound on a single allocation step when reading a raw buffer.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

fn checked_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(ImgError::InvalidDimensions { width, height });
    }
    raw_len(width, height).ok_or(ImgError::InvalidDimensions { width, height })
}

/// Read a `width x height` raw buffer from `path`.
///
/// Exactly `width * height * 4` bytes are consumed. A shorter file fails with
/// [`ImgError::TruncatedInput`]; trailing bytes are ignored.
pub fn read_raw(path: impl AsRef<Path>, width: u32, height: u32) -> Result<PixelGrid> {
    let path = path.as_ref();
    let expected = checked_len(width, height)?;

    let file = File::open(path).map_err(|e| ImgError::io(path, e))?;
    let metadata = file.metadata().map_err(|e| ImgError::io(path, e))?;
    // pipes and devices report no useful length
    if metadata.is_file() {
        let file_len = metadata.len();
        if file_len < expected as u64 {
            return Err(ImgError::TruncatedInput {
                expected,
                actual: file_len as usize,
            });
        }
        if file_len > expected as u64 {
            debug!(
                "{}: ignoring {} trailing bytes",
                path.display(),
                file_len - expected as u64
            );
        }
    }

    read_raw_from(BufReader::new(file), width, height).map_err(|e| e.with_path(path))
}

/// Read a `width x height` raw buffer from any reader.
pub fn read_raw_from<R: Read>(mut reader: R, width: u32, height: u32) -> Result<PixelGrid> {
    let expected = checked_len(width, height)?;

    // read straight into the pixel storage, growing it at most MAX_PREALLOC
    // bytes ahead of what the reader actually delivered
    let mut pixels: Vec<[u8; 4]> = Vec::new();
    let mut filled = 0;
    while filled < expected {
        if filled == pixels.len() * CHANNELS {
            let grow = (expected - filled).min(MAX_PREALLOC) / CHANNELS;
            pixels.resize(pixels.len() + grow, [0; 4]);
        }
        match reader.read(&mut pixels.as_flattened_mut()[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if filled < expected {
        return Err(ImgError::TruncatedInput {
            expected,
            actual: filled,
        });
    }

    PixelGrid::new(width, height, pixels)
}

/// Write `grid` to `path` as a raw buffer.
///
/// The bytes go to a temporary sibling file that is renamed over `path` once
/// everything is flushed, so a failed write never leaves partial output.
pub fn write_raw(grid: &PixelGrid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!(
        "write_raw({}x{} -> {})",
        grid.width(),
        grid.height(),
        path.display()
    );
    write_atomically(path, |file| write_raw_to(grid, file))
}

/// Write `grid` as packed R,G,B,A bytes, row-major, to any writer.
pub fn write_raw_to<W: Write>(grid: &PixelGrid, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    for row in grid.rows() {
        for &[r, g, b, a] in row {
            out.write_all(&[r, g, b, a])?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Run `write` against a temporary file next to `path`, then move it into
/// place. The temporary file is removed on any failure. Errors always name
/// `path`, never the temporary file.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let partial = partial_path(path);
    let result = (|| {
        let mut file = File::create(&partial)?;
        write(&mut file)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&partial, path)?;
        Ok(())
    })()
    .map_err(|e: ImgError| e.with_path(path));

    if result.is_err() {
        // best effort; the file may never have been created
        let _ = fs::remove_file(&partial);
    }
    result
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.part", std::process::id()));
    path.with_file_name(name)
}
