//! Codec adapter: the boundary where pixels are actually compressed.
//!
//! The orchestrator only talks to the [`Codec`] trait. [`ImageCodec`] is the
//! default implementation, backed by the `image` crate's PNG, JPEG, GIF and
//! WebP codecs.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::{debug, warn};

use crate::{ColorSpace, CompressFormat, ImgError, PixelGrid, Quality, Result};

/// Image compression and decompression, injected into the orchestrator.
pub trait Codec {
    /// Compress `grid` into a container of the given `format`.
    ///
    /// Lossless formats ignore `quality`.
    fn encode(&self, grid: &PixelGrid, format: CompressFormat, quality: Quality)
        -> Result<Vec<u8>>;

    /// Decompress `data` into a pixel grid, optionally in `color_space`.
    fn decode(&self, data: &[u8], color_space: Option<ColorSpace>) -> Result<PixelGrid>;
}

/// Default codec built on the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn encode(
        &self,
        grid: &PixelGrid,
        format: CompressFormat,
        quality: Quality,
    ) -> Result<Vec<u8>> {
        let (width, height) = (grid.width(), grid.height());
        let mut buffer = Cursor::new(Vec::new());

        let result = match format {
            CompressFormat::Png => PngEncoder::new(&mut buffer).write_image(
                grid.as_rgba_bytes(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            CompressFormat::Jpeg => {
                // JPEG has no alpha channel and no quality 0
                let rgb: Vec<u8> = grid
                    .pixels()
                    .iter()
                    .flat_map(|&[r, g, b, _]| [r, g, b])
                    .collect();
                let quality = quality.get().clamp(1, 100);
                JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
                    &rgb,
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            CompressFormat::WebpLossy | CompressFormat::WebpLossless => {
                if format == CompressFormat::WebpLossy {
                    warn!("lossy WebP encoding is not available, writing lossless WebP");
                }
                WebPEncoder::new_lossless(&mut buffer).write_image(
                    grid.as_rgba_bytes(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )
            }
        };
        result.map_err(|e| ImgError::EncodeFailure(format!("{format}: {e}")))?;

        let bytes = buffer.into_inner();
        debug!(
            "encoded {width}x{height} as {format} (quality {quality}): {} bytes",
            bytes.len()
        );
        Ok(bytes)
    }

    fn decode(&self, data: &[u8], color_space: Option<ColorSpace>) -> Result<PixelGrid> {
        let transfer = match color_space {
            None | Some(ColorSpace::Srgb) | Some(ColorSpace::ExtendedSrgb) => Transfer::Srgb,
            Some(ColorSpace::LinearSrgb) | Some(ColorSpace::LinearExtendedSrgb) => {
                Transfer::Linear
            }
            Some(other) => return Err(ImgError::UnsupportedColorSpace(other)),
        };

        match image::guess_format(data) {
            Ok(format) => debug!("decoding {format:?} ({} bytes)", data.len()),
            Err(_) => debug!("decoding unrecognized container ({} bytes)", data.len()),
        }

        let rgba = image::load_from_memory(data)
            .map_err(|e| ImgError::DecodeFailure(e.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut grid = PixelGrid::from_rgba_bytes(width, height, rgba.as_raw())
            .map_err(|e| ImgError::DecodeFailure(e.to_string()))?;

        if transfer == Transfer::Linear {
            linearize(&mut grid);
        }
        Ok(grid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Srgb,
    Linear,
}

/// Convert sRGB value (0-1) to linear RGB
#[inline]
fn srgb_to_linear(srgb: f32) -> f32 {
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

/// Apply the sRGB-to-linear transfer to the color channels of `grid`.
/// Alpha is left untouched.
fn linearize(grid: &mut PixelGrid) {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = (srgb_to_linear(i as f32 / 255.0) * 255.0).round() as u8;
    }
    for px in grid.pixels_mut() {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    }
}
