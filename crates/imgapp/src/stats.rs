//! Per-channel statistics of raw RGBA buffers.
//!
//! Used to compare decoder output across devices and color spaces: a flat
//! test image should decode to a narrow distribution around its color.

use crate::{ImgError, PixelGrid, Result, CHANNELS};

/// Population mean and standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelStats {
    pub mean: f64,
    pub stddev: f64,
}

impl ChannelStats {
    fn from_histogram(histogram: &[u64; 256], count: u64) -> Self {
        let n = count as f64;
        let sum: f64 = histogram
            .iter()
            .enumerate()
            .map(|(v, &c)| v as f64 * c as f64)
            .sum();
        let mean = sum / n;
        let variance: f64 = histogram
            .iter()
            .enumerate()
            .map(|(v, &c)| {
                let d = v as f64 - mean;
                d * d * c as f64
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }
}

/// Statistics for all four channels of a raw buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawStats {
    pub r: ChannelStats,
    pub g: ChannelStats,
    pub b: ChannelStats,
    pub a: ChannelStats,
    pub pixels: u64,
}

impl RawStats {
    pub fn csv_header() -> &'static str {
        "filename,rmean,rstddev,gmean,gstddev,bmean,bstddev,amean,astddev"
    }

    /// One CSV row. Means are rounded half to even; standard deviations keep
    /// their float form (`0.0`, `127.5`).
    pub fn to_csv_row(&self, name: &str) -> String {
        let mut row = name.to_string();
        for c in [self.r, self.g, self.b, self.a] {
            row.push_str(&format!(",{},{:?}", c.mean.round_ties_even() as i64, c.stddev));
        }
        row
    }

    fn from_pixels<'a>(pixels: impl Iterator<Item = &'a [u8]>) -> Self {
        let mut histograms = [[0u64; 256]; CHANNELS];
        let mut count = 0u64;
        for px in pixels {
            for (histogram, &v) in histograms.iter_mut().zip(px) {
                histogram[v as usize] += 1;
            }
            count += 1;
        }
        let [r, g, b, a] = histograms.map(|h| ChannelStats::from_histogram(&h, count));
        Self {
            r,
            g,
            b,
            a,
            pixels: count,
        }
    }
}

/// Analyze packed R,G,B,A bytes.
///
/// Fails with [`ImgError::TruncatedInput`] when the buffer is empty or not a
/// whole number of pixels.
pub fn analyze_bytes(bytes: &[u8]) -> Result<RawStats> {
    if bytes.is_empty() || bytes.len() % CHANNELS != 0 {
        return Err(ImgError::TruncatedInput {
            expected: bytes.len().div_ceil(CHANNELS).max(1) * CHANNELS,
            actual: bytes.len(),
        });
    }
    Ok(RawStats::from_pixels(bytes.chunks_exact(CHANNELS)))
}

pub fn analyze_grid(grid: &PixelGrid) -> RawStats {
    RawStats::from_pixels(grid.pixels().iter().map(|px| px.as_slice()))
}
