//! Parameter sets and their validation into typed requests.
//!
//! A [`ParameterSet`] is the string-keyed bundle an invocation carries
//! (`encode`, `input=...`, `width=...`). [`validate`] turns it into exactly one
//! [`Request`] or fails before any file is touched.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use thiserror::Error;

use crate::{raw_len, ImgError, Result};

/// Recognized parameter keys.
pub mod keys {
    pub const ENCODE: &str = "encode";
    pub const DECODE: &str = "decode";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const IN_PREFERRED_COLOR_SPACE: &str = "inPreferredColorSpace";
    pub const COMPRESS_FORMAT: &str = "compressFormat";
    pub const COMPRESS_QUALITY: &str = "compressQuality";
    pub const WORKDIR: &str = "workdir";

    pub const ALL: [&str; 10] = [
        ENCODE,
        DECODE,
        INPUT,
        OUTPUT,
        WIDTH,
        HEIGHT,
        IN_PREFERRED_COLOR_SPACE,
        COMPRESS_FORMAT,
        COMPRESS_QUALITY,
        WORKDIR,
    ];
}

/// Error returned when a parameter value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseValueError(String);

/// String-keyed request bundle, one per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(key, value)` pairs. Later duplicates win.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs.into_iter().collect()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Compression formats the codec adapter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressFormat {
    /// Lossless PNG; quality is ignored.
    #[default]
    Png,
    /// Lossy JPEG; alpha is dropped.
    Jpeg,
    /// Lossy WebP.
    WebpLossy,
    /// Lossless WebP; quality is ignored.
    WebpLossless,
}

impl CompressFormat {
    pub const ALL: [CompressFormat; 4] = [
        CompressFormat::Png,
        CompressFormat::Jpeg,
        CompressFormat::WebpLossy,
        CompressFormat::WebpLossless,
    ];

    /// Parameter name of the format.
    pub fn name(self) -> &'static str {
        match self {
            CompressFormat::Png => "PNG",
            CompressFormat::Jpeg => "JPEG",
            CompressFormat::WebpLossy => "WEBP_LOSSY",
            CompressFormat::WebpLossless => "WEBP_LOSSLESS",
        }
    }

    #[inline]
    pub fn is_lossless(self) -> bool {
        matches!(self, CompressFormat::Png | CompressFormat::WebpLossless)
    }

    /// Conventional file extension for the container.
    pub fn extension(self) -> &'static str {
        match self {
            CompressFormat::Png => "png",
            CompressFormat::Jpeg => "jpg",
            CompressFormat::WebpLossy | CompressFormat::WebpLossless => "webp",
        }
    }
}

impl fmt::Display for CompressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressFormat {
    type Err = ParseValueError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ParseValueError(expected_one_of(Self::ALL.map(Self::name))))
    }
}

/// Named color spaces a decode may be asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Aces,
    Acescg,
    AdobeRgb,
    Bt2020,
    Bt2020Hlg,
    Bt2020Pq,
    Bt709,
    CieLab,
    CieXyz,
    DciP3,
    DisplayP3,
    ExtendedSrgb,
    LinearExtendedSrgb,
    LinearSrgb,
    Ntsc1953,
    ProPhotoRgb,
    SmpteC,
    Srgb,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 18] = [
        ColorSpace::Aces,
        ColorSpace::Acescg,
        ColorSpace::AdobeRgb,
        ColorSpace::Bt2020,
        ColorSpace::Bt2020Hlg,
        ColorSpace::Bt2020Pq,
        ColorSpace::Bt709,
        ColorSpace::CieLab,
        ColorSpace::CieXyz,
        ColorSpace::DciP3,
        ColorSpace::DisplayP3,
        ColorSpace::ExtendedSrgb,
        ColorSpace::LinearExtendedSrgb,
        ColorSpace::LinearSrgb,
        ColorSpace::Ntsc1953,
        ColorSpace::ProPhotoRgb,
        ColorSpace::SmpteC,
        ColorSpace::Srgb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorSpace::Aces => "ACES",
            ColorSpace::Acescg => "ACESCG",
            ColorSpace::AdobeRgb => "ADOBE_RGB",
            ColorSpace::Bt2020 => "BT2020",
            ColorSpace::Bt2020Hlg => "BT2020_HLG",
            ColorSpace::Bt2020Pq => "BT2020_PQ",
            ColorSpace::Bt709 => "BT709",
            ColorSpace::CieLab => "CIE_LAB",
            ColorSpace::CieXyz => "CIE_XYZ",
            ColorSpace::DciP3 => "DCI_P3",
            ColorSpace::DisplayP3 => "DISPLAY_P3",
            ColorSpace::ExtendedSrgb => "EXTENDED_SRGB",
            ColorSpace::LinearExtendedSrgb => "LINEAR_EXTENDED_SRGB",
            ColorSpace::LinearSrgb => "LINEAR_SRGB",
            ColorSpace::Ntsc1953 => "NTSC_1953",
            ColorSpace::ProPhotoRgb => "PRO_PHOTO_RGB",
            ColorSpace::SmpteC => "SMPTE_C",
            ColorSpace::Srgb => "SRGB",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = ParseValueError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ParseValueError(expected_one_of(Self::ALL.map(Self::name))))
    }
}

/// Compression quality in `0..=100`. Lossless formats ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: Quality = Quality(0);
    pub const MAX: Quality = Quality(100);

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Quality {
    type Error = ParseValueError;

    fn try_from(value: i64) -> core::result::Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(ParseValueError(format!("{value} is outside 0..=100")))
        }
    }
}

impl FromStr for Quality {
    type Err = ParseValueError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| ParseValueError("not an integer".to_string()))?;
        Quality::try_from(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation selected by a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw RGBA buffer to encoded image.
    Encode,
    /// Encoded image to raw RGBA buffer.
    Decode,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encode => f.write_str(keys::ENCODE),
            Mode::Decode => f.write_str(keys::DECODE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: CompressFormat,
    pub quality: Quality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub color_space: Option<ColorSpace>,
}

/// A validated operation, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Encode(EncodeRequest),
    Decode(DecodeRequest),
}

impl Request {
    pub fn mode(&self) -> Mode {
        match self {
            Request::Encode(_) => Mode::Encode,
            Request::Decode(_) => Mode::Decode,
        }
    }

    pub fn input(&self) -> &Path {
        match self {
            Request::Encode(r) => &r.input,
            Request::Decode(r) => &r.input,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Request::Encode(r) => &r.output,
            Request::Decode(r) => &r.output,
        }
    }
}

/// Decide which single operation a parameter set asks for.
///
/// All checks happen here, before any I/O:
/// - exactly one of `encode` / `decode` must be present
/// - `input` and `output` are required
/// - `width` and `height` are required positive integers when encoding
/// - `compressFormat`, `compressQuality` and `inPreferredColorSpace` are
///   optional but must be valid when present
///
/// Relative `input` / `output` paths are resolved against `workdir` when it
/// is given.
pub fn validate(params: &ParameterSet) -> Result<Request> {
    for (key, _) in params.iter() {
        if !keys::ALL.contains(&key) {
            debug!("ignoring unknown parameter {key:?}");
        }
    }

    let mode = match (params.contains(keys::ENCODE), params.contains(keys::DECODE)) {
        (true, false) => Mode::Encode,
        (false, true) => Mode::Decode,
        (true, true) => {
            return Err(ImgError::InvalidInvocation(
                "need to specify only one of \"encode\" and \"decode\"".to_string(),
            ))
        }
        (false, false) => {
            return Err(ImgError::InvalidInvocation(
                "need to specify either \"encode\" or \"decode\"".to_string(),
            ))
        }
    };

    let workdir = match params.get(keys::WORKDIR) {
        Some(dir) if dir.trim().is_empty() => {
            return Err(invalid(keys::WORKDIR, dir, "must not be empty"));
        }
        Some(dir) => Some(PathBuf::from(dir)),
        None => None,
    };
    let input = resolve(workdir.as_deref(), required(params, keys::INPUT)?);
    let output = resolve(workdir.as_deref(), required(params, keys::OUTPUT)?);

    let format: Option<CompressFormat> = optional(params, keys::COMPRESS_FORMAT)?;
    let quality: Option<Quality> = optional(params, keys::COMPRESS_QUALITY)?;
    let color_space: Option<ColorSpace> = optional(params, keys::IN_PREFERRED_COLOR_SPACE)?;

    match mode {
        Mode::Encode => {
            let width = dimension(params, keys::WIDTH)?;
            let height = dimension(params, keys::HEIGHT)?;
            if raw_len(width, height).is_none() {
                return Err(invalid(
                    keys::WIDTH,
                    &width.to_string(),
                    &format!("{width}x{height} raw buffer does not fit in memory"),
                ));
            }
            if color_space.is_some() {
                warn!("{} only applies to decode, ignoring", keys::IN_PREFERRED_COLOR_SPACE);
            }
            Ok(Request::Encode(EncodeRequest {
                input,
                output,
                width,
                height,
                format: format.unwrap_or_default(),
                quality: quality.unwrap_or_default(),
            }))
        }
        Mode::Decode => {
            for key in [keys::WIDTH, keys::HEIGHT] {
                if params.contains(key) {
                    dimension(params, key)?;
                    warn!("{key} only applies to encode, ignoring");
                }
            }
            if format.is_some() || quality.is_some() {
                warn!(
                    "{} / {} only apply to encode, ignoring",
                    keys::COMPRESS_FORMAT,
                    keys::COMPRESS_QUALITY
                );
            }
            Ok(Request::Decode(DecodeRequest {
                input,
                output,
                color_space,
            }))
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ImgError {
    ImgError::InvalidParameter {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn required<'a>(params: &'a ParameterSet, key: &'static str) -> Result<&'a str> {
    match params.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ImgError::MissingParameter(key)),
    }
}

fn optional<T>(params: &ParameterSet, key: &'static str) -> Result<Option<T>>
where
    T: FromStr<Err = ParseValueError>,
{
    params
        .get(key)
        .map(|value| {
            value
                .parse()
                .map_err(|e: ParseValueError| invalid(key, value, &e.0))
        })
        .transpose()
}

fn dimension(params: &ParameterSet, key: &'static str) -> Result<u32> {
    let value = params.get(key).ok_or(ImgError::MissingParameter(key))?;
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, value, "must be a positive integer")),
    }
}

fn resolve(workdir: Option<&Path>, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    match workdir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

fn expected_one_of<const N: usize>(names: [&str; N]) -> String {
    format!("expected one of {}", names.join(", "))
}
