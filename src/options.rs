//! Watermark options and image inputs.
//!
//! [`WatermarkOptions`] can be built in code with struct update syntax or
//! parsed from a JSON option record with [`WatermarkOptions::from_json`]. In
//! both cases every key the caller leaves out keeps its default value.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use serde::{de, Deserialize, Deserializer};

use crate::error::{Error, Result};

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// An image to load: a file, an encoded byte buffer, or an already-decoded image.
#[derive(Clone)]
pub enum ImageInput<'a> {
    /// Path to a GIF, PNG or JPEG file.
    Path(Cow<'a, Path>),
    /// Encoded image bytes in any format the decoder recognizes.
    Bytes(Cow<'a, [u8]>),
    /// A decoded image borrowed from the caller.
    Decoded(&'a DynamicImage),
}

impl Default for ImageInput<'_> {
    /// An empty byte buffer, which fails to load.
    fn default() -> Self {
        Self::Bytes(Cow::Borrowed(&[]))
    }
}

impl fmt::Debug for ImageInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Decoded(img) => write!(f, "Decoded({}x{})", img.width(), img.height()),
        }
    }
}

impl<'a> From<&'a Path> for ImageInput<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(Cow::Borrowed(path))
    }
}

impl From<PathBuf> for ImageInput<'_> {
    fn from(path: PathBuf) -> Self {
        Self::Path(Cow::Owned(path))
    }
}

impl<'a> From<&'a [u8]> for ImageInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for ImageInput<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Cow::Owned(bytes))
    }
}

impl<'a> From<&'a DynamicImage> for ImageInput<'a> {
    fn from(img: &'a DynamicImage) -> Self {
        Self::Decoded(img)
    }
}

/// In an option record the watermark is a file path; an empty string keeps the default.
impl<'de> Deserialize<'de> for ImageInput<'_> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = PathBuf::deserialize(deserializer)?;
        if path.as_os_str().is_empty() {
            Ok(Self::default())
        } else {
            Ok(Self::Path(Cow::Owned(path)))
        }
    }
}

/// Placement of the watermark along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Anchor {
    /// Flush with the left or top edge.
    Start,
    /// Centered.
    Center,
    /// Flush with the right or bottom edge.
    End,
}

/// Horizontal alignment of the watermark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    /// Left edge.
    Left,
    /// Horizontally centered.
    #[default]
    Center,
    /// Right edge.
    Right,
}

/// Vertical alignment of the watermark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Top edge.
    Top,
    /// Vertically centered.
    #[default]
    Middle,
    /// Bottom edge.
    Bottom,
}

impl From<HorizontalAlign> for Anchor {
    fn from(align: HorizontalAlign) -> Self {
        match align {
            HorizontalAlign::Left => Anchor::Start,
            HorizontalAlign::Center => Anchor::Center,
            HorizontalAlign::Right => Anchor::End,
        }
    }
}

impl From<VerticalAlign> for Anchor {
    fn from(align: VerticalAlign) -> Self {
        match align {
            VerticalAlign::Top => Anchor::Start,
            VerticalAlign::Middle => Anchor::Center,
            VerticalAlign::Bottom => Anchor::End,
        }
    }
}

/// Options controlling where the watermark goes and how the result is encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatermarkOptions<'a> {
    /// The watermark image.
    pub watermark: ImageInput<'a>,
    /// Horizontal alignment.
    pub halign: HorizontalAlign,
    /// Vertical alignment.
    pub valign: VerticalAlign,
    /// Pixels added to the aligned X coordinate (may be negative).
    pub hshift: i64,
    /// Pixels added to the aligned Y coordinate (may be negative).
    pub vshift: i64,
    /// Output encoding. Only GIF, PNG and JPEG can be emitted.
    #[serde(rename = "type", deserialize_with = "deserialize_format")]
    pub format: ImageFormat,
    /// JPEG quality (0-100), ignored for other formats.
    #[serde(rename = "jpeg-quality", deserialize_with = "deserialize_quality")]
    pub jpeg_quality: u8,
}

impl Default for WatermarkOptions<'_> {
    fn default() -> Self {
        Self {
            watermark: ImageInput::default(),
            halign: HorizontalAlign::Center,
            valign: VerticalAlign::Middle,
            hshift: 0,
            vshift: 0,
            format: ImageFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl WatermarkOptions<'static> {
    /// Parse a JSON option record, filling absent keys with their defaults.
    ///
    /// Recognized keys: `watermark` (file path), `halign`, `valign`, `hshift`,
    /// `vshift`, `type` and `jpeg-quality`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if the record is not valid JSON or a value
    /// has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse an output type name such as `"png"`, `"jpg"` or `"jpeg"`.
///
/// Any name the `image` crate knows is accepted here; whether it can actually
/// be emitted is decided at encode time.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for names that match no image format.
pub fn parse_format(name: &str) -> Result<ImageFormat> {
    ImageFormat::from_extension(name).ok_or_else(|| Error::UnsupportedFormat(name.to_string()))
}

fn deserialize_format<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<ImageFormat, D::Error> {
    let name = String::deserialize(deserializer)?;
    parse_format(&name).map_err(de::Error::custom)
}

fn deserialize_quality<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u8, D::Error> {
    let quality = u8::deserialize(deserializer)?;
    if quality > 100 {
        return Err(de::Error::invalid_value(
            de::Unexpected::Unsigned(u64::from(quality)),
            &"a JPEG quality between 0 and 100",
        ));
    }
    Ok(quality)
}
