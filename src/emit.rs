//! Encode a composited image and deliver it to a stream or a file.

use std::io::{Cursor, Write};
use std::path::Path;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Frame, ImageFormat};
use tracing::debug;

use crate::error::{Error, Result};

/// A response body that carries a content type, such as an HTTP response.
///
/// Once the headers have been sent the content type can no longer change,
/// so emitting to such a stream fails without writing anything.
pub trait ResponseStream: Write {
    /// Whether the headers of this response have already gone out.
    fn headers_sent(&self) -> bool;

    /// Set the `Content-Type` header.
    fn set_content_type(&mut self, mime: &'static str);
}

/// An in-memory [`ResponseStream`] whose headers count as sent after the first body write.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The content type set so far, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    /// The body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning its body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl Write for BufferedResponse {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.body.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ResponseStream for BufferedResponse {
    fn headers_sent(&self) -> bool {
        !self.body.is_empty()
    }

    fn set_content_type(&mut self, mime: &'static str) {
        self.content_type = Some(mime);
    }
}

/// Where emitted bytes go.
pub enum OutputTarget<'a> {
    /// Write to a response stream, setting its content type first.
    Stream(&'a mut dyn ResponseStream),
    /// Create or truncate a file and write to it.
    File(&'a Path),
}

impl<'a> OutputTarget<'a> {
    /// Pick the file target when `destination` is present and non-empty,
    /// otherwise the stream.
    #[must_use]
    pub fn resolve(destination: Option<&'a Path>, stream: &'a mut dyn ResponseStream) -> Self {
        match destination {
            Some(path) if !path.as_os_str().is_empty() => Self::File(path),
            _ => Self::Stream(stream),
        }
    }
}

/// MIME type for an emittable format.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for anything but GIF, PNG and JPEG.
pub fn mime_type(format: ImageFormat) -> Result<&'static str> {
    match format {
        ImageFormat::Gif => Ok("image/gif"),
        ImageFormat::Png => Ok("image/png"),
        ImageFormat::Jpeg => Ok("image/jpeg"),
        other => Err(Error::UnsupportedFormat(format!("{other:?}"))),
    }
}

/// Color quantization speed for GIF output (1 slowest, 30 fastest).
const GIF_SPEED: i32 = 10;

/// Encode an image as GIF, PNG or JPEG into memory.
///
/// `jpeg_quality` is clamped to 1-100 and only used for JPEG, which also
/// drops any alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for other formats and
/// [`Error::Encode`] if the encoder fails.
pub fn encode(bitmap: &DynamicImage, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, GIF_SPEED);
            encoder
                .encode_frame(Frame::new(bitmap.to_rgba8()))
                .map_err(Error::Encode)?;
        }
        ImageFormat::Png => {
            bitmap
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(Error::Encode)?;
        }
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality.clamp(1, 100));
            encoder
                .encode_image(&bitmap.to_rgb8())
                .map_err(Error::Encode)?;
        }
        other => return Err(Error::UnsupportedFormat(format!("{other:?}"))),
    }
    Ok(buf)
}

/// Encode `bitmap` and write it to `target`.
///
/// Nothing is written unless encoding succeeds. For a stream target the
/// content type is set just before the body is written.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] if `format` is not GIF, PNG or JPEG.
/// - [`Error::HeadersAlreadySent`] if the stream's headers are already out.
/// - [`Error::Encode`] if the encoder fails.
/// - [`Error::Write`] if writing to the stream or file fails.
pub fn emit(
    bitmap: &DynamicImage,
    target: OutputTarget<'_>,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<()> {
    let mime = mime_type(format)?;

    match target {
        OutputTarget::Stream(stream) => {
            if stream.headers_sent() {
                return Err(Error::HeadersAlreadySent);
            }
            let bytes = encode(bitmap, format, jpeg_quality)?;
            stream.set_content_type(mime);
            stream
                .write_all(&bytes)
                .and_then(|()| stream.flush())
                .map_err(|source| Error::Write {
                    target: "stream".to_string(),
                    source,
                })?;
            debug!(%mime, len = bytes.len(), "emitted image to stream");
        }
        OutputTarget::File(path) => {
            let bytes = encode(bitmap, format, jpeg_quality)?;
            std::fs::write(path, &bytes).map_err(|source| Error::Write {
                target: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), len = bytes.len(), "emitted image to file");
        }
    }

    Ok(())
}
