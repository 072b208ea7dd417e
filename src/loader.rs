//! Resolve an [`ImageInput`] into a decoded image.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::ImageInput;

/// Load an image from a file, a byte buffer, or pass a decoded image through.
///
/// Files must carry a GIF, PNG or JPEG signature; the extension is not
/// consulted. Byte buffers are sniffed and decoded with whatever formats the
/// decoder supports. Decoded images are borrowed, not copied.
///
/// # Errors
///
/// - [`Error::NotFound`] if a path does not name a regular file.
/// - [`Error::Unreadable`] if a file exists but cannot be read.
/// - [`Error::UnsupportedFormat`] if a file is not GIF, PNG or JPEG.
/// - [`Error::InvalidData`] if a byte buffer is empty or decodes to an empty image.
/// - [`Error::Decode`] if the decoder rejects the data.
pub fn load<'a>(input: &ImageInput<'a>) -> Result<Cow<'a, DynamicImage>> {
    let img = match input {
        ImageInput::Path(path) => load_file(path)?,
        ImageInput::Bytes(bytes) => load_bytes(bytes)?,
        ImageInput::Decoded(img) => return Ok(Cow::Borrowed(*img)),
    };

    if img.width() == 0 || img.height() == 0 {
        return Err(Error::InvalidData(format!(
            "decoded image has no pixels ({}x{})",
            img.width(),
            img.height()
        )));
    }

    debug!(width = img.width(), height = img.height(), "decoded image");
    Ok(Cow::Owned(img))
}

fn load_file(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|source| read_error(path, source))?;

    let format = signature_format(&bytes)?;
    debug!(path = %path.display(), ?format, "loading image file");
    image::load_from_memory_with_format(&bytes, format).map_err(Error::Decode)
}

/// A file that vanished between the check and the read is still `NotFound`;
/// every other I/O failure (permissions, EISDIR, ...) is `Unreadable`.
fn read_error(path: &Path, source: std::io::Error) -> Error {
    match source.kind() {
        ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    }
}

fn load_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::InvalidData("empty image buffer".to_string()));
    }
    image::load_from_memory(bytes).map_err(Error::Decode)
}

/// Classify encoded bytes by their signature, accepting only GIF, PNG and JPEG.
fn signature_format(bytes: &[u8]) -> Result<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Gif | ImageFormat::Png | ImageFormat::Jpeg)) => Ok(format),
        Ok(other) => Err(Error::UnsupportedFormat(format!("{other:?}"))),
        Err(_) => Err(Error::UnsupportedFormat(
            "unrecognized file signature".to_string(),
        )),
    }
}
