//! Load, composite and emit in one call.

use image::DynamicImage;
use tracing::warn;

use crate::compositor;
use crate::emit::{self, OutputTarget};
use crate::error::Result;
use crate::loader;
use crate::options::{ImageInput, WatermarkOptions};

/// Overlay the watermark named in `options` onto `source` and emit the result.
///
/// The stages run in order and the first failure aborts the rest: a source
/// or watermark that fails to load skips compositing and encoding entirely.
/// On success the composited image is returned for further use; on failure
/// no image is returned.
///
/// A borrowed [`ImageInput::Decoded`] source is copied before compositing, so
/// the caller's image is left untouched.
///
/// # Errors
///
/// Propagates the error of the first stage that fails; see
/// [`loader::load`] and [`emit::emit`].
pub fn output(
    source: &ImageInput<'_>,
    target: OutputTarget<'_>,
    options: &WatermarkOptions<'_>,
) -> Result<DynamicImage> {
    let source = loader::load(source).inspect_err(|e| warn!("invalid image resource: {e}"))?;
    let watermark = loader::load(&options.watermark)
        .inspect_err(|e| warn!("invalid watermark resource: {e}"))?;

    let mut image = source.into_owned();
    compositor::composite(&mut image, &watermark, options);
    drop(watermark);

    emit::emit(&image, target, options.format, options.jpeg_quality)
        .inspect_err(|e| warn!("failed to output image: {e}"))?;

    Ok(image)
}
