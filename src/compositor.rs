//! Watermark placement and pixel copying.
//!
//! The watermark is copied onto the source as an opaque overwrite:
//! `destination = watermark` for every pixel of the placed rectangle that
//! falls inside the source. The watermark's alpha channel is copied along
//! with its color, never blended. Pixels outside the source are dropped.

use image::{imageops, DynamicImage, GenericImageView};
use tracing::debug;

use crate::options::{Anchor, WatermarkOptions};

/// Compute the watermark's top-left coordinate along one axis.
///
/// `Center` floors toward negative infinity when the watermark is larger
/// than the image and the difference is odd.
#[must_use]
pub fn coord(anchor: Anchor, image_dim: u32, mark_dim: u32) -> i64 {
    let free = i64::from(image_dim) - i64::from(mark_dim);
    match anchor {
        Anchor::Start => 0,
        Anchor::End => free,
        Anchor::Center => free >> 1,
    }
}

/// Where the watermark lands on the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// X of the watermark's top-left corner; may be negative or past the right edge.
    pub x: i64,
    /// Y of the watermark's top-left corner; may be negative or past the bottom edge.
    pub y: i64,
    /// Watermark width in pixels.
    pub width: u32,
    /// Watermark height in pixels.
    pub height: u32,
}

/// The part of a [`Placement`] that lies inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge in source coordinates.
    pub x: u32,
    /// Top edge in source coordinates.
    pub y: u32,
    /// Width of the drawn area.
    pub width: u32,
    /// Height of the drawn area.
    pub height: u32,
}

impl Placement {
    /// Place a `mark` sized watermark on a `source` sized image.
    ///
    /// Alignment gives the base coordinate per axis and the shifts are added
    /// afterwards. No clamping to the source is applied; shifts saturate at
    /// the `i64` range.
    #[must_use]
    pub fn compute(source: (u32, u32), mark: (u32, u32), opts: &WatermarkOptions<'_>) -> Self {
        let (src_w, src_h) = source;
        let (mark_w, mark_h) = mark;
        Self {
            x: coord(opts.halign.into(), src_w, mark_w).saturating_add(opts.hshift),
            y: coord(opts.valign.into(), src_h, mark_h).saturating_add(opts.vshift),
            width: mark_w,
            height: mark_h,
        }
    }

    /// Clip the placement to a `source` sized image.
    ///
    /// Returns `None` when the watermark lies entirely outside.
    #[must_use]
    pub fn visible(&self, source: (u32, u32)) -> Option<Region> {
        let (src_w, src_h) = source;
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.x.saturating_add(i64::from(self.width)).min(i64::from(src_w));
        let y2 = self.y.saturating_add(i64::from(self.height)).min(i64::from(src_h));

        if x1 >= x2 || y1 >= y2 {
            return None;
        }

        // all four values are within 0..=u32::MAX after clipping
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let region = Region {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        };
        Some(region)
    }
}

/// Copy `watermark` onto `source` in place according to `opts`.
///
/// Returns the unclipped [`Placement`] that was used. A watermark that
/// overhangs the source, or misses it entirely, is clipped silently.
pub fn composite(
    source: &mut DynamicImage,
    watermark: &DynamicImage,
    opts: &WatermarkOptions<'_>,
) -> Placement {
    let placement = Placement::compute(source.dimensions(), watermark.dimensions(), opts);
    let visible = placement.visible(source.dimensions());
    debug!(
        x = placement.x,
        y = placement.y,
        width = placement.width,
        height = placement.height,
        ?visible,
        "placing watermark"
    );

    if visible.is_some() {
        imageops::replace(source, watermark, placement.x, placement.y);
    }
    placement
}
