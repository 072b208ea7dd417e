//! Overlay a watermark image onto a source image and emit GIF, PNG or JPEG.
//!
//! Both images can come from a file, an encoded byte buffer, or an image
//! already decoded in memory. The watermark is positioned by a horizontal and
//! vertical alignment plus signed pixel shifts, then copied over the source
//! pixels as-is: no blending, no scaling. Parts that fall outside the source
//! are clipped.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use watermark_overlay::{
//!     output, BufferedResponse, HorizontalAlign, ImageInput, OutputTarget, VerticalAlign,
//!     WatermarkOptions,
//! };
//!
//! let opts = WatermarkOptions {
//!     watermark: ImageInput::from(Path::new("logo.png")),
//!     halign: HorizontalAlign::Right,
//!     valign: VerticalAlign::Bottom,
//!     hshift: -10,
//!     vshift: -10,
//!     ..WatermarkOptions::default()
//! };
//!
//! let mut response = BufferedResponse::new();
//! let target = OutputTarget::resolve(Some(Path::new("photo_marked.jpg")), &mut response);
//! output(&ImageInput::from(Path::new("photo.jpg")), target, &opts).unwrap();
//! ```
//!
//! # Option records
//!
//! Options can also be read from a JSON record; absent keys keep their
//! defaults (centered, JPEG at quality 90).
//!
//! ```no_run
//! use watermark_overlay::WatermarkOptions;
//!
//! let opts = WatermarkOptions::from_json(r#"{"watermark": "logo.png", "type": "png"}"#).unwrap();
//! assert_eq!(opts.jpeg_quality, 90);
//! ```

#![deny(missing_docs)]

pub mod compositor;
pub mod emit;
mod engine;
pub mod error;
pub mod loader;
pub mod options;

pub use compositor::{composite, coord, Placement, Region};
pub use emit::{emit, encode, mime_type, BufferedResponse, OutputTarget, ResponseStream};
pub use engine::output;
pub use error::{Error, Result};
pub use loader::load;
pub use options::{
    parse_format, Anchor, HorizontalAlign, ImageInput, VerticalAlign, WatermarkOptions,
    DEFAULT_JPEG_QUALITY,
};
