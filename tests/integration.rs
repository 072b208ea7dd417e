use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use watermark_overlay::{
    output, BufferedResponse, Error, HorizontalAlign, ImageInput, OutputTarget, VerticalAlign,
    WatermarkOptions,
};

fn checkerboard(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        if (x / 10 + y / 10) % 2 == 0 {
            Rgb([20, 40, 60])
        } else {
            Rgb([200, 180, 160])
        }
    }))
}

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn write_png(dir: &Path, name: &str, img: &DynamicImage) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(img)).unwrap();
    path
}

#[test]
fn pixels_outside_watermark_survive_png_round_trip() {
    let source = checkerboard(200, 200);
    let mark = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([255, 0, 255])));
    let opts = WatermarkOptions {
        watermark: ImageInput::from(&mark),
        halign: HorizontalAlign::Right,
        valign: VerticalAlign::Bottom,
        hshift: -5,
        vshift: -5,
        format: ImageFormat::Png,
        ..WatermarkOptions::default()
    };
    let mut response = BufferedResponse::new();

    output(
        &ImageInput::from(&source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap();

    let decoded = image::load_from_memory(response.body()).unwrap();
    assert_eq!(decoded.dimensions(), (200, 200));
    for (x, y, px) in decoded.pixels() {
        let inside = (145..195).contains(&x) && (145..195).contains(&y);
        if inside {
            assert_eq!(px.0, [255, 0, 255, 255], "watermark pixel ({x},{y})");
        } else {
            assert_eq!(px, source.get_pixel(x, y), "source pixel ({x},{y})");
        }
    }
}

#[test]
fn file_destination_gets_format_signature() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png(dir.path(), "source.png", &checkerboard(64, 48));
    let mark = write_png(dir.path(), "mark.png", &checkerboard(16, 16));

    for (format, signature) in [
        (ImageFormat::Png, &b"\x89PNG"[..]),
        (ImageFormat::Gif, &b"GIF8"[..]),
        (ImageFormat::Jpeg, &[0xFF, 0xD8, 0xFF][..]),
    ] {
        let dest = dir.path().join(format!("out.{}", format.extensions_str()[0]));
        let opts = WatermarkOptions {
            watermark: ImageInput::from(mark.as_path()),
            format,
            ..WatermarkOptions::default()
        };
        let mut unused = BufferedResponse::new();

        let img = output(
            &ImageInput::from(source.as_path()),
            OutputTarget::resolve(Some(dest.as_path()), &mut unused),
            &opts,
        )
        .unwrap();

        assert_eq!(img.dimensions(), (64, 48));
        assert!(std::fs::read(&dest).unwrap().starts_with(signature));
        assert!(unused.body().is_empty());
    }
}

#[test]
fn byte_buffer_inputs_are_composited() {
    let source = png_bytes(&checkerboard(30, 30));
    let mark = png_bytes(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        4,
        4,
        Rgb([0, 255, 0]),
    )));
    let opts = WatermarkOptions {
        watermark: ImageInput::from(mark),
        halign: HorizontalAlign::Left,
        valign: VerticalAlign::Top,
        format: ImageFormat::Png,
        ..WatermarkOptions::default()
    };
    let mut response = BufferedResponse::new();

    let img = output(
        &ImageInput::from(source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap();

    assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert_eq!(img.get_pixel(4, 4).0, [20, 40, 60, 255]);
    assert_eq!(response.content_type(), Some("image/png"));
}

#[test]
fn overhanging_watermark_is_clipped() {
    let source = checkerboard(200, 200);
    let mark = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([1, 2, 3])));
    let opts = WatermarkOptions {
        watermark: ImageInput::from(&mark),
        halign: HorizontalAlign::Left,
        hshift: 190,
        format: ImageFormat::Png,
        ..WatermarkOptions::default()
    };
    let mut response = BufferedResponse::new();

    let img = output(
        &ImageInput::from(&source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap();

    assert_eq!(img.dimensions(), (200, 200));
    assert_eq!(img.get_pixel(195, 100).0, [1, 2, 3, 255]);
    assert_eq!(img.get_pixel(185, 100), source.get_pixel(185, 100));
}

#[test]
fn missing_source_file_is_not_found() {
    let mark = checkerboard(4, 4);
    let opts = WatermarkOptions {
        watermark: ImageInput::from(&mark),
        ..WatermarkOptions::default()
    };
    let mut response = BufferedResponse::new();

    let err = output(
        &ImageInput::from(Path::new("/no/such/source.jpg")),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(response.body().is_empty());
}

#[test]
fn empty_source_buffer_is_invalid_data() {
    let mut response = BufferedResponse::new();
    let err = output(
        &ImageInput::from(Vec::new()),
        OutputTarget::Stream(&mut response),
        &WatermarkOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn bmp_type_is_unsupported() {
    let source = checkerboard(20, 20);
    let mark = checkerboard(5, 5);
    let opts = WatermarkOptions {
        watermark: ImageInput::from(&mark),
        ..WatermarkOptions::from_json(r#"{"type": "BMP"}"#).unwrap()
    };
    let mut response = BufferedResponse::new();

    let err = output(
        &ImageInput::from(&source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert!(response.body().is_empty());
    assert_eq!(response.content_type(), None);
}

#[test]
fn second_stream_output_after_headers_sent_writes_nothing() {
    let source = checkerboard(20, 20);
    let mark = checkerboard(5, 5);
    let opts = WatermarkOptions {
        watermark: ImageInput::from(&mark),
        ..WatermarkOptions::default()
    };
    let mut response = BufferedResponse::new();

    output(
        &ImageInput::from(&source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap();
    assert_eq!(response.content_type(), Some("image/jpeg"));
    let first_len = response.body().len();

    let err = output(
        &ImageInput::from(&source),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap_err();

    assert!(matches!(err, Error::HeadersAlreadySent));
    assert_eq!(response.body().len(), first_len);
}

#[test]
fn options_record_merges_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mark = write_png(dir.path(), "mark.png", &checkerboard(10, 10));
    let json = format!(
        r#"{{"watermark": {}, "halign": "left"}}"#,
        serde_json::to_string(mark.to_str().unwrap()).unwrap()
    );
    let opts = WatermarkOptions::from_json(&json).unwrap();
    assert_eq!(opts.valign, VerticalAlign::Middle);
    assert_eq!(opts.format, ImageFormat::Jpeg);
    assert_eq!(opts.jpeg_quality, 90);

    let mut response = BufferedResponse::new();
    output(
        &ImageInput::from(&checkerboard(40, 40)),
        OutputTarget::Stream(&mut response),
        &opts,
    )
    .unwrap();
    assert!(response.body().starts_with(&[0xFF, 0xD8, 0xFF]));
}

#[test]
fn extreme_shift_from_record_leaves_source_untouched() {
    let source = checkerboard(20, 20);
    let mark = checkerboard(5, 5);

    for record in [
        r#"{"halign": "left", "hshift": 9223372036854775807, "type": "png"}"#,
        r#"{"halign": "right", "hshift": -9223372036854775808, "type": "png"}"#,
        r#"{"valign": "bottom", "vshift": 9223372036854775807, "type": "png"}"#,
    ] {
        let opts = WatermarkOptions {
            watermark: ImageInput::from(&mark),
            ..WatermarkOptions::from_json(record).unwrap()
        };
        let mut response = BufferedResponse::new();

        let img = output(
            &ImageInput::from(&source),
            OutputTarget::Stream(&mut response),
            &opts,
        )
        .unwrap();

        assert_eq!(img, source, "{record}");
        assert!(response.body().starts_with(b"\x89PNG"));
    }
}
