//! Benchmark the image pipeline on typical poster and logo inputs.

use std::io::Cursor;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{ImageFormat, Rgb, RgbImage};
use vg_imaging::{detect_format, target_dimensions, transcode, TranscodeInput};

fn png(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 96]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    Bytes::from(buf.into_inner())
}

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="400">
  <rect width="1200" height="400" fill="#202020"/>
  <circle cx="200" cy="200" r="150" fill="#e0a020"/>
</svg>"##;

fn bench_helpers(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_helpers");

    let svg = LOGO_SVG.as_bytes();
    group.bench_function("detect_sniffed_svg", |b| {
        b.iter(|| detect_format(black_box("application/octet-stream"), black_box(svg)));
    });

    group.bench_function("target_dimensions", |b| {
        b.iter(|| target_dimensions(black_box(1920), black_box(1080)));
    });

    group.finish();
}

fn bench_transcode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode");
    group.sample_size(20);

    let poster = png(1920, 1080);
    group.bench_function("poster_1080p_png", |b| {
        b.iter(|| {
            transcode(TranscodeInput {
                bytes: black_box(poster.clone()),
                content_type: "image/png".into(),
            })
        });
    });

    let compliant = png(640, 360);
    group.bench_function("compliant_passthrough", |b| {
        b.iter(|| {
            transcode(TranscodeInput {
                bytes: black_box(compliant.clone()),
                content_type: "image/png".into(),
            })
        });
    });

    let logo = Bytes::from_static(LOGO_SVG.as_bytes());
    group.bench_function("studio_logo_svg", |b| {
        b.iter(|| {
            transcode(TranscodeInput {
                bytes: black_box(logo.clone()),
                content_type: "image/svg+xml".into(),
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_helpers, bench_transcode);
criterion_main!(benches);
