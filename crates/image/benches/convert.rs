//! Benchmarks for detection and conversion.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use snapconvert_image::{ConvertOptions, OutputFormat, ResizeOptions, convert, detect_format, resize_image};

fn sample_png() -> Vec<u8> {
    let options = ConvertOptions {
        format: OutputFormat::Png,
        quality: 100,
        compression_level: None,
    };
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="256" height="256">
        <rect width="256" height="128" fill="#3366cc"/>
        <circle cx="128" cy="128" r="64" fill="#ffcc00" fill-opacity="0.6"/>
    </svg>"##;
    convert(svg, &options).expect("sample renders").bytes
}

fn bench_detect(c: &mut Criterion) {
    let png = sample_png();
    c.bench_function("detect_png", |b| b.iter(|| detect_format(black_box(&png))));
}

fn bench_convert(c: &mut Criterion) {
    let png = sample_png();
    let mut group = c.benchmark_group("convert");

    for format in [OutputFormat::Jpeg, OutputFormat::WebP, OutputFormat::Png] {
        let options = ConvertOptions {
            format,
            quality: 80,
            compression_level: Some(60),
        };
        group.bench_function(format.extension(), |b| b.iter(|| convert(black_box(&png), &options)));
    }

    group.finish();
}

fn bench_resize(c: &mut Criterion) {
    let png = sample_png();
    let options = ResizeOptions::new(128, 128, &ConvertOptions::default());
    c.bench_function("resize_half_jpeg", |b| b.iter(|| resize_image(black_box(&png), &options)));
}

criterion_group!(benches, bench_detect, bench_convert, bench_resize);
criterion_main!(benches);
