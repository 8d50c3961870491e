use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgr_capture::acquisition::driver::{BayerTileFormat, Image, PixelFormat};
use pgr_capture::acquisition::register::codec;
use pgr_capture::acquisition::timestamp::{Timestamp, TimestampBatch};
use pgr_capture::acquisition::{ImageWriter, TiffCompression, TiffImageWriter, WriterConfig};

fn benchmark_register_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_codec");

    group.bench_function("encode", |b| b.iter(|| codec::encode(black_box(-1.25))));
    group.bench_function("decode", |b| {
        let word = codec::encode(-1.25);
        b.iter(|| codec::decode(black_box(word)))
    });

    group.finish();
}

fn benchmark_timestamps(c: &mut Criterion) {
    let mut group = c.benchmark_group("timestamps");

    group.bench_function("decode_header", |b| {
        let header = Timestamp::from_seconds(42.5).encode();
        b.iter(|| Timestamp::decode(black_box(header)))
    });

    for count in [10usize, 100, 1000] {
        let mut batch = TimestampBatch::with_capacity(count);
        for i in 0..count {
            // crosses the 128 s rollover for the larger batches
            batch.push(Timestamp::from_seconds(100.0 + i as f64 * 0.05));
        }
        group.bench_with_input(BenchmarkId::new("relative_millis", count), &batch, |b, batch| {
            b.iter(|| batch.relative_millis())
        });
    }

    group.finish();
}

fn generate_bgr_image(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let value = ((x + y) % 256) as u8;
            data.extend_from_slice(&[value, value, value]);
        }
    }
    Image {
        rows: height,
        cols: width,
        stride: width * 3,
        pixel_format: PixelFormat::Bgr,
        bayer_format: BayerTileFormat::None,
        data,
    }
}

fn benchmark_tiff_compression(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiff_compression");
    group.sample_size(20);

    let image = generate_bgr_image(640, 480);
    let compressions = vec![
        (TiffCompression::None, "none"),
        (TiffCompression::Lzw, "lzw"),
        (TiffCompression::DeflateFast, "deflate_fast"),
    ];

    for (compression, label) in compressions {
        let writer = TiffImageWriter::new(WriterConfig::builder().compression(compression).build());
        group.bench_with_input(BenchmarkId::from_parameter(label), &image, |b, image| {
            b.iter(|| {
                let mut output = Vec::new();
                let _ = writer.write_image(black_box(image), &mut output);
                output
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_register_codec,
    benchmark_timestamps,
    benchmark_tiff_compression
);
criterion_main!(benches);
