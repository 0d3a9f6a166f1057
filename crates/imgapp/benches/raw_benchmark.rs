use criterion::{criterion_group, criterion_main, Criterion};
use imgapp::{read_raw_from, write_raw_to, PixelGrid};
use std::hint::black_box;

fn generate_gradient_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x * 255) / width.max(1)) as u8);
            pixels.push(((y * 255) / height.max(1)) as u8);
            pixels.push(128);
            pixels.push(255);
        }
    }
    pixels
}

fn bench_read_raw(c: &mut Criterion) {
    let rgba = generate_gradient_rgba(1024, 1024);

    c.bench_function("read_raw_1024x1024", |b| {
        b.iter(|| {
            let result = read_raw_from(black_box(rgba.as_slice()), 1024, 1024);
            assert!(result.is_ok());
            result
        })
    });
}

fn bench_write_raw(c: &mut Criterion) {
    let rgba = generate_gradient_rgba(1024, 1024);
    let grid = PixelGrid::from_rgba_bytes(1024, 1024, &rgba).unwrap();
    let mut out = Vec::with_capacity(rgba.len());

    c.bench_function("write_raw_1024x1024", |b| {
        b.iter(|| {
            out.clear();
            write_raw_to(black_box(&grid), &mut out).unwrap();
            out.len()
        })
    });
}

criterion_group!(benches, bench_read_raw, bench_write_raw);
criterion_main!(benches);
