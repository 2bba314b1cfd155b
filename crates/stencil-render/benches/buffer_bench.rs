//! Benchmarks for the buffer hot paths: fills, string writes, and blits.
//!
//! Run with: cargo bench -p stencil-render --bench buffer_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use stencil_render::buffer::Buffer;
use stencil_render::cell::Cell;
use stencil_render::pool::BufferPool;
use stencil_render::style::Style;

fn bench_clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/clear");
    for (w, h) in [(80u16, 24u16), (200, 60)] {
        let mut buf = Buffer::new(w, h);
        group.bench_with_input(BenchmarkId::new("full", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                buf.clear();
                black_box(&buf);
            });
        });

        let mut lazy = Buffer::new(w, h);
        group.bench_with_input(BenchmarkId::new("dirty", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                lazy.write_str(0, 2, "some content", Style::DEFAULT);
                lazy.clear_dirty();
                black_box(&lazy);
            });
        });
    }
    group.finish();
}

fn bench_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/write");
    let mut buf = Buffer::new(200, 60);
    let line = "the quick brown fox jumps over the lazy dog";

    group.bench_function("str_fast", |b| {
        b.iter(|| {
            for y in 0..60 {
                buf.write_str_fast(0, y, black_box(line), Style::DEFAULT, 200);
            }
        });
    });

    group.bench_function("str_padded", |b| {
        b.iter(|| {
            for y in 0..60 {
                buf.write_str_padded(0, y, black_box(line), Style::DEFAULT, 200);
            }
        });
    });

    group.bench_function("progress_bar", |b| {
        b.iter(|| {
            for y in 0..60u16 {
                buf.write_progress_bar(0, y, 80, y as f64 / 60.0, Style::DEFAULT);
            }
        });
    });
    group.finish();
}

fn bench_blit(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/blit");
    let mut src = Buffer::new(200, 60);
    for y in 0..60 {
        src.write_str(0, y, "scrollback content line", Style::DEFAULT);
    }
    let mut dst = Buffer::new(200, 60);
    group.bench_function("full", |b| {
        b.iter(|| {
            dst.blit(black_box(&src), 0, 0, 0, 0, 200, 60);
        });
    });
    group.bench_function("window", |b| {
        b.iter(|| {
            dst.blit(black_box(&src), 10, 10, 40, 5, 80, 20);
        });
    });
    group.finish();
}

fn bench_pool_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/swap");
    let mut pool = BufferPool::new(200, 60);
    group.bench_function("swap_and_touch", |b| {
        b.iter(|| {
            pool.current_mut().set_fast(0, 0, Cell::from_char('x'));
            pool.swap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_clear, bench_writes, bench_blit, bench_pool_swap);
criterion_main!(benches);
