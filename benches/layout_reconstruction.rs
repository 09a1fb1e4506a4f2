//! Layout reconstruction benchmarks
//!
//! Measures the full pipeline on synthetic pages mixing flowing text with
//! column-aligned tables, at several token counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ocr_layout::{LayoutConfig, LayoutPipeline, RawToken};

/// Generate a page of `lines` text lines, every fourth block a 4-column table.
fn synthetic_page(lines: usize, seed: u64) -> Vec<RawToken> {
    let mut tokens = vec![];
    let mut s = seed;
    let mut jitter = || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((s >> 33) as f32 / u32::MAX as f32) * 2.0
    };

    for line in 0..lines {
        let top = line as f32 * 16.0 + jitter();
        if (line / 8) % 4 == 3 {
            for col in 0..4 {
                let left = col as f32 * 120.0 + jitter();
                tokens.push(RawToken::new("cell", left, top, left + 40.0, top + 12.0, 0.9));
            }
        } else {
            let mut left = 20.0;
            for _ in 0..10 {
                let width = 24.0 + jitter() * 8.0;
                tokens.push(RawToken::new("word", left, top, left + width, top + 12.0, 0.85));
                left += width + 8.0;
            }
        }
    }

    tokens
}

/// Benchmark a single page at increasing sizes
fn bench_process_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_page");
    let pipeline = LayoutPipeline::new();

    for lines in [10, 50, 200] {
        let page = synthetic_page(lines, 42);
        group.throughput(Throughput::Elements(page.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &page, |b, page| {
            b.iter(|| pipeline.process(black_box(page)))
        });
    }

    group.finish();
}

/// Benchmark a batch of pages, parallel when the feature is enabled
fn bench_process_pages(c: &mut Criterion) {
    let pages: Vec<Vec<RawToken>> = (0..16).map(|i| synthetic_page(60, i)).collect();
    let pipeline = LayoutPipeline::with_config(LayoutConfig::default()).expect("default config");

    c.bench_function("process_pages_16", |b| {
        b.iter(|| pipeline.process_pages(black_box(&pages)))
    });
}

criterion_group!(benches, bench_process_page, bench_process_pages);
criterion_main!(benches);
