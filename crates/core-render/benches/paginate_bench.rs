use core_model::{VectorSurface, ViewBox};
use core_render::PreviewRenderer;
use core_render::mapper::slice;
use core_render::paginate::layout;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_layout(c: &mut Criterion) {
    c.bench_function("layout_sweep", |b| {
        b.iter(|| {
            let mut pages = 0usize;
            let mut h = 0.0;
            while h < 20_000.0 {
                pages += layout(black_box(h)).pages;
                h += 7.5;
            }
            pages
        })
    });
}

fn bench_slice(c: &mut Criterion) {
    let markup = "<path d=\"M0 0 L10 10\"/>".repeat(2_000);
    let surface = VectorSurface::from_parts(ViewBox::new(0.0, 0.0, 612.0, 15_840.0), markup);
    let l = layout(15_840.0);
    c.bench_function("slice_twenty_pages", |b| {
        b.iter(|| slice(black_box(&surface), black_box(&l)).len())
    });

    let renderer = PreviewRenderer::default();
    c.bench_function("render_twenty_pages", |b| {
        b.iter(|| renderer.render(black_box(&surface)).page_count())
    });
}

criterion_group!(benches, bench_layout, bench_slice);
criterion_main!(benches);
