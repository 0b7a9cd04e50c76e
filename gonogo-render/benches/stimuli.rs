use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gonogo_core::{Color, Renderer as _, Shape};
use gonogo_render::{SkiaRenderer, rasterize};

pub fn bench_rasterize(c: &mut Criterion) {
    let mut g = c.benchmark_group("rasterize");
    for shape in Shape::ALL {
        g.bench_function(shape.name(), |b| {
            b.iter(|| black_box(rasterize(shape, Color::Red, 200)))
        });
    }
    g.finish();
}

pub fn bench_frame(c: &mut Criterion) {
    let width = 1280u32;
    let height = 720u32;
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);

    g.bench_function("stimulus_frame", |b| {
        b.iter_batched(
            || {
                let mut r = SkiaRenderer::new(width, height, 200).expect("canvas");
                r.draw(Shape::Arrow, Color::Blue);
                (r, vec![0u8; (width * height * 4) as usize])
            },
            |(mut r, mut fb)| {
                r.render_frame(&mut fb).expect("frame");
                black_box(fb);
            },
            BatchSize::LargeInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_rasterize, bench_frame);
criterion_main!(benches);
