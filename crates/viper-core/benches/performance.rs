use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use viper_core::{LayoutGeometry, TextCore, Viewport};
use viper_highlight::HighlightDriver;

fn large_source(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "int value{i} = {i} * 2; // \"viper\" benchmark line {i}\n"
        ));
    }
    out
}

fn bench_windowed_vs_full_highlight(c: &mut Criterion) {
    let text = large_source(20_000);
    let driver = HighlightDriver::new("java");

    c.bench_function("highlight/full_document_20k_lines", |b| {
        b.iter(|| black_box(driver.highlight_text(black_box(&text), 0).len()))
    });

    let mut core = TextCore::with_highlighter(&text, Box::new(driver.clone()));
    core.set_wrap(120, true);
    let rows = core.layout().visual_line_count();
    c.bench_function("highlight/visible_window_60_rows", |b| {
        b.iter(|| {
            core.set_viewport(Viewport::rows(black_box(10_000), 60, rows));
            black_box(core.spans().len());
        })
    });
}

fn bench_typing_with_rehighlight(c: &mut Criterion) {
    let text = large_source(20_000);
    c.bench_function("typing/50_random_inserts", |b| {
        b.iter_batched(
            || {
                let core = TextCore::with_highlighter(&text, Box::new(HighlightDriver::new("java")));
                (core, StdRng::seed_from_u64(7))
            },
            |(mut core, mut rng)| {
                for _ in 0..50 {
                    let offset = rng.gen_range(0..=core.len_chars());
                    core.insert(offset, "x").unwrap();
                }
                black_box(core.spans().len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_undo_redo_cycle(c: &mut Criterion) {
    let text = large_source(5_000);
    c.bench_function("history/undo_redo_30_edits", |b| {
        b.iter_batched(
            || {
                let mut core = TextCore::new(&text);
                for i in 0..30 {
                    core.insert(i * 100, "edit").unwrap();
                }
                core
            },
            |mut core| {
                while core.undo() {}
                while core.redo() {}
                black_box(core.len_chars());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_windowed_vs_full_highlight,
    bench_typing_with_rehighlight,
    bench_undo_redo_cycle
);
criterion_main!(benches);
