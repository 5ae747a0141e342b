//! Path Operations Benchmarks
//!
//! Benchmarks for path parsing and in-memory resolution.
//!
//! Run with: `cargo bench --bench path_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pagepath::prelude::*;
use std::sync::Arc;

fn bench_path_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_parsing");

    let paths = vec![
        ("bare", "Single Element"),
        ("index", "#2 of List"),
        ("contains", "#Thi in List"),
        ("exact", "@Third in List"),
        ("nested", "#2 of Multiple Components > Child Item"),
        ("keyword_in_value", "#Contain in word in List"),
        (
            "deep",
            "Header > Navigation > #3 of Menu Items > Submenu > @Log out in Links",
        ),
    ];

    for (name, path) in paths {
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |bench, p| {
            bench.iter(|| {
                let parsed = parse(black_box(p)).unwrap();
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    for size in [10usize, 100, 1000] {
        let driver = (1..=size).fold(MockDriver::new(), |driver, i| {
            let item = format!("item-{i}");
            driver
                .with_element(
                    MockElement::new(&item)
                        .matching(".list li")
                        .with_text(format!("Item {i}")),
                )
                .with_element(
                    MockElement::new(format!("{item}-label"))
                        .child_of(&item)
                        .matching(".label"),
                )
        });
        let mut engine = PathEngine::new();
        engine.init(Arc::new(driver), EngineOptions::default());
        engine.register([(
            "List",
            PageNode::collection(".list li").with_child("Label", PageNode::element(".label")),
        )]);

        let last_by_text = format!("@Item {size} in List");
        group.bench_with_input(BenchmarkId::new("by_text", size), &last_by_text, |bench, p| {
            bench.iter(|| runtime.block_on(engine.get_element(black_box(p))).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("fan_out", size), &size, |bench, _| {
            bench.iter(|| {
                runtime
                    .block_on(engine.get_element(black_box("List > Label")))
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_path_parsing, bench_resolution);
criterion_main!(benches);
