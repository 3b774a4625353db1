// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for scanline decomposition in the caviard-geometry
// crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use caviard_core::types::DocPoint;
use caviard_geometry::ScanlineDecomposer;

/// A closed star outline with `spikes * 2` vertices, roughly the worst case
/// an interaction layer produces from a freehand lasso.
fn star_polygon(spikes: usize) -> Vec<DocPoint> {
    let mut points = Vec::with_capacity(spikes * 2);
    for i in 0..spikes * 2 {
        let angle = std::f64::consts::PI * i as f64 / spikes as f64;
        let radius = if i % 2 == 0 { 200.0 } else { 80.0 };
        points.push(DocPoint {
            x: 300.0 + radius * angle.cos(),
            y: 400.0 + radius * angle.sin(),
        });
    }
    points
}

/// Benchmark decomposition at the default step and at a fine step, on a
/// 32-spike star spanning a letter-sized page region.
fn bench_decompose(c: &mut Criterion) {
    let polygon = star_polygon(32);

    let mut group = c.benchmark_group("scanline_decompose");
    for &(label, step) in &[("step 4.0pt", 4.0), ("step 1.0pt", 1.0), ("step 0.25pt", 0.25)] {
        let decomposer = ScanlineDecomposer::new(step);
        group.bench_function(label, |b| {
            b.iter(|| {
                let rects = decomposer
                    .decompose(black_box(&polygon))
                    .expect("decompose failed");
                black_box(rects);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decompose);
criterion_main!(benches);
