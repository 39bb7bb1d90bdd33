// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for booklet planning and composition.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printdesk_document::pdf::fixture::sample_a4_pdf;
use printdesk_document::{BookletComposer, compute_layout};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Planning is pure arithmetic; a 500-page thesis is the realistic upper end.
fn bench_compute_layout(c: &mut Criterion) {
    c.bench_function("compute_layout (500 pages)", |b| {
        b.iter(|| compute_layout(black_box(500)));
    });
}

/// Full load, impose and save of a 32-page synthetic document.
fn bench_compose(c: &mut Criterion) {
    let pdf = match sample_a4_pdf(32) {
        Ok(pdf) => pdf,
        Err(err) => panic!("fixture: {err}"),
    };
    let composer = BookletComposer::new();

    c.bench_function("compose booklet (32 pages)", |b| {
        b.iter(|| {
            let result = composer.compose(black_box(&pdf));
            black_box(result.map(|(bytes, _)| bytes.len()))
        });
    });
}

criterion_group!(benches, bench_compute_layout, bench_compose);
criterion_main!(benches);
