//! Benchmarks for ranking the reference vocabulary.
//!
//! Run with: cargo bench -p seotag-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use seotag_core::tagging::rank_top_k;
use seotag_core::{select_top_k, ScoreVector, TagVocabulary};

/// Deterministic pseudo-logits, one per candidate.
fn synthetic_scores(n: usize) -> ScoreVector {
    let logits: Vec<f32> = (0..n)
        .map(|i| ((i * 7919) % 1000) as f32 / 10.0)
        .collect();
    ScoreVector::from_logits(&logits)
}

fn benchmark_flatten(c: &mut Criterion) {
    let vocab = TagVocabulary::reference();

    c.bench_function("flatten_reference_vocabulary", |b| {
        b.iter(|| black_box(&vocab).flatten())
    });
}

fn benchmark_softmax(c: &mut Criterion) {
    let logits: Vec<f32> = (0..201).map(|i| i as f32 * 0.25).collect();

    c.bench_function("softmax_201", |b| {
        b.iter(|| ScoreVector::from_logits(black_box(&logits)))
    });
}

fn benchmark_select_top_k(c: &mut Criterion) {
    let candidates = TagVocabulary::reference().flatten();
    let scores = synthetic_scores(candidates.len());

    c.bench_function("select_top_5_reference", |b| {
        b.iter(|| select_top_k(black_box(&scores), black_box(&candidates), 5))
    });

    c.bench_function("rank_all_reference", |b| {
        b.iter(|| rank_top_k(black_box(&scores), candidates.len()))
    });
}

criterion_group!(
    benches,
    benchmark_flatten,
    benchmark_softmax,
    benchmark_select_top_k
);
criterion_main!(benches);
