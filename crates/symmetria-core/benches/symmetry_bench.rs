//! # Symmetry Benchmarks
//!
//! Performance benchmarks for symmetria-core validation and enumeration.
//!
//! Run with: `cargo bench -p symmetria-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;
use std::hint::black_box;
use symmetria_core::{
    CrystalId, GraphModel, Permutation, PermutationValidator, SubgroupAnalyzer,
    enumerate_automorphisms, export_canonical,
};

/// Uniformly colored cycle of `size` crystals.
fn create_cycle(size: u32) -> GraphModel {
    let mut builder = GraphModel::builder(format!("cycle_{}", size))
        .expected_automorphisms(2 * size as usize);
    for id in 0..size {
        builder = builder.crystal(id, "blue");
    }
    for id in 0..size {
        builder = builder.edge(id, (id + 1) % size);
    }
    builder.build().expect("valid cycle")
}

/// The quarter turn of a cycle as a raw mapping.
fn rotation_mapping(size: u32) -> BTreeMap<CrystalId, CrystalId> {
    (0..size)
        .map(|id| (CrystalId(id), CrystalId((id + 1) % size)))
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for size in [6u32, 16, 64].iter() {
        let graph = create_cycle(*size);
        let mapping = rotation_mapping(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(PermutationValidator::validate(&graph, &mapping)));
        });
    }

    group.finish();
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_automorphisms");
    group.sample_size(10);

    for size in [4u32, 6, 8].iter() {
        let graph = create_cycle(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(enumerate_automorphisms(&graph)));
        });
    }

    group.finish();
}

fn bench_subgroup_analysis(c: &mut Criterion) {
    let graph = create_cycle(8);
    let members: Vec<Permutation> = enumerate_automorphisms(&graph).expect("small level");

    c.bench_function("subgroup_analysis_d8", |b| {
        b.iter(|| {
            let analyzer = SubgroupAnalyzer::new(graph.vertex_ids(), members.iter());
            black_box(analyzer.is_subgroup())
        });
    });
}

fn bench_export_canonical(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_canonical");

    for size in [6u32, 16, 64].iter() {
        let graph = create_cycle(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(export_canonical(&graph)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_validate,
    bench_enumerate,
    bench_subgroup_analysis,
    bench_export_canonical,
);

criterion_main!(benches);
