//! Benchmarks for the placement pipeline.
//!
//! Measures lane generation, candidate enumeration, conflict graph
//! construction and greedy selection on lots of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lotplan_core::geometry::Polygon2D;
use lotplan_core::{ExactConfig, LaneSpec, OptimizationConfig, VehicleCatalog, VehicleMix, VehicleSpec};
use lotplan_planner::{
    CandidateGenerator, ConflictGraph, GreedySolver, LaneGenerator, OptimizationRequest, Optimizer,
    SelectionProblem, SelectionSolver,
};

fn lot(width: f64, height: f64) -> Polygon2D {
    Polygon2D::new(vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)])
        .expect("valid rectangle")
}

fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_generation");
    group.sample_size(10);

    let catalog = VehicleCatalog::default();
    let types: Vec<&VehicleSpec> = catalog.iter().collect();

    for &size in &[50.0, 100.0] {
        let boundary = lot(size, size * 2.0);
        let plan = LaneGenerator::new(LaneSpec::default())
            .generate(&boundary, (size / 2.0, 0.0), Some((size / 2.0, size * 2.0)))
            .expect("lane");
        let config = OptimizationConfig::new().with_grid_resolution(1.0);

        group.bench_with_input(
            BenchmarkId::new("grid_1.0", size as u32),
            &(boundary, plan, config),
            |b, (boundary, plan, config)| {
                b.iter(|| {
                    let set = CandidateGenerator::new(config).generate(black_box(boundary), plan, &types);
                    black_box(set.len())
                })
            },
        );
    }
    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_selection");
    group.sample_size(10);

    let catalog = VehicleCatalog::default();
    let types: Vec<&VehicleSpec> = catalog.iter().collect();
    let boundary = lot(50.0, 100.0);
    let plan = LaneGenerator::new(LaneSpec::default())
        .generate(&boundary, (25.0, 0.0), Some((25.0, 100.0)))
        .expect("lane");
    let config = OptimizationConfig::new().with_grid_resolution(1.0);
    let set = CandidateGenerator::new(&config).generate(&boundary, &plan, &types);

    group.bench_function("conflict_graph", |b| {
        b.iter(|| black_box(ConflictGraph::build(black_box(&set.candidates), 1.0).edge_count()))
    });

    let graph = ConflictGraph::build(&set.candidates, 1.0);
    let mix = VehicleMix::new().with_bound("truck", 4, 40).with_bound("ev", 2, 10);
    group.bench_function("greedy_with_repair", |b| {
        b.iter(|| {
            let problem = SelectionProblem::new(&set.candidates, &graph, &mix);
            black_box(GreedySolver.solve(&problem).len())
        })
    });
    group.finish();
}

fn bench_optimizer(c: &mut Criterion) {
    let config = OptimizationConfig::new()
        .with_grid_resolution(2.0)
        .with_exact(ExactConfig::disabled());
    let optimizer = Optimizer::new(config);
    let request = OptimizationRequest::new(
        vec![(0.0, 0.0), (60.0, 0.0), (60.0, 60.0), (30.0, 60.0), (30.0, 100.0), (0.0, 100.0)],
        (30.0, 0.0),
    )
    .with_exit((15.0, 100.0));

    c.bench_function("optimize_l_shape", |b| {
        b.iter(|| black_box(optimizer.optimize(black_box(&request)).map(|r| r.space_count())))
    });
}

criterion_group!(benches, bench_candidates, bench_greedy, bench_optimizer);
criterion_main!(benches);
