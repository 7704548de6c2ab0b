use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use gridswarm::exchange::build_fabric;
use gridswarm::graph::generator::{full_grid, random_positions};
use gridswarm::instrument::ActivityLog;
use gridswarm::partition::find_partition;
use gridswarm::sim::state::SimState;
use gridswarm::sim::step::{batch_step, compute_all_weights};
use gridswarm::topology::ZoneTopology;

fn bench_find_partition(c: &mut Criterion) {
    let weights: Vec<f64> = (0..64).map(|i| ((i * 31 + 7) % 97) as f64 + 1.0).collect();
    c.bench_function("find_partition_64_8", |b| {
        b.iter(|| find_partition(black_box(&weights), black_box(8)))
    });
}

fn bench_topology_build(c: &mut Criterion) {
    let mut graph = full_grid(64, 64).unwrap();
    let zone_map: Vec<u32> = (0..graph.node_count())
        .map(|n| u32::from(n >= 2048))
        .collect();
    graph.set_zone_map(zone_map, 2).unwrap();
    c.bench_function("topology_build_64x64", |b| {
        b.iter(|| ZoneTopology::build(black_box(&graph), 0))
    });
}

fn bench_batch_step(c: &mut Criterion) {
    let graph = full_grid(16, 16).unwrap();
    let topo = ZoneTopology::build(&graph, 0);
    let positions = random_positions(graph.node_count(), 2000, 42);
    let fabric = build_fabric(1).pop().unwrap();
    c.bench_function("batch_step_16x16_2000", |b| {
        b.iter_batched(
            || {
                let mut state = SimState::new(&graph, positions.clone(), 618).unwrap();
                state.init_residency(&graph, 0);
                state.take_census();
                compute_all_weights(&graph, &topo, &mut state);
                state
            },
            |mut state| {
                let mut activity = ActivityLog::new(false);
                batch_step(&graph, &topo, &mut state, &fabric, &mut activity).unwrap();
                state
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_compute_all_weights(c: &mut Criterion) {
    let graph = full_grid(32, 32).unwrap();
    let topo = ZoneTopology::build(&graph, 0);
    let positions = random_positions(graph.node_count(), 5000, 7);
    let mut state = SimState::new(&graph, positions, 618).unwrap();
    state.take_census();
    c.bench_function("compute_all_weights_32x32", |b| {
        b.iter(|| compute_all_weights(black_box(&graph), black_box(&topo), &mut state))
    });
}

criterion_group!(
    benches,
    bench_find_partition,
    bench_topology_build,
    bench_batch_step,
    bench_compute_all_weights
);
criterion_main!(benches);
