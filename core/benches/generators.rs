use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minigames_core::pathfinding::search::{self, Algorithm as SearchAlgorithm};
use minigames_core::pathfinding::{NetworkConfig, NetworkGenerator, NodeId, RandomNetworkGenerator};
use minigames_core::sorting::{self, Algorithm as SortAlgorithm};
use minigames_core::sudoku::{self, Difficulty};
use minigames_core::{seeded_rng, tictactoe};

fn bench_sudoku(c: &mut Criterion) {
    let mut group = c.benchmark_group("sudoku/generate");
    for difficulty in Difficulty::ALL {
        group.bench_function(difficulty.label(), |b| {
            let mut rng = seeded_rng(42);
            b.iter(|| black_box(sudoku::generate(difficulty, &mut rng)))
        });
    }
    group.finish();
}

fn bench_network(c: &mut Criterion) {
    let mut group = c.benchmark_group("network/generate");
    group.sample_size(10);
    for nodes in [40, 200, 1000] {
        let config = NetworkConfig::for_nodes(nodes);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &config, |b, config| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                black_box(RandomNetworkGenerator::new(seed).generate(config))
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let graph = RandomNetworkGenerator::new(7).generate(&NetworkConfig::for_nodes(200));
    let goal = NodeId(graph.node_count() as u32 - 1);
    let mut group = c.benchmark_group("search/steps");
    for algorithm in SearchAlgorithm::ALL {
        group.bench_function(algorithm.label(), |b| {
            b.iter(|| black_box(search::build_steps(&graph, algorithm, NodeId(0), goal)))
        });
    }
    group.finish();
}

fn bench_sorting(c: &mut Criterion) {
    let values = sorting::random_values(sorting::MAX_BARS, &mut seeded_rng(1));
    let mut group = c.benchmark_group("sorting/steps");
    for algorithm in SortAlgorithm::ALL {
        group.bench_function(algorithm.label(), |b| {
            b.iter(|| black_box(sorting::build_steps(algorithm, &values)))
        });
    }
    group.finish();
}

fn bench_minimax(c: &mut Criterion) {
    let board = tictactoe::Board::empty();
    c.bench_function("tictactoe/best_move/empty", |b| {
        b.iter(|| black_box(tictactoe::best_move(&board, tictactoe::Mark::AI)))
    });
}

criterion_group!(
    benches,
    bench_sudoku,
    bench_network,
    bench_search,
    bench_sorting,
    bench_minimax
);
criterion_main!(benches);
