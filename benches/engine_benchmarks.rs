//! Benchmarks for move generation, evaluation, and search throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_core::board::{generate_all_moves, perft, Board};
use chess_core::eval::evaluate;
use chess_core::position::Position;
use chess_core::search::{JobCommunicator, JobRunner, Protocol, SearchLimits, SearchResult};
use chess_core::tt::TranspositionTable;
use chess_core::types::{Move, MoveList};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut startpos = Board::starting_position();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| perft(&mut startpos, black_box(depth)))
        });
    }

    let mut kiwipete = Board::from_fen(KIWIPETE).unwrap();
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| perft(&mut kiwipete, black_box(depth)))
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let startpos = Board::starting_position();
    group.bench_function("startpos", |b| {
        b.iter(|| {
            let mut moves = MoveList::new();
            generate_all_moves(black_box(&startpos), &mut moves);
            moves
        })
    });

    let kiwipete = Board::from_fen(KIWIPETE).unwrap();
    group.bench_function("kiwipete", |b| {
        b.iter(|| {
            let mut moves = MoveList::new();
            generate_all_moves(black_box(&kiwipete), &mut moves);
            moves
        })
    });

    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let positions = [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("middlegame", MIDDLEGAME),
        ("endgame", "8/5k2/8/8/8/8/5K2/4R3 w - - 0 1"),
    ];

    for (name, fen) in positions {
        let board = Board::from_fen(fen).unwrap();
        group.bench_with_input(BenchmarkId::new("position", name), &board, |b, board| {
            b.iter(|| black_box(evaluate(board)))
        });
    }

    group.finish();
}

struct NullProtocol;

impl Protocol for NullProtocol {
    fn finish_search(&mut self, _best_move: Move) {}
    fn send_result(&mut self, _result: SearchResult) {}
}

fn bench_single_job_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| {
                let board = Board::starting_position();
                let position = Position::new(board);
                let tt = TranspositionTable::new(16 * 1024 * 1024);
                let comm = JobCommunicator::new();
                let mut job = chess_core::search::Job::new(&position);
                job.run(&tt, &comm, black_box(depth));
                job.results.best_move()
            })
        });
    }

    group.finish();
}

fn bench_job_runner_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("runner");
    group.sample_size(10);

    group.bench_function("startpos_depth_4", |b| {
        b.iter(|| {
            let board = Board::starting_position();
            let mut runner = JobRunner::new(16 * 1024 * 1024, NullProtocol);
            runner.start(Position::new(board), SearchLimits::depth(4), 1);
            runner.join();
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_perft,
    bench_movegen,
    bench_eval,
    bench_single_job_search,
    bench_job_runner_lifecycle
);
criterion_main!(benches);
