//! The search engine: `Job` workers (see `job`) run independent iterative
//! deepening searches against a shared transposition table; `JobRunner`
//! owns their lifecycle and reports progress and results through a
//! `Protocol` collaborator — an external driver (UCI, XBoard, a test
//! harness) that the runner knows nothing about beyond this trait.

mod communicator;
mod job;
mod limits;
mod move_order;

pub use communicator::JobCommunicator;
pub use job::{mate_in_plies, Job, JobResults, MATE_SCORE};
pub use limits::{SearchLimits, TimeControl};
pub use move_order::{HistoryTable, KillerTable};

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::Mutex;
use rand::seq::SliceRandom;

use crate::board::generate_legal_moves;
use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{Move, MoveList};

/// How often the control loop wakes to aggregate worker stats and check
/// resource limits while a search is running.
pub const THREAD_TICK_INTERVAL: Duration = Duration::from_millis(30);
/// How often aggregated node/hash-hit counts are pushed to the `Protocol`.
pub const STATS_UPDATE_INTERVAL: Duration = Duration::from_secs(3);

/// One completed iteration, reported for worker 0 only as the search
/// progresses, and again as the final result when the search finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub depth: u32,
    pub best_move: Option<Move>,
    pub score: i32,
    pub mate_in: Option<i32>,
}

impl SearchResult {
    fn new(depth: u32, best_move: Option<Move>, score: i32) -> SearchResult {
        SearchResult {
            depth,
            best_move,
            score,
            mate_in: mate_in_plies(score),
        }
    }
}

/// The external collaborator a `JobRunner` reports to: an engine-protocol
/// front end (UCI, XBoard, a test harness) that turns these calls into
/// whatever wire format it speaks. Every method is best-effort from the
/// runner's point of view — a protocol that drops a notification doesn't
/// stall the search.
pub trait Protocol: Send {
    /// Called exactly once per `start()`, with the move the runner has
    /// chosen: the deepest completed iteration's best move, a uniformly
    /// random legal move if no iteration completed, or the null move if
    /// the position has none.
    fn finish_search(&mut self, best_move: Move);

    /// Called once per completed iteration of worker 0, and once more
    /// (if the depth advanced since the last call) for the result the
    /// runner is about to finish with.
    fn send_result(&mut self, result: SearchResult);

    /// Periodic aggregate node count across all workers.
    fn send_node_count(&mut self, nodes: u64) {
        let _ = nodes;
    }

    /// Periodic aggregate transposition-table hit count across all workers.
    fn send_hash_hits(&mut self, hits: u64) {
        let _ = hits;
    }

    /// Free-form diagnostic text; only sent when debug mode is enabled.
    fn send_string(&mut self, message: &str) {
        let _ = message;
    }

    /// The move currently being searched at the root, with its 1-based
    /// index among root moves; only sent when debug mode is enabled.
    fn send_curr_move(&mut self, mv: Move, move_number: u32) {
        let _ = (mv, move_number);
    }

    /// Reports a condition the runner can't recover from on its own (for
    /// example, a request to resize the hash table to zero bytes).
    fn report_error(&mut self, message: &str) {
        let _ = message;
    }
}

#[derive(Clone, Copy)]
enum PendingHashRequest {
    Resize(usize),
    Clear,
}

/// Owns a search's worker threads, its shared transposition table, and the
/// external `Protocol` collaborator those workers report to. A `JobRunner`
/// is driven by a single external thread (a protocol's read loop): its
/// public methods take `&mut self` and are not meant to be called
/// concurrently with each other, mirroring the teacher's
/// `EngineController`.
pub struct JobRunner<P: Protocol> {
    tt: Arc<TranspositionTable>,
    comm: Arc<JobCommunicator>,
    protocol: Arc<Mutex<P>>,
    control: Option<thread::JoinHandle<()>>,
    debug_mode: bool,
    /// `true` once a search has been joined (or none has started yet) and
    /// there's no active control thread holding its own `Arc` clone of
    /// `tt` — the only time `Arc::get_mut` can succeed for an immediate
    /// resize/clear.
    can_change_hash: bool,
    pending_hash: Option<PendingHashRequest>,
}

impl<P: Protocol + 'static> JobRunner<P> {
    #[must_use]
    pub fn new(tt_bytes: usize, protocol: P) -> JobRunner<P> {
        JobRunner {
            tt: Arc::new(TranspositionTable::new(tt_bytes)),
            comm: Arc::new(JobCommunicator::new()),
            protocol: Arc::new(Mutex::new(protocol)),
            control: None,
            debug_mode: false,
            can_change_hash: true,
            pending_hash: None,
        }
    }

    #[must_use]
    pub fn tt_capacity(&self) -> usize {
        self.tt.capacity()
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// Starts a new search from `position` with `limits`, running
    /// `num_jobs.max(1)` worker threads sharing the transposition table.
    /// If a previous search is still running, it is joined first.
    pub fn start(&mut self, position: Position, limits: SearchLimits, num_jobs: usize) {
        self.join();

        self.comm.reset();
        self.tt.next_epoch();
        self.can_change_hash = false;

        let num_jobs = num_jobs.max(1);
        let tt = Arc::clone(&self.tt);
        let comm = Arc::clone(&self.comm);
        let protocol = Arc::clone(&self.protocol);
        let debug_mode = self.debug_mode;

        self.control = Some(thread::spawn(move || {
            run_control_loop(position, limits, num_jobs, &tt, &comm, &protocol, debug_mode);
        }));
    }

    /// Signals the running search (if any) to stop at its next poll point.
    /// Does not block; call `join()` to wait for the search to actually
    /// finish and `finish_search` to have been reported.
    pub fn stop(&mut self) {
        self.comm.stop();
    }

    /// Blocks until the current search (if any) has finished and reported
    /// its result, then applies any hash resize/clear request that arrived
    /// while it was running.
    pub fn join(&mut self) {
        if let Some(handle) = self.control.take() {
            if handle.join().is_err() {
                warn!("search control thread panicked");
            }
        }
        self.can_change_hash = true;
        self.apply_pending_hash_request();
    }

    /// Requests the transposition table be rebuilt at `bytes`, preserving
    /// its epoch. Applied immediately if no search is running, otherwise
    /// buffered until the next `join()` — matching the teacher's
    /// stop-before-resize behaviour but without forcing an unsolicited
    /// stop on a search the caller may still want running.
    pub fn hash_resize(&mut self, bytes: usize) {
        if bytes == 0 {
            self.protocol.lock().report_error("hash size must be nonzero");
            return;
        }
        self.pending_hash = Some(PendingHashRequest::Resize(bytes));
        self.apply_pending_hash_request();
    }

    /// Requests the transposition table be zeroed. Same deferral rule as
    /// `hash_resize`.
    pub fn hash_clear(&mut self) {
        self.pending_hash = Some(PendingHashRequest::Clear);
        self.apply_pending_hash_request();
    }

    fn apply_pending_hash_request(&mut self) {
        if !self.can_change_hash {
            return;
        }
        let Some(request) = self.pending_hash.take() else {
            return;
        };
        match request {
            PendingHashRequest::Resize(bytes) => match Arc::get_mut(&mut self.tt) {
                Some(tt) => tt.resize(bytes, false),
                None => warn!("hash resize requested but table still shared; dropping it"),
            },
            // `clear` only needs `&self` (it zeroes atomics in place), but it's
            // still gated on `can_change_hash` so a clear queued mid-search
            // doesn't race a worker's `store` into the same slot.
            PendingHashRequest::Clear => self.tt.clear(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_control_loop<P: Protocol>(
    position: Position,
    limits: SearchLimits,
    num_jobs: usize,
    tt: &Arc<TranspositionTable>,
    comm: &Arc<JobCommunicator>,
    protocol: &Arc<Mutex<P>>,
    debug_mode: bool,
) {
    let max_depth = limits.depth.unwrap_or(u32::MAX);
    let fullmove_number = position.root().fullmove_number();
    let time_budget = limits.effective_time_ms(fullmove_number).map(Duration::from_millis);
    let node_limit = limits.nodes;

    let jobs: Vec<Job> = (0..num_jobs).map(|_| Job::new(&position)).collect();
    // Cloned before the jobs themselves are moved into their worker threads,
    // so the control loop below aggregates through these handles instead of
    // re-borrowing `jobs` (which the scoped threads hold `&mut` for).
    let results: Vec<Arc<JobResults>> = jobs.iter().map(|job| Arc::clone(&job.results)).collect();

    thread::scope(|scope| {
        let mut jobs = jobs.into_iter();
        let first = jobs.next().expect("num_jobs is at least 1");
        let protocol_for_reporting = Arc::clone(protocol);
        scope.spawn(move || {
            let mut first = first;
            first.run_with(tt, comm, max_depth, move |depth, best_move, score| {
                protocol_for_reporting.lock().send_result(SearchResult::new(depth, best_move, score));
            });
        });
        for job in jobs {
            scope.spawn(move || {
                let mut job = job;
                job.run(tt, comm, max_depth);
            });
        }

        let start = Instant::now();
        let mut last_stats = start;
        loop {
            if comm.wait(THREAD_TICK_INTERVAL) {
                break;
            }
            if let Some(limit) = node_limit {
                let total_nodes: u64 = results.iter().map(|r| r.nodes.load(Ordering::Relaxed)).sum();
                if total_nodes > limit {
                    comm.stop();
                    break;
                }
            }
            if let Some(budget) = time_budget {
                if start.elapsed() > budget {
                    comm.stop();
                    break;
                }
            }
            if last_stats.elapsed() >= STATS_UPDATE_INTERVAL {
                let total_nodes: u64 = results.iter().map(|r| r.nodes.load(Ordering::Relaxed)).sum();
                let total_hits: u64 = results.iter().map(|r| r.tt_hits.load(Ordering::Relaxed)).sum();
                let mut locked = protocol.lock();
                locked.send_node_count(total_nodes);
                locked.send_hash_hits(total_hits);
                drop(locked);
                last_stats = Instant::now();
            }
        }
    });

    let winner = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.completed_depth() > 0)
        .max_by_key(|(idx, r)| (r.completed_depth(), std::cmp::Reverse(*idx)));

    let best_move = match winner {
        Some((_, r)) => r.best_move(),
        None => {
            debug!("no job completed an iteration; falling back to a random legal move");
            random_legal_move(position.root())
        }
    };

    if debug_mode {
        protocol.lock().send_string("search finished");
    }
    protocol.lock().finish_search(best_move.unwrap_or(Move::null()));
}

/// Picks a uniformly random legal move from `root`, or `None` if it has
/// none (checkmate or stalemate). The last-resort fallback when no worker
/// completes even a depth-1 iteration before being stopped.
fn random_legal_move(root: &crate::board::Board) -> Option<Move> {
    let mut board = root.clone();
    let mut pseudo = MoveList::new();
    crate::board::generate_all_moves(&board, &mut pseudo);
    let mut legal = MoveList::new();
    generate_legal_moves(&mut board, &pseudo, &mut legal);
    legal.iter().copied().collect::<Vec<_>>().choose(&mut rand::thread_rng()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board as PublicBoard;
    use std::sync::mpsc;

    struct RecordingProtocol {
        finished: Option<Move>,
        results: Vec<SearchResult>,
        finish_count: u32,
    }

    impl Protocol for RecordingProtocol {
        fn finish_search(&mut self, best_move: Move) {
            self.finished = Some(best_move);
            self.finish_count += 1;
        }

        fn send_result(&mut self, result: SearchResult) {
            self.results.push(result);
        }
    }

    #[test]
    fn start_with_depth_limit_reports_exactly_one_finish() {
        let board = PublicBoard::starting_position();
        let position = Position::new(board);
        let protocol = RecordingProtocol {
            finished: None,
            results: Vec::new(),
            finish_count: 0,
        };
        let protocol = Arc::new(Mutex::new(protocol));

        struct Forwarder(Arc<Mutex<RecordingProtocol>>);
        impl Protocol for Forwarder {
            fn finish_search(&mut self, best_move: Move) {
                self.0.lock().finish_search(best_move);
            }
            fn send_result(&mut self, result: SearchResult) {
                self.0.lock().send_result(result);
            }
        }

        let mut runner = JobRunner::new(1 << 20, Forwarder(Arc::clone(&protocol)));
        runner.start(position, SearchLimits::depth(2), 1);
        runner.join();

        let locked = protocol.lock();
        assert_eq!(locked.finish_count, 1);
        assert!(locked.finished.is_some());
        assert!(!locked.results.is_empty());
    }

    #[test]
    fn multiple_workers_all_run_and_report_a_single_finish() {
        let board = PublicBoard::starting_position();
        let position = Position::new(board);
        struct Silent;
        impl Protocol for Silent {
            fn finish_search(&mut self, _best_move: Move) {}
            fn send_result(&mut self, _result: SearchResult) {}
        }
        let mut runner = JobRunner::new(1 << 20, Silent);
        runner.start(position, SearchLimits::depth(2), 4);
        runner.join();
    }

    #[test]
    fn starting_a_new_search_joins_the_previous_one_first() {
        let board = PublicBoard::starting_position();
        struct Silent;
        impl Protocol for Silent {
            fn finish_search(&mut self, _best_move: Move) {}
            fn send_result(&mut self, _result: SearchResult) {}
        }
        let mut runner = JobRunner::new(1 << 20, Silent);
        runner.start(Position::new(board.clone()), SearchLimits::depth(1), 1);
        runner.start(Position::new(board), SearchLimits::depth(1), 1);
        runner.join();
    }

    #[test]
    fn checkmated_root_finishes_with_the_null_move() {
        let board = PublicBoard::from_fen("7k/5QQ1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        struct Capture(mpsc::Sender<Move>);
        impl Protocol for Capture {
            fn finish_search(&mut self, best_move: Move) {
                let _ = self.0.send(best_move);
            }
            fn send_result(&mut self, _result: SearchResult) {}
        }
        let (tx, rx) = mpsc::channel();
        let mut runner = JobRunner::new(1 << 16, Capture(tx));
        runner.start(Position::new(board), SearchLimits::depth(3), 1);
        runner.join();
        assert!(rx.recv().unwrap().is_null());
    }

    #[test]
    fn hash_resize_applies_once_no_search_is_running() {
        struct Silent;
        impl Protocol for Silent {
            fn finish_search(&mut self, _best_move: Move) {}
            fn send_result(&mut self, _result: SearchResult) {}
        }
        let mut runner = JobRunner::new(1 << 16, Silent);
        let before = runner.tt_capacity();
        runner.hash_resize(1 << 22);
        assert!(runner.tt_capacity() > before);
    }

    #[test]
    fn hash_resize_during_a_search_is_deferred_until_join() {
        let board = PublicBoard::starting_position();
        struct Silent;
        impl Protocol for Silent {
            fn finish_search(&mut self, _best_move: Move) {}
            fn send_result(&mut self, _result: SearchResult) {}
        }
        let mut runner = JobRunner::new(1 << 16, Silent);
        runner.start(Position::new(board), SearchLimits::depth(4), 1);
        runner.hash_resize(1 << 22);
        // Whether the request lands before or after the search finishes,
        // join() must settle it: capacity matches a fresh table at the
        // requested size once the runner is idle again.
        runner.join();
        let expected = TranspositionTable::new(1 << 22).capacity();
        assert_eq!(runner.tt_capacity(), expected);
    }
}
