//! One search worker: a private `Board`, its own move-ordering tables, and
//! an iterative-deepening fail-soft alpha-beta search that reads and writes
//! the runner's shared transposition table. Plain alpha-beta plus
//! quiescence only — no LMR, null-move, or singular extensions.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::board::{generate_all_moves, generate_captures, in_check, Board};
use crate::eval::evaluate;
use crate::position::{Position, RepetitionTable};
use crate::see::see;
use crate::tt::{Bound, TranspositionTable};
use crate::types::{Move, MoveList};

use super::communicator::JobCommunicator;
use super::move_order::{score_moves, HistoryTable, KillerTable};

/// A score at or beyond this magnitude encodes a forced mate; see
/// [`mate_in_plies`].
pub const MATE_SCORE: i32 = 30_000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
const DRAW_SCORE: i32 = 0;
const HALFMOVE_DRAW_CLOCK: u32 = 100;

/// Atomics published by a worker after each completed iteration: the
/// single-writer fields a `JobRunner` aggregates without locking.
#[derive(Default)]
pub struct JobResults {
    pub nodes: AtomicU64,
    pub tt_hits: AtomicU64,
    pub depth: AtomicU32,
    best_move_bits: AtomicU32,
    pub score: AtomicI32,
}

const NO_MOVE_SENTINEL: u32 = u32::MAX;

impl JobResults {
    #[must_use]
    pub fn new() -> JobResults {
        let results = JobResults::default();
        results.best_move_bits.store(NO_MOVE_SENTINEL, Ordering::Relaxed);
        results
    }

    fn publish(&self, depth: u32, best_move: Option<Move>, score: i32) {
        self.depth.store(depth, Ordering::Relaxed);
        self.score.store(score, Ordering::Relaxed);
        let bits = best_move.map_or(NO_MOVE_SENTINEL, |m| u32::from(m.as_u16()));
        self.best_move_bits.store(bits, Ordering::Relaxed);
    }

    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        let bits = self.best_move_bits.load(Ordering::Relaxed);
        if bits == NO_MOVE_SENTINEL {
            None
        } else {
            Some(Move::from_u16(bits as u16))
        }
    }

    #[must_use]
    pub fn completed_depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }
}

/// Maps a raw alpha-beta score to a signed mate-in-N count, preserving the
/// asymmetry: a position the side to move is being mated in reports a
/// negative count, a position where it delivers mate reports positive.
#[must_use]
pub fn mate_in_plies(score: i32) -> Option<i32> {
    if score > MATE_THRESHOLD {
        Some((MATE_SCORE - score + 1) / 2)
    } else if score < -MATE_THRESHOLD {
        Some(-((MATE_SCORE + score + 1) / 2))
    } else {
        None
    }
}

pub struct Job {
    board: Board,
    repetition: RepetitionTable,
    killers: KillerTable,
    history: HistoryTable,
    /// Shared so a `JobRunner` can clone a handle to these atomics before
    /// moving the `Job` itself into its worker thread — see
    /// `search::run_control_loop`.
    pub results: Arc<JobResults>,
}

impl Job {
    #[must_use]
    pub fn new(position: &Position) -> Job {
        let (board, repetition) = position.replay();
        Job {
            board,
            repetition,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            results: Arc::new(JobResults::new()),
        }
    }

    fn is_draw(&self) -> bool {
        self.board.halfmove_clock() >= HALFMOVE_DRAW_CLOCK
            || self.repetition.is_repeated(self.board.hash())
            || self.board.is_insufficient_material()
    }

    /// A quiescence node that stand-pats on captures once the position is
    /// tactically quiet. When the side to move is in check there is no
    /// stand-pat — every pseudo-legal reply is an evasion candidate, and a
    /// position with no legal evasion is checkmate, exactly like a normal
    /// `alpha_beta` node with no legal moves.
    fn quiescence(&mut self, tt: &TranspositionTable, ply: usize, mut alpha: i32, beta: i32) -> i32 {
        self.results.nodes.fetch_add(1, Ordering::Relaxed);
        let in_check_now = in_check(&self.board, self.board.side_to_move());

        let stand_pat = evaluate(&self.board);
        if !in_check_now {
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
        }

        let mut moves = MoveList::new();
        if in_check_now {
            generate_all_moves(&self.board, &mut moves);
        } else {
            generate_captures(&self.board, &mut moves);
        }
        let mut scored = score_moves(&self.board, &moves, None, &self.killers, &self.history, 0);

        let mut best = if in_check_now { i32::MIN + 1 } else { stand_pat };
        let mut legal_moves = 0u32;
        let mut idx = 0;
        while let Some(mv) = scored.pick_best(idx) {
            idx += 1;
            // A capture that loses material even in the best case for the
            // mover can't raise alpha once stand-pat already covers it, so
            // skip searching it rather than walking the exchange out. Not
            // applicable while in check: every evasion must be tried.
            if !in_check_now
                && mv.is_capture()
                && !mv.is_promotion()
                && stand_pat + see(&self.board, mv) <= alpha
            {
                continue;
            }
            let mover = self.board.side_to_move();
            let info = self.board.make_move(mv);
            if in_check(&self.board, mover) {
                self.board.unmake_move(mv, info);
                continue;
            }
            legal_moves += 1;
            let score = -self.quiescence(tt, ply + 1, -beta, -alpha);
            self.board.unmake_move(mv, info);

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        if in_check_now && legal_moves == 0 {
            return -MATE_SCORE + ply as i32;
        }
        best
    }

    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        tt: &TranspositionTable,
        comm: &JobCommunicator,
        depth: u32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        if comm.is_stopped() {
            return None;
        }
        self.results.nodes.fetch_add(1, Ordering::Relaxed);

        if ply > 0 && self.is_draw() {
            return Some(DRAW_SCORE);
        }

        if depth == 0 {
            return Some(self.quiescence(tt, ply, alpha, beta));
        }

        let original_alpha = alpha;
        let mut tt_move = None;
        if let Some(entry) = tt.probe(self.board.hash()) {
            self.results.tt_hits.fetch_add(1, Ordering::Relaxed);
            tt_move = entry.best_move;
            if u32::from(entry.depth) >= depth {
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => entry.score >= beta,
                    Bound::Upper => entry.score <= alpha,
                };
                if usable {
                    return Some(entry.score);
                }
            }
        }

        let mut pseudo = MoveList::new();
        generate_all_moves(&self.board, &mut pseudo);
        let mut scored = score_moves(&self.board, &pseudo, tt_move, &self.killers, &self.history, ply);

        let mut best_score = i32::MIN + 1;
        let mut best_move = None;
        let mut legal_moves = 0u32;
        let mut idx = 0;

        while let Some(mv) = scored.pick_best(idx) {
            idx += 1;
            let mover = self.board.side_to_move();
            let info = self.board.make_move(mv);
            if in_check(&self.board, mover) {
                self.board.unmake_move(mv, info);
                continue;
            }
            legal_moves += 1;
            self.repetition.push(self.board.hash());
            let child = self.alpha_beta(tt, comm, depth - 1, ply + 1, -beta, -alpha);
            self.repetition.pop(self.board.hash());
            self.board.unmake_move(mv, info);

            let Some(child_score) = child else {
                return None;
            };
            let score = -child_score;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if mv.is_quiet() {
                    self.killers.record(ply, mv);
                    self.history.record(mv, depth.min(255) as u8);
                }
                break;
            }
        }

        if legal_moves == 0 {
            return Some(if in_check(&self.board, self.board.side_to_move()) {
                -MATE_SCORE + ply as i32
            } else {
                DRAW_SCORE
            });
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        tt.store(self.board.hash(), best_move, depth.min(255) as u8, best_score, bound);
        Some(best_score)
    }

    /// Runs iterative deepening from depth 1 up to (and including)
    /// `max_depth`, publishing `(depth, bestMove, score)` into `results`
    /// after each completed iteration. Stops early if `comm` signals stop
    /// partway through an iteration — the partial iteration's result is
    /// discarded, the previous iteration's publication stands.
    pub fn run(&mut self, tt: &TranspositionTable, comm: &JobCommunicator, max_depth: u32) {
        self.run_with(tt, comm, max_depth, |_, _, _| {});
    }

    /// As [`run`](Job::run), but invokes `on_iteration(depth, best_move,
    /// score)` after each completed iteration is published. Used by the
    /// runner to forward worker 0's progress to the external collaborator
    /// without every job paying for that call.
    pub fn run_with(
        &mut self,
        tt: &TranspositionTable,
        comm: &JobCommunicator,
        max_depth: u32,
        mut on_iteration: impl FnMut(u32, Option<Move>, i32),
    ) {
        for depth in 1..=max_depth {
            let score = self.alpha_beta(tt, comm, depth, 0, -MATE_SCORE - 1, MATE_SCORE + 1);
            let Some(score) = score else { break };
            let best_move = tt.probe(self.board.hash()).and_then(|e| e.best_move);
            self.results.publish(depth, best_move, score);
            on_iteration(depth, best_move, score);
            if comm.is_stopped() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board as PublicBoard;

    #[test]
    fn mate_in_one_score_maps_to_positive_one() {
        assert_eq!(mate_in_plies(MATE_SCORE - 1), Some(1));
    }

    #[test]
    fn being_mated_in_one_maps_to_negative_one() {
        assert_eq!(mate_in_plies(-MATE_SCORE + 1), Some(-1));
    }

    #[test]
    fn ordinary_scores_are_not_mate_scores() {
        assert_eq!(mate_in_plies(150), None);
    }

    #[test]
    fn job_finds_the_only_mating_move() {
        let board = PublicBoard::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let position = Position::new(board);
        let tt = TranspositionTable::new(1 << 20);
        let comm = JobCommunicator::new();
        let mut job = Job::new(&position);
        job.run(&tt, &comm, 3);
        let best = job.results.best_move().expect("a move was found");
        assert_eq!(best.to_uci_string(), "a1a8");
    }

    #[test]
    fn quiescence_reports_mate_when_in_check_with_no_evasion() {
        let mut board = PublicBoard::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mv = board.parse_move("a1a8").unwrap();
        board.make_move(mv);
        let position = Position::new(board);
        let tt = TranspositionTable::new(1 << 16);
        let mut job = Job::new(&position);
        let score = job.quiescence(&tt, 0, -MATE_SCORE - 1, MATE_SCORE + 1);
        assert_eq!(score, -MATE_SCORE);
    }

    #[test]
    fn completed_depth_advances_each_iteration() {
        let board = PublicBoard::starting_position();
        let position = Position::new(board);
        let tt = TranspositionTable::new(1 << 20);
        let comm = JobCommunicator::new();
        let mut job = Job::new(&position);
        job.run(&tt, &comm, 2);
        assert_eq!(job.results.completed_depth(), 2);
        assert!(job.results.best_move().is_some());
    }
}
