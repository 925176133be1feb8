//! A root `Board` plus the sequence of moves played from that root, used to
//! seed repetition detection before a search worker starts its own walk.

use std::collections::HashMap;

use crate::board::Board;
use crate::types::Move;

/// Hash occurrence counts along a single search path, keyed by Zobrist hash.
/// Grounded in the same per-hash counter the board layer uses for its own
/// draw bookkeeping, but kept as a standalone table here since a `Job`
/// builds its own path as it descends rather than sharing the root's.
#[derive(Clone, Debug, Default)]
pub struct RepetitionTable {
    counts: HashMap<u64, u32>,
}

impl RepetitionTable {
    #[must_use]
    pub fn new() -> RepetitionTable {
        RepetitionTable {
            counts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, hash: u64) -> u32 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }

    pub fn push(&mut self, hash: u64) {
        *self.counts.entry(hash).or_insert(0) += 1;
    }

    pub fn pop(&mut self, hash: u64) {
        if let Some(count) = self.counts.get_mut(&hash) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&hash);
            }
        }
    }

    /// A position occurring twice before on the current path makes a third
    /// occurrence a draw by threefold repetition; searched paths only need
    /// to detect the second prior occurrence (see spec on repetition/50-move).
    #[must_use]
    pub fn is_repeated(&self, hash: u64) -> bool {
        self.get(hash) >= 2
    }
}

/// A root position plus the moves played to reach it from game start (or
/// from the last irreversible move), used only to seed a fresh
/// `RepetitionTable` for each worker — the worker extends that table
/// itself as it descends through the search tree.
#[derive(Clone, Debug)]
pub struct Position {
    root: Board,
    played: Vec<Move>,
}

impl Position {
    #[must_use]
    pub fn new(root: Board) -> Position {
        Position {
            root,
            played: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_played_moves(root: Board, played: Vec<Move>) -> Position {
        Position { root, played }
    }

    #[must_use]
    pub fn root(&self) -> &Board {
        &self.root
    }

    #[must_use]
    pub fn played_moves(&self) -> &[Move] {
        &self.played
    }

    /// Replays `root` forward through `played`, returning the resulting
    /// board and a repetition table seeded with every hash visited along
    /// the way (including the root).
    #[must_use]
    pub fn replay(&self) -> (Board, RepetitionTable) {
        let mut board = self.root.clone();
        let mut table = RepetitionTable::new();
        table.push(board.hash());
        for &mv in &self.played {
            board.make_move(mv);
            table.push(board.hash());
        }
        (board, table)
    }
}
