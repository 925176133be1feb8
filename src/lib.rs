//! Bitboard move generation, make/unmake, and a Lazy-SMP alpha-beta search
//! engine, layered as: types (packed value types) -> board (rules,
//! make/unmake, FEN) -> magic (sliding-piece attack tables) -> search
//! (workers, runner, move ordering) -> tt/position/eval/see/zobrist, the
//! shared collaborators those layers use.

pub mod board;
pub mod eval;
pub mod magic;
pub mod position;
pub mod search;
pub mod see;
pub mod tt;
pub mod types;
pub mod zobrist;
