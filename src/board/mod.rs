//! Board representation, FEN, make/unmake, attack queries and move
//! generation — layer 2 of the crate ("Board & Rules").

mod attacks;
mod error;
mod fen;
mod make_unmake;
mod movegen;
mod state;


pub use attacks::{in_check, is_square_attacked};
pub use error::{BoardValidationError, FenError, MoveParseError};
pub use movegen::{
    generate_all_moves, generate_captures, generate_legal_moves, generate_simple_moves,
    is_checkmate, is_legal, is_move_valid, is_stalemate, is_well_formed, perft,
};
pub use state::{Board, NullMoveInfo, UnmakeInfo};
