//! `make`/`unmake`: applies a move to a `Board` and restores it bit-for-bit
//! from the `UnmakeInfo` reversal record it produced.

use crate::types::{CastlingRights, Color, Piece, Square};
use crate::zobrist::ZOBRIST;

use super::state::{Board, NullMoveInfo, UnmakeInfo};
use crate::types::Move;

fn rook_home(color: Color, kingside: bool) -> Square {
    let rank = if color == Color::White { 7 } else { 0 };
    let file = if kingside { 7 } else { 0 };
    Square::new(rank, file)
}

fn castle_rook_squares(color: Color, kingside: bool) -> (Square, Square) {
    let rank = if color == Color::White { 7 } else { 0 };
    if kingside {
        (Square::new(rank, 7), Square::new(rank, 5))
    } else {
        (Square::new(rank, 0), Square::new(rank, 3))
    }
}

/// Drops castling rights touched by a rook leaving/arriving on its home
/// square, or a king moving.
fn castling_rights_after_touch(mut rights: CastlingRights, square: Square) -> CastlingRights {
    for color in [Color::White, Color::Black] {
        for kingside in [true, false] {
            if square == rook_home(color, kingside) {
                rights = rights.remove(color, kingside);
            }
        }
    }
    rights
}

impl Board {
    /// Applies `mv` (assumed pseudo-legal for the side to move) and returns
    /// the reversal record. See the module docs for the full contract.
    pub fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let prev_castling = self.castling;
        let prev_en_passant = self.en_passant;
        let prev_halfmove = self.halfmove_clock;
        let prev_hash = self.hash;

        let mover_color = self.side;
        let from = mv.from();
        let to = mv.to();
        let (_, moving_piece) = self.cell(from).unpack().expect("make_move: empty source square");

        let mut hash = self.hash;
        hash ^= ZOBRIST.piece(mover_color, moving_piece, from);

        let mut captured: Option<(Color, Piece, Square)> = None;
        let mut new_castling = prev_castling;
        let is_pawn_move = moving_piece == Piece::Pawn;

        if mv.is_en_passant() {
            let captured_square = Square::new(from.rank(), to.file());
            let (cap_color, cap_piece) = self
                .remove_piece(captured_square)
                .expect("make_move: en passant target square is empty");
            hash ^= ZOBRIST.piece(cap_color, cap_piece, captured_square);
            captured = Some((cap_color, cap_piece, captured_square));
        } else if mv.is_capture() {
            let (cap_color, cap_piece) = self
                .remove_piece(to)
                .expect("make_move: capture onto empty square");
            hash ^= ZOBRIST.piece(cap_color, cap_piece, to);
            captured = Some((cap_color, cap_piece, to));
            new_castling = castling_rights_after_touch(new_castling, to);
        }

        self.remove_piece(from);
        let placed_piece = mv.promotion().unwrap_or(moving_piece);
        self.put_piece(mover_color, placed_piece, to);
        hash ^= ZOBRIST.piece(mover_color, placed_piece, to);

        if mv.is_castling() {
            let kingside = mv.is_castle_kingside();
            let (rook_from, rook_to) = castle_rook_squares(mover_color, kingside);
            self.remove_piece(rook_from);
            self.put_piece(mover_color, Piece::Rook, rook_to);
            hash ^= ZOBRIST.piece(mover_color, Piece::Rook, rook_from);
            hash ^= ZOBRIST.piece(mover_color, Piece::Rook, rook_to);
        }

        if moving_piece == Piece::King {
            new_castling = new_castling.remove_color(mover_color);
        } else if moving_piece == Piece::Rook {
            new_castling = castling_rights_after_touch(new_castling, from);
        }

        hash ^= ZOBRIST.castling(prev_castling);
        hash ^= ZOBRIST.castling(new_castling);
        self.castling = new_castling;

        if let Some(ep) = prev_en_passant {
            hash ^= ZOBRIST.en_passant_file(ep.file());
        }
        let new_en_passant = if mv.is_double_pawn_push() {
            let skip_rank = if mover_color == Color::White {
                to.rank() + 1
            } else {
                to.rank() - 1
            };
            Some(Square::new(skip_rank, to.file()))
        } else {
            None
        };
        if let Some(ep) = new_en_passant {
            hash ^= ZOBRIST.en_passant_file(ep.file());
        }
        self.en_passant = new_en_passant;

        self.halfmove_clock = if is_pawn_move || captured.is_some() {
            0
        } else {
            prev_halfmove + 1
        };

        hash ^= ZOBRIST.side_to_move();
        self.side = mover_color.opponent();
        if mover_color == Color::Black {
            self.fullmove_number += 1;
        }
        self.hash = hash;

        UnmakeInfo {
            castling: prev_castling,
            en_passant: prev_en_passant,
            halfmove_clock: prev_halfmove,
            hash: prev_hash,
            captured,
        }
    }

    /// Restores the board to exactly the state before `make_move(mv)` was
    /// called, using the reversal record it returned.
    pub fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        let mover_color = self.side.opponent();
        if mover_color == Color::Black {
            self.fullmove_number -= 1;
        }
        self.side = mover_color;

        let from = mv.from();
        let to = mv.to();

        let (_, placed_piece) = self.remove_piece(to).expect("unmake_move: destination square empty");
        let original_piece = if mv.is_promotion() { Piece::Pawn } else { placed_piece };
        self.put_piece(mover_color, original_piece, from);

        if mv.is_castling() {
            let kingside = mv.is_castle_kingside();
            let (rook_from, rook_to) = castle_rook_squares(mover_color, kingside);
            self.remove_piece(rook_to);
            self.put_piece(mover_color, Piece::Rook, rook_from);
        }

        if let Some((cap_color, cap_piece, cap_square)) = info.captured {
            self.put_piece(cap_color, cap_piece, cap_square);
        }

        self.castling = info.castling;
        self.en_passant = info.en_passant;
        self.halfmove_clock = info.halfmove_clock;
        self.hash = info.hash;
    }

    /// Null move: flips side to move and clears en passant, without moving
    /// any piece. Used by search for null-move pruning.
    pub fn make_null_move(&mut self) -> NullMoveInfo {
        let info = NullMoveInfo {
            en_passant: self.en_passant,
            hash: self.hash,
        };
        let mut hash = self.hash;
        if let Some(ep) = self.en_passant {
            hash ^= ZOBRIST.en_passant_file(ep.file());
        }
        hash ^= ZOBRIST.side_to_move();
        self.en_passant = None;
        self.side = self.side.opponent();
        self.hash = hash;
        info
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.side = self.side.opponent();
        self.en_passant = info.en_passant;
        self.hash = info.hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board as PublicBoard;
    use crate::types::Move;

    #[test]
    fn simple_pawn_push_is_reversible() {
        let mut board = PublicBoard::starting_position();
        let before = board.clone();
        let mv = Move::double_pawn_push(Square::new(6, 4), Square::new(4, 4));
        let info = board.make_move(mv);
        assert_ne!(board, before);
        board.unmake_move(mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn double_push_sets_skip_square_as_en_passant_target() {
        let mut board = PublicBoard::starting_position();
        let mv = Move::double_pawn_push(Square::new(6, 4), Square::new(4, 4));
        board.make_move(mv);
        assert_eq!(board.en_passant_target(), Some(Square::new(5, 4)));
    }

    #[test]
    fn king_move_clears_both_castling_rights() {
        let mut board = PublicBoard::empty();
        board.put_piece(Color::White, Piece::King, Square::new(7, 4));
        board.put_piece(Color::Black, Piece::King, Square::new(0, 4));
        board.castling = CastlingRights::all();
        board.hash = board.recompute_hash();
        let before = board.clone();
        let mv = Move::quiet(Square::new(7, 4), Square::new(7, 5));
        let info = board.make_move(mv);
        assert!(!board.castling_rights().has(Color::White, true));
        assert!(!board.castling_rights().has(Color::White, false));
        board.unmake_move(mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn hash_matches_full_recomputation_after_several_moves() {
        let mut board = PublicBoard::starting_position();
        let moves = [
            Move::double_pawn_push(Square::new(6, 4), Square::new(4, 4)),
            Move::double_pawn_push(Square::new(1, 4), Square::new(3, 4)),
            Move::quiet(Square::new(7, 6), Square::new(5, 5)),
        ];
        for mv in moves {
            board.make_move(mv);
            assert_eq!(board.hash(), board.recompute_hash());
        }
    }
}
