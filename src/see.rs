//! Static exchange evaluation: estimates the material result of a capture
//! sequence on one square without actually searching it, for ordering
//! captures ahead of the alpha-beta search (and for pruning clearly losing
//! captures in quiescence).

use crate::board::Board;
use crate::magic::tables;
use crate::types::{Bitboard, Color, Move, Piece, Square};

fn least_valuable_attacker(board: &Board, attackers: Bitboard, color: Color) -> Option<(Square, Piece)> {
    for piece_idx in 0..6 {
        let piece = Piece::from_index(piece_idx);
        let candidates = attackers & board.pieces_of(color, piece);
        if let Some(sq) = candidates.lsb() {
            return Some((sq, piece));
        }
    }
    None
}

fn attackers_to(board: &Board, square: Square, occupancy: Bitboard) -> Bitboard {
    let mut attackers = Bitboard::EMPTY;
    for color in [Color::White, Color::Black] {
        attackers |= tables().knight_attacks(square) & board.pieces_of(color, Piece::Knight);
        attackers |= tables().king_attacks(square) & board.pieces_of(color, Piece::King);
        attackers |= tables().pawn_attacks(color.opponent(), square) & board.pieces_of(color, Piece::Pawn);
    }
    let bishops_queens = (board.pieces_of(Color::White, Piece::Bishop) | board.pieces_of(Color::White, Piece::Queen))
        | (board.pieces_of(Color::Black, Piece::Bishop) | board.pieces_of(Color::Black, Piece::Queen));
    attackers |= tables().bishop_attacks(square, occupancy) & bishops_queens;
    let rooks_queens = (board.pieces_of(Color::White, Piece::Rook) | board.pieces_of(Color::White, Piece::Queen))
        | (board.pieces_of(Color::Black, Piece::Rook) | board.pieces_of(Color::Black, Piece::Queen));
    attackers |= tables().rook_attacks(square, occupancy) & rooks_queens;
    attackers
}

/// Estimates the net material gain (in centipawns, from the mover's
/// perspective) of playing `mv` and letting the exchange on its destination
/// square play out with both sides always recapturing with their least
/// valuable piece.
#[must_use]
pub fn see(board: &Board, mv: Move) -> i32 {
    if !mv.is_capture() {
        return 0;
    }
    let target = mv.to();
    let mut occupancy = board.all_occupied();
    let mover = board.side_to_move();

    let captured_value = if mv.is_en_passant() {
        Piece::Pawn.value()
    } else {
        board.cell(target).unpack().map(|(_, p)| p.value()).unwrap_or(0)
    };

    let mut gains = [0i32; 32];
    let mut depth = 0;
    gains[0] = captured_value;

    let mut attacker_piece = board.cell(mv.from()).unpack().map(|(_, p)| p).unwrap_or(Piece::Pawn);
    occupancy = occupancy.clear(mv.from());
    let mut side = mover.opponent();

    loop {
        let attackers = attackers_to(board, target, occupancy);
        let side_attackers = attackers & board.occupied_by(side) & occupancy;
        let Some((next_square, next_piece)) = least_valuable_attacker(board, side_attackers, side) else {
            break;
        };
        depth += 1;
        if depth >= gains.len() {
            break;
        }
        gains[depth] = attacker_piece.value() - gains[depth - 1];
        occupancy = occupancy.clear(next_square);
        attacker_piece = next_piece;
        side = side.opponent();
    }

    while depth > 0 {
        gains[depth - 1] = -gains[depth].max(-gains[depth - 1]);
        depth -= 1;
    }
    gains[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{generate_captures, Board as PublicBoard};
    use crate::types::MoveList;

    #[test]
    fn pawn_takes_undefended_queen_is_a_clear_gain() {
        let board = PublicBoard::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut captures = MoveList::new();
        generate_captures(&board, &mut captures);
        let mv = captures.iter().find(|m| m.to() == Square::new(3, 3)).copied().unwrap();
        assert!(see(&board, mv) > 0);
    }

    #[test]
    fn non_capture_scores_zero() {
        let board = PublicBoard::starting_position();
        let mv = Move::quiet(Square::new(6, 4), Square::new(5, 4));
        assert_eq!(see(&board, mv), 0);
    }
}
