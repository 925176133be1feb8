//! FEN parse/serialize and UCI long-algebraic move string parsing.

use std::fmt;
use std::str::FromStr;

use crate::types::{castle_bit, CastlingRights, Color, Move, MoveList, Piece, Square};

use super::error::{FenError, MoveParseError};
use super::movegen::generate_all_moves;
use super::state::Board;

impl Board {
    /// Parses standard six-field FEN. The half-move clock and full-move
    /// number fields are optional and default to `0` and `1`.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let fen = fen.trim();
        if fen.is_empty() {
            return Err(FenError::EmptyData);
        }
        let mut fields = fen.split_ascii_whitespace();
        let board_field = fields.next().ok_or(FenError::EmptyData)?;
        let side_field = fields.next().unwrap_or("w");
        let castling_field = fields.next().unwrap_or("-");
        let en_passant_field = fields.next().unwrap_or("-");
        let halfmove_field = fields.next().unwrap_or("0");
        let fullmove_field = fields.next().unwrap_or("1");

        let mut board = Board::empty();

        let ranks: Vec<&str> = board_field.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BoardNotEnoughRows { found: ranks.len() });
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                    if file > 8 {
                        return Err(FenError::BoardRowOverflow { rank: rank_idx });
                    }
                } else {
                    let piece = Piece::from_char(c).ok_or(FenError::UnexpectedCharacter { char: c })?;
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    if file >= 8 {
                        return Err(FenError::BoardRowOverflow { rank: rank_idx });
                    }
                    board.put_piece(color, piece, Square::new(rank_idx as u8, file));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BoardRowOverflow { rank: rank_idx });
            }
        }

        board.side = match side_field {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::ExpectedSpace {
                    found: other.to_string(),
                })
            }
        };

        let mut castling = CastlingRights::none();
        if castling_field != "-" {
            for c in castling_field.chars() {
                let bit = castle_bit(c).ok_or(FenError::CastlingInvalid { char: c })?;
                castling = CastlingRights::from_u8(castling.as_u8() | bit);
            }
        }
        board.castling = castling;

        board.en_passant = if en_passant_field == "-" {
            None
        } else {
            Some(
                en_passant_field
                    .parse::<Square>()
                    .map_err(|_| FenError::EnpassantInvalid {
                        found: en_passant_field.to_string(),
                    })?,
            )
        };

        board.halfmove_clock = halfmove_field.parse().map_err(|_| FenError::NumberOverflow {
            field: "halfmove clock",
            found: halfmove_field.to_string(),
        })?;
        board.fullmove_number = fullmove_field.parse().map_err(|_| FenError::NumberOverflow {
            field: "fullmove number",
            found: fullmove_field.to_string(),
        })?;

        board.hash = board.recompute_hash();
        Ok(board)
    }

    /// Serializes to standard six-field FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(64);
        for rank in 0..8u8 {
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::new(rank, file);
                match self.cell(sq).unpack() {
                    None => empty_run += 1,
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            out.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        out.push(piece.to_fen_char(color));
                    }
                }
            }
            if empty_run > 0 {
                out.push((b'0' + empty_run) as char);
            }
            if rank != 7 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(if self.side == Color::White { 'w' } else { 'b' });

        out.push(' ');
        if self.castling.is_none() {
            out.push('-');
        } else {
            if self.castling.has(Color::White, true) {
                out.push('K');
            }
            if self.castling.has(Color::White, false) {
                out.push('Q');
            }
            if self.castling.has(Color::Black, true) {
                out.push('k');
            }
            if self.castling.has(Color::Black, false) {
                out.push('q');
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push(' ');
        out.push_str(&self.halfmove_clock.to_string());
        out.push(' ');
        out.push_str(&self.fullmove_number.to_string());
        out
    }

    /// Parses a UCI long-algebraic move string (`e2e4`, `e7e8q`, `0000`)
    /// against this position's legal moves.
    pub fn parse_move(&self, notation: &str) -> Result<Move, MoveParseError> {
        if notation == "0000" {
            return Ok(Move::null());
        }
        if notation.len() != 4 && notation.len() != 5 {
            return Err(MoveParseError::InvalidLength { len: notation.len() });
        }
        let from: Square = notation[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: notation.to_string() })?;
        let to: Square = notation[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: notation.to_string() })?;
        let promotion = if notation.len() == 5 {
            let c = notation.as_bytes()[4] as char;
            Some(Piece::from_char(c).ok_or(MoveParseError::InvalidPromotion { char: c })?)
        } else {
            None
        };

        let mut candidates = MoveList::new();
        generate_all_moves(self, &mut candidates);
        candidates
            .iter()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promotion)
            .copied()
            .ok_or(MoveParseError::IllegalMove { notation: notation.to_string() })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Board, FenError> {
        Board::from_fen(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_fen_round_trips() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn round_trip_holds_after_a_double_push() {
        let mut board = Board::starting_position();
        let mv = board.parse_move("e2e4").unwrap();
        board.make_move(mv);
        let fen = board.to_fen();
        let reparsed = Board::from_fen(&fen).unwrap();
        assert_eq!(reparsed, board);
    }

    #[test]
    fn rejects_empty_fen() {
        assert_eq!(Board::from_fen(""), Err(FenError::EmptyData));
    }

    #[test]
    fn rejects_short_board_field() {
        assert!(matches!(
            Board::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::BoardNotEnoughRows { found: 7 })
        ));
    }

    #[test]
    fn parse_move_rejects_illegal_move() {
        let board = Board::starting_position();
        assert!(board.parse_move("e2e5").is_err());
    }

    #[test]
    fn parse_move_accepts_every_legal_move_round_trip() {
        let board = Board::starting_position();
        let mut all = MoveList::new();
        generate_all_moves(&board, &mut all);
        for &mv in all.iter() {
            let notation = mv.to_uci_string();
            let parsed = board.parse_move(&notation).unwrap();
            assert_eq!(parsed, mv);
        }
    }
}
