//! Piece and color types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chess piece types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Piece::Pawn => 0,
            Piece::Knight => 1,
            Piece::Bishop => 2,
            Piece::Rook => 3,
            Piece::Queen => 4,
            Piece::King => 5,
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: usize) -> Piece {
        match idx {
            0 => Piece::Pawn,
            1 => Piece::Knight,
            2 => Piece::Bishop,
            3 => Piece::Rook,
            4 => Piece::Queen,
            5 => Piece::King,
            _ => panic!("piece index out of range"),
        }
    }

    /// Parse a piece from a lowercase (or uppercase) character (p, n, b, r, q, k).
    #[must_use]
    pub fn from_char(c: char) -> Option<Piece> {
        match c.to_ascii_lowercase() {
            'p' => Some(Piece::Pawn),
            'n' => Some(Piece::Knight),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            'q' => Some(Piece::Queen),
            'k' => Some(Piece::King),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }

    #[inline]
    #[must_use]
    pub fn to_fen_char(self, color: Color) -> char {
        let c = self.to_char();
        if color == Color::White {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Rough material value in centipawns, used only by the crate's minimal
    /// static evaluator and MVV/LVA ordering - not a tuned evaluation function.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Piece::Pawn => 100,
            Piece::Knight => 320,
            Piece::Bishop => 330,
            Piece::Rook => 500,
            Piece::Queen => 900,
            Piece::King => 20000,
        }
    }
}

/// Promotion piece choices, queen first - the order move generation emits them in.
pub const PROMOTION_PIECES: [Piece; 4] =
    [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

/// Chess colors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: usize) -> Color {
        match idx {
            0 => Color::White,
            1 => Color::Black,
            _ => panic!("color index out of range"),
        }
    }

    /// Constant-time opposite-color relation (a plain match, no data-dependent branch).
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A square's contents: empty, or a `(Color, Piece)` packed into one byte.
///
/// Bit layout: bit 7 is the "occupied" flag, bit 3 is color (0=White, 1=Black),
/// bits 0-2 are the piece index. [`EMPTY_CELL`] is the all-zero-occupied sentinel,
/// distinct from every `(color, piece)` pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell(u8);

const OCCUPIED_BIT: u8 = 0b1000_0000;
const COLOR_BIT: u8 = 0b0000_1000;

/// The distinguished empty-square sentinel.
pub const EMPTY_CELL: Cell = Cell(0);

impl Cell {
    #[inline]
    #[must_use]
    pub const fn new(color: Color, piece: Piece) -> Cell {
        let color_bit = match color {
            Color::White => 0,
            Color::Black => COLOR_BIT,
        };
        Cell(OCCUPIED_BIT | color_bit | piece.index() as u8)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 & OCCUPIED_BIT == 0
    }

    #[inline]
    #[must_use]
    pub const fn piece(self) -> Option<Piece> {
        if self.is_empty() {
            None
        } else {
            Some(Piece::from_index((self.0 & 0b0000_0111) as usize))
        }
    }

    #[inline]
    #[must_use]
    pub const fn color(self) -> Option<Color> {
        if self.is_empty() {
            None
        } else if self.0 & COLOR_BIT == 0 {
            Some(Color::White)
        } else {
            Some(Color::Black)
        }
    }

    #[inline]
    #[must_use]
    pub const fn unpack(self) -> Option<(Color, Piece)> {
        match (self.color(), self.piece()) {
            (Some(c), Some(p)) => Some((c, p)),
            _ => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        EMPTY_CELL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_distinct_from_every_piece() {
        for color in [Color::White, Color::Black] {
            for idx in 0..6 {
                let piece = Piece::from_index(idx);
                assert_ne!(Cell::new(color, piece), EMPTY_CELL);
            }
        }
    }

    #[test]
    fn cell_round_trips_color_and_piece() {
        let cell = Cell::new(Color::Black, Piece::Knight);
        assert_eq!(cell.unpack(), Some((Color::Black, Piece::Knight)));
        assert!(!cell.is_empty());
        assert!(EMPTY_CELL.is_empty());
        assert_eq!(EMPTY_CELL.unpack(), None);
    }

    #[test]
    fn opponent_is_involution() {
        assert_eq!(Color::White.opponent().opponent(), Color::White);
        assert_eq!(Color::White.opponent(), Color::Black);
    }
}
