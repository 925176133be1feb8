//! Square indexing: `0..=63`, `index = 8*rank + file`.
//!
//! `rank 0` is the side-to-move-independent "top" row — the row holding
//! Black's pieces in the conventional FEN field order — not the bottom of the
//! board as `a1` notation usually implies. `x(c) = c >> 3` is the rank,
//! `y(c) = c & 7` is the file. Algebraic notation (`a1`, `h8`, ...) is
//! converted at the edges: chess-rank `r` (1-8, as printed) lives at
//! `rank = 8 - r`.

use std::fmt;
use std::str::FromStr;

use super::error::SquareError;

/// A board square packed into one byte (`0..=63`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Square(u8);

impl Square {
    /// Builds a square from the internal `rank` (0 = Black's back rank) and
    /// `file` (0 = the `a` file), without bounds checking.
    #[inline]
    #[must_use]
    pub const fn new(rank: u8, file: u8) -> Square {
        Square(rank * 8 + file)
    }

    #[must_use]
    pub fn try_new(rank: i32, file: i32) -> Result<Square, SquareError> {
        if !(0..8).contains(&rank) {
            return Err(SquareError::RankOutOfBounds { rank });
        }
        if !(0..8).contains(&file) {
            return Err(SquareError::FileOutOfBounds { file });
        }
        Ok(Square::new(rank as u8, file as u8))
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: u8) -> Square {
        Square(idx)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Internal rank: `c >> 3`. `0` is Black's back rank, `7` is White's.
    #[inline]
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    #[must_use]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// The chess rank as printed in algebraic notation, `1..=8`.
    #[inline]
    #[must_use]
    pub const fn display_rank(self) -> u8 {
        8 - self.rank()
    }

    #[inline]
    #[must_use]
    pub const fn flip_vertical(self) -> Square {
        Square::new(7 - self.rank(), self.file())
    }

    #[inline]
    #[must_use]
    pub const fn flip_horizontal(self) -> Square {
        Square::new(self.rank(), 7 - self.file())
    }

    /// Square one step towards the opponent's back rank, if on the board.
    /// White advances from rank 7 towards rank 0; Black the reverse.
    #[must_use]
    pub fn forward(self, white: bool) -> Option<Square> {
        let rank = self.rank() as i32 + if white { -1 } else { 1 };
        if (0..8).contains(&rank) {
            Some(Square::new(rank as u8, self.file()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn manhattan_distance(self, other: Square) -> u8 {
        let dr = (self.rank() as i8 - other.rank() as i8).unsigned_abs();
        let df = (self.file() as i8 - other.file() as i8).unsigned_abs();
        dr + df
    }

    #[must_use]
    pub fn file_distance(self, other: Square) -> u8 {
        (self.file() as i8 - other.file() as i8).unsigned_abs()
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'0' + self.display_rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Square, SquareError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareError::InvalidNotation {
                notation: s.to_string(),
            });
        }
        let file = bytes[0];
        let display_rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&display_rank) {
            return Err(SquareError::InvalidNotation {
                notation: s.to_string(),
            });
        }
        let chess_rank = display_rank - b'0';
        Ok(Square::new(8 - chess_rank, file - b'a'))
    }
}

impl TryFrom<(usize, usize)> for Square {
    type Error = SquareError;

    fn try_from((rank, file): (usize, usize)) -> Result<Square, SquareError> {
        Square::try_new(rank as i32, file as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a8_is_the_zero_index() {
        assert_eq!("a8".parse::<Square>().unwrap().index(), 0);
    }

    #[test]
    fn h1_is_63() {
        assert_eq!("h1".parse::<Square>().unwrap().index(), 63);
    }

    #[test]
    fn a1_is_bottom_left() {
        let a1: Square = "a1".parse().unwrap();
        assert_eq!(a1.rank(), 7);
        assert_eq!(a1.file(), 0);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            let parsed: Square = sq.to_string().parse().unwrap();
            assert_eq!(sq, parsed);
        }
    }

    #[test]
    fn rejects_out_of_range_notation() {
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn flip_vertical_is_involution() {
        let sq = Square::new(2, 5);
        assert_eq!(sq.flip_vertical().flip_vertical(), sq);
        assert_eq!(sq.flip_vertical().rank(), 5);
    }

    #[test]
    fn white_forward_moves_toward_rank_zero() {
        let white_pawn_home = Square::new(6, 3);
        let pushed = white_pawn_home.forward(true).unwrap();
        assert_eq!(pushed.rank(), 5);
        let top = Square::new(0, 0);
        assert_eq!(top.forward(true), None);
    }

    #[test]
    fn black_forward_moves_toward_rank_seven() {
        let black_pawn_home = Square::new(1, 3);
        let pushed = black_pawn_home.forward(false).unwrap();
        assert_eq!(pushed.rank(), 2);
        let bottom = Square::new(7, 0);
        assert_eq!(bottom.forward(false), None);
    }

    #[test]
    fn ordering_matches_index() {
        assert!(Square::new(0, 0) < Square::new(0, 1));
        assert!(Square::new(0, 7) < Square::new(1, 0));
    }
}
