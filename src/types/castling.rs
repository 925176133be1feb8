//! Castling rights packed into four bits.

pub const CASTLE_WHITE_K: u8 = 1 << 0;
pub const CASTLE_WHITE_Q: u8 = 1 << 1;
pub const CASTLE_BLACK_K: u8 = 1 << 2;
pub const CASTLE_BLACK_Q: u8 = 1 << 3;
pub const ALL_CASTLING_RIGHTS: u8 = CASTLE_WHITE_K | CASTLE_WHITE_Q | CASTLE_BLACK_K | CASTLE_BLACK_Q;

use super::piece::Color;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastlingRights(u8);

impl CastlingRights {
    #[inline]
    #[must_use]
    pub const fn none() -> CastlingRights {
        CastlingRights(0)
    }

    #[inline]
    #[must_use]
    pub const fn all() -> CastlingRights {
        CastlingRights(ALL_CASTLING_RIGHTS)
    }

    #[inline]
    #[must_use]
    const fn bit_for(color: Color, kingside: bool) -> u8 {
        match (color, kingside) {
            (Color::White, true) => CASTLE_WHITE_K,
            (Color::White, false) => CASTLE_WHITE_Q,
            (Color::Black, true) => CASTLE_BLACK_K,
            (Color::Black, false) => CASTLE_BLACK_Q,
        }
    }

    #[inline]
    #[must_use]
    pub const fn has(self, color: Color, kingside: bool) -> bool {
        self.0 & Self::bit_for(color, kingside) != 0
    }

    #[inline]
    #[must_use]
    pub const fn set(self, color: Color, kingside: bool) -> CastlingRights {
        CastlingRights(self.0 | Self::bit_for(color, kingside))
    }

    #[inline]
    #[must_use]
    pub const fn remove(self, color: Color, kingside: bool) -> CastlingRights {
        CastlingRights(self.0 & !Self::bit_for(color, kingside))
    }

    /// Drops both of `color`'s castling rights (king moved).
    #[inline]
    #[must_use]
    pub const fn remove_color(self, color: Color) -> CastlingRights {
        match color {
            Color::White => CastlingRights(self.0 & !(CASTLE_WHITE_K | CASTLE_WHITE_Q)),
            Color::Black => CastlingRights(self.0 & !(CASTLE_BLACK_K | CASTLE_BLACK_Q)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_u8(bits: u8) -> CastlingRights {
        CastlingRights(bits & ALL_CASTLING_RIGHTS)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Maps a FEN castling character (`K`, `Q`, `k`, `q`) to its bit, or `None`.
#[must_use]
pub fn castle_bit(side: char) -> Option<u8> {
    match side {
        'K' => Some(CASTLE_WHITE_K),
        'Q' => Some(CASTLE_WHITE_Q),
        'k' => Some(CASTLE_BLACK_K),
        'q' => Some(CASTLE_BLACK_Q),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_remove_round_trip() {
        let rights = CastlingRights::none()
            .set(Color::White, true)
            .set(Color::Black, false);
        assert!(rights.has(Color::White, true));
        assert!(!rights.has(Color::White, false));
        assert!(rights.has(Color::Black, false));
        assert!(!rights.remove(Color::White, true).has(Color::White, true));
    }

    #[test]
    fn remove_color_keeps_the_other_side() {
        let rights = CastlingRights::all().remove_color(Color::White);
        assert!(!rights.has(Color::White, true));
        assert!(!rights.has(Color::White, false));
        assert!(rights.has(Color::Black, true));
        assert!(rights.has(Color::Black, false));
    }

    #[test]
    fn castle_bit_rejects_unknown_chars() {
        assert_eq!(castle_bit('x'), None);
        assert_eq!(castle_bit('K'), Some(CASTLE_WHITE_K));
    }
}
