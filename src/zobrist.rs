//! Zobrist hashing: a 64-bit position fingerprint as the XOR of
//! per-(square, color, piece) random constants, plus side-to-move, castling
//! and en-passant-file constants.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{CastlingRights, Color, Piece, Square};

/// Fixed seed so hashes (and therefore TT behavior across runs) are
/// reproducible.
const ZOBRIST_SEED: u64 = 1_234_567_890;

pub struct ZobristKeys {
    piece_keys: [[[u64; 64]; 6]; 2],
    black_to_move_key: u64,
    castling_keys: [u64; 16],
    en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    #[inline]
    #[must_use]
    pub fn piece(&self, color: Color, piece: Piece, square: Square) -> u64 {
        self.piece_keys[color.index()][piece.index()][square.index() as usize]
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> u64 {
        self.black_to_move_key
    }

    #[inline]
    #[must_use]
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        self.castling_keys[rights.as_u8() as usize]
    }

    #[inline]
    #[must_use]
    pub fn en_passant_file(&self, file: u8) -> u64 {
        self.en_passant_keys[file as usize]
    }
}

fn build_keys() -> ZobristKeys {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    let mut piece_keys = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_keys {
        for piece in color.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }
    }
    let mut castling_keys = [0u64; 16];
    for key in &mut castling_keys {
        *key = rng.gen();
    }
    let mut en_passant_keys = [0u64; 8];
    for key in &mut en_passant_keys {
        *key = rng.gen();
    }
    ZobristKeys {
        piece_keys,
        black_to_move_key: rng.gen(),
        castling_keys,
        en_passant_keys,
    }
}

pub static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(build_keys);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_pairwise_distinct_for_a_sample() {
        let mut seen = std::collections::HashSet::new();
        for color in [Color::White, Color::Black] {
            for piece_idx in 0..6 {
                let piece = Piece::from_index(piece_idx);
                for sq_idx in 0..64u8 {
                    let key = ZOBRIST.piece(color, piece, Square::from_index(sq_idx));
                    assert!(seen.insert(key), "duplicate zobrist key");
                }
            }
        }
    }

    #[test]
    fn castling_key_all_zero_rights_is_zero_index() {
        let key_none = ZOBRIST.castling(CastlingRights::none());
        let key_all = ZOBRIST.castling(CastlingRights::all());
        assert_ne!(key_none, key_all);
    }
}
