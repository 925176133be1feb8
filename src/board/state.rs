//! The `Board` value type: cells, per-color/piece bitboards, side to move,
//! castling rights, en-passant target, move counters and the Zobrist hash.

use crate::magic;
use crate::types::{Bitboard, CastlingRights, Cell, Color, Piece, Square, EMPTY_CELL};
use crate::zobrist::ZOBRIST;

use super::error::BoardValidationError;

/// The authoritative chess position.
///
/// Every attribute has an invariant (see the crate's top-level docs); see
/// [`Board::validate`] for the full cross-check, which recomputes every
/// derived field from `cells` and compares.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    pub(crate) cells: [Cell; 64],
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) side: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
}

/// The reversal record captured by [`Board::make_move`]; opaque to callers,
/// passed back unchanged to [`Board::unmake_move`].
#[derive(Clone, Copy, Debug)]
pub struct UnmakeInfo {
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) hash: u64,
    pub(crate) captured: Option<(Color, Piece, Square)>,
}

/// Reversal record for [`Board::make_null_move`].
#[derive(Clone, Copy, Debug)]
pub struct NullMoveInfo {
    pub(crate) en_passant: Option<Square>,
    pub(crate) hash: u64,
}

impl Board {
    #[must_use]
    pub fn empty() -> Board {
        magic::init();
        Board {
            cells: [EMPTY_CELL; 64],
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            side: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    /// The standard chess starting position.
    #[must_use]
    pub fn starting_position() -> Board {
        let mut board = Board::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back_rank.iter().enumerate() {
            board.put_piece(Color::Black, *piece, Square::new(0, file as u8));
            board.put_piece(Color::White, *piece, Square::new(7, file as u8));
        }
        for file in 0..8u8 {
            board.put_piece(Color::Black, Piece::Pawn, Square::new(1, file));
            board.put_piece(Color::White, Piece::Pawn, Square::new(6, file));
        }
        board.castling = CastlingRights::all();
        board.hash = board.recompute_hash();
        board
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, square: Square) -> Cell {
        self.cells[square.index() as usize]
    }

    #[inline]
    #[must_use]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn all_occupied(&self) -> Bitboard {
        self.all_occupied
    }

    #[inline]
    #[must_use]
    pub fn pieces_of(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(color, Piece::King).lsb()
    }

    /// Places a piece on an empty square, updating every cached bitboard.
    /// Does not update the hash; callers that mutate a live board must XOR
    /// the corresponding Zobrist key themselves (see `make_unmake`).
    pub(crate) fn put_piece(&mut self, color: Color, piece: Piece, square: Square) {
        debug_assert!(self.cell(square).is_empty());
        self.cells[square.index() as usize] = Cell::new(color, piece);
        self.pieces[color.index()][piece.index()] = self.pieces[color.index()][piece.index()].set(square);
        self.occupied[color.index()] = self.occupied[color.index()].set(square);
        self.all_occupied = self.all_occupied.set(square);
    }

    pub(crate) fn remove_piece(&mut self, square: Square) -> Option<(Color, Piece)> {
        let cell = self.cell(square);
        let (color, piece) = cell.unpack()?;
        self.cells[square.index() as usize] = EMPTY_CELL;
        self.pieces[color.index()][piece.index()] = self.pieces[color.index()][piece.index()].clear(square);
        self.occupied[color.index()] = self.occupied[color.index()].clear(square);
        self.all_occupied = self.all_occupied.clear(square);
        Some((color, piece))
    }

    /// Full recomputation of the Zobrist hash from `cells`/`side`/`castling`/`en_passant`.
    /// Used by [`Board::validate`] and to build a fresh board from FEN.
    #[must_use]
    pub(crate) fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            if let Some((color, piece)) = self.cell(sq).unpack() {
                hash ^= ZOBRIST.piece(color, piece, sq);
            }
        }
        if self.side == Color::Black {
            hash ^= ZOBRIST.side_to_move();
        }
        hash ^= ZOBRIST.castling(self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= ZOBRIST.en_passant_file(ep.file());
        }
        hash
    }

    /// Bishops of `color` occupy only one square color (can never deliver
    /// checkmate alone against a lone king).
    fn bishops_all_same_square_color(&self, color: Color) -> bool {
        const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;
        const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;
        let bishops = self.pieces_of(color, Piece::Bishop);
        (bishops.0 & LIGHT_SQUARES == bishops.0) || (bishops.0 & DARK_SQUARES == bishops.0)
    }

    /// K vs K, K+minor vs K, or K+B vs K+B with same-colored bishops: none of
    /// these can force checkmate.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        if !(self.pieces_of(Color::White, Piece::Pawn).is_empty()
            && self.pieces_of(Color::Black, Piece::Pawn).is_empty()
            && self.pieces_of(Color::White, Piece::Rook).is_empty()
            && self.pieces_of(Color::Black, Piece::Rook).is_empty()
            && self.pieces_of(Color::White, Piece::Queen).is_empty()
            && self.pieces_of(Color::Black, Piece::Queen).is_empty())
        {
            return false;
        }
        let white_minors =
            self.pieces_of(Color::White, Piece::Knight).popcount() + self.pieces_of(Color::White, Piece::Bishop).popcount();
        let black_minors =
            self.pieces_of(Color::Black, Piece::Knight).popcount() + self.pieces_of(Color::Black, Piece::Bishop).popcount();

        match (white_minors, black_minors) {
            (0, 0) => true,
            (1, 0) | (0, 1) => true,
            (1, 1) => {
                let white_bishop = self.pieces_of(Color::White, Piece::Bishop).popcount() == 1;
                let black_bishop = self.pieces_of(Color::Black, Piece::Bishop).popcount() == 1;
                if white_bishop && black_bishop {
                    self.bishops_all_same_square_color(Color::White)
                        == self.bishops_all_same_square_color(Color::Black)
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Recomputes every derived field from `cells` and compares against the
    /// live bitboards/hash; the self-test's ground truth.
    pub fn validate(&self) -> Result<(), BoardValidationError> {
        let mut recomputed = Board::empty();
        recomputed.side = self.side;
        recomputed.castling = self.castling;
        recomputed.en_passant = self.en_passant;
        for idx in 0..64u8 {
            let sq = Square::from_index(idx);
            if let Some((color, piece)) = self.cell(sq).unpack() {
                recomputed.put_piece(color, piece, sq);
            }
        }
        if recomputed.pieces != self.pieces
            || recomputed.occupied != self.occupied
            || recomputed.all_occupied != self.all_occupied
        {
            return Err(BoardValidationError::BadData);
        }
        for color in [Color::White, Color::Black] {
            let count = self.occupied_by(color).popcount();
            if count > 16 {
                return Err(BoardValidationError::TooManyPieces {
                    color_index: color.index(),
                    count,
                });
            }
            let kings = self.pieces_of(color, Piece::King).popcount();
            if kings == 0 {
                return Err(BoardValidationError::NoKing {
                    color_index: color.index(),
                });
            }
            if kings > 1 {
                return Err(BoardValidationError::TooManyKings {
                    color_index: color.index(),
                    count: kings,
                });
            }
        }
        if self.recompute_hash() != self.hash {
            return Err(BoardValidationError::BadData);
        }
        if super::attacks::is_square_attacked(
            self,
            self.king_square(self.side.opponent()).expect("king present"),
            self.side,
        ) {
            return Err(BoardValidationError::OpponentKingAttacked);
        }
        self.validate_castling_rights()?;
        self.validate_en_passant()?;
        Ok(())
    }

    fn validate_castling_rights(&self) -> Result<(), BoardValidationError> {
        for color in [Color::White, Color::Black] {
            let home_rank = if color == Color::White { 7 } else { 0 };
            let king_home = Square::new(home_rank, 4);
            let king_on_home = self.cell(king_home).unpack() == Some((color, Piece::King));
            for kingside in [true, false] {
                if !self.castling.has(color, kingside) {
                    continue;
                }
                if !king_on_home {
                    return Err(BoardValidationError::InvalidCastling);
                }
                let rook_file = if kingside { 7 } else { 0 };
                let rook_home = Square::new(home_rank, rook_file);
                if self.cell(rook_home).unpack() != Some((color, Piece::Rook)) {
                    return Err(BoardValidationError::InvalidCastling);
                }
            }
        }
        Ok(())
    }

    fn validate_en_passant(&self) -> Result<(), BoardValidationError> {
        let Some(ep) = self.en_passant else {
            return Ok(());
        };
        let mover = self.side.opponent();
        // `en_passant` holds the skip square (FEN's en-passant target), one
        // rank behind the landing square of the double push.
        let skip_rank = if mover == Color::White { 5 } else { 2 };
        if ep.rank() != skip_rank {
            return Err(BoardValidationError::InvalidEnPassant);
        }
        Ok(())
    }
}
