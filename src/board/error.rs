//! Error types surfaced by FEN parsing, move-string parsing, and
//! [`super::Board::validate`].

use std::fmt;

/// FEN parsing failures, surfaced to the caller rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    EmptyData,
    ExpectedSpace { found: String },
    UnexpectedCharacter { char: char },
    BoardRowOverflow { rank: usize },
    BoardNotEnoughRows { found: usize },
    CastlingInvalid { char: char },
    EnpassantInvalid { found: String },
    NumberOverflow { field: &'static str, found: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::EmptyData => write!(f, "FEN string is empty"),
            FenError::ExpectedSpace { found } => {
                write!(f, "expected a space-separated field, found '{found}'")
            }
            FenError::UnexpectedCharacter { char } => {
                write!(f, "unexpected character '{char}' in FEN board field")
            }
            FenError::BoardRowOverflow { rank } => {
                write!(f, "rank {rank} has more than 8 files")
            }
            FenError::BoardNotEnoughRows { found } => {
                write!(f, "FEN board field has {found} ranks, expected 8")
            }
            FenError::CastlingInvalid { char } => {
                write!(f, "invalid castling character '{char}'")
            }
            FenError::EnpassantInvalid { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::NumberOverflow { field, found } => {
                write!(f, "field '{field}' is not a valid number: '{found}'")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// UCI long-algebraic move string parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    InvalidLength { len: usize },
    InvalidSquare { notation: String },
    InvalidPromotion { char: char },
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "move string must be 4-5 characters, found {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square notation in move '{notation}'")
            }
            MoveParseError::InvalidPromotion { char } => {
                write!(f, "invalid promotion piece '{char}'")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "'{notation}' is not a legal move in this position")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Invariant failures detected by [`super::Board::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardValidationError {
    BadData,
    TooManyPieces { color_index: usize, count: u32 },
    NoKing { color_index: usize },
    TooManyKings { color_index: usize, count: u32 },
    OpponentKingAttacked,
    InvalidEnPassant,
    InvalidCastling,
}

impl fmt::Display for BoardValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardValidationError::BadData => {
                write!(f, "board bitboards are inconsistent with the cell array")
            }
            BoardValidationError::TooManyPieces { color_index, count } => {
                write!(f, "color {color_index} has {count} pieces, more than 16")
            }
            BoardValidationError::NoKing { color_index } => {
                write!(f, "color {color_index} has no king")
            }
            BoardValidationError::TooManyKings { color_index, count } => {
                write!(f, "color {color_index} has {count} kings")
            }
            BoardValidationError::OpponentKingAttacked => {
                write!(f, "the side not to move is in check")
            }
            BoardValidationError::InvalidEnPassant => {
                write!(f, "en passant target square is inconsistent with the position")
            }
            BoardValidationError::InvalidCastling => {
                write!(f, "castling rights are inconsistent with king/rook placement")
            }
        }
    }
}

impl std::error::Error for BoardValidationError {}
