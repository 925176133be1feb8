//! Geometry & attack tables: knight/king/pawn leaper attacks and
//! magic-bitboard sliding attacks for bishop and rook, generated once and
//! held as process-lifetime immutable state.
//!
//! The magics themselves are not baked-in historical constants; they're
//! found by brute-force search against a fixed-seed RNG the first time the
//! tables are touched, exactly the way most from-scratch magic-bitboard
//! engines bootstrap their own numbers rather than trusting a list copied
//! from elsewhere. The search is deterministic (fixed seed) so `init()` is
//! idempotent and the resulting magics are stable across runs.

mod masks;

pub use masks::{EvalMasks, EVAL_MASKS};

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Bitboard, Color, Square};

const ROOK_DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const MAGIC_SEARCH_SEED: u64 = 0x5EED_C0FF_EE15_B17D;

fn ray_attacks(square: Square, dirs: &[(i32, i32); 4], occupancy: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(dr, df) in dirs {
        let mut rank = square.rank() as i32;
        let mut file = square.file() as i32;
        loop {
            rank += dr;
            file += df;
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                break;
            }
            let sq = Square::new(rank as u8, file as u8);
            attacks = attacks.set(sq);
            if occupancy.has(sq) {
                break;
            }
        }
    }
    attacks
}

/// Relevant-occupancy mask: every ray square except the final (edge) one,
/// since an occupant there never changes the attack set.
fn relevant_mask(square: Square, dirs: &[(i32, i32); 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(dr, df) in dirs {
        let mut rank = square.rank() as i32;
        let mut file = square.file() as i32;
        let mut pending: Option<Square> = None;
        loop {
            rank += dr;
            file += df;
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                break;
            }
            if let Some(sq) = pending {
                mask = mask.set(sq);
            }
            pending = Some(Square::new(rank as u8, file as u8));
        }
    }
    mask
}

/// Enumerates every subset of `mask`'s set bits via the standard
/// carry-rippler trick.
fn subsets(mask: Bitboard) -> Vec<Bitboard> {
    let mut out = Vec::with_capacity(1 << mask.popcount());
    let mut subset: u64 = 0;
    loop {
        out.push(Bitboard(subset));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }
    out
}

struct SlidingSquareTable {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    table: Box<[Bitboard]>,
}

impl SlidingSquareTable {
    #[inline]
    fn attacks(&self, occupancy: Bitboard) -> Bitboard {
        let relevant = Bitboard(occupancy.0 & self.mask.0);
        let idx = (relevant.0.wrapping_mul(self.magic)) >> self.shift;
        self.table[idx as usize]
    }
}

fn find_magic(
    square: Square,
    dirs: &[(i32, i32); 4],
    mask: Bitboard,
    rng: &mut StdRng,
) -> SlidingSquareTable {
    let relevant_bits = mask.popcount();
    let shift = 64 - relevant_bits;
    let occupancies = subsets(mask);
    let attacks: Vec<Bitboard> = occupancies
        .iter()
        .map(|&occ| ray_attacks(square, dirs, occ))
        .collect();
    let size = 1usize << relevant_bits;

    loop {
        let magic: u64 = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if ((mask.0.wrapping_mul(magic)) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }
        let mut table: Vec<Option<Bitboard>> = vec![None; size];
        let mut collided = false;
        for (occ, &att) in occupancies.iter().zip(attacks.iter()) {
            let idx = (occ.0.wrapping_mul(magic) >> shift) as usize;
            match table[idx] {
                None => table[idx] = Some(att),
                Some(existing) if existing == att => {}
                Some(_) => {
                    collided = true;
                    break;
                }
            }
        }
        if !collided {
            let table: Box<[Bitboard]> = table
                .into_iter()
                .map(|slot| slot.unwrap_or(Bitboard::EMPTY))
                .collect();
            return SlidingSquareTable {
                mask,
                magic,
                shift,
                table,
            };
        }
    }
}

struct SlidingAttacks {
    squares: Vec<SlidingSquareTable>,
}

impl SlidingAttacks {
    fn build(dirs: &[(i32, i32); 4], rng: &mut StdRng) -> SlidingAttacks {
        let squares = (0..64u8)
            .map(|idx| {
                let sq = Square::from_index(idx);
                let mask = relevant_mask(sq, dirs);
                find_magic(sq, dirs, mask, rng)
            })
            .collect();
        SlidingAttacks { squares }
    }

    #[inline]
    fn attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.squares[square.index() as usize].attacks(occupancy)
    }
}

fn leaper_attacks(deltas: &[(i32, i32)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    for idx in 0..64u8 {
        let sq = Square::from_index(idx);
        let mut bb = Bitboard::EMPTY;
        for &(dr, df) in deltas {
            let rank = sq.rank() as i32 + dr;
            let file = sq.file() as i32 + df;
            if (0..8).contains(&rank) && (0..8).contains(&file) {
                bb = bb.set(Square::new(rank as u8, file as u8));
            }
        }
        table[idx as usize] = bb;
    }
    table
}

const KNIGHT_DELTAS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_DELTAS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn pawn_attacks(white: bool) -> [Bitboard; 64] {
    // White captures towards rank 0, Black towards rank 7.
    let dr = if white { -1 } else { 1 };
    leaper_attacks(&[(dr, -1), (dr, 1)])
}

/// All process-lifetime-immutable geometry tables.
pub struct AttackTables {
    pub knight: [Bitboard; 64],
    pub king: [Bitboard; 64],
    pub pawn: [[Bitboard; 64]; 2],
    bishop: SlidingAttacks,
    rook: SlidingAttacks,
}

impl AttackTables {
    #[inline]
    #[must_use]
    pub fn bishop_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop.attacks(square, occupancy)
    }

    #[inline]
    #[must_use]
    pub fn rook_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.rook.attacks(square, occupancy)
    }

    #[inline]
    #[must_use]
    pub fn queen_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop_attacks(square, occupancy) | self.rook_attacks(square, occupancy)
    }

    #[inline]
    #[must_use]
    pub fn knight_attacks(&self, square: Square) -> Bitboard {
        self.knight[square.index() as usize]
    }

    #[inline]
    #[must_use]
    pub fn king_attacks(&self, square: Square) -> Bitboard {
        self.king[square.index() as usize]
    }

    #[inline]
    #[must_use]
    pub fn pawn_attacks(&self, color: Color, square: Square) -> Bitboard {
        self.pawn[color.index()][square.index() as usize]
    }
}

fn build_attack_tables() -> AttackTables {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEARCH_SEED);
    AttackTables {
        knight: leaper_attacks(&KNIGHT_DELTAS),
        king: leaper_attacks(&KING_DELTAS),
        pawn: [pawn_attacks(true), pawn_attacks(false)],
        bishop: SlidingAttacks::build(&BISHOP_DIRS, &mut rng),
        rook: SlidingAttacks::build(&ROOK_DIRS, &mut rng),
    }
}

static ATTACK_TABLES: LazyLock<AttackTables> = LazyLock::new(build_attack_tables);

/// Forces the lazily-built tables (leaper attacks, magic bitboards, and eval
/// masks) to materialize. Idempotent; safe to call from multiple threads
/// concurrently, and safe not to call at all (first use triggers the same
/// build).
pub fn init() {
    LazyLock::force(&ATTACK_TABLES);
    LazyLock::force(&EVAL_MASKS);
}

#[must_use]
pub fn tables() -> &'static AttackTables {
    &ATTACK_TABLES
}
