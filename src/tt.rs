//! Shared transposition table: fixed-capacity, power-of-two-bucketed,
//! lock-free for any mix of concurrent readers and writers.
//!
//! Each bucket holds two slots (depth-preferred, always-replace). A slot is
//! two aligned `AtomicU64` words — the packed entry payload and
//! `key ^ payload` — so a reader can detect a torn read (one word updated,
//! the other not yet) by re-deriving the key from the check word and
//! comparing against the hash it probed with. A lost write under
//! contention is acceptable; a probe that returns a hit for the wrong
//! position is not.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::types::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

impl Bound {
    const fn to_bits(self) -> u64 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    const fn from_bits(bits: u64) -> Bound {
        match bits & 0b11 {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        }
    }
}

/// A probe hit, decoded from a slot's packed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub best_move: Option<Move>,
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub epoch: u8,
}

const MOVE_SHIFT: u64 = 0;
const SCORE_SHIFT: u64 = 16;
const DEPTH_SHIFT: u64 = 32;
const BOUND_SHIFT: u64 = 40;
const EPOCH_SHIFT: u64 = 42;

fn pack(best_move: Option<Move>, depth: u8, score: i32, bound: Bound, epoch: u8) -> u64 {
    let move_bits = best_move.map_or(0u64, |m| m.as_u16() as u64);
    let score_bits = (score as i16 as u16) as u64;
    (move_bits << MOVE_SHIFT)
        | (score_bits << SCORE_SHIFT)
        | ((depth as u64) << DEPTH_SHIFT)
        | (bound.to_bits() << BOUND_SHIFT)
        | ((epoch as u64) << EPOCH_SHIFT)
}

fn unpack(data: u64) -> TtEntry {
    let move_bits = ((data >> MOVE_SHIFT) & 0xFFFF) as u16;
    let score_bits = ((data >> SCORE_SHIFT) & 0xFFFF) as u16;
    let depth = ((data >> DEPTH_SHIFT) & 0xFF) as u8;
    let bound = Bound::from_bits((data >> BOUND_SHIFT) & 0b11);
    let epoch = ((data >> EPOCH_SHIFT) & 0xFF) as u8;
    TtEntry {
        best_move: if move_bits == 0 { None } else { Some(Move::from_u16(move_bits)) },
        depth,
        score: score_bits as i16 as i32,
        bound,
        epoch,
    }
}

/// One lock-free slot: the packed payload and its XOR-with-key check word.
/// `key == 0 && data == 0` means empty — the null move packs to all-zero
/// data only when depth/score/bound/epoch are all zero too, which never
/// happens for a real stored entry (a stored entry always carries a
/// nonzero epoch after the first `next_epoch`), so the empty sentinel is
/// unambiguous in practice; a fresh table's all-zero slots are correctly
/// reported as misses by the key mismatch, not the sentinel.
struct Slot {
    data: AtomicU64,
    key_xor_data: AtomicU64,
}

impl Slot {
    fn empty() -> Slot {
        Slot {
            data: AtomicU64::new(0),
            key_xor_data: AtomicU64::new(0),
        }
    }

    fn probe(&self, key: u64) -> Option<TtEntry> {
        let data = self.data.load(Ordering::Relaxed);
        let key_xor_data = self.key_xor_data.load(Ordering::Relaxed);
        if key_xor_data ^ data != key {
            return None;
        }
        Some(unpack(data))
    }

    fn stored_depth_and_epoch(&self, key: u64) -> Option<(u8, u8)> {
        self.probe(key).map(|e| (e.depth, e.epoch))
    }

    fn write(&self, key: u64, data: u64) {
        self.data.store(data, Ordering::Relaxed);
        self.key_xor_data.store(key ^ data, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.data.store(0, Ordering::Relaxed);
        self.key_xor_data.store(0, Ordering::Relaxed);
    }
}

struct Bucket {
    depth_preferred: Slot,
    always_replace: Slot,
}

impl Bucket {
    fn empty() -> Bucket {
        Bucket {
            depth_preferred: Slot::empty(),
            always_replace: Slot::empty(),
        }
    }
}

/// Bytes per bucket, used to turn a byte budget into a bucket count.
const BUCKET_BYTES: usize = std::mem::size_of::<Bucket>();

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    epoch: AtomicU32,
}

impl TranspositionTable {
    /// Builds a table sized to the largest power-of-two bucket count that
    /// fits in `bytes`.
    #[must_use]
    pub fn new(bytes: usize) -> TranspositionTable {
        let mut bucket_count = (bytes / BUCKET_BYTES).next_power_of_two();
        if bucket_count == 0 {
            bucket_count = 1;
        }
        // next_power_of_two rounds up; step back down if that overshot the budget.
        if bucket_count * BUCKET_BYTES > bytes && bucket_count > 1 {
            bucket_count /= 2;
        }
        let buckets = (0..bucket_count).map(|_| Bucket::empty()).collect();
        TranspositionTable {
            buckets,
            mask: bucket_count - 1,
            epoch: AtomicU32::new(0),
        }
    }

    #[inline]
    fn bucket_index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn current_epoch(&self) -> u32 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Bumps the generation tag; called once per `JobRunner::start` so
    /// depth-preferred slots from a previous search lose priority.
    pub fn next_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let bucket = &self.buckets[self.bucket_index(key)];
        bucket
            .depth_preferred
            .probe(key)
            .or_else(|| bucket.always_replace.probe(key))
    }

    /// Stores an entry, replacing the depth-preferred slot only if the new
    /// entry is at least as deep as what's there or the stored entry is
    /// stale (a previous epoch); the always-replace slot is overwritten
    /// unconditionally.
    pub fn store(&self, key: u64, best_move: Option<Move>, depth: u8, score: i32, bound: Bound) {
        let epoch = (self.current_epoch() & 0xFF) as u8;
        let data = pack(best_move, depth, score, bound, epoch);
        let bucket = &self.buckets[self.bucket_index(key)];

        let replace_depth_preferred = match bucket.depth_preferred.stored_depth_and_epoch(key) {
            Some((stored_depth, stored_epoch)) => depth >= stored_depth || stored_epoch != epoch,
            None => true,
        };
        if replace_depth_preferred {
            bucket.depth_preferred.write(key, data);
        }
        bucket.always_replace.write(key, data);
    }

    /// Zeroes every slot without changing capacity.
    pub fn clear(&self) {
        for bucket in &self.buckets {
            bucket.depth_preferred.clear();
            bucket.always_replace.clear();
        }
        self.epoch.store(0, Ordering::Relaxed);
    }

    /// Rebuilds the table at a new byte budget. Callers must ensure no
    /// search is in flight — see `search::runner`'s deferred-request queue.
    pub fn resize(&mut self, bytes: usize, clear: bool) {
        let epoch = if clear { 0 } else { self.current_epoch() };
        *self = TranspositionTable::new(bytes);
        if !clear {
            self.epoch.store(epoch, Ordering::Relaxed);
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> TranspositionTable {
        TranspositionTable::new(16 * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn store_then_probe_round_trips() {
        let tt = TranspositionTable::new(1 << 20);
        let mv = Move::quiet(Square::new(6, 4), Square::new(4, 4));
        tt.store(0xDEAD_BEEF, Some(mv), 5, 123, Bound::Exact);
        let entry = tt.probe(0xDEAD_BEEF).unwrap();
        assert_eq!(entry.best_move, Some(mv));
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 123);
        assert_eq!(entry.bound, Bound::Exact);
    }

    #[test]
    fn probe_misses_on_key_not_present() {
        let tt = TranspositionTable::new(1 << 16);
        assert!(tt.probe(0x1234).is_none());
    }

    #[test]
    fn probe_misses_on_bucket_collision_with_different_key() {
        let tt = TranspositionTable::new(1 << 10);
        let mv = Move::quiet(Square::new(6, 4), Square::new(4, 4));
        tt.store(1, Some(mv), 3, 10, Bound::Exact);
        let colliding_key = 1 + (tt.capacity() as u64);
        assert!(tt.probe(colliding_key).is_none());
    }

    #[test]
    fn shallower_entry_does_not_evict_depth_preferred_slot() {
        let tt = TranspositionTable::new(1 << 16);
        let mv = Move::quiet(Square::new(6, 4), Square::new(4, 4));
        tt.store(42, Some(mv), 10, 50, Bound::Exact);
        tt.store(42, Some(mv), 2, -50, Bound::Upper);
        // The always-replace slot now holds the shallow entry, but probe
        // checks depth-preferred first, so the deep entry is still found.
        let entry = tt.probe(42).unwrap();
        assert_eq!(entry.depth, 10);
    }

    #[test]
    fn next_epoch_lets_a_shallow_store_evict_a_stale_deep_entry() {
        let tt = TranspositionTable::new(1 << 16);
        let mv = Move::quiet(Square::new(6, 4), Square::new(4, 4));
        tt.store(7, Some(mv), 10, 50, Bound::Exact);
        tt.next_epoch();
        tt.store(7, Some(mv), 1, 0, Bound::Exact);
        assert_eq!(tt.probe(7).unwrap().depth, 1);
    }

    #[test]
    fn clear_empties_every_slot() {
        let tt = TranspositionTable::new(1 << 16);
        let mv = Move::quiet(Square::new(6, 4), Square::new(4, 4));
        tt.store(7, Some(mv), 10, 50, Bound::Exact);
        tt.clear();
        assert!(tt.probe(7).is_none());
    }

    #[test]
    fn resize_changes_capacity() {
        let mut tt = TranspositionTable::new(1 << 16);
        tt.resize(1 << 20, true);
        assert!(tt.capacity() > 1);
    }
}
