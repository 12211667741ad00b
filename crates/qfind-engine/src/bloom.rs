//! Feed-forward Bloom pair (spec §4.2).
//!
//! `P` answers plain membership with no false negatives. `S` is written on
//! every positive `P` lookup, turning it into a record of "items anyone has
//! ever asked about" for later analytics; the query path never reads `S`.
//!
//! Both filters use `AtomicU64` words and `fetch_or` to set bits, which is
//! the atomicity argument spec §5 allows in place of guarding the filter
//! with the index lock: bit writes are never lost, and a filter can only
//! move bits from 0 to 1, so concurrent `add`/`check` cannot observe a
//! torn word.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = 64;

struct BitSet {
    words: Vec<AtomicU64>,
    bits: usize,
}

impl BitSet {
    fn new(bits: usize) -> Self {
        let bits = bits.max(WORD_BITS);
        let word_count = bits.div_ceil(WORD_BITS);
        let mut words = Vec::with_capacity(word_count);
        words.resize_with(word_count, || AtomicU64::new(0));
        Self { words, bits }
    }

    fn set(&self, index: usize) {
        let idx = index % self.bits;
        let word = idx / WORD_BITS;
        let bit = idx % WORD_BITS;
        self.words[word].fetch_or(1u64 << bit, Ordering::Relaxed);
    }

    fn get(&self, index: usize) -> bool {
        let idx = index % self.bits;
        let word = idx / WORD_BITS;
        let bit = idx % WORD_BITS;
        self.words[word].load(Ordering::Relaxed) & (1u64 << bit) != 0
    }
}

/// Seeded, non-cryptographic 64-bit hash family used to derive the `k`
/// bit positions for an item. Uses double hashing (Kirsch-Mitzenmacher):
/// `h_i(x) = h1(x) + i * h2(x)`, which only needs two base hashes however
/// large `k` is.
fn base_hashes(item: &[u8], seed1: u64, seed2: u64) -> (u64, u64) {
    use std::hash::Hasher;
    let mut h1 = ahash::AHasher::default();
    h1.write_u64(seed1);
    h1.write(item);
    let mut h2 = ahash::AHasher::default();
    h2.write_u64(seed2);
    h2.write(item);
    (h1.finish(), h2.finish())
}

/// Two independent bit arrays plus `k` seeded hash functions.
pub struct BloomPair {
    primary: BitSet,
    secondary: BitSet,
    k: u32,
}

const PRIMARY_SEED1: u64 = 0x9E3779B97F4A7C15;
const PRIMARY_SEED2: u64 = 0xC2B2AE3D27D4EB4F;
const SECONDARY_SEED1: u64 = 0x9E3779B97F4A7C15 ^ 0xA5A5_A5A5;
const SECONDARY_SEED2: u64 = 0xC2B2AE3D27D4EB4F ^ 0xA5A5_A5A5;

impl BloomPair {
    pub fn new(primary_bits: usize, secondary_bits: usize, k: u32) -> Self {
        Self {
            primary: BitSet::new(primary_bits),
            secondary: BitSet::new(secondary_bits),
            k: k.max(1),
        }
    }

    /// Set `k` bits in the primary filter for `item`.
    pub fn add(&self, item: &[u8]) {
        let (h1, h2) = base_hashes(item, PRIMARY_SEED1, PRIMARY_SEED2);
        for i in 0..self.k as u64 {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) as usize;
            self.primary.set(idx);
        }
    }

    /// Returns `true` iff every corresponding bit in the primary filter is
    /// set. On a positive result, records `item` in the secondary filter.
    pub fn check(&self, item: &[u8]) -> bool {
        let (h1, h2) = base_hashes(item, PRIMARY_SEED1, PRIMARY_SEED2);
        let mut all_set = true;
        for i in 0..self.k as u64 {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) as usize;
            if !self.primary.get(idx) {
                all_set = false;
                break;
            }
        }

        if all_set {
            self.record(item);
        }

        all_set
    }

    fn record(&self, item: &[u8]) {
        let (h1, h2) = base_hashes(item, SECONDARY_SEED1, SECONDARY_SEED2);
        for i in 0..self.k as u64 {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) as usize;
            self.secondary.set(idx);
        }
    }

    /// Returns the subset of `patterns` ever recorded in the secondary
    /// filter (i.e. previously asked about and answered "maybe" by `P`).
    pub fn candidates<'a>(&self, patterns: &[&'a [u8]]) -> Vec<&'a [u8]> {
        patterns
            .iter()
            .copied()
            .filter(|item| {
                let (h1, h2) = base_hashes(item, SECONDARY_SEED1, SECONDARY_SEED2);
                (0..self.k as u64).all(|i| {
                    let idx = h1.wrapping_add(i.wrapping_mul(h2)) as usize;
                    self.secondary.get(idx)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_false_negatives() {
        let bloom = BloomPair::new(1 << 16, 1 << 15, 8);
        let items: Vec<[u8; 4]> = (0u32..500).map(|i| i.to_le_bytes()).collect();
        for item in &items {
            bloom.add(item);
        }
        for item in &items {
            assert!(bloom.check(item), "false negative for {item:?}");
        }
    }

    #[test]
    fn unseen_item_usually_rejected() {
        let bloom = BloomPair::new(1 << 16, 1 << 15, 8);
        bloom.add(b"hello world trigram");
        assert!(!bloom.check(b"completely different bytes"));
    }

    #[test]
    fn feed_forward_records_positive_lookups() {
        let bloom = BloomPair::new(1 << 16, 1 << 15, 8);
        let item = b"some/path/name";
        bloom.add(item);
        assert!(bloom.check(item));

        let candidates = bloom.candidates(&[item.as_slice()]);
        assert_eq!(candidates.len(), 1);
    }
}
