use std::collections::{BinaryHeap, HashMap};
use std::hash::BuildHasherDefault;

use crate::hashing::{ItemHash, NoHashHasher};

/// Bounded bottom-k container over hash values.
///
/// Keeps at most `capacity` distinct hashes in a max-heap keyed by hash
/// value, so the top is always the largest hash currently kept and the next
/// candidate for eviction. A multiplicity count per kept hash feeds the
/// mixture-side coverage diagnostic; it plays no part in which hashes are
/// kept.
#[derive(Clone, Debug)]
pub struct MinHashHeap {
    use64: bool,
    capacity: usize,
    hashes: BinaryHeap<ItemHash>,
    counts: HashMap<ItemHash, u32, BuildHasherDefault<NoHashHasher>>,
    multiplicity_sum: u64,
}

impl MinHashHeap {
    pub fn new(use64: bool, capacity: usize) -> Self {
        MinHashHeap {
            use64,
            capacity,
            hashes: BinaryHeap::with_capacity(capacity + 1),
            counts: HashMap::with_capacity_and_hasher(capacity, BuildHasherDefault::default()),
            multiplicity_sum: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn use64(&self) -> bool {
        self.use64
    }

    /// Offer a hash to the heap: already-kept hashes only bump their
    /// multiplicity, new hashes displace the current maximum once the heap
    /// is full, and hashes at or above a full heap's maximum are discarded.
    pub fn try_insert(&mut self, hash: ItemHash) {
        self.insert_counted(hash, 1);
    }

    fn insert_counted(&mut self, hash: ItemHash, count: u32) {
        if let Some(existing) = self.counts.get_mut(&hash) {
            *existing = existing.saturating_add(count);
            self.multiplicity_sum += u64::from(count);
            return;
        }

        let acceptable = match self.hashes.peek() {
            None => self.capacity > 0,
            Some(&top) => self.hashes.len() < self.capacity || hash < top,
        };
        if !acceptable {
            return;
        }

        self.hashes.push(hash);
        self.counts.insert(hash, count);
        self.multiplicity_sum += u64::from(count);
        if self.hashes.len() > self.capacity {
            let evicted = self.hashes.pop().expect("heap is non-empty");
            let evicted_count = self
                .counts
                .remove(&evicted)
                .expect("membership tracks the heap");
            self.multiplicity_sum -= u64::from(evicted_count);
        }
    }

    /// Fold another heap's contents into this one, multiplicities included.
    /// The fold is associative and commutative, so any partition of the
    /// input stream into per-worker heaps merges to the same result.
    pub fn merge_from(&mut self, other: &MinHashHeap) {
        for (&hash, &count) in &other.counts {
            self.insert_counted(hash, count);
        }
    }

    /// Kept hashes in ascending order.
    pub fn to_sorted_vec(&self) -> Vec<ItemHash> {
        self.hashes.clone().into_sorted_vec()
    }

    /// K-minimum-value estimate of the number of distinct hashes seen:
    /// 2^W * |kept| / max(kept). Zero for an empty heap.
    pub fn estimate_set_size(&self) -> u64 {
        match self.hashes.peek() {
            None => 0,
            Some(&top) => {
                let bits = if self.use64 { 64 } else { 32 };
                (2f64.powi(bits) * self.hashes.len() as f64 / top as f64) as u64
            }
        }
    }

    /// Mean multiplicity of the kept hashes, a rough coverage estimate of
    /// the mixture. Zero for an empty heap.
    pub fn estimate_multiplicity(&self) -> f64 {
        if self.hashes.is_empty() {
            0.0
        } else {
            self.multiplicity_sum as f64 / self.hashes.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_bounded_at_capacity() {
        let mut heap = MinHashHeap::new(true, 3);
        for hash in [9, 7, 5, 3, 1] {
            heap.try_insert(hash);
        }
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.to_sorted_vec(), vec![1, 3, 5]);
    }

    #[test]
    fn test_discards_large_hashes_when_full() {
        let mut heap = MinHashHeap::new(true, 2);
        heap.try_insert(10);
        heap.try_insert(20);
        heap.try_insert(30);
        assert_eq!(heap.to_sorted_vec(), vec![10, 20]);
        heap.try_insert(5);
        assert_eq!(heap.to_sorted_vec(), vec![5, 10]);
    }

    #[test]
    fn test_duplicates_bump_multiplicity_not_membership() {
        let mut heap = MinHashHeap::new(true, 4);
        heap.try_insert(8);
        heap.try_insert(8);
        heap.try_insert(8);
        heap.try_insert(2);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.estimate_multiplicity(), 2.0);
    }

    #[test]
    fn test_eviction_drops_multiplicity() {
        let mut heap = MinHashHeap::new(true, 1);
        heap.try_insert(50);
        heap.try_insert(50);
        heap.try_insert(3);
        assert_eq!(heap.to_sorted_vec(), vec![3]);
        assert_eq!(heap.estimate_multiplicity(), 1.0);
    }

    #[test]
    fn test_estimate_set_size() {
        let heap = MinHashHeap::new(false, 5);
        assert_eq!(heap.estimate_set_size(), 0);

        let mut heap = MinHashHeap::new(false, 5);
        for hash in 1..=5u64 {
            heap.try_insert(hash);
        }
        // 2^32 * 5 / 5
        assert_eq!(heap.estimate_set_size(), 1 << 32);

        let mut wide = MinHashHeap::new(true, 2);
        wide.try_insert(1 << 62);
        wide.try_insert(1 << 63);
        // 2^64 * 2 / 2^63 = 4
        assert_eq!(wide.estimate_set_size(), 4);
    }

    fn k_smallest_distinct(hashes: &[u64], k: usize) -> Vec<u64> {
        let mut distinct: Vec<u64> = hashes.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.truncate(k);
        distinct
    }

    proptest! {
        #[test]
        fn test_keeps_exactly_the_k_smallest(hashes: Vec<u64>) {
            let mut heap = MinHashHeap::new(true, 4);
            for &hash in &hashes {
                heap.try_insert(hash);
            }
            prop_assert_eq!(heap.to_sorted_vec(), k_smallest_distinct(&hashes, 4));
        }

        #[test]
        fn test_merge_is_partition_invariant(hashes: Vec<u64>, chunk_len in 1usize..7) {
            let mut single = MinHashHeap::new(true, 4);
            for &hash in &hashes {
                single.try_insert(hash);
            }

            let mut merged = MinHashHeap::new(true, 4);
            for chunk in hashes.chunks(chunk_len) {
                let mut partial = MinHashHeap::new(true, 4);
                for &hash in chunk {
                    partial.try_insert(hash);
                }
                merged.merge_from(&partial);
            }

            prop_assert_eq!(merged.to_sorted_vec(), single.to_sorted_vec());
            prop_assert_eq!(merged.estimate_multiplicity(), single.estimate_multiplicity());
        }
    }
}
