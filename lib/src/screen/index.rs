use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::hashing::{ItemHash, NoHashHasher};
use crate::sketch::Sketch;

type NoHashBuild = BuildHasherDefault<NoHashHasher>;

/// Process-wide multiplicity counters for the hashes of the reference
/// sketch.
///
/// The key set is fixed when the index is built and never changes
/// afterwards, so concurrent workers only ever look up existing slots and
/// bump them with a relaxed fetch-add; the map itself is immutable during
/// streaming and the counters never move.
pub struct SharedHashCounts {
    counts: HashMap<ItemHash, AtomicU32, NoHashBuild>,
}

impl SharedHashCounts {
    /// Count one observation of `hash` if it belongs to the reference
    /// sketch; hashes outside the key set are ignored without insertion.
    #[inline]
    pub fn observe(&self, hash: ItemHash) {
        if let Some(count) = self.counts.get(&hash) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, hash: ItemHash) -> Option<u32> {
        self.counts
            .get(&hash)
            .map(|count| count.load(Ordering::Relaxed))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemHash, u32)> + '_ {
        self.counts
            .iter()
            .map(|(&hash, count)| (hash, count.load(Ordering::Relaxed)))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Mapping from sketch hash to the references whose signature contains it.
/// Built once from the loaded sketch; immutable during streaming and
/// aggregation. Each bucket lists reference indices in ascending order.
pub struct ReferenceIndex {
    buckets: HashMap<ItemHash, Vec<u32>, NoHashBuild>,
}

impl ReferenceIndex {
    /// Walk every signature once, building the inverted index and the zeroed
    /// counter table over the same key set.
    pub fn build(references: &[Sketch]) -> (ReferenceIndex, SharedHashCounts) {
        let mut buckets: HashMap<ItemHash, Vec<u32>, NoHashBuild> = HashMap::default();
        for (i, reference) in references.iter().enumerate() {
            for &hash in &reference.hashes {
                buckets.entry(hash).or_default().push(i as u32);
            }
        }

        let counts = buckets
            .keys()
            .map(|&hash| (hash, AtomicU32::new(0)))
            .collect();

        (
            ReferenceIndex { buckets },
            SharedHashCounts { counts },
        )
    }

    pub fn get(&self, hash: ItemHash) -> Option<&[u32]> {
        self.buckets.get(&hash).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemHash, &[u32])> + '_ {
        self.buckets
            .iter()
            .map(|(&hash, indices)| (hash, indices.as_slice()))
    }

    /// Number of distinct hashes across all signatures.
    pub fn distinct_hashes(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str, hashes: &[u64]) -> Sketch {
        Sketch {
            name: name.to_string(),
            comment: String::new(),
            seq_length: 100,
            num_valid_kmers: 98,
            hashes: hashes.to_vec(),
        }
    }

    #[test]
    fn test_build() {
        let refs = vec![
            reference("a", &[1, 5, 9]),
            reference("b", &[5, 9, 12]),
        ];
        let (index, counts) = ReferenceIndex::build(&refs);

        assert_eq!(index.distinct_hashes(), 4);
        assert_eq!(counts.len(), 4);
        assert_eq!(index.get(1), Some(&[0u32][..]));
        assert_eq!(index.get(5), Some(&[0u32, 1][..]));
        assert_eq!(index.get(9), Some(&[0u32, 1][..]));
        assert_eq!(index.get(12), Some(&[1u32][..]));
        assert_eq!(index.get(99), None);
    }

    #[test]
    fn test_observe_is_conditional() {
        let refs = vec![reference("a", &[1, 5])];
        let (_, counts) = ReferenceIndex::build(&refs);

        counts.observe(5);
        counts.observe(5);
        counts.observe(99); // not a sketch hash; silently dropped
        assert_eq!(counts.get(5), Some(2));
        assert_eq!(counts.get(1), Some(0));
        assert_eq!(counts.get(99), None);
        assert_eq!(counts.len(), 2);
    }
}
