/// The nucleotide alphabet; k-mers over it are canonicalized against their
/// reverse complement before hashing.
pub const ALPHABET_NUCLEOTIDE: &str = "ACGT";

/// The amino-acid alphabet. A sketch declaring this alphabet makes the screen
/// six-frame translate its nucleotide mixture before hashing.
pub const ALPHABET_PROTEIN: &str = "ACDEFGHIKLMNPQRSTVWY";

/// Global hashing parameters shared by every reference in a sketch file.
///
/// All of these are contract: two sketches (or a sketch and a mixture stream)
/// are only comparable when every field matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SketchParams {
    pub kmer_length: u8,
    /// Signature cardinality K: how many bottom hashes each reference keeps.
    pub sketch_size: usize,
    pub hash_seed: u32,
    /// Hash width: 64-bit murmur3 when set, 32-bit otherwise. Fixed at
    /// construction; every downstream container honors it uniformly.
    pub use64: bool,
    pub canonical: bool,
    pub preserve_case: bool,
    pub alphabet: String,
}

impl Default for SketchParams {
    fn default() -> Self {
        SketchParams {
            kmer_length: 21,
            sketch_size: 1000,
            hash_seed: 42,
            use64: true,
            canonical: true,
            preserve_case: false,
            alphabet: ALPHABET_NUCLEOTIDE.to_string(),
        }
    }
}

impl SketchParams {
    pub fn hash_bits(&self) -> u32 {
        if self.use64 {
            64
        } else {
            32
        }
    }

    /// Whether the sketch was built over amino acids, i.e. whether mixture
    /// sequences need six-frame translation before k-mer extraction.
    pub fn is_protein(&self) -> bool {
        self.alphabet == ALPHABET_PROTEIN
    }

    /// |alphabet|^k, the universe of possible k-mers under these parameters.
    pub fn kmer_space(&self) -> f64 {
        (self.alphabet.len() as f64).powi(i32::from(self.kmer_length))
    }

    /// Byte-indexed membership table for the alphabet, used by the sliding
    /// window validator.
    pub fn alphabet_lookup(&self) -> [bool; 256] {
        let mut lookup = [false; 256];
        for b in self.alphabet.bytes() {
            lookup[b as usize] = true;
        }
        lookup
    }

    /// Return any parameter difference that would make a sketch produced
    /// under `other` incomparable to one produced under `self`.
    pub fn check_compatibility(&self, other: &SketchParams) -> Option<(&'static str, String, String)> {
        if self.kmer_length != other.kmer_length {
            return Some((
                "k",
                self.kmer_length.to_string(),
                other.kmer_length.to_string(),
            ));
        }
        if self.hash_bits() != other.hash_bits() {
            return Some((
                "hash bits",
                self.hash_bits().to_string(),
                other.hash_bits().to_string(),
            ));
        }
        if self.hash_seed != other.hash_seed {
            return Some((
                "hash seed",
                self.hash_seed.to_string(),
                other.hash_seed.to_string(),
            ));
        }
        if self.alphabet != other.alphabet {
            return Some(("alphabet", self.alphabet.clone(), other.alphabet.clone()));
        }
        None
    }
}

/// One reference entry of a sketch file: a display name, an optional comment,
/// the source sequence length, and the sorted bottom-k signature. Immutable
/// after load; 32-bit hashes are stored zero-extended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sketch {
    pub name: String,
    pub comment: String,
    pub seq_length: u64,
    pub num_valid_kmers: u64,
    pub hashes: Vec<u64>,
}

impl Sketch {
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// A loaded sketch file: the global parameters plus every reference, in file
/// order. Reference indices used throughout the screen are indices into
/// `references`.
#[derive(Clone, Debug, PartialEq)]
pub struct SketchSet {
    pub params: SketchParams,
    pub references: Vec<Sketch>,
}
