//! Containment screening of MinHash reference sketches against sequence
//! mixtures.
//!
//! A precomputed sketch file carries the bottom-k signature of every
//! reference; the screen streams one or more mixture files (reads or
//! assemblies, FASTA/FASTQ, gzipped or not), counts how often each sketch
//! hash is observed, and reports per reference a containment identity, the
//! shared-hash fraction, the median multiplicity of the shared hashes, and
//! a binomial p-value. An optional winner-takes-all pass reassigns hashes
//! held by several references to the best-scoring one.

pub mod errors;
pub mod hashing;
pub mod kmers;
pub mod minhash;
pub mod screen;
pub mod serialization;
pub mod sketch;
pub mod statistics;
pub mod translation;

pub use crate::errors::{ScreenError, ScreenResult};
pub use crate::minhash::MinHashHeap;
pub use crate::screen::{screen_sketches, ScreenHit, ScreenOptions};
pub use crate::serialization::{open_sketch_file, read_sketch_file, write_sketch_file, SKETCH_EXT};
pub use crate::sketch::{Sketch, SketchParams, SketchSet};
