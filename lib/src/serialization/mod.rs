use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bail;
use crate::errors::ScreenResult;
use crate::sketch::{Sketch, SketchParams, SketchSet};

pub const SKETCH_EXT: &str = ".msh";

const HASH_TYPE_32: &str = "MurmurHash3_x86_32";
const HASH_TYPE_64: &str = "MurmurHash3_x64_128";

/// One reference on the wire. Hash values are serialized as decimal strings:
/// 64-bit hashes don't survive the double-precision numbers JSON readers
/// default to.
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Serialize)]
struct JsonSketch {
    name: String,
    seqLength: Option<u64>,
    numValidKmers: Option<u64>,
    comment: Option<String>,
    hashes: Vec<String>,
}

/// The sketch file container: global hashing parameters plus every
/// reference. All of the header fields are contract for the screen.
#[derive(Debug, Deserialize, Serialize)]
struct MultiSketch {
    kmer: u8,
    alphabet: String,
    #[serde(rename = "preserveCase")]
    preserve_case: bool,
    canonical: bool,
    #[serde(rename = "sketchSize")]
    sketch_size: u32,
    #[serde(rename = "hashType")]
    hash_type: String,
    #[serde(rename = "hashBits")]
    hash_bits: u16,
    #[serde(rename = "hashSeed")]
    hash_seed: u32,
    sketches: Vec<JsonSketch>,
}

pub fn write_sketch_file(file: &mut dyn Write, set: &SketchSet) -> ScreenResult<()> {
    let params = &set.params;
    let multisketch = MultiSketch {
        kmer: params.kmer_length,
        alphabet: params.alphabet.clone(),
        preserve_case: params.preserve_case,
        canonical: params.canonical,
        sketch_size: params.sketch_size as u32,
        hash_type: if params.use64 {
            HASH_TYPE_64.to_string()
        } else {
            HASH_TYPE_32.to_string()
        },
        hash_bits: params.hash_bits() as u16,
        hash_seed: params.hash_seed,
        sketches: set
            .references
            .iter()
            .map(|sketch| JsonSketch {
                name: sketch.name.clone(),
                seqLength: Some(sketch.seq_length),
                numValidKmers: Some(sketch.num_valid_kmers),
                comment: Some(sketch.comment.clone()),
                hashes: sketch.hashes.iter().map(u64::to_string).collect(),
            })
            .collect(),
    };
    serde_json::to_writer(file, &multisketch)?;
    Ok(())
}

pub fn read_sketch_file(file: &mut dyn BufRead) -> ScreenResult<SketchSet> {
    let multisketch: MultiSketch = serde_json::from_reader(file)?;

    let use64 = match (multisketch.hash_type.as_str(), multisketch.hash_bits) {
        (HASH_TYPE_64, 64) => true,
        (HASH_TYPE_32, 32) => false,
        (hash_type, bits) => bail!("unsupported hash function: {} ({} bits)", hash_type, bits),
    };
    let params = SketchParams {
        kmer_length: multisketch.kmer,
        sketch_size: multisketch.sketch_size as usize,
        hash_seed: multisketch.hash_seed,
        use64,
        canonical: multisketch.canonical,
        preserve_case: multisketch.preserve_case,
        alphabet: multisketch.alphabet,
    };

    let mut references = Vec::with_capacity(multisketch.sketches.len());
    for sketch in multisketch.sketches {
        let mut hashes = Vec::with_capacity(sketch.hashes.len());
        for hash in &sketch.hashes {
            hashes.push(hash.parse::<u64>()?);
        }
        if !use64 {
            if let Some(&wide) = hashes.iter().find(|&&hash| hash > u64::from(u32::MAX)) {
                bail!("32-bit sketch '{}' contains hash {}", sketch.name, wide);
            }
        }
        if hashes.windows(2).any(|pair| pair[0] > pair[1]) {
            bail!("signature of '{}' is not sorted", sketch.name);
        }
        // signatures are sets; drop any adjacent duplicates
        hashes.dedup();

        references.push(Sketch {
            name: sketch.name,
            comment: sketch.comment.unwrap_or_default(),
            seq_length: sketch.seqLength.unwrap_or(0),
            num_valid_kmers: sketch.numValidKmers.unwrap_or(0),
            hashes,
        });
    }

    Ok(SketchSet { params, references })
}

pub fn open_sketch_file(path: &Path) -> ScreenResult<SketchSet> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_sketch_file(&mut reader)
}
