pub mod index;
mod pipeline;

use log::{info, warn};
use rayon::prelude::*;

pub use crate::screen::index::{ReferenceIndex, SharedHashCounts};
use crate::errors::{ScreenError, ScreenResult};
use crate::sketch::SketchSet;
use crate::statistics::{containment_pvalue, estimate_identity};

/// Knobs of one screen run. `identity_min` is inclusive except at exactly
/// zero, where only identities above zero are reported; -1 reports every
/// reference.
#[derive(Clone, Debug)]
pub struct ScreenOptions {
    pub parallelism: usize,
    pub winner_take_all: bool,
    pub identity_min: f64,
    pub pvalue_max: f64,
    /// Minimum multiplicity for a sketch hash to count as observed.
    pub min_coverage: u32,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        ScreenOptions {
            parallelism: 1,
            winner_take_all: false,
            identity_min: 0.0,
            pvalue_max: 1.0,
            min_coverage: 1,
        }
    }
}

/// One surviving reference, in reference-index order.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenHit {
    pub name: String,
    pub comment: String,
    pub identity: f64,
    pub shared: u64,
    pub sketch_size: u64,
    pub median_multiplicity: u32,
    pub pvalue: f64,
}

/// Screen every reference of `set` against the mixture inputs.
///
/// Builds the inverted index and counter table, streams the mixture through
/// the hashing pipeline, sums shared hashes per reference (reallocating them
/// to winners when requested), and returns the references that survive the
/// identity and p-value filters, in reference-index order.
pub fn screen_sketches(
    set: &SketchSet,
    mixtures: &[String],
    options: &ScreenOptions,
) -> ScreenResult<Vec<ScreenHit>> {
    let params = &set.params;
    let translate = params.is_protein();

    let (index, counts) = ReferenceIndex::build(&set.references);
    info!("   {} distinct hashes.", index.distinct_hashes());

    let verb = if translate {
        "Translating from"
    } else {
        "Streaming from"
    };
    if mixtures.len() == 1 {
        info!("{} {}...", verb, mixtures[0]);
    } else {
        info!("{} {} inputs...", verb, mixtures.len());
    }

    let summary = pipeline::stream_mixture(
        mixtures,
        params,
        translate,
        &counts,
        options.parallelism,
    )?;
    if summary.records == 0 {
        return Err(ScreenError::EmptyInput);
    }

    let set_size = summary.mixture.estimate_set_size();
    info!(
        "   Estimated distinct{} k-mers in mixture: {}",
        if translate { " (translated)" } else { "" },
        set_size
    );
    if set_size == 0 {
        warn!("no valid k-mers in input.");
    }

    info!("Summing shared hashes...");
    let mut shared = vec![0u64; set.references.len()];
    let mut depths = vec![Vec::<u32>::new(); set.references.len()];
    for (hash, count) in counts.iter() {
        if count >= options.min_coverage {
            for &i in index.get(hash).expect("counter keys mirror the index") {
                shared[i as usize] += 1;
                depths[i as usize].push(count);
            }
        }
    }

    if options.winner_take_all {
        reallocate_to_winners(set, &index, &counts, &mut shared, &mut depths, options);
    }

    info!("Computing coverage medians...");
    depths
        .par_iter_mut()
        .for_each(|depth| depth.sort_unstable());

    let kmer_space = params.kmer_space();
    let mut hits = Vec::new();
    for (i, reference) in set.references.iter().enumerate() {
        if shared[i] == 0 && options.identity_min >= 0.0 {
            continue;
        }
        let sketch_size = reference.hashes.len() as u64;
        let identity = estimate_identity(shared[i], sketch_size, params.kmer_length);
        if identity < options.identity_min {
            continue;
        }
        let pvalue = containment_pvalue(shared[i], set_size, kmer_space, sketch_size);
        if pvalue > options.pvalue_max {
            continue;
        }
        let median_multiplicity = if shared[i] > 0 {
            depths[i][(shared[i] / 2) as usize]
        } else {
            0
        };
        hits.push(ScreenHit {
            name: reference.name.clone(),
            comment: reference.comment.clone(),
            identity,
            shared: shared[i],
            sketch_size,
            median_multiplicity,
            pvalue,
        });
    }
    Ok(hits)
}

/// Reassign every observed sketch hash to the single best reference holding
/// it, scored by the identity of the first-pass counts. Ties break to the
/// longer reference, and a full tie (same score, same length) to the last
/// index in bucket order, which is pinned to ascending reference index.
fn reallocate_to_winners(
    set: &SketchSet,
    index: &ReferenceIndex,
    counts: &SharedHashCounts,
    shared: &mut [u64],
    depths: &mut [Vec<u32>],
    options: &ScreenOptions,
) {
    info!("Reallocating to winners...");

    let scores: Vec<f64> = set
        .references
        .iter()
        .zip(shared.iter())
        .map(|(reference, &count)| {
            estimate_identity(count, reference.hashes.len() as u64, set.params.kmer_length)
        })
        .collect();

    shared.fill(0);
    for depth in depths.iter_mut() {
        depth.clear();
    }

    for (hash, bucket) in index.iter() {
        let count = counts.get(hash).expect("counter keys mirror the index");
        if count < options.min_coverage {
            continue;
        }

        let mut winner = bucket[0] as usize;
        let mut best_score = scores[winner];
        let mut best_length = set.references[winner].seq_length;
        for &candidate in &bucket[1..] {
            let candidate = candidate as usize;
            let score = scores[candidate];
            let length = set.references[candidate].seq_length;
            if score > best_score || (score == best_score && length >= best_length) {
                winner = candidate;
                best_score = score;
                best_length = length;
            }
        }

        shared[winner] += 1;
        depths[winner].push(count);
    }
}
