use crate::hashing::{canonical, hash_kmer, reverse_complement, ItemHash};
use crate::sketch::SketchParams;
use crate::translation::{translate_frame, STOP};

/// Stream every valid k-mer hash out of one chunk of `*`-separated sequence
/// records.
///
/// The chunk is uppercased in place first (unless the sketch preserves
/// case). In nucleotide mode a single pass slides a window of size k over
/// the chunk, restarting past any byte outside the alphabet, and hashes the
/// canonical form of each surviving window. In translated mode the chunk's
/// reverse complement is taken once, all six (strand, frame) translations
/// are scanned the same way with the stop residue as the invalid byte, and
/// windows are hashed as-is.
///
/// The `*` separators between records are outside both alphabets, so no
/// window ever straddles two records.
pub fn scan_chunk<F>(
    chunk: &mut [u8],
    params: &SketchParams,
    translate: bool,
    alphabet: &[bool; 256],
    mut emit: F,
) where
    F: FnMut(ItemHash),
{
    let k = params.kmer_length as usize;
    if k == 0 {
        return;
    }

    if !params.preserve_case {
        chunk.make_ascii_uppercase();
    }
    let seq: &[u8] = chunk;

    let seq_rc = if params.canonical || translate {
        reverse_complement(seq)
    } else {
        Vec::new()
    };

    let frames: usize = if translate { 6 } else { 1 };
    let mut residues = Vec::new();
    for strand_frame in 0..frames {
        let frame = strand_frame % 3;
        let reverse = strand_frame > 2;

        let window: &[u8] = if translate {
            let strand: &[u8] = if reverse { &seq_rc } else { seq };
            translate_frame(strand, frame, &mut residues);
            &residues
        } else {
            seq
        };

        let length = window.len();
        if length < k {
            continue;
        }

        // `last_good` is the rightmost fully validated index; a bad byte
        // jumps the window start past it.
        let mut last_good: i64 = -1;
        let mut start = 0usize;
        while start + k <= length {
            while last_good < (start + k - 1) as i64 && last_good + 1 < length as i64 {
                last_good += 1;
                let at = last_good as usize;
                let bad = if translate {
                    window[at] == STOP
                } else {
                    !alphabet[window[at] as usize]
                };
                if bad {
                    start = at + 1;
                }
            }
            if start + k > length {
                break;
            }

            let kmer = if translate || !params.canonical {
                &window[start..start + k]
            } else {
                canonical(
                    &window[start..start + k],
                    &seq_rc[length - start - k..length - start],
                )
            };
            emit(hash_kmer(kmer, params.hash_seed, params.use64));
            start += 1;
        }
    }
}
