use std::io;
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use needletail::parser::FastxReader;
use needletail::{parse_fastx_file, parse_fastx_reader};

use crate::errors::ScreenResult;
use crate::{bail, format_err};
use crate::kmers::scan_chunk;
use crate::minhash::MinHashHeap;
use crate::screen::index::SharedHashCounts;
use crate::sketch::SketchParams;

/// Target chunk size handed to one hashing task. Records are separated by a
/// `*` sentinel inside a chunk so windows cannot straddle them.
const CHUNK_TARGET: usize = 1 << 20;

#[derive(Debug)]
pub struct StreamSummary {
    /// Sequence records read across all inputs, including records too short
    /// to contribute any k-mer.
    pub records: u64,
    /// Global bottom-k over every mixture k-mer, merged from the worker
    /// heaps; source of the distinct set-size estimate.
    pub mixture: MinHashHeap,
}

struct HashTask {
    chunk: Vec<u8>,
    heap: MinHashHeap,
}

/// Stream all mixture inputs through the hashing workers.
///
/// One producer (the calling thread) round-robins over the inputs, one
/// record per file per turn, assembling `*`-separated chunks; `parallelism`
/// workers uppercase, window, and hash each chunk into a borrowed bottom-k
/// heap while bumping the shared counters. Heaps are pooled and reused
/// across tasks, and merged into one global heap once every input is
/// drained.
pub fn stream_mixture(
    inputs: &[String],
    params: &SketchParams,
    translate: bool,
    counts: &SharedHashCounts,
    parallelism: usize,
) -> ScreenResult<StreamSummary> {
    let parallelism = parallelism.max(1);
    let alphabet = params.alphabet_lookup();

    let (task_tx, task_rx) = bounded::<HashTask>(parallelism);
    let (done_tx, done_rx) = unbounded::<MinHashHeap>();

    thread::scope(|scope| -> ScreenResult<StreamSummary> {
        let mut workers = Vec::with_capacity(parallelism);
        for _ in 0..parallelism {
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();
            let alphabet = &alphabet;
            workers.push(scope.spawn(move || {
                while let Ok(mut task) = task_rx.recv() {
                    scan_chunk(&mut task.chunk, params, translate, alphabet, |hash| {
                        task.heap.try_insert(hash);
                        counts.observe(hash);
                    });
                    if done_tx.send(task.heap).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(task_rx);
        drop(done_tx);

        let produced = produce_chunks(inputs, params, task_tx, &done_rx);

        for worker in workers {
            if worker.join().is_err() {
                return Err(format_err!("hashing worker panicked"));
            }
        }
        let (records, mut heaps) = produced?;

        while let Ok(heap) = done_rx.recv() {
            heaps.push(heap);
        }

        let mut mixture = MinHashHeap::new(params.use64, params.sketch_size);
        for heap in &heaps {
            mixture.merge_from(heap);
        }
        Ok(StreamSummary { records, mixture })
    })
}

/// Round-robin over the inputs, one record per open file per turn, dropping
/// files as they reach EOF. Returns the record count and the producer-side
/// heap pool.
fn produce_chunks(
    inputs: &[String],
    params: &SketchParams,
    task_tx: Sender<HashTask>,
    done_rx: &Receiver<MinHashHeap>,
) -> ScreenResult<(u64, Vec<MinHashHeap>)> {
    let mut readers = open_readers(inputs)?;
    let k = usize::from(params.kmer_length);

    let mut chunk: Vec<u8> = Vec::with_capacity(CHUNK_TARGET + 1024);
    let mut pool: Vec<MinHashHeap> = Vec::new();
    let mut records = 0u64;
    let mut current = 0usize;

    while !readers.is_empty() {
        let mut reached_eof = false;
        match readers[current].next() {
            Some(Ok(record)) => {
                records += 1;
                let seq = record.seq();
                if seq.len() >= k {
                    if !chunk.is_empty() && chunk.len() + seq.len() + 1 > CHUNK_TARGET {
                        dispatch(&mut chunk, &mut pool, params, &task_tx, done_rx)?;
                    }
                    chunk.push(b'*');
                    chunk.extend_from_slice(&seq);
                }
                current += 1;
            }
            Some(Err(err)) => return Err(err.into()),
            None => reached_eof = true,
        }
        if reached_eof {
            // the next file shifts into this slot, keeping the rotation
            readers.remove(current);
        }
        if current >= readers.len() {
            current = 0;
        }
    }

    if !chunk.is_empty() {
        dispatch(&mut chunk, &mut pool, params, &task_tx, done_rx)?;
    }
    Ok((records, pool))
}

fn dispatch(
    chunk: &mut Vec<u8>,
    pool: &mut Vec<MinHashHeap>,
    params: &SketchParams,
    task_tx: &Sender<HashTask>,
    done_rx: &Receiver<MinHashHeap>,
) -> ScreenResult<()> {
    // recover any heaps the workers have finished with
    while let Ok(heap) = done_rx.try_recv() {
        pool.push(heap);
    }
    let heap = pool
        .pop()
        .unwrap_or_else(|| MinHashHeap::new(params.use64, params.sketch_size));

    let task = HashTask {
        chunk: std::mem::replace(chunk, Vec::with_capacity(CHUNK_TARGET + 1024)),
        heap,
    };
    task_tx
        .send(task)
        .map_err(|_| format_err!("hashing workers exited early"))
}

fn open_readers(inputs: &[String]) -> ScreenResult<Vec<Box<dyn FastxReader>>> {
    let mut readers: Vec<Box<dyn FastxReader>> = Vec::with_capacity(inputs.len());
    for (position, input) in inputs.iter().enumerate() {
        if input == "-" {
            if position != 0 {
                bail!("'-' for stdin must be the first mixture argument");
            }
            readers.push(parse_fastx_reader(io::stdin())?);
        } else {
            readers.push(parse_fastx_file(input)?);
        }
    }
    Ok(readers)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::screen::index::ReferenceIndex;
    use crate::sketch::ALPHABET_NUCLEOTIDE;

    fn params() -> SketchParams {
        SketchParams {
            kmer_length: 3,
            sketch_size: 5,
            hash_seed: 42,
            use64: false,
            canonical: true,
            preserve_case: false,
            alphabet: ALPHABET_NUCLEOTIDE.to_string(),
        }
    }

    fn fasta_file(dir: &tempfile::TempDir, name: &str, records: &[&str]) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for (i, seq) in records.iter().enumerate() {
            writeln!(file, ">r{}", i).unwrap();
            writeln!(file, "{}", seq).unwrap();
        }
        path.to_string_lossy().to_string()
    }

    fn empty_counts() -> SharedHashCounts {
        let (_, counts) = ReferenceIndex::build(&[]);
        counts
    }

    #[test]
    fn test_counts_records_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = fasta_file(&dir, "a.fa", &["ACGTACGT", "TTTT"]);
        let b = fasta_file(&dir, "b.fa", &["GGGCCC"]);
        let counts = empty_counts();

        let summary = stream_mixture(&[a, b], &params(), false, &counts, 2).unwrap();
        assert_eq!(summary.records, 3);
        assert!(!summary.mixture.is_empty());
    }

    #[test]
    fn test_short_records_still_count() {
        let dir = tempfile::tempdir().unwrap();
        let a = fasta_file(&dir, "a.fa", &["AC", "N"]);
        let counts = empty_counts();

        let summary = stream_mixture(&[a], &params(), false, &counts, 1).unwrap();
        assert_eq!(summary.records, 2);
        assert!(summary.mixture.is_empty());
        assert_eq!(summary.mixture.estimate_set_size(), 0);
    }

    #[test]
    fn test_stdin_must_be_first() {
        let dir = tempfile::tempdir().unwrap();
        let a = fasta_file(&dir, "a.fa", &["ACGTACGT"]);
        let counts = empty_counts();

        let err = stream_mixture(
            &[a, "-".to_string()],
            &params(),
            false,
            &counts,
            1,
        )
        .unwrap_err();
        assert!(err.to_string().contains("first mixture argument"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let counts = empty_counts();
        assert!(stream_mixture(
            &["/nonexistent/mixture.fa".to_string()],
            &params(),
            false,
            &counts,
            1,
        )
        .is_err());
    }

    #[test]
    fn test_chunking_does_not_change_the_merged_heap() {
        // the same records through one worker and through four workers give
        // the same bottom-k
        let dir = tempfile::tempdir().unwrap();
        let seqs: Vec<String> = (0..40)
            .map(|i| {
                let bases = [b'A', b'C', b'G', b'T'];
                (0..50)
                    .map(|j| bases[(i * 7 + j * 3) % 4] as char)
                    .collect()
            })
            .collect();
        let refs: Vec<&str> = seqs.iter().map(String::as_str).collect();
        let path = fasta_file(&dir, "mix.fa", &refs);

        let counts = empty_counts();
        let single = stream_mixture(&[path.clone()], &params(), false, &counts, 1).unwrap();
        let many = stream_mixture(&[path], &params(), false, &counts, 4).unwrap();
        assert_eq!(
            single.mixture.to_sorted_vec(),
            many.mixture.to_sorted_vec()
        );
    }
}
