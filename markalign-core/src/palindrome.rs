//! Detection of self-palindromic reads
//!
//! Every read is aligned against its own reverse complement. A read is
//! palindromic when enough of its markers align and enough of the aligned
//! markers sit close to the diagonal.

use crate::alignment::{AlignBounds, Aligner, Alignment};
use crate::batch::{build_pool, resolve_thread_count, BatchQueue};
use crate::error::{PipelineError, PipelineResult};
use crate::markers::MarkerSource;
use crate::progress::ProgressReporter;
use crate::types::{MarkerWithOrdinal, OrientedReadId, ReadFlags, ReadId, Strand};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

pub const PALINDROMIC_READS_CSV: &str = "PalindromicReads.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalindromeParams {
    pub max_skip: u32,
    pub max_drift: u32,
    pub max_marker_frequency: u32,
    /// Minimum aligned markers over markers in the read.
    pub aligned_fraction_threshold: f64,
    /// Minimum near-diagonal aligned markers over markers in the read.
    pub near_diagonal_fraction_threshold: f64,
    /// Aligned pairs with `|ordinal0 - ordinal1|` below this are near-diagonal.
    pub delta_threshold: u32,
    pub thread_count: usize,
    pub batch_size: u64,
}

impl Default for PalindromeParams {
    fn default() -> Self {
        Self {
            max_skip: 100,
            max_drift: 100,
            max_marker_frequency: 10,
            aligned_fraction_threshold: 0.1,
            near_diagonal_fraction_threshold: 0.1,
            delta_threshold: 100,
            thread_count: 0,
            batch_size: 1000,
        }
    }
}

impl PalindromeParams {
    pub fn bounds(&self) -> AlignBounds {
        AlignBounds {
            max_skip: self.max_skip,
            max_drift: self.max_drift,
            max_marker_frequency: self.max_marker_frequency,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        for (name, value) in [
            ("aligned_fraction_threshold", self.aligned_fraction_threshold),
            ("near_diagonal_fraction_threshold", self.near_diagonal_fraction_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::InvalidParams(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidParams(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PalindromeSummary {
    pub read_count: u64,
    pub palindromic_read_count: u64,
    pub palindromic_fraction: f64,
    pub elapsed_seconds: f64,
}

/// Classify the alignment of a read against its reverse complement.
/// Both fractions are taken over the markers of the read.
pub fn is_palindromic_alignment(
    alignment: &Alignment,
    marker_count: usize,
    params: &PalindromeParams,
) -> bool {
    if marker_count == 0 {
        return false;
    }
    let total = marker_count as f64;

    let aligned_fraction = alignment.len() as f64 / total;
    if aligned_fraction < params.aligned_fraction_threshold {
        return false;
    }

    let near_diagonal = alignment
        .ordinals
        .iter()
        .filter(|[ordinal0, ordinal1]| ordinal0.abs_diff(*ordinal1) < params.delta_threshold)
        .count();
    near_diagonal as f64 / total >= params.near_diagonal_fraction_threshold
}

/// Flag every palindromic read. `read_flags` is resized to the read count
/// and its palindromic bits are recomputed; other bits are left alone.
pub fn flag_palindromic_reads<M, A>(
    markers: &M,
    aligner: &A,
    params: &PalindromeParams,
    read_flags: &mut Vec<ReadFlags>,
    progress: &dyn ProgressReporter,
) -> PipelineResult<PalindromeSummary>
where
    M: MarkerSource,
    A: Aligner,
{
    let start = Instant::now();
    params.validate()?;
    log::info!("Finding palindromic reads");

    let read_count = markers.read_count();
    read_flags.resize(read_count as usize, ReadFlags::default());
    for flags in read_flags.iter_mut() {
        flags.set_palindromic(false);
    }

    let thread_count = resolve_thread_count(params.thread_count);
    let pool = build_pool(thread_count)?;
    let queue = BatchQueue::new(u64::from(read_count), params.batch_size);
    let bounds = params.bounds();
    progress.start("Flagging palindromic reads", u64::from(read_count));

    let hits: Vec<Vec<ReadId>> = pool.broadcast(|_| {
        let mut hits = Vec::new();
        let mut views: [Vec<MarkerWithOrdinal>; 2] = [Vec::new(), Vec::new()];
        let mut scratch = A::Scratch::default();
        let mut alignment = Alignment::default();

        while let Some(batch) = queue.next_batch() {
            progress.advance(batch.start, batch.end);
            for read_id in batch.start as ReadId..batch.end as ReadId {
                markers.markers_sorted_by_kmer_id(
                    OrientedReadId::new(read_id, Strand::Forward),
                    &mut views[0],
                );
                markers.markers_sorted_by_kmer_id(
                    OrientedReadId::new(read_id, Strand::Reverse),
                    &mut views[1],
                );
                aligner.align(
                    [&views[0][..], &views[1][..]],
                    &bounds,
                    &mut scratch,
                    &mut alignment,
                );
                if is_palindromic_alignment(&alignment, views[0].len(), params) {
                    log::debug!("Read {} is palindromic", read_id);
                    hits.push(read_id);
                }
            }
        }
        hits
    });
    progress.finish();

    let mut palindromic_read_count = 0u64;
    for read_id in hits.into_iter().flatten() {
        read_flags[read_id as usize].set_palindromic(true);
        palindromic_read_count += 1;
    }

    let palindromic_fraction = if read_count == 0 {
        0.0
    } else {
        palindromic_read_count as f64 / f64::from(read_count)
    };
    log::info!(
        "Flagged {} reads as palindromic out of {} total",
        palindromic_read_count,
        read_count
    );
    log::info!("Palindromic fraction is {}", palindromic_fraction);

    Ok(PalindromeSummary {
        read_count: u64::from(read_count),
        palindromic_read_count,
        palindromic_fraction,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    })
}

/// Write the ids of palindromic reads, one per line in ascending order.
/// Returns the number of ids written.
pub fn write_palindromic_reads_csv<P: AsRef<Path>>(
    path: P,
    read_flags: &[ReadFlags],
) -> std::io::Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0;
    for (read_id, flags) in read_flags.iter().enumerate() {
        if flags.is_palindromic() {
            writeln!(writer, "{}", read_id)?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MarkerChainer;
    use crate::markers::{reverse_complement_kmer, MarkerStore};
    use crate::progress::NoProgress;

    const K: usize = 8;

    fn palindrome(kmers: &[u32]) -> Vec<u32> {
        let mut read = kmers.to_vec();
        read.extend(kmers.iter().rev().map(|&kmer| reverse_complement_kmer(kmer, K)));
        read
    }

    fn params(aligned: f64, near_diagonal: f64, delta: u32) -> PalindromeParams {
        PalindromeParams {
            aligned_fraction_threshold: aligned,
            near_diagonal_fraction_threshold: near_diagonal,
            delta_threshold: delta,
            thread_count: 2,
            batch_size: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_palindrome_is_flagged() {
        let mut markers = MarkerStore::new(K);
        markers.push_read(&[1, 2, 3, 4, 5, 6]);
        markers.push_read(&palindrome(&[1, 2, 3]));
        markers.push_read(&[]);

        let mut flags = vec![ReadFlags::default(); 1];
        let summary = flag_palindromic_reads(
            &markers,
            &MarkerChainer::new(),
            &params(0.9, 0.9, 1),
            &mut flags,
            &NoProgress,
        )
        .unwrap();

        assert_eq!(flags.len(), 3);
        assert!(!flags[0].is_palindromic());
        assert!(flags[1].is_palindromic());
        assert!(!flags[2].is_palindromic());
        assert_eq!(summary.palindromic_read_count, 1);
        assert_eq!(summary.read_count, 3);
    }

    #[test]
    fn test_aligned_fraction_boundary() {
        // Six palindromic markers followed by four unrelated ones:
        // 6 of 10 markers align, each 4 ordinals off the diagonal.
        let mut read = palindrome(&[1, 2, 3]);
        read.extend_from_slice(&[10, 11, 12, 13]);
        let mut markers = MarkerStore::new(K);
        markers.push_read(&read);

        let run = |p: PalindromeParams| {
            let mut flags = Vec::new();
            flag_palindromic_reads(&markers, &MarkerChainer::new(), &p, &mut flags, &NoProgress)
                .unwrap();
            flags[0].is_palindromic()
        };

        assert!(run(params(0.6, 0.6, 5)));
        assert!(!run(params(0.61, 0.6, 5)));
        // Same alignment, but no aligned pair is near the diagonal.
        assert!(!run(params(0.6, 0.6, 4)));
    }

    #[test]
    fn test_flags_are_reset() {
        let mut markers = MarkerStore::new(K);
        markers.push_read(&[1, 2, 3]);
        let mut flags = vec![ReadFlags::default()];
        flags[0].set_palindromic(true);
        flag_palindromic_reads(
            &markers,
            &MarkerChainer::new(),
            &params(0.5, 0.5, 10),
            &mut flags,
            &NoProgress,
        )
        .unwrap();
        assert!(!flags[0].is_palindromic());
    }

    #[test]
    fn test_threshold_outside_unit_interval_is_invalid() {
        assert!(params(1.5, 0.1, 10).validate().is_err());
        assert!(params(0.1, -0.1, 10).validate().is_err());
        assert!(params(f64::NAN, 0.1, 10).validate().is_err());
        assert!(params(0.0, 1.0, 10).validate().is_ok());
    }

    #[test]
    fn test_zero_marker_read_is_not_palindromic() {
        assert!(!is_palindromic_alignment(&Alignment::default(), 0, &params(0.0, 0.0, 1)));
    }

    #[test]
    fn test_csv_lists_palindromic_reads() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PALINDROMIC_READS_CSV);
        let mut flags = vec![ReadFlags::default(); 6];
        flags[4].set_palindromic(true);
        flags[1].set_palindromic(true);
        assert_eq!(write_palindromic_reads_csv(&path, &flags)?, 2);
        assert_eq!(std::fs::read_to_string(&path)?, "1\n4\n");
        Ok(())
    }
}
