//! Chaining aligner for marker sequences
//!
//! Reference alignment primitive. Shared k-mers of the two reads give
//! candidate ordinal pairs; a dynamic programme then picks the longest chain
//! of pairs in which both ordinals increase, each step skips at most
//! `max_skip` markers and the two skips differ by at most `max_drift`.

use crate::alignment::{AlignBounds, Aligner, Alignment, AlignmentInfo};
use crate::types::MarkerWithOrdinal;

const NO_PARENT: u32 = u32::MAX;

/// Working memory of one chaining worker.
#[derive(Debug, Default)]
pub struct ChainScratch {
    pairs: Vec<[u32; 2]>,
    score: Vec<u32>,
    parent: Vec<u32>,
}

/// Longest-chain marker aligner.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerChainer;

impl MarkerChainer {
    pub fn new() -> Self {
        Self
    }

    /// Collect ordinal pairs of shared k-mers, skipping k-mers that are too
    /// frequent in either read.
    fn collect_pairs(
        markers0: &[MarkerWithOrdinal],
        markers1: &[MarkerWithOrdinal],
        max_marker_frequency: u32,
        pairs: &mut Vec<[u32; 2]>,
    ) {
        pairs.clear();
        let (mut i0, mut i1) = (0usize, 0usize);
        while i0 < markers0.len() && i1 < markers1.len() {
            let kmer0 = markers0[i0].kmer_id;
            let kmer1 = markers1[i1].kmer_id;
            if kmer0 < kmer1 {
                i0 += 1;
            } else if kmer1 < kmer0 {
                i1 += 1;
            } else {
                // Streaks of this k-mer in both reads.
                let end0 = i0 + markers0[i0..].iter().take_while(|m| m.kmer_id == kmer0).count();
                let end1 = i1 + markers1[i1..].iter().take_while(|m| m.kmer_id == kmer0).count();
                let frequent = (end0 - i0) as u32 > max_marker_frequency
                    || (end1 - i1) as u32 > max_marker_frequency;
                if !frequent {
                    for m0 in &markers0[i0..end0] {
                        for m1 in &markers1[i1..end1] {
                            pairs.push([m0.ordinal, m1.ordinal]);
                        }
                    }
                }
                i0 = end0;
                i1 = end1;
            }
        }
        pairs.sort_unstable();
    }

    /// Check if pair `j` may directly follow pair `i` in a chain.
    fn can_link(previous: [u32; 2], next: [u32; 2], bounds: &AlignBounds) -> bool {
        if next[0] <= previous[0] || next[1] <= previous[1] {
            return false;
        }
        let skip0 = next[0] - previous[0];
        let skip1 = next[1] - previous[1];
        if skip0 > bounds.max_skip || skip1 > bounds.max_skip {
            return false;
        }
        skip0.abs_diff(skip1) <= bounds.max_drift
    }
}

impl Aligner for MarkerChainer {
    type Scratch = ChainScratch;

    fn align(
        &self,
        markers: [&[MarkerWithOrdinal]; 2],
        bounds: &AlignBounds,
        scratch: &mut ChainScratch,
        alignment: &mut Alignment,
    ) -> AlignmentInfo {
        alignment.clear();
        let ChainScratch {
            pairs,
            score,
            parent,
        } = scratch;

        Self::collect_pairs(markers[0], markers[1], bounds.max_marker_frequency, pairs);
        let n = pairs.len();
        score.clear();
        score.resize(n, 1);
        parent.clear();
        parent.resize(n, NO_PARENT);

        // Pairs are sorted by first ordinal, so predecessors more than
        // max_skip behind on read 0 end the scan.
        for j in 0..n {
            for i in (0..j).rev() {
                if pairs[j][0] - pairs[i][0] > bounds.max_skip {
                    break;
                }
                if !Self::can_link(pairs[i], pairs[j], bounds) {
                    continue;
                }
                if score[i] + 1 > score[j] || (score[i] + 1 == score[j] && (i as u32) < parent[j]) {
                    score[j] = score[i] + 1;
                    parent[j] = i as u32;
                }
            }
        }

        let mut best: Option<usize> = None;
        for j in 0..n {
            if best.map_or(true, |b| score[j] > score[b]) {
                best = Some(j);
            }
        }

        if let Some(end) = best {
            let mut current = end as u32;
            while current != NO_PARENT {
                alignment.ordinals.push(pairs[current as usize]);
                current = parent[current as usize];
            }
            alignment.ordinals.reverse();
        }

        log::trace!(
            "{} shared ordinal pairs, {} aligned markers",
            n,
            alignment.ordinals.len()
        );

        AlignmentInfo::new(alignment, markers[0].len() as u32, markers[1].len() as u32)
    }

    fn name(&self) -> &'static str {
        "marker-chain"
    }
}
