//! Marker views of oriented reads
//!
//! The core only needs, for any oriented read, its markers sorted by k-mer
//! id. `MarkerStore` keeps the forward-strand k-mer ids of every read and
//! derives the reverse strand on demand.

use crate::containers::VectorOfVectors;
use crate::types::{KmerId, MarkerWithOrdinal, OrientedReadId, ReadId, Strand};

/// Largest k for which a k-mer id fits the 2-bit encoding in a `KmerId`.
pub const MAX_K: usize = 16;

/// Provider of per-read marker views. Shared read-only across workers.
pub trait MarkerSource: Sync {
    fn read_count(&self) -> ReadId;

    /// Number of markers of a read (identical on both strands).
    fn marker_count(&self, read_id: ReadId) -> usize;

    /// Fill `markers` with the markers of `oriented_read_id`, sorted by
    /// k-mer id then ordinal. Any previous content is discarded.
    fn markers_sorted_by_kmer_id(
        &self,
        oriented_read_id: OrientedReadId,
        markers: &mut Vec<MarkerWithOrdinal>,
    );
}

/// Reverse complement of a k-mer id in the 2-bit encoding (A=0, C=1, G=2, T=3,
/// first base in the most significant position).
pub fn reverse_complement_kmer(kmer_id: KmerId, k: usize) -> KmerId {
    let mut forward = kmer_id;
    let mut reverse: KmerId = 0;
    for _ in 0..k {
        reverse = (reverse << 2) | (3 - (forward & 3));
        forward >>= 2;
    }
    reverse
}

/// In-memory marker store holding forward-strand k-mer ids per read.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    k: usize,
    kmer_ids: VectorOfVectors<KmerId>,
}

impl MarkerStore {
    pub fn new(k: usize) -> Self {
        assert!(k > 0 && k <= MAX_K, "k must be in 1..={}", MAX_K);
        Self {
            k,
            kmer_ids: VectorOfVectors::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Add the next read and return its id.
    pub fn push_read(&mut self, kmer_ids: &[KmerId]) -> ReadId {
        self.kmer_ids.push_section(kmer_ids) as ReadId
    }

    pub fn total_marker_count(&self) -> usize {
        self.kmer_ids.total_size()
    }

    /// K-mer ids of an oriented read in ordinal order.
    pub fn oriented_kmer_ids(&self, oriented_read_id: OrientedReadId) -> Vec<KmerId> {
        let forward = self.kmer_ids.get(oriented_read_id.read_id() as usize);
        match oriented_read_id.strand() {
            Strand::Forward => forward.to_vec(),
            Strand::Reverse => forward
                .iter()
                .rev()
                .map(|&kmer_id| reverse_complement_kmer(kmer_id, self.k))
                .collect(),
        }
    }
}

impl MarkerSource for MarkerStore {
    fn read_count(&self) -> ReadId {
        self.kmer_ids.len() as ReadId
    }

    fn marker_count(&self, read_id: ReadId) -> usize {
        self.kmer_ids.section_len(read_id as usize)
    }

    fn markers_sorted_by_kmer_id(
        &self,
        oriented_read_id: OrientedReadId,
        markers: &mut Vec<MarkerWithOrdinal>,
    ) {
        let forward = self.kmer_ids.get(oriented_read_id.read_id() as usize);
        let n = forward.len();
        markers.clear();
        match oriented_read_id.strand() {
            Strand::Forward => {
                markers.extend(forward.iter().enumerate().map(|(ordinal, &kmer_id)| {
                    MarkerWithOrdinal {
                        kmer_id,
                        ordinal: ordinal as u32,
                    }
                }));
            }
            Strand::Reverse => {
                // Ordinal i on the reverse strand is ordinal n-1-i on the forward strand.
                markers.extend(forward.iter().enumerate().map(|(ordinal, &kmer_id)| {
                    MarkerWithOrdinal {
                        kmer_id: reverse_complement_kmer(kmer_id, self.k),
                        ordinal: (n - 1 - ordinal) as u32,
                    }
                }));
            }
        }
        markers.sort_unstable();
    }
}
