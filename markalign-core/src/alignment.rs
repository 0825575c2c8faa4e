use crate::types::{MarkerWithOrdinal, OrientedReadId, OrientedReadPair, ReadId, Strand};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Bounds handed to the alignment primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignBounds {
    /// Maximum ordinal skip between consecutive aligned markers.
    pub max_skip: u32,
    /// Maximum difference between the ordinal skips on the two reads.
    pub max_drift: u32,
    /// K-mers occurring more often than this in either read are ignored.
    pub max_marker_frequency: u32,
}

impl Default for AlignBounds {
    fn default() -> Self {
        Self {
            max_skip: 30,
            max_drift: 30,
            max_marker_frequency: 10,
        }
    }
}

/// Matched ordinal pairs of a marker alignment, in increasing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    pub ordinals: Vec<[u32; 2]>,
}

impl Alignment {
    pub fn clear(&mut self) {
        self.ordinals.clear();
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// Position of an alignment on one of its two oriented reads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct AlignedSpan {
    /// Total markers in the oriented read.
    pub marker_count: u32,
    pub first_ordinal: u32,
    pub last_ordinal: u32,
}

impl AlignedSpan {
    /// Unaligned markers after the last aligned one.
    fn tail(&self) -> u32 {
        self.marker_count
            .saturating_sub(1)
            .saturating_sub(self.last_ordinal)
    }

    fn reverse_complement(&mut self) {
        let last = self.marker_count.saturating_sub(1);
        let first_ordinal = last - self.last_ordinal;
        let last_ordinal = last - self.first_ordinal;
        self.first_ordinal = first_ordinal;
        self.last_ordinal = last_ordinal;
    }
}

/// Summary of an alignment between two oriented reads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct AlignmentInfo {
    /// Number of aligned markers.
    pub marker_count: u32,
    pub data: [AlignedSpan; 2],
}

impl AlignmentInfo {
    pub fn new(alignment: &Alignment, marker_count0: u32, marker_count1: u32) -> Self {
        let (first, last) = match (alignment.ordinals.first(), alignment.ordinals.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => ([0, 0], [0, 0]),
        };
        Self {
            marker_count: alignment.ordinals.len() as u32,
            data: [
                AlignedSpan {
                    marker_count: marker_count0,
                    first_ordinal: first[0],
                    last_ordinal: last[0],
                },
                AlignedSpan {
                    marker_count: marker_count1,
                    first_ordinal: first[1],
                    last_ordinal: last[1],
                },
            ],
        }
    }

    pub fn left_trim(&self) -> u32 {
        self.data[0].first_ordinal.min(self.data[1].first_ordinal)
    }

    pub fn right_trim(&self) -> u32 {
        self.data[0].tail().min(self.data[1].tail())
    }

    /// `(left_trim, right_trim)`
    pub fn trim(&self) -> (u32, u32) {
        (self.left_trim(), self.right_trim())
    }

    /// Exchange the roles of the two reads.
    pub fn swap(&mut self) {
        self.data.swap(0, 1);
    }

    /// Re-express the alignment on the opposite strands of both reads.
    pub fn reverse_complement(&mut self) {
        for span in &mut self.data {
            span.reverse_complement();
        }
    }

    /// Ordinal offset of read 1 relative to read 0 at the start of the alignment.
    pub fn ordinal_offset(&self) -> i64 {
        i64::from(self.data[0].first_ordinal) - i64::from(self.data[1].first_ordinal)
    }

    /// Number of markers spanned by the alignment on one side.
    pub fn aligned_extent(&self, side: usize) -> u32 {
        if self.marker_count == 0 {
            return 0;
        }
        self.data[side].last_ordinal - self.data[side].first_ordinal + 1
    }
}

/// Canonical record of an accepted alignment. `read_ids[0] < read_ids[1]`,
/// read 0 implicitly on the forward strand and read 1 on the strand given by
/// the same-strand flag; `info` is expressed in that frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct AlignmentData {
    pub read_ids: [ReadId; 2],
    same_strand: u32,
    pub info: AlignmentInfo,
}

impl AlignmentData {
    pub fn new(candidate: &OrientedReadPair, info: AlignmentInfo) -> Self {
        assert!(
            candidate.is_canonical(),
            "alignment candidate {} {} is not in canonical order",
            candidate.read_ids[0],
            candidate.read_ids[1]
        );
        Self {
            read_ids: candidate.read_ids,
            same_strand: u32::from(candidate.is_same_strand),
            info,
        }
    }

    pub fn is_same_strand(&self) -> bool {
        self.same_strand != 0
    }

    pub fn candidate(&self) -> OrientedReadPair {
        OrientedReadPair::new(self.read_ids[0], self.read_ids[1], self.is_same_strand())
    }

    /// The oriented reads the stored `info` refers to.
    pub fn oriented_read_ids(&self) -> [OrientedReadId; 2] {
        self.candidate().oriented_read_ids()
    }

    /// The partner of `oriented_read_id` in this alignment, on the strand
    /// consistent with it.
    pub fn other(&self, oriented_read_id: OrientedReadId) -> OrientedReadId {
        let flip = if self.is_same_strand() { 0 } else { 1 };
        let strand = u32::from(oriented_read_id.strand()) ^ flip;
        let read_id = oriented_read_id.read_id();
        if read_id == self.read_ids[0] {
            OrientedReadId::new(self.read_ids[1], Strand::from(strand))
        } else {
            assert_eq!(
                read_id, self.read_ids[1],
                "read {} is not part of this alignment",
                read_id
            );
            OrientedReadId::new(self.read_ids[0], Strand::from(strand))
        }
    }
}

/// The alignment primitive: aligns two marker views under the given bounds.
///
/// Implementations keep their working memory in `Scratch`, one instance per
/// worker, reused across calls.
pub trait Aligner: Sync {
    type Scratch: Default + Send;

    /// Align `markers[0]` against `markers[1]` (each sorted by k-mer id),
    /// writing the matched ordinal pairs to `alignment` and returning their
    /// summary.
    fn align(
        &self,
        markers: [&[MarkerWithOrdinal]; 2],
        bounds: &AlignBounds,
        scratch: &mut Self::Scratch,
        alignment: &mut Alignment,
    ) -> AlignmentInfo;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn info(n0: u32, first0: u32, last0: u32, n1: u32, first1: u32, last1: u32) -> AlignmentInfo {
        AlignmentInfo {
            marker_count: (last0 - first0 + 1).min(last1 - first1 + 1),
            data: [
                AlignedSpan {
                    marker_count: n0,
                    first_ordinal: first0,
                    last_ordinal: last0,
                },
                AlignedSpan {
                    marker_count: n1,
                    first_ordinal: first1,
                    last_ordinal: last1,
                },
            ],
        }
    }

    #[test]
    fn test_info_from_alignment() {
        let alignment = Alignment {
            ordinals: vec![[2, 5], [3, 6], [10, 12]],
        };
        let info = AlignmentInfo::new(&alignment, 15, 20);
        assert_eq!(info.marker_count, 3);
        assert_eq!(info.data[0].first_ordinal, 2);
        assert_eq!(info.data[1].last_ordinal, 12);
        // left = min(2, 5), right = min(14 - 10, 19 - 12)
        assert_eq!(info.trim(), (2, 4));
        assert_eq!(info.ordinal_offset(), -3);
        assert_eq!(info.aligned_extent(0), 9);
        assert_eq!(info.aligned_extent(1), 8);
    }

    #[test]
    fn test_reverse_complement_mirrors_trim() {
        let mut info = info(55, 2, 51, 59, 5, 54);
        assert_eq!(info.trim(), (2, 3));
        info.reverse_complement();
        assert_eq!(info.data[0].first_ordinal, 3);
        assert_eq!(info.data[0].last_ordinal, 52);
        assert_eq!(info.data[1].first_ordinal, 4);
        assert_eq!(info.data[1].last_ordinal, 53);
        assert_eq!(info.trim(), (3, 2));
    }

    #[test]
    fn test_other_partner_orientation() {
        let same = AlignmentData::new(&OrientedReadPair::new(3, 8, true), AlignmentInfo::default());
        let fwd3 = OrientedReadId::new(3, Strand::Forward);
        let rev8 = OrientedReadId::new(8, Strand::Reverse);
        assert_eq!(same.other(fwd3), OrientedReadId::new(8, Strand::Forward));
        assert_eq!(same.other(rev8), OrientedReadId::new(3, Strand::Reverse));

        let opposite =
            AlignmentData::new(&OrientedReadPair::new(3, 8, false), AlignmentInfo::default());
        assert_eq!(opposite.other(fwd3), OrientedReadId::new(8, Strand::Reverse));
        assert_eq!(opposite.other(rev8), OrientedReadId::new(3, Strand::Forward));
        assert_eq!(
            opposite.oriented_read_ids(),
            [fwd3, OrientedReadId::new(8, Strand::Reverse)]
        );
    }

    #[test]
    #[should_panic(expected = "canonical")]
    fn test_non_canonical_record_panics() {
        AlignmentData::new(&OrientedReadPair::new(8, 3, true), AlignmentInfo::default());
    }

    #[test]
    fn test_record_layout_is_packed() {
        assert_eq!(std::mem::size_of::<AlignmentInfo>(), 28);
        assert_eq!(std::mem::size_of::<AlignmentData>(), 40);
    }

    fn arb_info() -> impl Strategy<Value = AlignmentInfo> {
        (1u32..500, 1u32..500)
            .prop_flat_map(|(n0, n1)| (Just(n0), 0..n0, 0..n0, Just(n1), 0..n1, 0..n1))
            .prop_map(|(n0, a0, b0, n1, a1, b1)| {
                info(n0, a0.min(b0), a0.max(b0), n1, a1.min(b1), a1.max(b1))
            })
    }

    proptest! {
        #[test]
        fn prop_swap_twice_is_identity(original in arb_info()) {
            let mut info = original;
            info.swap();
            info.swap();
            prop_assert_eq!(info, original);
        }

        #[test]
        fn prop_reverse_complement_twice_is_identity(original in arb_info()) {
            let mut info = original;
            info.reverse_complement();
            info.reverse_complement();
            prop_assert_eq!(info, original);
        }

        #[test]
        fn prop_reverse_complement_exchanges_trims(original in arb_info()) {
            let mut info = original;
            info.reverse_complement();
            prop_assert_eq!(info.trim(), (original.right_trim(), original.left_trim()));
            prop_assert_eq!(info.marker_count, original.marker_count);
        }

        #[test]
        fn prop_swap_preserves_trims(original in arb_info()) {
            let mut info = original;
            info.swap();
            prop_assert_eq!(info.trim(), original.trim());
            prop_assert_eq!(info.ordinal_offset(), -original.ordinal_offset());
        }
    }
}
