//! Orientation reconstruction at query time

use crate::alignment::{AlignmentData, AlignmentInfo};
use crate::index::TableView;
use crate::types::OrientedReadId;

/// Express a canonical record from the point of view of `oriented_read_id0`,
/// which must be one of the oriented forms of its reads. Returns the partner
/// and the alignment summary in that frame.
pub fn reorient(
    record: &AlignmentData,
    oriented_read_id0: OrientedReadId,
) -> (OrientedReadId, AlignmentInfo) {
    let [mut candidate0, mut candidate1] = record.oriented_read_ids();
    let mut info = record.info;

    if candidate0.read_id() != oriented_read_id0.read_id() {
        std::mem::swap(&mut candidate0, &mut candidate1);
        info.swap();
    }
    assert_eq!(
        candidate0.read_id(),
        oriented_read_id0.read_id(),
        "alignment record does not involve read {}",
        oriented_read_id0.read_id()
    );

    if candidate0.strand() != oriented_read_id0.strand() {
        candidate0.flip_strand();
        candidate1.flip_strand();
        info.reverse_complement();
    }
    assert_eq!(candidate0, oriented_read_id0);

    (candidate1, info)
}

/// All alignments of an oriented read, partners in ascending order.
pub fn find_alignments(
    records: &[AlignmentData],
    table: TableView<'_>,
    oriented_read_id0: OrientedReadId,
) -> Vec<(OrientedReadId, AlignmentInfo)> {
    table
        .bucket(oriented_read_id0)
        .iter()
        .map(|&index| reorient(&records[index as usize], oriented_read_id0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::AlignedSpan;
    use crate::index::build_alignment_table;
    use crate::types::{OrientedReadPair, Strand};

    fn info() -> AlignmentInfo {
        AlignmentInfo {
            marker_count: 50,
            data: [
                AlignedSpan {
                    marker_count: 55,
                    first_ordinal: 2,
                    last_ordinal: 51,
                },
                AlignedSpan {
                    marker_count: 59,
                    first_ordinal: 5,
                    last_ordinal: 54,
                },
            ],
        }
    }

    #[test]
    fn test_all_four_orientations() {
        let record = AlignmentData::new(&OrientedReadPair::new(0, 1, true), info());
        let records = vec![record];
        let table = build_alignment_table(&records, 2);
        let view = table.view();

        let forward0 = OrientedReadId::new(0, Strand::Forward);
        assert_eq!(
            find_alignments(&records, view, forward0),
            vec![(OrientedReadId::new(1, Strand::Forward), info())]
        );

        let reverse1 = OrientedReadId::new(1, Strand::Reverse);
        let found = find_alignments(&records, view, reverse1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, OrientedReadId::new(0, Strand::Reverse));
        let mut expected = info();
        expected.swap();
        expected.reverse_complement();
        assert_eq!(found[0].1, expected);
        assert_eq!(found[0].1.data[0].first_ordinal, 4);
        assert_eq!(found[0].1.data[1].last_ordinal, 52);
        assert_eq!(found[0].1.trim(), (3, 2));

        let forward1 = OrientedReadId::new(1, Strand::Forward);
        let mut swapped = info();
        swapped.swap();
        assert_eq!(
            find_alignments(&records, view, forward1),
            vec![(forward0, swapped)]
        );

        let reverse0 = OrientedReadId::new(0, Strand::Reverse);
        let mut mirrored = info();
        mirrored.reverse_complement();
        assert_eq!(
            find_alignments(&records, view, reverse0),
            vec![(reverse1, mirrored)]
        );
    }

    #[test]
    fn test_opposite_strand_partner() {
        let record = AlignmentData::new(&OrientedReadPair::new(2, 3, false), info());
        let forward2 = OrientedReadId::new(2, Strand::Forward);
        let forward3 = OrientedReadId::new(3, Strand::Forward);
        assert_eq!(reorient(&record, forward2).0, OrientedReadId::new(3, Strand::Reverse));
        assert_eq!(reorient(&record, forward3).0, OrientedReadId::new(2, Strand::Reverse));
        // Marker count is preserved under every reorientation.
        assert_eq!(reorient(&record, forward3).1.marker_count, 50);
    }

    #[test]
    fn test_unknown_read_has_no_alignments() {
        let records = vec![AlignmentData::new(&OrientedReadPair::new(0, 1, true), info())];
        let table = build_alignment_table(&records, 2);
        assert!(find_alignments(&records, table.view(), OrientedReadId::new(7, Strand::Forward)).is_empty());
    }

    #[test]
    #[should_panic(expected = "does not involve")]
    fn test_foreign_record_panics() {
        let record = AlignmentData::new(&OrientedReadPair::new(0, 1, true), info());
        reorient(&record, OrientedReadId::new(4, Strand::Forward));
    }
}
