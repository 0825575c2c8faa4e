use markalign_core::markers::reverse_complement_kmer;
use markalign_core::{
    build_alignment_table, AlignmentPipeline, ComputeAlignmentsParams, MarkerChainer,
    MarkerStore, NoProgress, OrientedReadId, OrientedReadPair, Strand,
};
use std::collections::HashMap;

const K: usize = 8;

fn pipeline() -> AlignmentPipeline<MarkerStore, MarkerChainer> {
    AlignmentPipeline::new(MarkerChainer::new()).with_progress(Box::new(NoProgress))
}

fn params(min_aligned: u32, max_trim: u32) -> ComputeAlignmentsParams {
    ComputeAlignmentsParams {
        min_aligned_marker_count: min_aligned,
        max_trim,
        thread_count: 2,
        ..Default::default()
    }
}

/// Two reads sharing 50 markers; read 0 has 2 leading and 3 trailing
/// markers of its own, read 1 has 5 and 4.
fn overlapping_pair() -> MarkerStore {
    let shared: Vec<u32> = (1000..1050).collect();
    let mut read0 = vec![1, 2];
    read0.extend_from_slice(&shared);
    read0.extend_from_slice(&[3, 4, 5]);
    let mut read1: Vec<u32> = (10..15).collect();
    read1.extend_from_slice(&shared);
    read1.extend_from_slice(&[20, 21, 22, 23]);

    let mut markers = MarkerStore::new(K);
    markers.push_read(&read0);
    markers.push_read(&read1);
    markers
}

#[test]
fn single_pair_scenario() {
    let mut pipeline = pipeline();
    pipeline.set_markers(overlapping_pair());
    pipeline.set_candidates(vec![OrientedReadPair::new(0, 1, true)]);

    let summary = pipeline.compute_alignments(&params(10, 5)).expect("compute alignments");
    assert_eq!(summary.accepted_count, 1);

    let records = pipeline.alignment_data().expect("alignment data");
    assert_eq!(records.len(), 1);
    let info = records[0].info;
    assert_eq!(info.marker_count, 50);
    assert_eq!(info.trim(), (2, 3));

    let forward0 = OrientedReadId::new(0, Strand::Forward);
    assert_eq!(
        pipeline.find_alignments(forward0).expect("query"),
        vec![(OrientedReadId::new(1, Strand::Forward), info)]
    );

    let reverse1 = OrientedReadId::new(1, Strand::Reverse);
    let found = pipeline.find_alignments(reverse1).expect("query");
    assert_eq!(found.len(), 1);
    let (partner, mirrored) = found[0];
    assert_eq!(partner, OrientedReadId::new(0, Strand::Reverse));
    assert_eq!(mirrored.marker_count, 50);
    assert_eq!(
        (mirrored.data[0].marker_count, mirrored.data[0].first_ordinal, mirrored.data[0].last_ordinal),
        (59, 4, 53)
    );
    assert_eq!(
        (mirrored.data[1].marker_count, mirrored.data[1].first_ordinal, mirrored.data[1].last_ordinal),
        (55, 3, 52)
    );
    assert_eq!(mirrored.trim(), (3, 2));
}

#[test]
fn trim_filter_rejects_pair() {
    let mut pipeline = pipeline();
    pipeline.set_markers(overlapping_pair());
    pipeline.set_candidates(vec![OrientedReadPair::new(0, 1, true)]);

    let summary = pipeline.compute_alignments(&params(10, 2)).expect("compute alignments");
    assert_eq!(summary.accepted_count, 0);
    assert_eq!(summary.too_much_trim_count, 1);
    assert!(pipeline
        .find_alignments(OrientedReadId::new(0, Strand::Forward))
        .expect("query")
        .is_empty());
}

/// Distinct k-mer ids for a synthetic genome.
fn genome(length: u32) -> Vec<u32> {
    (0..length).map(|i| (i * 7919 + 17) % 65521).collect()
}

/// Reads are windows of the genome; odd reads are stored on the reverse strand.
fn tiled_reads() -> (MarkerStore, Vec<Strand>) {
    let genome = genome(600);
    let mut markers = MarkerStore::new(K);
    let mut strands = Vec::new();
    for (i, start) in (0..500).step_by(40).enumerate() {
        let window = &genome[start..start + 100];
        if i % 2 == 0 {
            markers.push_read(window);
            strands.push(Strand::Forward);
        } else {
            let reversed: Vec<u32> = window
                .iter()
                .rev()
                .map(|&kmer| reverse_complement_kmer(kmer, K))
                .collect();
            markers.push_read(&reversed);
            strands.push(Strand::Reverse);
        }
    }
    (markers, strands)
}

fn all_candidates(strands: &[Strand]) -> Vec<OrientedReadPair> {
    let mut candidates = Vec::new();
    for read0 in 0..strands.len() as u32 {
        for read1 in read0 + 1..strands.len() as u32 {
            let same_strand = strands[read0 as usize] == strands[read1 as usize];
            candidates.push(OrientedReadPair::new(read0, read1, same_strand));
        }
    }
    candidates
}

#[test]
fn tiled_reads_properties() {
    let (markers, strands) = tiled_reads();
    let read_count = strands.len() as u32;
    let min_aligned = 20;
    let max_trim = 70;

    let mut pipeline = pipeline();
    pipeline.set_markers(markers);
    pipeline.set_candidates(all_candidates(&strands));
    pipeline
        .compute_alignments(&params(min_aligned, max_trim))
        .expect("compute alignments");

    let records = pipeline.alignment_data().expect("alignment data").to_vec();
    // Windows of 100 every 40 overlap by 60 or 20 markers.
    assert_eq!(records.len(), 2 * read_count as usize - 3);

    for record in &records {
        // Canonical order and filters.
        assert!(record.read_ids[0] < record.read_ids[1]);
        let (left, right) = record.info.trim();
        assert!(record.info.marker_count >= min_aligned);
        assert!(left <= max_trim && right <= max_trim);
    }

    // Every record appears exactly once in each of its four buckets.
    let table = pipeline.alignment_table().expect("alignment table");
    assert_eq!(table.total_entries(), 4 * records.len());
    for (index, record) in records.iter().enumerate() {
        let [oriented0, oriented1] = record.oriented_read_ids();
        for key in [oriented0, oriented1, oriented0.flipped(), oriented1.flipped()] {
            let hits = table.bucket(key).iter().filter(|&&i| i as usize == index).count();
            assert_eq!(hits, 1, "record {} in bucket {}", index, key);
        }
    }

    // Every oriented form of either read sees a consistent alignment.
    let mut seen: HashMap<(u32, u32), usize> = HashMap::new();
    for read_id in 0..read_count {
        for strand in [Strand::Forward, Strand::Reverse] {
            let query = OrientedReadId::new(read_id, strand);
            let found = pipeline.find_alignments(query).expect("query");
            assert!(found.windows(2).all(|w| w[0].0 <= w[1].0), "partners sorted");
            for (partner, info) in found {
                let key = (read_id.min(partner.read_id()), read_id.max(partner.read_id()));
                let record = records
                    .iter()
                    .find(|r| r.read_ids == [key.0, key.1])
                    .expect("record for pair");
                assert_eq!(partner, record.other(query));
                assert_eq!(info.marker_count, record.info.marker_count);
                let (left, right) = record.info.trim();
                let trim = info.trim();
                assert!(trim == (left, right) || trim == (right, left));
                if query == record.oriented_read_ids()[0] {
                    assert_eq!(info, record.info);
                }
                *seen.entry(key).or_default() += 1;
            }
        }
    }
    assert_eq!(seen.len(), records.len());
    assert!(seen.values().all(|&count| count == 4));

    // Rebuilding the table gives the same order.
    let rebuilt = build_alignment_table(&records, read_count);
    assert_eq!(rebuilt.offsets(), table.offsets());
    assert_eq!(rebuilt.values(), table.values());
}

#[test]
fn overlapping_reads_recomputed_from_index() {
    let (markers, strands) = tiled_reads();
    let mut pipeline = pipeline();
    pipeline.set_markers(markers);
    pipeline.set_candidates(all_candidates(&strands));
    let p = params(20, 70);
    pipeline.compute_alignments(&p).expect("compute alignments");

    let query = OrientedReadId::new(4, Strand::Forward);
    let report = pipeline
        .align_overlapping_oriented_reads(query, &p.bounds(), 20, 70)
        .expect("overlaps");
    let found = pipeline.find_alignments(query).expect("query");
    assert_eq!(report.entries.len(), found.len());
    assert_eq!(report.good_count, found.len());
    for (entry, (partner, info)) in report.entries.iter().zip(found.iter()) {
        assert_eq!(entry.partner, *partner);
        assert_eq!(entry.marker_count, info.marker_count);
    }
}

#[test]
fn palindromic_reads_flagged_and_listed() {
    let mut markers = MarkerStore::new(K);
    markers.push_read(&genome(40));
    let half = genome(20);
    let mut palindromic = half.clone();
    palindromic.extend(half.iter().rev().map(|&kmer| reverse_complement_kmer(kmer, K)));
    markers.push_read(&palindromic);

    let mut pipeline = pipeline();
    pipeline.set_markers(markers);
    let summary = pipeline
        .flag_palindromic_reads(&markalign_core::PalindromeParams {
            thread_count: 2,
            ..Default::default()
        })
        .expect("flag palindromic reads");
    assert_eq!(summary.palindromic_read_count, 1);

    let dir = tempfile::tempdir().expect("temp dir");
    let csv = dir.path().join("PalindromicReads.csv");
    assert_eq!(pipeline.write_palindromic_reads_csv(&csv).expect("write csv"), 1);
    assert_eq!(std::fs::read_to_string(&csv).expect("read csv"), "1\n");
}
