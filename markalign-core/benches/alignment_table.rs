use criterion::{black_box, criterion_group, criterion_main, Criterion};
use markalign_core::{
    build_alignment_table, compute_alignments, AlignmentData, AlignmentInfo,
    ComputeAlignmentsParams, MarkerChainer, MarkerStore, NoProgress, OrientedReadPair,
};

fn generate_records(read_count: u32, partners_per_read: u32) -> Vec<AlignmentData> {
    let mut records = Vec::new();
    for read0 in 0..read_count {
        for step in 1..=partners_per_read {
            let read1 = read0 + step * 7;
            if read1 >= read_count {
                break;
            }
            let candidate = OrientedReadPair::new(read0, read1, (read0 + step) % 2 == 0);
            records.push(AlignmentData::new(&candidate, AlignmentInfo::default()));
        }
    }
    records
}

fn generate_reads(read_count: usize, read_length: usize, spacing: usize) -> MarkerStore {
    let genome: Vec<u32> = (0..(read_count * spacing + read_length) as u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 8) % (1 << 24))
        .collect();
    let mut markers = MarkerStore::new(12);
    for i in 0..read_count {
        markers.push_read(&genome[i * spacing..i * spacing + read_length]);
    }
    markers
}

fn bench_build_alignment_table(c: &mut Criterion) {
    let records = generate_records(50_000, 20);

    c.bench_function("alignment_table_50k_reads", |b| {
        b.iter(|| {
            let table = build_alignment_table(black_box(&records), 50_000);
            black_box(table)
        })
    });
}

fn bench_compute_alignments(c: &mut Criterion) {
    let markers = generate_reads(500, 400, 100);
    let candidates: Vec<OrientedReadPair> = (0..499u32)
        .flat_map(|read| {
            (1..=3u32)
                .map(move |step| read + step)
                .filter(|&partner| partner < 500)
                .map(move |partner| OrientedReadPair::new(read, partner, true))
        })
        .collect();
    let params = ComputeAlignmentsParams {
        min_aligned_marker_count: 50,
        max_trim: 10,
        ..Default::default()
    };

    c.bench_function("compute_alignments_500_reads", |b| {
        b.iter(|| {
            let result = compute_alignments(
                black_box(&markers),
                black_box(&candidates),
                &MarkerChainer::new(),
                &params,
                &NoProgress,
            );
            black_box(result)
        })
    });
}

criterion_group!(benches, bench_build_alignment_table, bench_compute_alignments);
criterion_main!(benches);
