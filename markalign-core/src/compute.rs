//! Alignment computation over a candidate set
//!
//! Candidates are split into batches claimed dynamically by the workers of a
//! dedicated pool. Each worker owns its marker buffers, aligner scratch and
//! output buffer; outputs are concatenated in worker order once every batch
//! is drained.

use crate::alignment::{AlignBounds, Aligner, Alignment, AlignmentData, AlignmentInfo};
use crate::batch::{batch_size, build_pool, resolve_thread_count, BatchQueue};
use crate::error::{PipelineError, PipelineResult};
use crate::index::TableView;
use crate::markers::MarkerSource;
use crate::progress::ProgressReporter;
use crate::store::{AlignmentStore, StoreError};
use crate::types::{MarkerWithOrdinal, OrientedReadId, OrientedReadPair, ReadId};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Parameters of the alignment computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeAlignmentsParams {
    /// K-mers more frequent than this in either read are ignored.
    pub max_marker_frequency: u32,
    /// Maximum ordinal skip between consecutive aligned markers.
    pub max_skip: u32,
    /// Maximum ordinal drift between consecutive aligned markers.
    pub max_drift: u32,
    /// Alignments with fewer aligned markers are discarded.
    pub min_aligned_marker_count: u32,
    /// Alignments with more left or right trim (in markers) are discarded.
    pub max_trim: u32,
    /// Worker threads, 0 for all available cores.
    pub thread_count: usize,
    /// Upper bound on the number of candidates claimed at once.
    pub max_batch_size: u64,
}

impl Default for ComputeAlignmentsParams {
    fn default() -> Self {
        Self {
            max_marker_frequency: 10,
            max_skip: 30,
            max_drift: 30,
            min_aligned_marker_count: 100,
            max_trim: 30,
            thread_count: 0,
            max_batch_size: 10_000,
        }
    }
}

impl ComputeAlignmentsParams {
    pub fn bounds(&self) -> AlignBounds {
        AlignBounds {
            max_skip: self.max_skip,
            max_drift: self.max_drift,
            max_marker_frequency: self.max_marker_frequency,
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_batch_size == 0 {
            return Err(PipelineError::InvalidParams(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of the quality filters for one alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentVerdict {
    Good,
    TooFewMarkers,
    TooMuchTrim { left_trim: u32, right_trim: u32 },
}

/// Apply the quality filters, marker count first.
pub fn classify_alignment(
    info: &AlignmentInfo,
    min_aligned_marker_count: u32,
    max_trim: u32,
) -> AlignmentVerdict {
    if info.marker_count < min_aligned_marker_count {
        return AlignmentVerdict::TooFewMarkers;
    }
    let (left_trim, right_trim) = info.trim();
    if left_trim > max_trim || right_trim > max_trim {
        return AlignmentVerdict::TooMuchTrim { left_trim, right_trim };
    }
    AlignmentVerdict::Good
}

/// Check if an alignment summary passes the quality filters.
pub fn is_good_alignment(info: &AlignmentInfo, min_aligned_marker_count: u32, max_trim: u32) -> bool {
    classify_alignment(info, min_aligned_marker_count, max_trim) == AlignmentVerdict::Good
}

/// Counters of one alignment run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeAlignmentsSummary {
    pub candidate_count: u64,
    pub accepted_count: u64,
    pub too_few_markers_count: u64,
    pub too_much_trim_count: u64,
    pub thread_count: usize,
    pub batch_size: u64,
    pub elapsed_seconds: f64,
}

#[derive(Default)]
struct WorkerOutput {
    records: Vec<AlignmentData>,
    too_few_markers: u64,
    too_much_trim: u64,
}

/// Check that every candidate is canonical and references a known read.
pub fn validate_candidates(
    candidates: &[OrientedReadPair],
    read_count: u32,
) -> PipelineResult<()> {
    for (index, candidate) in candidates.iter().enumerate() {
        let [read0, read1] = candidate.read_ids;
        if !candidate.is_canonical() {
            return Err(PipelineError::NonCanonicalCandidate {
                index,
                read0,
                read1,
            });
        }
        if read1 >= read_count {
            return Err(PipelineError::ReadOutOfRange {
                read_id: read1,
                read_count,
            });
        }
    }
    Ok(())
}

/// Align every candidate and keep the ones passing the quality filters.
///
/// Within one worker, records are in candidate order; across workers the
/// order is unspecified.
pub fn compute_alignments<M, A>(
    markers: &M,
    candidates: &[OrientedReadPair],
    aligner: &A,
    params: &ComputeAlignmentsParams,
    progress: &dyn ProgressReporter,
) -> PipelineResult<(AlignmentStore, ComputeAlignmentsSummary)>
where
    M: MarkerSource,
    A: Aligner,
{
    let start = Instant::now();
    params.validate()?;
    validate_candidates(candidates, markers.read_count())?;

    let thread_count = resolve_thread_count(params.thread_count);
    let total = candidates.len() as u64;
    let batch_size = batch_size(total, thread_count, params.max_batch_size);
    log::info!(
        "Begin computing alignments for {} alignment candidates with {} ({} threads, batch size {})",
        total,
        aligner.name(),
        thread_count,
        batch_size
    );

    let pool = build_pool(thread_count)?;
    let queue = BatchQueue::new(total, batch_size);
    let bounds = params.bounds();
    progress.start("Computing alignments", total);

    let outputs: Vec<WorkerOutput> = pool.broadcast(|_| {
        let mut output = WorkerOutput::default();
        let mut views: [Vec<MarkerWithOrdinal>; 2] = [Vec::new(), Vec::new()];
        let mut scratch = A::Scratch::default();
        let mut alignment = Alignment::default();

        while let Some(batch) = queue.next_batch() {
            progress.advance(batch.start, batch.end);
            for index in batch {
                let candidate = &candidates[index as usize];
                let oriented_read_ids = candidate.oriented_read_ids();
                for (view, &oriented_read_id) in views.iter_mut().zip(oriented_read_ids.iter()) {
                    markers.markers_sorted_by_kmer_id(oriented_read_id, view);
                }

                let info = aligner.align(
                    [&views[0][..], &views[1][..]],
                    &bounds,
                    &mut scratch,
                    &mut alignment,
                );

                match classify_alignment(&info, params.min_aligned_marker_count, params.max_trim) {
                    AlignmentVerdict::Good => {
                        output.records.push(AlignmentData::new(candidate, info));
                    }
                    AlignmentVerdict::TooFewMarkers => {
                        log::debug!(
                            "Rejected {} {}: {} aligned markers",
                            oriented_read_ids[0],
                            oriented_read_ids[1],
                            info.marker_count
                        );
                        output.too_few_markers += 1;
                    }
                    AlignmentVerdict::TooMuchTrim { left_trim, right_trim } => {
                        log::debug!(
                            "Rejected {} {}: trim {} {}",
                            oriented_read_ids[0],
                            oriented_read_ids[1],
                            left_trim,
                            right_trim
                        );
                        output.too_much_trim += 1;
                    }
                }
            }
        }
        output
    });
    progress.finish();

    let mut store = AlignmentStore::new();
    let mut summary = ComputeAlignmentsSummary {
        candidate_count: total,
        thread_count,
        batch_size,
        ..Default::default()
    };
    for output in &outputs {
        store.extend_from_slice(&output.records);
        summary.too_few_markers_count += output.too_few_markers;
        summary.too_much_trim_count += output.too_much_trim;
    }
    summary.accepted_count = store.len() as u64;
    summary.elapsed_seconds = start.elapsed().as_secs_f64();

    log::info!(
        "Computation of alignments completed in {:.3} s: {} of {} candidates accepted \
         ({} with too few markers, {} with too much trim)",
        summary.elapsed_seconds,
        summary.accepted_count,
        summary.candidate_count,
        summary.too_few_markers_count,
        summary.too_much_trim_count
    );

    Ok((store, summary))
}

/// Align a single oriented pair and log what was found.
pub fn align_oriented_reads<M: MarkerSource, A: Aligner>(
    markers: &M,
    aligner: &A,
    oriented_read_ids: [OrientedReadId; 2],
    bounds: &AlignBounds,
) -> PipelineResult<(Alignment, AlignmentInfo)> {
    let read_count = markers.read_count();
    for oriented_read_id in oriented_read_ids {
        if oriented_read_id.read_id() >= read_count {
            return Err(PipelineError::ReadOutOfRange {
                read_id: oriented_read_id.read_id(),
                read_count,
            });
        }
    }

    let mut views: [Vec<MarkerWithOrdinal>; 2] = [Vec::new(), Vec::new()];
    for (view, &oriented_read_id) in views.iter_mut().zip(oriented_read_ids.iter()) {
        markers.markers_sorted_by_kmer_id(oriented_read_id, view);
    }

    let mut scratch = A::Scratch::default();
    let mut alignment = Alignment::default();
    let info = aligner.align([&views[0][..], &views[1][..]], bounds, &mut scratch, &mut alignment);

    let (left_trim, right_trim) = info.trim();
    log::info!("{} has {} markers", oriented_read_ids[0], views[0].len());
    log::info!("{} has {} markers", oriented_read_ids[1], views[1].len());
    log::info!(
        "The alignment has {} markers. Left trim {} markers, right trim {} markers",
        info.marker_count,
        left_trim,
        right_trim
    );
    Ok((alignment, info))
}

/// Recomputed alignment of an oriented read against one indexed partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapEntry {
    pub partner: OrientedReadId,
    pub marker_count: u32,
    pub left_trim: u32,
    pub right_trim: u32,
    pub good: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    pub entries: Vec<OverlapEntry>,
    pub good_count: usize,
}

/// Recompute the alignment of `oriented_read_id0` against every partner
/// listed in its index bucket, classifying each with the quality filters.
#[allow(clippy::too_many_arguments)]
pub fn align_overlapping_oriented_reads<M: MarkerSource, A: Aligner>(
    markers: &M,
    aligner: &A,
    records: &[AlignmentData],
    table: TableView<'_>,
    oriented_read_id0: OrientedReadId,
    bounds: &AlignBounds,
    min_aligned_marker_count: u32,
    max_trim: u32,
) -> PipelineResult<OverlapReport> {
    let read_count = markers.read_count();
    if oriented_read_id0.read_id() >= read_count {
        return Err(PipelineError::ReadOutOfRange {
            read_id: oriented_read_id0.read_id(),
            read_count,
        });
    }
    // The index must not reference reads the marker source does not have.
    if table.len() > 2 * read_count as usize {
        return Err(PipelineError::ReadOutOfRange {
            read_id: (table.len() / 2 - 1) as ReadId,
            read_count,
        });
    }

    let mut views: [Vec<MarkerWithOrdinal>; 2] = [Vec::new(), Vec::new()];
    markers.markers_sorted_by_kmer_id(oriented_read_id0, &mut views[0]);
    let mut scratch = A::Scratch::default();
    let mut alignment = Alignment::default();

    let mut report = OverlapReport::default();
    let bucket = table.bucket(oriented_read_id0);
    for &index in bucket {
        let record = records.get(index as usize).ok_or_else(|| {
            StoreError::Corruption(format!(
                "index entry {} past the {} alignment records",
                index,
                records.len()
            ))
        })?;
        let partner = record.other(oriented_read_id0);
        if partner.read_id() >= read_count {
            return Err(PipelineError::ReadOutOfRange {
                read_id: partner.read_id(),
                read_count,
            });
        }
        markers.markers_sorted_by_kmer_id(partner, &mut views[1]);
        let info = aligner.align([&views[0][..], &views[1][..]], bounds, &mut scratch, &mut alignment);
        let (left_trim, right_trim) = info.trim();
        let good = info.marker_count > 0
            && is_good_alignment(&info, min_aligned_marker_count, max_trim);
        if good {
            report.good_count += 1;
        }
        log::info!(
            "{} {} {} {} {}{}",
            oriented_read_id0,
            partner,
            info.marker_count,
            left_trim,
            right_trim,
            if good { " good" } else { "" }
        );
        report.entries.push(OverlapEntry {
            partner,
            marker_count: info.marker_count,
            left_trim,
            right_trim,
            good,
        });
    }
    log::info!(
        "Found {} good alignments out of {}",
        report.good_count,
        bucket.len()
    );
    Ok(report)
}
