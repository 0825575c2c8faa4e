//! Pipeline context
//!
//! Holds the upstream inputs (markers, candidates) and the artifacts built
//! from them (alignment records, alignment table, read flags). Each slot is
//! optional; operations check that what they need is present before doing
//! any work.

use crate::alignment::{AlignBounds, Aligner, Alignment, AlignmentData, AlignmentInfo};
use crate::compute::{self, ComputeAlignmentsParams, ComputeAlignmentsSummary, OverlapReport};
use crate::error::{PipelineError, PipelineResult};
use crate::index::{build_alignment_table, AlignmentTable, TableView};
use crate::markers::MarkerSource;
use crate::palindrome::{self, PalindromeParams, PalindromeSummary};
use crate::progress::{LogProgress, ProgressReporter};
use crate::query;
use crate::store::{
    self, AlignmentStore, MappedAlignmentData, MappedAlignmentTable, ALIGNMENT_DATA_FILE,
    ALIGNMENT_TABLE_FILE, READ_FLAGS_FILE,
};
use crate::types::{OrientedReadId, OrientedReadPair, ReadFlags};
use std::path::Path;

/// Alignment records, freshly computed or mapped from a data directory.
#[derive(Debug)]
pub enum AlignmentRecords {
    Owned(AlignmentStore),
    Mapped(MappedAlignmentData),
}

impl AlignmentRecords {
    pub fn as_slice(&self) -> &[AlignmentData] {
        match self {
            AlignmentRecords::Owned(store) => store.as_slice(),
            AlignmentRecords::Mapped(mapped) => mapped.as_slice(),
        }
    }
}

/// Alignment table, freshly built or mapped from a data directory.
#[derive(Debug)]
pub enum AlignmentTableSource {
    Owned(AlignmentTable),
    Mapped(MappedAlignmentTable),
}

impl AlignmentTableSource {
    pub fn view(&self) -> TableView<'_> {
        match self {
            AlignmentTableSource::Owned(table) => table.view(),
            AlignmentTableSource::Mapped(mapped) => mapped.view(),
        }
    }
}

pub struct AlignmentPipeline<M, A> {
    aligner: A,
    markers: Option<M>,
    candidates: Option<Vec<OrientedReadPair>>,
    alignment_data: Option<AlignmentRecords>,
    alignment_table: Option<AlignmentTableSource>,
    read_flags: Option<Vec<ReadFlags>>,
    progress: Box<dyn ProgressReporter>,
}

impl<M: MarkerSource, A: Aligner> AlignmentPipeline<M, A> {
    pub fn new(aligner: A) -> Self {
        Self {
            aligner,
            markers: None,
            candidates: None,
            alignment_data: None,
            alignment_table: None,
            read_flags: None,
            progress: Box::new(LogProgress::default()),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn set_markers(&mut self, markers: M) {
        self.markers = Some(markers);
    }

    pub fn set_candidates(&mut self, candidates: Vec<OrientedReadPair>) {
        self.candidates = Some(candidates);
    }

    pub fn markers(&self) -> PipelineResult<&M> {
        self.markers.as_ref().ok_or(PipelineError::NotLoaded("markers"))
    }

    pub fn candidates(&self) -> PipelineResult<&[OrientedReadPair]> {
        self.candidates
            .as_deref()
            .ok_or(PipelineError::NotLoaded("alignment candidates"))
    }

    pub fn alignment_data(&self) -> PipelineResult<&[AlignmentData]> {
        self.alignment_data
            .as_ref()
            .map(AlignmentRecords::as_slice)
            .ok_or(PipelineError::NotLoaded("alignment data"))
    }

    pub fn alignment_table(&self) -> PipelineResult<TableView<'_>> {
        self.alignment_table
            .as_ref()
            .map(AlignmentTableSource::view)
            .ok_or(PipelineError::NotLoaded("alignment table"))
    }

    pub fn read_flags(&self) -> PipelineResult<&[ReadFlags]> {
        self.read_flags
            .as_deref()
            .ok_or(PipelineError::NotLoaded("read flags"))
    }

    /// Compute alignments for all candidates, then build the alignment table.
    /// On failure, previously held alignment data are left untouched.
    pub fn compute_alignments(
        &mut self,
        params: &ComputeAlignmentsParams,
    ) -> PipelineResult<ComputeAlignmentsSummary> {
        let markers = self.markers()?;
        let candidates = self.candidates()?;

        let (store, summary) = compute::compute_alignments(
            markers,
            candidates,
            &self.aligner,
            params,
            self.progress.as_ref(),
        )?;
        log::info!("Creating alignment table");
        let table = build_alignment_table(store.as_slice(), markers.read_count());

        self.alignment_data = Some(AlignmentRecords::Owned(store));
        self.alignment_table = Some(AlignmentTableSource::Owned(table));
        Ok(summary)
    }

    /// All alignments of an oriented read, expressed in its frame.
    pub fn find_alignments(
        &self,
        oriented_read_id: OrientedReadId,
    ) -> PipelineResult<Vec<(OrientedReadId, AlignmentInfo)>> {
        let records = self.alignment_data()?;
        let table = self.alignment_table()?;
        Ok(query::find_alignments(records, table, oriented_read_id))
    }

    /// Persist alignment data and table into `dir`.
    pub fn write_alignment_data<P: AsRef<Path>>(&self, dir: P) -> PipelineResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let records = self.alignment_data()?;
        store::write_alignment_data(dir.join(ALIGNMENT_DATA_FILE), records)?;
        match self.alignment_table.as_ref() {
            Some(AlignmentTableSource::Owned(table)) => {
                store::write_alignment_table(dir.join(ALIGNMENT_TABLE_FILE), table)?
            }
            Some(AlignmentTableSource::Mapped(mapped)) => {
                let table =
                    AlignmentTable::from_parts(mapped.offsets().to_vec(), mapped.values().to_vec());
                store::write_alignment_table(dir.join(ALIGNMENT_TABLE_FILE), &table)?
            }
            None => return Err(PipelineError::NotLoaded("alignment table")),
        }
        log::info!("Wrote {} alignment records to {}", records.len(), dir.display());
        Ok(())
    }

    /// Open the alignment data and table of `dir` read-only.
    pub fn access_alignment_data<P: AsRef<Path>>(&mut self, dir: P) -> PipelineResult<()> {
        let dir = dir.as_ref();
        let records = MappedAlignmentData::open(dir.join(ALIGNMENT_DATA_FILE))?;
        let table = MappedAlignmentTable::open(dir.join(ALIGNMENT_TABLE_FILE))?;
        if let Some(&largest) = table.values().iter().max() {
            if largest as usize >= records.len() {
                return Err(store::StoreError::Corruption(format!(
                    "alignment table references record {} of {}",
                    largest,
                    records.len()
                ))
                .into());
            }
        }
        self.alignment_data = Some(AlignmentRecords::Mapped(records));
        self.alignment_table = Some(AlignmentTableSource::Mapped(table));
        Ok(())
    }

    pub fn flag_palindromic_reads(
        &mut self,
        params: &PalindromeParams,
    ) -> PipelineResult<PalindromeSummary> {
        let markers = self.markers.as_ref().ok_or(PipelineError::NotLoaded("markers"))?;
        let mut read_flags = self.read_flags.take().unwrap_or_default();
        let result = palindrome::flag_palindromic_reads(
            markers,
            &self.aligner,
            params,
            &mut read_flags,
            self.progress.as_ref(),
        );
        self.read_flags = Some(read_flags);
        result
    }

    pub fn write_read_flags<P: AsRef<Path>>(&self, dir: P) -> PipelineResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        store::write_read_flags(dir.join(READ_FLAGS_FILE), self.read_flags()?)?;
        Ok(())
    }

    pub fn access_read_flags<P: AsRef<Path>>(&mut self, dir: P) -> PipelineResult<()> {
        let flags = store::read_read_flags(dir.as_ref().join(READ_FLAGS_FILE))?;
        self.read_flags = Some(flags);
        Ok(())
    }

    /// Write the palindromic read ids as CSV and return how many were written.
    pub fn write_palindromic_reads_csv<P: AsRef<Path>>(&self, path: P) -> PipelineResult<usize> {
        Ok(palindrome::write_palindromic_reads_csv(path, self.read_flags()?)?)
    }

    /// Align one oriented pair with the loaded markers.
    pub fn align_oriented_reads(
        &self,
        oriented_read_id0: OrientedReadId,
        oriented_read_id1: OrientedReadId,
        bounds: &AlignBounds,
    ) -> PipelineResult<(Alignment, AlignmentInfo)> {
        compute::align_oriented_reads(
            self.markers()?,
            &self.aligner,
            [oriented_read_id0, oriented_read_id1],
            bounds,
        )
    }

    /// Recompute the alignments of an oriented read against its indexed partners.
    pub fn align_overlapping_oriented_reads(
        &self,
        oriented_read_id0: OrientedReadId,
        bounds: &AlignBounds,
        min_aligned_marker_count: u32,
        max_trim: u32,
    ) -> PipelineResult<OverlapReport> {
        compute::align_overlapping_oriented_reads(
            self.markers()?,
            &self.aligner,
            self.alignment_data()?,
            self.alignment_table()?,
            oriented_read_id0,
            bounds,
            min_aligned_marker_count,
            max_trim,
        )
    }
}
