//! Bidirectional alignment index
//!
//! For every oriented read, the indices of the alignment records that touch
//! it, sorted by the oriented id of the partner read. Each record is listed
//! under all four oriented forms of its two reads.

use crate::alignment::AlignmentData;
use crate::containers::VectorOfVectors;
use crate::types::{OrientedReadId, ReadId};
use rayon::prelude::*;
use std::time::Instant;

/// Borrowed view of an alignment table, owned or memory mapped.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    offsets: &'a [u64],
    values: &'a [u32],
}

impl<'a> TableView<'a> {
    pub fn new(offsets: &'a [u64], values: &'a [u32]) -> Self {
        Self { offsets, values }
    }

    /// Number of oriented-read keys (twice the read count).
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record indices for one oriented read. Unknown reads have no entries.
    pub fn bucket(&self, oriented_read_id: OrientedReadId) -> &'a [u32] {
        let key = oriented_read_id.value() as usize;
        if key >= self.len() {
            return &[];
        }
        &self.values[self.offsets[key] as usize..self.offsets[key + 1] as usize]
    }

    pub fn total_entries(&self) -> usize {
        self.values.len()
    }

    pub fn offsets(&self) -> &'a [u64] {
        self.offsets
    }

    pub fn values(&self) -> &'a [u32] {
        self.values
    }
}

/// In-memory alignment table.
#[derive(Debug, Clone, Default)]
pub struct AlignmentTable {
    sections: VectorOfVectors<u32>,
}

impl AlignmentTable {
    pub fn from_parts(offsets: Vec<u64>, values: Vec<u32>) -> Self {
        Self {
            sections: VectorOfVectors::from_parts(offsets, values),
        }
    }

    pub fn view(&self) -> TableView<'_> {
        TableView::new(self.sections.offsets(), self.sections.values())
    }

    pub fn bucket(&self, oriented_read_id: OrientedReadId) -> &[u32] {
        self.sections.get(oriented_read_id.value() as usize)
    }

    /// Number of oriented-read keys.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn offsets(&self) -> &[u64] {
        self.sections.offsets()
    }

    pub fn values(&self) -> &[u32] {
        self.sections.values()
    }
}

/// The four oriented reads under which a record is indexed, each with the
/// partner it pairs with there.
fn index_keys(record: &AlignmentData) -> [OrientedReadId; 4] {
    let [oriented0, oriented1] = record.oriented_read_ids();
    [oriented0, oriented1, oriented0.flipped(), oriented1.flipped()]
}

/// Build the table for `read_count` reads from the canonical records.
///
/// Pass 1 counts the entries of every oriented read, pass 2 stores the record
/// indices into pre-sized sections. Sections are then sorted in parallel by
/// partner oriented read, ties by record index.
pub fn build_alignment_table(records: &[AlignmentData], read_count: ReadId) -> AlignmentTable {
    let start = Instant::now();
    assert!(
        records.len() <= u32::MAX as usize,
        "too many alignment records for a 32-bit index"
    );

    let key_count = 2 * read_count as usize;
    let mut sections = VectorOfVectors::<u32>::new();

    sections.begin_pass1(key_count);
    for record in records {
        assert!(
            record.read_ids[1] < read_count,
            "alignment record references read {} but only {} reads exist",
            record.read_ids[1],
            read_count
        );
        for key in index_keys(record) {
            sections.increment_count(key.value() as usize);
        }
    }

    sections.begin_pass2();
    for (index, record) in records.iter().enumerate() {
        for key in index_keys(record) {
            sections.store(key.value() as usize, index as u32);
        }
    }
    sections.end_pass2();

    sort_sections(&mut sections, records);

    log::info!(
        "Alignment table built: {} records, {} entries over {} oriented reads in {:.3}s",
        records.len(),
        sections.total_size(),
        key_count,
        start.elapsed().as_secs_f64()
    );

    AlignmentTable { sections }
}

/// Sort every section by `(partner, record index)`.
fn sort_sections(sections: &mut VectorOfVectors<u32>, records: &[AlignmentData]) {
    sections
        .sections_mut()
        .into_par_iter()
        .enumerate()
        .for_each_init(Vec::new, |pairs: &mut Vec<(OrientedReadId, u32)>, (key, section)| {
            let oriented = OrientedReadId::from_value(key as u32);
            pairs.clear();
            pairs.extend(
                section
                    .iter()
                    .map(|&index| (records[index as usize].other(oriented), index)),
            );
            pairs.sort_unstable();
            for (slot, &(_, index)) in section.iter_mut().zip(pairs.iter()) {
                *slot = index;
            }
        });
}
