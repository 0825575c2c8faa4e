//! Compact vector of vectors
//!
//! All sections share one contiguous value buffer addressed through an
//! offsets array (`offsets[key]..offsets[key + 1]`). Sections are either
//! appended one at a time, or built with the two-pass protocol: count every
//! value per key, then store every value into storage that is already sized.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Idle,
    Counting,
    Filling,
}

#[derive(Debug, Clone)]
pub struct VectorOfVectors<T> {
    offsets: Vec<u64>,
    values: Vec<T>,
    cursors: Vec<u64>,
    pass: Pass,
}

impl<T: Copy + Default> VectorOfVectors<T> {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
            cursors: Vec::new(),
            pass: Pass::Idle,
        }
    }

    /// Rebuild from raw parts, as read back from storage.
    pub fn from_parts(offsets: Vec<u64>, values: Vec<T>) -> Self {
        assert!(!offsets.is_empty(), "offsets must hold at least one entry");
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]), "offsets must be non-decreasing");
        assert_eq!(offsets[offsets.len() - 1] as usize, values.len());
        Self {
            offsets,
            values,
            cursors: Vec::new(),
            pass: Pass::Idle,
        }
    }

    /// Append a new section holding a copy of `section`.
    pub fn push_section(&mut self, section: &[T]) -> usize {
        assert_eq!(self.pass, Pass::Idle, "push_section during a two-pass build");
        self.values.extend_from_slice(section);
        self.offsets.push(self.values.len() as u64);
        self.offsets.len() - 2
    }

    /// Start a two-pass build with `key_count` empty sections. Existing
    /// content is discarded.
    pub fn begin_pass1(&mut self, key_count: usize) {
        self.offsets = vec![0; key_count + 1];
        self.values.clear();
        self.cursors.clear();
        self.pass = Pass::Counting;
    }

    pub fn increment_count(&mut self, key: usize) {
        self.increment_count_by(key, 1);
    }

    pub fn increment_count_by(&mut self, key: usize, count: u64) {
        assert_eq!(self.pass, Pass::Counting, "increment_count outside pass 1");
        // Counts accumulate one slot to the right so the prefix sum
        // turns them into section starts.
        self.offsets[key + 1] += count;
    }

    /// Convert counts to offsets and size the value storage.
    pub fn begin_pass2(&mut self) {
        assert_eq!(self.pass, Pass::Counting, "begin_pass2 without pass 1");
        for key in 1..self.offsets.len() {
            self.offsets[key] += self.offsets[key - 1];
        }
        let total = self.offsets[self.offsets.len() - 1] as usize;
        self.values = vec![T::default(); total];
        self.cursors = self.offsets[..self.offsets.len() - 1].to_vec();
        self.pass = Pass::Filling;
    }

    pub fn store(&mut self, key: usize, value: T) {
        assert_eq!(self.pass, Pass::Filling, "store outside pass 2");
        let position = self.cursors[key];
        assert!(
            position < self.offsets[key + 1],
            "section {} overflows its pass 1 count",
            key
        );
        self.values[position as usize] = value;
        self.cursors[key] = position + 1;
    }

    /// Finish the build. Every section must have been filled exactly to the
    /// count registered in pass 1.
    pub fn end_pass2(&mut self) {
        assert_eq!(self.pass, Pass::Filling, "end_pass2 without pass 2");
        for (key, &cursor) in self.cursors.iter().enumerate() {
            assert_eq!(
                cursor,
                self.offsets[key + 1],
                "section {} was not completely filled",
                key
            );
        }
        self.cursors = Vec::new();
        self.pass = Pass::Idle;
    }
}

impl<T> VectorOfVectors<T> {
    /// Number of sections.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of values across all sections.
    pub fn total_size(&self) -> usize {
        self.values.len()
    }

    pub fn section_range(&self, key: usize) -> Range<usize> {
        self.offsets[key] as usize..self.offsets[key + 1] as usize
    }

    pub fn section_len(&self, key: usize) -> usize {
        (self.offsets[key + 1] - self.offsets[key]) as usize
    }

    pub fn get(&self, key: usize) -> &[T] {
        &self.values[self.section_range(key)]
    }

    pub fn get_mut(&mut self, key: usize) -> &mut [T] {
        let range = self.section_range(key);
        &mut self.values[range]
    }

    /// Disjoint mutable views of every section, in key order.
    pub fn sections_mut(&mut self) -> Vec<&mut [T]> {
        let mut sections = Vec::with_capacity(self.len());
        let mut rest: &mut [T] = &mut self.values;
        for key in 0..self.offsets.len() - 1 {
            let len = (self.offsets[key + 1] - self.offsets[key]) as usize;
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
            sections.push(head);
            rest = tail;
        }
        sections
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Copy + Default> Default for VectorOfVectors<T> {
    fn default() -> Self {
        Self::new()
    }
}
