use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ReadId = u32;
pub type KmerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn flipped(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

impl From<Strand> for u32 {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => 0,
            Strand::Reverse => 1,
        }
    }
}

impl From<u32> for Strand {
    /// Only the low bit is significant.
    fn from(value: u32) -> Self {
        if value & 1 == 0 {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl From<bool> for Strand {
    fn from(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

/// A read together with the strand under consideration, packed as
/// `2 * read_id + strand` so it can index arrays of size `2 * read_count`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, Pod,
    Zeroable,
)]
#[repr(transparent)]
pub struct OrientedReadId(u32);

impl OrientedReadId {
    pub fn new(read_id: ReadId, strand: Strand) -> Self {
        Self((read_id << 1) | u32::from(strand))
    }

    pub fn from_value(value: u32) -> Self {
        Self(value)
    }

    pub fn read_id(self) -> ReadId {
        self.0 >> 1
    }

    pub fn strand(self) -> Strand {
        Strand::from(self.0)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn flip_strand(&mut self) {
        self.0 ^= 1;
    }

    pub fn flipped(self) -> Self {
        Self(self.0 ^ 1)
    }
}

impl fmt::Display for OrientedReadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.read_id(), u32::from(self.strand()))
    }
}

impl FromStr for OrientedReadId {
    type Err = String;

    /// Parses the `readId-strand` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (read, strand) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <readId>-<strand>, got {:?}", s))?;
        let read_id: ReadId = read
            .trim()
            .parse()
            .map_err(|e| format!("invalid read id {:?}: {}", read, e))?;
        let strand = match strand.trim() {
            "0" => Strand::Forward,
            "1" => Strand::Reverse,
            other => return Err(format!("invalid strand {:?}, expected 0 or 1", other)),
        };
        Ok(OrientedReadId::new(read_id, strand))
    }
}

/// A marker of an oriented read, tagged with its position in the read's
/// marker sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MarkerWithOrdinal {
    pub kmer_id: KmerId,
    pub ordinal: u32,
}

/// An alignment candidate. Canonical candidates have `read_ids[0] < read_ids[1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrientedReadPair {
    pub read_ids: [ReadId; 2],
    pub is_same_strand: bool,
}

impl OrientedReadPair {
    pub fn new(read_id0: ReadId, read_id1: ReadId, is_same_strand: bool) -> Self {
        Self {
            read_ids: [read_id0, read_id1],
            is_same_strand,
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.read_ids[0] < self.read_ids[1]
    }

    /// The two oriented reads to align: read 0 on the forward strand and
    /// read 1 on the strand implied by `is_same_strand`.
    pub fn oriented_read_ids(&self) -> [OrientedReadId; 2] {
        [
            OrientedReadId::new(self.read_ids[0], Strand::Forward),
            OrientedReadId::new(self.read_ids[1], Strand::from(self.is_same_strand)),
        ]
    }
}

/// Per-read flag bits, one byte per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct ReadFlags(u8);

impl ReadFlags {
    const PALINDROMIC: u8 = 1 << 0;

    pub fn is_palindromic(self) -> bool {
        self.0 & Self::PALINDROMIC != 0
    }

    pub fn set_palindromic(&mut self, value: bool) {
        if value {
            self.0 |= Self::PALINDROMIC;
        } else {
            self.0 &= !Self::PALINDROMIC;
        }
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oriented_read_id_packing() {
        let id = OrientedReadId::new(7, Strand::Reverse);
        assert_eq!(id.value(), 15);
        assert_eq!(id.read_id(), 7);
        assert_eq!(id.strand(), Strand::Reverse);
        assert_eq!(OrientedReadId::from_value(15), id);
    }

    #[test]
    fn test_flip_strand_toggles_low_bit() {
        let mut id = OrientedReadId::new(3, Strand::Forward);
        id.flip_strand();
        assert_eq!(id, OrientedReadId::new(3, Strand::Reverse));
        assert_eq!(id.flipped(), OrientedReadId::new(3, Strand::Forward));
    }

    #[test]
    fn test_ordering_matches_read_then_strand() {
        let mut ids = vec![
            OrientedReadId::new(2, Strand::Forward),
            OrientedReadId::new(1, Strand::Reverse),
            OrientedReadId::new(1, Strand::Forward),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                OrientedReadId::new(1, Strand::Forward),
                OrientedReadId::new(1, Strand::Reverse),
                OrientedReadId::new(2, Strand::Forward),
            ]
        );
    }

    #[test]
    fn test_display_and_parse() {
        let id = OrientedReadId::new(42, Strand::Reverse);
        assert_eq!(id.to_string(), "42-1");
        assert_eq!("42-1".parse::<OrientedReadId>().unwrap(), id);
        assert!("42-2".parse::<OrientedReadId>().is_err());
        assert!("42".parse::<OrientedReadId>().is_err());
    }

    #[test]
    fn test_candidate_orientation() {
        let same = OrientedReadPair::new(0, 5, true);
        assert_eq!(
            same.oriented_read_ids(),
            [OrientedReadId::new(0, Strand::Forward), OrientedReadId::new(5, Strand::Forward)]
        );
        let opposite = OrientedReadPair::new(0, 5, false);
        assert_eq!(opposite.oriented_read_ids()[1], OrientedReadId::new(5, Strand::Reverse));
        assert!(same.is_canonical());
        assert!(!OrientedReadPair::new(5, 5, true).is_canonical());
    }

    #[test]
    fn test_read_flags() {
        let mut flags = ReadFlags::default();
        assert!(!flags.is_palindromic());
        flags.set_palindromic(true);
        assert!(flags.is_palindromic());
        assert_eq!(flags.bits(), 1);
        flags.set_palindromic(false);
        assert_eq!(flags, ReadFlags::default());
    }
}
