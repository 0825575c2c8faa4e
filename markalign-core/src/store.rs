//! Binary alignment store
//!
//! Every artifact is one file made of a fixed 64-byte little-endian header
//! followed by a flat payload that can be memory mapped and viewed in place:
//!
//! - `AlignmentData`  { records: [AlignmentData; key_count] }
//! - `AlignmentTable` { offsets: [u64; key_count + 1], values: [u32; value_count] }
//! - `ReadFlags`      { flags: [u8; key_count] }
//!
//! Header { magic, version, build_timestamp, element_size, flags,
//!          key_count, value_count, xxh64(payload), padding }

use crate::alignment::AlignmentData;
use crate::index::{AlignmentTable, TableView};
use crate::types::ReadFlags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytemuck::Pod;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh64::Xxh64;

pub const ALIGNMENT_DATA_MAGIC: &[u8; 4] = b"MKAD";
pub const ALIGNMENT_TABLE_MAGIC: &[u8; 4] = b"MKAT";
pub const READ_FLAGS_MAGIC: &[u8; 4] = b"MKRF";

/// Current binary format version
const STORE_VERSION: u32 = 1;

pub const HEADER_SIZE: usize = 64;

/// File names inside a data directory.
pub const ALIGNMENT_DATA_FILE: &str = "AlignmentData";
pub const ALIGNMENT_TABLE_FILE: &str = "AlignmentTable";
pub const READ_FLAGS_FILE: &str = "ReadFlags";

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes: expected {0}")]
    InvalidMagic(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    #[error("Element size mismatch: expected {expected} bytes, found {found}")]
    ElementSizeMismatch { expected: u32, found: u32 },

    #[error("Checksum mismatch: header says {expected:#018x}, payload hashes to {found:#018x}")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("Data corruption: {0}")]
    Corruption(String),

    #[error("Misaligned mapping: {0}")]
    Misaligned(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Header section of every store file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub build_timestamp: u64,
    pub element_size: u32,
    pub flags: u32,
    pub key_count: u64,
    pub value_count: u64,
    pub checksum: u64,
}

impl Header {
    fn new(magic: &[u8; 4], element_size: u32, key_count: u64, value_count: u64, checksum: u64) -> Self {
        Self {
            magic: *magic,
            version: STORE_VERSION,
            build_timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
            element_size,
            flags: 0,
            key_count,
            value_count,
            checksum,
        }
    }

    fn write<W: Write>(&self, writer: &mut W) -> StoreResult<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.build_timestamp)?;
        writer.write_u32::<LittleEndian>(self.element_size)?;
        writer.write_u32::<LittleEndian>(self.flags)?;
        writer.write_u64::<LittleEndian>(self.key_count)?;
        writer.write_u64::<LittleEndian>(self.value_count)?;
        writer.write_u64::<LittleEndian>(self.checksum)?;
        writer.write_all(&[0u8; HEADER_SIZE - 48])?;
        Ok(())
    }

    fn read<R: Read>(reader: &mut R, expected_magic: &[u8; 4]) -> StoreResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if &magic != expected_magic {
            return Err(StoreError::InvalidMagic(
                String::from_utf8_lossy(expected_magic).to_string(),
            ));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        let build_timestamp = reader.read_u64::<LittleEndian>()?;
        let element_size = reader.read_u32::<LittleEndian>()?;
        let flags = reader.read_u32::<LittleEndian>()?;
        let key_count = reader.read_u64::<LittleEndian>()?;
        let value_count = reader.read_u64::<LittleEndian>()?;
        let checksum = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            build_timestamp,
            element_size,
            flags,
            key_count,
            value_count,
            checksum,
        })
    }
}

fn checksum(sections: &[&[u8]]) -> u64 {
    let mut hasher = Xxh64::new(0);
    for section in sections {
        hasher.update(section);
    }
    hasher.digest()
}

/// Write a header and the concatenated payload sections to `path`.
fn write_file(
    path: &Path,
    magic: &[u8; 4],
    element_size: u32,
    key_count: u64,
    value_count: u64,
    sections: &[&[u8]],
) -> StoreResult<()> {
    let header = Header::new(magic, element_size, key_count, value_count, checksum(sections));
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    header.write(&mut writer)?;
    for section in sections {
        writer.write_all(section)?;
    }
    writer.flush()?;
    Ok(())
}

/// Map a store file read-only and validate its header and checksum.
/// `payload_len` gives the expected payload size for a header, or `None`
/// when the header counts overflow.
fn open_file(
    path: &Path,
    magic: &[u8; 4],
    element_size: u32,
    payload_len: impl Fn(&Header) -> Option<u64>,
) -> StoreResult<(Mmap, Header)> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and store files are never modified
    // in place once written.
    let mmap = unsafe { Mmap::map(&file)? };
    if mmap.len() < HEADER_SIZE {
        return Err(StoreError::Corruption(format!(
            "{}: file shorter than its header",
            path.display()
        )));
    }

    let header = Header::read(&mut &mmap[..HEADER_SIZE], magic)?;
    if header.element_size != element_size {
        return Err(StoreError::ElementSizeMismatch {
            expected: element_size,
            found: header.element_size,
        });
    }

    let expected = payload_len(&header).ok_or_else(|| {
        StoreError::Corruption(format!(
            "{}: header counts {} and {} overflow the payload size",
            path.display(),
            header.key_count,
            header.value_count
        ))
    })?;
    let found = (mmap.len() - HEADER_SIZE) as u64;
    if expected != found {
        return Err(StoreError::Corruption(format!(
            "{}: payload is {} bytes, header implies {}",
            path.display(),
            found,
            expected
        )));
    }

    let actual = checksum(&[&mmap[HEADER_SIZE..]]);
    if actual != header.checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: header.checksum,
            found: actual,
        });
    }

    log::debug!(
        "Opened {} ({} keys, {} values)",
        path.display(),
        header.key_count,
        header.value_count
    );
    Ok((mmap, header))
}

/// Zero-copy view of `count` elements at byte `offset` of a mapping.
fn view<T: Pod>(bytes: &[u8], offset: usize, count: usize) -> StoreResult<&[T]> {
    let bytes = count
        .checked_mul(std::mem::size_of::<T>())
        .and_then(|len| offset.checked_add(len))
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            StoreError::Corruption(format!("{} elements at byte {} exceed the mapping", count, offset))
        })?;
    bytemuck::try_cast_slice(bytes).map_err(|e| StoreError::Misaligned(format!("{:?}", e)))
}

/// In-memory, append-only store of canonical alignment records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentStore {
    records: Vec<AlignmentData>,
}

impl AlignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AlignmentData>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: AlignmentData) {
        self.records.push(record);
    }

    /// Append a worker buffer, preserving its order.
    pub fn extend_from_slice(&mut self, records: &[AlignmentData]) {
        self.records.extend_from_slice(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AlignmentData> {
        self.records.get(index)
    }

    pub fn as_slice(&self) -> &[AlignmentData] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AlignmentData> {
        self.records
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        write_alignment_data(path, &self.records)
    }
}

pub fn write_alignment_data<P: AsRef<Path>>(path: P, records: &[AlignmentData]) -> StoreResult<()> {
    write_file(
        path.as_ref(),
        ALIGNMENT_DATA_MAGIC,
        std::mem::size_of::<AlignmentData>() as u32,
        records.len() as u64,
        0,
        &[bytemuck::cast_slice(records)],
    )
}

/// Read-only memory-mapped alignment records.
#[derive(Debug)]
pub struct MappedAlignmentData {
    mmap: Mmap,
    len: usize,
}

impl MappedAlignmentData {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let element_size = std::mem::size_of::<AlignmentData>();
        let (mmap, header) = open_file(
            path.as_ref(),
            ALIGNMENT_DATA_MAGIC,
            element_size as u32,
            |header| header.key_count.checked_mul(element_size as u64),
        )?;
        let len = header.key_count as usize;
        view::<AlignmentData>(&mmap, HEADER_SIZE, len)?;
        Ok(Self { mmap, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[AlignmentData] {
        // Alignment and length were validated by `open`.
        let end = HEADER_SIZE + self.len * std::mem::size_of::<AlignmentData>();
        bytemuck::cast_slice(&self.mmap[HEADER_SIZE..end])
    }
}

pub fn write_alignment_table<P: AsRef<Path>>(path: P, table: &AlignmentTable) -> StoreResult<()> {
    let offsets = table.offsets();
    let values = table.values();
    write_file(
        path.as_ref(),
        ALIGNMENT_TABLE_MAGIC,
        std::mem::size_of::<u32>() as u32,
        table.len() as u64,
        values.len() as u64,
        &[bytemuck::cast_slice(offsets), bytemuck::cast_slice(values)],
    )
}

/// Read-only memory-mapped alignment table.
#[derive(Debug)]
pub struct MappedAlignmentTable {
    mmap: Mmap,
    key_count: usize,
    value_count: usize,
}

impl MappedAlignmentTable {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let (mmap, header) = open_file(
            path.as_ref(),
            ALIGNMENT_TABLE_MAGIC,
            std::mem::size_of::<u32>() as u32,
            |header| {
                let offsets = header.key_count.checked_add(1)?.checked_mul(8)?;
                offsets.checked_add(header.value_count.checked_mul(4)?)
            },
        )?;
        // Both counts fit the mapped payload, hence usize.
        let key_count = header.key_count as usize;
        let value_count = header.value_count as usize;

        let offsets = view::<u64>(&mmap, HEADER_SIZE, key_count + 1)?;
        view::<u32>(&mmap, HEADER_SIZE + (key_count + 1) * 8, value_count)?;
        if offsets[0] != 0
            || offsets[key_count] != value_count as u64
            || offsets.windows(2).any(|w| w[0] > w[1])
        {
            return Err(StoreError::Corruption(format!(
                "{}: table offsets are inconsistent",
                path.as_ref().display()
            )));
        }

        Ok(Self {
            mmap,
            key_count,
            value_count,
        })
    }

    pub fn offsets(&self) -> &[u64] {
        let end = HEADER_SIZE + (self.key_count + 1) * 8;
        bytemuck::cast_slice(&self.mmap[HEADER_SIZE..end])
    }

    pub fn values(&self) -> &[u32] {
        let begin = HEADER_SIZE + (self.key_count + 1) * 8;
        bytemuck::cast_slice(&self.mmap[begin..begin + self.value_count * 4])
    }

    pub fn view(&self) -> TableView<'_> {
        TableView::new(self.offsets(), self.values())
    }

    /// Number of oriented-read keys.
    pub fn len(&self) -> usize {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }
}

pub fn write_read_flags<P: AsRef<Path>>(path: P, flags: &[ReadFlags]) -> StoreResult<()> {
    write_file(
        path.as_ref(),
        READ_FLAGS_MAGIC,
        1,
        flags.len() as u64,
        0,
        &[bytemuck::cast_slice(flags)],
    )
}

pub fn read_read_flags<P: AsRef<Path>>(path: P) -> StoreResult<Vec<ReadFlags>> {
    let (mmap, header) = open_file(path.as_ref(), READ_FLAGS_MAGIC, 1, |header| Some(header.key_count))?;
    let flags = view::<ReadFlags>(&mmap, HEADER_SIZE, header.key_count as usize)?;
    Ok(flags.to_vec())
}
