//! Marker list parser
//!
//! One read per non-comment line, in read id order: the whitespace separated
//! k-mer ids of its markers on the forward strand. A blank line is a read
//! without markers.

use super::{is_comment, open_text, ParseError, ParseResult};
use crate::markers::MarkerStore;
use crate::types::KmerId;
use std::io::BufRead;
use std::path::Path;

/// Parse a marker list for k-mers of length `k`.
pub fn parse_markers<R: BufRead>(reader: R, k: usize) -> ParseResult<MarkerStore> {
    let mut store = MarkerStore::new(k);
    let kmer_limit: u64 = 1u64 << (2 * k);
    let mut kmer_ids: Vec<KmerId> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if is_comment(&line) {
            continue;
        }

        kmer_ids.clear();
        for field in line.split_whitespace() {
            let kmer_id: u64 = field.parse().map_err(|_| {
                ParseError::malformed(line_num + 1, format!("invalid k-mer id {:?}", field))
            })?;
            if kmer_id >= kmer_limit {
                return Err(ParseError::malformed(
                    line_num + 1,
                    format!("k-mer id {} does not fit k = {}", kmer_id, k),
                ));
            }
            kmer_ids.push(kmer_id as KmerId);
        }
        store.push_read(&kmer_ids);
    }

    log::info!(
        "Loaded {} markers for {} reads",
        store.total_marker_count(),
        crate::markers::MarkerSource::read_count(&store)
    );
    Ok(store)
}

pub fn parse_markers_file<P: AsRef<Path>>(path: P, k: usize) -> ParseResult<MarkerStore> {
    parse_markers(open_text(path)?, k)
}
