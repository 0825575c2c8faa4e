//! Candidate list parser
//!
//! One candidate per non-comment line: `read0 read1 same_strand`, where
//! `same_strand` is one of `1`, `true`, `+` or `0`, `false`, `-`.

use super::{is_comment, open_text, ParseError, ParseResult};
use crate::types::{OrientedReadPair, ReadId};
use std::io::BufRead;
use std::path::Path;

fn parse_same_strand(field: &str) -> Option<bool> {
    match field {
        "1" | "true" | "+" => Some(true),
        "0" | "false" | "-" => Some(false),
        _ => None,
    }
}

/// Parse a single candidate line.
pub fn parse_candidate_line(line: &str, line_num: usize) -> ParseResult<OrientedReadPair> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(ParseError::malformed(
            line_num,
            format!("expected 3 fields, got {}", fields.len()),
        ));
    }

    let read_id = |field: &str| -> ParseResult<ReadId> {
        field
            .parse()
            .map_err(|_| ParseError::malformed(line_num, format!("invalid read id {:?}", field)))
    };
    let read0 = read_id(fields[0])?;
    let read1 = read_id(fields[1])?;
    let same_strand = parse_same_strand(fields[2]).ok_or_else(|| {
        ParseError::malformed(line_num, format!("invalid strand flag {:?}", fields[2]))
    })?;

    Ok(OrientedReadPair::new(read0, read1, same_strand))
}

pub fn parse_candidates<R: BufRead>(reader: R) -> ParseResult<Vec<OrientedReadPair>> {
    let mut candidates = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || is_comment(&line) {
            continue;
        }
        candidates.push(parse_candidate_line(&line, line_num + 1)?);
    }
    log::info!("Loaded {} alignment candidates", candidates.len());
    Ok(candidates)
}

pub fn parse_candidates_file<P: AsRef<Path>>(path: P) -> ParseResult<Vec<OrientedReadPair>> {
    parse_candidates(open_text(path)?)
}
