//! Text inputs for the alignment pipeline
//!
//! Marker lists and candidate lists are plain text, optionally gzipped
//! (detected by a `.gz` extension). `#` starts a comment line.

pub mod candidates;
pub mod markers;

pub use candidates::{parse_candidates, parse_candidates_file};
pub use markers::{parse_markers, parse_markers_file};

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl ParseError {
    fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Open a text input, transparently decompressing `.gz` files.
pub fn open_text<P: AsRef<Path>>(path: P) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(&path)?;
    let path_str = path.as_ref().to_string_lossy();

    let reader: Box<dyn Read> = if path_str.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}
