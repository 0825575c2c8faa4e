//! Query command implementation - list the stored alignments of an oriented read

use anyhow::{Context, Result};
use markalign_core::{AlignmentInfo, OrientedReadId};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::{new_pipeline, store_context};

/// One alignment as printed, in the frame of the queried oriented read.
#[derive(Debug, Serialize)]
pub struct AlignmentRow {
    pub read: String,
    pub partner: String,
    pub marker_count: u32,
    pub left_trim: u32,
    pub right_trim: u32,
    pub ordinal_offset: i64,
    pub info: AlignmentInfo,
}

impl AlignmentRow {
    pub fn new(read: OrientedReadId, partner: OrientedReadId, info: AlignmentInfo) -> Self {
        let (left_trim, right_trim) = info.trim();
        Self {
            read: read.to_string(),
            partner: partner.to_string(),
            marker_count: info.marker_count,
            left_trim,
            right_trim,
            ordinal_offset: info.ordinal_offset(),
            info,
        }
    }
}

pub fn execute(data: PathBuf, read: OrientedReadId) -> Result<()> {
    let mut pipeline = new_pipeline(true);
    pipeline.access_alignment_data(&data).map_err(store_context)?;

    let alignments = pipeline
        .find_alignments(read)
        .context("Failed to query the alignment table")?;
    log::info!("Oriented read {} has {} alignments", read, alignments.len());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_rows(&mut out, read, &alignments)?;
    out.flush()?;
    Ok(())
}

fn write_rows<W: Write>(
    out: &mut W,
    read: OrientedReadId,
    alignments: &[(OrientedReadId, AlignmentInfo)],
) -> Result<()> {
    for &(partner, info) in alignments {
        serde_json::to_writer(&mut *out, &AlignmentRow::new(read, partner, info))?;
        writeln!(out)?;
    }
    Ok(())
}
