//! Overlaps command implementation - recompute the indexed alignments of an oriented read

use anyhow::{Context, Result};
use markalign_core::OrientedReadId;
use std::path::PathBuf;

use super::{load_markers, new_pipeline, store_context};
use crate::config::Config;

pub fn execute(
    config: &Config,
    markers: PathBuf,
    data: PathBuf,
    read: OrientedReadId,
) -> Result<()> {
    let mut pipeline = new_pipeline(true);
    pipeline.set_markers(load_markers(&markers, config.general.k)?);
    pipeline.access_alignment_data(&data).map_err(store_context)?;

    let params = config.compute_alignments_params();
    let report = pipeline
        .align_overlapping_oriented_reads(
            read,
            &params.bounds(),
            params.min_aligned_marker_count,
            params.max_trim,
        )
        .with_context(|| format!("Failed to recompute the alignments of {}", read))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
