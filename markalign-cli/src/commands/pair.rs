//! Pair command implementation - align two oriented reads on demand

use anyhow::{Context, Result};
use markalign_core::OrientedReadId;
use serde::Serialize;
use std::path::PathBuf;

use super::query::AlignmentRow;
use super::{load_markers, new_pipeline};
use crate::config::Config;

#[derive(Debug, Serialize)]
struct PairOutput {
    #[serde(flatten)]
    row: AlignmentRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    ordinals: Option<Vec<[u32; 2]>>,
}

pub fn execute(
    config: &Config,
    markers: PathBuf,
    read0: OrientedReadId,
    read1: OrientedReadId,
    show_alignment: bool,
) -> Result<()> {
    let mut pipeline = new_pipeline(true);
    pipeline.set_markers(load_markers(&markers, config.general.k)?);

    let bounds = config.compute_alignments_params().bounds();
    let (alignment, info) = pipeline
        .align_oriented_reads(read0, read1, &bounds)
        .with_context(|| format!("Failed to align {} with {}", read0, read1))?;

    let output = PairOutput {
        row: AlignmentRow::new(read0, read1, info),
        ordinals: show_alignment.then_some(alignment.ordinals),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use markalign_core::Strand;

    #[test]
    fn test_out_of_range_read_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let markers = dir.path().join("reads.markers");
        std::fs::write(&markers, "1 2 3\n")?;
        let result = execute(
            &Config::default(),
            markers,
            OrientedReadId::new(0, Strand::Forward),
            OrientedReadId::new(4, Strand::Reverse),
            false,
        );
        assert!(result.is_err());
        Ok(())
    }
}
