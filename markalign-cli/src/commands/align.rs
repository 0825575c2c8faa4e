//! Align command implementation - compute, filter and index candidate alignments

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::{load_candidates, load_markers, new_pipeline, store_context, write_summary};
use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct AlignOverrides {
    pub min_aligned_marker_count: Option<u32>,
    pub max_trim: Option<u32>,
    pub max_skip: Option<u32>,
    pub max_drift: Option<u32>,
    pub max_marker_frequency: Option<u32>,
}

pub fn execute(
    config: &Config,
    quiet: bool,
    markers: PathBuf,
    candidates: PathBuf,
    out: PathBuf,
    overrides: AlignOverrides,
    summary: Option<PathBuf>,
) -> Result<()> {
    let mut params = config.compute_alignments_params();
    if let Some(value) = overrides.min_aligned_marker_count {
        params.min_aligned_marker_count = value;
    }
    if let Some(value) = overrides.max_trim {
        params.max_trim = value;
    }
    if let Some(value) = overrides.max_skip {
        params.max_skip = value;
    }
    if let Some(value) = overrides.max_drift {
        params.max_drift = value;
    }
    if let Some(value) = overrides.max_marker_frequency {
        params.max_marker_frequency = value;
    }
    log::debug!("Alignment parameters: {:?}", params);

    let mut pipeline = new_pipeline(quiet);
    pipeline.set_markers(load_markers(&markers, config.general.k)?);
    pipeline.set_candidates(load_candidates(&candidates)?);

    let result = pipeline
        .compute_alignments(&params)
        .context("Failed to compute alignments")?;
    log::info!(
        "Kept {} of {} candidates ({} too few markers, {} too much trim)",
        result.accepted_count,
        result.candidate_count,
        result.too_few_markers_count,
        result.too_much_trim_count
    );

    pipeline.write_alignment_data(&out).map_err(store_context)?;
    log::info!("Alignment data written to {}", out.display());

    write_summary(summary.as_deref(), &result)
}
