//! Command implementations for the markalign CLI

pub mod align;
pub mod overlaps;
pub mod pair;
pub mod palindromes;
pub mod query;

use anyhow::{Context, Result};
use markalign_core::io::{parse_candidates_file, parse_markers_file};
use markalign_core::markers::MAX_K;
use markalign_core::{
    AlignmentPipeline, MarkerChainer, MarkerStore, NoProgress, OrientedReadPair, PipelineError,
};
use serde::Serialize;
use std::path::Path;

use crate::error::CliError;
use crate::progress::BarProgress;

pub type Pipeline = AlignmentPipeline<MarkerStore, MarkerChainer>;

/// Pipeline with a progress bar, or silent in quiet mode.
pub fn new_pipeline(quiet: bool) -> Pipeline {
    let pipeline = AlignmentPipeline::new(MarkerChainer::new());
    if quiet {
        pipeline.with_progress(Box::new(NoProgress))
    } else {
        pipeline.with_progress(Box::new(BarProgress::new()))
    }
}

pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 || k > MAX_K {
        return Err(CliError::validation(format!("k must be between 1 and {}, got {}", MAX_K, k)).into());
    }
    Ok(())
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }
    Ok(())
}

pub fn load_markers(path: &Path, k: usize) -> Result<MarkerStore> {
    validate_k(k)?;
    require_file(path)?;
    log::info!("Loading markers from {}", path.display());
    parse_markers_file(path, k)
        .map_err(|err| CliError::parse(path.display().to_string(), err.to_string()).into())
}

pub fn load_candidates(path: &Path) -> Result<Vec<OrientedReadPair>> {
    require_file(path)?;
    log::info!("Loading alignment candidates from {}", path.display());
    parse_candidates_file(path)
        .map_err(|err| CliError::parse(path.display().to_string(), err.to_string()).into())
}

/// Map store failures to a CLI error carrying recovery suggestions.
pub fn store_context(err: PipelineError) -> anyhow::Error {
    match err {
        PipelineError::Store(store_error) => CliError::store(store_error.to_string()).into(),
        other => other.into(),
    }
}

pub fn write_summary<T: Serialize>(path: Option<&Path>, summary: &T) -> Result<()> {
    if let Some(path) = path {
        let content = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        log::info!("Summary written to {}", path.display());
    }
    Ok(())
}
