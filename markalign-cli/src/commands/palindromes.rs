//! Palindromes command implementation - flag reads that align with their own reverse complement

use anyhow::{Context, Result};
use markalign_core::palindrome::PALINDROMIC_READS_CSV;
use std::path::PathBuf;

use super::{load_markers, new_pipeline, store_context, write_summary};
use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct PalindromeOverrides {
    pub aligned_fraction_threshold: Option<f64>,
    pub near_diagonal_fraction_threshold: Option<f64>,
    pub delta_threshold: Option<u32>,
}

pub fn execute(
    config: &Config,
    quiet: bool,
    markers: PathBuf,
    out: PathBuf,
    overrides: PalindromeOverrides,
    csv: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    let mut params = config.palindrome_params();
    if let Some(value) = overrides.aligned_fraction_threshold {
        params.aligned_fraction_threshold = value;
    }
    if let Some(value) = overrides.near_diagonal_fraction_threshold {
        params.near_diagonal_fraction_threshold = value;
    }
    if let Some(value) = overrides.delta_threshold {
        params.delta_threshold = value;
    }
    log::debug!("Palindrome parameters: {:?}", params);

    let mut pipeline = new_pipeline(quiet);
    pipeline.set_markers(load_markers(&markers, config.general.k)?);

    let result = pipeline
        .flag_palindromic_reads(&params)
        .context("Failed to flag palindromic reads")?;

    pipeline.write_read_flags(&out).map_err(store_context)?;

    let csv = csv.unwrap_or_else(|| out.join(PALINDROMIC_READS_CSV));
    let written = pipeline
        .write_palindromic_reads_csv(&csv)
        .with_context(|| format!("Failed to write {}", csv.display()))?;
    log::info!("Listed {} palindromic reads in {}", written, csv.display());

    write_summary(summary.as_deref(), &result)
}
