//! Configuration handling for the markalign CLI
//!
//! Supports loading configuration from markalign.toml files with CLI argument overrides.

use crate::error::CliError;
use anyhow::{Context, Result};
use markalign_core::{ComputeAlignmentsParams, PalindromeParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "markalign.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub align: AlignConfig,
    #[serde(default)]
    pub palindrome: PalindromeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Worker threads, 0 for all available cores
    #[serde(default)]
    pub threads: usize,

    /// Marker k-mer length
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignConfig {
    #[serde(default = "default_max_marker_frequency")]
    pub max_marker_frequency: u32,

    #[serde(default = "default_align_max_skip")]
    pub max_skip: u32,

    #[serde(default = "default_align_max_drift")]
    pub max_drift: u32,

    /// Alignments with fewer aligned markers are discarded
    #[serde(default = "default_min_aligned_marker_count")]
    pub min_aligned_marker_count: u32,

    /// Alignments with more left or right trim are discarded
    #[serde(default = "default_max_trim")]
    pub max_trim: u32,

    /// Upper bound on candidates claimed by a worker at once
    #[serde(default = "default_align_batch_size")]
    pub max_batch_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalindromeConfig {
    #[serde(default = "default_max_marker_frequency")]
    pub max_marker_frequency: u32,

    #[serde(default = "default_palindrome_max_skip")]
    pub max_skip: u32,

    #[serde(default = "default_palindrome_max_drift")]
    pub max_drift: u32,

    #[serde(default = "default_fraction_threshold")]
    pub aligned_fraction_threshold: f64,

    #[serde(default = "default_fraction_threshold")]
    pub near_diagonal_fraction_threshold: f64,

    /// Aligned pairs closer than this to the diagonal count as near-diagonal
    #[serde(default = "default_delta_threshold")]
    pub delta_threshold: u32,

    #[serde(default = "default_palindrome_batch_size")]
    pub batch_size: u64,
}

// Default value functions
fn default_k() -> usize { 10 }
fn default_max_marker_frequency() -> u32 { 10 }
fn default_align_max_skip() -> u32 { 30 }
fn default_align_max_drift() -> u32 { 30 }
fn default_min_aligned_marker_count() -> u32 { 100 }
fn default_max_trim() -> u32 { 30 }
fn default_align_batch_size() -> u64 { 10_000 }
fn default_palindrome_max_skip() -> u32 { 100 }
fn default_palindrome_max_drift() -> u32 { 100 }
fn default_fraction_threshold() -> f64 { 0.1 }
fn default_delta_threshold() -> u32 { 100 }
fn default_palindrome_batch_size() -> u64 { 1000 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            k: default_k(),
        }
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            max_marker_frequency: default_max_marker_frequency(),
            max_skip: default_align_max_skip(),
            max_drift: default_align_max_drift(),
            min_aligned_marker_count: default_min_aligned_marker_count(),
            max_trim: default_max_trim(),
            max_batch_size: default_align_batch_size(),
        }
    }
}

impl Default for PalindromeConfig {
    fn default() -> Self {
        Self {
            max_marker_frequency: default_max_marker_frequency(),
            max_skip: default_palindrome_max_skip(),
            max_drift: default_palindrome_max_drift(),
            aligned_fraction_threshold: default_fraction_threshold(),
            near_diagonal_fraction_threshold: default_fraction_threshold(),
            delta_threshold: default_delta_threshold(),
            batch_size: default_palindrome_batch_size(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }

    pub fn compute_alignments_params(&self) -> ComputeAlignmentsParams {
        ComputeAlignmentsParams {
            max_marker_frequency: self.align.max_marker_frequency,
            max_skip: self.align.max_skip,
            max_drift: self.align.max_drift,
            min_aligned_marker_count: self.align.min_aligned_marker_count,
            max_trim: self.align.max_trim,
            thread_count: self.general.threads,
            max_batch_size: self.align.max_batch_size,
        }
    }

    pub fn palindrome_params(&self) -> PalindromeParams {
        PalindromeParams {
            max_skip: self.palindrome.max_skip,
            max_drift: self.palindrome.max_drift,
            max_marker_frequency: self.palindrome.max_marker_frequency,
            aligned_fraction_threshold: self.palindrome.aligned_fraction_threshold,
            near_diagonal_fraction_threshold: self.palindrome.near_diagonal_fraction_threshold,
            delta_threshold: self.palindrome.delta_threshold,
            thread_count: self.general.threads,
            batch_size: self.palindrome.batch_size,
        }
    }
}
