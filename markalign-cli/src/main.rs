use anyhow::Result;
use clap::{Parser, Subcommand};
use markalign_core::OrientedReadId;
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod progress;

use commands::align::AlignOverrides;
use commands::palindromes::PalindromeOverrides;
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "markalign")]
#[command(about = "markalign - marker alignments and alignment index for long reads")]
#[command(version)]
#[command(long_about = "
markalign aligns candidate read pairs in marker space, keeps the alignments that
pass the quality filters and indexes them by oriented read. It also flags reads
that align with their own reverse complement.

Examples:
  markalign align --markers reads.markers --candidates pairs.txt --out data/
  markalign query --data data/ --read 12-0
  markalign pair --markers reads.markers --read0 12-0 --read1 40-1
  markalign overlaps --markers reads.markers --data data/ --read 12-0
  markalign palindromes --markers reads.markers --out data/
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use (0 for all cores)
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Marker k-mer length
    #[arg(short, long, global = true)]
    pub k: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute alignments of candidate pairs and write the alignment store
    Align {
        /// Marker list, one read per line (optionally gzipped)
        #[arg(long, required = true)]
        markers: PathBuf,

        /// Candidate pairs: '<read0> <read1> <same strand>' per line
        #[arg(long, required = true)]
        candidates: PathBuf,

        /// Output data directory
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Minimum number of aligned markers
        #[arg(long)]
        min_aligned_marker_count: Option<u32>,

        /// Maximum left or right trim in markers
        #[arg(long)]
        max_trim: Option<u32>,

        /// Maximum ordinal skip between aligned markers
        #[arg(long)]
        max_skip: Option<u32>,

        /// Maximum ordinal drift between aligned markers
        #[arg(long)]
        max_drift: Option<u32>,

        /// Ignore k-mers more frequent than this in a read
        #[arg(long)]
        max_marker_frequency: Option<u32>,

        /// Write a JSON summary of the run
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// List the stored alignments of an oriented read
    Query {
        /// Data directory written by 'align'
        #[arg(long, required = true)]
        data: PathBuf,

        /// Oriented read as <readId>-<strand>
        #[arg(long, required = true)]
        read: OrientedReadId,
    },

    /// Align two oriented reads
    Pair {
        /// Marker list, one read per line (optionally gzipped)
        #[arg(long, required = true)]
        markers: PathBuf,

        /// First oriented read as <readId>-<strand>
        #[arg(long, required = true)]
        read0: OrientedReadId,

        /// Second oriented read as <readId>-<strand>
        #[arg(long, required = true)]
        read1: OrientedReadId,

        /// Include the aligned ordinal pairs
        #[arg(long)]
        show_alignment: bool,
    },

    /// Recompute the alignments of an oriented read against its indexed partners
    Overlaps {
        /// Marker list, one read per line (optionally gzipped)
        #[arg(long, required = true)]
        markers: PathBuf,

        /// Data directory written by 'align'
        #[arg(long, required = true)]
        data: PathBuf,

        /// Oriented read as <readId>-<strand>
        #[arg(long, required = true)]
        read: OrientedReadId,
    },

    /// Flag palindromic reads
    Palindromes {
        /// Marker list, one read per line (optionally gzipped)
        #[arg(long, required = true)]
        markers: PathBuf,

        /// Output data directory
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Minimum fraction of markers that align
        #[arg(long)]
        aligned_fraction: Option<f64>,

        /// Minimum fraction of markers aligned near the diagonal
        #[arg(long)]
        near_diagonal_fraction: Option<f64>,

        /// Ordinal distance below which an aligned pair is near the diagonal
        #[arg(long)]
        delta: Option<u32>,

        /// CSV listing the palindromic reads (default: <out>/PalindromicReads.csv)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a JSON summary of the run
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Print an example configuration, or write it to a file
    Config {
        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(threads) = cli.threads {
        config.general.threads = threads;
    }
    if let Some(k) = cli.k {
        config.general.k = k;
    }

    match cli.command {
        Commands::Align {
            markers,
            candidates,
            out,
            min_aligned_marker_count,
            max_trim,
            max_skip,
            max_drift,
            max_marker_frequency,
            summary,
        } => {
            let overrides = AlignOverrides {
                min_aligned_marker_count,
                max_trim,
                max_skip,
                max_drift,
                max_marker_frequency,
            };
            commands::align::execute(&config, cli.quiet, markers, candidates, out, overrides, summary)?;
        }

        Commands::Query { data, read } => {
            commands::query::execute(data, read)?;
        }

        Commands::Pair {
            markers,
            read0,
            read1,
            show_alignment,
        } => {
            commands::pair::execute(&config, markers, read0, read1, show_alignment)?;
        }

        Commands::Overlaps {
            markers,
            data,
            read,
        } => {
            commands::overlaps::execute(&config, markers, data, read)?;
        }

        Commands::Palindromes {
            markers,
            out,
            aligned_fraction,
            near_diagonal_fraction,
            delta,
            csv,
            summary,
        } => {
            let overrides = PalindromeOverrides {
                aligned_fraction_threshold: aligned_fraction,
                near_diagonal_fraction_threshold: near_diagonal_fraction,
                delta_threshold: delta,
            };
            commands::palindromes::execute(&config, cli.quiet, markers, out, overrides, csv, summary)?;
        }

        Commands::Config { out } => match out {
            Some(path) => {
                config.save_to_file(&path)?;
                log::info!("Configuration written to {}", path.display());
            }
            None => print!("{}", Config::example_toml()?),
        },
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        if let Some(cli_error) = err.downcast_ref::<CliError>() {
            print_error_and_exit(cli_error);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
