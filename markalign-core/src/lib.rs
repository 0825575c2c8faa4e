//! markalign core library
//!
//! Marker alignment orchestration over large candidate sets, the canonical
//! alignment store, the bidirectional alignment index and the palindromic
//! read detector.

pub mod alignment;
pub mod batch;
pub mod chain;
pub mod compute;
pub mod containers;
pub mod error;
pub mod index;
pub mod io;
pub mod markers;
pub mod palindrome;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types and functions
pub use alignment::{AlignBounds, AlignedSpan, Aligner, Alignment, AlignmentData, AlignmentInfo};
pub use chain::MarkerChainer;
pub use compute::{
    classify_alignment, compute_alignments, AlignmentVerdict, ComputeAlignmentsParams,
    ComputeAlignmentsSummary,
};
pub use error::{PipelineError, PipelineResult};
pub use index::{build_alignment_table, AlignmentTable, TableView};
pub use markers::{MarkerSource, MarkerStore};
pub use palindrome::{flag_palindromic_reads, PalindromeParams, PalindromeSummary};
pub use pipeline::AlignmentPipeline;
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use query::find_alignments;
pub use store::{AlignmentStore, StoreError};
pub use types::{OrientedReadId, OrientedReadPair, ReadFlags, ReadId, Strand};

/// Version information for the markalign core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
