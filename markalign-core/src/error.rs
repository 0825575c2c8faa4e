use crate::store::StoreError;
use crate::types::ReadId;
use thiserror::Error;

/// Errors raised by the alignment pipeline before or around its parallel
/// stages. Invariant violations inside a stage panic instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0} must be loaded before this operation")]
    NotLoaded(&'static str),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Candidate {index} ({read0}, {read1}) is not in canonical order")]
    NonCanonicalCandidate {
        index: usize,
        read0: ReadId,
        read1: ReadId,
    },

    #[error("Read {read_id} is out of range, {read_count} reads are loaded")]
    ReadOutOfRange { read_id: ReadId, read_count: ReadId },

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
