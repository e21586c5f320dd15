//! Error types for the generation pipeline.

use chaos_engine::ChaosError;
use corpus_archive::ArchiveError;
use corpus_core::ConfigError;
use corpus_generator::ContentError;
use loadfile_types::FormatError;
use thiserror::Error;

/// Errors that can occur during a generation run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid or conflicting configuration, detected before any output
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chaos engine setup error
    #[error("Chaos configuration error: {0}")]
    Chaos(#[from] ChaosError),

    /// Content generation failed for one item
    #[error("Content generation failed for item {index}: {source}")]
    Generation {
        index: u64,
        #[source]
        source: ContentError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive writer error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Load file formatting error
    #[error("Load file error: {0}")]
    Format(#[from] FormatError),

    /// Run manifest serialization error
    #[error("Run manifest error: {0}")]
    Json(#[from] serde_json::Error),

    /// The writer stopped before every item was written
    #[error("Generation incomplete: {written} of {total} items written")]
    Incomplete { written: u64, total: u64 },

    /// A worker or writer task panicked or was aborted
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The run was cancelled after another failure
    #[error("Generation cancelled")]
    Cancelled,
}
