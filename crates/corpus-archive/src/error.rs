//! Error types for archive writing and inspection.

use thiserror::Error;

/// Errors that can occur while writing or reading back an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry name longer than the 16-bit name length field allows.
    #[error("Entry name too long ({len} bytes): {name}")]
    NameTooLong { name: String, len: usize },

    /// Archive structure could not be parsed.
    #[error("Invalid archive: {0}")]
    Invalid(String),
}
