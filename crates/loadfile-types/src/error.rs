use thiserror::Error;

/// Errors that can occur while formatting a load file line.
#[derive(Debug, Error)]
pub enum FormatError {
    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not hand back its buffer
    #[error("CSV buffer error: {0}")]
    Buffer(String),

    /// Delimiter not representable by the formatter
    #[error("Invalid delimiter for {format}: {reason}")]
    InvalidDelimiter {
        format: &'static str,
        reason: String,
    },
}
