use corpus_core::{AnomalyKind, LoadFileFormat};
use thiserror::Error;

/// Errors raised while setting up fault injection.
#[derive(Debug, Error)]
pub enum ChaosError {
    /// The load file format is not line-oriented
    #[error("Chaos mode is not supported for {0} load files")]
    UnsupportedFormat(LoadFileFormat),

    /// An enabled anomaly type does not apply to the format
    #[error("Anomaly type '{kind}' cannot be applied to {format} load files")]
    InapplicableType {
        kind: AnomalyKind,
        format: LoadFileFormat,
    },
}
