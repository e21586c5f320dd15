//! Load file fault injection.
//!
//! The chaos engine sits between the load file formatter and the manifest
//! sink. It decides up front which lines will be corrupted and with which
//! anomaly, then rewrites exactly those lines as the writer emits them.
//!
//! ```text
//! ManifestRow ──► LoadFileFormatter ──► line ──► ChaosEngine::intercept ──► EmittedLine ──► sink
//!                                                       │
//!                                                       └──► AnomalyRecord (run manifest)
//! ```
//!
//! Selection depends only on the chaos seed and the number of data lines, so
//! the same run always corrupts the same lines in the same way.

mod anomaly;
mod engine;
mod error;
mod record;
pub mod selection;

pub use anomaly::{field_separators, EmittedLine};
pub use engine::ChaosEngine;
pub use error::ChaosError;
pub use record::AnomalyRecord;
pub use selection::select_lines;
