//! Generation pipeline for corpus-forge.
//!
//! Turns a validated [`GenerationRequest`](corpus_core::GenerationRequest)
//! into a ZIP archive, a load file and a JSON run manifest.
//!
//! ## Features
//!
//! - **Bounded concurrency**: worker tasks claim indices from an atomic
//!   counter; at most `2 × concurrency` items are in flight
//! - **Deterministic output**: the archive and load file depend only on the
//!   request and seed, never on scheduling
//! - **Streaming writer**: one blocking thread writes entries in index order
//!   through a reorder buffer; nothing is held beyond the in-flight window
//! - **Target size**: payloads are padded to approach a requested archive size
//! - **Chaos mode**: load file lines are corrupted on the way to disk
//!
//! ## Example
//!
//! ```rust,no_run
//! use corpus_core::GenerationRequest;
//! use corpus_pipeline::{CorpusPipeline, OutputOptions};
//!
//! # async fn run() -> Result<(), corpus_pipeline::PipelineError> {
//! let request = GenerationRequest::new(1000).with_folders(10).with_seed(42);
//! let report = CorpusPipeline::new(request, OutputOptions::new("out").with_name("demo"))?
//!     .run()
//!     .await?;
//! println!("{} entries", report.metrics.archive_entries);
//! # Ok(())
//! # }
//! ```

pub mod args;
mod error;
pub mod metrics;
mod pipeline;
pub mod pool;
pub mod reorder;
pub mod run_manifest;
pub mod sizing;
pub mod writer;

pub use args::{parse_size, GenerateArgs};
pub use error::PipelineError;
pub use metrics::GenerationMetrics;
pub use pipeline::{CorpusPipeline, OutputOptions, RunReport};
pub use pool::{BufferPool, PoolStats};
pub use run_manifest::RunManifest;
pub use writer::OutputPaths;
