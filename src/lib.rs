//! corpus-forge
//!
//! Generates large, reproducible synthetic document corpora for exercising
//! e-discovery review and ingestion pipelines: a streamed ZIP archive of
//! documents, a load file describing them and a JSON run manifest.
//!
//! # Workspace Crates
//!
//! - `corpus_core` - request model, enums and YAML profiles
//! - `corpus_generator` - folder distribution, per-item seeding and document encoders
//! - `corpus_archive` - streaming ZIP/ZIP64 writer and read-back
//! - `loadfile_types` - DAT, Concordance, OPT, CSV and XML formatters
//! - `chaos_engine` - deterministic load file corruption
//! - `corpus_pipeline` - concurrent generation and the writer stage
//!
//! # CLI Usage
//!
//! ```bash
//! # 10,000 mixed documents in 20 folders, Concordance load file
//! corpus-forge generate --count 10000 --folders 20 --file-type mixed \
//!   --format concordance --seed 42 --output-dir ./out
//!
//! # Corrupt 5% of DAT lines
//! corpus-forge generate --count 1000 --chaos-amount 5% --chaos-types quotes,columns
//!
//! # Count entries in an archive written by corpus-forge
//! corpus-forge inspect ./out/corpus_20240101_120000.zip
//! ```

pub mod generate;
pub mod inspect;

pub use corpus_pipeline as pipeline;
