//! Core types for corpus-forge.
//!
//! This crate provides the foundational types shared by every stage of the
//! generator:
//!
//! - [`GenerationRequest`] - Immutable configuration for one run, loadable from YAML
//! - [`WorkItem`] - Descriptor of one logical document (index, folder, path)
//! - [`PayloadMeta`] - Lightweight metadata produced alongside a payload
//! - [`ManifestRow`] - One load file record per work item
//! - [`FileType`], [`Distribution`], [`LoadFileFormat`], [`TextEncoding`] - Type tags
//!
//! # Architecture
//!
//! ```text
//! corpus-core (this crate)
//!    │
//!    ├─── corpus-generator   (distributor, seeder, content generators)
//!    ├─── corpus-archive     (streaming ZIP/ZIP64 writer)
//!    ├─── loadfile-types     (DAT / OPT / CSV / XML formatters)
//!    ├─── chaos-engine       (load file fault injection)
//!    └─── corpus-pipeline    (worker pool + writer stage)
//! ```

pub mod error;
pub mod item;
pub mod request;
pub mod types;

pub use error::ConfigError;
pub use item::{folder_name, ExtendedFields, ManifestRow, PayloadMeta, WorkItem};
pub use request::{
    parse_delimiter, ChaosAmount, ChaosConfig, Delimiters, GenerationRequest, PoolConfig,
};
pub use types::{AnomalyKind, Distribution, EolStyle, FileType, LoadFileFormat, TextEncoding};
