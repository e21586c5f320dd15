//! Load file formatters for corpus-forge.
//!
//! This crate turns [`ManifestRow`](corpus_core::ManifestRow)s into load file
//! lines. Each supported [`LoadFileFormat`](corpus_core::LoadFileFormat) has a
//! formatter implementing [`LoadFileFormatter`]; the pipeline selects one with
//! [`formatter_for`] and never looks at column semantics itself.
//!
//! # Modules
//!
//! - [`columns`] - enabled column set and per-row values
//! - [`formatter`] - the formatter capability and its implementations
//! - [`encoding`] - text encoders for the configured output encoding
//!
//! # Example
//!
//! ```rust
//! use corpus_core::{Delimiters, LoadFileFormat, TextEncoding};
//! use loadfile_types::{formatter_for, Columns};
//!
//! let formatter = formatter_for(
//!     LoadFileFormat::Csv,
//!     Delimiters::for_format(LoadFileFormat::Csv),
//!     TextEncoding::Utf8,
//! )
//! .unwrap();
//! let columns = Columns::default();
//! let header = formatter.header(&columns).unwrap();
//! assert!(header.starts_with("\"DOCID\",\"BEGBATES\""));
//! ```

pub mod columns;
pub mod encoding;
mod error;
pub mod formatter;

pub use columns::{Column, Columns};
pub use encoding::{bom, encode, encode_into, invalid_sequence};
pub use error::FormatError;
pub use formatter::{
    formatter_for, CsvFormatter, DelimitedFormatter, LoadFileFormatter, OptFormatter,
    XmlFormatter,
};
