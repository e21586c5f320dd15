//! Streaming ZIP writer with automatic ZIP64 upgrade.
//!
//! Entries are appended one at a time and never buffered as a whole archive.
//! Only the central directory metadata (name, sizes, CRC, offset) is kept in
//! memory until [`ZipStreamWriter::finish`] writes it out.
//!
//! ```text
//! [local header][data]  ...  [local header][data][descriptor]
//! [central directory ...]
//! [zip64 end record][zip64 locator]     (only when limits are exceeded)
//! [end of central directory]
//! ```
//!
//! ZIP64 fields are written per entry when a size or offset does not fit in
//! 32 bits, and the ZIP64 end records are written when the entry count or the
//! central directory position exceeds the classic limits.
//!
//! # Example
//!
//! ```rust
//! use corpus_archive::ZipStreamWriter;
//!
//! let mut zip = ZipStreamWriter::new(Vec::new());
//! zip.add_entry("folder_001/DOC00000001.txt", b"hello").unwrap();
//! let (bytes, summary) = zip.finish().unwrap();
//! assert_eq!(summary.entries, 1);
//! assert!(!bytes.is_empty());
//! ```

mod error;
pub mod inspect;
mod records;
mod writer;

pub use error::ArchiveError;
pub use inspect::{ArchiveListing, EntryListing};
pub use writer::{ArchiveSummary, EntrySummary, ZipStreamWriter, DEFAULT_COMPRESSION_LEVEL};
