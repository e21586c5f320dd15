//! Deterministic document generator for corpus-forge.
//!
//! Every random decision made for item `i` comes from a generator seeded
//! only by `(global seed, i, stream)`, so a corpus is identical whatever the
//! order in which items are produced.
//!
//! # Architecture
//!
//! ```text
//! GenerationRequest
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ CorpusGenerator  │
//! │                  │
//! │  - ItemSeeder    │──► per-item StdRng (content / folder / fields / padding)
//! │  - folder_of     │──► folder number
//! │  - registry      │──► ContentGenerator selected by FileType
//! └────────┬─────────┘
//!          │
//!          ▼
//!   WorkItem + payload bytes + PayloadMeta + DocumentProfile
//! ```
//!
//! # Example
//!
//! ```rust
//! use corpus_core::GenerationRequest;
//! use corpus_generator::CorpusGenerator;
//!
//! let request = GenerationRequest::new(10).with_folders(2).with_seed(42);
//! let generator = CorpusGenerator::new(&request, 42);
//!
//! let item = generator.work_item(1);
//! let mut buf = Vec::new();
//! let doc = generator.generate(&item, &mut buf).unwrap();
//! assert_eq!(item.relative_path, "folder_001/DOC00000001.pdf");
//! assert!(doc.meta.page_count >= 1);
//! ```

pub mod distributor;
pub mod fields;
pub mod generator;
pub mod generators;
pub mod seeder;
mod words;

pub use distributor::folder_of;
pub use fields::DocumentProfile;
pub use generator::{CorpusGenerator, GeneratedDocument};
pub use generators::{ContentError, ContentGenerator, ItemContext};
pub use seeder::{process_seed, ItemSeeder, Stream};
