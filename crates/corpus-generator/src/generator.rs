//! Per-item generation entry point used by the pipeline workers.

use crate::distributor::folder_of;
use crate::fields::DocumentProfile;
use crate::generators::{generator_for, ContentError, ItemContext};
use crate::seeder::{ItemSeeder, Stream};
use corpus_core::{Distribution, FileType, GenerationRequest, PayloadMeta, WorkItem};
use rand::{Rng, RngCore};

/// Result of generating one item's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub meta: PayloadMeta,
    pub profile: DocumentProfile,
}

/// Stateless (after construction) document factory.
///
/// Shared by all workers behind an `Arc`; every method takes `&self` and
/// depends only on its arguments and the run parameters.
#[derive(Debug, Clone)]
pub struct CorpusGenerator {
    seeder: ItemSeeder,
    total: u64,
    folders: u32,
    distribution: Distribution,
    file_type: FileType,
    bates_prefix: String,
    attachment_rate: f64,
}

impl CorpusGenerator {
    /// `seed` is the resolved run seed; `request.seed` may be unset.
    pub fn new(request: &GenerationRequest, seed: u64) -> Self {
        Self {
            seeder: ItemSeeder::new(seed),
            total: request.count,
            folders: request.folders,
            distribution: request.distribution,
            file_type: request.file_type,
            bates_prefix: request.bates_prefix.clone(),
            attachment_rate: request.attachment_rate,
        }
    }

    pub fn seeder(&self) -> &ItemSeeder {
        &self.seeder
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Concrete file type for `index`; mixed corpora draw it per item.
    pub fn file_type_of(&self, index: u64) -> FileType {
        match self.file_type {
            FileType::Mixed => {
                let mut rng = self.seeder.rng_for(Stream::FileType, index);
                FileType::CONCRETE[rng.gen_range(0..FileType::CONCRETE.len())]
            }
            concrete => concrete,
        }
    }

    /// Work item for the 1-based `index`.
    pub fn work_item(&self, index: u64) -> WorkItem {
        let folder = folder_of(
            index,
            self.total,
            self.folders,
            self.distribution,
            &self.seeder,
        );
        WorkItem::new(index, folder, self.file_type_of(index), &self.bates_prefix)
    }

    /// Generate the payload for `item` into `out` without padding.
    pub fn generate(
        &self,
        item: &WorkItem,
        out: &mut Vec<u8>,
    ) -> Result<GeneratedDocument, ContentError> {
        self.generate_padded(item, 0, out)
    }

    /// Generate the payload for `item` with `padding` incompressible bytes
    /// embedded. Content and metadata are the same whatever the padding.
    pub fn generate_padded(
        &self,
        item: &WorkItem,
        padding: u64,
        out: &mut Vec<u8>,
    ) -> Result<GeneratedDocument, ContentError> {
        let generator = generator_for(item.file_type)?;
        let profile = DocumentProfile::for_item(&self.seeder, item.index);
        let filler = self.padding_bytes(item.index, padding);
        let ctx = ItemContext {
            item,
            profile: &profile,
            attachment_rate: self.attachment_rate,
            padding: &filler,
        };
        let mut rng = self.seeder.rng_for(Stream::Content, item.index);
        out.clear();
        let meta = generator.generate(&ctx, &mut rng, out)?;
        Ok(GeneratedDocument { meta, profile })
    }

    /// Random bytes from the item's `Padding` stream.
    pub fn padding_bytes(&self, index: u64, len: u64) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        let mut bytes = vec![0u8; len as usize];
        self.seeder
            .rng_for(Stream::Padding, index)
            .fill_bytes(&mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(request: GenerationRequest) -> CorpusGenerator {
        CorpusGenerator::new(&request, 42)
    }

    #[test]
    fn test_work_item_paths() {
        let g = generator(GenerationRequest::new(10).with_folders(10));
        let item = g.work_item(7);
        assert_eq!(item.folder_number, 7);
        assert_eq!(item.doc_id, "DOC00000007");
        assert_eq!(item.relative_path, "folder_007/DOC00000007.pdf");
    }

    #[test]
    fn test_mixed_resolves_to_concrete_types() {
        let g = generator(GenerationRequest::new(200).with_file_type(FileType::Mixed));
        let mut seen = std::collections::HashSet::new();
        for index in 1..=200 {
            let ft = g.file_type_of(index);
            assert_ne!(ft, FileType::Mixed);
            assert_eq!(ft, g.file_type_of(index));
            seen.insert(ft);
        }
        assert_eq!(seen.len(), FileType::CONCRETE.len());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let g = generator(GenerationRequest::new(5).with_file_type(FileType::Mixed));
        for index in 1..=5 {
            let item = g.work_item(index);
            let (mut a, mut b) = (Vec::new(), Vec::new());
            let da = g.generate(&item, &mut a).unwrap();
            let db = g.generate(&item, &mut b).unwrap();
            assert_eq!(a, b);
            assert_eq!(da, db);
        }
    }

    #[test]
    fn test_padding_does_not_change_metadata() {
        for file_type in FileType::CONCRETE {
            let g = generator(GenerationRequest::new(3).with_file_type(file_type));
            let item = g.work_item(2);
            let (mut plain, mut padded) = (Vec::new(), Vec::new());
            let a = g.generate(&item, &mut plain).unwrap();
            let b = g.generate_padded(&item, 4096, &mut padded).unwrap();
            assert_eq!(a, b, "{file_type}");
            assert!(padded.len() >= plain.len() + 4000, "{file_type}");
        }
    }

    #[test]
    fn test_buffer_is_cleared_before_use() {
        let g = generator(GenerationRequest::new(1).with_file_type(FileType::Txt));
        let item = g.work_item(1);
        let mut fresh = Vec::new();
        g.generate(&item, &mut fresh).unwrap();
        let mut reused = b"stale bytes".to_vec();
        g.generate(&item, &mut reused).unwrap();
        assert_eq!(fresh, reused);
    }
}
