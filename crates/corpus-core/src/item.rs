//! Per-item records flowing through the pipeline.

use crate::types::FileType;
use serde::{Deserialize, Serialize};

/// Descriptor of one logical document.
///
/// Created when a worker claims an index and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based, dense item index
    pub index: u64,
    /// Folder number in `1..=folders`
    pub folder_number: u32,
    /// Concrete document type (never `FileType::Mixed`)
    pub file_type: FileType,
    /// Control number, `<prefix><index:08>`
    pub doc_id: String,
    /// Archive path, `folder_NNN/<doc_id>.<ext>`
    pub relative_path: String,
}

impl WorkItem {
    pub fn new(index: u64, folder_number: u32, file_type: FileType, prefix: &str) -> Self {
        let doc_id = format!("{prefix}{index:08}");
        let relative_path = format!(
            "{}/{}.{}",
            folder_name(folder_number),
            doc_id,
            file_type.extension()
        );
        Self {
            index,
            folder_number,
            file_type,
            doc_id,
            relative_path,
        }
    }

    /// Archive path of the extracted-text sibling entry.
    pub fn text_path(&self) -> String {
        format!("{}/{}.txt", folder_name(self.folder_number), self.doc_id)
    }

    /// File name component of [`Self::relative_path`].
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.relative_path)
    }
}

/// Directory name for a folder number.
pub fn folder_name(folder_number: u32) -> String {
    format!("folder_{folder_number:03}")
}

/// Metadata a content generator returns alongside the payload bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadMeta {
    /// Number of pages the document claims to have
    pub page_count: u32,
    /// Name of the embedded attachment, if one was generated
    pub attachment_name: Option<String>,
    /// Plain text body used for the extracted-text sibling
    pub extracted_text: Option<String>,
}

/// Fields only emitted when extended fields are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedFields {
    pub custodian: String,
    pub author: String,
    pub subject: String,
    pub date_created: String,
    pub date_sent: String,
    pub sha256: String,
}

/// One load file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub index: u64,
    pub doc_id: String,
    pub begin_bates: String,
    pub end_bates: String,
    pub folder_number: u32,
    pub relative_path: String,
    pub file_name: String,
    pub file_type: FileType,
    pub page_count: u32,
    pub file_size: u64,
    pub attachment: Option<String>,
    pub text_path: Option<String>,
    pub extended: Option<ExtendedFields>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_paths() {
        let item = WorkItem::new(7, 3, FileType::Pdf, "DOC");
        assert_eq!(item.doc_id, "DOC00000007");
        assert_eq!(item.relative_path, "folder_003/DOC00000007.pdf");
        assert_eq!(item.file_name(), "DOC00000007.pdf");
        assert_eq!(item.text_path(), "folder_003/DOC00000007.txt");
    }

    #[test]
    fn test_folder_name_widens_past_three_digits() {
        assert_eq!(folder_name(1), "folder_001");
        assert_eq!(folder_name(1234), "folder_1234");
    }
}
