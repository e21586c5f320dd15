//! Load file columns.

use corpus_core::{folder_name, ManifestRow};

/// One load file column, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    DocId,
    BegBates,
    EndBates,
    Folder,
    FilePath,
    FileName,
    FileType,
    PageCount,
    FileSize,
    Attachment,
    Custodian,
    Author,
    Subject,
    DateCreated,
    DateSent,
    Sha256,
    TextPath,
}

const BASE: [Column; 10] = [
    Column::DocId,
    Column::BegBates,
    Column::EndBates,
    Column::Folder,
    Column::FilePath,
    Column::FileName,
    Column::FileType,
    Column::PageCount,
    Column::FileSize,
    Column::Attachment,
];

const EXTENDED: [Column; 6] = [
    Column::Custodian,
    Column::Author,
    Column::Subject,
    Column::DateCreated,
    Column::DateSent,
    Column::Sha256,
];

impl Column {
    /// Header name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::DocId => "DOCID",
            Column::BegBates => "BEGBATES",
            Column::EndBates => "ENDBATES",
            Column::Folder => "FOLDER",
            Column::FilePath => "FILEPATH",
            Column::FileName => "FILENAME",
            Column::FileType => "FILETYPE",
            Column::PageCount => "PAGECOUNT",
            Column::FileSize => "FILESIZE",
            Column::Attachment => "ATTACHMENT",
            Column::Custodian => "CUSTODIAN",
            Column::Author => "AUTHOR",
            Column::Subject => "SUBJECT",
            Column::DateCreated => "DATECREATED",
            Column::DateSent => "DATESENT",
            Column::Sha256 => "SHA256",
            Column::TextPath => "TEXTPATH",
        }
    }

    /// Value of this column for `row`. Missing optional values are empty.
    pub fn value(&self, row: &ManifestRow) -> String {
        let extended = row.extended.as_ref();
        match self {
            Column::DocId => row.doc_id.clone(),
            Column::BegBates => row.begin_bates.clone(),
            Column::EndBates => row.end_bates.clone(),
            Column::Folder => folder_name(row.folder_number),
            Column::FilePath => row.relative_path.clone(),
            Column::FileName => row.file_name.clone(),
            Column::FileType => row.file_type.to_string(),
            Column::PageCount => row.page_count.to_string(),
            Column::FileSize => row.file_size.to_string(),
            Column::Attachment => row.attachment.clone().unwrap_or_default(),
            Column::Custodian => extended.map(|e| e.custodian.clone()).unwrap_or_default(),
            Column::Author => extended.map(|e| e.author.clone()).unwrap_or_default(),
            Column::Subject => extended.map(|e| e.subject.clone()).unwrap_or_default(),
            Column::DateCreated => extended.map(|e| e.date_created.clone()).unwrap_or_default(),
            Column::DateSent => extended.map(|e| e.date_sent.clone()).unwrap_or_default(),
            Column::Sha256 => extended.map(|e| e.sha256.clone()).unwrap_or_default(),
            Column::TextPath => row.text_path.clone().unwrap_or_default(),
        }
    }
}

/// Enabled column set for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    /// Custodian, author, subject, dates and SHA-256
    pub extended: bool,
    /// Path of the extracted-text sibling entry
    pub text_path: bool,
}

impl Columns {
    pub fn new(extended: bool, text_path: bool) -> Self {
        Self {
            extended,
            text_path,
        }
    }

    /// Enabled columns in output order.
    pub fn list(&self) -> Vec<Column> {
        let mut columns = BASE.to_vec();
        if self.extended {
            columns.extend_from_slice(&EXTENDED);
        }
        if self.text_path {
            columns.push(Column::TextPath);
        }
        columns
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.list().iter().map(Column::name).collect()
    }

    pub fn values(&self, row: &ManifestRow) -> Vec<String> {
        self.list().iter().map(|c| c.value(row)).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_rows::*;
    use super::*;

    #[test]
    fn test_base_columns() {
        let columns = Columns::default();
        assert_eq!(columns.names()[0], "DOCID");
        assert!(columns.names().contains(&"FILEPATH"));
        assert_eq!(columns.values(&row(1)).len(), BASE.len());
    }

    #[test]
    fn test_optional_columns() {
        let columns = Columns::new(true, true);
        let names = columns.names();
        assert_eq!(names.len(), BASE.len() + EXTENDED.len() + 1);
        assert_eq!(names.last(), Some(&"TEXTPATH"));

        let values = columns.values(&extended_row(3));
        assert_eq!(values[10], "Chen, Riley");
        assert_eq!(values.last().unwrap(), "folder_001/DOC00000003.txt");
    }

    #[test]
    fn test_missing_extended_values_are_empty() {
        let values = Columns::new(true, false).values(&row(1));
        assert!(values[10..].iter().all(String::is_empty));
    }
}
