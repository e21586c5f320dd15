//! Inspect command handler.
//!
//! Reads back the central directory of an archive this tool wrote and
//! reports entry counts per folder. Other archives may or may not parse.

use anyhow::Context;
use clap::Args;
use corpus_archive::ArchiveListing;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// Archive to read
    pub archive: PathBuf,

    /// Print every entry name
    #[arg(long)]
    pub entries: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Summary of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArchiveReport {
    pub entries: u64,
    /// Documents and text siblings per `folder_NNN` directory
    pub folders: BTreeMap<String, u64>,
    /// Entries outside any folder, such as an embedded load file
    pub other: Vec<String>,
    pub uncompressed_bytes: u64,
    pub compressed_bytes: u64,
    pub zip64: bool,
}

impl ArchiveReport {
    pub fn from_listing(listing: &ArchiveListing) -> Self {
        let mut folders = BTreeMap::new();
        let mut other = Vec::new();
        for entry in &listing.entries {
            match entry.name.split_once('/') {
                Some((folder, _)) if folder.starts_with("folder_") => {
                    *folders.entry(folder.to_string()).or_insert(0) += 1;
                }
                _ => other.push(entry.name.clone()),
            }
        }
        Self {
            entries: listing.entries.len() as u64,
            folders,
            other,
            uncompressed_bytes: listing.entries.iter().map(|e| e.uncompressed_size).sum(),
            compressed_bytes: listing.entries.iter().map(|e| e.compressed_size).sum(),
            zip64: listing.zip64,
        }
    }
}

/// Read the archive at `path` and summarize it.
pub fn inspect_archive(path: &Path) -> anyhow::Result<(ArchiveListing, ArchiveReport)> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
    let listing = ArchiveListing::read(&mut file)?;
    let report = ArchiveReport::from_listing(&listing);
    Ok((listing, report))
}

/// Run the inspect command.
pub fn run_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (listing, report) = inspect_archive(&args.archive)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} entries, {} bytes uncompressed, {} bytes compressed{}",
            report.entries,
            report.uncompressed_bytes,
            report.compressed_bytes,
            if report.zip64 { ", zip64" } else { "" }
        );
        for (folder, count) in &report.folders {
            println!("  {folder}: {count}");
        }
        for name in &report.other {
            println!("  {name}");
        }
    }
    if args.entries {
        for entry in &listing.entries {
            println!("{}\t{}", entry.uncompressed_size, entry.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_archive::ZipStreamWriter;

    #[test]
    fn test_report_counts_folders() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.zip");
        let mut zip = ZipStreamWriter::new(File::create(&path).unwrap());
        zip.add_entry("folder_001/DOC00000001.txt", b"one").unwrap();
        zip.add_entry("folder_001/DOC00000002.txt", b"two").unwrap();
        zip.add_entry("folder_002/DOC00000003.txt", b"three").unwrap();
        zip.add_entry("a.dat", b"load file").unwrap();
        zip.finish().unwrap();

        let (_, report) = inspect_archive(&path).unwrap();
        assert_eq!(report.entries, 4);
        assert_eq!(report.folders["folder_001"], 2);
        assert_eq!(report.folders["folder_002"], 1);
        assert_eq!(report.other, vec!["a.dat".to_string()]);
        assert_eq!(report.uncompressed_bytes, 3 + 3 + 5 + 9);
        assert!(!report.zip64);
    }
}
