//! Single-owner writer stage: archive entries and load file lines, in index order.
//!
//! Everything goes to `*.partial` files first; [`CorpusWriter::finish`]
//! renames them into place once the central directory is on disk.

use crate::error::PipelineError;
use chaos_engine::{AnomalyRecord, ChaosEngine, EmittedLine};
use corpus_archive::{ArchiveSummary, ZipStreamWriter};
use corpus_core::{
    ExtendedFields, GenerationRequest, LoadFileFormat, ManifestRow, TextEncoding, WorkItem,
};
use corpus_generator::GeneratedDocument;
use loadfile_types::{bom, encode_into, formatter_for, Columns, LoadFileFormatter};
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const PARTIAL_SUFFIX: &str = "partial";

/// Output file locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub archive: PathBuf,
    /// Sibling load file, or the entry name's source when embedded
    pub load_file: PathBuf,
    pub run_manifest: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, name: &str, format: LoadFileFormat) -> Self {
        Self {
            archive: dir.join(format!("{name}.zip")),
            load_file: dir.join(format!("{name}.{}", format.extension())),
            run_manifest: dir.join(format!("{name}_manifest.json")),
        }
    }

    /// `path` with `.partial` appended.
    pub fn partial(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }

    /// File name of the load file, used as the embedded entry name.
    pub fn load_file_name(&self) -> String {
        self.load_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Best-effort removal of anything a failed run left behind.
    pub fn remove_partials(&self) {
        for path in [
            Self::partial(&self.archive),
            Self::partial(&self.load_file),
            self.run_manifest.clone(),
        ] {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => debug!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
}

/// One generated item on its way to the writer.
#[derive(Debug)]
pub struct CompletedItem {
    pub item: WorkItem,
    pub payload: Vec<u8>,
    pub document: GeneratedDocument,
    /// Hex SHA-256 of the payload, computed only for extended fields
    pub sha256: Option<String>,
}

/// Totals gathered by the writer.
#[derive(Debug, Clone, Default)]
pub struct WriterStats {
    pub items: u64,
    pub payload_bytes: u64,
    pub load_file_bytes: u64,
    pub write_duration: Duration,
}

/// What a successful writer hands back.
#[derive(Debug)]
pub struct WriterOutcome {
    pub archive: ArchiveSummary,
    pub anomalies: Vec<AnomalyRecord>,
    pub stats: WriterStats,
}

pub struct CorpusWriter {
    zip: ZipStreamWriter<BufWriter<File>>,
    manifest: BufWriter<File>,
    formatter: Box<dyn LoadFileFormatter>,
    columns: Columns,
    encoding: TextEncoding,
    eol: &'static str,
    chaos: Option<ChaosEngine>,
    paths: OutputPaths,
    manifest_in_archive: bool,
    extracted_text: bool,
    bates_prefix: String,
    next_page: u64,
    line: Vec<u8>,
    stats: WriterStats,
}

impl CorpusWriter {
    /// Open the partial outputs and write the load file preamble.
    pub fn create(
        request: &GenerationRequest,
        paths: OutputPaths,
        chaos: Option<ChaosEngine>,
    ) -> Result<Self, PipelineError> {
        let delimiters = request.effective_delimiters();
        let archive = File::create(OutputPaths::partial(&paths.archive))?;
        let manifest = if request.manifest_in_archive {
            tempfile::tempfile()?
        } else {
            File::create(OutputPaths::partial(&paths.load_file))?
        };

        let mut writer = Self {
            zip: ZipStreamWriter::new(BufWriter::new(archive)),
            manifest: BufWriter::new(manifest),
            formatter: formatter_for(request.format, delimiters, request.encoding)?,
            columns: Columns::new(request.extended_fields, request.extracted_text),
            encoding: request.encoding,
            eol: delimiters.eol.as_str(),
            chaos,
            paths,
            manifest_in_archive: request.manifest_in_archive,
            extracted_text: request.extracted_text,
            bates_prefix: request.bates_prefix.clone(),
            next_page: 1,
            line: Vec::with_capacity(1024),
            stats: WriterStats::default(),
        };

        writer.line.extend_from_slice(bom(writer.encoding));
        if let Some(header) = writer.formatter.header(&writer.columns) {
            encode_into(&header, writer.encoding, &mut writer.line);
            encode_into(writer.eol, writer.encoding, &mut writer.line);
        }
        writer.flush_line()?;
        Ok(writer)
    }

    fn flush_line(&mut self) -> Result<(), PipelineError> {
        self.manifest.write_all(&self.line)?;
        self.stats.load_file_bytes += self.line.len() as u64;
        self.line.clear();
        Ok(())
    }

    fn bates(&self, page: u64) -> String {
        format!("{}{:08}", self.bates_prefix, page)
    }

    fn manifest_row(&mut self, completed: &CompletedItem) -> ManifestRow {
        let item = &completed.item;
        let meta = &completed.document.meta;
        let pages = meta.page_count.max(1) as u64;
        let begin = self.next_page;
        self.next_page += pages;

        let extended = completed.sha256.as_ref().map(|sha256| {
            let profile = &completed.document.profile;
            ExtendedFields {
                custodian: profile.custodian.to_string(),
                author: profile.author.clone(),
                subject: profile.subject.clone(),
                date_created: profile.created_string(),
                date_sent: profile.sent_string(),
                sha256: sha256.clone(),
            }
        });

        ManifestRow {
            index: item.index,
            doc_id: item.doc_id.clone(),
            begin_bates: self.bates(begin),
            end_bates: self.bates(begin + pages - 1),
            folder_number: item.folder_number,
            relative_path: item.relative_path.clone(),
            file_name: item.file_name().to_string(),
            file_type: item.file_type,
            page_count: meta.page_count,
            file_size: completed.payload.len() as u64,
            attachment: meta.attachment_name.clone(),
            text_path: self.extracted_text.then(|| item.text_path()),
            extended,
        }
    }

    /// Write the next item. Callers must pass items in ascending index order.
    pub fn write_item(&mut self, completed: &CompletedItem) -> Result<(), PipelineError> {
        let started = Instant::now();
        let item = &completed.item;

        self.zip.add_entry(&item.relative_path, &completed.payload)?;
        if self.extracted_text {
            let text = completed.document.meta.extracted_text.as_deref().unwrap_or("");
            self.zip.add_entry(&item.text_path(), text.as_bytes())?;
        }

        let row = self.manifest_row(completed);
        let formatted = self.formatter.format(&row, &self.columns)?;
        let emitted = match self.chaos.as_mut() {
            Some(chaos) => chaos.intercept(item.index, formatted),
            None => EmittedLine::Text(formatted),
        };
        emitted.write_to(self.encoding, &mut self.line);
        encode_into(self.eol, self.encoding, &mut self.line);
        self.flush_line()?;

        self.stats.items += 1;
        self.stats.payload_bytes += completed.payload.len() as u64;
        self.stats.write_duration += started.elapsed();
        Ok(())
    }

    pub fn items_written(&self) -> u64 {
        self.stats.items
    }

    /// Close the load file, embed it if requested, write the central
    /// directory and move the outputs into place.
    pub fn finish(mut self) -> Result<WriterOutcome, PipelineError> {
        let started = Instant::now();
        if let Some(footer) = self.formatter.footer() {
            encode_into(&footer, self.encoding, &mut self.line);
            encode_into(self.eol, self.encoding, &mut self.line);
            self.flush_line()?;
        }

        let mut manifest = self
            .manifest
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))?;
        if self.manifest_in_archive {
            manifest.seek(SeekFrom::Start(0))?;
            let name = self.paths.load_file_name();
            self.zip.add_entry_from_reader(&name, &mut manifest)?;
        } else {
            manifest.sync_all()?;
        }
        drop(manifest);

        let (archive, summary) = self.zip.finish()?;
        let archive = archive
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))?;
        archive.sync_all()?;
        drop(archive);

        if !self.manifest_in_archive {
            fs::rename(
                OutputPaths::partial(&self.paths.load_file),
                &self.paths.load_file,
            )?;
        }
        fs::rename(OutputPaths::partial(&self.paths.archive), &self.paths.archive)?;
        self.stats.write_duration += started.elapsed();

        info!(
            "Wrote {} entries ({} bytes{}) to {}",
            summary.entries,
            summary.total_bytes,
            if summary.zip64 { ", zip64" } else { "" },
            self.paths.archive.display()
        );

        Ok(WriterOutcome {
            archive: summary,
            anomalies: self.chaos.map(ChaosEngine::into_records).unwrap_or_default(),
            stats: self.stats,
        })
    }
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push(HEX[usize::from(byte >> 4)] as char);
        out.push(HEX[usize::from(byte & 0x0F)] as char);
    }
    out
}
