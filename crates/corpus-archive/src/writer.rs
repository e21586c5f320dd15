//! Streaming ZIP writer.

use crate::error::ArchiveError;
use crate::records::{
    self, CentralEntry, FLAG_DATA_DESCRIPTOR, FLAG_UTF8, METHOD_DEFLATE, METHOD_STORED,
    U16_SENTINEL, U32_SENTINEL,
};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use tracing::debug;

/// Default deflate level (matches zlib's default).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Chunk size used when streaming an entry from a reader.
const STREAM_CHUNK: usize = 64 * 1024;

/// Scratch buffers above this capacity are released after use.
const SCRATCH_KEEP_LIMIT: usize = 16 * 1024 * 1024;

/// Result of appending one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySummary {
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    /// Bytes the entry occupies in the archive, headers included
    pub archive_bytes: u64,
}

/// Result of finishing an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entries: u64,
    pub total_bytes: u64,
    /// Whether ZIP64 end records were written
    pub zip64: bool,
}

/// Writer that tracks how many bytes went through it.
struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Append-only ZIP writer.
///
/// Entries are written in call order. Callers that need a particular order
/// must serialize their calls; the writer itself is single-owner.
pub struct ZipStreamWriter<W: Write> {
    out: CountingWriter<W>,
    entries: Vec<CentralEntry>,
    level: Compression,
    scratch: Vec<u8>,
}

impl<W: Write> ZipStreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: CountingWriter { inner, position: 0 },
            entries: Vec::new(),
            level: Compression::new(DEFAULT_COMPRESSION_LEVEL),
            scratch: Vec::new(),
        }
    }

    /// Set the deflate level (0-9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }

    /// Number of entries written so far.
    pub fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.out.position
    }

    fn check_name(name: &str) -> Result<(), ArchiveError> {
        if name.len() > u16::MAX as usize {
            return Err(ArchiveError::NameTooLong {
                name: name.chars().take(64).collect(),
                len: name.len(),
            });
        }
        Ok(())
    }

    /// Append an entry whose bytes are fully in memory.
    ///
    /// The data is deflated into an internal scratch buffer first so the local
    /// header can carry exact sizes. If deflate does not shrink the data the
    /// entry is stored instead.
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<EntrySummary, ArchiveError> {
        Self::check_name(name)?;
        let start = self.out.position;

        self.scratch.clear();
        let mut encoder = DeflateEncoder::new(std::mem::take(&mut self.scratch), self.level);
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let deflated = compressed.len() < data.len();
        let entry = CentralEntry {
            name: name.into(),
            flags: FLAG_UTF8,
            method: if deflated { METHOD_DEFLATE } else { METHOD_STORED },
            crc32: crc32fast::hash(data),
            compressed_size: if deflated {
                compressed.len() as u64
            } else {
                data.len() as u64
            },
            uncompressed_size: data.len() as u64,
            offset: start,
        };

        let header = records::local_header(&entry);
        self.out.write_all(&header)?;
        if deflated {
            self.out.write_all(&compressed)?;
        } else {
            self.out.write_all(data)?;
        }

        self.scratch = compressed;
        if self.scratch.capacity() > SCRATCH_KEEP_LIMIT {
            self.scratch = Vec::new();
        }

        let summary = EntrySummary {
            uncompressed_size: entry.uncompressed_size,
            compressed_size: entry.compressed_size,
            archive_bytes: self.out.position - start,
        };
        self.entries.push(entry);
        Ok(summary)
    }

    /// Append an entry streamed from a reader of unknown length.
    ///
    /// Sizes and CRC follow the data in a 64-bit data descriptor, so the
    /// source is read exactly once and never held in memory.
    pub fn add_entry_from_reader<R: Read>(
        &mut self,
        name: &str,
        mut reader: R,
    ) -> Result<EntrySummary, ArchiveError> {
        Self::check_name(name)?;
        let start = self.out.position;

        let mut entry = CentralEntry {
            name: name.into(),
            flags: FLAG_UTF8 | FLAG_DATA_DESCRIPTOR,
            method: METHOD_DEFLATE,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            offset: start,
        };
        let header = records::local_header(&entry);
        self.out.write_all(&header)?;
        let data_start = self.out.position;

        let mut hasher = crc32fast::Hasher::new();
        let mut uncompressed = 0u64;
        let mut chunk = vec![0u8; STREAM_CHUNK];
        let mut encoder = DeflateEncoder::new(&mut self.out, self.level);
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            encoder.write_all(&chunk[..n])?;
            uncompressed += n as u64;
        }
        encoder.finish()?;

        entry.crc32 = hasher.finalize();
        entry.uncompressed_size = uncompressed;
        entry.compressed_size = self.out.position - data_start;
        let descriptor = records::data_descriptor(&entry);
        self.out.write_all(&descriptor)?;

        let summary = EntrySummary {
            uncompressed_size: entry.uncompressed_size,
            compressed_size: entry.compressed_size,
            archive_bytes: self.out.position - start,
        };
        self.entries.push(entry);
        Ok(summary)
    }

    /// Write the central directory and end records and hand back the sink.
    pub fn finish(mut self) -> Result<(W, ArchiveSummary), ArchiveError> {
        let cd_offset = self.out.position;
        let mut buf = Vec::with_capacity(64 * 1024);
        for entry in &self.entries {
            records::central_header(entry, &mut buf);
            if buf.len() >= 60 * 1024 {
                self.out.write_all(&buf)?;
                buf.clear();
            }
        }
        self.out.write_all(&buf)?;
        let cd_size = self.out.position - cd_offset;

        let entries = self.entries.len() as u64;
        let zip64 = entries >= U16_SENTINEL as u64
            || cd_size >= U32_SENTINEL as u64
            || cd_offset >= U32_SENTINEL as u64;
        if zip64 {
            let record_offset = self.out.position;
            debug!(
                "Writing ZIP64 end records: {} entries, directory at {}",
                entries, cd_offset
            );
            let records = records::zip64_end_records(entries, cd_size, cd_offset, record_offset);
            self.out.write_all(&records)?;
        }
        let eocd = records::end_of_central_directory(entries, cd_size, cd_offset);
        self.out.write_all(&eocd)?;
        self.out.flush()?;

        let summary = ArchiveSummary {
            entries,
            total_bytes: self.out.position,
            zip64,
        };
        Ok((self.out.inner, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{read_entry, ArchiveListing};
    use std::io::Cursor;

    #[test]
    fn test_single_entry_round_trip() {
        let mut zip = ZipStreamWriter::new(Vec::new());
        let text = "the quick brown fox ".repeat(50);
        let summary = zip.add_entry("folder_001/a.txt", text.as_bytes()).unwrap();
        assert!(summary.compressed_size < summary.uncompressed_size);

        let (bytes, archive) = zip.finish().unwrap();
        assert_eq!(archive.entries, 1);
        assert!(!archive.zip64);
        assert_eq!(archive.total_bytes, bytes.len() as u64);

        let mut cursor = Cursor::new(bytes);
        let listing = ArchiveListing::read(&mut cursor).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].name, "folder_001/a.txt");
        let data = read_entry(&mut cursor, &listing.entries[0]).unwrap();
        assert_eq!(data, text.as_bytes());
    }

    #[test]
    fn test_incompressible_entry_is_stored() {
        let data: Vec<u8> = (0..4096u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        let mut zip = ZipStreamWriter::new(Vec::new());
        let summary = zip.add_entry("noise.bin", &data).unwrap();
        assert!(summary.compressed_size <= summary.uncompressed_size);

        let (bytes, _) = zip.finish().unwrap();
        let mut cursor = Cursor::new(bytes);
        let listing = ArchiveListing::read(&mut cursor).unwrap();
        assert_eq!(read_entry(&mut cursor, &listing.entries[0]).unwrap(), data);
    }

    #[test]
    fn test_streamed_entry_uses_descriptor() {
        let mut zip = ZipStreamWriter::new(Vec::new());
        zip.add_entry("first.txt", b"first").unwrap();
        let manifest = "DOCID,PATH\n".repeat(1000);
        let summary = zip
            .add_entry_from_reader("loadfile.dat", manifest.as_bytes())
            .unwrap();
        assert_eq!(summary.uncompressed_size, manifest.len() as u64);

        let (bytes, archive) = zip.finish().unwrap();
        assert_eq!(archive.entries, 2);

        let mut cursor = Cursor::new(bytes);
        let listing = ArchiveListing::read(&mut cursor).unwrap();
        let last = listing.entries.last().unwrap();
        assert_eq!(last.name, "loadfile.dat");
        assert_eq!(
            read_entry(&mut cursor, last).unwrap(),
            manifest.as_bytes()
        );
    }

    #[test]
    fn test_identical_input_gives_identical_bytes() {
        let build = || {
            let mut zip = ZipStreamWriter::new(Vec::new());
            zip.add_entry("a", b"alpha").unwrap();
            zip.add_entry("b", b"beta").unwrap();
            zip.finish().unwrap().0
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_zip64_end_records_above_entry_limit() {
        let mut zip = ZipStreamWriter::new(Vec::new()).with_compression_level(0);
        for i in 0..70_000u32 {
            zip.add_entry(&format!("f/{i}"), b"").unwrap();
        }
        let (bytes, archive) = zip.finish().unwrap();
        assert!(archive.zip64);
        assert_eq!(archive.entries, 70_000);

        let listing = ArchiveListing::read(&mut Cursor::new(bytes)).unwrap();
        assert!(listing.zip64);
        assert_eq!(listing.entries.len(), 70_000);
        assert_eq!(listing.entries[69_999].name, "f/69999");
    }

    #[test]
    fn test_no_zip64_below_entry_limit() {
        let mut zip = ZipStreamWriter::new(Vec::new());
        for i in 0..100u32 {
            zip.add_entry(&format!("f/{i}"), b"x").unwrap();
        }
        let (bytes, archive) = zip.finish().unwrap();
        assert!(!archive.zip64);
        let listing = ArchiveListing::read(&mut Cursor::new(bytes)).unwrap();
        assert!(!listing.zip64);
    }

    #[test]
    fn test_name_too_long() {
        let mut zip = ZipStreamWriter::new(Vec::new());
        let name = "x".repeat(70_000);
        assert!(matches!(
            zip.add_entry(&name, b""),
            Err(ArchiveError::NameTooLong { .. })
        ));
    }
}
