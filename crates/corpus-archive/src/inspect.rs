//! Read-back of archives produced by [`crate::ZipStreamWriter`].
//!
//! Only understands the subset of the format this crate writes: single disk,
//! no archive comment, stored or deflated entries. Used by the `inspect`
//! command and by tests to check entry counts, order and content.

use crate::error::ArchiveError;
use crate::records::{
    CENTRAL_HEADER_LEN, CENTRAL_HEADER_SIG, EOCD_LEN, EOCD_SIG, LOCAL_HEADER_LEN,
    LOCAL_HEADER_SIG, METHOD_DEFLATE, METHOD_STORED, U16_SENTINEL, U32_SENTINEL, ZIP64_EOCD_SIG,
    ZIP64_EXTRA_ID, ZIP64_LOCATOR_LEN, ZIP64_LOCATOR_SIG,
};
use flate2::read::DeflateDecoder;
use std::io::{Read, Seek, SeekFrom};

/// Upper bound on the buffer reserved up front for one entry.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// One central directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListing {
    pub name: String,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub offset: u64,
}

/// Central directory of an archive, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveListing {
    pub entries: Vec<EntryListing>,
    /// Whether the archive ends with ZIP64 end records
    pub zip64: bool,
}

fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn u64_at(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

impl ArchiveListing {
    /// Parse the central directory.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, ArchiveError> {
        let len = reader.seek(SeekFrom::End(0))?;
        if len < EOCD_LEN as u64 {
            return Err(ArchiveError::Invalid("file too short".to_string()));
        }
        let eocd_pos = len - EOCD_LEN as u64;
        let mut eocd = [0u8; EOCD_LEN];
        reader.seek(SeekFrom::Start(eocd_pos))?;
        reader.read_exact(&mut eocd)?;
        if u32_at(&eocd, 0) != EOCD_SIG {
            return Err(ArchiveError::Invalid(
                "end of central directory not found".to_string(),
            ));
        }

        let mut entries = u16_at(&eocd, 10) as u64;
        let mut cd_size = u32_at(&eocd, 12) as u64;
        let mut cd_offset = u32_at(&eocd, 16) as u64;

        let mut zip64 = false;
        if eocd_pos >= ZIP64_LOCATOR_LEN as u64 {
            let mut locator = [0u8; ZIP64_LOCATOR_LEN];
            reader.seek(SeekFrom::Start(eocd_pos - ZIP64_LOCATOR_LEN as u64))?;
            reader.read_exact(&mut locator)?;
            if u32_at(&locator, 0) == ZIP64_LOCATOR_SIG {
                let record_offset = u64_at(&locator, 8);
                let mut record = [0u8; 56];
                reader.seek(SeekFrom::Start(record_offset))?;
                reader.read_exact(&mut record)?;
                if u32_at(&record, 0) != ZIP64_EOCD_SIG {
                    return Err(ArchiveError::Invalid(
                        "zip64 end record signature mismatch".to_string(),
                    ));
                }
                entries = u64_at(&record, 32);
                cd_size = u64_at(&record, 40);
                cd_offset = u64_at(&record, 48);
                zip64 = true;
            }
        }
        if !zip64
            && (entries == U16_SENTINEL as u64
                || cd_size == U32_SENTINEL as u64
                || cd_offset == U32_SENTINEL as u64)
        {
            return Err(ArchiveError::Invalid(
                "sentinel values without zip64 end records".to_string(),
            ));
        }

        match cd_offset.checked_add(cd_size) {
            Some(cd_end) if cd_end <= len => {}
            _ => {
                return Err(ArchiveError::Invalid(format!(
                    "central directory ({cd_size} bytes at {cd_offset}) extends past end of file"
                )))
            }
        }
        if entries > cd_size / CENTRAL_HEADER_LEN as u64 {
            return Err(ArchiveError::Invalid(format!(
                "{entries} entries cannot fit in a {cd_size} byte central directory"
            )));
        }

        let mut directory = vec![0u8; cd_size as usize];
        reader.seek(SeekFrom::Start(cd_offset))?;
        reader.read_exact(&mut directory)?;

        let mut listing = Vec::with_capacity(entries as usize);
        let mut at = 0usize;
        for _ in 0..entries {
            if at + CENTRAL_HEADER_LEN > directory.len()
                || u32_at(&directory, at) != CENTRAL_HEADER_SIG
            {
                return Err(ArchiveError::Invalid(format!(
                    "bad central header at directory offset {at}"
                )));
            }
            let method = u16_at(&directory, at + 10);
            let crc32 = u32_at(&directory, at + 16);
            let mut compressed_size = u32_at(&directory, at + 20) as u64;
            let mut uncompressed_size = u32_at(&directory, at + 24) as u64;
            let name_len = u16_at(&directory, at + 28) as usize;
            let extra_len = u16_at(&directory, at + 30) as usize;
            let comment_len = u16_at(&directory, at + 32) as usize;
            let mut offset = u32_at(&directory, at + 42) as u64;

            let name_start = at + CENTRAL_HEADER_LEN;
            let extra_start = name_start + name_len;
            let end = extra_start + extra_len + comment_len;
            if end > directory.len() {
                return Err(ArchiveError::Invalid("truncated central header".to_string()));
            }
            let name = String::from_utf8_lossy(&directory[name_start..extra_start]).into_owned();

            let extra = &directory[extra_start..extra_start + extra_len];
            let mut cursor = 0usize;
            while cursor + 4 <= extra.len() {
                let id = u16_at(extra, cursor);
                let size = u16_at(extra, cursor + 2) as usize;
                let body = cursor + 4;
                if id == ZIP64_EXTRA_ID {
                    let limit = (body + size).min(extra.len());
                    let mut field = body;
                    let mut next_u64 = || {
                        if field + 8 > limit {
                            return Err(ArchiveError::Invalid(format!(
                                "zip64 extra field too short for {name}"
                            )));
                        }
                        let value = u64_at(extra, field);
                        field += 8;
                        Ok(value)
                    };
                    if uncompressed_size == U32_SENTINEL as u64 {
                        uncompressed_size = next_u64()?;
                    }
                    if compressed_size == U32_SENTINEL as u64 {
                        compressed_size = next_u64()?;
                    }
                    if offset == U32_SENTINEL as u64 {
                        offset = next_u64()?;
                    }
                }
                cursor = body + size;
            }

            listing.push(EntryListing {
                name,
                method,
                crc32,
                compressed_size,
                uncompressed_size,
                offset,
            });
            at = end;
        }

        Ok(ArchiveListing {
            entries: listing,
            zip64,
        })
    }

    /// Entry names in archive order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&EntryListing> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Decompress one entry and verify its CRC.
pub fn read_entry<R: Read + Seek>(
    reader: &mut R,
    entry: &EntryListing,
) -> Result<Vec<u8>, ArchiveError> {
    let mut header = [0u8; LOCAL_HEADER_LEN];
    reader.seek(SeekFrom::Start(entry.offset))?;
    reader.read_exact(&mut header)?;
    if u32_at(&header, 0) != LOCAL_HEADER_SIG {
        return Err(ArchiveError::Invalid(format!(
            "bad local header for {}",
            entry.name
        )));
    }
    let skip = u16_at(&header, 26) as i64 + u16_at(&header, 28) as i64;
    reader.seek(SeekFrom::Current(skip))?;

    let raw = reader.take(entry.compressed_size);
    let mut data = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
    match entry.method {
        METHOD_STORED => {
            let mut raw = raw;
            raw.read_to_end(&mut data)?;
        }
        METHOD_DEFLATE => {
            DeflateDecoder::new(raw).read_to_end(&mut data)?;
        }
        other => {
            return Err(ArchiveError::Invalid(format!(
                "unsupported compression method {other} for {}",
                entry.name
            )))
        }
    }

    if crc32fast::hash(&data) != entry.crc32 {
        return Err(ArchiveError::Invalid(format!("CRC mismatch for {}", entry.name)));
    }
    Ok(data)
}
