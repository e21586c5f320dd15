//! On-disk record layouts (PKWARE APPNOTE 6.3).
//!
//! All multi-byte integers are little-endian.

pub const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
pub const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
pub const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;
pub const ZIP64_EOCD_SIG: u32 = 0x0606_4b50;
pub const ZIP64_LOCATOR_SIG: u32 = 0x0706_4b50;
pub const EOCD_SIG: u32 = 0x0605_4b50;

pub const ZIP64_EXTRA_ID: u16 = 0x0001;

pub const VERSION_DEFAULT: u16 = 20;
pub const VERSION_ZIP64: u16 = 45;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;

pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
pub const FLAG_UTF8: u16 = 1 << 11;

/// 1980-01-01 00:00:00, the DOS epoch. Every entry carries it so archives are
/// byte-identical across runs.
pub const DOS_DATE: u16 = (1 << 5) | 1;
pub const DOS_TIME: u16 = 0;

pub const U32_SENTINEL: u32 = u32::MAX;
pub const U16_SENTINEL: u16 = u16::MAX;

pub const EOCD_LEN: usize = 22;
pub const ZIP64_EOCD_LEN: usize = 56;
pub const ZIP64_LOCATOR_LEN: usize = 20;
pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;

/// Metadata kept per entry until the central directory is written.
#[derive(Debug, Clone)]
pub struct CentralEntry {
    pub name: Box<str>,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub offset: u64,
}

impl CentralEntry {
    fn sizes_need_zip64(&self) -> bool {
        self.compressed_size >= U32_SENTINEL as u64 || self.uncompressed_size >= U32_SENTINEL as u64
    }

    fn offset_needs_zip64(&self) -> bool {
        self.offset >= U32_SENTINEL as u64
    }

    pub fn needs_zip64(&self) -> bool {
        self.sizes_need_zip64()
            || self.offset_needs_zip64()
            || self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

pub fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn clamp32(value: u64) -> u32 {
    if value >= U32_SENTINEL as u64 {
        U32_SENTINEL
    } else {
        value as u32
    }
}

/// Local file header for an entry whose sizes are known up front.
///
/// Streamed entries (data descriptor flag set) always carry a ZIP64 extra
/// field with zeroed sizes so the descriptor can use 64-bit sizes.
pub fn local_header(entry: &CentralEntry) -> Vec<u8> {
    let streamed = entry.flags & FLAG_DATA_DESCRIPTOR != 0;
    let zip64 = streamed || entry.sizes_need_zip64();

    let mut buf = Vec::with_capacity(LOCAL_HEADER_LEN + entry.name.len() + 20);
    put_u32(&mut buf, LOCAL_HEADER_SIG);
    put_u16(&mut buf, if zip64 { VERSION_ZIP64 } else { VERSION_DEFAULT });
    put_u16(&mut buf, entry.flags);
    put_u16(&mut buf, entry.method);
    put_u16(&mut buf, DOS_TIME);
    put_u16(&mut buf, DOS_DATE);
    if streamed {
        put_u32(&mut buf, 0);
        put_u32(&mut buf, U32_SENTINEL);
        put_u32(&mut buf, U32_SENTINEL);
    } else {
        put_u32(&mut buf, entry.crc32);
        put_u32(&mut buf, if zip64 { U32_SENTINEL } else { entry.compressed_size as u32 });
        put_u32(&mut buf, if zip64 { U32_SENTINEL } else { entry.uncompressed_size as u32 });
    }
    put_u16(&mut buf, entry.name.len() as u16);
    put_u16(&mut buf, if zip64 { 20 } else { 0 });
    buf.extend_from_slice(entry.name.as_bytes());
    if zip64 {
        put_u16(&mut buf, ZIP64_EXTRA_ID);
        put_u16(&mut buf, 16);
        let (uncompressed, compressed) = if streamed {
            (0, 0)
        } else {
            (entry.uncompressed_size, entry.compressed_size)
        };
        put_u64(&mut buf, uncompressed);
        put_u64(&mut buf, compressed);
    }
    buf
}

/// Data descriptor following a streamed entry (64-bit sizes).
pub fn data_descriptor(entry: &CentralEntry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(24);
    put_u32(&mut buf, DATA_DESCRIPTOR_SIG);
    put_u32(&mut buf, entry.crc32);
    put_u64(&mut buf, entry.compressed_size);
    put_u64(&mut buf, entry.uncompressed_size);
    buf
}

/// Central directory file header.
///
/// The ZIP64 extra field lists, in order, only the values whose 32-bit slot
/// holds the sentinel.
pub fn central_header(entry: &CentralEntry, buf: &mut Vec<u8>) {
    let mut extra = Vec::new();
    let uncompressed = clamp32(entry.uncompressed_size);
    let compressed = clamp32(entry.compressed_size);
    let offset = clamp32(entry.offset);
    if uncompressed == U32_SENTINEL {
        put_u64(&mut extra, entry.uncompressed_size);
    }
    if compressed == U32_SENTINEL {
        put_u64(&mut extra, entry.compressed_size);
    }
    if offset == U32_SENTINEL {
        put_u64(&mut extra, entry.offset);
    }
    let extra_len = if extra.is_empty() { 0 } else { extra.len() + 4 };
    let version = if entry.needs_zip64() {
        VERSION_ZIP64
    } else {
        VERSION_DEFAULT
    };

    put_u32(buf, CENTRAL_HEADER_SIG);
    put_u16(buf, version);
    put_u16(buf, version);
    put_u16(buf, entry.flags);
    put_u16(buf, entry.method);
    put_u16(buf, DOS_TIME);
    put_u16(buf, DOS_DATE);
    put_u32(buf, entry.crc32);
    put_u32(buf, compressed);
    put_u32(buf, uncompressed);
    put_u16(buf, entry.name.len() as u16);
    put_u16(buf, extra_len as u16);
    put_u16(buf, 0); // comment length
    put_u16(buf, 0); // disk number start
    put_u16(buf, 0); // internal attributes
    put_u32(buf, 0); // external attributes
    put_u32(buf, offset);
    buf.extend_from_slice(entry.name.as_bytes());
    if !extra.is_empty() {
        put_u16(buf, ZIP64_EXTRA_ID);
        put_u16(buf, extra.len() as u16);
        buf.extend_from_slice(&extra);
    }
}

/// ZIP64 end of central directory record followed by its locator.
pub fn zip64_end_records(
    entries: u64,
    cd_size: u64,
    cd_offset: u64,
    record_offset: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ZIP64_EOCD_LEN + ZIP64_LOCATOR_LEN);
    put_u32(&mut buf, ZIP64_EOCD_SIG);
    put_u64(&mut buf, (ZIP64_EOCD_LEN - 12) as u64);
    put_u16(&mut buf, VERSION_ZIP64);
    put_u16(&mut buf, VERSION_ZIP64);
    put_u32(&mut buf, 0);
    put_u32(&mut buf, 0);
    put_u64(&mut buf, entries);
    put_u64(&mut buf, entries);
    put_u64(&mut buf, cd_size);
    put_u64(&mut buf, cd_offset);

    put_u32(&mut buf, ZIP64_LOCATOR_SIG);
    put_u32(&mut buf, 0);
    put_u64(&mut buf, record_offset);
    put_u32(&mut buf, 1);
    buf
}

/// Classic end of central directory record; oversized values hold sentinels.
pub fn end_of_central_directory(entries: u64, cd_size: u64, cd_offset: u64) -> Vec<u8> {
    let count = if entries >= U16_SENTINEL as u64 {
        U16_SENTINEL
    } else {
        entries as u16
    };
    let mut buf = Vec::with_capacity(EOCD_LEN);
    put_u32(&mut buf, EOCD_SIG);
    put_u16(&mut buf, 0);
    put_u16(&mut buf, 0);
    put_u16(&mut buf, count);
    put_u16(&mut buf, count);
    put_u32(&mut buf, clamp32(cd_size));
    put_u32(&mut buf, clamp32(cd_offset));
    put_u16(&mut buf, 0);
    buf
}
