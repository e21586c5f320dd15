//! Multi-page bilevel TIFF images.
//!
//! Little-endian baseline TIFF, one uncompressed strip per page and one IFD
//! per page chained through the "next IFD" offsets. Pages are white with
//! bands of noise standing in for lines of text.

use super::{ContentError, ContentGenerator, ItemContext};
use crate::words;
use corpus_core::{FileType, PayloadMeta};
use rand::rngs::StdRng;
use rand::Rng;

const MAX_PAGES: u32 = 3;
const DPI: u32 = 200;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_X_RESOLUTION: u16 = 282;
const TAG_Y_RESOLUTION: u16 = 283;
const TAG_RESOLUTION_UNIT: u16 = 296;

const IFD_ENTRIES: usize = 12;
const IFD_LEN: usize = 2 + IFD_ENTRIES * 12 + 4;

pub struct TiffGenerator;

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn patch_u32(out: &mut [u8], at: usize, v: u32) {
    out[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, value: u32) {
    put_u16(out, tag);
    put_u16(out, kind);
    put_u32(out, 1);
    if kind == TYPE_SHORT {
        put_u16(out, value as u16);
        put_u16(out, 0);
    } else {
        put_u32(out, value);
    }
}

/// One page of 1-bit pixels, rows padded to whole bytes. 0 is white.
fn page_bitmap(rng: &mut StdRng, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width.div_ceil(8) as usize;
    let mut data = vec![0u8; row_bytes * height as usize];
    let margin = height / 10;
    let mut y = margin;
    while y + 12 < height - margin {
        let line_len = rng.gen_range(row_bytes / 3..=row_bytes.saturating_sub(2).max(1));
        for row in y..y + 10 {
            let start = row as usize * row_bytes + 1;
            for byte in &mut data[start..(start + line_len).min((row as usize + 1) * row_bytes)] {
                *byte = rng.gen::<u8>() & rng.gen::<u8>();
            }
        }
        y += 18;
    }
    data
}

impl ContentGenerator for TiffGenerator {
    fn file_type(&self) -> FileType {
        FileType::Tiff
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let pages = rng.gen_range(1..=MAX_PAGES);
        let width = rng.gen_range(200..=400u32);
        let height = rng.gen_range(120..=300u32);

        let start = out.len();
        out.extend_from_slice(b"II");
        put_u16(out, 42);
        // where the offset of the next IFD has to be written
        let mut next_ifd_slot = out.len();
        put_u32(out, 0);

        let mut ocr = Vec::with_capacity(pages as usize);
        for _ in 0..pages {
            let bitmap = page_bitmap(rng, width, height);
            let strip_offset = (out.len() - start) as u32;
            out.extend_from_slice(&bitmap);
            if (out.len() - start) % 2 == 1 {
                out.push(0);
            }

            let ifd_offset = (out.len() - start) as u32;
            patch_u32(out, next_ifd_slot, ifd_offset);
            let rational_offset = ifd_offset + IFD_LEN as u32;

            put_u16(out, IFD_ENTRIES as u16);
            ifd_entry(out, TAG_IMAGE_WIDTH, TYPE_LONG, width);
            ifd_entry(out, TAG_IMAGE_LENGTH, TYPE_LONG, height);
            ifd_entry(out, TAG_BITS_PER_SAMPLE, TYPE_SHORT, 1);
            ifd_entry(out, TAG_COMPRESSION, TYPE_SHORT, 1);
            ifd_entry(out, TAG_PHOTOMETRIC, TYPE_SHORT, 0);
            ifd_entry(out, TAG_STRIP_OFFSETS, TYPE_LONG, strip_offset);
            ifd_entry(out, TAG_SAMPLES_PER_PIXEL, TYPE_SHORT, 1);
            ifd_entry(out, TAG_ROWS_PER_STRIP, TYPE_LONG, height);
            ifd_entry(out, TAG_STRIP_BYTE_COUNTS, TYPE_LONG, bitmap.len() as u32);
            ifd_entry(out, TAG_X_RESOLUTION, TYPE_RATIONAL, rational_offset);
            ifd_entry(out, TAG_Y_RESOLUTION, TYPE_RATIONAL, rational_offset + 8);
            ifd_entry(out, TAG_RESOLUTION_UNIT, TYPE_SHORT, 2);
            next_ifd_slot = out.len();
            put_u32(out, 0);

            for _ in 0..2 {
                put_u32(out, DPI);
                put_u32(out, 1);
            }

            let len = rng.gen_range(6..=14);
            ocr.push(words::sentence(rng, len));
        }

        // unreferenced trailing bytes are ignored by readers
        out.extend_from_slice(ctx.padding);

        Ok(PayloadMeta {
            page_count: pages,
            attachment_name: None,
            extracted_text: Some(ocr.join("\n\x0c\n")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::build;

    fn u16_at(b: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([b[at], b[at + 1]])
    }

    fn u32_at(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
    }

    #[test]
    fn test_ifd_chain_matches_page_count() {
        for index in 1..=10 {
            let (bytes, meta) = build(&TiffGenerator, index, 0.0);
            assert_eq!(&bytes[..4], b"II*\0");

            let mut pages = 0;
            let mut offset = u32_at(&bytes, 4) as usize;
            while offset != 0 {
                assert_eq!(offset % 2, 0, "IFD must start on a word boundary");
                let entries = u16_at(&bytes, offset) as usize;
                assert_eq!(entries, IFD_ENTRIES);
                assert_eq!(u16_at(&bytes, offset + 2), TAG_IMAGE_WIDTH);
                pages += 1;
                offset = u32_at(&bytes, offset + 2 + entries * 12) as usize;
            }
            assert_eq!(pages, meta.page_count);
        }
    }

    #[test]
    fn test_strip_lies_inside_file() {
        let (bytes, _) = build(&TiffGenerator, 4, 0.0);
        let ifd = u32_at(&bytes, 4) as usize;
        // entry 5 is StripOffsets, entry 8 StripByteCounts
        let strip_offset = u32_at(&bytes, ifd + 2 + 5 * 12 + 8) as usize;
        let strip_len = u32_at(&bytes, ifd + 2 + 8 * 12 + 8) as usize;
        assert!(strip_offset + strip_len <= bytes.len());
    }
}
