//! Text encoders for load file output.
//!
//! Lines are built as `String`s and only turned into bytes at write time,
//! which is also where the chaos engine substitutes invalid sequences.

use corpus_core::TextEncoding;

/// Windows-1252 code points for bytes 0x80..=0x9F (`None` = undefined).
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Windows-1252 byte for `c`, `?` when the character has no mapping.
fn cp1252_byte(c: char) -> u8 {
    let code = c as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return code as u8;
    }
    CP1252_HIGH
        .iter()
        .position(|m| *m == Some(c))
        .map(|i| 0x80 + i as u8)
        .unwrap_or(b'?')
}

/// Append `text` encoded as `encoding` to `out`.
pub fn encode_into(text: &str, encoding: TextEncoding, out: &mut Vec<u8>) {
    match encoding {
        TextEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
        TextEncoding::Utf16Le => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        TextEncoding::Windows1252 => out.extend(text.chars().map(cp1252_byte)),
    }
}

pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    encode_into(text, encoding, &mut out);
    out
}

/// Byte order mark written at the start of a load file.
pub fn bom(encoding: TextEncoding) -> &'static [u8] {
    match encoding {
        TextEncoding::Utf16Le => &[0xFF, 0xFE],
        TextEncoding::Utf8 | TextEncoding::Windows1252 => &[],
    }
}

/// A byte sequence that does not decode in `encoding`.
pub fn invalid_sequence(encoding: TextEncoding) -> &'static [u8] {
    match encoding {
        // lead byte followed by a non-continuation byte
        TextEncoding::Utf8 => &[0xC3, 0x28],
        // unpaired high surrogate
        TextEncoding::Utf16Le => &[0x00, 0xD8],
        // undefined in the code page
        TextEncoding::Windows1252 => &[0x81],
    }
}
