//! Content generators, one per document type.
//!
//! Each generator writes a minimal but structurally valid document into the
//! caller's buffer. Generators are selected by [`FileType`] through
//! [`generator_for`]; the pipeline treats them as an opaque capability.

pub mod eml;
pub mod office;
pub mod pdf;
pub mod text;
pub mod tiff;

use crate::fields::DocumentProfile;
use corpus_archive::ArchiveError;
use corpus_core::{FileType, PayloadMeta, WorkItem};
use rand::rngs::StdRng;

/// Errors that can occur while building a payload.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// IO error while assembling the document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error building a ZIP-based container (DOCX/XLSX)
    #[error("Container error: {0}")]
    Container(#[from] ArchiveError),

    /// No generator for the requested type
    #[error("No content generator for file type '{0}'")]
    Unsupported(FileType),
}

/// Everything a generator may read about the item it is building.
#[derive(Debug, Clone, Copy)]
pub struct ItemContext<'a> {
    pub item: &'a WorkItem,
    pub profile: &'a DocumentProfile,
    /// Probability that an email carries an attachment
    pub attachment_rate: f64,
    /// Incompressible filler to embed for target-size runs, usually empty
    pub padding: &'a [u8],
}

/// Builds the payload bytes for one work item.
///
/// Implementations must draw every random decision from `rng`, which is the
/// item's own `Content` stream, and must append to `out` (which arrives
/// empty). `ctx.padding` is embedded somewhere the format tolerates opaque
/// bytes; it never influences `rng`.
pub trait ContentGenerator: Send + Sync {
    fn file_type(&self) -> FileType;

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError>;
}

static PDF: pdf::PdfGenerator = pdf::PdfGenerator;
static DOCX: office::DocxGenerator = office::DocxGenerator;
static XLSX: office::XlsxGenerator = office::XlsxGenerator;
static TIFF: tiff::TiffGenerator = tiff::TiffGenerator;
static EML: eml::EmlGenerator = eml::EmlGenerator;
static TXT: text::TextGenerator = text::TextGenerator;

/// Generator for a concrete file type.
pub fn generator_for(file_type: FileType) -> Result<&'static dyn ContentGenerator, ContentError> {
    match file_type {
        FileType::Pdf => Ok(&PDF),
        FileType::Docx => Ok(&DOCX),
        FileType::Xlsx => Ok(&XLSX),
        FileType::Tiff => Ok(&TIFF),
        FileType::Eml => Ok(&EML),
        FileType::Txt => Ok(&TXT),
        FileType::Mixed => Err(ContentError::Unsupported(FileType::Mixed)),
    }
}

/// Append padding to a text document as base64 lines, truncated so the
/// document grows by roughly `padding.len()` bytes.
pub(crate) fn append_text_padding(out: &mut Vec<u8>, padding: &[u8]) {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    if padding.is_empty() {
        return;
    }
    let encoded = STANDARD.encode(padding);
    let mut remaining = padding.len();
    for line in encoded.as_bytes().chunks(TEXT_PADDING_LINE) {
        if remaining == 0 {
            break;
        }
        let take = line.len().min(remaining);
        out.extend_from_slice(&line[..take]);
        out.extend_from_slice(b"\r\n");
        remaining = remaining.saturating_sub(take + 2);
    }
}

const TEXT_PADDING_LINE: usize = 76;

/// Escape text for inclusion in XML element content or attributes.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_concrete_type_has_a_generator() {
        for file_type in FileType::CONCRETE {
            let generator = generator_for(file_type).unwrap();
            assert_eq!(generator.file_type(), file_type);
        }
        assert!(generator_for(FileType::Mixed).is_err());
    }

    #[test]
    fn test_generators_are_deterministic() {
        for file_type in FileType::CONCRETE {
            let generator = generator_for(file_type).unwrap();
            let a = test_support::build(generator, 5, 0.5);
            let b = test_support::build(generator, 5, 0.5);
            assert_eq!(a, b, "{file_type} output differs between runs");
            assert!(!a.0.is_empty());
            assert!(a.1.page_count >= 1);
        }
    }

    #[test]
    fn test_text_padding_length() {
        let mut out = Vec::new();
        append_text_padding(&mut out, &[0xAB; 1000]);
        assert!(out.len() >= 1000 && out.len() <= 1002);
        assert!(out.is_ascii());

        let mut empty = Vec::new();
        append_text_padding(&mut empty, &[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
