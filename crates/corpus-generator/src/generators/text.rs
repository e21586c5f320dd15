//! Plain text documents.

use super::{append_text_padding, ContentError, ContentGenerator, ItemContext};
use crate::words;
use corpus_core::{FileType, PayloadMeta};
use rand::rngs::StdRng;
use rand::Rng;

/// Characters per notional printed page.
pub(crate) const CHARS_PER_PAGE: usize = 3000;

pub(crate) fn pages_for_len(len: usize) -> u32 {
    (len / CHARS_PER_PAGE) as u32 + 1
}

pub struct TextGenerator;

impl ContentGenerator for TextGenerator {
    fn file_type(&self) -> FileType {
        FileType::Txt
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let paragraphs = rng.gen_range(2..=8);
        let mut body = format!("{}\r\n\r\n", ctx.profile.subject);
        for _ in 0..paragraphs {
            let sentences = rng.gen_range(2..=6);
            body.push_str(&words::paragraph(rng, sentences));
            body.push_str("\r\n\r\n");
        }
        out.extend_from_slice(body.as_bytes());
        append_text_padding(out, ctx.padding);

        Ok(PayloadMeta {
            page_count: pages_for_len(body.len()),
            attachment_name: None,
            extracted_text: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::build;

    #[test]
    fn test_text_payload_matches_extracted_text() {
        let (bytes, meta) = build(&TextGenerator, 1, 0.0);
        assert_eq!(meta.extracted_text.as_deref().map(str::as_bytes), Some(&bytes[..]));
        assert_eq!(meta.page_count, pages_for_len(bytes.len()));
    }

    #[test]
    fn test_pages_for_len() {
        assert_eq!(pages_for_len(0), 1);
        assert_eq!(pages_for_len(2999), 1);
        assert_eq!(pages_for_len(3000), 2);
    }
}
