//! Minimal PDF 1.4 documents with one text content stream per page.

use super::{ContentError, ContentGenerator, ItemContext};
use crate::words;
use corpus_core::{FileType, PayloadMeta};
use rand::rngs::StdRng;
use rand::Rng;
use std::io::Write;

const MAX_PAGES: u32 = 4;

pub struct PdfGenerator;

/// Escape a PDF literal string.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

impl ContentGenerator for PdfGenerator {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let pages = rng.gen_range(1..=MAX_PAGES);
        let mut page_lines: Vec<Vec<String>> = Vec::with_capacity(pages as usize);
        for _ in 0..pages {
            let lines = rng.gen_range(3..=8);
            page_lines.push(
                (0..lines)
                    .map(|_| {
                        let len = rng.gen_range(5..=11);
                        words::sentence(rng, len)
                    })
                    .collect(),
            );
        }

        // objects: 1 catalog, 2 pages, 3 font, then (page, content) pairs,
        // then info and an optional unreferenced padding stream
        let info_id = 3 + 2 * pages as usize + 1;
        let object_count = info_id + usize::from(!ctx.padding.is_empty());
        let mut offsets = Vec::with_capacity(object_count);

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        offsets.push(out.len());
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(out.len());
        let kids: Vec<String> = (0..pages).map(|p| format!("{} 0 R", 4 + 2 * p)).collect();
        write!(
            out,
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            pages
        )?;

        offsets.push(out.len());
        out.extend_from_slice(
            b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n",
        );

        for (p, lines) in page_lines.iter().enumerate() {
            let page_id = 4 + 2 * p;
            let content_id = page_id + 1;

            offsets.push(out.len());
            write!(
                out,
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>\nendobj\n"
            )?;

            let mut stream = String::from("BT\n/F1 12 Tf\n72 720 Td\n16 TL\n");
            for line in lines {
                stream.push_str(&format!("({}) Tj T*\n", pdf_string(line)));
            }
            stream.push_str("ET\n");

            offsets.push(out.len());
            write!(
                out,
                "{content_id} 0 obj\n<< /Length {} >>\nstream\n{stream}endstream\nendobj\n",
                stream.len()
            )?;
        }

        offsets.push(out.len());
        write!(
            out,
            "{info_id} 0 obj\n<< /Title ({}) /Author ({}) /Producer (corpus-forge) /CreationDate (D:{}) >>\nendobj\n",
            pdf_string(&ctx.profile.subject),
            pdf_string(&ctx.profile.author),
            ctx.profile.created.format("%Y%m%d%H%M%SZ")
        )?;

        if !ctx.padding.is_empty() {
            offsets.push(out.len());
            write!(
                out,
                "{} 0 obj\n<< /Length {} >>\nstream\n",
                info_id + 1,
                ctx.padding.len()
            )?;
            out.extend_from_slice(ctx.padding);
            out.extend_from_slice(b"\nendstream\nendobj\n");
        }

        let xref_offset = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", object_count + 1)?;
        for offset in &offsets {
            write!(out, "{offset:010} 00000 n \n")?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            object_count + 1
        )?;

        let text = page_lines
            .iter()
            .map(|lines| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\x0c\n");

        Ok(PayloadMeta {
            page_count: pages,
            attachment_name: None,
            extracted_text: Some(text),
        })
    }
}
