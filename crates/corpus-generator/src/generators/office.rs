//! Office Open XML documents (DOCX and XLSX).
//!
//! Both are ZIP packages with a fixed set of parts. They are assembled with
//! the same [`ZipStreamWriter`] that builds the corpus archive, so part
//! timestamps are fixed and the bytes are reproducible.

use super::{xml_escape, ContentError, ContentGenerator, ItemContext};
use crate::fields::DocumentProfile;
use crate::words;
use corpus_archive::ZipStreamWriter;
use corpus_core::{FileType, PayloadMeta};
use rand::rngs::StdRng;
use rand::Rng;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// Paragraphs per notional DOCX page.
const PARAGRAPHS_PER_PAGE: usize = 6;

pub struct DocxGenerator;
pub struct XlsxGenerator;

fn content_types(overrides: &[(&str, &str)]) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<Types xmlns=\"{NS_CONTENT_TYPES}\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Default Extension=\"bin\" ContentType=\"application/octet-stream\"/>"
    );
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            "<Override PartName=\"{part}\" ContentType=\"{content_type}\"/>"
        ));
    }
    xml.push_str("<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>");
    xml.push_str("</Types>");
    xml
}

fn package_rels(main_part: &str) -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"{NS_PACKAGE_RELS}\">\
         <Relationship Id=\"rId1\" Type=\"{REL_OFFICE_DOCUMENT}\" Target=\"{main_part}\"/>\
         <Relationship Id=\"rId2\" Type=\"{REL_CORE_PROPS}\" Target=\"docProps/core.xml\"/>\
         </Relationships>"
    )
}

fn core_properties(profile: &DocumentProfile) -> String {
    let created = profile.created.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "{XML_DECL}\n<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>{}</dc:title><dc:creator>{}</dc:creator>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{created}</dcterms:created>\
         </cp:coreProperties>",
        xml_escape(&profile.subject),
        xml_escape(&profile.author)
    )
}

/// Write `parts` as a ZIP package into `out`. Padding becomes a part of its
/// own, which deflate leaves stored.
fn write_package(
    out: &mut Vec<u8>,
    parts: &[(&str, String)],
    padding: &[u8],
) -> Result<(), ContentError> {
    let mut zip = ZipStreamWriter::new(std::mem::take(out));
    for (name, body) in parts {
        zip.add_entry(name, body.as_bytes())?;
    }
    if !padding.is_empty() {
        zip.add_entry("docProps/padding.bin", padding)?;
    }
    let (bytes, _) = zip.finish()?;
    *out = bytes;
    Ok(())
}

impl ContentGenerator for DocxGenerator {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let count = rng.gen_range(3..=24);
        let paragraphs: Vec<String> = (0..count)
            .map(|_| {
                let sentences = rng.gen_range(1..=5);
                words::paragraph(rng, sentences)
            })
            .collect();

        let mut body = String::new();
        for paragraph in &paragraphs {
            body.push_str(&format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                xml_escape(paragraph)
            ));
        }
        let document = format!(
            "{XML_DECL}\n<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );

        write_package(
            out,
            &[
                (
                    "[Content_Types].xml",
                    content_types(&[(
                        "/word/document.xml",
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
                    )]),
                ),
                ("_rels/.rels", package_rels("word/document.xml")),
                ("docProps/core.xml", core_properties(ctx.profile)),
                ("word/document.xml", document),
            ],
            ctx.padding,
        )?;

        Ok(PayloadMeta {
            page_count: (paragraphs.len().div_ceil(PARAGRAPHS_PER_PAGE)) as u32,
            attachment_name: None,
            extracted_text: Some(paragraphs.join("\r\n\r\n")),
        })
    }
}

impl ContentGenerator for XlsxGenerator {
    fn file_type(&self) -> FileType {
        FileType::Xlsx
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let rows = rng.gen_range(5..=40u32);
        let mut sheet_rows = String::from(
            "<row r=\"1\"><c r=\"A1\" t=\"inlineStr\"><is><t>Item</t></is></c>\
             <c r=\"B1\" t=\"inlineStr\"><is><t>Quantity</t></is></c>\
             <c r=\"C1\" t=\"inlineStr\"><is><t>Amount</t></is></c></row>",
        );
        let mut text = String::from("Item\tQuantity\tAmount");
        for r in 2..=rows + 1 {
            let item = words::word(rng);
            let quantity = rng.gen_range(1..=500u32);
            let amount = rng.gen_range(100..=10_000_000u64) as f64 / 100.0;
            sheet_rows.push_str(&format!(
                "<row r=\"{r}\"><c r=\"A{r}\" t=\"inlineStr\"><is><t>{item}</t></is></c>\
                 <c r=\"B{r}\"><v>{quantity}</v></c><c r=\"C{r}\"><v>{amount:.2}</v></c></row>"
            ));
            text.push_str(&format!("\r\n{item}\t{quantity}\t{amount:.2}"));
        }

        let workbook = format!(
            "{XML_DECL}\n<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
             <sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
        );
        let workbook_rels = format!(
            "{XML_DECL}\n<Relationships xmlns=\"{NS_PACKAGE_RELS}\">\
             <Relationship Id=\"rId1\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" \
             Target=\"worksheets/sheet1.xml\"/></Relationships>"
        );
        let sheet = format!(
            "{XML_DECL}\n<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
             <sheetData>{sheet_rows}</sheetData></worksheet>"
        );

        write_package(
            out,
            &[
                (
                    "[Content_Types].xml",
                    content_types(&[
                        (
                            "/xl/workbook.xml",
                            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
                        ),
                        (
                            "/xl/worksheets/sheet1.xml",
                            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
                        ),
                    ]),
                ),
                ("_rels/.rels", package_rels("xl/workbook.xml")),
                ("docProps/core.xml", core_properties(ctx.profile)),
                ("xl/workbook.xml", workbook),
                ("xl/_rels/workbook.xml.rels", workbook_rels),
                ("xl/worksheets/sheet1.xml", sheet),
            ],
            ctx.padding,
        )?;

        Ok(PayloadMeta {
            page_count: 1,
            attachment_name: None,
            extracted_text: Some(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::build;
    use corpus_archive::inspect::{read_entry, ArchiveListing};
    use std::io::Cursor;

    #[test]
    fn test_docx_is_a_package() {
        let (bytes, meta) = build(&DocxGenerator, 1, 0.0);
        let mut cursor = Cursor::new(bytes);
        let listing = ArchiveListing::read(&mut cursor).unwrap();
        assert_eq!(listing.names()[0], "[Content_Types].xml");
        let document = listing.find("word/document.xml").unwrap();
        let xml = String::from_utf8(read_entry(&mut cursor, document).unwrap()).unwrap();
        assert!(xml.contains("<w:body>"));

        let text = meta.extracted_text.unwrap();
        let first = text.split("\r\n\r\n").next().unwrap();
        assert!(xml.contains(first));
    }

    #[test]
    fn test_xlsx_has_sheet() {
        let (bytes, meta) = build(&XlsxGenerator, 3, 0.0);
        let mut cursor = Cursor::new(bytes);
        let listing = ArchiveListing::read(&mut cursor).unwrap();
        let sheet = listing.find("xl/worksheets/sheet1.xml").unwrap();
        let xml = String::from_utf8(read_entry(&mut cursor, sheet).unwrap()).unwrap();
        assert!(xml.contains("<c r=\"A1\" t=\"inlineStr\"><is><t>Item</t></is></c>"));
        assert_eq!(meta.page_count, 1);
        assert!(meta.extracted_text.unwrap().starts_with("Item\tQuantity\tAmount"));
    }
}
