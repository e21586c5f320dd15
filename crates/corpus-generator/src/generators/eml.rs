//! RFC 5322 email messages, optionally multipart with one attachment.

use super::text::pages_for_len;
use super::{append_text_padding, ContentError, ContentGenerator, ItemContext};
use crate::words;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use corpus_core::{FileType, PayloadMeta};
use rand::rngs::StdRng;
use rand::Rng;
use std::io::Write;

/// Base64 body lines are wrapped at this width.
const BASE64_LINE: usize = 76;

pub struct EmlGenerator;

/// Quote a display name when it contains specials such as the comma in
/// `"Chen, Riley"`.
fn display_name(name: &str) -> String {
    if name.contains([',', '.', '"', '<', '>', '@']) {
        format!("\"{}\"", name.replace('"', "'"))
    } else {
        name.to_string()
    }
}

impl ContentGenerator for EmlGenerator {
    fn file_type(&self) -> FileType {
        FileType::Eml
    }

    fn generate(
        &self,
        ctx: &ItemContext<'_>,
        rng: &mut StdRng,
        out: &mut Vec<u8>,
    ) -> Result<PayloadMeta, ContentError> {
        let profile = ctx.profile;
        let message_id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        let domain = profile
            .author_email
            .split_once('@')
            .map(|(_, d)| d)
            .unwrap_or("localhost");

        let paragraphs = rng.gen_range(1..=5);
        let mut body = String::new();
        for _ in 0..paragraphs {
            let sentences = rng.gen_range(2..=6);
            body.push_str(&words::paragraph(rng, sentences));
            body.push_str("\r\n\r\n");
        }
        let has_attachment = ctx.attachment_rate > 0.0 && rng.gen_bool(ctx.attachment_rate);

        write!(
            out,
            "From: {} <{}>\r\nTo: <{}>\r\nSubject: {}\r\nDate: {}\r\nMessage-ID: <{}@{}>\r\nX-Custodian: {}\r\nMIME-Version: 1.0\r\n",
            display_name(&profile.author),
            profile.author_email,
            profile.recipient_email,
            profile.subject,
            profile.sent.to_rfc2822(),
            message_id.simple(),
            domain,
            profile.custodian,
        )?;

        let attachment_name = if has_attachment {
            let name = format!("{}_{}.txt", words::word(rng), rng.gen_range(100..1000));
            let sentences = rng.gen_range(3..=10);
            let attachment = words::paragraph(rng, sentences);
            let boundary = format!(
                "----=_Part_{}",
                uuid::Builder::from_random_bytes(rng.gen()).into_uuid().simple()
            );

            write!(
                out,
                "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n\
                 This is a multi-part message in MIME format.\r\n\r\n\
                 --{boundary}\r\n\
                 Content-Type: text/plain; charset=\"utf-8\"\r\n\
                 Content-Transfer-Encoding: 7bit\r\n\r\n\
                 {body}\
                 --{boundary}\r\n\
                 Content-Type: text/plain; name=\"{name}\"\r\n\
                 Content-Disposition: attachment; filename=\"{name}\"\r\n\
                 Content-Transfer-Encoding: base64\r\n\r\n"
            )?;
            let encoded = STANDARD.encode(attachment.as_bytes());
            for line in encoded.as_bytes().chunks(BASE64_LINE) {
                out.extend_from_slice(line);
                out.extend_from_slice(b"\r\n");
            }
            write!(out, "\r\n--{boundary}--\r\n")?;
            Some(name)
        } else {
            write!(
                out,
                "Content-Type: text/plain; charset=\"utf-8\"\r\n\
                 Content-Transfer-Encoding: 7bit\r\n\r\n{body}"
            )?;
            None
        };
        append_text_padding(out, ctx.padding);

        Ok(PayloadMeta {
            page_count: pages_for_len(body.len()),
            attachment_name,
            extracted_text: Some(format!("Subject: {}\r\n\r\n{body}", profile.subject)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::build;

    #[test]
    fn test_headers_present() {
        let (bytes, meta) = build(&EmlGenerator, 1, 0.0);
        let text = String::from_utf8(bytes).unwrap();
        for header in [
            "From: ",
            "To: <",
            "Subject: ",
            "Date: ",
            "Message-ID: <",
            "MIME-Version: 1.0",
        ] {
            assert!(text.contains(header), "missing {header}");
        }
        assert!(meta.attachment_name.is_none());
        assert!(text.contains("Content-Type: text/plain"));
    }

    #[test]
    fn test_attachment_rate_one_always_attaches() {
        for index in 1..=5 {
            let (bytes, meta) = build(&EmlGenerator, index, 1.0);
            let text = String::from_utf8(bytes).unwrap();
            let name = meta.attachment_name.expect("attachment expected");
            assert!(text.contains("multipart/mixed"));
            assert!(text.contains(&format!("filename=\"{name}\"")));
            assert!(text.trim_end().ends_with("--"));
        }
    }

    #[test]
    fn test_display_name_quoting() {
        assert_eq!(display_name("Chen, Riley"), "\"Chen, Riley\"");
        assert_eq!(display_name("Riley"), "Riley");
    }
}
