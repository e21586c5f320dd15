//! Load file formatters.
//!
//! A formatter turns one [`ManifestRow`] into one line of text without the
//! line terminator; the writer appends the configured EOL. XML is the one
//! format whose output is not line-oriented in the load file sense, and it
//! is never handed to the chaos engine.

use crate::columns::Columns;
use crate::error::FormatError;
use corpus_core::{Delimiters, LoadFileFormat, ManifestRow, TextEncoding};
use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// Volume name written in the second OPT column.
pub const OPT_VOLUME: &str = "VOL001";

/// Serializes manifest rows for one load file format.
pub trait LoadFileFormatter: Send + Sync {
    fn format_kind(&self) -> LoadFileFormat;

    /// Delimiters the formatter emits, as seen by the chaos engine.
    fn delimiters(&self) -> &Delimiters;

    /// Header line, if the format has one.
    fn header(&self, columns: &Columns) -> Option<String>;

    /// One data line for `row`.
    fn format(&self, row: &ManifestRow, columns: &Columns) -> Result<String, FormatError>;

    /// Trailer written after the last row.
    fn footer(&self) -> Option<String> {
        None
    }
}

/// Formatter for `format` using `delimiters`.
pub fn formatter_for(
    format: LoadFileFormat,
    delimiters: Delimiters,
    encoding: TextEncoding,
) -> Result<Box<dyn LoadFileFormatter>, FormatError> {
    Ok(match format {
        LoadFileFormat::Dat | LoadFileFormat::Concordance => {
            Box::new(DelimitedFormatter::new(format, delimiters))
        }
        LoadFileFormat::Opt => Box::new(OptFormatter::new(delimiters)),
        LoadFileFormat::Csv => Box::new(CsvFormatter::new(delimiters)?),
        LoadFileFormat::Xml => Box::new(XmlFormatter::new(delimiters, encoding)),
    })
}

/// Replace every line break in `value` with `replacement`.
fn flatten_newlines(value: &str, replacement: char) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(replacement);
            }
            '\n' => out.push(replacement),
            _ => out.push(c),
        }
    }
    out
}

/// Concordance-style DAT: every field wrapped in the quote character and
/// separated by the column character. Quote characters inside values are
/// dropped since the format has no escape for them.
#[derive(Debug, Clone)]
pub struct DelimitedFormatter {
    kind: LoadFileFormat,
    delimiters: Delimiters,
}

impl DelimitedFormatter {
    pub fn new(kind: LoadFileFormat, delimiters: Delimiters) -> Self {
        Self { kind, delimiters }
    }

    fn field(&self, value: &str, out: &mut String) {
        let flat = flatten_newlines(value, self.delimiters.newline);
        match self.delimiters.quote {
            Some(quote) => {
                out.push(quote);
                out.extend(flat.chars().filter(|c| *c != quote));
                out.push(quote);
            }
            None => out.extend(flat.chars().filter(|c| *c != self.delimiters.column)),
        }
    }

    fn line<'a, I: IntoIterator<Item = &'a str>>(&self, values: I) -> String {
        let mut line = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                line.push(self.delimiters.column);
            }
            self.field(value, &mut line);
        }
        line
    }
}

impl LoadFileFormatter for DelimitedFormatter {
    fn format_kind(&self) -> LoadFileFormat {
        self.kind
    }

    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    fn header(&self, columns: &Columns) -> Option<String> {
        Some(self.line(columns.names()))
    }

    fn format(&self, row: &ManifestRow, columns: &Columns) -> Result<String, FormatError> {
        let values = columns.values(row);
        Ok(self.line(values.iter().map(String::as_str)))
    }
}

/// Opticon image cross-reference: seven comma-separated columns, no header.
///
/// `ImageKey,Volume,Path,DocBreak,FolderBreak,BoxBreak,PageCount`
#[derive(Debug, Clone)]
pub struct OptFormatter {
    delimiters: Delimiters,
}

impl OptFormatter {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }
}

impl LoadFileFormatter for OptFormatter {
    fn format_kind(&self) -> LoadFileFormat {
        LoadFileFormat::Opt
    }

    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    fn header(&self, _columns: &Columns) -> Option<String> {
        None
    }

    fn format(&self, row: &ManifestRow, _columns: &Columns) -> Result<String, FormatError> {
        let column = self.delimiters.column;
        let path = row.relative_path.replace('/', "\\").replace(column, "_");
        let page_count = row.page_count.to_string();
        let fields = [
            row.begin_bates.as_str(),
            OPT_VOLUME,
            path.as_str(),
            "Y",
            "",
            "",
            page_count.as_str(),
        ];
        let mut buf = [0u8; 4];
        let separator: &str = column.encode_utf8(&mut buf);
        Ok(fields.join(separator))
    }
}

/// In-memory sink the CSV writer flushes each record into.
#[derive(Default)]
struct RecordBuffer(Cell<Vec<u8>>);

impl Write for RecordBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.get_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// RFC 4180 style CSV written through the `csv` crate.
///
/// One writer is configured up front and reused for every record.
pub struct CsvFormatter {
    delimiters: Delimiters,
    writer: Mutex<csv::Writer<RecordBuffer>>,
}

impl fmt::Debug for CsvFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvFormatter")
            .field("delimiters", &self.delimiters)
            .finish_non_exhaustive()
    }
}

impl CsvFormatter {
    /// Fails when a delimiter is not a single ASCII byte.
    pub fn new(delimiters: Delimiters) -> Result<Self, FormatError> {
        let mut builder = csv::WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(Self::ascii(delimiters.column, "column delimiter")?)
            .terminator(csv::Terminator::Any(b'\n'));
        match delimiters.quote {
            Some(quote) => {
                builder
                    .quote(Self::ascii(quote, "quote")?)
                    .quote_style(csv::QuoteStyle::Always);
            }
            None => {
                builder.quote_style(csv::QuoteStyle::Never);
            }
        }
        Ok(Self {
            delimiters,
            writer: Mutex::new(builder.from_writer(RecordBuffer::default())),
        })
    }

    fn ascii(c: char, what: &str) -> Result<u8, FormatError> {
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(FormatError::InvalidDelimiter {
                format: "csv",
                reason: format!("{what} '{c}' is not ASCII"),
            })
        }
    }

    fn record<'a, I>(&self, values: I) -> Result<String, FormatError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let newline = self.delimiters.newline;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| FormatError::Buffer("CSV writer lock poisoned".to_string()))?;
        writer.write_record(values.into_iter().map(|v| flatten_newlines(v, newline)))?;
        writer.flush().map_err(csv::Error::from)?;
        let mut bytes = writer.get_ref().0.take();
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| FormatError::Buffer(e.to_string()))
    }
}

impl LoadFileFormatter for CsvFormatter {
    fn format_kind(&self) -> LoadFileFormat {
        LoadFileFormat::Csv
    }

    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    fn header(&self, columns: &Columns) -> Option<String> {
        // header values are fixed ASCII names and always serialize
        self.record(columns.names()).ok()
    }

    fn format(&self, row: &ManifestRow, columns: &Columns) -> Result<String, FormatError> {
        let values = columns.values(row);
        self.record(values.iter().map(String::as_str))
    }
}

/// One `<document>` element per row inside a `<documents>` root.
#[derive(Debug, Clone)]
pub struct XmlFormatter {
    delimiters: Delimiters,
    encoding: TextEncoding,
}

impl XmlFormatter {
    pub fn new(delimiters: Delimiters, encoding: TextEncoding) -> Self {
        Self {
            delimiters,
            encoding,
        }
    }

    fn encoding_label(&self) -> &'static str {
        match self.encoding {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }
}

fn xml_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

impl LoadFileFormatter for XmlFormatter {
    fn format_kind(&self) -> LoadFileFormat {
        LoadFileFormat::Xml
    }

    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    fn header(&self, _columns: &Columns) -> Option<String> {
        Some(format!(
            "<?xml version=\"1.0\" encoding=\"{}\"?>\n<documents>",
            self.encoding_label()
        ))
    }

    fn format(&self, row: &ManifestRow, columns: &Columns) -> Result<String, FormatError> {
        let mut line = format!("  <document id=\"{}\">", xml_text(&row.doc_id));
        for column in columns.list() {
            line.push_str(&format!(
                "<field name=\"{}\">{}</field>",
                column.name(),
                xml_text(&column.value(row))
            ));
        }
        line.push_str("</document>");
        Ok(line)
    }

    fn footer(&self) -> Option<String> {
        Some("</documents>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::test_rows::{extended_row, row};
    use corpus_core::request::{CONCORDANCE_COLUMN, CONCORDANCE_NEWLINE, CONCORDANCE_QUOTE};

    fn formatter(format: LoadFileFormat) -> Box<dyn LoadFileFormatter> {
        formatter_for(format, Delimiters::for_format(format), TextEncoding::Utf8).unwrap()
    }

    #[test]
    fn test_dat_line_shape() {
        let f = formatter(LoadFileFormat::Dat);
        let columns = Columns::default();
        let line = f.format(&row(1), &columns).unwrap();
        assert_eq!(
            line.matches(CONCORDANCE_COLUMN).count(),
            columns.list().len() - 1
        );
        assert_eq!(line.matches(CONCORDANCE_QUOTE).count(), columns.list().len() * 2);
        assert!(line.starts_with("\u{FE}DOC00000001\u{FE}\u{14}"));
    }

    #[test]
    fn test_dat_header_names() {
        let header = formatter(LoadFileFormat::Concordance)
            .header(&Columns::default())
            .unwrap();
        assert!(header.contains("\u{FE}DOCID\u{FE}"));
        assert!(header.contains("\u{FE}FILEPATH\u{FE}"));
    }

    #[test]
    fn test_dat_newlines_replaced() {
        let f = formatter(LoadFileFormat::Dat);
        let line = f.format(&extended_row(1), &Columns::new(true, true)).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains(&format!("budget{CONCORDANCE_NEWLINE}review")));
    }

    #[test]
    fn test_opt_seven_columns_no_header() {
        let f = formatter(LoadFileFormat::Opt);
        assert!(f.header(&Columns::default()).is_none());
        let line = f.format(&row(2), &Columns::default()).unwrap();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], "DOC00000003");
        assert_eq!(fields[2], "folder_001\\DOC00000002.pdf");
        assert_eq!(fields[3], "Y");
        assert_eq!(fields[6], "2");
    }

    #[test]
    fn test_csv_quotes_and_escapes() {
        let f = formatter(LoadFileFormat::Csv);
        let columns = Columns::new(true, false);
        let line = f.format(&extended_row(1), &columns).unwrap();
        assert!(line.contains("\"Chen, Riley\""));
        assert!(line.contains("\"Quarterly \"\"budget\"\" review\""));
        assert!(!line.ends_with('\n'));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), columns.list().len());
    }

    #[test]
    fn test_csv_rejects_non_ascii_delimiter() {
        let delimiters = Delimiters {
            column: '\u{B6}',
            ..Delimiters::for_format(LoadFileFormat::Csv)
        };
        assert!(matches!(
            CsvFormatter::new(delimiters),
            Err(FormatError::InvalidDelimiter { .. })
        ));
        assert!(matches!(
            formatter_for(LoadFileFormat::Csv, delimiters, TextEncoding::Utf8),
            Err(FormatError::InvalidDelimiter { .. })
        ));
    }

    #[test]
    fn test_csv_writer_reused_across_rows() {
        let f = CsvFormatter::new(Delimiters::for_format(LoadFileFormat::Csv)).unwrap();
        let columns = Columns::default();
        let header = f.header(&columns).unwrap();
        let first = f.format(&row(1), &columns).unwrap();
        let second = f.format(&row(2), &columns).unwrap();
        assert!(header.starts_with("\"DOCID\""));
        assert!(first.starts_with("\"DOC00000001\""));
        assert!(second.starts_with("\"DOC00000002\""));
        assert!(!second.contains("DOC00000001"));
        assert!(!first.contains('\n') && !second.contains('\n'));

        let unquoted = Delimiters {
            quote: None,
            ..Delimiters::for_format(LoadFileFormat::Csv)
        };
        let f = CsvFormatter::new(unquoted).unwrap();
        let line = f.format(&row(3), &columns).unwrap();
        assert!(line.starts_with("DOC00000003,"));
        assert!(!line.contains('"'));
    }

    #[test]
    fn test_xml_document_and_footer() {
        let f = formatter(LoadFileFormat::Xml);
        let header = f.header(&Columns::default()).unwrap();
        assert!(header.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        let line = f.format(&extended_row(1), &Columns::new(true, false)).unwrap();
        assert!(line.contains(
            "<field name=\"SUBJECT\">Quarterly &quot;budget&quot;&#10;review</field>"
        ));
        assert_eq!(f.footer().as_deref(), Some("</documents>"));
    }
}
