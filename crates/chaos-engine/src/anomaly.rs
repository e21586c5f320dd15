//! Anomaly taxonomy.
//!
//! Each anomaly rewrites one formatted line. Text anomalies return a new
//! string; `encoding` works on the encoded bytes and returns them raw.

use corpus_core::{AnomalyKind, TextEncoding};
use loadfile_types::{encode_into, invalid_sequence};
use rand::rngs::StdRng;
use rand::Rng;

/// Characters `mixed-delimiters` may substitute for the column delimiter.
const STRAY_DELIMITERS: [char; 5] = ['|', ';', '\t', ',', '^'];

/// Values `opt-pagecount` writes into the page count column.
const PAGECOUNT_SENTINELS: [&str; 5] = ["NaN", "-1", "ERR", "0", "1.5"];

/// OPT column holding the document break flag.
const OPT_DOC_BREAK: usize = 3;

/// A line as handed to the manifest sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmittedLine {
    /// Still text; encoded with the run's encoding at write time
    Text(String),
    /// Already encoded, possibly invalid in the run's encoding
    Raw(Vec<u8>),
}

impl EmittedLine {
    pub fn write_to(&self, encoding: TextEncoding, out: &mut Vec<u8>) {
        match self {
            EmittedLine::Text(text) => encode_into(text, encoding, out),
            EmittedLine::Raw(bytes) => out.extend_from_slice(bytes),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EmittedLine::Text(text) => Some(text),
            EmittedLine::Raw(_) => None,
        }
    }
}

/// What the engine needs to know about a line's syntax.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineShape<'a> {
    pub column: char,
    pub quote: Option<char>,
    pub eol: &'a str,
    pub encoding: TextEncoding,
}

pub(crate) struct Corruption {
    pub line: EmittedLine,
    pub description: String,
}

impl Corruption {
    fn text(line: String, description: String) -> Self {
        Self {
            line: EmittedLine::Text(line),
            description,
        }
    }

    fn unchanged(line: &str, reason: &str) -> Self {
        Self::text(line.to_string(), format!("line unchanged: {reason}"))
    }
}

/// Byte offsets of column delimiters that separate fields, i.e. those
/// outside quoted values.
pub fn field_separators(line: &str, column: char, quote: Option<char>) -> Vec<usize> {
    let mut in_quotes = false;
    let mut separators = Vec::new();
    for (i, c) in line.char_indices() {
        if Some(c) == quote {
            in_quotes = !in_quotes;
        } else if c == column && !in_quotes {
            separators.push(i);
        }
    }
    separators
}

fn printable(c: char) -> String {
    c.escape_debug().to_string()
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

pub(crate) fn apply(
    kind: AnomalyKind,
    line: &str,
    shape: &LineShape<'_>,
    rng: &mut StdRng,
) -> Corruption {
    match kind {
        AnomalyKind::MixedDelimiters => mixed_delimiters(line, shape, rng),
        AnomalyKind::Quotes => quotes(line, shape, rng),
        AnomalyKind::Columns => shift_columns(line, shape.column, shape.quote, rng),
        AnomalyKind::Eol => eol(line, shape, rng),
        AnomalyKind::Encoding => encoding(line, shape, rng),
        AnomalyKind::OptBoundary => opt_boundary(line, shape),
        AnomalyKind::OptColumns => {
            let mut corruption = shift_columns(line, shape.column, None, rng);
            corruption.description = format!("OPT {}", corruption.description);
            corruption
        }
        AnomalyKind::OptPagecount => opt_pagecount(line, shape, rng),
    }
}

fn mixed_delimiters(line: &str, shape: &LineShape<'_>, rng: &mut StdRng) -> Corruption {
    let separators = field_separators(line, shape.column, shape.quote);
    if separators.is_empty() {
        return Corruption::unchanged(line, "no column delimiter to replace");
    }
    let which = rng.gen_range(0..separators.len());
    let at = separators[which];
    let candidates: Vec<char> = STRAY_DELIMITERS
        .into_iter()
        .filter(|c| *c != shape.column && Some(*c) != shape.quote)
        .collect();
    let replacement = pick(rng, &candidates);

    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..at]);
    out.push(replacement);
    out.push_str(&line[at + shape.column.len_utf8()..]);
    Corruption::text(
        out,
        format!(
            "column delimiter {} of {} replaced with '{}'",
            which + 1,
            separators.len(),
            printable(replacement)
        ),
    )
}

fn quotes(line: &str, shape: &LineShape<'_>, rng: &mut StdRng) -> Corruption {
    let Some(quote) = shape.quote else {
        return Corruption::unchanged(line, "quote delimiter is none");
    };
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let closing: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(k, (_, c))| {
            *c == quote && chars.get(k + 1).map_or(true, |(_, next)| *next == shape.column)
        })
        .map(|(_, (i, _))| *i)
        .collect();
    if closing.is_empty() {
        return Corruption::unchanged(line, "no closing quote found");
    }
    let which = rng.gen_range(0..closing.len());
    let at = closing[which];

    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..at]);
    out.push_str(&line[at + quote.len_utf8()..]);
    Corruption::text(
        out,
        format!("closing quote of field {} dropped", which + 1),
    )
}

/// Insert or remove one column delimiter.
fn shift_columns(
    line: &str,
    column: char,
    quote: Option<char>,
    rng: &mut StdRng,
) -> Corruption {
    let separators = field_separators(line, column, quote);
    let remove = !separators.is_empty() && rng.gen_bool(0.5);
    let mut out = String::with_capacity(line.len() + column.len_utf8());
    if remove {
        let which = rng.gen_range(0..separators.len());
        let at = separators[which];
        out.push_str(&line[..at]);
        out.push_str(&line[at + column.len_utf8()..]);
        Corruption::text(
            out,
            format!(
                "column delimiter {} removed, merging fields {} and {}",
                which + 1,
                which + 1,
                which + 2
            ),
        )
    } else if separators.is_empty() {
        out.push_str(line);
        out.push(column);
        Corruption::text(out, "extra column delimiter appended".to_string())
    } else {
        let which = rng.gen_range(0..separators.len());
        let at = separators[which] + column.len_utf8();
        out.push_str(&line[..at]);
        out.push(column);
        out.push_str(&line[at..]);
        Corruption::text(
            out,
            format!("extra column delimiter inserted after field {}", which + 1),
        )
    }
}

fn eol(line: &str, shape: &LineShape<'_>, rng: &mut StdRng) -> Corruption {
    let inner: Vec<usize> = line.char_indices().map(|(i, _)| i).filter(|i| *i > 0).collect();
    let at = if inner.is_empty() { 0 } else { pick(rng, &inner) };
    let mut out = String::with_capacity(line.len() + shape.eol.len());
    out.push_str(&line[..at]);
    out.push_str(shape.eol);
    out.push_str(&line[at..]);
    Corruption::text(
        out,
        format!(
            "line break {} injected at character offset {}",
            shape.eol.escape_debug(),
            line[..at].chars().count()
        ),
    )
}

fn encoding(line: &str, shape: &LineShape<'_>, rng: &mut StdRng) -> Corruption {
    let targets: Vec<(usize, char)> = line
        .char_indices()
        .filter(|(_, c)| *c != shape.column && Some(*c) != shape.quote)
        .collect();
    if targets.is_empty() {
        return Corruption::unchanged(line, "no field character to corrupt");
    }
    let (at, target) = pick(rng, &targets);
    let invalid = invalid_sequence(shape.encoding);

    let mut bytes = Vec::with_capacity(line.len() + invalid.len());
    encode_into(&line[..at], shape.encoding, &mut bytes);
    bytes.extend_from_slice(invalid);
    encode_into(&line[at + target.len_utf8()..], shape.encoding, &mut bytes);

    let hex: Vec<String> = invalid.iter().map(|b| format!("{b:02X}")).collect();
    Corruption {
        line: EmittedLine::Raw(bytes),
        description: format!(
            "character '{}' at offset {} replaced with invalid {} bytes {}",
            printable(target),
            line[..at].chars().count(),
            shape.encoding,
            hex.join(" ")
        ),
    }
}

fn opt_boundary(line: &str, shape: &LineShape<'_>) -> Corruption {
    let mut fields: Vec<&str> = line.split(shape.column).collect();
    if fields.len() <= OPT_DOC_BREAK {
        return Corruption::unchanged(line, "no document break column");
    }
    let flipped = if fields[OPT_DOC_BREAK] == "Y" { "" } else { "Y" };
    let description = format!(
        "document break flag flipped from '{}' to '{}'",
        fields[OPT_DOC_BREAK], flipped
    );
    fields[OPT_DOC_BREAK] = flipped;
    let mut buf = [0u8; 4];
    let separator: &str = shape.column.encode_utf8(&mut buf);
    Corruption::text(fields.join(separator), description)
}

fn opt_pagecount(line: &str, shape: &LineShape<'_>, rng: &mut StdRng) -> Corruption {
    let Some(at) = line.rfind(shape.column) else {
        return Corruption::unchanged(line, "no page count column");
    };
    let start = at + shape.column.len_utf8();
    let original = &line[start..];
    let candidates: Vec<&str> = PAGECOUNT_SENTINELS
        .into_iter()
        .filter(|s| *s != original)
        .collect();
    let sentinel = pick(rng, &candidates);
    Corruption::text(
        format!("{}{sentinel}", &line[..start]),
        format!("page count '{original}' replaced with '{sentinel}'"),
    )
}
