//! Type tags selecting generators, formatters and distributions.
//!
//! Each tag is a plain enum with `Display`/`FromStr` so the same value can be
//! read from a YAML profile, a CLI flag, or written into the run manifest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document type produced by the content generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Xlsx,
    Tiff,
    Eml,
    Txt,
    /// Pick one of the concrete types per item from the item's seeded stream
    Mixed,
}

impl FileType {
    /// Concrete types a `Mixed` run draws from, in draw order.
    pub const CONCRETE: [FileType; 6] = [
        FileType::Pdf,
        FileType::Docx,
        FileType::Xlsx,
        FileType::Tiff,
        FileType::Eml,
        FileType::Txt,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Xlsx => "xlsx",
            FileType::Tiff => "tif",
            FileType::Eml => "eml",
            FileType::Txt => "txt",
            FileType::Mixed => "bin",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Xlsx => "xlsx",
            FileType::Tiff => "tiff",
            FileType::Eml => "eml",
            FileType::Txt => "txt",
            FileType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "docx" | "word" => Ok(FileType::Docx),
            "xlsx" | "excel" => Ok(FileType::Xlsx),
            "tiff" | "tif" => Ok(FileType::Tiff),
            "eml" | "email" => Ok(FileType::Eml),
            "txt" | "text" => Ok(FileType::Txt),
            "mixed" => Ok(FileType::Mixed),
            _ => Err(format!("Unknown file type: {s}")),
        }
    }
}

/// Statistical shape used to spread items across folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    #[default]
    Proportional,
    Gaussian,
    Exponential,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Proportional => write!(f, "proportional"),
            Distribution::Gaussian => write!(f, "gaussian"),
            Distribution::Exponential => write!(f, "exponential"),
        }
    }
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proportional" | "even" => Ok(Distribution::Proportional),
            "gaussian" | "normal" | "bell" => Ok(Distribution::Gaussian),
            "exponential" | "decay" => Ok(Distribution::Exponential),
            _ => Err(format!("Unknown distribution: {s}")),
        }
    }
}

/// Load file serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFileFormat {
    #[default]
    Dat,
    Concordance,
    /// 7-column Opticon image cross-reference
    Opt,
    Csv,
    Xml,
}

impl LoadFileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            LoadFileFormat::Dat | LoadFileFormat::Concordance => "dat",
            LoadFileFormat::Opt => "opt",
            LoadFileFormat::Csv => "csv",
            LoadFileFormat::Xml => "xml",
        }
    }

    /// Whether the format emits a column header line before the rows.
    pub fn has_header(&self) -> bool {
        !matches!(self, LoadFileFormat::Opt)
    }

    /// Whether one manifest row maps to exactly one text line, which is what
    /// the chaos engine needs to address lines by index.
    pub fn is_line_oriented(&self) -> bool {
        !matches!(self, LoadFileFormat::Xml)
    }
}

impl fmt::Display for LoadFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFileFormat::Dat => write!(f, "dat"),
            LoadFileFormat::Concordance => write!(f, "concordance"),
            LoadFileFormat::Opt => write!(f, "opt"),
            LoadFileFormat::Csv => write!(f, "csv"),
            LoadFileFormat::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for LoadFileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dat" => Ok(LoadFileFormat::Dat),
            "concordance" => Ok(LoadFileFormat::Concordance),
            "opt" | "opticon" => Ok(LoadFileFormat::Opt),
            "csv" => Ok(LoadFileFormat::Csv),
            "xml" => Ok(LoadFileFormat::Xml),
            _ => Err(format!("Unknown load file format: {s}")),
        }
    }
}

/// Text encoding of the load file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "utf-16le", alias = "utf16le")]
    Utf16Le,
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Utf16Le => write!(f, "utf-16le"),
            TextEncoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf16" | "utf-16" | "utf16le" | "utf-16le" => Ok(TextEncoding::Utf16Le),
            "ansi" | "cp1252" | "windows-1252" | "windows1252" => Ok(TextEncoding::Windows1252),
            _ => Err(format!("Unknown text encoding: {s}")),
        }
    }
}

/// Line terminator written after each load file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EolStyle {
    #[default]
    Crlf,
    Lf,
    Cr,
}

impl EolStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            EolStyle::Crlf => "\r\n",
            EolStyle::Lf => "\n",
            EolStyle::Cr => "\r",
        }
    }
}

impl fmt::Display for EolStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EolStyle::Crlf => write!(f, "CRLF"),
            EolStyle::Lf => write!(f, "LF"),
            EolStyle::Cr => write!(f, "CR"),
        }
    }
}

impl FromStr for EolStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crlf" | "windows" => Ok(EolStyle::Crlf),
            "lf" | "unix" => Ok(EolStyle::Lf),
            "cr" | "mac" => Ok(EolStyle::Cr),
            _ => Err(format!("Unknown line ending: {s}")),
        }
    }
}

/// Malformation types the chaos engine can inject into a load file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    MixedDelimiters,
    Quotes,
    Columns,
    Eol,
    Encoding,
    OptBoundary,
    OptColumns,
    OptPagecount,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 8] = [
        AnomalyKind::MixedDelimiters,
        AnomalyKind::Quotes,
        AnomalyKind::Columns,
        AnomalyKind::Eol,
        AnomalyKind::Encoding,
        AnomalyKind::OptBoundary,
        AnomalyKind::OptColumns,
        AnomalyKind::OptPagecount,
    ];

    /// Tag written into anomaly records and accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::MixedDelimiters => "mixed-delimiters",
            AnomalyKind::Quotes => "quotes",
            AnomalyKind::Columns => "columns",
            AnomalyKind::Eol => "eol",
            AnomalyKind::Encoding => "encoding",
            AnomalyKind::OptBoundary => "opt-boundary",
            AnomalyKind::OptColumns => "opt-columns",
            AnomalyKind::OptPagecount => "opt-pagecount",
        }
    }

    pub fn is_opt_only(&self) -> bool {
        matches!(
            self,
            AnomalyKind::OptBoundary | AnomalyKind::OptColumns | AnomalyKind::OptPagecount
        )
    }

    /// Whether this anomaly can be applied to lines of the given format.
    pub fn applies_to(&self, format: LoadFileFormat) -> bool {
        match format {
            LoadFileFormat::Xml => false,
            LoadFileFormat::Opt => {
                self.is_opt_only() || matches!(self, AnomalyKind::Eol | AnomalyKind::Encoding)
            }
            _ => !self.is_opt_only(),
        }
    }

    /// Every anomaly applicable to the format, in taxonomy order.
    pub fn defaults_for(format: LoadFileFormat) -> Vec<AnomalyKind> {
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| kind.applies_to(format))
            .collect()
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown anomaly type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_round_trip_names() {
        for ft in FileType::CONCRETE {
            assert_eq!(ft.to_string().parse::<FileType>().unwrap(), ft);
        }
        assert_eq!("tif".parse::<FileType>().unwrap(), FileType::Tiff);
        assert!("wav".parse::<FileType>().is_err());
    }

    #[test]
    fn test_anomaly_kind_parse() {
        assert_eq!(
            "mixed_delimiters".parse::<AnomalyKind>().unwrap(),
            AnomalyKind::MixedDelimiters
        );
        assert_eq!(
            "OPT-PAGECOUNT".parse::<AnomalyKind>().unwrap(),
            AnomalyKind::OptPagecount
        );
        assert!("truncate".parse::<AnomalyKind>().is_err());
    }

    #[test]
    fn test_anomaly_defaults_per_format() {
        let dat = AnomalyKind::defaults_for(LoadFileFormat::Dat);
        assert!(dat.contains(&AnomalyKind::Quotes));
        assert!(!dat.iter().any(|k| k.is_opt_only()));

        let opt = AnomalyKind::defaults_for(LoadFileFormat::Opt);
        assert!(opt.contains(&AnomalyKind::OptBoundary));
        assert!(!opt.contains(&AnomalyKind::Quotes));

        assert!(AnomalyKind::defaults_for(LoadFileFormat::Xml).is_empty());
    }

    #[test]
    fn test_format_header_and_extension() {
        assert!(!LoadFileFormat::Opt.has_header());
        assert!(LoadFileFormat::Concordance.has_header());
        assert_eq!(LoadFileFormat::Concordance.extension(), "dat");
        assert!(!LoadFileFormat::Xml.is_line_oriented());
    }
}
