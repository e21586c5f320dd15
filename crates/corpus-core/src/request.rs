//! Run configuration.
//!
//! A [`GenerationRequest`] is built either from CLI flags or from a YAML
//! profile:
//!
//! ```yaml
//! count: 1000
//! folders: 10
//! distribution: gaussian
//! seed: 42
//! file_type: pdf
//! format: dat
//! extended_fields: true
//! chaos:
//!   amount: "10%"
//!   types: [quotes, eol]
//! ```

use crate::error::ConfigError;
use crate::types::{AnomalyKind, Distribution, EolStyle, FileType, LoadFileFormat, TextEncoding};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Concordance column separator (ASCII 20, rendered as a pilcrow by review tools).
pub const CONCORDANCE_COLUMN: char = '\u{14}';
/// Concordance text qualifier (thorn).
pub const CONCORDANCE_QUOTE: char = '\u{FE}';
/// Concordance in-field newline replacement (registered sign).
pub const CONCORDANCE_NEWLINE: char = '\u{AE}';

/// Default per-buffer ceiling of the payload pool (8 MiB).
pub const DEFAULT_BUFFER_CEILING: usize = 8 * 1024 * 1024;
/// Default number of pooled buffers.
pub const DEFAULT_POOL_BUFFERS: usize = 64;

/// Load file delimiter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Column separator
    pub column: char,
    /// Text qualifier wrapped around every field, `None` for unquoted output
    pub quote: Option<char>,
    /// Replacement for line breaks inside field values
    pub newline: char,
    /// Line terminator
    #[serde(default)]
    pub eol: EolStyle,
}

impl Delimiters {
    /// Conventional delimiters for a format.
    pub fn for_format(format: LoadFileFormat) -> Self {
        match format {
            LoadFileFormat::Dat | LoadFileFormat::Concordance => Self {
                column: CONCORDANCE_COLUMN,
                quote: Some(CONCORDANCE_QUOTE),
                newline: CONCORDANCE_NEWLINE,
                eol: EolStyle::Crlf,
            },
            LoadFileFormat::Opt => Self {
                column: ',',
                quote: None,
                newline: ' ',
                eol: EolStyle::Crlf,
            },
            LoadFileFormat::Csv => Self {
                column: ',',
                quote: Some('"'),
                newline: ' ',
                eol: EolStyle::Crlf,
            },
            LoadFileFormat::Xml => Self {
                column: ',',
                quote: Some('"'),
                newline: ' ',
                eol: EolStyle::Lf,
            },
        }
    }
}

/// Parse a delimiter given on the command line.
///
/// Accepts a literal single character, a well-known name (`comma`, `pipe`,
/// `tab`, `semicolon`, `dc4`, `pilcrow`, `thorn`, `registered`, `none`) or a
/// numeric code point as `ascii:NNN` / `0xNN`. Returns `None` for `none`.
pub fn parse_delimiter(s: &str) -> Result<Option<char>, String> {
    let named = match s.to_lowercase().as_str() {
        "none" | "" => return Ok(None),
        "comma" => Some(','),
        "pipe" => Some('|'),
        "tab" => Some('\t'),
        "semicolon" => Some(';'),
        "caret" => Some('^'),
        "dc4" | "ascii20" => Some(CONCORDANCE_COLUMN),
        "pilcrow" => Some('\u{B6}'),
        "thorn" => Some(CONCORDANCE_QUOTE),
        "registered" => Some(CONCORDANCE_NEWLINE),
        _ => None,
    };
    if named.is_some() {
        return Ok(named);
    }

    let code = if let Some(rest) = s.strip_prefix("ascii:") {
        Some(rest.parse::<u32>().map_err(|e| format!("Bad code '{s}': {e}"))?)
    } else if let Some(rest) = s.strip_prefix("0x") {
        Some(u32::from_str_radix(rest, 16).map_err(|e| format!("Bad code '{s}': {e}"))?)
    } else {
        None
    };
    if let Some(code) = code {
        return char::from_u32(code)
            .map(Some)
            .ok_or_else(|| format!("Not a valid character code: {s}"));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => Err(format!("Delimiter must be a single character or a known name: {s}")),
    }
}

/// Number of lines to corrupt: an exact count or a share of all lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "String")]
pub enum ChaosAmount {
    Count(u64),
    Percent(f64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Count(u64),
    Text(String),
}

impl TryFrom<AmountRepr> for ChaosAmount {
    type Error = String;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Count(n) => Ok(ChaosAmount::Count(n)),
            AmountRepr::Text(s) => s.parse(),
        }
    }
}

impl From<ChaosAmount> for String {
    fn from(amount: ChaosAmount) -> Self {
        amount.to_string()
    }
}

impl ChaosAmount {
    /// Resolve to a line count for `total` lines, never exceeding `total`.
    pub fn resolve(&self, total: u64) -> u64 {
        let wanted = match self {
            ChaosAmount::Count(n) => *n,
            ChaosAmount::Percent(p) => ((total as f64) * p / 100.0).round() as u64,
        };
        wanted.min(total)
    }
}

impl fmt::Display for ChaosAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChaosAmount::Count(n) => write!(f, "{n}"),
            ChaosAmount::Percent(p) => write!(f, "{p}%"),
        }
    }
}

impl FromStr for ChaosAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pct) = s.strip_suffix('%') {
            let value: f64 = pct
                .trim()
                .parse()
                .map_err(|e| format!("Bad percentage '{s}': {e}"))?;
            if !value.is_finite() || value <= 0.0 || value > 100.0 {
                return Err(format!("Percentage must be in (0, 100]: {s}"));
            }
            Ok(ChaosAmount::Percent(value))
        } else {
            s.parse::<u64>()
                .map(ChaosAmount::Count)
                .map_err(|e| format!("Bad chaos amount '{s}': {e}"))
        }
    }
}

/// Fault injection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    pub amount: ChaosAmount,
    /// Enabled anomaly types; empty means every type applicable to the format
    #[serde(default)]
    pub types: Vec<AnomalyKind>,
    /// Selection seed; defaults to the run seed
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Reusable buffer pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of idle buffers kept for reuse
    #[serde(default = "default_pool_buffers")]
    pub max_buffers: usize,
    /// Buffers above this capacity are never pooled
    #[serde(default = "default_buffer_ceiling")]
    pub buffer_ceiling: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_buffers: DEFAULT_POOL_BUFFERS,
            buffer_ceiling: DEFAULT_BUFFER_CEILING,
        }
    }
}

fn default_pool_buffers() -> usize {
    DEFAULT_POOL_BUFFERS
}

fn default_buffer_ceiling() -> usize {
    DEFAULT_BUFFER_CEILING
}

fn default_folders() -> u32 {
    1
}

fn default_file_type() -> FileType {
    FileType::Pdf
}

fn default_bates_prefix() -> String {
    "DOC".to_string()
}

/// Immutable configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequest {
    /// Number of documents to generate
    pub count: u64,
    #[serde(default = "default_folders")]
    pub folders: u32,
    #[serde(default)]
    pub distribution: Distribution,
    /// Worker count; `None` uses every available CPU
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Global seed; `None` lets the process pick one
    #[serde(default)]
    pub seed: Option<u64>,
    /// Approximate archive size in bytes, reached by padding payloads
    #[serde(default)]
    pub target_size: Option<u64>,
    #[serde(default = "default_file_type")]
    pub file_type: FileType,
    #[serde(default)]
    pub format: LoadFileFormat,
    /// Delimiter override; `None` uses the format's conventional set
    #[serde(default)]
    pub delimiters: Option<Delimiters>,
    #[serde(default)]
    pub encoding: TextEncoding,
    #[serde(default = "default_bates_prefix")]
    pub bates_prefix: String,
    #[serde(default)]
    pub extended_fields: bool,
    #[serde(default)]
    pub extracted_text: bool,
    /// Probability in `[0, 1]` that an email carries an attachment
    #[serde(default)]
    pub attachment_rate: f64,
    /// Write the load file as the final archive entry instead of a sibling file
    #[serde(default)]
    pub manifest_in_archive: bool,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub chaos: Option<ChaosConfig>,
}

impl GenerationRequest {
    /// Request for `count` documents with every other option at its default.
    pub fn new(count: u64) -> Self {
        Self {
            count,
            folders: default_folders(),
            distribution: Distribution::default(),
            concurrency: None,
            seed: None,
            target_size: None,
            file_type: default_file_type(),
            format: LoadFileFormat::default(),
            delimiters: None,
            encoding: TextEncoding::default(),
            bates_prefix: default_bates_prefix(),
            extended_fields: false,
            extracted_text: false,
            attachment_rate: 0.0,
            manifest_in_archive: false,
            pool: PoolConfig::default(),
            chaos: None,
        }
    }

    pub fn with_folders(mut self, folders: u32) -> Self {
        self.folders = folders;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn with_format(mut self, format: LoadFileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_chaos(mut self, chaos: ChaosConfig) -> Self {
        self.chaos = Some(chaos);
        self
    }

    /// Parse a request from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let request: GenerationRequest = serde_yaml::from_str(yaml)?;
        Ok(request)
    }

    /// Load a request from a YAML profile file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Delimiters in effect for this run.
    pub fn effective_delimiters(&self) -> Delimiters {
        self.delimiters
            .unwrap_or_else(|| Delimiters::for_format(self.format))
    }

    /// Check every invariant before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::invalid("count", "must be at least 1"));
        }
        if self.folders == 0 {
            return Err(ConfigError::invalid("folders", "must be at least 1"));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::invalid("concurrency", "must be at least 1"));
        }
        if self.target_size == Some(0) {
            return Err(ConfigError::invalid("target-size", "must be greater than 0"));
        }
        if !self.attachment_rate.is_finite() || !(0.0..=1.0).contains(&self.attachment_rate) {
            return Err(ConfigError::invalid(
                "attachment-rate",
                format!("{} is not in [0, 1]", self.attachment_rate),
            ));
        }
        if self.bates_prefix.is_empty() || self.bates_prefix.contains(['/', '\\']) {
            return Err(ConfigError::invalid(
                "bates-prefix",
                "must be non-empty and must not contain path separators",
            ));
        }
        if self.pool.buffer_ceiling == 0 {
            return Err(ConfigError::invalid("pool.buffer_ceiling", "must be greater than 0"));
        }

        self.validate_delimiters()?;
        self.validate_chaos()
    }

    fn validate_delimiters(&self) -> Result<(), ConfigError> {
        let Some(delimiters) = self.delimiters else {
            return Ok(());
        };

        match self.format {
            LoadFileFormat::Concordance | LoadFileFormat::Opt | LoadFileFormat::Xml => {
                if delimiters != Delimiters::for_format(self.format) {
                    return Err(ConfigError::Conflict(format!(
                        "custom delimiters are not supported for the {} format",
                        self.format
                    )));
                }
            }
            LoadFileFormat::Csv => {
                if !delimiters.column.is_ascii() || delimiters.quote.is_some_and(|q| !q.is_ascii())
                {
                    return Err(ConfigError::invalid(
                        "delimiters",
                        "csv column and quote delimiters must be ASCII",
                    ));
                }
            }
            LoadFileFormat::Dat => {}
        }

        if delimiters.quote == Some(delimiters.column) {
            return Err(ConfigError::invalid(
                "delimiters",
                "column and quote delimiters must differ",
            ));
        }
        if matches!(delimiters.column, '\r' | '\n')
            || delimiters.quote.is_some_and(|q| matches!(q, '\r' | '\n'))
        {
            return Err(ConfigError::invalid(
                "delimiters",
                "line break characters cannot be used as delimiters",
            ));
        }
        Ok(())
    }

    fn validate_chaos(&self) -> Result<(), ConfigError> {
        let Some(chaos) = &self.chaos else {
            return Ok(());
        };

        if !self.format.is_line_oriented() {
            return Err(ConfigError::Conflict(format!(
                "chaos mode requires a line-oriented load file, not {}",
                self.format
            )));
        }
        if chaos.amount == ChaosAmount::Count(0) {
            return Err(ConfigError::invalid("chaos-amount", "must be at least 1"));
        }
        if let Some(kind) = chaos.types.iter().find(|kind| !kind.applies_to(self.format)) {
            return Err(ConfigError::Conflict(format!(
                "anomaly type '{kind}' cannot be applied to {} load files",
                self.format
            )));
        }
        Ok(())
    }
}
