//! Command-line arguments for a generation run.
//!
//! Every option can also come from a `CORPUS_*` environment variable. When a
//! YAML profile is given with `--config` it is loaded first and any option
//! passed explicitly overrides the profile value.

use clap::Args;
use corpus_core::{
    parse_delimiter, AnomalyKind, ChaosAmount, ChaosConfig, ConfigError, Delimiters,
    Distribution, EolStyle, FileType, GenerationRequest, LoadFileFormat, TextEncoding,
};
use std::path::PathBuf;

/// Parse a byte size with an optional `KB`, `MB` or `GB` suffix (powers of 1024).
pub fn parse_size(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };
    let value: f64 = digits
        .trim()
        .parse()
        .map_err(|e| format!("Bad size '{trimmed}': {e}"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("Size must be positive: {trimmed}"));
    }
    Ok((value * multiplier as f64).round() as u64)
}

/// Output location options.
#[derive(Args, Clone, Debug)]
pub struct OutputArgs {
    /// Directory the archive, load file and run manifest are written to
    #[arg(long, short = 'o', default_value = ".", env = "CORPUS_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Base file name (default: corpus_<timestamp>)
    #[arg(long, env = "CORPUS_NAME")]
    pub name: Option<String>,
}

/// Load file delimiter overrides.
#[derive(Args, Clone, Debug, Default)]
pub struct DelimiterArgs {
    /// Column delimiter: a character, a name (comma, pipe, tab, dc4, ...) or ascii:NNN
    #[arg(long, env = "CORPUS_COLUMN_DELIMITER")]
    pub column_delimiter: Option<String>,

    /// Quote delimiter, or "none" for unquoted fields
    #[arg(long, env = "CORPUS_QUOTE_DELIMITER")]
    pub quote_delimiter: Option<String>,

    /// Replacement for line breaks inside field values
    #[arg(long, env = "CORPUS_NEWLINE_DELIMITER")]
    pub newline_delimiter: Option<String>,

    /// Line terminator: crlf, lf or cr
    #[arg(long, env = "CORPUS_EOL")]
    pub eol: Option<EolStyle>,
}

impl DelimiterArgs {
    fn is_empty(&self) -> bool {
        self.column_delimiter.is_none()
            && self.quote_delimiter.is_none()
            && self.newline_delimiter.is_none()
            && self.eol.is_none()
    }

    /// Overlay these options on `base`.
    pub fn apply(&self, base: Delimiters) -> Result<Delimiters, ConfigError> {
        let mut delimiters = base;
        if let Some(column) = &self.column_delimiter {
            delimiters.column = parse_delimiter(column)
                .map_err(|e| ConfigError::invalid("column-delimiter", e))?
                .ok_or_else(|| ConfigError::invalid("column-delimiter", "cannot be none"))?;
        }
        if let Some(quote) = &self.quote_delimiter {
            delimiters.quote =
                parse_delimiter(quote).map_err(|e| ConfigError::invalid("quote-delimiter", e))?;
        }
        if let Some(newline) = &self.newline_delimiter {
            delimiters.newline = parse_delimiter(newline)
                .map_err(|e| ConfigError::invalid("newline-delimiter", e))?
                .ok_or_else(|| ConfigError::invalid("newline-delimiter", "cannot be none"))?;
        }
        if let Some(eol) = self.eol {
            delimiters.eol = eol;
        }
        Ok(delimiters)
    }
}

/// Fault injection options.
#[derive(Args, Clone, Debug, Default)]
pub struct ChaosArgs {
    /// Lines to corrupt: an exact count ("5") or a share of all lines ("10%")
    #[arg(long, env = "CORPUS_CHAOS_AMOUNT")]
    pub chaos_amount: Option<ChaosAmount>,

    /// Anomaly types to inject (comma-separated, empty = every type for the format)
    #[arg(long, value_delimiter = ',', env = "CORPUS_CHAOS_TYPES")]
    pub chaos_types: Vec<AnomalyKind>,

    /// Seed for line selection (default: the run seed)
    #[arg(long, env = "CORPUS_CHAOS_SEED")]
    pub chaos_seed: Option<u64>,
}

/// Arguments of the `generate` command.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// YAML run profile; explicit options override its values
    #[arg(long, short = 'c', env = "CORPUS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Number of documents to generate
    #[arg(long, short = 'n', env = "CORPUS_COUNT")]
    pub count: Option<u64>,

    /// Number of folders documents are spread over
    #[arg(long, env = "CORPUS_FOLDERS")]
    pub folders: Option<u32>,

    /// Folder distribution: proportional, gaussian or exponential
    #[arg(long, env = "CORPUS_DISTRIBUTION")]
    pub distribution: Option<Distribution>,

    /// Worker count (default: number of CPUs)
    #[arg(long, short = 'j', env = "CORPUS_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Global seed; the same seed reproduces the same corpus byte for byte
    #[arg(long, env = "CORPUS_SEED")]
    pub seed: Option<u64>,

    /// Approximate archive size, e.g. 500MB or 2GB
    #[arg(long, value_parser = parse_size, env = "CORPUS_TARGET_SIZE")]
    pub target_size: Option<u64>,

    /// Document type: pdf, docx, xlsx, tiff, eml, txt or mixed
    #[arg(long, env = "CORPUS_FILE_TYPE")]
    pub file_type: Option<FileType>,

    /// Load file format: dat, concordance, opt, csv or xml
    #[arg(long, env = "CORPUS_FORMAT")]
    pub format: Option<LoadFileFormat>,

    #[command(flatten)]
    pub delimiters: DelimiterArgs,

    /// Load file text encoding: utf-8, utf-16le or windows-1252
    #[arg(long, env = "CORPUS_ENCODING")]
    pub encoding: Option<TextEncoding>,

    /// Control number prefix
    #[arg(long, env = "CORPUS_BATES_PREFIX")]
    pub bates_prefix: Option<String>,

    /// Add custodian, author, subject, dates and SHA-256 columns
    #[arg(long, env = "CORPUS_EXTENDED_FIELDS")]
    pub extended_fields: bool,

    /// Write an extracted-text sibling for every document
    #[arg(long, env = "CORPUS_EXTRACTED_TEXT")]
    pub extracted_text: bool,

    /// Probability in [0, 1] that an email carries an attachment
    #[arg(long, env = "CORPUS_ATTACHMENT_RATE")]
    pub attachment_rate: Option<f64>,

    /// Store the load file as the last archive entry instead of a sibling file
    #[arg(long, env = "CORPUS_MANIFEST_IN_ARCHIVE")]
    pub manifest_in_archive: bool,

    #[command(flatten)]
    pub chaos: ChaosArgs,

    /// Idle payload buffers kept for reuse
    #[arg(long, env = "CORPUS_POOL_BUFFERS")]
    pub pool_buffers: Option<usize>,

    /// Largest buffer the pool keeps, in bytes (KB/MB suffixes accepted)
    #[arg(long, value_parser = parse_size, env = "CORPUS_BUFFER_CEILING")]
    pub buffer_ceiling: Option<u64>,
}

impl GenerateArgs {
    /// Build the run request from the profile (if any) and explicit options.
    pub fn to_request(&self) -> Result<GenerationRequest, ConfigError> {
        let mut request = match (&self.config, self.count) {
            (Some(path), _) => GenerationRequest::from_file(path)?,
            (None, Some(count)) => GenerationRequest::new(count),
            (None, None) => {
                return Err(ConfigError::invalid(
                    "count",
                    "required when no --config profile is given",
                ))
            }
        };

        if let Some(count) = self.count {
            request.count = count;
        }
        if let Some(folders) = self.folders {
            request.folders = folders;
        }
        if let Some(distribution) = self.distribution {
            request.distribution = distribution;
        }
        if self.concurrency.is_some() {
            request.concurrency = self.concurrency;
        }
        if self.seed.is_some() {
            request.seed = self.seed;
        }
        if self.target_size.is_some() {
            request.target_size = self.target_size;
        }
        if let Some(file_type) = self.file_type {
            request.file_type = file_type;
        }
        if let Some(format) = self.format {
            // conventional delimiters follow the format unless overridden below
            if format != request.format {
                request.delimiters = None;
            }
            request.format = format;
        }
        if !self.delimiters.is_empty() {
            request.delimiters = Some(self.delimiters.apply(request.effective_delimiters())?);
        }
        if let Some(encoding) = self.encoding {
            request.encoding = encoding;
        }
        if let Some(prefix) = &self.bates_prefix {
            request.bates_prefix = prefix.clone();
        }
        request.extended_fields |= self.extended_fields;
        request.extracted_text |= self.extracted_text;
        request.manifest_in_archive |= self.manifest_in_archive;
        if let Some(rate) = self.attachment_rate {
            request.attachment_rate = rate;
        }
        if let Some(max_buffers) = self.pool_buffers {
            request.pool.max_buffers = max_buffers;
        }
        if let Some(ceiling) = self.buffer_ceiling {
            request.pool.buffer_ceiling = usize::try_from(ceiling).map_err(|_| {
                ConfigError::invalid("buffer-ceiling", "too large for this platform")
            })?;
        }

        self.apply_chaos(&mut request)?;
        request.validate()?;
        Ok(request)
    }

    fn apply_chaos(&self, request: &mut GenerationRequest) -> Result<(), ConfigError> {
        let chaos = &self.chaos;
        if let Some(existing) = request.chaos.as_mut() {
            if let Some(amount) = chaos.chaos_amount {
                existing.amount = amount;
            }
            if !chaos.chaos_types.is_empty() {
                existing.types = chaos.chaos_types.clone();
            }
            if chaos.chaos_seed.is_some() {
                existing.seed = chaos.chaos_seed;
            }
        } else if let Some(amount) = chaos.chaos_amount {
            request.chaos = Some(ChaosConfig {
                amount,
                types: chaos.chaos_types.clone(),
                seed: chaos.chaos_seed,
            });
        } else if !chaos.chaos_types.is_empty() || chaos.chaos_seed.is_some() {
            return Err(ConfigError::Conflict(
                "--chaos-types and --chaos-seed require --chaos-amount".to_string(),
            ));
        }
        Ok(())
    }
}
