//! JSON run manifest written next to the archive.
//!
//! Field names follow the PascalCase convention review platforms expect;
//! anomaly records keep their own camelCase keys.

use chaos_engine::AnomalyRecord;
use chrono::{DateTime, Utc};
use corpus_core::{
    Delimiters, Distribution, FileType, GenerationRequest, LoadFileFormat, TextEncoding,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DelimiterInfo {
    pub column: String,
    /// Empty when fields are unquoted
    pub quote: String,
    pub newline: String,
    pub eol: String,
}

impl From<&Delimiters> for DelimiterInfo {
    fn from(d: &Delimiters) -> Self {
        Self {
            column: d.column.to_string(),
            quote: d.quote.map(String::from).unwrap_or_default(),
            newline: d.newline.to_string(),
            eol: d.eol.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChaosMode {
    pub enabled: bool,
    pub total_anomalies: u64,
    pub injected_anomalies: Vec<AnomalyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunManifest {
    pub format: LoadFileFormat,
    pub total_records: u64,
    pub delimiters: DelimiterInfo,
    pub encoding: TextEncoding,
    pub seed: u64,
    pub distribution: Distribution,
    pub folders: u32,
    pub file_type: FileType,
    pub archive_file: String,
    pub load_file: String,
    pub manifest_in_archive: bool,
    pub zip64: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chaos_mode: Option<ChaosMode>,
}

impl RunManifest {
    pub fn new(
        request: &GenerationRequest,
        seed: u64,
        archive_file: String,
        load_file: String,
        zip64: bool,
    ) -> Self {
        Self {
            format: request.format,
            total_records: request.count,
            delimiters: DelimiterInfo::from(&request.effective_delimiters()),
            encoding: request.encoding,
            seed,
            distribution: request.distribution,
            folders: request.folders,
            file_type: request.file_type,
            archive_file,
            load_file,
            manifest_in_archive: request.manifest_in_archive,
            zip64,
            generated_at: Utc::now(),
            target_size: request.target_size,
            chaos_mode: None,
        }
    }

    pub fn with_anomalies(mut self, anomalies: Vec<AnomalyRecord>) -> Self {
        self.chaos_mode = Some(ChaosMode {
            enabled: true,
            total_anomalies: anomalies.len() as u64,
            injected_anomalies: anomalies,
        });
        self
    }

    pub fn write_to(&self, path: &Path) -> Result<(), crate::PipelineError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, crate::PipelineError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::AnomalyKind;

    #[test]
    fn test_json_field_names() {
        let request = GenerationRequest::new(10);
        let manifest = RunManifest::new(&request, 42, "a.zip".into(), "a.dat".into(), false)
            .with_anomalies(vec![AnomalyRecord {
                line_index: 3,
                kind: AnomalyKind::Quotes,
                description: "closing quote of field 1 dropped".into(),
            }]);
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["Format"], "dat");
        assert_eq!(json["TotalRecords"], 10);
        assert_eq!(json["Delimiters"]["Column"], "\u{14}");
        assert_eq!(json["Delimiters"]["Eol"], "CRLF");
        assert_eq!(json["Seed"], 42);
        assert_eq!(json["ChaosMode"]["Enabled"], true);
        assert_eq!(json["ChaosMode"]["TotalAnomalies"], 1);
        assert_eq!(json["ChaosMode"]["InjectedAnomalies"][0]["lineIndex"], 3);
        assert_eq!(json["ChaosMode"]["InjectedAnomalies"][0]["type"], "quotes");
        assert!(json.get("TargetSize").is_none());
    }

    #[test]
    fn test_no_chaos_section_without_chaos() {
        let request = GenerationRequest::new(1);
        let manifest = RunManifest::new(&request, 1, "a".into(), "b".into(), false);
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("ChaosMode").is_none());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("run_manifest.json");
        let request = GenerationRequest::new(5);
        let manifest = RunManifest::new(&request, 9, "x.zip".into(), "x.opt".into(), true);
        manifest.write_to(&path).unwrap();
        assert_eq!(RunManifest::from_file(&path).unwrap(), manifest);
    }
}
