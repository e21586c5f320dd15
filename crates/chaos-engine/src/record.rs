use corpus_core::AnomalyKind;
use serde::{Deserialize, Serialize};

/// One injected anomaly, as listed in the run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// 1-based data line (the header is not counted)
    #[serde(rename = "lineIndex")]
    pub line_index: u64,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = AnomalyRecord {
            line_index: 7,
            kind: AnomalyKind::MixedDelimiters,
            description: "x".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"lineIndex": 7, "type": "mixed-delimiters", "description": "x"})
        );
    }
}
