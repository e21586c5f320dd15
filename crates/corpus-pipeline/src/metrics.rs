//! Run metrics.

use crate::pool::PoolStats;
use std::time::Duration;

/// Metrics from a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationMetrics {
    /// Documents written to the archive
    pub items_written: u64,
    /// Archive entries, including text siblings and an embedded load file
    pub archive_entries: u64,
    /// Final archive size in bytes
    pub archive_bytes: u64,
    /// Load file size in bytes (before compression when embedded)
    pub load_file_bytes: u64,
    /// Sum of payload sizes
    pub payload_bytes: u64,
    /// Total wall-clock time
    pub total_duration: Duration,
    /// Time spent in content generators, summed over workers
    pub generation_duration: Duration,
    /// Time the writer spent writing entries and lines
    pub write_duration: Duration,
    /// Most items the reorder buffer held at once
    pub reorder_high_water: usize,
    pub pool: PoolStats,
}

impl GenerationMetrics {
    pub fn items_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.items_written as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn bytes_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.archive_bytes as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let metrics = GenerationMetrics {
            items_written: 100,
            archive_bytes: 1000,
            total_duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(metrics.items_per_second(), 50.0);
        assert_eq!(metrics.bytes_per_second(), 500.0);
        assert_eq!(GenerationMetrics::default().items_per_second(), 0.0);
    }
}
