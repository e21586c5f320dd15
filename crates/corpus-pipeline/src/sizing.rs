//! Target archive size planning.
//!
//! The archive size is steered by embedding incompressible padding in every
//! payload. The per-item padding is found by building a deterministic sample
//! of items into a throwaway archive and measuring what each one costs,
//! including local and central headers and any extracted-text sibling.

use crate::error::PipelineError;
use corpus_archive::ZipStreamWriter;
use corpus_generator::CorpusGenerator;
use std::io;
use tracing::{debug, info, warn};

/// Most items built per measurement.
const SAMPLE_SIZE: u64 = 32;

/// Measurements after the unpadded baseline.
const REFINEMENTS: usize = 3;

/// End of central directory plus ZIP64 end records, the worst case.
const END_RECORDS: u64 = 22 + 56 + 20;

/// Padding applied to every item of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaddingPlan {
    per_item: u64,
}

impl PaddingPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn uniform(per_item: u64) -> Self {
        Self { per_item }
    }

    /// Padding bytes for the item at `index`.
    pub fn for_index(&self, _index: u64) -> u64 {
        self.per_item
    }

    pub fn is_none(&self) -> bool {
        self.per_item == 0
    }
}

/// Indices spread evenly over `1..=total`.
fn sample_indices(total: u64) -> Vec<u64> {
    if total <= SAMPLE_SIZE {
        return (1..=total).collect();
    }
    (0..SAMPLE_SIZE)
        .map(|i| 1 + i * (total - 1) / (SAMPLE_SIZE - 1))
        .collect()
}

/// Average archive bytes per item for the sample at a given padding.
fn measure(
    generator: &CorpusGenerator,
    sample: &[u64],
    padding: u64,
    extracted_text: bool,
) -> Result<f64, PipelineError> {
    let mut zip = ZipStreamWriter::new(io::sink());
    let mut buf = Vec::new();
    for &index in sample {
        let item = generator.work_item(index);
        let document = generator
            .generate_padded(&item, padding, &mut buf)
            .map_err(|source| PipelineError::Generation { index, source })?;
        zip.add_entry(&item.relative_path, &buf)?;
        if extracted_text {
            let text = document.meta.extracted_text.as_deref().unwrap_or("");
            zip.add_entry(&item.text_path(), text.as_bytes())?;
        }
    }
    let (_, summary) = zip.finish()?;
    let per_item = summary.total_bytes.saturating_sub(22) as f64 / sample.len() as f64;
    debug!("Padding {} bytes: {:.0} archive bytes per item", padding, per_item);
    Ok(per_item)
}

/// Pick the per-item padding that brings the archive close to `target`.
///
/// `overhead` is any fixed cost outside the items, such as an embedded
/// load file. Returns no padding (with a warning) when the unpadded corpus is
/// already at or above the target.
pub fn plan_padding(
    generator: &CorpusGenerator,
    target: u64,
    overhead: u64,
    extracted_text: bool,
) -> Result<PaddingPlan, PipelineError> {
    let total = generator.total();
    let sample = sample_indices(total);
    let budget = target.saturating_sub(END_RECORDS + overhead);
    let wanted = budget as f64 / total as f64;

    let base = measure(generator, &sample, 0, extracted_text)?;
    if wanted <= base {
        warn!(
            "Target size {} bytes is below the unpadded estimate of {:.0} bytes; generating without padding",
            target,
            base * total as f64
        );
        return Ok(PaddingPlan::none());
    }

    // Secant steps; padding cost per byte is close to 1 but not exact
    // (text payloads carry base64, headers grow with ZIP64 fields)
    let (mut p0, mut s0) = (0.0f64, base);
    let mut p1 = wanted - base;
    let mut s1 = measure(generator, &sample, p1.round() as u64, extracted_text)?;
    for _ in 1..REFINEMENTS {
        let slope = (s1 - s0) / (p1 - p0);
        if !slope.is_finite() || slope <= 0.0 || (s1 - wanted).abs() < 1.0 {
            break;
        }
        let next = (p1 + (wanted - s1) / slope).max(0.0);
        (p0, s0) = (p1, s1);
        p1 = next;
        s1 = measure(generator, &sample, p1.round() as u64, extracted_text)?;
    }

    let per_item = p1.round() as u64;
    info!(
        "Target size {} bytes: padding each item with {} bytes (estimated {:.0} bytes per item)",
        target, per_item, s1
    );
    Ok(PaddingPlan::uniform(per_item))
}
