//! Concurrent generation run.
//!
//! ```text
//!            claim index (AtomicU64)          bounded mpsc
//!  worker 1 ─┐   generate on blocking pool   ┌──────────────┐
//!  worker 2 ─┼──────────────────────────────►│ writer thread │─► archive + load file
//!  worker N ─┘   (item, permit)              │ reorder buffer│
//!                                            └──────────────┘
//! ```
//!
//! A worker takes a semaphore permit before it claims an index and the
//! writer drops the permit only once that item is written. The claimed but
//! unwritten indices are therefore a contiguous range of at most
//! `2 × concurrency` items starting at the next index the writer needs, so
//! the reorder buffer is bounded and the writer always has something it can
//! eventually flush.

use crate::error::PipelineError;
use crate::metrics::GenerationMetrics;
use crate::pool::BufferPool;
use crate::reorder::ReorderBuffer;
use crate::run_manifest::RunManifest;
use crate::sizing::{plan_padding, PaddingPlan};
use crate::writer::{sha256_hex, CompletedItem, CorpusWriter, OutputPaths, WriterOutcome};
use chaos_engine::ChaosEngine;
use corpus_core::GenerationRequest;
use corpus_generator::{process_seed, CorpusGenerator};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Items between progress log lines.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Rough compressed size of one load file line, counted against the target
/// size when the load file is embedded.
const EMBEDDED_ROW_ESTIMATE: u64 = 64;

/// Payload buffer capacity requested from the pool when no padding is planned.
const DEFAULT_SIZE_HINT: usize = 16 * 1024;

/// Where and under what name a run writes its files.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub dir: PathBuf,
    /// Base file name; a timestamped name is used when unset
    pub name: Option<String>,
}

impl OutputOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn resolve_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("corpus_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")))
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub paths: OutputPaths,
    pub seed: u64,
    pub manifest: RunManifest,
    pub metrics: GenerationMetrics,
}

/// State shared by the workers.
struct WorkerShared {
    generator: CorpusGenerator,
    padding: PaddingPlan,
    hash_payloads: bool,
    next: AtomicU64,
    permits: Arc<Semaphore>,
    pool: Arc<BufferPool>,
    cancel: CancellationToken,
    #[cfg(test)]
    fail_at: Option<u64>,
}

type Delivery = (CompletedItem, OwnedSemaphorePermit);

pub struct CorpusPipeline {
    request: GenerationRequest,
    output: OutputOptions,
    #[cfg(test)]
    fail_at: Option<u64>,
}

impl CorpusPipeline {
    /// Validate the request; nothing touches the disk until [`Self::run`].
    pub fn new(request: GenerationRequest, output: OutputOptions) -> Result<Self, PipelineError> {
        request.validate()?;
        Ok(Self {
            request,
            output,
            #[cfg(test)]
            fail_at: None,
        })
    }

    /// Make content generation fail for `index`.
    #[cfg(test)]
    fn fail_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Generate the corpus.
    pub async fn run(self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let request = self.request;
        let total = request.count;

        let seed = match request.seed {
            Some(seed) => seed,
            None => {
                let seed = process_seed();
                info!("No seed given; using {} (pass --seed {} to replay)", seed, seed);
                seed
            }
        };
        let concurrency = request.concurrency.unwrap_or_else(num_cpus::get).max(1);
        let delimiters = request.effective_delimiters();

        let chaos = match &request.chaos {
            Some(config) => Some(ChaosEngine::new(
                config,
                request.format,
                delimiters,
                request.encoding,
                total,
                seed,
            )?),
            None => None,
        };

        let generator = CorpusGenerator::new(&request, seed);
        let padding = match request.target_size {
            Some(target) => {
                let overhead = if request.manifest_in_archive {
                    total.saturating_mul(EMBEDDED_ROW_ESTIMATE)
                } else {
                    0
                };
                let sampler = generator.clone();
                let extracted_text = request.extracted_text;
                tokio::task::spawn_blocking(move || {
                    plan_padding(&sampler, target, overhead, extracted_text)
                })
                .await??
            }
            None => PaddingPlan::none(),
        };

        std::fs::create_dir_all(&self.output.dir)?;
        let name = self.output.resolve_name();
        let paths = OutputPaths::new(&self.output.dir, &name, request.format);

        info!(
            "Generating {} {} documents into {} folders ({} distribution, {} workers, seed {})",
            total, request.file_type, request.folders, request.distribution, concurrency, seed
        );

        let writer = match CorpusWriter::create(&request, paths.clone(), chaos) {
            Ok(writer) => writer,
            Err(e) => {
                paths.remove_partials();
                return Err(e);
            }
        };

        let in_flight = concurrency * 2;
        let pool = Arc::new(BufferPool::new(request.pool));
        let cancel = CancellationToken::new();
        let shared = Arc::new(WorkerShared {
            generator,
            padding,
            hash_payloads: request.extended_fields,
            next: AtomicU64::new(1),
            permits: Arc::new(Semaphore::new(in_flight)),
            pool: pool.clone(),
            cancel: cancel.clone(),
            #[cfg(test)]
            fail_at: self.fail_at,
        });

        let (tx, rx) = mpsc::channel::<Delivery>(in_flight);
        let writer_cancel = cancel.clone();
        let writer_pool = pool.clone();
        let writer_task = tokio::task::spawn_blocking(move || {
            write_loop(writer, rx, total, writer_pool, writer_cancel)
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            workers.spawn(worker_loop(worker_id, shared.clone(), tx.clone()));
        }
        drop(tx);

        let mut generation_duration = Duration::ZERO;
        let mut worker_error: Option<PipelineError> = None;
        while let Some(joined) = workers.join_next().await {
            let result = joined.map_err(PipelineError::from).and_then(|r| r);
            match result {
                Ok(busy) => generation_duration += busy,
                Err(e) => {
                    cancel.cancel();
                    if worker_error.is_none() {
                        worker_error = Some(e);
                    }
                }
            }
        }

        let writer_result = writer_task
            .await
            .map_err(PipelineError::from)
            .and_then(|r| r);

        let (outcome, high_water) = match (worker_error, writer_result) {
            (Some(e), _) | (None, Err(e)) => {
                warn!("Generation failed; removing partial output");
                paths.remove_partials();
                return Err(e);
            }
            (None, Ok(done)) => done,
        };

        let mut manifest = RunManifest::new(
            &request,
            seed,
            file_name(&paths.archive),
            file_name(&paths.load_file),
            outcome.archive.zip64,
        );
        if request.chaos.is_some() {
            manifest = manifest.with_anomalies(outcome.anomalies);
        }
        manifest.write_to(&paths.run_manifest)?;

        let metrics = GenerationMetrics {
            items_written: outcome.stats.items,
            archive_entries: outcome.archive.entries,
            archive_bytes: outcome.archive.total_bytes,
            load_file_bytes: outcome.stats.load_file_bytes,
            payload_bytes: outcome.stats.payload_bytes,
            total_duration: started.elapsed(),
            generation_duration,
            write_duration: outcome.stats.write_duration,
            reorder_high_water: high_water,
            pool: pool.stats(),
        };
        info!(
            "Generation complete: {} items, {} bytes in {:?} ({:.1} items/sec)",
            metrics.items_written,
            metrics.archive_bytes,
            metrics.total_duration,
            metrics.items_per_second()
        );
        if let Some(target) = request.target_size {
            info!(
                "Archive is {} bytes against a target of {} bytes",
                metrics.archive_bytes, target
            );
        }

        Ok(RunReport {
            paths,
            seed,
            manifest,
            metrics,
        })
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Claim indices and generate until the counter runs past the end or the run
/// is cancelled. Returns the time spent generating.
async fn worker_loop(
    worker_id: usize,
    shared: Arc<WorkerShared>,
    tx: mpsc::Sender<Delivery>,
) -> Result<Duration, PipelineError> {
    debug!("Worker {} started", worker_id);
    let total = shared.generator.total();
    let mut busy = Duration::ZERO;

    loop {
        let permit = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            permit = shared.permits.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let index = shared.next.fetch_add(1, Ordering::Relaxed);
        if index > total {
            break;
        }

        let job = shared.clone();
        let (completed, elapsed) =
            tokio::task::spawn_blocking(move || build_item(&job, index)).await??;
        busy += elapsed;

        // The writer only hangs up after a failure it reports itself
        if tx.send((completed, permit)).await.is_err() {
            break;
        }
    }

    debug!("Worker {} stopped", worker_id);
    Ok(busy)
}

fn build_item(
    shared: &WorkerShared,
    index: u64,
) -> Result<(CompletedItem, Duration), PipelineError> {
    let started = Instant::now();
    #[cfg(test)]
    if shared.fail_at == Some(index) {
        let source = std::io::Error::other("injected failure");
        return Err(PipelineError::Generation {
            index,
            source: corpus_generator::ContentError::Io(source),
        });
    }
    let padding = shared.padding.for_index(index);
    let hint = if padding > 0 {
        DEFAULT_SIZE_HINT.saturating_add(padding as usize)
    } else {
        DEFAULT_SIZE_HINT
    };
    let mut payload = shared.pool.acquire(hint);

    let item = shared.generator.work_item(index);
    let document = shared
        .generator
        .generate_padded(&item, padding, &mut payload)
        .map_err(|source| PipelineError::Generation { index, source })?;
    let sha256 = shared.hash_payloads.then(|| sha256_hex(&payload));

    Ok((
        CompletedItem {
            item,
            payload,
            document,
            sha256,
        },
        started.elapsed(),
    ))
}

/// Writer stage. Runs on one blocking thread and owns every output handle.
fn write_loop(
    mut writer: CorpusWriter,
    mut rx: mpsc::Receiver<Delivery>,
    total: u64,
    pool: Arc<BufferPool>,
    cancel: CancellationToken,
) -> Result<(WriterOutcome, usize), PipelineError> {
    let mut reorder: ReorderBuffer<Delivery> = ReorderBuffer::new(1);

    while writer.items_written() < total {
        let Some(delivery) = rx.blocking_recv() else {
            break;
        };
        let index = delivery.0.item.index;
        if reorder.insert(index, delivery).is_err() {
            cancel.cancel();
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("item {index} delivered twice"),
            )));
        }

        while let Some((completed, permit)) = reorder.pop_ready() {
            if let Err(e) = writer.write_item(&completed) {
                cancel.cancel();
                return Err(e);
            }
            pool.release(completed.payload);
            drop(permit);

            let written = writer.items_written();
            if written % PROGRESS_INTERVAL == 0 {
                debug!("Progress: {}/{} items written", written, total);
            }
        }
    }

    let written = writer.items_written();
    if written < total {
        return Err(if cancel.is_cancelled() {
            PipelineError::Cancelled
        } else {
            PipelineError::Incomplete { written, total }
        });
    }

    let high_water = reorder.high_water();
    match writer.finish() {
        Ok(outcome) => Ok((outcome, high_water)),
        Err(e) => {
            cancel.cancel();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::FileType;
    use tempfile::TempDir;

    fn request(count: u64, concurrency: usize) -> GenerationRequest {
        let mut request = GenerationRequest::new(count)
            .with_seed(8)
            .with_folders(3)
            .with_file_type(FileType::Mixed)
            .with_concurrency(concurrency);
        request.extracted_text = true;
        request
    }

    #[tokio::test]
    async fn test_generation_failure_mid_run_stops_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let output = OutputOptions::new(&out).with_name("broken");
        let pipeline = CorpusPipeline::new(request(300, 4), output)
            .unwrap()
            .fail_at(57);

        let err = pipeline.run().await.unwrap_err();
        assert!(
            matches!(err, PipelineError::Generation { index: 57, .. }),
            "unexpected error: {err}"
        );
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failure_on_first_item_with_one_worker() {
        let dir = TempDir::new().unwrap();
        let output = OutputOptions::new(dir.path()).with_name("first");
        let pipeline = CorpusPipeline::new(request(20, 1), output)
            .unwrap()
            .fail_at(1);

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation { index: 1, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failure_on_last_item() {
        let dir = TempDir::new().unwrap();
        let output = OutputOptions::new(dir.path()).with_name("last");
        let pipeline = CorpusPipeline::new(request(40, 8), output)
            .unwrap()
            .fail_at(40);

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation { index: 40, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_writer_reports_cancellation_when_input_stops_early() {
        let dir = TempDir::new().unwrap();
        let request = request(5, 1);
        let paths = OutputPaths::new(dir.path(), "cut", request.format);
        let writer = CorpusWriter::create(&request, paths.clone(), None).unwrap();
        let (tx, rx) = mpsc::channel::<Delivery>(1);
        drop(tx);

        let pool = Arc::new(BufferPool::new(request.pool));
        let cancel = CancellationToken::new();
        let err = write_loop(writer, rx, 5, pool.clone(), cancel.clone()).unwrap_err();
        assert!(matches!(err, PipelineError::Incomplete { written: 0, total: 5 }));

        let writer = CorpusWriter::create(&request, paths.clone(), None).unwrap();
        let (tx, rx) = mpsc::channel::<Delivery>(1);
        drop(tx);
        cancel.cancel();
        let err = write_loop(writer, rx, 5, pool, cancel).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));

        paths.remove_partials();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
