//! Generate command handler.

use anyhow::Context;
use corpus_pipeline::{CorpusPipeline, GenerateArgs, OutputOptions, RunReport};

/// Run the generate command.
pub async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let request = args
        .to_request()
        .context("Invalid generation options")?;
    tracing::info!("Count: {}", request.count);
    tracing::info!("Format: {}", request.format);
    tracing::info!("File type: {}", request.file_type);

    let output = OutputOptions {
        dir: args.output.output_dir.clone(),
        name: args.output.name.clone(),
    };
    let report = CorpusPipeline::new(request, output)?.run().await?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let metrics = &report.metrics;
    println!("Archive:      {}", report.paths.archive.display());
    if report.manifest.manifest_in_archive {
        println!("Load file:    {} (inside archive)", report.manifest.load_file);
    } else {
        println!("Load file:    {}", report.paths.load_file.display());
    }
    println!("Run manifest: {}", report.paths.run_manifest.display());
    println!("Seed:         {}", report.seed);
    println!(
        "Documents:    {} ({} entries, {} bytes{})",
        metrics.items_written,
        metrics.archive_entries,
        metrics.archive_bytes,
        if report.manifest.zip64 { ", zip64" } else { "" }
    );
    if let Some(chaos) = &report.manifest.chaos_mode {
        println!("Anomalies:    {}", chaos.total_anomalies);
    }
    println!(
        "Elapsed:      {:.2}s ({:.1} docs/sec, {:.1} MB/sec)",
        metrics.total_duration.as_secs_f64(),
        metrics.items_per_second(),
        metrics.bytes_per_second() / (1024.0 * 1024.0)
    );
    tracing::debug!(
        "Pool: {} hits, {} misses, {} oversize; reorder high water {}",
        metrics.pool.hits,
        metrics.pool.misses,
        metrics.pool.oversize,
        metrics.reorder_high_water
    );
}
