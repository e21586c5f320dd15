use corpus_core::{GenerationRequest, LoadFileFormat};
use corpus_forge::inspect::inspect_archive;
use corpus_forge::pipeline::{CorpusPipeline, OutputOptions};
use tempfile::TempDir;

#[tokio::test]
async fn test_inspect_counts_entries_per_folder() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let dir = TempDir::new()?;
    let mut request = GenerationRequest::new(40)
        .with_folders(4)
        .with_seed(2024)
        .with_format(LoadFileFormat::Csv);
    request.extracted_text = true;
    request.manifest_in_archive = true;

    let report = CorpusPipeline::new(request, OutputOptions::new(dir.path()).with_name("case"))?
        .run()
        .await?;

    let (listing, summary) = inspect_archive(&report.paths.archive)?;
    assert_eq!(summary.entries, 81);
    assert_eq!(listing.entries.len(), 81);
    assert_eq!(summary.other, vec!["case.csv".to_string()]);
    assert_eq!(summary.folders.values().sum::<u64>(), 80);
    assert!(summary.folders.keys().all(|k| k.starts_with("folder_00")));
    assert!(summary.folders.values().all(|n| n % 2 == 0));
    assert!(!summary.zip64);
    Ok(())
}

#[test]
fn test_inspect_rejects_non_archive() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("notes.zip");
    std::fs::write(&path, b"not an archive")?;
    assert!(inspect_archive(&path).is_err());
    Ok(())
}
